//! Async front of a blocking [`DetectionModel`].

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use inference_common::detection::DetectionBatch;
use inference_common::frame::Frame;
use inference_common::model::{DetectionModel, ModelInfo, ModelLoadError};

/// A loaded model that can be queried without blocking the viewer loop.
///
/// Inference runs on tokio's blocking pool. Failures never reach the caller:
/// a frame the model could not process yields an empty batch.
pub struct DetectorAdapter<M> {
    model: Arc<Mutex<M>>,
    info: ModelInfo,
}

impl<M> Clone for DetectorAdapter<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            info: self.info.clone(),
        }
    }
}

impl<M: DetectionModel> DetectorAdapter<M> {
    /// Runs `loader` on the blocking pool.
    pub async fn load<F>(loader: F) -> Result<Self, ModelLoadError>
    where
        F: FnOnce() -> Result<M, ModelLoadError> + Send + 'static,
    {
        let model = tokio::task::spawn_blocking(loader)
            .await
            .map_err(|e| ModelLoadError::Aborted(e.to_string()))??;
        let info = model.info();
        log::info!("Loaded {} ({}, {})", info.architecture, info.framework, info.dataset);
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            info,
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Detects objects in `frame`, ranked by confidence.
    ///
    /// The returned future owns everything it needs, so dropping it
    /// abandons the result while the inference itself runs to completion.
    pub fn detect(&self, frame: Frame) -> impl Future<Output = DetectionBatch> + Send + 'static {
        let model = Arc::clone(&self.model);
        async move {
            let result = tokio::task::spawn_blocking(move || {
                let mut model = model.lock().unwrap_or_else(PoisonError::into_inner);
                model.infer(&frame)
            })
            .await;

            match result {
                Ok(Ok(detections)) => DetectionBatch::ranked(detections),
                Ok(Err(e)) => {
                    log::warn!("Detection failed, using empty batch: {e:#}");
                    DetectionBatch::empty()
                }
                Err(e) => {
                    log::warn!("Detection task did not complete, using empty batch: {e}");
                    DetectionBatch::empty()
                }
            }
        }
    }
}
