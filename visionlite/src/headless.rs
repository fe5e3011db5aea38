use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::{mpsc, watch};

use crate::config::ViewerConfig;
use crate::orchestrator::{Command, Flow};
use crate::status::{LoopState, ModelStatus, ViewerStatus};
use crate::viewer::{self, COMMAND_BUFFER};

const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Runs the viewer without a dashboard until Ctrl-C or a capture failure.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(run_async(config))
}

async fn run_async(config: ViewerConfig) -> anyhow::Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (status_tx, status_rx) = watch::channel(ViewerStatus::default());
    let mut viewer = viewer::build(&config, cmd_rx, status_tx)?;

    let quit_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Received shutdown signal");
            let _ = quit_tx.send(Command::Quit).await;
        }
    });
    tokio::spawn(report_status(status_rx, cmd_tx));

    log::info!("Loading model {:?}", config.yolo.model_path);
    if viewer.load_model(viewer::model_loader(&config)).await == Flow::Quit {
        return Ok(());
    }
    if let ModelStatus::Failed(reason) = viewer.model_status() {
        bail!("Model failed to load: {reason}");
    }

    if viewer.start().await == Flow::Quit {
        return Ok(());
    }
    if viewer.state() == LoopState::Idle {
        let reason = viewer.snapshot().capture_error.unwrap_or_default();
        bail!("Failed to start capture: {reason}");
    }
    viewer.run().await;

    if let Some(reason) = viewer.snapshot().capture_error {
        bail!("Capture stopped: {reason}");
    }
    Ok(())
}

/// Logs live stats periodically and quits once capture has failed.
async fn report_status(mut status: watch::Receiver<ViewerStatus>, commands: mpsc::Sender<Command>) {
    let mut ticker = tokio::time::interval(STATS_INTERVAL);
    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let failed = {
                    let current = status.borrow_and_update();
                    current.state == LoopState::Idle && current.capture_error.is_some()
                };
                if failed {
                    let _ = commands.send(Command::Quit).await;
                    break;
                }
            }
            _ = ticker.tick() => {
                let current = status.borrow().clone();
                if current.state != LoopState::Active {
                    continue;
                }
                let top = current
                    .top
                    .first()
                    .map(|d| d.label_text())
                    .unwrap_or_else(|| "-".to_string());
                tracing::info!(
                    fps = current.fps,
                    objects = current.total,
                    "Detecting | top: {top}"
                );
            }
        }
    }
}
