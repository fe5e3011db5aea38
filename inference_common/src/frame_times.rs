use std::time::Duration;

/// Time spent in each stage of one capture-detect-render cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTimes {
    /// Pulling the latest frame from the capture stream.
    pub acquire: Duration,
    /// Waiting for the detector, including pre/post-processing.
    pub detect: Duration,
    /// Clearing and redrawing the overlay.
    pub annotate: Duration,
    /// Handing frame + overlay to the preview sink.
    pub present: Duration,
}

impl FrameTimes {
    pub fn total(&self) -> Duration {
        self.acquire + self.detect + self.annotate + self.present
    }
}

/// Collected [`FrameTimes`] of a capture session.
#[derive(Debug, Default)]
pub struct AggregatedTimes {
    frames: Vec<FrameTimes>,
}

impl AggregatedTimes {
    pub fn push(&mut self, times: FrameTimes) {
        self.frames.push(times);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    // The first cycle pays for lazy runtime init and is usually an outlier.
    fn samples(&self, skip_first: bool) -> &[FrameTimes] {
        if skip_first && self.frames.len() > 1 {
            &self.frames[1..]
        } else {
            &self.frames
        }
    }

    pub fn avg(&self, skip_first: bool) -> FrameTimes {
        let samples = self.samples(skip_first);
        if samples.is_empty() {
            return FrameTimes::default();
        }
        let n = samples.len() as u32;
        let sum = samples.iter().fold(FrameTimes::default(), |acc, t| FrameTimes {
            acquire: acc.acquire + t.acquire,
            detect: acc.detect + t.detect,
            annotate: acc.annotate + t.annotate,
            present: acc.present + t.present,
        });
        FrameTimes {
            acquire: sum.acquire / n,
            detect: sum.detect / n,
            annotate: sum.annotate / n,
            present: sum.present / n,
        }
    }

    pub fn min(&self, skip_first: bool) -> FrameTimes {
        self.fold_with(skip_first, Duration::min)
    }

    pub fn max(&self, skip_first: bool) -> FrameTimes {
        self.fold_with(skip_first, Duration::max)
    }

    fn fold_with(&self, skip_first: bool, pick: fn(Duration, Duration) -> Duration) -> FrameTimes {
        let samples = self.samples(skip_first);
        let Some(first) = samples.first() else {
            return FrameTimes::default();
        };
        samples.iter().skip(1).fold(*first, |acc, t| FrameTimes {
            acquire: pick(acc.acquire, t.acquire),
            detect: pick(acc.detect, t.detect),
            annotate: pick(acc.annotate, t.annotate),
            present: pick(acc.present, t.present),
        })
    }
}
