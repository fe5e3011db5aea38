//! Sliding-window processing rate estimation.

use std::collections::VecDeque;

/// Number of cycle timestamps kept.
pub const WINDOW_CAPACITY: usize = 60;
/// Number of most recent timestamps the estimate is computed over.
pub const ESTIMATE_SPAN: usize = 30;

/// Estimates cycles per second from the timestamps of completed cycles.
///
/// Only the most recent [`ESTIMATE_SPAN`] samples contribute, which smooths
/// single-frame jitter while still following sustained rate changes.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    samples: VecDeque<f64>,
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RateEstimator {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    /// Records the completion time of one cycle, in milliseconds.
    pub fn record(&mut self, timestamp_ms: f64) {
        self.samples.push_back(timestamp_ms);
        while self.samples.len() > WINDOW_CAPACITY {
            self.samples.pop_front();
        }
    }

    /// Current rate in whole cycles per second, 0 until two samples exist.
    pub fn estimate(&self) -> u32 {
        let n = self.samples.len().min(ESTIMATE_SPAN);
        if n < 2 {
            return 0;
        }

        let len = self.samples.len();
        let elapsed_ms = self.samples[len - 1] - self.samples[len - n];
        if elapsed_ms <= 0.0 {
            return 0;
        }

        let fps = (n - 1) as f64 / (elapsed_ms / 1000.0);
        fps.round() as u32
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest timestamp still in the window.
    pub fn oldest(&self) -> Option<f64> {
        self.samples.front().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(count: usize, spacing_ms: f64) -> RateEstimator {
        let mut rate = RateEstimator::new();
        for i in 0..count {
            rate.record(1000.0 + i as f64 * spacing_ms);
        }
        rate
    }

    #[test]
    fn needs_two_samples() {
        let mut rate = RateEstimator::new();
        assert_eq!(rate.estimate(), 0);
        rate.record(16.0);
        assert_eq!(rate.estimate(), 0);
    }

    #[test]
    fn thirty_fps_spacing() {
        let rate = filled(30, 1000.0 / 30.0);
        assert_eq!(rate.estimate(), 30);
    }

    #[test]
    fn uses_all_samples_when_fewer_than_span() {
        // 5 samples, 100ms apart: 4 intervals over 400ms.
        let rate = filled(5, 100.0);
        assert_eq!(rate.estimate(), 10);
    }

    #[test]
    fn only_recent_span_counts() {
        let mut rate = RateEstimator::new();
        // A slow start at 10 fps, then a sustained 50 fps run.
        for i in 0..20 {
            rate.record(i as f64 * 100.0);
        }
        let start = 2000.0;
        for i in 0..30 {
            rate.record(start + i as f64 * 20.0);
        }
        assert_eq!(rate.estimate(), 50);
    }

    #[test]
    fn window_is_capped_at_sixty() {
        let mut rate = filled(60, 10.0);
        assert_eq!(rate.len(), 60);
        assert_eq!(rate.oldest(), Some(1000.0));

        rate.record(5000.0);
        assert_eq!(rate.len(), WINDOW_CAPACITY);
        assert_eq!(rate.oldest(), Some(1010.0));
    }

    #[test]
    fn zero_elapsed_time_is_zero_fps() {
        let rate = filled(3, 0.0);
        assert_eq!(rate.estimate(), 0);
    }

    #[test]
    fn reset_clears_samples() {
        let mut rate = filled(10, 33.0);
        rate.reset();
        assert!(rate.is_empty());
        assert_eq!(rate.estimate(), 0);
    }
}
