//! Stage timing for the query pipeline
use std::time::Instant;

/// Timer that logs the elapsed time of a pipeline stage on drop
pub struct PerfTimer {
    label: &'static str,
    start: Instant,
}

impl PerfTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        tracing::debug!(stage = self.label, duration_us = self.elapsed_us(), "Stage finished");
    }
}
