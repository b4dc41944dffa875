//! Monotonic checkpoints for a transfer.
//!
//! A recorder is started before the first byte moves, marked when the
//! data phase finishes and finished once the acknowledgment round-trip
//! completes (client side only).

use std::time::{Duration, Instant};

/// Captures the `start`, data-mark and `end` checkpoints of one run.
#[derive(Debug, Clone, Copy)]
pub struct TimingRecorder {
    start: Instant,
    data_mark: Option<Instant>,
    end: Option<Instant>,
}

impl TimingRecorder {
    /// Record the start checkpoint now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            data_mark: None,
            end: None,
        }
    }

    /// Record the moment sending (or receiving) finished.
    pub fn mark_data(&mut self) {
        self.data_mark = Some(Instant::now());
    }

    /// Record the moment the acknowledgment round-trip finished.
    pub fn finish(&mut self) {
        let now = Instant::now();
        if self.data_mark.is_none() {
            self.data_mark = Some(now);
        }
        self.end = Some(now);
    }

    /// Derived intervals. Missing checkpoints count as "now".
    pub fn sample(&self) -> TimingSample {
        let now = Instant::now();
        let data_mark = self.data_mark.unwrap_or(now);
        let end = self.end.unwrap_or(now).max(data_mark);

        TimingSample {
            transfer: data_mark.saturating_duration_since(self.start),
            round_trip: end.saturating_duration_since(self.start),
        }
    }
}

/// Intervals computed from a [`TimingRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    /// `data_mark - start`
    pub transfer: Duration,
    /// `end - start`
    pub round_trip: Duration,
}

impl TimingSample {
    pub fn transfer_us(&self) -> u128 {
        self.transfer.as_micros()
    }

    pub fn round_trip_us(&self) -> u128 {
        self.round_trip.as_micros()
    }
}
