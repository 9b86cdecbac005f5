use chirplink_core::constants::PACKET_ERROR_WINDOW;

/// Bounded-memory estimate of the acknowledgement failure rate.
///
/// Each recorded outcome moves the average by
/// `(failure - avg) / min(attempted, window)`, a standard exponential
/// moving average: once `window` samples have been seen, the newest sample
/// carries a stable weight of `1/window`. Error history under one set of
/// radio parameters says nothing about another, so the owning station
/// resets the estimator on every successful settings change.
#[derive(Debug, Clone)]
pub struct PacketErrorEstimator {
    attempted: u32,
    failed: u32,
    fraction: f32,
    window: u32,
}

impl PacketErrorEstimator {
    /// Creates an estimator with the given moving-average window.
    pub fn new(window: u32) -> Self {
        Self {
            attempted: 0,
            failed: 0,
            fraction: 0.0,
            window: window.max(1),
        }
    }

    /// Records the outcome of one acknowledged transmission attempt.
    pub fn record_outcome(&mut self, success: bool) {
        self.attempted += 1;
        let indicator = if success {
            0.0
        } else {
            self.failed += 1;
            1.0
        };
        let divisor = self.attempted.min(self.window) as f32;
        self.fraction += (indicator - self.fraction) / divisor;
    }

    /// Zeroes all counters and the average. Idempotent.
    pub fn reset(&mut self) {
        self.attempted = 0;
        self.failed = 0;
        self.fraction = 0.0;
    }

    /// Returns the current moving-average error fraction (0.0 to 1.0).
    pub fn error_fraction(&self) -> f32 {
        self.fraction
    }

    /// Returns the number of attempts recorded since the last reset.
    pub fn attempted(&self) -> u32 {
        self.attempted
    }

    /// Returns the number of failures recorded since the last reset.
    pub fn failed(&self) -> u32 {
        self.failed
    }
}

impl Default for PacketErrorEstimator {
    fn default() -> Self {
        Self::new(PACKET_ERROR_WINDOW)
    }
}
