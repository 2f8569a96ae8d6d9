use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every upload task of one engine.
#[derive(Debug, Default)]
pub struct UploadStats {
    attempts: AtomicU64,
    accepted: AtomicU64,
    failed_attempts: AtomicU64,
    dropped: AtomicU64,
    total_response_time: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadStatsSnapshot {
    pub attempts: u64,
    pub accepted: u64,
    pub failed_attempts: u64,
    /// Records given up on after exhausting their attempts.
    pub dropped: u64,
    pub average_response_time: Duration,
}

impl UploadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self, accepted: bool, response_time: Duration) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        self.total_response_time
            .fetch_add(response_time.as_millis() as u64, Ordering::Relaxed);

        if accepted {
            self.accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_attempts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UploadStatsSnapshot {
        let attempts = self.attempts.load(Ordering::Relaxed);
        let total_response_time = self.total_response_time.load(Ordering::Relaxed);

        let average_response_time = if attempts > 0 {
            Duration::from_millis(total_response_time / attempts)
        } else {
            Duration::ZERO
        };

        UploadStatsSnapshot {
            attempts,
            accepted: self.accepted.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            average_response_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_attempts() {
        let stats = UploadStats::new();
        stats.record_attempt(false, Duration::from_millis(10));
        stats.record_attempt(true, Duration::from_millis(30));
        stats.record_dropped();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.attempts, 2);
        assert_eq!(snapshot.accepted, 1);
        assert_eq!(snapshot.failed_attempts, 1);
        assert_eq!(snapshot.dropped, 1);
        assert_eq!(snapshot.average_response_time, Duration::from_millis(20));
    }

    #[test]
    fn empty_stats_have_zero_average() {
        assert_eq!(UploadStats::new().snapshot(), UploadStatsSnapshot::default());
    }
}
