use crate::sender::{Compress, UploadChannel, UploadStats};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Attempts made for every record before it is dropped.
pub const MAX_UPLOAD_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Pause between attempts. Zero retries immediately.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_UPLOAD_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Dropped { attempts: u32 },
}

impl DeliveryOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } | DeliveryOutcome::Dropped { attempts } => {
                *attempts
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// A wire-encoded record waiting for upload.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub id: Uuid,
    pub payload: String,
}

/// Posts one record until the collector accepts it or attempts run out.
///
/// Only an HTTP 200 carrying the accepted business status counts as success.
/// Exhausted records are logged and dropped, never re-queued.
pub async fn deliver<C: UploadChannel>(
    channel: &C,
    record: &PendingRecord,
    compress: Compress,
    config: &RetryConfig,
    stats: &UploadStats,
) -> DeliveryOutcome {
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let start = Instant::now();
        let result = channel.post(&record.payload, compress).await;
        let elapsed = start.elapsed();

        match result {
            Ok(response) if response.is_accepted() => {
                stats.record_attempt(true, elapsed);
                debug!(record = %record.id, attempt, "Record accepted by collector");
                return DeliveryOutcome::Delivered { attempts: attempt };
            }
            Ok(response) => {
                stats.record_attempt(false, elapsed);
                warn!(
                    record = %record.id,
                    attempt,
                    status = response.status,
                    message = %response.message,
                    "Collector rejected record"
                );
            }
            Err(e) => {
                stats.record_attempt(false, elapsed);
                warn!(
                    record = %record.id,
                    attempt,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Upload attempt failed"
                );
            }
        }

        if attempt < max_attempts && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
    }

    stats.record_dropped();
    error!(
        record = %record.id,
        attempts = max_attempts,
        bytes = record.payload.len(),
        "All upload attempts failed, dropping record"
    );
    debug!(record = %record.id, payload = %record.payload, "Dropped record payload");

    DeliveryOutcome::Dropped {
        attempts: max_attempts,
    }
}
