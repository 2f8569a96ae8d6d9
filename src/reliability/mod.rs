pub mod retry;

pub use retry::{DeliveryOutcome, MAX_UPLOAD_ATTEMPTS, PendingRecord, RetryConfig, deliver};
