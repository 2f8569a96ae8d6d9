//! Periodic flush task driven by a tokio interval.

use super::EngineError;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Owned background task that calls a flush hook on every tick.
///
/// The first tick fires one full period after spawning. Dropping the ticker
/// cancels it; [`FlushTicker::stop`] also waits for the task to exit.
#[derive(Debug)]
pub struct FlushTicker {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl FlushTicker {
    pub fn spawn<F>(period: Duration, runtime: &Handle, flush: F) -> Self
    where
        F: Fn() -> Result<(), EngineError> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(period_ms = period.as_millis() as u64, "Auto-flush started");

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        debug!("Auto-flush tick");
                        if let Err(e) = flush() {
                            warn!(error = %e, "Auto-flush failed");
                        }
                    }
                }
            }

            info!("Auto-flush stopped");
        });

        Self {
            cancel_token,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the task and waits for it to finish.
    pub async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Auto-flush task ended abnormally");
            }
        }
    }
}

impl Drop for FlushTicker {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let ticker = FlushTicker::spawn(Duration::from_secs(5), &Handle::current(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(10_200)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        ticker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_task() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let ticker = FlushTicker::spawn(Duration::from_secs(1), &Handle::current(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(ticker.is_running());
        ticker.stop().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_errors_do_not_stop_ticking() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let ticker = FlushTicker::spawn(Duration::from_secs(1), &Handle::current(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::NoRuntime)
        });

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        ticker.stop().await;
    }
}
