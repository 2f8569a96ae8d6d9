use super::cache::ShipCache;
use super::error::EngineError;
use super::ticker::FlushTicker;
use crate::config::ShipperConfig;
use crate::domain::{Envelope, Event};
use crate::reliability::retry::{self, PendingRecord, RetryConfig};
use crate::sender::codec;
use crate::sender::{Compress, Credentials, HttpChannel, UploadChannel, UploadStats, UploadStatsSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Accumulates signed events and ships them in batches.
///
/// Events land in an accumulation buffer. Once the buffer reaches the batch
/// size, or whenever the ship cache still holds entries, a flush promotes the
/// buffer into the cache and dispatches the cache contents. Every record is
/// uploaded on its own task with a fixed number of immediate attempts.
///
/// `add`, `flush` and `flush_all` never block on the network and may be
/// called from any thread; uploads run on the runtime captured at
/// construction.
pub struct BatchEngine<C: UploadChannel = HttpChannel> {
    core: Arc<EngineCore<C>>,
    ticker: Mutex<Option<FlushTicker>>,
}

struct EngineCore<C> {
    credentials: Credentials,
    channel: Arc<C>,
    batch_size: usize,
    compress: Compress,
    retry: RetryConfig,
    // Lock order: cache, then buffer.
    cache: Mutex<ShipCache>,
    buffer: Mutex<Vec<Envelope>>,
    uploads: TaskTracker,
    runtime: Handle,
    stats: Arc<UploadStats>,
    await_uploads_on_close: bool,
    shutdown_timeout: Duration,
}

impl BatchEngine<HttpChannel> {
    /// Builds an engine that posts to the configured collector over HTTP.
    pub fn new(config: &ShipperConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let channel = HttpChannel::new(config.channel_config())?;
        Self::with_channel(config, channel)
    }
}

impl<C: UploadChannel> BatchEngine<C> {
    /// Builds an engine around an arbitrary channel.
    ///
    /// Must be called within a tokio runtime. The server URL is not checked
    /// here; the channel already owns its endpoint.
    pub fn with_channel(config: &ShipperConfig, channel: C) -> Result<Self, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        let core = Arc::new(EngineCore {
            credentials: config.credentials(),
            channel: Arc::new(channel),
            batch_size: config.effective_batch_size(),
            compress: Compress::from_enabled(config.compress),
            retry: RetryConfig::default(),
            cache: Mutex::new(ShipCache::new(config.effective_cache_capacity())),
            buffer: Mutex::new(Vec::new()),
            uploads: TaskTracker::new(),
            runtime,
            stats: Arc::new(UploadStats::new()),
            await_uploads_on_close: config.await_uploads_on_close,
            shutdown_timeout: config.shutdown_timeout(),
        });

        let ticker = if config.auto_flush {
            let flush_core = core.clone();
            Some(FlushTicker::spawn(
                config.flush_interval(),
                &core.runtime,
                move || flush_core.flush(),
            ))
        } else {
            None
        };

        info!(
            batch_size = core.batch_size,
            cache_capacity = config.effective_cache_capacity(),
            compress = core.compress.header_value(),
            auto_flush = config.auto_flush,
            "Batch engine started"
        );

        Ok(Self {
            core,
            ticker: Mutex::new(ticker),
        })
    }

    /// Signs the event and appends it to the accumulation buffer.
    ///
    /// Triggers a flush when the buffer reaches the batch size or the ship
    /// cache is not empty, and returns that flush's result.
    pub fn add(&self, event: &Event) -> Result<(), EngineError> {
        self.core.add(event)
    }

    pub fn flush(&self) -> Result<(), EngineError> {
        self.core.flush()
    }

    /// Flushes until both the buffer and the cache are empty.
    pub fn flush_all(&self) -> Result<(), EngineError> {
        self.core.flush_all()
    }

    /// Drains pending data, stops the auto-flush task and, when configured,
    /// waits for in-flight uploads up to the shutdown timeout.
    pub async fn close(&self) -> Result<(), EngineError> {
        let flushed = self.core.flush_all();

        let ticker = self.ticker.lock().take();
        if let Some(ticker) = ticker {
            ticker.stop().await;
        }

        let uploads = &self.core.uploads;
        uploads.close();

        if self.core.await_uploads_on_close {
            if tokio::time::timeout(self.core.shutdown_timeout, uploads.wait())
                .await
                .is_err()
            {
                let pending = uploads.len();
                warn!(pending, "Shutdown timed out waiting for uploads");
                return Err(EngineError::ShutdownTimeout { pending });
            }
        } else if !uploads.is_empty() {
            warn!(
                pending = uploads.len(),
                "Closing without waiting for in-flight uploads"
            );
        }

        info!(stats = ?self.core.stats.snapshot(), "Batch engine closed");
        flushed
    }

    /// Waits until every upload task scheduled so far has finished.
    pub async fn settle(&self) {
        let uploads = &self.core.uploads;
        uploads.close();
        uploads.wait().await;
        uploads.reopen();
    }

    pub fn buffered_len(&self) -> usize {
        self.core.buffer.lock().len()
    }

    pub fn cached_len(&self) -> usize {
        self.core.cache.lock().len()
    }

    pub fn in_flight(&self) -> usize {
        self.core.uploads.len()
    }

    pub fn batch_size(&self) -> usize {
        self.core.batch_size
    }

    pub fn stats(&self) -> UploadStatsSnapshot {
        self.core.stats.snapshot()
    }
}

impl<C: UploadChannel> EngineCore<C> {
    fn add(&self, event: &Event) -> Result<(), EngineError> {
        let envelope = self.credentials.seal(event)?;
        debug!(record = %envelope.id(), "Event buffered");

        let buffer_full = {
            let mut buffer = self.buffer.lock();
            buffer.push(envelope);
            buffer.len() >= self.batch_size
        };

        if buffer_full || !self.cache.lock().is_empty() {
            return self.flush();
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), EngineError> {
        let snapshot = {
            let mut cache = self.cache.lock();
            let mut buffer = self.buffer.lock();

            if cache.is_empty() && buffer.is_empty() {
                return Ok(());
            }

            if cache.is_empty() || buffer.len() >= self.batch_size {
                cache.promote(std::mem::take(&mut *buffer));
            }

            // The snapshot drains the cache, so it is within capacity before the locks drop.
            let snapshot = cache.take();
            debug_assert!(cache.len() <= cache.capacity());
            snapshot
        };

        debug!(records = snapshot.len(), "Dispatching batch");
        self.dispatch(snapshot)
    }

    fn flush_all(&self) -> Result<(), EngineError> {
        while !self.is_drained() {
            self.flush()?;
        }
        Ok(())
    }

    fn is_drained(&self) -> bool {
        let cache = self.cache.lock();
        let buffer = self.buffer.lock();
        cache.is_empty() && buffer.is_empty()
    }

    fn dispatch(&self, snapshot: Vec<Envelope>) -> Result<(), EngineError> {
        let mut first_error = None;

        for envelope in snapshot {
            let payload = match codec::encode_envelope(&envelope) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(record = %envelope.id(), error = %e, "Failed to encode record");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    continue;
                }
            };

            let record = PendingRecord {
                id: envelope.id(),
                payload,
            };
            let channel = self.channel.clone();
            let stats = self.stats.clone();
            let retry = self.retry.clone();
            let compress = self.compress;

            self.uploads.spawn_on(
                async move {
                    retry::deliver(&*channel, &record, compress, &retry, &stats).await;
                },
                &self.runtime,
            );
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
