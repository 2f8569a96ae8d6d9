//! Producer-facing tracking API.
//!
//! Validates identity, event names and property keys, merges super
//! properties, and hands finished events to a [`BatchEngine`].

pub mod context;

pub use context::EventContext;

use crate::buffer::BatchEngine;
use crate::config::ShipperConfig;
use crate::domain::{Event, EventType, Properties, ShipperError, ValidationError, validate_identifier};
use crate::sender::{HttpChannel, UploadChannel};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Callback evaluated on every `track` call.
pub type DynamicProperties = Arc<dyn Fn() -> Properties + Send + Sync>;

pub struct Analytics<C: UploadChannel = HttpChannel> {
    engine: BatchEngine<C>,
    super_properties: RwLock<Properties>,
    dynamic_super_properties: RwLock<Option<DynamicProperties>>,
}

impl Analytics<HttpChannel> {
    pub fn from_config(config: &ShipperConfig) -> Result<Self, ShipperError> {
        Ok(Self::new(BatchEngine::new(config)?))
    }
}

impl<C: UploadChannel> Analytics<C> {
    pub fn new(engine: BatchEngine<C>) -> Self {
        Self {
            engine,
            super_properties: RwLock::new(Properties::new()),
            dynamic_super_properties: RwLock::new(None),
        }
    }

    pub fn engine(&self) -> &BatchEngine<C> {
        &self.engine
    }

    /// Copy of the static super properties.
    pub fn super_properties(&self) -> Properties {
        self.super_properties.read().clone()
    }

    /// Merges into the static super properties, overwriting equal keys.
    pub fn set_super_properties(&self, properties: &Properties) {
        self.super_properties.write().merge(properties);
    }

    pub fn clear_super_properties(&self) {
        *self.super_properties.write() = Properties::new();
    }

    pub fn set_dynamic_super_properties<F>(&self, callback: F)
    where
        F: Fn() -> Properties + Send + Sync + 'static,
    {
        *self.dynamic_super_properties.write() = Some(Arc::new(callback));
    }

    pub fn clear_dynamic_super_properties(&self) {
        *self.dynamic_super_properties.write() = None;
    }

    /// Evaluates the dynamic callback, if any.
    pub fn dynamic_super_properties(&self) -> Properties {
        let callback = self.dynamic_super_properties.read().clone();
        callback.map(|callback| callback()).unwrap_or_default()
    }

    /// Records a named event.
    ///
    /// Properties are layered as static super properties, then dynamic ones,
    /// then `properties`; later layers win on equal keys.
    pub fn track(
        &self,
        context: &EventContext,
        event_name: &str,
        properties: &Properties,
    ) -> Result<(), ShipperError> {
        if event_name.is_empty() {
            return Err(ValidationError::EmptyEventName.into());
        }

        let mut merged = self.super_properties();
        merged.merge(&self.dynamic_super_properties());
        merged.merge(properties);

        self.submit(context, EventType::Track, Some(event_name), &merged)
    }

    /// Sets user profile properties. Super properties are not applied.
    pub fn user_set(
        &self,
        context: &EventContext,
        properties: &Properties,
    ) -> Result<(), ShipperError> {
        self.submit(context, EventType::UserSet, None, properties)
    }

    pub fn flush(&self) -> Result<(), ShipperError> {
        Ok(self.engine.flush()?)
    }

    pub async fn close(&self) -> Result<(), ShipperError> {
        Ok(self.engine.close().await?)
    }

    fn submit(
        &self,
        context: &EventContext,
        event_type: EventType,
        event_name: Option<&str>,
        properties: &Properties,
    ) -> Result<(), ShipperError> {
        if !context.has_identity() {
            return Err(ValidationError::MissingIdentity.into());
        }

        if let Some(name) = event_name {
            if !validate_identifier(name)? {
                return Err(ValidationError::InvalidEventName(name.to_string()).into());
            }
        }

        let event = Event {
            device_id: context.device_id.clone(),
            user_id: context.user_id.clone(),
            app_name: context.app_name.clone(),
            platform: context.platform.clone(),
            server: context.server,
            event_type,
            time: context.resolved_time(),
            event_name: event_name.map(str::to_string),
            properties: properties.to_json()?,
        };

        debug!(
            event_type = event_type.as_str(),
            event_name = event_name.unwrap_or_default(),
            properties = properties.len(),
            "Submitting event"
        );

        self.engine.add(&event)?;
        Ok(())
    }
}
