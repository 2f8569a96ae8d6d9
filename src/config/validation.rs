use super::{ConfigError, ShipperConfig};
use crate::sender::channel::resolve_ingest_url;

impl ShipperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.trim().is_empty() {
            return Err(ConfigError::EmptyServerUrl);
        }

        resolve_ingest_url(&self.server_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid server URL '{}': {}", self.server_url, e))
        })?;

        Ok(())
    }
}
