use crate::config::LogLevel;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// HTTP internals that are noisy below `warn`.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to set global tracing subscriber: {0}")]
    InitFailed(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone)]
pub struct LoggingSystem {
    level: LogLevel,
    json: bool,
    directives: Vec<String>,
}

impl LoggingSystem {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            json: false,
            directives: QUIET_TARGETS
                .iter()
                .map(|target| format!("{target}=warn"))
                .collect(),
        }
    }

    pub fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Filter string: the default level first, then per-target directives.
    pub fn build_filter_string(&self) -> String {
        std::iter::once(self.level.as_str().to_string())
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `RUST_LOG` wins over the configured level when set.
    pub fn build_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }

        let filter = self.build_filter_string();
        EnvFilter::try_new(&filter).map_err(|source| LoggingError::InvalidFilter { filter, source })
    }

    pub fn init(&self) -> Result<(), LoggingError> {
        let filter = self.build_filter()?;

        if self.json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true).with_current_span(false))
                .try_init()?;
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_level(true).compact())
                .try_init()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_starts_with_default_level() {
        let filter = LoggingSystem::new(LogLevel::Debug).build_filter_string();
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn custom_directives_are_appended() {
        let filter = LoggingSystem::new(LogLevel::Info)
            .with_directive("rask_event_shipper=trace")
            .build_filter_string();
        assert!(filter.ends_with(",rask_event_shipper=trace"));
    }
}
