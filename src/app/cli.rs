use crate::analytics::EventContext;
use crate::config::{ConfigError, LogLevel, ShipperConfig};
use crate::domain::{Properties, PropertyValue, ValidationError};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "rask-event-shipper", author, version, about = "Ships analytics events to a collector", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "SHIPPER_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Collector base URL
    #[arg(long)]
    pub server_url: Option<String>,

    #[arg(long)]
    pub project: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    /// Signing secret
    #[arg(long)]
    pub secret: Option<String>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Send request bodies without gzip
    #[arg(long)]
    pub no_compress: bool,

    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record a named event
    Track {
        /// Event name
        #[arg(long)]
        event: String,
        #[command(flatten)]
        target: EventArgs,
    },
    /// Set user profile properties
    UserSet {
        #[command(flatten)]
        target: EventArgs,
    },
}

impl Command {
    pub fn target(&self) -> &EventArgs {
        match self {
            Command::Track { target, .. } | Command::UserSet { target } => target,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct EventArgs {
    #[arg(long, default_value = "")]
    pub device_id: String,

    #[arg(long, default_value = "")]
    pub user_id: String,

    #[arg(long, default_value = "")]
    pub app_name: String,

    #[arg(long, default_value = "")]
    pub platform: String,

    #[arg(long, default_value_t = 0)]
    pub server: i64,

    /// Event time as `YYYY-MM-DD HH:MM:SS.mmm`; defaults to now
    #[arg(long)]
    pub time: Option<String>,

    /// Property as `key=value`; repeatable
    #[arg(long = "prop", value_parser = parse_property)]
    pub properties: Vec<(String, PropertyValue)>,
}

impl EventArgs {
    pub fn context(&self) -> EventContext {
        let context = EventContext::new()
            .with_device_id(&self.device_id)
            .with_user_id(&self.user_id)
            .with_app_name(&self.app_name)
            .with_platform(&self.platform)
            .with_server(self.server);

        match &self.time {
            Some(time) => context.with_time(time),
            None => context,
        }
    }

    pub fn properties(&self) -> Result<Properties, ValidationError> {
        Properties::try_from_pairs(self.properties.iter().cloned())
    }
}

/// Parses `key=value`, inferring bool, integer and float values.
pub fn parse_property(input: &str) -> Result<(String, PropertyValue), String> {
    let (key, raw) = input
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{input}'"))?;

    if key.is_empty() {
        return Err(format!("missing property key in '{input}'"));
    }

    let value = match raw {
        "true" => PropertyValue::Bool(true),
        "false" => PropertyValue::Bool(false),
        _ => {
            if let Ok(int) = raw.parse::<i64>() {
                PropertyValue::Int(int)
            } else if let Ok(float) = raw.parse::<f64>() {
                PropertyValue::Float(float)
            } else {
                PropertyValue::String(raw.to_string())
            }
        }
    };

    Ok((key.to_string(), value))
}

impl Cli {
    /// Layers the config file, `SHIPPER_*` variables and flags, in that
    /// order, then validates the result.
    pub fn resolve_config(&self) -> Result<ShipperConfig, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => ShipperConfig::default(),
        };

        config.apply_env()?;

        if let Some(server_url) = &self.server_url {
            config.server_url.clone_from(server_url);
        }
        if let Some(project) = &self.project {
            config.project.clone_from(project);
        }
        if let Some(user) = &self.user {
            config.user.clone_from(user);
        }
        if let Some(secret) = &self.secret {
            config.secret.clone_from(secret);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if self.no_compress {
            config.compress = false;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        // One-shot runs never need the periodic flusher.
        config.auto_flush = false;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_values_are_inferred() {
        assert_eq!(parse_property("level=3").unwrap().1, PropertyValue::Int(3));
        assert_eq!(parse_property("ratio=0.5").unwrap().1, PropertyValue::Float(0.5));
        assert_eq!(parse_property("vip=true").unwrap().1, PropertyValue::Bool(true));
        assert_eq!(
            parse_property("name=a=b").unwrap(),
            ("name".to_string(), PropertyValue::String("a=b".to_string()))
        );
    }

    #[test]
    fn malformed_property_is_rejected() {
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=value").is_err());
    }

    #[test]
    fn parses_track_subcommand() {
        let cli = Cli::try_parse_from([
            "rask-event-shipper",
            "--server-url",
            "http://localhost:9000",
            "--no-compress",
            "track",
            "--event",
            "login",
            "--device-id",
            "d1",
            "--prop",
            "level=1",
        ])
        .unwrap();

        assert!(cli.no_compress);
        match &cli.command {
            Command::Track { event, target } => {
                assert_eq!(event, "login");
                assert_eq!(target.device_id, "d1");
                assert_eq!(target.properties().unwrap().len(), 1);
            }
            Command::UserSet { .. } => panic!("expected track"),
        }
    }
}
