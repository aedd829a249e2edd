//! HTTP listener and logging configuration

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::error::ValidationError;

/// Listener settings for the webhook endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format; follows the environment when unset
    #[serde(default)]
    pub log_format: Option<LogFormat>,

    /// Upper bound on handling one request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Largest webhook body accepted, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Log line format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for terminals
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidBindAddress(addr))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Configured log format, or JSON outside development
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or(match self.environment {
            Environment::Development => LogFormat::Pretty,
            Environment::Staging | Environment::Production => LogFormat::Json,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::ensure_range("server.port", i64::from(self.port), 1, 65535)?;
        ValidationError::ensure_range(
            "server.request_timeout_secs",
            self.request_timeout_secs as i64,
            1,
            300,
        )?;
        ValidationError::ensure_range(
            "server.body_limit_bytes",
            self.body_limit_bytes as i64,
            1024,
            16 * 1024 * 1024,
        )?;
        self.socket_addr()?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            log_format: None,
            request_timeout_secs: default_request_timeout(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info,itinerary_billing=debug,sqlx=warn".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_body_limit() -> usize {
    1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unparseable_host_is_reported_with_the_address() {
        let config = ServerConfig {
            host: "billing host".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidBindAddress("billing host:8080".to_string()))
        );
    }

    #[test]
    fn log_format_follows_environment_unless_set() {
        let mut config = ServerConfig::default();
        assert_eq!(config.log_format(), LogFormat::Pretty);

        config.environment = Environment::Staging;
        assert_eq!(config.log_format(), LogFormat::Json);

        config.log_format = Some(LogFormat::Pretty);
        assert_eq!(config.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn zero_port_and_timeouts_are_rejected() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { field: "server.port", .. })
        ));

        let config = ServerConfig {
            request_timeout_secs: 600,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { field: "server.request_timeout_secs", .. })
        ));
    }

    #[test]
    fn tiny_body_limit_is_rejected() {
        let config = ServerConfig {
            body_limit_bytes: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_labels() {
        assert_eq!(Environment::Production.as_str(), "production");
        assert!(ServerConfig {
            environment: Environment::Production,
            ..Default::default()
        }
        .is_production());
    }
}
