//! Configuration loading for the Opsdesk client.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub ws_endpoint: String,
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    /// Rows per list page; caps `PageState.items`.
    pub page_size: usize,
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub jwt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or OPSDESK_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.ws_endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ws_endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        if self.auth.api_key.is_none() && self.auth.jwt.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "auth",
                reason: "api_key or jwt must be provided".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.reconnect.initial_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnect.initial_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.reconnect.max_ms < self.reconnect.initial_ms {
            return Err(ConfigError::InvalidValue {
                field: "reconnect.max_ms",
                reason: "must be >= reconnect.initial_ms".to_string(),
            });
        }
        if self.reconnect.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnect.multiplier",
                reason: "must be >= 1.0".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os("OPSDESK_CONFIG").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ClientConfig {
        ClientConfig {
            api_base_url: "http://localhost:8080".to_string(),
            ws_endpoint: "ws://localhost:8080/ws".to_string(),
            auth: AuthConfig {
                api_key: Some("test-key".to_string()),
                jwt: None,
            },
            request_timeout_ms: 5_000,
            page_size: 20,
            reconnect: ReconnectConfig {
                initial_ms: 250,
                max_ms: 5_000,
                multiplier: 1.5,
                jitter_ms: 100,
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn auth_required() {
        let mut config = base_config();
        config.auth = AuthConfig {
            api_key: None,
            jwt: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut config = base_config();
        config.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn reconnect_bounds_enforced() {
        let mut config = base_config();
        config.reconnect.max_ms = 100;
        assert!(config.validate().is_err());
        config.reconnect.max_ms = 5_000;
        config.reconnect.multiplier = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("opsdesk.toml");
        std::fs::write(
            &path,
            r#"
                api_base_url = "http://localhost:8080"
                ws_endpoint = "ws://localhost:8080/ws"
                request_timeout_ms = 5000
                page_size = 20

                [auth]
                jwt = "token"

                [reconnect]
                initial_ms = 250
                max_ms = 5000
                multiplier = 1.5
                jitter_ms = 100
            "#,
        )
        .expect("write config");
        let config = ClientConfig::from_path(&path).expect("load");
        assert_eq!(config.auth.jwt.as_deref(), Some("token"));
    }

    #[test]
    fn unknown_field_rejected() {
        let toml = r#"
            api_base_url = "http://localhost:8080"
            ws_endpoint = "ws://localhost:8080/ws"
            request_timeout_ms = 5000
            page_size = 20
            theme = "dark"

            [auth]
            api_key = "k"

            [reconnect]
            initial_ms = 250
            max_ms = 5000
            multiplier = 1.5
            jitter_ms = 100
        "#;
        assert!(toml::from_str::<ClientConfig>(toml).is_err());
    }

    #[test]
    fn parses_toml() {
        let toml = r#"
            api_base_url = "http://localhost:8080"
            ws_endpoint = "ws://localhost:8080/ws"
            request_timeout_ms = 5000
            page_size = 20

            [auth]
            api_key = "k"

            [reconnect]
            initial_ms = 250
            max_ms = 5000
            multiplier = 1.5
            jitter_ms = 100
        "#;
        let config: ClientConfig = toml::from_str(toml).expect("parse");
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 20);
    }
}
