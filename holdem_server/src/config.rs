//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use holdem::TableConfig;
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Settings for the one table this server runs
    pub table: TableConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `action_timeout_override` - Optional turn timeout override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if `SERVER_BIND` is set but isn't a socket address
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        action_timeout_override: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw = std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("{raw:?} is not an IP:PORT address"),
                })?
            }
        };

        let defaults = TableConfig::default();
        let table = TableConfig {
            max_players: parse_env_or("TABLE_MAX_PLAYERS", defaults.max_players),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind),
            starting_stack: parse_env_or("TABLE_STARTING_STACK", defaults.starting_stack),
            action_timeout_secs: action_timeout_override.unwrap_or_else(|| {
                parse_env_or("ACTION_TIMEOUT_SECS", defaults.action_timeout_secs)
            }),
            countdown_secs: parse_env_or("COUNTDOWN_SECS", defaults.countdown_secs),
            join_extension_secs: parse_env_or("JOIN_EXTENSION_SECS", defaults.join_extension_secs),
            seed: std::env::var("TABLE_SEED").ok().and_then(|v| v.parse().ok()),
        };

        Ok(ServerConfig { bind, table })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the variable to fix
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.table.validate().map_err(|e| ConfigError::Invalid {
            var: env_var_for(e.field).to_string(),
            reason: e.reason,
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn env_var_for(field: &str) -> &'static str {
    match field {
        "max_players" => "TABLE_MAX_PLAYERS",
        "small_blind" => "TABLE_SMALL_BLIND",
        "big_blind" => "TABLE_BIG_BLIND",
        "starting_stack" => "TABLE_STARTING_STACK",
        "action_timeout_secs" => "ACTION_TIMEOUT_SECS",
        "countdown_secs" => "COUNTDOWN_SECS",
        "join_extension_secs" => "JOIN_EXTENSION_SECS",
        _ => "TABLE_CONFIG",
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(table: TableConfig) -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            table,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "TABLE_BIG_BLIND".to_string(),
            reason: "too small".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("TABLE_BIG_BLIND"));
        assert!(msg.contains("too small"));
    }

    #[test]
    fn test_config_validation_defaults_pass() {
        assert!(config(TableConfig::default()).validate().is_ok());
    }

    #[test]
    fn test_config_validation_blind_zero() {
        let err = config(TableConfig {
            small_blind: 0, // Invalid
            ..TableConfig::default()
        })
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TABLE_SMALL_BLIND"));
    }

    #[test]
    fn test_config_validation_big_blind_too_small() {
        let err = config(TableConfig {
            small_blind: 20,
            big_blind: 10, // Invalid: less than small blind
            ..TableConfig::default()
        })
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TABLE_BIG_BLIND"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let err = config(TableConfig {
            action_timeout_secs: 0,
            ..TableConfig::default()
        })
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "ACTION_TIMEOUT_SECS"));
    }

    #[test]
    fn test_config_validation_stack_overflows_pot() {
        let err = config(TableConfig {
            max_players: 2,
            starting_stack: 3_000_000_000, // Two of these overflow a pot
            ..TableConfig::default()
        })
        .validate()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "TABLE_STARTING_STACK"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let bind: SocketAddr = "0.0.0.0:7000".parse().unwrap();
        let config = ServerConfig::from_env(Some(bind), Some(5)).unwrap();
        assert_eq!(config.bind, bind);
        assert_eq!(config.table.action_timeout_secs, 5);
    }
}
