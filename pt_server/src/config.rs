//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_table::{TableConfig, table::TableConfigError};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given.
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 6969);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Most tables that may be open at once
    pub max_tables: usize,
    /// Number of tables to create on startup
    pub num_tables: usize,
    /// Settings for tables created on startup, and the base for tables
    /// created over the API
    pub table_defaults: TableConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `num_tables_override` - Optional number of tables override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        num_tables_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_strict("SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let defaults = TableConfig::default();
        let table_defaults = TableConfig {
            name: defaults.name,
            max_players: parse_env_or("TABLE_MAX_PLAYERS", defaults.max_players),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind),
            action_timeout_secs: parse_env_or(
                "TABLE_ACTION_TIMEOUT_SECS",
                defaults.action_timeout_secs,
            ),
            seed: parse_env_strict("TABLE_SEED")?,
            auto_advance: parse_env_or("TABLE_AUTO_ADVANCE", defaults.auto_advance),
        };

        let num_tables = num_tables_override.unwrap_or_else(|| parse_env_or("INITIAL_TABLES", 1));

        Ok(ServerConfig {
            bind,
            max_tables: parse_env_or("MAX_TABLES", 100),
            num_tables,
            table_defaults,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tables == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_TABLES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.num_tables > self.max_tables {
            return Err(ConfigError::Invalid {
                var: "INITIAL_TABLES".to_string(),
                reason: format!("Cannot exceed max tables ({})", self.max_tables),
            });
        }

        self.table_defaults.validate()?;
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Invalid table defaults: {0}")]
    Table(#[from] TableConfigError),
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

/// Like [`parse_env_or`], but a value that is set and doesn't parse is an
/// error instead of being ignored.
fn parse_env_strict<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => parse_value(key, &value).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: key.to_string(),
        reason: e.to_string(),
    })
}
