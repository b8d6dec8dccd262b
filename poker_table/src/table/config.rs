//! Table configuration models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{
    GameSettings,
    constants::{DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, MAX_PLAYERS},
    entities::Chips,
};

/// Longest a player may be given to act.
pub const MAX_ACTION_TIMEOUT_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableConfigError {
    #[error("small blind must be positive")]
    ZeroSmallBlind,
    #[error("big blind ({big}) must be greater than the small blind ({small})")]
    BlindsOutOfOrder { small: Chips, big: Chips },
    #[error("max players must be between 2 and {MAX_PLAYERS}, got {0}")]
    MaxPlayers(usize),
    #[error("action timeout must be between 1 and {MAX_ACTION_TIMEOUT_SECS} seconds, got {0}")]
    ActionTimeout(i64),
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Maximum number of seats in use (default: 10)
    pub max_players: usize,

    pub small_blind: Chips,

    pub big_blind: Chips,

    /// Seconds a player has to act before the timeout action is taken
    pub action_timeout_secs: i64,

    /// Fixed shuffle seed, for reproducible tables
    pub seed: Option<u64>,

    /// Deal streets and settle hands without waiting for explicit calls
    pub auto_advance: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_players: MAX_PLAYERS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            seed: None,
            auto_advance: false,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), TableConfigError> {
        if self.small_blind == 0 {
            return Err(TableConfigError::ZeroSmallBlind);
        }

        if self.big_blind <= self.small_blind {
            return Err(TableConfigError::BlindsOutOfOrder {
                small: self.small_blind,
                big: self.big_blind,
            });
        }

        if !(2..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(TableConfigError::MaxPlayers(self.max_players));
        }

        if !(1..=MAX_ACTION_TIMEOUT_SECS).contains(&self.action_timeout_secs) {
            return Err(TableConfigError::ActionTimeout(self.action_timeout_secs));
        }

        Ok(())
    }

    /// Engine rules for this table
    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            max_players: self.max_players,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            action_timeout_secs: self.action_timeout_secs,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(TableConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_blinds_validated() {
        let config = TableConfig {
            small_blind: 50,
            big_blind: 50,
            ..TableConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(TableConfigError::BlindsOutOfOrder { small: 50, big: 50 })
        );

        let config = TableConfig {
            small_blind: 0,
            ..TableConfig::default()
        };
        assert_eq!(config.validate(), Err(TableConfigError::ZeroSmallBlind));
    }

    #[test]
    fn test_max_players_validated() {
        for max_players in [0, 1, 11] {
            let config = TableConfig {
                max_players,
                ..TableConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(TableConfigError::MaxPlayers(max_players))
            );
        }
    }

    #[test]
    fn test_timeout_validated() {
        let config = TableConfig {
            action_timeout_secs: 0,
            ..TableConfig::default()
        };
        assert_eq!(config.validate(), Err(TableConfigError::ActionTimeout(0)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TableConfig =
            serde_json::from_str(r#"{"name":"High Stakes","small_blind":100,"big_blind":200}"#)
                .unwrap();
        assert_eq!(config.name, "High Stakes");
        assert_eq!(config.big_blind, 200);
        assert_eq!(config.max_players, MAX_PLAYERS);
        assert!(!config.auto_advance);
    }

    #[test]
    fn test_game_settings() {
        let config = TableConfig {
            seed: Some(9),
            ..TableConfig::default()
        };
        let settings = config.game_settings();
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.big_blind, config.big_blind);
    }
}
