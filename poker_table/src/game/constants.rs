use super::entities::Chips;

/// Number of physical seats at a table.
pub const MAX_PLAYERS: usize = 10;

/// Minimum number of players with chips required to deal a hand.
pub const MIN_PLAYERS: usize = 2;

pub const NUM_HOLE_CARDS: usize = 2;
pub const DECK_SIZE: usize = 52;

pub const DEFAULT_SMALL_BLIND: Chips = 25;
pub const DEFAULT_BIG_BLIND: Chips = 2 * DEFAULT_SMALL_BLIND;
pub const DEFAULT_BUY_IN: Chips = 1000;
pub const DEFAULT_ACTION_TIMEOUT_SECS: i64 = 30;

/// Handles longer than this are truncated.
pub const MAX_HANDLE_LENGTH: usize = 32;
