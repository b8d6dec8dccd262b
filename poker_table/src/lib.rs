//! # Poker Table
//!
//! An authoritative Texas Hold'em table engine.
//!
//! A [`Table`] owns one table's seats, deck, betting rounds, and pots and
//! moves through the phases of a hand:
//!
//! - **NoHand**: between hands, seats change freely
//! - **Betting**: one betting round per street (preflop, flop, turn, river)
//! - **Settlement**: betting is over and the pots wait to be paid
//!
//! Phases are dispatched with `enum_dispatch`.
//!
//! ## Core Modules
//!
//! - [`game`]: Engine, entities, hand evaluation, and views
//! - [`table`]: Async table actor and the registry of running tables
//!
//! ## Example
//!
//! ```
//! use poker_table::{Table, entities::Action};
//!
//! let mut table = Table::default();
//! table.seat("alice".into(), "alice", 0, 1000).unwrap();
//! table.seat("bob".into(), "bob", 1, 1000).unwrap();
//! table.start_hand().unwrap();
//!
//! // Heads-up the small blind acts first.
//! table.act(&"alice".into(), Action::Call).unwrap();
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameSettings, GameView, HandPhase, PhaseRules, Table, TableError, TableSnapshot,
    constants::{self, MAX_PLAYERS},
    entities, functional,
};

/// Table actors and the table registry.
pub mod table;
pub use table::{TableConfig, TableHandle, TableManager, TableManagerError};
