//! Table engine - hand lifecycle and poker rules.
//!
//! This module provides:
//! - Cards, the partitioned deck, players, and pots
//! - Hand evaluation
//! - The table state machine (seating, betting, settlement)
//! - Snapshots and per-player views

pub mod constants;
pub mod entities;
pub mod functional;
pub mod state_machine;
pub mod states;
pub mod views;

pub use state_machine::{GameSettings, HandPhase, PhaseRules, Table, TableError};
pub use views::{GameView, TableSnapshot};
