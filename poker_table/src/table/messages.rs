//! Table actor message types.

use crate::game::{
    GameView, TableError, TableSnapshot,
    entities::{Action, ActionRecord, Chips, GameId, HandSummary, PlayerId, SeatIndex, Street},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Sit a player down at a seat
    Seat {
        player_id: PlayerId,
        handle: String,
        seat_idx: SeatIndex,
        stack: Chips,
        response: oneshot::Sender<TableResponse>,
    },

    /// Leave the table (folds first if a hand is running)
    Unseat {
        player_id: PlayerId,
        response: oneshot::Sender<TableResponse>,
    },

    /// Deal a new hand
    StartHand {
        response: oneshot::Sender<TableResponse>,
    },

    /// Player action (fold, check, call, bet, raise, all-in)
    Act {
        player_id: PlayerId,
        action: Action,
        response: oneshot::Sender<TableResponse>,
    },

    /// Deal the next street once betting is complete
    AdvanceStreet {
        response: oneshot::Sender<TableResponse>,
    },

    /// Pay out the pots once betting is over
    SettleHand {
        response: oneshot::Sender<TableResponse>,
    },

    /// Get the latest full snapshot
    GetSnapshot {
        response: oneshot::Sender<Arc<TableSnapshot>>,
    },

    /// Get the view for one player, or a spectator view
    GetView {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<GameView>,
    },

    /// Get summary information about the table
    GetInfo {
        response: oneshot::Sender<TableInfo>,
    },

    /// Close table
    Close {
        response: oneshot::Sender<TableResponse>,
    },

    /// Internal: expire overdue turns (called by timer)
    Tick,

    /// Subscribe to state change notifications
    Subscribe {
        subscriber_id: Uuid,
        sender: mpsc::Sender<StateChangeNotification>,
    },

    /// Unsubscribe from state change notifications
    Unsubscribe { subscriber_id: Uuid },
}

/// Notification sent when table state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChangeNotification {
    /// Cards dealt, chips moved, or the turn changed
    StateChanged { hand_number: u64 },
    /// Player sat down or left
    PlayerListChanged,
    /// A player's turn expired and the engine acted for them
    TurnTimedOut(ActionRecord),
    /// A hand was paid out
    HandSettled(HandSummary),
    /// The table is shutting down
    Closed,
}

/// Response from table operations
#[derive(Debug, Clone, PartialEq)]
pub enum TableResponse {
    /// Operation succeeded
    Success,

    /// An action was recorded. When the turn had already expired, this is
    /// the timeout action rather than the requested one.
    Acted(ActionRecord),

    /// A new street was dealt
    StreetDealt(Street),

    /// The hand was settled
    HandSettled(HandSummary),

    /// The engine refused the operation; table state is unchanged
    Rejected(TableError),
}

impl TableResponse {
    /// Check if response is success
    pub fn is_success(&self) -> bool {
        !matches!(self, TableResponse::Rejected(_))
    }

    /// Get error message if response is error
    pub fn error_message(&self) -> Option<String> {
        match self {
            TableResponse::Rejected(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

impl From<Result<(), TableError>> for TableResponse {
    fn from(value: Result<(), TableError>) -> Self {
        match value {
            Ok(()) => Self::Success,
            Err(err) => Self::Rejected(err),
        }
    }
}

/// Table summary used for discovery
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub id: GameId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub hand_number: u64,
    /// Current game phase
    pub phase: String,
}
