//! Read-only table state: the full snapshot handed out by the table actor
//! and the per-player public view derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entities::{
    ActionRecord, Card, Chips, GameId, HandSummary, PlayerId, PlayerState, Pot, SeatIndex, Turn,
};
use super::state_machine::HandPhase;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeatSnapshot {
    pub seat_idx: SeatIndex,
    pub player_id: PlayerId,
    pub handle: String,
    pub state: PlayerState,
    pub stack: Chips,
    /// Chips put in on the current street.
    pub bet_so_far: Chips,
    /// Chips put in during the whole hand.
    pub contributed: Chips,
    pub small_blind: bool,
    pub hole: Vec<Card>,
}

/// Everything about a table at one instant. Hole cards of every player
/// are included, so this never leaves the process as-is; use
/// [`TableSnapshot::view_for`] to get something safe to show a player.
#[derive(Clone, Debug, PartialEq)]
pub struct TableSnapshot {
    pub game_id: GameId,
    pub hand_number: u64,
    pub phase: HandPhase,
    pub button: Option<SeatIndex>,
    pub small_blind_seat: Option<SeatIndex>,
    pub big_blind_seat: Option<SeatIndex>,
    /// Occupied seats clockwise from the small blind.
    pub seats: Vec<SeatSnapshot>,
    pub turn: Option<Turn>,
    pub bet_to_call: Chips,
    pub min_raise: Chips,
    pub flop: Vec<Card>,
    pub turn_card: Vec<Card>,
    pub river: Vec<Card>,
    pub pots: Vec<Pot>,
    pub log: Vec<ActionRecord>,
    pub last_hand: Option<HandSummary>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub seat: SeatIndex,
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    pub handle: String,
    pub state: PlayerState,
    pub wealth: Chips,
    pub bet_so_far: Chips,
    #[serde(rename = "small blind")]
    pub small_blind: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TurnView {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    pub bet_so_far: Chips,
    pub bet_to_player: Chips,
    pub minimum_raise: Chips,
    pub expiry: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CardsView {
    pub hole: Vec<Card>,
    pub flop: Vec<Card>,
    pub turn: Vec<Card>,
    pub river: Vec<Card>,
}

/// What one player (or a spectator) is allowed to see.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameView {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    pub hand_number: u64,
    pub phase: String,
    pub table: Vec<SeatView>,
    pub turn: Option<TurnView>,
    pub cards: CardsView,
    pub pots: Vec<Pot>,
    pub last_hand: Option<HandSummary>,
}

impl TableSnapshot {
    #[must_use]
    pub fn seat_of(&self, player_id: &PlayerId) -> Option<&SeatSnapshot> {
        self.seats.iter().find(|seat| &seat.player_id == player_id)
    }

    #[must_use]
    pub fn view_for(&self, viewer: Option<&PlayerId>) -> GameView {
        let table = self
            .seats
            .iter()
            .map(|seat| SeatView {
                seat: seat.seat_idx,
                player_id: seat.player_id.clone(),
                handle: seat.handle.clone(),
                state: seat.state,
                wealth: seat.stack,
                bet_so_far: seat.bet_so_far,
                small_blind: seat.small_blind,
            })
            .collect();

        let turn = self.turn.as_ref().map(|turn| {
            let bet_so_far = self
                .seat_of(&turn.player_id)
                .map_or(0, |seat| seat.bet_so_far);
            TurnView {
                player_id: turn.player_id.clone(),
                bet_so_far,
                bet_to_player: turn.bet_to_call.saturating_sub(bet_so_far),
                minimum_raise: turn.min_raise,
                expiry: turn.expiry,
            }
        });

        let hole = viewer
            .and_then(|viewer| self.seat_of(viewer))
            .map(|seat| seat.hole.clone())
            .unwrap_or_default();

        GameView {
            game_id: self.game_id,
            hand_number: self.hand_number,
            phase: self.phase.to_string(),
            table,
            turn,
            cards: CardsView {
                hole,
                flop: self.flop.clone(),
                turn: self.turn_card.clone(),
                river: self.river.clone(),
            },
            pots: self.pots.clone(),
            last_hand: self.last_hand.clone(),
        }
    }
}
