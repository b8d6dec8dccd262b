//! Hand phases of the table engine.
//!
//! Each phase is its own type; [`super::state_machine::HandPhase`]
//! dispatches over them.

use crate::game::entities::Street;

/// Between hands. Seats can change freely.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NoHand {}

/// A betting round is running on `street`. Once every player still able
/// to act has matched the bet-to-call, `complete` is set and the table
/// waits for the next street to be dealt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Betting {
    pub street: Street,
    pub complete: bool,
}

impl Betting {
    #[must_use]
    pub fn open(street: Street) -> Self {
        Self {
            street,
            complete: false,
        }
    }
}

/// Betting is over for good: either the river was completed or everyone
/// but one player folded. The pots wait to be paid out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settlement {
    pub street: Street,
}
