//! Table engine state machine.
//!
//! A [`Table`] owns the seats, the deck, and the betting state of a single
//! poker table. Every mutating operation validates first and only then
//! mutates, so a rejected call leaves the table exactly as it was.

use chrono::{DateTime, TimeDelta, Utc};
use enum_dispatch::enum_dispatch;
use log::{debug, error, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use thiserror::Error;

use super::constants::{
    DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, MAX_PLAYERS, MIN_PLAYERS,
    NUM_HOLE_CARDS,
};
use super::entities::{
    Action, ActionRecord, BetAction, Card, CardLocation, Chips, Deck, GameId, HandSummary,
    Payout, Player, PlayerId, PlayerState, Pot, SeatIndex, Stake, Street, SubHand, Turn,
};
use super::functional::{argmax, eval};
use super::states::{Betting, NoHand, Settlement};
use super::views::{GameView, SeatSnapshot, TableSnapshot};

/// Errors that reject a single table operation.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum TableError {
    #[error("seat {0} is occupied")]
    SeatOccupied(SeatIndex),
    #[error("seat {0} doesn't exist")]
    InvalidSeat(SeatIndex),
    #[error("player {0} is already seated")]
    DuplicatePlayer(PlayerId),
    #[error("need {MIN_PLAYERS}+ players with chips")]
    InsufficientPlayers,
    #[error("deck exhausted: {requested} cards requested, {remaining} left")]
    DeckExhausted { requested: usize, remaining: usize },
    #[error("betting on this street isn't complete")]
    BettingIncomplete,
    #[error("not your turn")]
    NotYourTurn,
    #[error("illegal action: {0}")]
    IllegalAction(String),
    #[error("a hand is already in progress")]
    HandInProgress,
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("betting is over; the hand is waiting to be settled")]
    AwaitingSettlement,
    #[error("player {0} isn't seated")]
    UnknownPlayer(PlayerId),
    #[error("a stack of {0} would put more chips on the table than it can hold")]
    StackTooLarge(Chips),
}

/// Behavior that depends on the phase of the current hand.
#[enum_dispatch]
pub trait PhaseRules {
    /// Street of the running hand, if any.
    fn street(&self) -> Option<Street>;

    /// Whether a player can act right now.
    fn accepts_actions(&self) -> bool;

    fn label(&self) -> String;
}

impl PhaseRules for NoHand {
    fn street(&self) -> Option<Street> {
        None
    }

    fn accepts_actions(&self) -> bool {
        false
    }

    fn label(&self) -> String {
        "waiting".to_string()
    }
}

impl PhaseRules for Betting {
    fn street(&self) -> Option<Street> {
        Some(self.street)
    }

    fn accepts_actions(&self) -> bool {
        !self.complete
    }

    fn label(&self) -> String {
        if self.complete {
            format!("{} complete", self.street)
        } else {
            format!("{} betting", self.street)
        }
    }
}

impl PhaseRules for Settlement {
    fn street(&self) -> Option<Street> {
        Some(self.street)
    }

    fn accepts_actions(&self) -> bool {
        false
    }

    fn label(&self) -> String {
        "settlement".to_string()
    }
}

#[enum_dispatch(PhaseRules)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HandPhase {
    NoHand,
    Betting,
    Settlement,
}

impl HandPhase {
    #[must_use]
    pub fn in_hand(&self) -> bool {
        !matches!(self, Self::NoHand(_))
    }
}

impl Default for HandPhase {
    fn default() -> Self {
        NoHand {}.into()
    }
}

impl fmt::Display for HandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Rules a table is played with.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub max_players: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub action_timeout_secs: i64,
    /// Fixed seed for the shuffle. Without one the RNG is seeded from the OS.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            seed: None,
        }
    }
}

/// An authoritative poker table.
#[derive(Debug)]
pub struct Table {
    game_id: GameId,
    settings: GameSettings,
    seats: Vec<Option<Player>>,
    /// Instantiated once and reshuffled every hand.
    deck: Deck,
    rng: StdRng,
    phase: HandPhase,
    hand_number: u64,
    button: Option<SeatIndex>,
    small_blind_seat: Option<SeatIndex>,
    big_blind_seat: Option<SeatIndex>,
    turn: Option<Turn>,
    turn_seq: u64,
    /// Highest street contribution of any player.
    bet_to_call: Chips,
    min_raise: Chips,
    /// Audit log of the current hand.
    log: Vec<ActionRecord>,
    pots: Vec<Pot>,
    last_hand: Option<HandSummary>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(GameId::new_v4(), GameSettings::default())
    }
}

impl Table {
    #[must_use]
    pub fn new(game_id: GameId, settings: GameSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            game_id,
            seats: vec![None; MAX_PLAYERS],
            deck: Deck::default(),
            rng,
            phase: HandPhase::default(),
            hand_number: 0,
            button: None,
            small_blind_seat: None,
            big_blind_seat: None,
            turn: None,
            turn_seq: 0,
            bet_to_call: 0,
            min_raise: settings.big_blind,
            log: Vec::new(),
            pots: Vec::new(),
            last_hand: None,
            settings,
        }
    }

    #[must_use]
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn phase(&self) -> HandPhase {
        self.phase
    }

    #[must_use]
    pub fn turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }

    #[must_use]
    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    #[must_use]
    pub fn pots(&self) -> &[Pot] {
        &self.pots
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn last_hand(&self) -> Option<&HandSummary> {
        self.last_hand.as_ref()
    }

    #[must_use]
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.seats.iter().flatten().find(|player| &player.id == player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.seats.iter().flatten()
    }

    #[must_use]
    pub fn num_seated(&self) -> usize {
        self.players().count()
    }

    /// Chips on the table: every stack plus every chip put into the pot.
    /// Seating keeps this within [`Chips`], so no pot or payout built from
    /// these chips can overflow.
    #[must_use]
    pub fn chips_in_play(&self) -> Chips {
        self.players()
            .map(|player| player.stack.saturating_add(player.contributed))
            .fold(0, Chips::saturating_add)
    }

    fn num_seats(&self) -> usize {
        self.settings.max_players.min(MAX_PLAYERS)
    }

    fn seat_of(&self, player_id: &PlayerId) -> Option<SeatIndex> {
        self.players()
            .find(|player| &player.id == player_id)
            .map(|player| player.seat_idx)
    }

    fn player_at(&self, seat_idx: SeatIndex) -> Option<&Player> {
        self.seats.get(seat_idx).and_then(Option::as_ref)
    }

    fn player_mut(&mut self, seat_idx: SeatIndex) -> Result<&mut Player, TableError> {
        self.seats
            .get_mut(seat_idx)
            .and_then(Option::as_mut)
            .ok_or(TableError::InvalidSeat(seat_idx))
    }

    /// Occupied seats clockwise, starting from the small blind.
    fn seat_order(&self) -> Vec<SeatIndex> {
        let start = self.small_blind_seat.unwrap_or(0);
        (0..MAX_PLAYERS)
            .map(|offset| (start + offset) % MAX_PLAYERS)
            .filter(|seat_idx| self.seats[*seat_idx].is_some())
            .collect()
    }

    /// Seats dealt into the current hand, starting from the small blind.
    fn hand_order(&self) -> Vec<SeatIndex> {
        self.seat_order()
            .into_iter()
            .filter(|seat_idx| {
                self.player_at(*seat_idx)
                    .is_some_and(|player| player.state != PlayerState::SittingOut)
            })
            .collect()
    }

    fn live_seats(&self) -> Vec<SeatIndex> {
        self.hand_order()
            .into_iter()
            .filter(|seat_idx| self.player_at(*seat_idx).is_some_and(Player::in_hand))
            .collect()
    }

    fn needs_action(&self, player: &Player) -> bool {
        player.can_act() && (!player.has_acted || player.street_bet < self.bet_to_call)
    }

    fn betting_complete(&self) -> bool {
        let actionable: Vec<&Player> = self.players().filter(|player| player.can_act()).collect();
        match actionable.as_slice() {
            [] => true,
            // Nobody left to bet against.
            [only] => only.street_bet >= self.bet_to_call,
            _ => actionable.iter().all(|player| !self.needs_action(player)),
        }
    }

    /// First seat clockwise after `after` whose player owes an action.
    fn next_actor(&self, after: SeatIndex) -> Option<SeatIndex> {
        (1..=MAX_PLAYERS)
            .map(|offset| (after + offset) % MAX_PLAYERS)
            .find(|seat_idx| {
                self.player_at(*seat_idx)
                    .is_some_and(|player| self.needs_action(player))
            })
    }

    fn set_turn(&mut self, seat_idx: SeatIndex, now: DateTime<Utc>) {
        let Some(player_id) = self.player_at(seat_idx).map(|player| player.id.clone()) else {
            error!("table {}: no player at seat {seat_idx} to act", self.game_id);
            self.turn = None;
            return;
        };
        let timeout = TimeDelta::try_seconds(self.settings.action_timeout_secs)
            .unwrap_or(TimeDelta::zero());
        let expiry = now.checked_add_signed(timeout).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.turn_seq += 1;
        self.turn = Some(Turn {
            seq: self.turn_seq,
            seat_idx,
            player_id,
            bet_to_call: self.bet_to_call,
            min_raise: self.min_raise,
            expiry,
        });
    }

    fn refresh_pots(&mut self) {
        let order = self.hand_order();
        let stakes: Vec<Stake<'_>> = order
            .iter()
            .filter_map(|seat_idx| self.player_at(*seat_idx))
            .map(|player| Stake {
                player_id: &player.id,
                contributed: player.contributed,
                folded: player.state == PlayerState::Folded,
                all_in: player.state == PlayerState::AllIn,
            })
            .collect();
        let pots = Pot::partition(&stakes);
        self.pots = pots;
    }

    fn enter_settlement(&mut self) {
        let street = self.phase.street().unwrap_or(Street::Preflop);
        self.turn = None;
        self.phase = Settlement { street }.into();
        info!(
            "table {}: hand #{} betting over on the {street}",
            self.game_id, self.hand_number
        );
    }

    fn close_street(&mut self) {
        self.turn = None;
        match self.phase.street() {
            Some(Street::River) => self.enter_settlement(),
            Some(street) => {
                self.phase = Betting {
                    street,
                    complete: true,
                }
                .into();
                debug!("table {}: {street} betting complete", self.game_id);
            }
            None => {}
        }
    }

    /// Bring the betting state up to date after chips or player states
    /// changed. With `from` set, the turn moves to the next player after
    /// that seat who owes an action.
    fn resolve_betting(&mut self, from: Option<SeatIndex>, now: DateTime<Utc>) {
        self.refresh_pots();
        if self.live_seats().len() <= 1 {
            self.enter_settlement();
        } else if self.betting_complete() {
            self.close_street();
        } else if let Some(from) = from {
            match self.next_actor(from) {
                Some(seat_idx) => self.set_turn(seat_idx, now),
                None => self.close_street(),
            }
        }
    }

    fn deal_to(&mut self, location: CardLocation, count: usize) -> Result<Vec<Card>, TableError> {
        self.deck.deal_to(location, count).inspect_err(|err| {
            error!("table {}: {err}", self.game_id);
        })
    }

    /// Sit a player down. Players seated while a hand runs sit out until
    /// the next one.
    pub fn seat(
        &mut self,
        player_id: PlayerId,
        handle: &str,
        seat_idx: SeatIndex,
        stack: Chips,
    ) -> Result<(), TableError> {
        if seat_idx >= self.num_seats() {
            return Err(TableError::InvalidSeat(seat_idx));
        }
        if self.seats[seat_idx].is_some() {
            return Err(TableError::SeatOccupied(seat_idx));
        }
        if self.seat_of(&player_id).is_some() {
            return Err(TableError::DuplicatePlayer(player_id));
        }
        if self.chips_in_play().checked_add(stack).is_none() {
            warn!(
                "table {}: refused {player_id} with a stack of {stack}",
                self.game_id
            );
            return Err(TableError::StackTooLarge(stack));
        }

        let mut player = Player::new(player_id, handle, seat_idx, stack);
        if !self.phase.in_hand() && stack > 0 {
            player.state = PlayerState::Active;
        }
        info!(
            "table {}: {} sat at seat {seat_idx} with {stack}",
            self.game_id, player.id
        );
        self.seats[seat_idx] = Some(player);
        Ok(())
    }

    /// Remove a player. During a hand the player is folded out and leaves
    /// once the hand settles; chips already in the pot stay there.
    pub fn unseat(&mut self, player_id: &PlayerId) -> Result<Option<ActionRecord>, TableError> {
        self.unseat_at(player_id, Utc::now())
    }

    pub fn unseat_at(
        &mut self,
        player_id: &PlayerId,
        now: DateTime<Utc>,
    ) -> Result<Option<ActionRecord>, TableError> {
        let seat_idx = self
            .seat_of(player_id)
            .ok_or_else(|| TableError::UnknownPlayer(player_id.clone()))?;
        let phase = self.phase;
        let game_id = self.game_id;
        let player = self.player_mut(seat_idx)?;

        if !phase.in_hand() || player.state == PlayerState::SittingOut {
            self.seats[seat_idx] = None;
            info!("table {game_id}: {player_id} left seat {seat_idx}");
            return Ok(None);
        }

        player.leaving = true;
        info!("table {game_id}: {player_id} will leave seat {seat_idx} after the hand");
        if !player.in_hand() || !matches!(phase, HandPhase::Betting(_)) {
            return Ok(None);
        }

        let is_turn = self
            .turn
            .as_ref()
            .is_some_and(|turn| turn.seat_idx == seat_idx);
        if is_turn {
            return self.apply(seat_idx, BetAction::Fold, 0, false, now).map(Some);
        }

        // Fold out of turn; whoever is to act keeps the turn.
        let round_number = phase.street().map_or(0, Street::round_number);
        let player = self.player_mut(seat_idx)?;
        player.state = PlayerState::Folded;
        player.has_acted = true;
        let record = ActionRecord {
            round_number,
            player_id: player.id.clone(),
            action: BetAction::Fold,
            amount: 0,
            timed_out: false,
        };
        self.deck
            .relocate(CardLocation::Hole(seat_idx), CardLocation::Discarded);
        debug!("table {}: {record}", self.game_id);
        self.log.push(record.clone());
        self.resolve_betting(None, now);
        Ok(Some(record))
    }

    /// Deal a new hand: move the blinds, shuffle, deal hole cards, post
    /// blinds, and hand the turn to the first player to act.
    pub fn start_hand(&mut self) -> Result<(), TableError> {
        self.start_hand_at(Utc::now())
    }

    pub fn start_hand_at(&mut self, now: DateTime<Utc>) -> Result<(), TableError> {
        if self.phase.in_hand() {
            return Err(TableError::HandInProgress);
        }
        let mut eligible: Vec<SeatIndex> = self
            .players()
            .filter(|player| player.stack > 0)
            .map(|player| player.seat_idx)
            .collect();
        if eligible.len() < MIN_PLAYERS {
            return Err(TableError::InsufficientPlayers);
        }

        let small_blind = match self.small_blind_seat {
            Some(previous) => (1..=MAX_PLAYERS)
                .map(|offset| (previous + offset) % MAX_PLAYERS)
                .find(|seat_idx| eligible.contains(seat_idx))
                .unwrap_or(eligible[0]),
            None => eligible[0],
        };
        let sb_pos = eligible
            .iter()
            .position(|seat_idx| *seat_idx == small_blind)
            .unwrap_or(0);
        eligible.rotate_left(sb_pos);
        let big_blind = eligible[1];
        // Heads-up the small blind has the button.
        let button = if eligible.len() == 2 {
            small_blind
        } else {
            eligible[eligible.len() - 1]
        };

        self.hand_number += 1;
        for player in self.seats.iter_mut().flatten() {
            player.reset();
        }
        self.button = Some(button);
        self.small_blind_seat = Some(small_blind);
        self.big_blind_seat = Some(big_blind);
        self.log.clear();
        self.pots.clear();
        self.turn = None;
        self.bet_to_call = 0;
        self.min_raise = self.settings.big_blind;

        self.deck.shuffle(&mut self.rng);
        for seat_idx in &eligible {
            self.deal_to(CardLocation::Hole(*seat_idx), NUM_HOLE_CARDS)?;
        }
        self.phase = Betting::open(Street::Preflop).into();
        self.post_blind(small_blind, self.settings.small_blind, BetAction::SmallBlind)?;
        self.post_blind(big_blind, self.settings.big_blind, BetAction::BigBlind)?;

        info!(
            "table {}: hand #{}, {} players, button {button}, SB {small_blind}, BB {big_blind}",
            self.game_id,
            self.hand_number,
            eligible.len()
        );
        self.resolve_betting(Some(big_blind), now);
        Ok(())
    }

    /// Short stacks post what they have.
    fn post_blind(
        &mut self,
        seat_idx: SeatIndex,
        blind: Chips,
        action: BetAction,
    ) -> Result<(), TableError> {
        let player = self.player_mut(seat_idx)?;
        let amount = blind.min(player.stack);
        player.commit(amount);
        let street_bet = player.street_bet;
        let record = ActionRecord {
            round_number: Street::Preflop.round_number(),
            player_id: player.id.clone(),
            action,
            amount,
            timed_out: false,
        };
        self.bet_to_call = self.bet_to_call.max(street_bet);
        debug!("table {}: {record}", self.game_id);
        self.log.push(record);
        Ok(())
    }

    /// Burn a card, deal the next street, and reopen betting.
    pub fn advance_street(&mut self) -> Result<Street, TableError> {
        self.advance_street_at(Utc::now())
    }

    pub fn advance_street_at(&mut self, now: DateTime<Utc>) -> Result<Street, TableError> {
        let street = match self.phase {
            HandPhase::NoHand(_) => return Err(TableError::NoHandInProgress),
            HandPhase::Settlement(_) => return Err(TableError::AwaitingSettlement),
            HandPhase::Betting(Betting {
                complete: false, ..
            }) => return Err(TableError::BettingIncomplete),
            HandPhase::Betting(Betting {
                street,
                complete: true,
            }) => street,
        };
        let Some((next, (location, count))) = street
            .next()
            .and_then(|next| next.community_cards().map(|cards| (next, cards)))
        else {
            return Err(TableError::AwaitingSettlement);
        };
        if self.deck.remaining() < count + 1 {
            let err = TableError::DeckExhausted {
                requested: count + 1,
                remaining: self.deck.remaining(),
            };
            error!("table {}: {err}", self.game_id);
            return Err(err);
        }

        self.deal_to(CardLocation::Discarded, 1)?;
        let cards = self.deal_to(location, count)?;
        for player in self.seats.iter_mut().flatten() {
            player.street_bet = 0;
            player.has_acted = false;
        }
        self.bet_to_call = 0;
        self.min_raise = self.settings.big_blind;
        self.phase = Betting::open(next).into();

        let cards: Vec<String> = cards.iter().map(Card::to_string).collect();
        info!(
            "table {}: hand #{} {next} {}",
            self.game_id,
            self.hand_number,
            cards.join(" ")
        );
        let button = self.button.unwrap_or(0);
        self.resolve_betting(Some(button), now);
        Ok(next)
    }

    /// Take an action for the player whose turn it is.
    pub fn act(
        &mut self,
        player_id: &PlayerId,
        action: Action,
    ) -> Result<ActionRecord, TableError> {
        self.act_at(player_id, action, Utc::now())
    }

    /// Like [`Table::act`] at an explicit instant. If the turn already
    /// expired, the timeout action is applied instead of `action` and its
    /// record is returned.
    pub fn act_at(
        &mut self,
        player_id: &PlayerId,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<ActionRecord, TableError> {
        if !self.phase.accepts_actions() {
            return Err(TableError::NoHandInProgress);
        }
        let Some(turn) = &self.turn else {
            return Err(TableError::NoHandInProgress);
        };
        if &turn.player_id != player_id {
            return Err(TableError::NotYourTurn);
        }
        if turn.is_expired(now) {
            return self.expire_turn(now);
        }

        let seat_idx = turn.seat_idx;
        let (kind, amount) = self.validate(seat_idx, action)?;
        self.apply(seat_idx, kind, amount, false, now)
    }

    fn validate(
        &self,
        seat_idx: SeatIndex,
        action: Action,
    ) -> Result<(BetAction, Chips), TableError> {
        let player = self
            .player_at(seat_idx)
            .ok_or(TableError::InvalidSeat(seat_idx))?;
        let to_call = self.bet_to_call.saturating_sub(player.street_bet);
        // Back on turn after acting means a short all-in raised since.
        let reopened = !player.has_acted;
        let illegal = |reason: String| Err(TableError::IllegalAction(reason));
        match action {
            Action::Fold => Ok((BetAction::Fold, 0)),
            Action::Check if to_call > 0 => illegal(format!("can't check with {to_call} to call")),
            Action::Check => Ok((BetAction::Check, 0)),
            Action::Call if to_call == 0 => illegal("nothing to call".to_string()),
            Action::Call => Ok((BetAction::Call, to_call.min(player.stack))),
            Action::Bet(_) if self.bet_to_call > 0 => illegal(format!(
                "can't bet into an outstanding bet of {}",
                self.bet_to_call
            )),
            Action::Bet(amount) if amount < self.min_raise => illegal(format!(
                "bet of {amount} is below the minimum of {}",
                self.min_raise
            )),
            Action::Bet(amount) if amount > player.stack => illegal(format!(
                "bet of {amount} is more than the stack of {}",
                player.stack
            )),
            Action::Bet(amount) => Ok((BetAction::Bet, amount)),
            Action::Raise(_) if self.bet_to_call == 0 => {
                illegal("nothing to raise; bet instead".to_string())
            }
            Action::Raise(_) if !reopened => {
                illegal("an incomplete raise doesn't reopen the betting".to_string())
            }
            Action::Raise(by) if by < self.min_raise => illegal(format!(
                "raise of {by} is below the minimum of {}",
                self.min_raise
            )),
            Action::Raise(by) if to_call.saturating_add(by) > player.stack => illegal(format!(
                "raise to {} is more than the stack of {}",
                to_call.saturating_add(by),
                player.stack
            )),
            Action::Raise(by) => Ok((BetAction::Raise, to_call + by)),
            Action::AllIn if !reopened && player.stack > to_call => {
                illegal("an incomplete raise doesn't reopen the betting".to_string())
            }
            Action::AllIn => Ok((BetAction::AllIn, player.stack)),
        }
    }

    fn apply(
        &mut self,
        seat_idx: SeatIndex,
        kind: BetAction,
        amount: Chips,
        timed_out: bool,
        now: DateTime<Utc>,
    ) -> Result<ActionRecord, TableError> {
        let previous_bet = self.bet_to_call;
        let round_number = self.phase.street().map_or(0, Street::round_number);
        let player = self.player_mut(seat_idx)?;
        if kind == BetAction::Fold {
            player.state = PlayerState::Folded;
        } else {
            player.commit(amount);
        }
        player.has_acted = true;
        let street_bet = player.street_bet;
        let record = ActionRecord {
            round_number,
            player_id: player.id.clone(),
            action: kind,
            amount,
            timed_out,
        };

        if kind == BetAction::Fold {
            self.deck
                .relocate(CardLocation::Hole(seat_idx), CardLocation::Discarded);
        }
        if street_bet > previous_bet {
            // A short all-in only owes the others a call. Players who
            // already acted can't raise again unless the raise was full.
            let raise = street_bet - previous_bet;
            let full_raise = raise >= self.min_raise;
            if full_raise {
                self.min_raise = raise;
            }
            self.bet_to_call = street_bet;
            for other in self.seats.iter_mut().flatten() {
                if full_raise && other.seat_idx != seat_idx && other.can_act() {
                    other.has_acted = false;
                }
            }
        }

        debug!("table {}: {record}", self.game_id);
        self.log.push(record.clone());
        self.resolve_betting(Some(seat_idx), now);
        Ok(record)
    }

    /// Check if there's nothing to call, otherwise fold.
    fn expire_turn(&mut self, now: DateTime<Utc>) -> Result<ActionRecord, TableError> {
        let Some(turn) = &self.turn else {
            return Err(TableError::NoHandInProgress);
        };
        let seat_idx = turn.seat_idx;
        let player = self
            .player_at(seat_idx)
            .ok_or(TableError::InvalidSeat(seat_idx))?;
        let kind = if player.street_bet >= self.bet_to_call {
            BetAction::Check
        } else {
            BetAction::Fold
        };
        warn!(
            "table {}: {} timed out and will {kind}",
            self.game_id, player.id
        );
        self.apply(seat_idx, kind, 0, true, now)
    }

    /// Scheduler hook. Applies the timeout action if turn `turn_seq` is
    /// still current and expired at `now`; anything else is a no-op.
    pub fn on_timeout(&mut self, turn_seq: u64, now: DateTime<Utc>) -> Option<ActionRecord> {
        let turn = self.turn.as_ref()?;
        if turn.seq != turn_seq || !turn.is_expired(now) {
            return None;
        }
        self.expire_turn(now).ok()
    }

    /// Pay out every pot and close the hand.
    pub fn settle_hand(&mut self) -> Result<HandSummary, TableError> {
        match self.phase {
            HandPhase::NoHand(_) => return Err(TableError::NoHandInProgress),
            HandPhase::Betting(_) => return Err(TableError::BettingIncomplete),
            HandPhase::Settlement(_) => {}
        }

        self.refresh_pots();
        let live = self.live_seats();
        let board = self.deck.board();
        let mut payouts: Vec<Payout> = Vec::new();

        if let [winner] = live.as_slice() {
            let total = self.pots.iter().map(|pot| pot.size).sum();
            self.credit(&mut payouts, *winner, total, None);
        } else {
            let hands: HashMap<SeatIndex, SubHand> = live
                .iter()
                .map(|seat_idx| {
                    let mut cards = self.deck.cards_at(CardLocation::Hole(*seat_idx));
                    cards.extend(&board);
                    (*seat_idx, eval(&cards))
                })
                .collect();
            let pots = std::mem::take(&mut self.pots);
            for pot in &pots {
                let mut contenders: Vec<SeatIndex> = pot
                    .players
                    .iter()
                    .filter_map(|player_id| self.seat_of(player_id))
                    .filter(|seat_idx| hands.contains_key(seat_idx))
                    .collect();
                if contenders.is_empty() {
                    error!(
                        "table {}: pot of {} has nobody eligible; splitting it among live players",
                        self.game_id, pot.size
                    );
                    contenders.clone_from(&live);
                }
                let (contenders, subhands): (Vec<SeatIndex>, Vec<SubHand>) = contenders
                    .into_iter()
                    .filter_map(|seat_idx| {
                        hands.get(&seat_idx).map(|hand| (seat_idx, hand.clone()))
                    })
                    .unzip();
                let winners: Vec<(SeatIndex, SubHand)> = argmax(&subhands)
                    .into_iter()
                    .map(|idx| (contenders[idx], subhands[idx].clone()))
                    .collect();
                self.split_pot(pot.size, winners, &mut payouts);
            }
        }

        let summary = HandSummary {
            hand_number: self.hand_number,
            board,
            log: std::mem::take(&mut self.log),
            payouts,
        };
        for payout in &summary.payouts {
            info!(
                "table {}: hand #{} {} won {}",
                self.game_id, summary.hand_number, payout.player_id, payout.amount
            );
        }
        self.finish_hand();
        self.last_hand = Some(summary.clone());
        Ok(summary)
    }

    /// Split `size` chips evenly. Leftover chips go one at a time to the
    /// winners closest to the left of the button.
    fn split_pot(
        &mut self,
        size: Chips,
        mut winners: Vec<(SeatIndex, SubHand)>,
        payouts: &mut Vec<Payout>,
    ) {
        if winners.is_empty() {
            return;
        }
        let button = self.button.unwrap_or(0);
        let left_of_button =
            |seat_idx: SeatIndex| (seat_idx + MAX_PLAYERS - button - 1) % MAX_PLAYERS;
        winners.sort_by_key(|(seat_idx, _)| left_of_button(*seat_idx));
        let num_winners = winners.len() as Chips;
        let share = size / num_winners;
        let remainder = size % num_winners;
        for (idx, (seat_idx, hand)) in winners.into_iter().enumerate() {
            let extra = Chips::from((idx as Chips) < remainder);
            self.credit(payouts, seat_idx, share + extra, Some(hand.rank.to_string()));
        }
    }

    fn credit(
        &mut self,
        payouts: &mut Vec<Payout>,
        seat_idx: SeatIndex,
        amount: Chips,
        hand: Option<String>,
    ) {
        let Some(player) = self.seats.get_mut(seat_idx).and_then(Option::as_mut) else {
            error!("table {}: no player at seat {seat_idx} to pay", self.game_id);
            return;
        };
        player.stack += amount;
        match payouts.iter_mut().find(|payout| payout.player_id == player.id) {
            Some(payout) => payout.amount += amount,
            None => payouts.push(Payout {
                player_id: player.id.clone(),
                amount,
                hand,
            }),
        }
    }

    fn finish_hand(&mut self) {
        for seat in &mut self.seats {
            let Some(player) = seat else {
                continue;
            };
            if player.leaving {
                info!("table {}: {} left the table", self.game_id, player.id);
                *seat = None;
                continue;
            }
            player.contributed = 0;
            player.street_bet = 0;
            player.has_acted = false;
            player.state = if player.stack > 0 {
                PlayerState::Active
            } else {
                info!("table {}: {} is out of chips", self.game_id, player.id);
                PlayerState::SittingOut
            };
        }
        self.deck = Deck::default();
        self.pots.clear();
        self.turn = None;
        self.bet_to_call = 0;
        self.min_raise = self.settings.big_blind;
        self.phase = NoHand {}.into();
    }

    /// Point-in-time copy of the whole table, hole cards included.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        let in_hand = self.phase.in_hand();
        let seats = self
            .seat_order()
            .into_iter()
            .filter_map(|seat_idx| self.player_at(seat_idx))
            .map(|player| SeatSnapshot {
                seat_idx: player.seat_idx,
                player_id: player.id.clone(),
                handle: player.handle.clone(),
                state: player.state,
                stack: player.stack,
                bet_so_far: player.street_bet,
                contributed: player.contributed,
                small_blind: in_hand && self.small_blind_seat == Some(player.seat_idx),
                hole: self.deck.cards_at(CardLocation::Hole(player.seat_idx)),
            })
            .collect();
        TableSnapshot {
            game_id: self.game_id,
            hand_number: self.hand_number,
            phase: self.phase,
            button: self.button,
            small_blind_seat: self.small_blind_seat,
            big_blind_seat: self.big_blind_seat,
            seats,
            turn: self.turn.clone(),
            bet_to_call: self.bet_to_call,
            min_raise: self.min_raise,
            flop: self.deck.cards_at(CardLocation::Flop),
            turn_card: self.deck.cards_at(CardLocation::Turn),
            river: self.deck.cards_at(CardLocation::River),
            pots: self.pots.clone(),
            log: self.log.clone(),
            last_hand: self.last_hand.clone(),
        }
    }

    /// Public view for `viewer`. Only the viewer's own hole cards are shown.
    #[must_use]
    pub fn view_for(&self, viewer: Option<&PlayerId>) -> GameView {
        self.snapshot().view_for(viewer)
    }
}
