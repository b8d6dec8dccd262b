use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    collections::HashMap,
    fmt::{self},
    str::FromStr,
};
use thiserror::Error;

use super::constants::{self, DECK_SIZE};
use super::state_machine::TableError;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Club, Self::Diamond, Self::Heart, Self::Spade];

    fn code(self) -> char {
        match self {
            Self::Club => 'C',
            Self::Diamond => 'D',
            Self::Heart => 'H',
            Self::Spade => 'S',
        }
    }
}

/// Card values run from 2 through 14 (ace high).
pub type Value = u8;

const VALUE_CODES: &str = "23456789TJQKA";

#[derive(Debug, Eq, Error, PartialEq)]
pub enum CardParseError {
    #[error("card code must be exactly two characters, got {0:?}")]
    Length(String),
    #[error("unknown rank {0:?}")]
    Rank(char),
    #[error("unknown suit {0:?}")]
    Suit(char),
}

/// A playing card. Its wire form is the two-character `<RANK><SUIT>`
/// code, e.g. `"AC"` or `"TD"`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = VALUE_CODES
            .chars()
            .nth(usize::from(self.0.saturating_sub(2)))
            .unwrap_or('?');
        write!(f, "{rank}{}", self.1.code())
    }
}

impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(rank), Some(suit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(CardParseError::Length(s.to_string()));
        };
        let rank = rank.to_ascii_uppercase();
        let value = VALUE_CODES
            .find(rank)
            .map(|idx| idx as Value + 2)
            .ok_or(CardParseError::Rank(rank))?;
        let suit = match suit.to_ascii_uppercase() {
            'C' => Suit::Club,
            'D' => Suit::Diamond,
            'H' => Suit::Heart,
            'S' => Suit::Spade,
            other => return Err(CardParseError::Suit(other)),
        };
        Ok(Self(value, suit))
    }
}

impl Serialize for Card {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// A ranked five-card hand. `values` are ordered by how often each value
/// appears and then by value, so the derived ordering compares hands
/// correctly within the same rank.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubHand {
    pub rank: Rank,
    pub values: Vec<Value>,
}

/// Where a card currently lives. Every card of the deck is in exactly
/// one location at all times.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CardLocation {
    Undealt,
    Hole(SeatIndex),
    Flop,
    Turn,
    River,
    Discarded,
}

#[derive(Debug)]
pub struct Deck {
    /// Undealt cards in deal order. The next card dealt is the last one.
    undealt: Vec<Card>,
    /// Dealt cards in the order they left the undealt pile.
    dealt: Vec<Card>,
    locations: HashMap<Card, CardLocation>,
}

impl Default for Deck {
    fn default() -> Self {
        let mut undealt = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for value in 2..=14 {
                undealt.push(Card(value, suit));
            }
        }
        let locations = undealt
            .iter()
            .map(|card| (*card, CardLocation::Undealt))
            .collect();
        Self {
            undealt,
            dealt: Vec::with_capacity(DECK_SIZE),
            locations,
        }
    }
}

impl Deck {
    /// Return every card to the undealt pile and shuffle it once.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.undealt.append(&mut self.dealt);
        self.undealt.sort_unstable();
        self.undealt.shuffle(rng);
        for location in self.locations.values_mut() {
            *location = CardLocation::Undealt;
        }
    }

    pub fn remaining(&self) -> usize {
        self.undealt.len()
    }

    /// Move `count` cards from the undealt pile to `location`.
    pub fn deal_to(
        &mut self,
        location: CardLocation,
        count: usize,
    ) -> Result<Vec<Card>, TableError> {
        if self.undealt.len() < count {
            return Err(TableError::DeckExhausted {
                requested: count,
                remaining: self.undealt.len(),
            });
        }
        let cards = self.undealt.split_off(self.undealt.len() - count);
        for card in &cards {
            self.locations.insert(*card, location);
            self.dealt.push(*card);
        }
        Ok(cards)
    }

    /// Move every card at `from` to `to`.
    pub fn relocate(&mut self, from: CardLocation, to: CardLocation) {
        for location in self.locations.values_mut() {
            if *location == from {
                *location = to;
            }
        }
    }

    /// Cards at `location` in the order they were dealt.
    #[must_use]
    pub fn cards_at(&self, location: CardLocation) -> Vec<Card> {
        self.dealt
            .iter()
            .filter(|card| self.locations.get(card) == Some(&location))
            .copied()
            .collect()
    }

    #[must_use]
    pub fn location_of(&self, card: &Card) -> Option<CardLocation> {
        self.locations.get(card).copied()
    }

    /// Community cards dealt so far, flop first.
    #[must_use]
    pub fn board(&self) -> Vec<Card> {
        let mut board = self.cards_at(CardLocation::Flop);
        board.extend(self.cards_at(CardLocation::Turn));
        board.extend(self.cards_at(CardLocation::River));
        board
    }

    /// Check that the locations form a disjoint cover of all 52 cards.
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        let undealt_ok = self
            .undealt
            .iter()
            .all(|card| self.locations.get(card) == Some(&CardLocation::Undealt));
        let dealt_ok = self
            .dealt
            .iter()
            .all(|card| {
                !matches!(
                    self.locations.get(card),
                    None | Some(CardLocation::Undealt)
                )
            });
        self.locations.len() == DECK_SIZE
            && self.undealt.len() + self.dealt.len() == DECK_SIZE
            && undealt_ok
            && dealt_ok
    }

    /// Arrange the undealt pile so the next streets come out as `board`.
    /// Leaves the deck untouched and returns `false` if a card was dealt.
    #[cfg(test)]
    pub(crate) fn stack_board(&mut self, board: [Card; 5]) -> bool {
        let undealt = |card: &Card| self.location_of(card) == Some(CardLocation::Undealt);
        if !board.iter().all(undealt) || self.undealt.len() < board.len() + 3 {
            return false;
        }
        self.undealt.retain(|card| !board.contains(card));
        let burns = self.undealt.split_off(self.undealt.len() - 3);
        // Dealt from the end: burn, flop, burn, turn, burn, river.
        self.undealt.extend([board[4], burns[2], board[3], burns[1]]);
        self.undealt.extend([board[2], board[1], board[0], burns[0]]);
        true
    }
}

/// Whole chips. Stacks, bets, and pots are all counted in chips.
pub type Chips = u32;

/// Type alias for seat positions at the table.
pub type SeatIndex = usize;

/// Identifies a table in the registry and in the public view.
pub type GameId = uuid::Uuid;

/// Opaque player identity token. The transport layer decides what it is
/// (the server hands out UUIDs); the engine only compares them.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[must_use]
pub fn sanitize_handle(handle: &str) -> String {
    let mut handle: String = handle
        .chars()
        .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
        .collect();
    if let Some((idx, _)) = handle.char_indices().nth(constants::MAX_HANDLE_LENGTH) {
        handle.truncate(idx);
    }
    handle
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerState {
    // In the hand and able to act.
    Active,
    // Gave up the hand.
    Folded,
    // In the hand with no chips behind.
    AllIn,
    // Seated but not dealt into the current hand.
    SittingOut,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Active => "active",
            Self::Folded => "folded",
            Self::AllIn => "all-in",
            Self::SittingOut => "sitting-out",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub handle: String,
    pub seat_idx: SeatIndex,
    pub stack: Chips,
    pub state: PlayerState,
    /// Chips put into the pot during the current hand.
    pub contributed: Chips,
    /// Chips put into the pot during the current street.
    pub street_bet: Chips,
    /// Whether the player has acted since the bet-to-call last changed.
    pub has_acted: bool,
    /// Remove the player once the current hand settles.
    pub leaving: bool,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, handle: &str, seat_idx: SeatIndex, stack: Chips) -> Self {
        Self {
            id,
            handle: sanitize_handle(handle),
            seat_idx,
            stack,
            state: PlayerState::SittingOut,
            contributed: 0,
            street_bet: 0,
            has_acted: false,
            leaving: false,
        }
    }

    /// Prepare the player for a new hand. Players without chips sit out.
    pub fn reset(&mut self) {
        self.state = if self.stack > 0 {
            PlayerState::Active
        } else {
            PlayerState::SittingOut
        };
        self.contributed = 0;
        self.street_bet = 0;
        self.has_acted = false;
    }

    /// Move `amount` chips from the stack into the pot. Callers validate
    /// the amount first.
    pub fn commit(&mut self, amount: Chips) {
        let amount = amount.min(self.stack);
        self.stack -= amount;
        self.street_bet += amount;
        self.contributed += amount;
        if self.stack == 0 {
            self.state = PlayerState::AllIn;
        }
    }

    #[must_use]
    pub fn in_hand(&self) -> bool {
        matches!(self.state, PlayerState::Active | PlayerState::AllIn)
    }

    #[must_use]
    pub fn can_act(&self) -> bool {
        self.state == PlayerState::Active
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Preflop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => None,
        }
    }

    /// Betting round number used in the audit log, starting at 0 preflop.
    #[must_use]
    pub fn round_number(self) -> u8 {
        self as u8
    }

    /// Where the cards opening this street are dealt, and how many.
    #[must_use]
    pub fn community_cards(self) -> Option<(CardLocation, usize)> {
        match self {
            Self::Preflop => None,
            Self::Flop => Some((CardLocation::Flop, 3)),
            Self::Turn => Some((CardLocation::Turn, 1)),
            Self::River => Some((CardLocation::River, 1)),
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        };
        write!(f, "{repr}")
    }
}

/// A player's requested action. `Bet` carries the chips put in; `Raise`
/// carries the raise on top of the amount to call.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "amount", rename_all = "kebab-case")]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(Chips),
    Raise(Chips),
    AllIn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "folds"),
            Self::Check => write!(f, "checks"),
            Self::Call => write!(f, "calls"),
            Self::Bet(amount) => write!(f, "bets {amount}"),
            Self::Raise(amount) => write!(f, "raises by {amount}"),
            Self::AllIn => write!(f, "goes all-in"),
        }
    }
}

/// What ended up in the audit log. Blinds are forced bets and have no
/// matching player `Action`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BetAction {
    SmallBlind,
    BigBlind,
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

impl fmt::Display for BetAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::SmallBlind => "small blind",
            Self::BigBlind => "big blind",
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Bet => "bet",
            Self::Raise => "raise",
            Self::AllIn => "all-in",
        };
        write!(f, "{repr}")
    }
}

/// One entry of a hand's betting audit log.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionRecord {
    pub round_number: u8,
    pub player_id: PlayerId,
    pub action: BetAction,
    /// Chips moved from the player's stack into the pot.
    pub amount: Chips,
    /// The engine acted on the player's behalf after their turn expired.
    pub timed_out: bool,
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.player_id, self.action, self.amount)?;
        if self.timed_out {
            write!(f, " (timed out)")?;
        }
        Ok(())
    }
}

/// The player currently obligated to act.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Turn {
    /// Increases every time the turn moves, so a late timeout for an old
    /// turn can be told apart from the current one.
    pub seq: u64,
    pub seat_idx: SeatIndex,
    pub player_id: PlayerId,
    pub bet_to_call: Chips,
    pub min_raise: Chips,
    pub expiry: DateTime<Utc>,
}

impl Turn {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

/// How much a player has put into the hand, as seen by pot partitioning.
#[derive(Clone, Copy, Debug)]
pub struct Stake<'a> {
    pub player_id: &'a PlayerId,
    pub contributed: Chips,
    pub folded: bool,
    pub all_in: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub size: Chips,
    /// Players that can win this pot, in seat order from the small blind.
    pub players: Vec<PlayerId>,
}

impl Pot {
    /// Split everything contributed this hand into a main pot and side
    /// pots. A new pot starts at each distinct all-in amount; folded
    /// players' chips stay in the pots but they can't win them.
    #[must_use]
    pub fn partition(stakes: &[Stake<'_>]) -> Vec<Self> {
        let mut levels: Vec<Chips> = stakes
            .iter()
            .filter(|stake| stake.all_in && !stake.folded && stake.contributed > 0)
            .map(|stake| stake.contributed)
            .collect();
        let top = stakes.iter().map(|stake| stake.contributed).max().unwrap_or(0);
        levels.push(top);
        levels.sort_unstable();
        levels.dedup();

        let mut pots: Vec<Self> = Vec::with_capacity(levels.len());
        let mut floor = 0;
        for level in levels {
            if level <= floor {
                continue;
            }
            let size = stakes
                .iter()
                .map(|stake| stake.contributed.min(level).saturating_sub(floor))
                .sum();
            let players: Vec<PlayerId> = stakes
                .iter()
                .filter(|stake| !stake.folded && (!stake.all_in || stake.contributed >= level))
                .map(|stake| stake.player_id.clone())
                .collect();
            match pots.last_mut() {
                // Nobody left can win chips at this level; they belong to
                // the pot below.
                Some(last) if players.is_empty() => last.size += size,
                _ => pots.push(Self { size, players }),
            }
            floor = level;
        }
        pots
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub player_id: PlayerId,
    pub amount: Chips,
    /// The winning hand, if it had to be shown.
    pub hand: Option<String>,
}

/// Archive of a settled hand.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandSummary {
    pub hand_number: u64,
    pub board: Vec<Card>,
    pub log: Vec<ActionRecord>,
    pub payouts: Vec<Payout>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    // === Card Tests ===

    #[test]
    fn test_card_display_codes() {
        assert_eq!(Card(14, Suit::Club).to_string(), "AC");
        assert_eq!(Card(10, Suit::Diamond).to_string(), "TD");
        assert_eq!(Card(2, Suit::Spade).to_string(), "2S");
    }

    #[test]
    fn test_card_parse() {
        assert_eq!("AC".parse::<Card>(), Ok(Card(14, Suit::Club)));
        assert_eq!("td".parse::<Card>(), Ok(Card(10, Suit::Diamond)));
        assert_eq!("5H".parse::<Card>(), Ok(Card(5, Suit::Heart)));
    }

    #[test]
    fn test_card_parse_errors() {
        assert_eq!(
            "ACE".parse::<Card>(),
            Err(CardParseError::Length("ACE".to_string()))
        );
        assert_eq!("1C".parse::<Card>(), Err(CardParseError::Rank('1')));
        assert_eq!("AX".parse::<Card>(), Err(CardParseError::Suit('X')));
    }

    #[test]
    fn test_card_serializes_as_code() {
        let json = serde_json::to_string(&vec![Card(14, Suit::Club), Card(10, Suit::Diamond)])
            .unwrap();
        assert_eq!(json, r#"["AC","TD"]"#);
        let cards: Vec<Card> = serde_json::from_str(&json).unwrap();
        assert_eq!(cards, vec![Card(14, Suit::Club), Card(10, Suit::Diamond)]);
    }

    #[test]
    fn test_card_identity_is_value_equality() {
        let a: Card = "QS".parse().unwrap();
        let b = Card(12, Suit::Spade);
        assert_eq!(a, b);
    }

    // === Deck Tests ===

    #[test]
    fn test_deck_initialization() {
        let deck = Deck::default();
        assert_eq!(deck.remaining(), 52);
        assert!(deck.is_partitioned());
    }

    #[test]
    fn test_deck_deal_moves_cards() {
        let mut deck = Deck::default();
        deck.shuffle(&mut StdRng::seed_from_u64(7));
        let hole = deck.deal_to(CardLocation::Hole(3), 2).unwrap();
        assert_eq!(hole.len(), 2);
        assert_eq!(deck.remaining(), 50);
        assert_eq!(deck.cards_at(CardLocation::Hole(3)), hole);
        assert_eq!(deck.location_of(&hole[0]), Some(CardLocation::Hole(3)));
        assert!(deck.is_partitioned());
    }

    #[test]
    fn test_deck_exhausted() {
        let mut deck = Deck::default();
        deck.deal_to(CardLocation::Discarded, 50).unwrap();
        let err = deck.deal_to(CardLocation::Flop, 3).unwrap_err();
        assert_eq!(
            err,
            TableError::DeckExhausted {
                requested: 3,
                remaining: 2
            }
        );
        assert_eq!(deck.remaining(), 2);
        assert!(deck.is_partitioned());
    }

    #[test]
    fn test_deck_shuffle_is_deterministic_for_seed() {
        let mut a = Deck::default();
        let mut b = Deck::default();
        a.shuffle(&mut StdRng::seed_from_u64(42));
        b.shuffle(&mut StdRng::seed_from_u64(42));
        assert_eq!(
            a.deal_to(CardLocation::Flop, 3).unwrap(),
            b.deal_to(CardLocation::Flop, 3).unwrap()
        );
    }

    #[test]
    fn test_deck_shuffle_returns_dealt_cards() {
        let mut deck = Deck::default();
        let mut rng = StdRng::seed_from_u64(1);
        deck.shuffle(&mut rng);
        deck.deal_to(CardLocation::River, 10).unwrap();
        deck.shuffle(&mut rng);
        assert_eq!(deck.remaining(), 52);
        assert!(deck.cards_at(CardLocation::River).is_empty());
        assert!(deck.is_partitioned());
    }

    #[test]
    fn test_deck_relocate() {
        let mut deck = Deck::default();
        deck.deal_to(CardLocation::Hole(1), 2).unwrap();
        deck.relocate(CardLocation::Hole(1), CardLocation::Discarded);
        assert!(deck.cards_at(CardLocation::Hole(1)).is_empty());
        assert_eq!(deck.cards_at(CardLocation::Discarded).len(), 2);
        assert!(deck.is_partitioned());
    }

    // === Player Tests ===

    #[test]
    fn test_player_new_sits_out_until_dealt() {
        let player = Player::new("p1".into(), "bob", 4, 100);
        assert_eq!(player.state, PlayerState::SittingOut);
        assert_eq!(player.seat_idx, 4);
    }

    #[test]
    fn test_player_commit_all_in() {
        let mut player = Player::new("p1".into(), "bob", 0, 60);
        player.reset();
        player.commit(25);
        assert_eq!(player.stack, 35);
        assert_eq!(player.state, PlayerState::Active);
        player.commit(100);
        assert_eq!(player.stack, 0);
        assert_eq!(player.contributed, 60);
        assert_eq!(player.state, PlayerState::AllIn);
    }

    #[test]
    fn test_player_reset_without_chips_sits_out() {
        let mut player = Player::new("p1".into(), "", 0, 0);
        player.reset();
        assert_eq!(player.state, PlayerState::SittingOut);
    }

    #[test]
    fn test_handle_sanitized() {
        let player = Player::new("p1".into(), "big  fish", 0, 1);
        assert_eq!(player.handle, "big__fish");
        let long = "x".repeat(100);
        assert_eq!(sanitize_handle(&long).len(), constants::MAX_HANDLE_LENGTH);
    }

    #[test]
    fn test_player_state_serde_names() {
        let json = serde_json::to_string(&PlayerState::AllIn).unwrap();
        assert_eq!(json, r#""all-in""#);
        let json = serde_json::to_string(&PlayerState::SittingOut).unwrap();
        assert_eq!(json, r#""sitting-out""#);
    }

    // === Action Tests ===

    #[test]
    fn test_action_json_shape() {
        let action: Action = serde_json::from_str(r#"{"type":"raise","amount":100}"#).unwrap();
        assert_eq!(action, Action::Raise(100));
        let action: Action = serde_json::from_str(r#"{"type":"all-in"}"#).unwrap();
        assert_eq!(action, Action::AllIn);
    }

    // === Street Tests ===

    #[test]
    fn test_street_progression() {
        assert_eq!(Street::Preflop.next(), Some(Street::Flop));
        assert_eq!(Street::River.next(), None);
        assert_eq!(Street::Turn.round_number(), 2);
        assert_eq!(
            Street::Flop.community_cards(),
            Some((CardLocation::Flop, 3))
        );
    }

    // === Pot Tests ===

    fn ids(n: usize) -> Vec<PlayerId> {
        (0..n).map(|i| PlayerId::new(&format!("p{i}"))).collect()
    }

    fn pot(size: Chips, players: Vec<PlayerId>) -> Pot {
        Pot { size, players }
    }

    fn stake(player_id: &PlayerId, contributed: Chips, folded: bool, all_in: bool) -> Stake<'_> {
        Stake {
            player_id,
            contributed,
            folded,
            all_in,
        }
    }

    #[test]
    fn test_pot_single_when_nobody_all_in() {
        let ids = ids(2);
        let stakes = [
            stake(&ids[0], 25, false, false),
            stake(&ids[1], 50, false, false),
        ];
        let pots = Pot::partition(&stakes);
        assert_eq!(pots, vec![pot(75, ids.clone())]);
    }

    #[test]
    fn test_pot_side_pot_for_short_all_in() {
        let ids = ids(3);
        let stakes = [
            stake(&ids[0], 60, false, true),
            stake(&ids[1], 200, false, false),
            stake(&ids[2], 200, false, false),
        ];
        let pots = Pot::partition(&stakes);
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0], pot(180, ids.clone()));
        assert_eq!(pots[1], pot(280, ids[1..].to_vec()));
    }

    #[test]
    fn test_pot_folded_chips_stay_in() {
        let ids = ids(3);
        let stakes = [
            stake(&ids[0], 30, false, true),
            stake(&ids[1], 80, true, false),
            stake(&ids[2], 100, false, false),
        ];
        let pots = Pot::partition(&stakes);
        assert_eq!(pots[0], pot(90, vec![ids[0].clone(), ids[2].clone()]));
        assert_eq!(pots[1], pot(120, vec![ids[2].clone()]));
        let total: Chips = pots.iter().map(|pot| pot.size).sum();
        assert_eq!(total, 210);
    }

    #[test]
    fn test_pot_multiple_all_in_levels() {
        let ids = ids(4);
        let stakes = [
            stake(&ids[0], 25, false, true),
            stake(&ids[1], 75, false, true),
            stake(&ids[2], 150, false, true),
            stake(&ids[3], 150, false, false),
        ];
        let sizes: Vec<Chips> = Pot::partition(&stakes).iter().map(|pot| pot.size).collect();
        assert_eq!(sizes, vec![100, 150, 150]);
    }

    #[test]
    fn test_pot_live_player_eligible_before_calling() {
        let ids = ids(3);
        let stakes = [
            stake(&ids[0], 40, false, true),
            stake(&ids[1], 100, false, false),
            stake(&ids[2], 10, false, false),
        ];
        let pots = Pot::partition(&stakes);
        assert_eq!(pots[0].players, ids);
        assert_eq!(pots[1].players, vec![ids[1].clone(), ids[2].clone()]);
    }

    #[test]
    fn test_pot_empty_hand() {
        assert!(Pot::partition(&[]).is_empty());
    }
}
