//! Table actor implementation with async message handling.

use super::{
    config::TableConfig,
    messages::{StateChangeNotification, TableInfo, TableMessage, TableResponse},
};
use crate::game::{
    HandPhase, Table, TableSnapshot,
    entities::{Action, Chips, GameId, PlayerId, SeatIndex},
    states::Betting,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{Duration, interval},
};
use uuid::Uuid;

/// Inbox capacity of every table actor.
const INBOX_CAPACITY: usize = 100;

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: GameId,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: GameId) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> GameId {
        self.table_id
    }

    /// Whether the actor behind this handle has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }
}

/// Table actor owning a single poker table
pub struct TableActor {
    /// Table ID
    id: GameId,

    /// Table configuration
    config: TableConfig,

    /// The engine. Only this actor ever touches it.
    table: Table,

    /// Snapshot of the table as of the last processed message
    snapshot: Arc<TableSnapshot>,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Is table closed
    is_closed: bool,

    /// Subscribers for state change notifications
    subscribers: HashMap<Uuid, mpsc::Sender<StateChangeNotification>>,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `config` - Table configuration
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(id: GameId, config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);

        let table = Table::new(id, config.game_settings());
        let snapshot = Arc::new(table.snapshot());

        let actor = Self {
            id,
            config,
            table,
            snapshot,
            inbox,
            is_closed: false,
            subscribers: HashMap::new(),
        };

        let handle = TableHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        let mut tick_interval = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else {
                        // Every handle was dropped.
                        break;
                    };
                    self.handle_message(message);

                    if self.is_closed {
                        break;
                    }
                }

                // Expire overdue turns
                _ = tick_interval.tick() => {
                    self.tick();
                }
            }
        }

        self.notify_state_change(StateChangeNotification::Closed);
        log::info!("Table {} '{}' closed", self.id, self.config.name);
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Seat {
                player_id,
                handle,
                seat_idx,
                stack,
                response,
            } => {
                let result = self.handle_seat(player_id, &handle, seat_idx, stack);
                let _ = response.send(result);
            }

            TableMessage::Unseat {
                player_id,
                response,
            } => {
                let result = self.handle_unseat(&player_id);
                let _ = response.send(result);
            }

            TableMessage::StartHand { response } => {
                let result = self.handle_start_hand();
                let _ = response.send(result);
            }

            TableMessage::Act {
                player_id,
                action,
                response,
            } => {
                let result = self.handle_action(&player_id, action);
                let _ = response.send(result);
            }

            TableMessage::AdvanceStreet { response } => {
                let result = match self.table.advance_street() {
                    Ok(street) => {
                        self.after_mutation();
                        TableResponse::StreetDealt(street)
                    }
                    Err(e) => TableResponse::Rejected(e),
                };
                let _ = response.send(result);
            }

            TableMessage::SettleHand { response } => {
                let result = match self.table.settle_hand() {
                    Ok(summary) => {
                        self.refresh_snapshot();
                        self.notify_state_change(StateChangeNotification::HandSettled(
                            summary.clone(),
                        ));
                        TableResponse::HandSettled(summary)
                    }
                    Err(e) => TableResponse::Rejected(e),
                };
                let _ = response.send(result);
            }

            TableMessage::GetSnapshot { response } => {
                let _ = response.send(Arc::clone(&self.snapshot));
            }

            TableMessage::GetView { viewer, response } => {
                let _ = response.send(self.snapshot.view_for(viewer.as_ref()));
            }

            TableMessage::GetInfo { response } => {
                let _ = response.send(self.info());
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(TableResponse::Success);
            }

            TableMessage::Tick => {
                self.tick();
            }

            TableMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                self.subscribers.insert(subscriber_id, sender);
                log::debug!(
                    "Table {}: subscriber {} added (total: {})",
                    self.id,
                    subscriber_id,
                    self.subscribers.len()
                );
            }

            TableMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                log::debug!(
                    "Table {}: subscriber {} removed (total: {})",
                    self.id,
                    subscriber_id,
                    self.subscribers.len()
                );
            }
        }
    }

    /// Notify all subscribers of a state change
    fn notify_state_change(&mut self, notification: StateChangeNotification) {
        let table_id = self.id;
        self.subscribers.retain(|subscriber_id, sender| {
            match sender.try_send(notification.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Table {}: subscriber {} channel full, dropping notification",
                        table_id,
                        subscriber_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!(
                        "Table {}: subscriber {} disconnected, removing",
                        table_id,
                        subscriber_id
                    );
                    false
                }
            }
        });
    }

    fn refresh_snapshot(&mut self) {
        self.snapshot = Arc::new(self.table.snapshot());
    }

    /// Run auto-advance, then publish the new state.
    fn after_mutation(&mut self) {
        self.auto_advance();
        self.refresh_snapshot();
        self.notify_state_change(StateChangeNotification::StateChanged {
            hand_number: self.table.hand_number(),
        });
    }

    /// With `auto_advance` set, deal streets and settle hands as soon as
    /// betting allows it.
    fn auto_advance(&mut self) {
        if !self.config.auto_advance {
            return;
        }
        loop {
            match self.table.phase() {
                HandPhase::Betting(Betting { complete: true, .. }) => {
                    if let Err(e) = self.table.advance_street() {
                        log::error!("Table {}: failed to deal next street: {}", self.id, e);
                        return;
                    }
                }
                HandPhase::Settlement(_) => {
                    match self.table.settle_hand() {
                        Ok(summary) => {
                            self.notify_state_change(StateChangeNotification::HandSettled(summary));
                        }
                        Err(e) => {
                            log::error!("Table {}: failed to settle hand: {}", self.id, e);
                        }
                    }
                    return;
                }
                _ => return,
            }
        }
    }

    fn handle_seat(
        &mut self,
        player_id: PlayerId,
        handle: &str,
        seat_idx: SeatIndex,
        stack: Chips,
    ) -> TableResponse {
        match self.table.seat(player_id, handle, seat_idx, stack) {
            Ok(()) => {
                self.refresh_snapshot();
                self.notify_state_change(StateChangeNotification::PlayerListChanged);
                TableResponse::Success
            }
            Err(e) => TableResponse::Rejected(e),
        }
    }

    fn handle_unseat(&mut self, player_id: &PlayerId) -> TableResponse {
        match self.table.unseat(player_id) {
            Ok(record) => {
                self.notify_state_change(StateChangeNotification::PlayerListChanged);
                self.after_mutation();
                record.map_or(TableResponse::Success, TableResponse::Acted)
            }
            Err(e) => TableResponse::Rejected(e),
        }
    }

    fn handle_start_hand(&mut self) -> TableResponse {
        let result = self.table.start_hand();
        if result.is_ok() {
            self.after_mutation();
        }
        result.into()
    }

    fn handle_action(&mut self, player_id: &PlayerId, action: Action) -> TableResponse {
        match self.table.act(player_id, action) {
            Ok(record) => {
                if record.timed_out {
                    self.notify_state_change(StateChangeNotification::TurnTimedOut(
                        record.clone(),
                    ));
                }
                self.after_mutation();
                TableResponse::Acted(record)
            }
            Err(e) => TableResponse::Rejected(e),
        }
    }

    /// Apply the timeout action to an overdue turn. Firing twice for the
    /// same turn is harmless: the second call sees a newer turn or none.
    fn tick(&mut self) {
        if self.is_closed {
            return;
        }
        let Some(turn_seq) = self.table.turn().map(|turn| turn.seq) else {
            return;
        };
        if let Some(record) = self.table.on_timeout(turn_seq, Utc::now()) {
            self.notify_state_change(StateChangeNotification::TurnTimedOut(record));
            self.after_mutation();
        }
    }

    fn info(&self) -> TableInfo {
        TableInfo {
            id: self.id,
            name: self.config.name.clone(),
            player_count: self.table.num_seated(),
            max_players: self.config.max_players,
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            hand_number: self.table.hand_number(),
            phase: self.table.phase().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{TableError, entities::BetAction};
    use tokio::sync::oneshot;

    fn spawn_table(config: TableConfig) -> TableHandle {
        let (actor, handle) = TableActor::new(Uuid::new_v4(), config);
        tokio::spawn(actor.run());
        handle
    }

    fn seeded() -> TableConfig {
        TableConfig {
            seed: Some(11),
            ..TableConfig::default()
        }
    }

    async fn request(
        handle: &TableHandle,
        build: impl FnOnce(oneshot::Sender<TableResponse>) -> TableMessage,
    ) -> TableResponse {
        let (tx, rx) = oneshot::channel();
        handle.send(build(tx)).await.unwrap();
        rx.await.unwrap()
    }

    async fn seat(handle: &TableHandle, id: &str, seat_idx: SeatIndex) -> TableResponse {
        request(handle, |response| TableMessage::Seat {
            player_id: id.into(),
            handle: id.to_string(),
            seat_idx,
            stack: 1000,
            response,
        })
        .await
    }

    async fn act(handle: &TableHandle, id: &str, action: Action) -> TableResponse {
        request(handle, |response| TableMessage::Act {
            player_id: id.into(),
            action,
            response,
        })
        .await
    }

    async fn snapshot(handle: &TableHandle) -> Arc<TableSnapshot> {
        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::GetSnapshot { response: tx })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_seat_and_start() {
        let handle = spawn_table(seeded());
        assert!(seat(&handle, "a", 0).await.is_success());
        assert_eq!(
            seat(&handle, "b", 0).await,
            TableResponse::Rejected(TableError::SeatOccupied(0))
        );
        assert!(seat(&handle, "b", 1).await.is_success());

        let response = request(&handle, |response| TableMessage::StartHand { response }).await;
        assert_eq!(response, TableResponse::Success);

        let snapshot = snapshot(&handle).await;
        assert_eq!(snapshot.hand_number, 1);
        assert_eq!(snapshot.turn.as_ref().unwrap().player_id, PlayerId::new("a"));
    }

    #[tokio::test]
    async fn test_rejected_action_has_message() {
        let handle = spawn_table(seeded());
        seat(&handle, "a", 0).await;
        seat(&handle, "b", 1).await;
        request(&handle, |response| TableMessage::StartHand { response }).await;

        let response = act(&handle, "b", Action::Call).await;
        assert!(!response.is_success());
        assert_eq!(response.error_message(), Some("not your turn".to_string()));
    }

    #[tokio::test]
    async fn test_snapshots_are_shared_until_mutation() {
        let handle = spawn_table(seeded());
        seat(&handle, "a", 0).await;
        let first = snapshot(&handle).await;
        let second = snapshot(&handle).await;
        assert!(Arc::ptr_eq(&first, &second));

        seat(&handle, "b", 1).await;
        let third = snapshot(&handle).await;
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.seats.len(), 2);
    }

    #[tokio::test]
    async fn test_auto_advance_settles_hand() {
        let handle = spawn_table(TableConfig {
            auto_advance: true,
            ..seeded()
        });
        seat(&handle, "a", 0).await;
        seat(&handle, "b", 1).await;
        let (tx, mut rx) = mpsc::channel(32);
        handle
            .send(TableMessage::Subscribe {
                subscriber_id: Uuid::new_v4(),
                sender: tx,
            })
            .await
            .unwrap();

        request(&handle, |response| TableMessage::StartHand { response }).await;
        act(&handle, "a", Action::AllIn).await;
        let response = act(&handle, "b", Action::Call).await;
        assert!(matches!(response, TableResponse::Acted(_)));

        let snapshot = snapshot(&handle).await;
        assert_eq!(snapshot.phase, HandPhase::default());
        let summary = snapshot.last_hand.clone().unwrap();
        assert_eq!(summary.board.len(), 5);
        let stacks: Chips = snapshot.seats.iter().map(|seat| seat.stack).sum();
        assert_eq!(stacks, 2000);

        let mut settled = false;
        while let Ok(notification) = rx.try_recv() {
            if matches!(notification, StateChangeNotification::HandSettled(_)) {
                settled = true;
            }
        }
        assert!(settled);
    }

    #[tokio::test]
    async fn test_manual_advance_and_settle() {
        let handle = spawn_table(seeded());
        seat(&handle, "a", 0).await;
        seat(&handle, "b", 1).await;
        request(&handle, |response| TableMessage::StartHand { response }).await;

        let early = request(&handle, |response| TableMessage::AdvanceStreet { response }).await;
        assert_eq!(
            early,
            TableResponse::Rejected(TableError::BettingIncomplete)
        );

        act(&handle, "a", Action::Fold).await;
        let settled = request(&handle, |response| TableMessage::SettleHand { response }).await;
        let TableResponse::HandSettled(summary) = settled else {
            panic!("expected a settled hand, got {settled:?}");
        };
        assert_eq!(summary.payouts[0].player_id, PlayerId::new("b"));
        assert_eq!(summary.log.last().unwrap().action, BetAction::Fold);
    }

    #[tokio::test]
    async fn test_tick_expires_turn_once() {
        let handle = spawn_table(TableConfig {
            action_timeout_secs: 1,
            ..seeded()
        });
        seat(&handle, "a", 0).await;
        seat(&handle, "b", 1).await;
        seat(&handle, "c", 2).await;
        request(&handle, |response| TableMessage::StartHand { response }).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        handle.send(TableMessage::Tick).await.unwrap();
        handle.send(TableMessage::Tick).await.unwrap();

        let snapshot = snapshot(&handle).await;
        let timeouts: Vec<_> = snapshot.log.iter().filter(|record| record.timed_out).collect();
        assert_eq!(timeouts.len(), 1);
        assert_eq!(timeouts[0].player_id, PlayerId::new("c"));
        assert_eq!(timeouts[0].action, BetAction::Fold);
    }

    #[tokio::test]
    async fn test_close_stops_actor() {
        let handle = spawn_table(seeded());
        let response = request(&handle, |response| TableMessage::Close { response }).await;
        assert!(response.is_success());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_closed());
        assert!(handle.send(TableMessage::Tick).await.is_err());
    }

    #[tokio::test]
    async fn test_info() {
        let handle = spawn_table(TableConfig {
            name: "Main".to_string(),
            ..seeded()
        });
        seat(&handle, "a", 3).await;
        let (tx, rx) = oneshot::channel();
        handle.send(TableMessage::GetInfo { response: tx }).await.unwrap();
        let info = rx.await.unwrap();
        assert_eq!(info.name, "Main");
        assert_eq!(info.player_count, 1);
        assert_eq!(info.phase, "waiting");
    }
}
