//! Table manager for spawning and managing multiple table actors.

use super::{
    actor::{TableActor, TableHandle},
    config::{TableConfig, TableConfigError},
    messages::{StateChangeNotification, TableInfo, TableMessage, TableResponse},
};
use crate::game::{
    GameView, TableError, TableSnapshot,
    entities::{Action, ActionRecord, Chips, GameId, HandSummary, PlayerId, SeatIndex, Street},
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::{RwLock, mpsc, oneshot};
use uuid::Uuid;

/// Table metadata for discovery
pub type TableMetadata = TableInfo;

/// Buffered notifications per subscriber before new ones are dropped.
const SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableManagerError {
    #[error("table {0} not found")]
    TableNotFound(GameId),
    #[error("table {0} is closed")]
    TableClosed(GameId),
    #[error("table limit of {0} reached")]
    CapacityReached(usize),
    #[error(transparent)]
    InvalidConfig(#[from] TableConfigError),
    #[error(transparent)]
    Rejected(#[from] TableError),
}

/// Table manager for managing multiple table instances
#[derive(Clone)]
pub struct TableManager {
    /// Active table handles
    tables: Arc<RwLock<HashMap<GameId, TableHandle>>>,

    /// Upper bound on concurrently open tables
    max_tables: usize,
}

impl TableManager {
    /// Create a new table manager
    ///
    /// # Arguments
    ///
    /// * `max_tables` - Maximum number of tables open at once
    pub fn new(max_tables: usize) -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            max_tables,
        }
    }

    /// Create a table and spawn its actor
    ///
    /// # Returns
    ///
    /// * `Result<GameId, TableManagerError>` - New table ID or error
    pub async fn create_table(&self, config: TableConfig) -> Result<GameId, TableManagerError> {
        // Validate configuration
        config.validate()?;

        let mut tables = self.tables.write().await;
        if tables.len() >= self.max_tables {
            return Err(TableManagerError::CapacityReached(self.max_tables));
        }

        let table_id = Uuid::new_v4();
        let (actor, handle) = TableActor::new(table_id, config);
        tables.insert(table_id, handle);
        drop(tables);

        // Spawn actor task
        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {}", table_id);

        Ok(table_id)
    }

    /// Get a table handle
    pub async fn get_table(&self, table_id: GameId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    /// List all open tables
    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        let handles: Vec<TableHandle> = self.tables.read().await.values().cloned().collect();

        let mut metadata_list = Vec::with_capacity(handles.len());
        for handle in handles {
            let (tx, rx) = oneshot::channel();
            if handle
                .send(TableMessage::GetInfo { response: tx })
                .await
                .is_err()
            {
                continue;
            }
            if let Ok(info) = rx.await {
                metadata_list.push(info);
            }
        }
        metadata_list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        metadata_list
    }

    /// Close a table and forget it
    pub async fn close_table(&self, table_id: GameId) -> Result<(), TableManagerError> {
        let handle = self.lookup(table_id).await?;

        let (tx, rx) = oneshot::channel();
        // A table whose actor already stopped only needs removing.
        if handle
            .send(TableMessage::Close { response: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }

        let mut tables = self.tables.write().await;
        tables.remove(&table_id);
        drop(tables);

        log::info!("Closed table {}", table_id);

        Ok(())
    }

    /// Get active table count
    pub async fn active_table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }

    pub async fn seat_player(
        &self,
        table_id: GameId,
        player_id: PlayerId,
        handle: String,
        seat_idx: SeatIndex,
        stack: Chips,
    ) -> Result<(), TableManagerError> {
        self.request(table_id, |response| TableMessage::Seat {
            player_id,
            handle,
            seat_idx,
            stack,
            response,
        })
        .await
        .map(|_| ())
    }

    /// Leave a table. Returns the fold recorded if the player was still in
    /// a hand.
    pub async fn unseat_player(
        &self,
        table_id: GameId,
        player_id: PlayerId,
    ) -> Result<Option<ActionRecord>, TableManagerError> {
        let response = self
            .request(table_id, |response| TableMessage::Unseat {
                player_id,
                response,
            })
            .await?;
        Ok(match response {
            TableResponse::Acted(record) => Some(record),
            _ => None,
        })
    }

    pub async fn start_hand(&self, table_id: GameId) -> Result<(), TableManagerError> {
        self.request(table_id, |response| TableMessage::StartHand { response })
            .await
            .map(|_| ())
    }

    pub async fn take_action(
        &self,
        table_id: GameId,
        player_id: PlayerId,
        action: Action,
    ) -> Result<ActionRecord, TableManagerError> {
        let response = self
            .request(table_id, |response| TableMessage::Act {
                player_id,
                action,
                response,
            })
            .await?;
        match response {
            TableResponse::Acted(record) => Ok(record),
            other => Err(unexpected(table_id, &other)),
        }
    }

    pub async fn advance_street(&self, table_id: GameId) -> Result<Street, TableManagerError> {
        let response = self
            .request(table_id, |response| TableMessage::AdvanceStreet { response })
            .await?;
        match response {
            TableResponse::StreetDealt(street) => Ok(street),
            other => Err(unexpected(table_id, &other)),
        }
    }

    pub async fn settle_hand(&self, table_id: GameId) -> Result<HandSummary, TableManagerError> {
        let response = self
            .request(table_id, |response| TableMessage::SettleHand { response })
            .await?;
        match response {
            TableResponse::HandSettled(summary) => Ok(summary),
            other => Err(unexpected(table_id, &other)),
        }
    }

    pub async fn snapshot(
        &self,
        table_id: GameId,
    ) -> Result<Arc<TableSnapshot>, TableManagerError> {
        let handle = self.lookup(table_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::GetSnapshot { response: tx })
            .await
            .map_err(|_| TableManagerError::TableClosed(table_id))?;
        rx.await.map_err(|_| TableManagerError::TableClosed(table_id))
    }

    pub async fn view(
        &self,
        table_id: GameId,
        viewer: Option<PlayerId>,
    ) -> Result<GameView, TableManagerError> {
        let handle = self.lookup(table_id).await?;
        let (tx, rx) = oneshot::channel();
        handle
            .send(TableMessage::GetView {
                viewer,
                response: tx,
            })
            .await
            .map_err(|_| TableManagerError::TableClosed(table_id))?;
        rx.await.map_err(|_| TableManagerError::TableClosed(table_id))
    }

    /// Receive state change notifications from a table until the returned
    /// receiver is dropped.
    pub async fn subscribe(
        &self,
        table_id: GameId,
    ) -> Result<(Uuid, mpsc::Receiver<StateChangeNotification>), TableManagerError> {
        let handle = self.lookup(table_id).await?;
        let subscriber_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CAPACITY);
        handle
            .send(TableMessage::Subscribe {
                subscriber_id,
                sender,
            })
            .await
            .map_err(|_| TableManagerError::TableClosed(table_id))?;
        Ok((subscriber_id, receiver))
    }

    pub async fn unsubscribe(
        &self,
        table_id: GameId,
        subscriber_id: Uuid,
    ) -> Result<(), TableManagerError> {
        let handle = self.lookup(table_id).await?;
        handle
            .send(TableMessage::Unsubscribe { subscriber_id })
            .await
            .map_err(|_| TableManagerError::TableClosed(table_id))
    }

    async fn lookup(&self, table_id: GameId) -> Result<TableHandle, TableManagerError> {
        self.get_table(table_id)
            .await
            .ok_or(TableManagerError::TableNotFound(table_id))
    }

    /// Send a message built around a fresh response channel and wait for
    /// the answer. Engine rejections come back as `Err`.
    async fn request(
        &self,
        table_id: GameId,
        build: impl FnOnce(oneshot::Sender<TableResponse>) -> TableMessage,
    ) -> Result<TableResponse, TableManagerError> {
        let handle = self.lookup(table_id).await?;

        let (tx, rx) = oneshot::channel();
        handle
            .send(build(tx))
            .await
            .map_err(|_| TableManagerError::TableClosed(table_id))?;

        match rx.await {
            Ok(TableResponse::Rejected(err)) => Err(err.into()),
            Ok(response) => Ok(response),
            Err(_) => Err(TableManagerError::TableClosed(table_id)),
        }
    }
}

fn unexpected(table_id: GameId, response: &TableResponse) -> TableManagerError {
    log::error!("Table {}: unexpected response {:?}", table_id, response);
    TableManagerError::TableClosed(table_id)
}
