//! Table module providing multi-table support with an async actor model.
//!
//! This module implements:
//! - TableActor: async actor that owns a single table engine
//! - TableManager: registry of running tables keyed by game id
//! - Message-based communication with tokio channels
//! - Table configuration
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! Every mutation goes through that inbox, so a table only ever sees one
//! operation at a time. Readers get an `Arc<TableSnapshot>` taken after the
//! last processed message.
//!
//! ## Example
//!
//! ```no_run
//! use poker_table::table::{TableConfig, TableManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = TableManager::new(16);
//!     let table_id = manager.create_table(TableConfig::default()).await.unwrap();
//!     manager
//!         .seat_player(table_id, "alice".into(), "alice".to_string(), 0, 1000)
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableConfigError};
pub use manager::{TableManager, TableManagerError, TableMetadata};
pub use messages::{StateChangeNotification, TableInfo, TableMessage, TableResponse};
