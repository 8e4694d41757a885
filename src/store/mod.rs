//! Item storage.
//!
//! [`ItemStore`] is the seam between the HTTP layer and persistence. Two
//! backends exist: [`SqliteItemStore`] for real deployments and
//! [`MemoryItemStore`] for tests and throwaway runs.

mod memory;
mod migrations;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::item::{ItemError, ItemId, ItemState, ListItem};

pub use memory::MemoryItemStore;
pub use migrations::{Migration, MigrationReport, MIGRATIONS};
pub use sqlite::SqliteItemStore;

/// Errors returned by store operations.
///
/// [`StoreError::Item`] carries the recoverable outcomes; every other
/// variant is an unexpected fault.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Item(#[from] ItemError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt row for item {id}: {reason}")]
    CorruptRow { id: ItemId, reason: String },

    #[error("Migration {version} ('{name}') failed: {source}")]
    Migration {
        version: u32,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    /// The recoverable item error, if this is one.
    pub fn as_item_error(&self) -> Option<&ItemError> {
        match self {
            StoreError::Item(err) => Some(err),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for list items.
///
/// Implementations must assign fresh ids on `create` and never reuse them.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Every item. Ordering is not part of the contract.
    async fn list_all(&self) -> StoreResult<Vec<ListItem>>;

    async fn get(&self, id: ItemId) -> StoreResult<Option<ListItem>>;

    /// Persist a new item in `Todo` state.
    async fn create(&self, text: &str) -> StoreResult<ListItem>;

    /// Remove the item. Absent ids are a no-op.
    async fn delete(&self, id: ItemId) -> StoreResult<()>;

    /// Overwrite the state unconditionally.
    async fn set_state(&self, id: ItemId, state: ItemState) -> StoreResult<ListItem>;

    /// Replace the text of an item in `Edit` state and return it to `Todo`.
    async fn set_text(&self, id: ItemId, text: &str) -> StoreResult<ListItem>;
}

/// Build the store selected by `config`.
pub fn open_store(config: &DatabaseConfig) -> StoreResult<Arc<dyn ItemStore>> {
    match config.backend {
        StoreBackend::Sqlite => Ok(Arc::new(SqliteItemStore::open(&config.path)?)),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory item store; items are lost on exit");
            Ok(Arc::new(MemoryItemStore::new()))
        }
    }
}
