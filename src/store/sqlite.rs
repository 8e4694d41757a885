//! SQLite-backed item store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;

use super::migrations::{run_migrations, schema_version, MigrationReport};
use super::{ItemStore, StoreError, StoreResult};
use crate::item::{ItemError, ItemId, ItemState, ListItem};

const ITEM_COLUMNS: &str = "id, text, state";

/// Row of the `list_items` table as stored.
#[derive(Debug)]
struct ListItemRecord {
    id: ItemId,
    text: String,
    state: String,
}

impl ListItemRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            state: row.get(2)?,
        })
    }
}

impl TryFrom<ListItemRecord> for ListItem {
    type Error = StoreError;

    fn try_from(record: ListItemRecord) -> Result<Self, Self::Error> {
        let state = record
            .state
            .parse::<ItemState>()
            .map_err(|e| StoreError::CorruptRow {
                id: record.id,
                reason: e.to_string(),
            })?;
        Ok(ListItem {
            id: record.id,
            text: record.text,
            state,
        })
    }
}

/// Item store over a single SQLite connection.
///
/// Every state or text change is one conditional `UPDATE … RETURNING`, so a
/// text update cannot race with a concurrent state change.
#[derive(Clone)]
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteItemStore {
    /// Open (or create) the database file and bring its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()?
        } else {
            let conn = Connection::open(path)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn
        };
        tracing::info!(path = %path.display(), "Opened item database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Apply pending migrations without opening a store.
    pub fn migrate(path: impl AsRef<Path>) -> StoreResult<MigrationReport> {
        let mut conn = Connection::open(path.as_ref())?;
        let applied = run_migrations(&mut conn)?;
        Ok(MigrationReport {
            applied,
            schema_version: schema_version(&conn)?,
        })
    }
}

fn find(conn: &Connection, id: ItemId) -> StoreResult<Option<ListItem>> {
    let record = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM list_items WHERE id = ?1"),
            params![id],
            ListItemRecord::from_row,
        )
        .optional()?;
    record.map(ListItem::try_from).transpose()
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn list_all(&self) -> StoreResult<Vec<ListItem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM list_items ORDER BY id"))?;
        let records = stmt
            .query_map([], ListItemRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        records.into_iter().map(ListItem::try_from).collect()
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<ListItem>> {
        let conn = self.conn.lock().await;
        find(&conn, id)
    }

    async fn create(&self, text: &str) -> StoreResult<ListItem> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO list_items (text, state) VALUES (?1, ?2)",
            params![text, ItemState::Todo.as_str()],
        )?;
        let item = ListItem::new(conn.last_insert_rowid(), text);
        tracing::debug!(id = item.id, "Created item");
        Ok(item)
    }

    async fn delete(&self, id: ItemId) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM list_items WHERE id = ?1", params![id])?;
        if removed > 0 {
            tracing::debug!(id, "Deleted item");
        }
        Ok(())
    }

    async fn set_state(&self, id: ItemId, state: ItemState) -> StoreResult<ListItem> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                &format!("UPDATE list_items SET state = ?1 WHERE id = ?2 RETURNING {ITEM_COLUMNS}"),
                params![state.as_str(), id],
                ListItemRecord::from_row,
            )
            .optional()?
            .ok_or(ItemError::NotFound { id })?;
        tracing::debug!(id, %state, "Set item state");
        ListItem::try_from(record)
    }

    async fn set_text(&self, id: ItemId, text: &str) -> StoreResult<ListItem> {
        let conn = self.conn.lock().await;
        let updated = conn
            .query_row(
                &format!(
                    "UPDATE list_items SET text = ?1, state = ?2 \
                     WHERE id = ?3 AND state = ?4 RETURNING {ITEM_COLUMNS}"
                ),
                params![
                    text,
                    ItemState::Todo.as_str(),
                    id,
                    ItemState::Edit.as_str()
                ],
                ListItemRecord::from_row,
            )
            .optional()?;

        if let Some(record) = updated {
            tracing::debug!(id, "Set item text");
            return ListItem::try_from(record);
        }

        // Nothing matched: tell a missing row from a row in the wrong state.
        match find(&conn, id)? {
            None => Err(ItemError::NotFound { id }.into()),
            Some(item) => Err(ItemError::NotInEditState {
                id,
                state: item.state,
            }
            .into()),
        }
    }
}
