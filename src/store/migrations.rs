//! Schema migrations for the SQLite backend.
//!
//! Applied migrations are tracked in `PRAGMA user_version`; each migration
//! runs in its own transaction and bumps the version on commit.

use rusqlite::Connection;

use super::StoreError;

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Ordered by version, starting at 1.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create list_items table",
    sql: "CREATE TABLE IF NOT EXISTS list_items (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            text  TEXT    NOT NULL,
            state TEXT    NOT NULL
        );",
}];

/// Outcome of [`crate::store::SqliteItemStore::migrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: usize,
    /// `user_version` read back from the database afterwards.
    pub schema_version: u32,
}

pub(crate) fn schema_version(conn: &Connection) -> Result<u32, StoreError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Apply every migration newer than the current schema version.
///
/// Returns the number of migrations applied.
pub(crate) fn run_migrations(conn: &mut Connection) -> Result<usize, StoreError> {
    let current = schema_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(conn, migration).map_err(|source| StoreError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        })?;
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applied migration"
        );
        applied += 1;
    }

    Ok(applied)
}

fn apply(conn: &mut Connection, migration: &Migration) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()
}
