//! SQLite-backed snapshot store.
//!
//! # Responsibility
//! - Persist one JSON payload per named slot in the `snapshots` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Saves replace the slot row atomically.
//! - Corrupt payloads are logged and recovered as an empty tree.

use super::{decode_tree, encode_tree, SnapshotStore, StoreError, StoreResult};
use crate::db::migrations::latest_version;
use crate::tree::NoteTree;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};

/// Snapshot store bound to one connection and one named slot.
#[derive(Debug)]
pub struct SqliteSnapshotStore<'conn> {
    conn: &'conn Connection,
    slot: String,
}

impl<'conn> SqliteSnapshotStore<'conn> {
    /// Creates a store from a migrated connection.
    ///
    /// # Errors
    /// Rejects connections whose schema version or `snapshots` table does
    /// not match what this binary expects.
    pub fn try_new(conn: &'conn Connection, slot: impl Into<String>) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self {
            conn,
            slot: slot.into(),
        })
    }

    /// The slot name this store reads and writes.
    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl SnapshotStore for SqliteSnapshotStore<'_> {
    fn load(&self) -> StoreResult<NoteTree> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE slot = ?1;",
                [self.slot.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            info!(
                "event=snapshot_load module=store status=ok slot={} outcome=absent",
                self.slot
            );
            return Ok(NoteTree::new());
        };

        match decode_tree(payload.as_str()) {
            Ok(tree) => {
                info!(
                    "event=snapshot_load module=store status=ok slot={} notes={}",
                    self.slot,
                    tree.len()
                );
                Ok(tree)
            }
            Err(corrupt) => {
                // Recovery policy: the caller always gets a usable tree.
                warn!(
                    "event=snapshot_load module=store status=recovered slot={} error_code=corrupt_snapshot error={}",
                    self.slot, corrupt
                );
                Ok(NoteTree::new())
            }
        }
    }

    fn save(&self, tree: &NoteTree) -> StoreResult<()> {
        let payload = encode_tree(tree)?;
        self.conn.execute(
            "INSERT INTO snapshots (slot, payload, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(slot) DO UPDATE SET
                 payload = excluded.payload,
                 updated_at = excluded.updated_at;",
            params![self.slot.as_str(), payload],
        )?;
        Ok(())
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "snapshots")? {
        return Err(StoreError::MissingRequiredTable("snapshots"));
    }

    for column in ["slot", "payload", "updated_at"] {
        if !table_has_column(conn, "snapshots", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "snapshots",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
