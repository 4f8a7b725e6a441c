//! Snapshot persistence contracts and wire records.
//!
//! # Responsibility
//! - Define the durable round-trip API for the whole note tree.
//! - Encode/decode the tree as a flat, order-preserving record list.
//! - Recover from corrupt payloads locally instead of failing the caller.
//!
//! # Invariants
//! - `load` never surfaces a corrupt snapshot: absent or unparsable slots
//!   yield an empty tree, logged but not propagated.
//! - Decoding tolerates unknown fields and defaults absent ones to their
//!   construction-time values.
//! - `save` replaces the slot's prior content wholesale.

use crate::model::flashcard::{ClozeSpan, Flashcard, FlashcardId, RevealState};
use crate::model::note::{Note, NoteId};
use crate::tree::{NoteTree, TreeIntegrityError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod sqlite;

pub use sqlite::SqliteSnapshotStore;

/// Slot name used when the caller does not pick one.
pub const DEFAULT_SLOT: &str = "notebook";

/// Result type used by snapshot store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from snapshot store operations.
///
/// Corrupt payloads are deliberately absent here: they are recovered inside
/// `load`, never returned.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(crate::db::DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Tree could not be encoded for storage.
    Encode(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "snapshot store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "snapshot store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "snapshot store requires column `{column}` in table `{table}`"
            ),
            Self::Encode(message) => write!(f, "failed to encode snapshot: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<crate::db::DbError> for StoreError {
    fn from(value: crate::db::DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(crate::db::DbError::Sqlite(value))
    }
}

/// Durable round-trip of the entire note tree to one named slot.
pub trait SnapshotStore {
    /// Deserializes the stored snapshot.
    ///
    /// Absent or corrupt slots yield an empty tree; only I/O-level failures
    /// are returned as errors.
    fn load(&self) -> StoreResult<NoteTree>;

    /// Serializes the full current snapshot, replacing any prior content.
    fn save(&self, tree: &NoteTree) -> StoreResult<()>;
}

/// Why a stored payload was discarded during `load`.
#[derive(Debug)]
pub(crate) enum CorruptSnapshot {
    Unparsable(serde_json::Error),
    Inconsistent(TreeIntegrityError),
}

impl Display for CorruptSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparsable(err) => write!(f, "unparsable payload: {err}"),
            Self::Inconsistent(err) => write!(f, "inconsistent forest: {err}"),
        }
    }
}

// Wire records mirror the domain model but keep every field optional, so
// older or hand-edited payloads still decode. Unknown fields are ignored
// by serde_json's default behavior.

#[derive(Debug, Serialize, Deserialize)]
struct NoteRecord {
    #[serde(default = "Uuid::new_v4")]
    id: NoteId,
    #[serde(default)]
    content: String,
    #[serde(default)]
    parent_id: Option<NoteId>,
    #[serde(default)]
    subnote_ids: Vec<NoteId>,
    #[serde(default)]
    flashcards: Vec<FlashcardRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FlashcardRecord {
    #[serde(default = "Uuid::new_v4")]
    id: FlashcardId,
    #[serde(default)]
    clozed_content: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    span: ClozeSpan,
    #[serde(default = "today_local")]
    due_date: NaiveDate,
    #[serde(default)]
    interval_days: u32,
    #[serde(default)]
    reveal_state: RevealState,
}

fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            content: note.content.clone(),
            parent_id: note.parent_id,
            subnote_ids: note.subnote_ids.clone(),
            flashcards: note.flashcards.iter().map(FlashcardRecord::from).collect(),
        }
    }
}

impl From<&Flashcard> for FlashcardRecord {
    fn from(card: &Flashcard) -> Self {
        Self {
            id: card.id,
            clozed_content: card.clozed_content.clone(),
            answer: card.answer.clone(),
            span: card.span,
            due_date: card.due_date,
            interval_days: card.interval_days,
            reveal_state: card.reveal_state,
        }
    }
}

impl From<NoteRecord> for Note {
    fn from(record: NoteRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            parent_id: record.parent_id,
            subnote_ids: record.subnote_ids,
            flashcards: record.flashcards.into_iter().map(Flashcard::from).collect(),
        }
    }
}

impl From<FlashcardRecord> for Flashcard {
    fn from(record: FlashcardRecord) -> Self {
        Self {
            id: record.id,
            clozed_content: record.clozed_content,
            answer: record.answer,
            span: record.span,
            due_date: record.due_date,
            interval_days: record.interval_days,
            reveal_state: record.reveal_state,
        }
    }
}

/// Encodes the whole tree as a flat preorder record list.
pub(crate) fn encode_tree(tree: &NoteTree) -> StoreResult<String> {
    let records: Vec<NoteRecord> = tree.to_notes().iter().map(NoteRecord::from).collect();
    serde_json::to_string(&records).map_err(|err| StoreError::Encode(err.to_string()))
}

/// Decodes a stored payload back into a validated tree.
pub(crate) fn decode_tree(payload: &str) -> Result<NoteTree, CorruptSnapshot> {
    let records: Vec<NoteRecord> =
        serde_json::from_str(payload).map_err(CorruptSnapshot::Unparsable)?;
    let notes: Vec<Note> = records.into_iter().map(Note::from).collect();
    NoteTree::from_notes(notes).map_err(CorruptSnapshot::Inconsistent)
}
