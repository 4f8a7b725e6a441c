//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by tree and persistence layers.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `parent_id == None` marks a root-level note.
//! - `subnote_ids` order is the display order and is owned by `NoteTree`.

use crate::model::flashcard::Flashcard;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every note.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type NoteId = Uuid;

/// One note in the forest, together with the flashcards derived from it.
///
/// Structural fields (`parent_id`, `subnote_ids`) are mutated only through
/// `NoteTree` operations, which keep both sides of the parent/child relation
/// consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable global ID used for cross-references and persistence.
    pub id: NoteId,
    /// Free-form note text.
    pub content: String,
    /// Parent note id. `None` means root-level note.
    pub parent_id: Option<NoteId>,
    /// Ordered child ids. Mirrors the `parent_id` side of the relation.
    pub subnote_ids: Vec<NoteId>,
    /// Flashcards derived from this note's content.
    pub flashcards: Vec<Flashcard>,
}

impl Note {
    /// Creates a new note with a generated stable ID, no children and no
    /// flashcards.
    pub fn new(content: impl Into<String>, parent_id: Option<NoteId>) -> Self {
        Self::with_id(Uuid::new_v4(), content, parent_id)
    }

    /// Creates a note with a caller-provided stable ID.
    ///
    /// Used by snapshot decoding where identity already exists.
    pub fn with_id(id: NoteId, content: impl Into<String>, parent_id: Option<NoteId>) -> Self {
        Self {
            id,
            content: content.into(),
            parent_id,
            subnote_ids: Vec::new(),
            flashcards: Vec::new(),
        }
    }

    /// Returns whether this note sits at root level.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
