//! Domain model for notes and cloze flashcards.
//!
//! # Responsibility
//! - Define the canonical data structures used by core business logic.
//! - Keep one stable shape shared by tree, review and persistence layers.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Every flashcard is owned by exactly one note.

pub mod flashcard;
pub mod note;
