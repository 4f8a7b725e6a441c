//! Core engine for ClozeNote: hierarchical notes, cloze flashcard
//! extraction, and a spaced-repetition review scheduler backed by a
//! single-slot durable snapshot.
//! This crate is the single source of truth for business invariants.

pub mod cloze;
pub mod db;
pub mod logging;
pub mod model;
pub mod review;
pub mod service;
pub mod store;
pub mod tree;

pub use cloze::{ClozeError, ClozeResult, ClozeToggle, SpanFault};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::flashcard::{ClozeSpan, Flashcard, FlashcardId, RevealState, BLANK_MARKER};
pub use model::note::{Note, NoteId};
pub use review::{DoublingInterval, IntervalPolicy, ReviewError, ReviewResult};
pub use service::notebook::{today, Notebook, NotebookError, NotebookResult};
pub use store::{SnapshotStore, SqliteSnapshotStore, StoreError, StoreResult, DEFAULT_SLOT};
pub use tree::{DueCard, NoteTree, TreeError, TreeIntegrityError, TreeResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
