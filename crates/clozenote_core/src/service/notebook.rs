//! Notebook facade: the single entry point for UI-level intents.
//!
//! # Responsibility
//! - Apply tree/cloze/review mutations synchronously against in-memory
//!   state, then snapshot through the store.
//! - Keep persistence best-effort: save failures are logged, never turned
//!   into mutation failures.
//!
//! # Invariants
//! - Failed mutations change nothing and trigger no save.
//! - In-memory state stays authoritative over the last written snapshot.
//! - The wall clock enters the engine only through this layer.

use crate::cloze::{self, ClozeError, ClozeToggle};
use crate::model::flashcard::{ClozeSpan, Flashcard, FlashcardId};
use crate::model::note::{Note, NoteId};
use crate::review::{self, DoublingInterval, IntervalPolicy, ReviewError};
use crate::store::{SnapshotStore, StoreResult};
use crate::tree::{DueCard, NoteTree, TreeError};
use chrono::NaiveDate;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by notebook operations.
pub type NotebookResult<T> = Result<T, NotebookError>;

/// Errors surfaced to UI collaborators by notebook operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookError {
    /// Structural failure: absent note or forest-breaking move.
    Tree(TreeError),
    /// Rejected cloze span.
    Cloze(ClozeError),
    /// Review transition attempted from the wrong state.
    Review(ReviewError),
    /// Referenced flashcard is absent from the referenced note.
    CardNotFound {
        note_id: NoteId,
        card_id: FlashcardId,
    },
}

impl Display for NotebookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree(err) => write!(f, "{err}"),
            Self::Cloze(err) => write!(f, "{err}"),
            Self::Review(err) => write!(f, "{err}"),
            Self::CardNotFound { note_id, card_id } => {
                write!(f, "flashcard {card_id} not found on note {note_id}")
            }
        }
    }
}

impl Error for NotebookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Cloze(err) => Some(err),
            Self::Review(err) => Some(err),
            Self::CardNotFound { .. } => None,
        }
    }
}

impl From<TreeError> for NotebookError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<ClozeError> for NotebookError {
    fn from(value: ClozeError) -> Self {
        Self::Cloze(value)
    }
}

impl From<ReviewError> for NotebookError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

/// The engine behind the note/flashcard workflow.
///
/// Owns the in-memory tree, a snapshot store and the interval tunable.
/// All mutations run to completion before the next is accepted; there is
/// no interior locking because there is a single logical actor.
pub struct Notebook<S: SnapshotStore> {
    tree: NoteTree,
    store: S,
    policy: Box<dyn IntervalPolicy>,
}

impl<S: SnapshotStore> Notebook<S> {
    /// Opens a notebook over `store` with the default doubling policy.
    ///
    /// Loads the stored snapshot; a corrupt one is recovered inside the
    /// store as an empty tree.
    pub fn open(store: S) -> StoreResult<Self> {
        Self::open_with_policy(store, Box::new(DoublingInterval::default()))
    }

    /// Opens a notebook with a caller-provided interval policy.
    pub fn open_with_policy(store: S, policy: Box<dyn IntervalPolicy>) -> StoreResult<Self> {
        let tree = store.load()?;
        info!(
            "event=notebook_open module=service status=ok notes={}",
            tree.len()
        );
        Ok(Self {
            tree,
            store,
            policy,
        })
    }

    // ----- queries -----

    /// Loads one note by id.
    pub fn get_note(&self, id: NoteId) -> NotebookResult<Note> {
        Ok(self.tree.get_note(id)?.clone())
    }

    /// Children of `id` in display order.
    pub fn get_children(&self, id: NoteId) -> NotebookResult<Vec<Note>> {
        Ok(self
            .tree
            .children(id)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Root-level notes in display order.
    pub fn get_roots(&self) -> Vec<Note> {
        self.tree.roots().into_iter().cloned().collect()
    }

    /// Flashcards due on/before `as_of`, in deterministic tree order.
    pub fn get_due_flashcards(&self, as_of: NaiveDate) -> Vec<DueCard> {
        self.tree.due_flashcards(as_of)
    }

    /// Flashcards due as of the local calendar day.
    pub fn due_today(&self) -> Vec<DueCard> {
        self.get_due_flashcards(today())
    }

    /// Number of notes in the forest.
    pub fn note_count(&self) -> usize {
        self.tree.len()
    }

    /// Total number of flashcards across all notes.
    pub fn card_count(&self) -> usize {
        self.tree
            .to_notes()
            .iter()
            .map(|note| note.flashcards.len())
            .sum()
    }

    // ----- tree mutations -----

    /// Creates one note as the last child of `parent` (or last root).
    pub fn create_note(
        &mut self,
        content: impl Into<String>,
        parent: Option<NoteId>,
    ) -> NotebookResult<Note> {
        let note = self.tree.create_note(content, parent)?.clone();
        self.persist("note_create");
        Ok(note)
    }

    /// Reparents `id` under `new_parent` at sibling position `index`.
    pub fn move_note(
        &mut self,
        id: NoteId,
        new_parent: Option<NoteId>,
        index: usize,
    ) -> NotebookResult<()> {
        self.tree.move_note(id, new_parent, index)?;
        self.persist("note_move");
        Ok(())
    }

    /// Deletes `id`, all descendants and their flashcards.
    pub fn delete_note(&mut self, id: NoteId) -> NotebookResult<()> {
        self.tree.delete_note(id)?;
        self.persist("note_delete");
        Ok(())
    }

    /// Replaces a note's text; existing flashcards stay untouched.
    pub fn edit_content(
        &mut self,
        id: NoteId,
        new_content: impl Into<String>,
    ) -> NotebookResult<()> {
        self.tree.edit_content(id, new_content)?;
        self.persist("note_edit");
        Ok(())
    }

    // ----- cloze mutations -----

    /// Toggles a cloze flashcard over `span` on note `id`.
    pub fn toggle_cloze(&mut self, id: NoteId, span: ClozeSpan) -> NotebookResult<ClozeToggle> {
        let note = self.tree.get_note_mut(id)?;
        let outcome = cloze::toggle(note, span, today())?;
        self.persist("cloze_toggle");
        Ok(outcome)
    }

    // ----- review mutations -----

    /// Reveals the answer of one flashcard.
    pub fn reveal(&mut self, note_id: NoteId, card_id: FlashcardId) -> NotebookResult<Flashcard> {
        let card = self.card_mut(note_id, card_id)?;
        review::reveal(card)?;
        let updated = card.clone();
        self.persist("card_reveal");
        Ok(updated)
    }

    /// Records a Remembered outcome for one revealed flashcard.
    pub fn mark_remembered(
        &mut self,
        note_id: NoteId,
        card_id: FlashcardId,
    ) -> NotebookResult<Flashcard> {
        let now = today();
        let policy = &*self.policy;
        let card = match self.tree.get_note_mut(note_id) {
            Ok(note) => note
                .flashcards
                .iter_mut()
                .find(|card| card.id == card_id)
                .ok_or(NotebookError::CardNotFound { note_id, card_id })?,
            Err(err) => return Err(err.into()),
        };
        review::mark_remembered(card, now, policy)?;
        let updated = card.clone();
        self.persist("card_remembered");
        Ok(updated)
    }

    /// Records a Forgot outcome for one revealed flashcard.
    pub fn mark_forgot(
        &mut self,
        note_id: NoteId,
        card_id: FlashcardId,
    ) -> NotebookResult<Flashcard> {
        let now = today();
        let card = self.card_mut(note_id, card_id)?;
        review::mark_forgot(card, now)?;
        let updated = card.clone();
        self.persist("card_forgot");
        Ok(updated)
    }

    fn card_mut(
        &mut self,
        note_id: NoteId,
        card_id: FlashcardId,
    ) -> NotebookResult<&mut Flashcard> {
        self.tree
            .get_note_mut(note_id)?
            .flashcards
            .iter_mut()
            .find(|card| card.id == card_id)
            .ok_or(NotebookError::CardNotFound { note_id, card_id })
    }

    /// Best-effort snapshot after a successful mutation.
    ///
    /// Durability failures must not invalidate the completed in-memory
    /// mutation, so they are logged and swallowed here.
    fn persist(&self, operation: &'static str) {
        if let Err(err) = self.store.save(&self.tree) {
            error!(
                "event=snapshot_save module=service status=error operation={operation} error={err}"
            );
        }
    }
}

/// Local calendar day; the only clock read in the crate.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
