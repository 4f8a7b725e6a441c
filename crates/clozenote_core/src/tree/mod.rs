//! Note forest arena and structural mutations.
//!
//! # Responsibility
//! - Own all notes keyed by id plus the ordered root list.
//! - Apply create/move/delete/edit operations atomically.
//! - Validate rebuilt state when a snapshot is decoded.
//!
//! # Invariants
//! - The parent/child relation is a forest: acyclic, one parent per
//!   non-root note.
//! - `subnote_ids` of a note is exactly the set of notes whose `parent_id`
//!   equals that note, in stored order; `root_ids` plays the same role for
//!   root-level notes. The two representations never diverge.
//! - Every failed operation leaves the tree unchanged.

use crate::model::flashcard::Flashcard;
use crate::model::note::{Note, NoteId};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors from structural tree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Referenced note id is absent from the arena.
    NotFound(NoteId),
    /// Reparent target is the note itself or one of its descendants.
    InvalidMove { id: NoteId, new_parent: NoteId },
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidMove { id, new_parent } => write!(
                f,
                "move would break the forest: note {id} under parent {new_parent}"
            ),
        }
    }
}

impl Error for TreeError {}

/// Integrity violations detected when rebuilding a tree from decoded notes.
///
/// These never occur for trees mutated exclusively through [`NoteTree`]
/// operations; they exist so the persistence layer can reject inconsistent
/// snapshots instead of loading a corrupt forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIntegrityError {
    /// Two decoded notes share one id.
    DuplicateId(NoteId),
    /// A note references a parent that is not part of the snapshot.
    MissingParent { id: NoteId, parent_id: NoteId },
    /// `subnote_ids` and `parent_id` disagree for this parent/child pair.
    ChildMismatch { parent_id: NoteId, child_id: NoteId },
    /// Following parent links from this note never reaches a root.
    CycleDetected(NoteId),
}

impl Display for TreeIntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate note id: {id}"),
            Self::MissingParent { id, parent_id } => {
                write!(f, "note {id} references missing parent {parent_id}")
            }
            Self::ChildMismatch {
                parent_id,
                child_id,
            } => write!(
                f,
                "parent/child lists diverge between {parent_id} and {child_id}"
            ),
            Self::CycleDetected(id) => write!(f, "parent chain of note {id} contains a cycle"),
        }
    }
}

impl Error for TreeIntegrityError {}

/// One due flashcard together with its owning note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCard {
    pub note_id: NoteId,
    pub flashcard: Flashcard,
}

/// Arena of notes keyed by id, with explicit ordered sibling lists.
///
/// Parent/child relationships are id cross-references, never object
/// references, so cycle detection is a plain ancestor walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteTree {
    notes: HashMap<NoteId, Note>,
    root_ids: Vec<NoteId>,
}

impl NoteTree {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a forest from decoded notes, validating every invariant.
    ///
    /// Root order is the order in which root-level notes appear in `notes`;
    /// child order is each note's `subnote_ids`.
    ///
    /// # Errors
    /// Returns the first [`TreeIntegrityError`] found; the caller treats any
    /// violation as a corrupt snapshot.
    pub fn from_notes(notes: Vec<Note>) -> Result<Self, TreeIntegrityError> {
        let mut arena: HashMap<NoteId, Note> = HashMap::with_capacity(notes.len());
        let mut root_ids = Vec::new();
        for note in notes {
            let id = note.id;
            if note.is_root() {
                root_ids.push(id);
            }
            if arena.insert(id, note).is_some() {
                return Err(TreeIntegrityError::DuplicateId(id));
            }
        }

        let tree = Self {
            notes: arena,
            root_ids,
        };
        tree.check_integrity()?;
        Ok(tree)
    }

    /// Verifies the forest invariant over the whole arena.
    ///
    /// Cheap relative to snapshot decoding; also used directly by tests to
    /// assert the invariant after every mutation.
    pub fn check_integrity(&self) -> Result<(), TreeIntegrityError> {
        let mut seen_children: HashSet<NoteId> = HashSet::new();

        for note in self.notes.values() {
            if let Some(parent_id) = note.parent_id {
                let parent = self
                    .notes
                    .get(&parent_id)
                    .ok_or(TreeIntegrityError::MissingParent {
                        id: note.id,
                        parent_id,
                    })?;
                if !parent.subnote_ids.contains(&note.id) {
                    return Err(TreeIntegrityError::ChildMismatch {
                        parent_id,
                        child_id: note.id,
                    });
                }
            } else if !self.root_ids.contains(&note.id) {
                return Err(TreeIntegrityError::ChildMismatch {
                    parent_id: note.id,
                    child_id: note.id,
                });
            }

            for child_id in &note.subnote_ids {
                if !seen_children.insert(*child_id) {
                    return Err(TreeIntegrityError::ChildMismatch {
                        parent_id: note.id,
                        child_id: *child_id,
                    });
                }
                let child = self
                    .notes
                    .get(child_id)
                    .ok_or(TreeIntegrityError::ChildMismatch {
                        parent_id: note.id,
                        child_id: *child_id,
                    })?;
                if child.parent_id != Some(note.id) {
                    return Err(TreeIntegrityError::ChildMismatch {
                        parent_id: note.id,
                        child_id: *child_id,
                    });
                }
            }
        }

        let mut seen_roots = HashSet::new();
        for root_id in &self.root_ids {
            if !seen_roots.insert(*root_id) || seen_children.contains(root_id) {
                return Err(TreeIntegrityError::ChildMismatch {
                    parent_id: *root_id,
                    child_id: *root_id,
                });
            }
            match self.notes.get(root_id) {
                Some(root) if root.is_root() => {}
                _ => {
                    return Err(TreeIntegrityError::ChildMismatch {
                        parent_id: *root_id,
                        child_id: *root_id,
                    })
                }
            }
        }

        // Every note must reach a root through finitely many parent links.
        for note in self.notes.values() {
            let mut visited = HashSet::new();
            let mut cursor = note.parent_id;
            while let Some(current) = cursor {
                if current == note.id || !visited.insert(current) {
                    return Err(TreeIntegrityError::CycleDetected(note.id));
                }
                cursor = self
                    .notes
                    .get(&current)
                    .ok_or(TreeIntegrityError::MissingParent {
                        id: note.id,
                        parent_id: current,
                    })?
                    .parent_id;
            }
        }

        Ok(())
    }

    /// Number of notes in the forest.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns whether the forest holds no notes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Returns whether `id` is present.
    pub fn contains(&self, id: NoteId) -> bool {
        self.notes.contains_key(&id)
    }

    /// Loads one note by id.
    pub fn get_note(&self, id: NoteId) -> TreeResult<&Note> {
        self.notes.get(&id).ok_or(TreeError::NotFound(id))
    }

    pub(crate) fn get_note_mut(&mut self, id: NoteId) -> TreeResult<&mut Note> {
        self.notes.get_mut(&id).ok_or(TreeError::NotFound(id))
    }

    /// Root-level notes in display order.
    pub fn roots(&self) -> Vec<&Note> {
        self.root_ids
            .iter()
            .filter_map(|id| self.notes.get(id))
            .collect()
    }

    /// Children of `id` in display order.
    pub fn children(&self, id: NoteId) -> TreeResult<Vec<&Note>> {
        let note = self.get_note(id)?;
        Ok(note
            .subnote_ids
            .iter()
            .filter_map(|child_id| self.notes.get(child_id))
            .collect())
    }

    /// Creates one note as the last child of `parent` (or last root).
    ///
    /// # Errors
    /// `NotFound` when `parent` is absent; the tree is unchanged.
    pub fn create_note(
        &mut self,
        content: impl Into<String>,
        parent: Option<NoteId>,
    ) -> TreeResult<&Note> {
        if let Some(parent_id) = parent {
            if !self.contains(parent_id) {
                return Err(TreeError::NotFound(parent_id));
            }
        }

        let note = Note::new(content, parent);
        let id = note.id;
        match parent {
            Some(parent_id) => {
                self.notes
                    .get_mut(&parent_id)
                    .ok_or(TreeError::NotFound(parent_id))?
                    .subnote_ids
                    .push(id);
            }
            None => self.root_ids.push(id),
        }
        self.notes.insert(id, note);
        self.get_note(id)
    }

    /// Reparents `id` under `new_parent` at sibling position `index`.
    ///
    /// `index` is clamped to the valid range of the destination list after
    /// `id` has been removed from its old position, so same-parent reorders
    /// behave like a single list move.
    ///
    /// # Errors
    /// - `NotFound` when `id` or `new_parent` is absent.
    /// - `InvalidMove` when `new_parent` is `id` itself or a descendant of
    ///   `id`; accepting it would detach the subtree into a cycle.
    ///
    /// The tree is unchanged on every error path.
    pub fn move_note(
        &mut self,
        id: NoteId,
        new_parent: Option<NoteId>,
        index: usize,
    ) -> TreeResult<()> {
        if !self.contains(id) {
            return Err(TreeError::NotFound(id));
        }
        if let Some(parent_id) = new_parent {
            if !self.contains(parent_id) {
                return Err(TreeError::NotFound(parent_id));
            }
            if parent_id == id || self.is_descendant(parent_id, id)? {
                return Err(TreeError::InvalidMove {
                    id,
                    new_parent: parent_id,
                });
            }
        }

        // All checks passed; apply both sides of the relation together.
        let old_parent = self.get_note(id)?.parent_id;
        self.detach_from_siblings(id, old_parent);

        let siblings = match new_parent {
            Some(parent_id) => {
                &mut self
                    .notes
                    .get_mut(&parent_id)
                    .ok_or(TreeError::NotFound(parent_id))?
                    .subnote_ids
            }
            None => &mut self.root_ids,
        };
        let position = index.min(siblings.len());
        siblings.insert(position, id);

        self.notes
            .get_mut(&id)
            .ok_or(TreeError::NotFound(id))?
            .parent_id = new_parent;
        Ok(())
    }

    /// Deletes `id` and, recursively, every descendant and their flashcards.
    ///
    /// # Errors
    /// `NotFound` when `id` is absent; no partial deletion is observable.
    pub fn delete_note(&mut self, id: NoteId) -> TreeResult<()> {
        let parent_id = self.get_note(id)?.parent_id;

        let mut doomed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(note) = self.notes.get(&current) {
                stack.extend(note.subnote_ids.iter().copied());
            }
            doomed.push(current);
        }

        self.detach_from_siblings(id, parent_id);
        for note_id in doomed {
            self.notes.remove(&note_id);
        }
        Ok(())
    }

    /// Replaces a note's text.
    ///
    /// Existing flashcards keep their extraction-time `clozed_content` and
    /// `answer` snapshots.
    pub fn edit_content(&mut self, id: NoteId, new_content: impl Into<String>) -> TreeResult<()> {
        self.get_note_mut(id)?.content = new_content.into();
        Ok(())
    }

    /// Flashcards with `due_date <= as_of`, in tree preorder then card
    /// position, so review queues are deterministic.
    pub fn due_flashcards(&self, as_of: NaiveDate) -> Vec<DueCard> {
        let mut due = Vec::new();
        let mut stack: Vec<NoteId> = self.root_ids.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(note) = self.notes.get(&id) {
                for card in &note.flashcards {
                    if card.is_due(as_of) {
                        due.push(DueCard {
                            note_id: id,
                            flashcard: card.clone(),
                        });
                    }
                }
                stack.extend(note.subnote_ids.iter().rev().copied());
            }
        }
        due
    }

    /// Flat note list in preorder; encodes root and child order for
    /// snapshot serialization.
    pub fn to_notes(&self) -> Vec<Note> {
        let mut out = Vec::with_capacity(self.notes.len());
        let mut stack: Vec<NoteId> = self.root_ids.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(note) = self.notes.get(&id) {
                out.push(note.clone());
                stack.extend(note.subnote_ids.iter().rev().copied());
            }
        }
        out
    }

    /// Returns whether `candidate` sits in the subtree rooted at `ancestor`.
    ///
    /// Walks parent links from `candidate` upward; the visited guard turns a
    /// hypothetically corrupted chain into a rejection instead of a hang.
    fn is_descendant(&self, candidate: NoteId, ancestor: NoteId) -> TreeResult<bool> {
        let mut visited = HashSet::new();
        let mut cursor = self.get_note(candidate)?.parent_id;
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }
            cursor = self.get_note(current)?.parent_id;
        }
        Ok(false)
    }

    fn detach_from_siblings(&mut self, id: NoteId, parent_id: Option<NoteId>) {
        let siblings = match parent_id {
            Some(parent_id) => match self.notes.get_mut(&parent_id) {
                Some(parent) => &mut parent.subnote_ids,
                None => return,
            },
            None => &mut self.root_ids,
        };
        siblings.retain(|sibling| *sibling != id);
    }
}
