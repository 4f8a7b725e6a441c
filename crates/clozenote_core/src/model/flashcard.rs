//! Flashcard domain model.
//!
//! # Responsibility
//! - Define the cloze flashcard record and its review-facing state.
//! - Provide the due-date predicate used by review queues.
//!
//! # Invariants
//! - `clozed_content` and `answer` are snapshots taken at extraction time;
//!   later edits to the owning note do not rewrite them.
//! - `due_date` only moves forward via a Remembered outcome and resets to
//!   the review day via Forgot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every flashcard.
pub type FlashcardId = Uuid;

/// Placeholder substituted for the blanked span in `clozed_content`.
pub const BLANK_MARKER: &str = "[...]";

/// Whether the answer is currently displayed during review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    /// Answer hidden; the prompt shows the blank marker.
    #[default]
    Hidden,
    /// Answer displayed; an outcome (Remembered/Forgot) is expected next.
    Shown,
}

/// Contiguous byte span of the owning note's content at extraction time.
///
/// Spans identify cards for the idempotent toggle: toggling the exact same
/// span removes the card, while an overlapping span is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClozeSpan {
    /// Byte offset of the first blanked character.
    pub start: usize,
    /// Byte length of the blanked text. Always > 0 for a valid span.
    pub len: usize,
}

impl ClozeSpan {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Exclusive end offset, saturating at `usize::MAX`.
    ///
    /// Validation rejects spans whose true end would overflow, so the
    /// saturation only matters for keeping comparisons on hostile input
    /// total instead of panicking.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.len)
    }

    /// Returns whether two spans share at least one byte.
    pub fn overlaps(&self, other: &ClozeSpan) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// One cloze flashcard derived from a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Stable global ID.
    pub id: FlashcardId,
    /// Note text with the span replaced by [`BLANK_MARKER`].
    pub clozed_content: String,
    /// Text originally occupying the blanked span.
    pub answer: String,
    /// Span identity used for toggle removal and overlap rejection.
    pub span: ClozeSpan,
    /// Calendar date (day granularity) on/after which the card is due.
    pub due_date: NaiveDate,
    /// Current spacing interval in days; 0 until the first Remembered.
    #[serde(default)]
    pub interval_days: u32,
    /// Review display state. Cards always persist as `Hidden` between
    /// sessions because every outcome transition returns to `Hidden`.
    #[serde(default)]
    pub reveal_state: RevealState,
}

impl Flashcard {
    /// Creates a freshly extracted card: hidden, due immediately.
    pub fn new(
        clozed_content: impl Into<String>,
        answer: impl Into<String>,
        span: ClozeSpan,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            clozed_content: clozed_content.into(),
            answer: answer.into(),
            span,
            due_date,
            interval_days: 0,
            reveal_state: RevealState::Hidden,
        }
    }

    /// Returns whether this card is eligible for review on `as_of`.
    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.due_date <= as_of
    }
}

#[cfg(test)]
mod tests {
    use super::ClozeSpan;

    #[test]
    fn overlap_is_symmetric_and_excludes_adjacent_spans() {
        let left = ClozeSpan::new(0, 4);
        let right = ClozeSpan::new(4, 3);
        let crossing = ClozeSpan::new(2, 4);

        assert!(!left.overlaps(&right));
        assert!(!right.overlaps(&left));
        assert!(left.overlaps(&crossing));
        assert!(crossing.overlaps(&left));
    }
}
