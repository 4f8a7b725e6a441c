//! Cloze flashcard extraction.
//!
//! # Responsibility
//! - Validate user-selected spans against note content.
//! - Derive blanked prompt + answer snapshots from a note.
//! - Implement the idempotent toggle: same span removes, new span creates.
//!
//! # Invariants
//! - Spans owned by one note are pairwise disjoint.
//! - A created card snapshots the content at extraction time; later edits
//!   to the note do not rewrite existing cards.

use crate::model::flashcard::{ClozeSpan, Flashcard, FlashcardId, BLANK_MARKER};
use crate::model::note::Note;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by cloze operations.
pub type ClozeResult<T> = Result<T, ClozeError>;

/// Errors from cloze extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClozeError {
    /// Span is empty, out of range, not on `char` boundaries, or overlaps
    /// an existing card's span.
    InvalidSpan { span: ClozeSpan, reason: SpanFault },
}

/// Why a span was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanFault {
    Empty,
    OutOfRange,
    NotCharAligned,
    Overlapping,
}

impl Display for ClozeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSpan { span, reason } => {
                let detail = match reason {
                    SpanFault::Empty => "span is empty",
                    SpanFault::OutOfRange => "span exceeds note content",
                    SpanFault::NotCharAligned => "span splits a character",
                    SpanFault::Overlapping => "span overlaps an existing flashcard",
                };
                write!(f, "invalid cloze span {}..{}: {detail}", span.start, span.end())
            }
        }
    }
}

impl Error for ClozeError {}

/// Outcome of [`toggle`]: either a card was created or an existing exact
/// match was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClozeToggle {
    Created(Flashcard),
    Removed(FlashcardId),
}

/// Toggles a cloze over `span` on `note`.
///
/// - Exact match against an existing card's span removes that card.
/// - Otherwise a valid, non-overlapping span creates one card with
///   `answer` = the spanned substring, `clozed_content` = content with the
///   span replaced by [`BLANK_MARKER`], hidden and due on `today`.
///
/// # Errors
/// `InvalidSpan` for empty, out-of-range, or mid-character spans, and for
/// spans overlapping an existing card without matching it exactly. The
/// note is unchanged on every error path.
pub fn toggle(note: &mut Note, span: ClozeSpan, today: NaiveDate) -> ClozeResult<ClozeToggle> {
    if let Some(position) = note.flashcards.iter().position(|card| card.span == span) {
        let removed = note.flashcards.remove(position);
        return Ok(ClozeToggle::Removed(removed.id));
    }

    validate_span(note.content.as_str(), span)?;
    if note.flashcards.iter().any(|card| card.span.overlaps(&span)) {
        return Err(ClozeError::InvalidSpan {
            span,
            reason: SpanFault::Overlapping,
        });
    }

    let card = extract(note.content.as_str(), span, today);
    note.flashcards.push(card.clone());
    Ok(ClozeToggle::Created(card))
}

/// Builds one flashcard from validated `span` over `content`.
fn extract(content: &str, span: ClozeSpan, today: NaiveDate) -> Flashcard {
    let answer = &content[span.start..span.end()];
    let mut clozed = String::with_capacity(content.len() - span.len + BLANK_MARKER.len());
    clozed.push_str(&content[..span.start]);
    clozed.push_str(BLANK_MARKER);
    clozed.push_str(&content[span.end()..]);
    Flashcard::new(clozed, answer, span, today)
}

fn validate_span(content: &str, span: ClozeSpan) -> ClozeResult<()> {
    if span.len == 0 {
        return Err(ClozeError::InvalidSpan {
            span,
            reason: SpanFault::Empty,
        });
    }
    let end = span
        .start
        .checked_add(span.len)
        .filter(|end| *end <= content.len());
    if end.is_none() {
        return Err(ClozeError::InvalidSpan {
            span,
            reason: SpanFault::OutOfRange,
        });
    }
    if !content.is_char_boundary(span.start) || !content.is_char_boundary(span.end()) {
        return Err(ClozeError::InvalidSpan {
            span,
            reason: SpanFault::NotCharAligned,
        });
    }
    Ok(())
}
