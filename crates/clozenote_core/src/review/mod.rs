//! Spaced-repetition review state machine.
//!
//! # Responsibility
//! - Own the `Hidden -> Shown -> Hidden` transition cycle per flashcard.
//! - Apply due-date growth on Remembered and the reset on Forgot.
//!
//! # Invariants
//! - `reveal` never changes dates; outcomes are valid only from `Shown`.
//! - After `mark_remembered` the due date is strictly later than `today`
//!   and strictly later than the previous due date.
//! - After `mark_forgot` the due date equals `today` and the interval is
//!   back to zero.
//! - Failed transitions leave the card unchanged.

use crate::model::flashcard::{Flashcard, FlashcardId, RevealState};
use chrono::{Days, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by review transitions.
pub type ReviewResult<T> = Result<T, ReviewError>;

/// Errors from review-state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// Transition attempted from the wrong reveal state.
    InvalidTransition {
        card_id: FlashcardId,
        state: RevealState,
        attempted: &'static str,
    },
}

impl Display for ReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition {
                card_id,
                state,
                attempted,
            } => write!(
                f,
                "cannot {attempted} flashcard {card_id} in state {state:?}"
            ),
        }
    }
}

impl Error for ReviewError {}

/// Due-date growth tunable applied on a Remembered outcome.
///
/// Implementations map the card's current interval to the next one; the
/// scheduler owns the ordering guarantees, so a policy only has to return
/// at least one day.
pub trait IntervalPolicy {
    /// Next spacing interval in days, given the current one. Must be >= 1.
    fn next_interval_days(&self, current_interval_days: u32) -> u32;
}

/// Default policy: intervals double from one day, capped.
///
/// `0 -> 1 -> 2 -> 4 -> ... -> cap`.
#[derive(Debug, Clone, Copy)]
pub struct DoublingInterval {
    cap_days: u32,
}

impl DoublingInterval {
    pub fn new(cap_days: u32) -> Self {
        Self {
            cap_days: cap_days.max(1),
        }
    }
}

impl Default for DoublingInterval {
    fn default() -> Self {
        Self::new(365)
    }
}

impl IntervalPolicy for DoublingInterval {
    fn next_interval_days(&self, current_interval_days: u32) -> u32 {
        match current_interval_days {
            0 => 1,
            days => days.saturating_mul(2).min(self.cap_days),
        }
    }
}

/// Reveals the answer: `Hidden -> Shown`, dates untouched.
///
/// # Errors
/// `InvalidTransition` when the card is already `Shown`.
pub fn reveal(card: &mut Flashcard) -> ReviewResult<()> {
    match card.reveal_state {
        RevealState::Hidden => {
            card.reveal_state = RevealState::Shown;
            Ok(())
        }
        RevealState::Shown => Err(ReviewError::InvalidTransition {
            card_id: card.id,
            state: card.reveal_state,
            attempted: "reveal",
        }),
    }
}

/// Records a Remembered outcome: grows the interval via `policy`, pushes
/// the due date into the future and hides the answer again.
///
/// The new due date is clamped to stay strictly after the previous one, so
/// the ordering contract holds even for a card reviewed ahead of schedule.
///
/// # Errors
/// `InvalidTransition` when the card is not `Shown`.
pub fn mark_remembered(
    card: &mut Flashcard,
    today: NaiveDate,
    policy: &dyn IntervalPolicy,
) -> ReviewResult<()> {
    ensure_shown(card, "mark remembered")?;

    let interval = policy.next_interval_days(card.interval_days).max(1);
    let advanced = add_days(today, interval);
    let floor = add_days(card.due_date, 1);

    card.interval_days = interval;
    card.due_date = advanced.max(floor);
    card.reveal_state = RevealState::Hidden;
    Ok(())
}

/// Records a Forgot outcome: due today again, interval reset, hidden.
///
/// # Errors
/// `InvalidTransition` when the card is not `Shown`.
pub fn mark_forgot(card: &mut Flashcard, today: NaiveDate) -> ReviewResult<()> {
    ensure_shown(card, "mark forgot")?;

    card.interval_days = 0;
    card.due_date = today;
    card.reveal_state = RevealState::Hidden;
    Ok(())
}

fn ensure_shown(card: &Flashcard, attempted: &'static str) -> ReviewResult<()> {
    if card.reveal_state != RevealState::Shown {
        return Err(ReviewError::InvalidTransition {
            card_id: card.id,
            state: card.reveal_state,
            attempted,
        });
    }
    Ok(())
}

// chrono's checked addition only fails near the calendar bounds; saturate
// there instead of threading an error no caller can act on.
fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        mark_forgot, mark_remembered, reveal, DoublingInterval, IntervalPolicy, ReviewError,
    };
    use crate::model::flashcard::{ClozeSpan, Flashcard, RevealState};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn card_due(d: u32) -> Flashcard {
        Flashcard::new("a [...] c", "b", ClozeSpan::new(2, 1), day(d))
    }

    #[test]
    fn doubling_policy_grows_from_one_day_and_caps() {
        let policy = DoublingInterval::new(4);
        assert_eq!(policy.next_interval_days(0), 1);
        assert_eq!(policy.next_interval_days(1), 2);
        assert_eq!(policy.next_interval_days(2), 4);
        assert_eq!(policy.next_interval_days(4), 4);
    }

    #[test]
    fn reveal_twice_is_an_invalid_transition() {
        let mut card = card_due(25);
        reveal(&mut card).unwrap();
        let err = reveal(&mut card).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidTransition { .. }));
        assert_eq!(card.reveal_state, RevealState::Shown);
    }

    #[test]
    fn remembered_moves_due_date_strictly_past_today_and_previous() {
        let mut card = card_due(25);
        reveal(&mut card).unwrap();
        mark_remembered(&mut card, day(25), &DoublingInterval::default()).unwrap();

        assert!(card.due_date > day(25));
        assert_eq!(card.due_date, day(26));
        assert_eq!(card.interval_days, 1);
        assert_eq!(card.reveal_state, RevealState::Hidden);
    }

    #[test]
    fn remembered_ahead_of_schedule_still_advances_past_previous_due() {
        let mut card = card_due(30);
        reveal(&mut card).unwrap();
        // Reviewed five days early; today + 1 would regress behind the
        // stored due date.
        mark_remembered(&mut card, day(25), &DoublingInterval::default()).unwrap();
        assert!(card.due_date > day(30));
    }

    #[test]
    fn forgot_resets_to_today_and_zero_interval() {
        let mut card = card_due(20);
        card.interval_days = 8;
        reveal(&mut card).unwrap();
        mark_forgot(&mut card, day(25)).unwrap();

        assert_eq!(card.due_date, day(25));
        assert_eq!(card.interval_days, 0);
        assert_eq!(card.reveal_state, RevealState::Hidden);
    }

    #[test]
    fn outcomes_from_hidden_are_rejected_unchanged() {
        let mut card = card_due(25);
        let before = card.clone();

        assert!(mark_remembered(&mut card, day(25), &DoublingInterval::default()).is_err());
        assert!(mark_forgot(&mut card, day(25)).is_err());
        assert_eq!(card, before);
    }
}
