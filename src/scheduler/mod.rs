//! Review Outcome Scheduler
//!
//! Pure state transition for the spaced-repetition queue: given a card's
//! current scheduling state and one review outcome, compute the next state.
//!
//! Formulas:
//! - Incorrect: `EF' = max(1.3, EF - 0.2)`, streak resets, next review in
//!   exactly one day.
//! - Correct: `EF' = EF + (0.1 - (5 - q)(0.08 + (5 - q) * 0.02))` with the
//!   assumed quality `q = 5`, clamped to [1.3, 3.0].
//! - Interval: 1 day at streak 1, 6 days at streak 2, then
//!   `round(previousInterval * EF')`.
//!
//! Every correct answer is treated as quality 5 regardless of response
//! time. [`review_quality`] is the single seam where a response-time-aware
//! mapping would plug in; until then the flat mapping is kept for
//! compatibility with the scheduling history already in the store.

use serde::{Deserialize, Serialize};

use crate::compute_path;
use crate::types::{
    SchedulingState, EASINESS_PENALTY, MAX_EASINESS_FACTOR, MIN_EASINESS_FACTOR, MS_PER_DAY,
};

// ==================== Constants ====================

/// Response quality assumed for every correct answer
const ASSUMED_QUALITY: f64 = 5.0;

/// Interval after the first correct answer of a streak, in days
const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval after the second consecutive correct answer, in days
const SECOND_INTERVAL_DAYS: u32 = 6;

// ==================== Outcome ====================

/// One graded review of a card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub was_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i64>,
}

impl ReviewOutcome {
    pub fn correct() -> Self {
        Self {
            was_correct: true,
            response_time_ms: None,
        }
    }

    pub fn incorrect() -> Self {
        Self {
            was_correct: false,
            response_time_ms: None,
        }
    }
}

impl From<&crate::types::ReviewRecord> for ReviewOutcome {
    fn from(record: &crate::types::ReviewRecord) -> Self {
        Self {
            was_correct: record.was_correct,
            response_time_ms: record.response_time_ms,
        }
    }
}

// ==================== Transition ====================

/// Compute the next scheduling state for one review.
///
/// Routed through the compute-path selector: the accelerated kernel when it
/// is available, the reference kernel otherwise. The two are mathematically
/// equivalent, so callers observe no difference. Total over its input
/// domain; the caller persists the result.
pub fn next_state(
    state: &SchedulingState,
    outcome: ReviewOutcome,
    reviewed_at_ms: i64,
) -> SchedulingState {
    compute_path::selector().advance(state, outcome, reviewed_at_ms)
}

/// Reference implementation of the transition. The accelerated path must
/// agree with this function exactly.
pub fn advance_reference(
    state: &SchedulingState,
    outcome: ReviewOutcome,
    reviewed_at_ms: i64,
) -> SchedulingState {
    if !outcome.was_correct {
        let easiness = (state.easiness_factor - EASINESS_PENALTY).max(MIN_EASINESS_FACTOR);
        return SchedulingState {
            easiness_factor: easiness,
            consecutive_correct: 0,
            interval_days: FIRST_INTERVAL_DAYS,
            next_review_at: reviewed_at_ms + MS_PER_DAY,
        };
    }

    let streak = state.consecutive_correct + 1;
    let quality = review_quality(outcome);
    let adjusted =
        state.easiness_factor + (0.1 - (5.0 - quality) * (0.08 + (5.0 - quality) * 0.02));
    let easiness = adjusted.max(MIN_EASINESS_FACTOR).min(MAX_EASINESS_FACTOR);

    let interval_days = match streak {
        1 => FIRST_INTERVAL_DAYS,
        2 => SECOND_INTERVAL_DAYS,
        _ => (state.interval_days as f64 * easiness).round() as u32,
    };

    SchedulingState {
        easiness_factor: easiness,
        consecutive_correct: streak,
        interval_days,
        next_review_at: reviewed_at_ms + interval_days as i64 * MS_PER_DAY,
    }
}

/// Quality of a correct answer. Always [`ASSUMED_QUALITY`]: response time
/// is accepted but deliberately unused.
fn review_quality(outcome: ReviewOutcome) -> f64 {
    let _ = outcome.response_time_ms;
    ASSUMED_QUALITY
}

/// Easiness-factor gain of one correct answer under the assumed quality.
pub(crate) fn correct_easiness_gain() -> f64 {
    0.1 - (5.0 - ASSUMED_QUALITY) * (0.08 + (5.0 - ASSUMED_QUALITY) * 0.02)
}

// ==================== Tests ====================
