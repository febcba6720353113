//! Common Types and Constants
//!
//! Shared data structures used across the scheduling and analytics modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Lower bound for the easiness factor
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Upper bound for the easiness factor
pub const MAX_EASINESS_FACTOR: f64 = 3.0;

/// Easiness factor assigned to cards that have never been reviewed
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

/// Easiness penalty applied on an incorrect answer
pub const EASINESS_PENALTY: f64 = 0.2;

/// Interval assigned to unscheduled (never reviewed) cards, in days
pub const INITIAL_INTERVAL_DAYS: u32 = 3;

/// Inactivity gap that closes a study session (30 minutes)
pub const DEFAULT_SESSION_GAP_MS: i64 = 30 * 60 * 1000;

/// Milliseconds per calendar day
pub const MS_PER_DAY: i64 = 86_400_000;

/// Milliseconds per minute
pub const MS_PER_MINUTE: i64 = 60_000;

// ==================== Review Records ====================

/// A single captured review event. Produced by the review capture layer,
/// consumed here only; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub card_id: String,
    /// Event time as epoch milliseconds (UTC)
    pub timestamp: i64,
    pub was_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i64>,
}

// ==================== Scheduling State ====================

/// Per-card scheduling state. Owned by the external store; the scheduler
/// returns a new value for the caller to persist.
///
/// Invariants: `easiness_factor` stays within
/// [`MIN_EASINESS_FACTOR`, `MAX_EASINESS_FACTOR`]; `consecutive_correct`
/// resets to zero on any incorrect outcome; `next_review_at` is always at
/// least one day after the review that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    pub easiness_factor: f64,
    pub consecutive_correct: u32,
    /// Last scheduled interval. Tracked here so the multiplicative growth
    /// stage does not need the card's review history.
    pub interval_days: u32,
    /// Next due time as epoch milliseconds (UTC)
    pub next_review_at: i64,
}

impl SchedulingState {
    /// State for a card that has never been reviewed: default easiness,
    /// empty streak, first review [`INITIAL_INTERVAL_DAYS`] out.
    pub fn initial(now_ms: i64) -> Self {
        Self {
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            consecutive_correct: 0,
            interval_days: INITIAL_INTERVAL_DAYS,
            next_review_at: now_ms + INITIAL_INTERVAL_DAYS as i64 * MS_PER_DAY,
        }
    }
}

// ==================== Mastery Levels ====================

/// Categorical banding of a retention-rate score.
///
/// The three configurable thresholds map to four bands (not three): scores
/// below `low` are `Beginner`, then `Intermediate`, `Advanced`, and
/// `Expert` at or above `high`. Consumers must not re-derive a different
/// mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl MasteryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

// ==================== Errors ====================

/// Invalid configuration is a hard failure at the boundary; it is never
/// silently clamped.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("session gap must be positive, got {0} ms")]
    InvalidSessionGap(i64),
    #[error("aggregation window must be positive, got {0} days")]
    InvalidWindow(i64),
    #[error(
        "mastery thresholds must be within 0..=100 and strictly increasing: low={low}, medium={medium}, high={high}"
    )]
    InvalidThresholds { low: f64, medium: f64, high: f64 },
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_defaults() {
        let now = 1_700_000_000_000;
        let state = SchedulingState::initial(now);
        assert_eq!(state.easiness_factor, DEFAULT_EASINESS_FACTOR);
        assert_eq!(state.consecutive_correct, 0);
        assert_eq!(state.interval_days, INITIAL_INTERVAL_DAYS);
        assert_eq!(state.next_review_at, now + 3 * MS_PER_DAY);
    }

    #[test]
    fn test_mastery_level_ordering() {
        assert!(MasteryLevel::Beginner < MasteryLevel::Intermediate);
        assert!(MasteryLevel::Intermediate < MasteryLevel::Advanced);
        assert!(MasteryLevel::Advanced < MasteryLevel::Expert);
    }

    #[test]
    fn test_review_record_wire_shape() {
        let record = ReviewRecord {
            card_id: "card-1".to_string(),
            timestamp: 1_700_000_000_000,
            was_correct: true,
            response_time_ms: Some(1200),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["cardId"], "card-1");
        assert_eq!(json["wasCorrect"], true);
        assert_eq!(json["responseTimeMs"], 1200);
    }

    #[test]
    fn test_scheduling_state_wire_shape() {
        let state = SchedulingState::initial(0);
        let json = serde_json::to_value(state).unwrap();
        assert!(json.get("easinessFactor").is_some());
        assert!(json.get("consecutiveCorrect").is_some());
        assert!(json.get("intervalDays").is_some());
        assert!(json.get("nextReviewAt").is_some());
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::InvalidSessionGap(0);
        assert!(err.to_string().contains("session gap"));
        let err = ConfigError::InvalidThresholds {
            low: 60.0,
            medium: 30.0,
            high: 80.0,
        };
        assert!(err.to_string().contains("strictly increasing"));
    }
}
