//! # mento-algo - Spaced-Repetition Review Core
//!
//! Pure Rust implementation of the Mento learning platform's review
//! scheduling and analytics core:
//!
//! - **Review Outcome Scheduler** - per-card state transition (SM-2 style
//!   easiness factor, streak-staged intervals)
//! - **Compute Path Selector** - routes the scheduling formula to an
//!   accelerated parallel engine with a guaranteed-equivalent reference
//!   fallback
//! - **Session Segmenter** - inactivity-gap grouping of review events into
//!   study sessions plus duration statistics
//! - **Mastery Aggregator** - per-day heatmap buckets, retention rates,
//!   mastery banding, and study streaks
//!
//! ## Design
//!
//! - **No I/O** - the core consumes review records and configuration and
//!   returns values; persistence and transport stay with the caller
//! - **Side-effect free** - every operation is safely callable
//!   concurrently; the only shared state is the compute path's one-time
//!   initialization
//! - **Graceful degradation** - only invalid configuration is a hard
//!   failure; malformed records and acceleration failures degrade with a
//!   diagnostic
//!
//! ## Module structure
//!
//! - [`types`] - shared data model and constants
//! - [`scheduler`] - review outcome transition
//! - [`compute_path`] - accelerated/reference path selection
//! - [`session`] - session segmentation and stats
//! - [`mastery`] - heatmap, retention, and mastery aggregation

// ============================================================================
// Module declarations
// ============================================================================

pub mod compute_path;
pub mod mastery;
pub mod scheduler;
pub mod session;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

/// Re-export the shared data model
pub use types::*;

/// Re-export the scheduling transition
pub use scheduler::{advance_reference, next_state, ReviewOutcome};

/// Re-export the compute path selector
pub use compute_path::{selector, BatchReviewItem, ComputePathSelector, PathState};

/// Re-export session segmentation
pub use session::{segment, session_stats, SessionStats, StudySession};

/// Re-export mastery aggregation
pub use mastery::{
    aggregate, aggregate_dense, classify, concept_mastery_percent, retention_rate, study_streaks,
    HeatmapBucket, MasteryThresholds, StudyStreaks,
};
