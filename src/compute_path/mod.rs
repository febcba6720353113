//! Compute Path Selector
//!
//! Routes scheduling transitions to the fastest available implementation of
//! the formula without changing observable results.
//!
//! Lifecycle: `Uninitialized -> Loading -> Ready | Unavailable`, entered at
//! most once per process. Initialization builds the parallel batch engine;
//! if it fails, the selector downgrades to the reference path, emits a
//! diagnostic, and scheduling calls keep working. Concurrent first calls
//! block on the same transition and observe one consistent final state.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scheduler::{self, ReviewOutcome};
use crate::types::{
    SchedulingState, EASINESS_PENALTY, MAX_EASINESS_FACTOR, MIN_EASINESS_FACTOR, MS_PER_DAY,
};

// ==================== State Machine ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathState {
    Uninitialized,
    Loading,
    Ready,
    Unavailable,
}

struct PathInner {
    state: PathState,
    engine: Option<Arc<TurboEngine>>,
}

pub struct ComputePathSelector {
    inner: RwLock<PathInner>,
}

impl ComputePathSelector {
    fn new() -> Self {
        Self {
            inner: RwLock::new(PathInner {
                state: PathState::Uninitialized,
                engine: None,
            }),
        }
    }

    /// Current lifecycle state, for diagnostics.
    pub fn state(&self) -> PathState {
        self.inner.read().state
    }

    /// One transition, routed to the accelerated kernel when available.
    pub fn advance(
        &self,
        state: &SchedulingState,
        outcome: ReviewOutcome,
        reviewed_at_ms: i64,
    ) -> SchedulingState {
        match self.engine() {
            Some(engine) => engine.advance(state, outcome, reviewed_at_ms),
            None => scheduler::advance_reference(state, outcome, reviewed_at_ms),
        }
    }

    /// Batch transitions. Evaluated in parallel on the accelerated path,
    /// sequentially on the reference path; results are identical either
    /// way and keep input order.
    pub fn advance_batch(&self, items: &[BatchReviewItem]) -> Vec<SchedulingState> {
        match self.engine() {
            Some(engine) => engine.advance_batch(items),
            None => items
                .iter()
                .map(|item| {
                    scheduler::advance_reference(&item.state, item.outcome, item.reviewed_at_ms)
                })
                .collect(),
        }
    }

    fn engine(&self) -> Option<Arc<TurboEngine>> {
        {
            let inner = self.inner.read();
            match inner.state {
                PathState::Ready => return inner.engine.clone(),
                PathState::Unavailable => return None,
                PathState::Uninitialized | PathState::Loading => {}
            }
        }

        // The write lock is held across the build so concurrent first calls
        // collapse into one initialization attempt.
        let mut inner = self.inner.write();
        match inner.state {
            PathState::Ready => return inner.engine.clone(),
            PathState::Unavailable => return None,
            PathState::Uninitialized | PathState::Loading => {}
        }

        inner.state = PathState::Loading;
        match TurboEngine::build() {
            Ok(engine) => {
                let engine = Arc::new(engine);
                inner.engine = Some(engine.clone());
                inner.state = PathState::Ready;
                tracing::debug!("accelerated scheduling path ready");
                Some(engine)
            }
            Err(err) => {
                inner.state = PathState::Unavailable;
                tracing::warn!(
                    error = %err,
                    "accelerated scheduling path unavailable, falling back to reference path"
                );
                None
            }
        }
    }
}

static SELECTOR: OnceLock<Arc<ComputePathSelector>> = OnceLock::new();

/// Process-wide selector instance.
pub fn selector() -> Arc<ComputePathSelector> {
    SELECTOR
        .get_or_init(|| Arc::new(ComputePathSelector::new()))
        .clone()
}

// ==================== Batch Input ====================

/// One card's pending transition in a batch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReviewItem {
    pub state: SchedulingState,
    pub outcome: ReviewOutcome,
    pub reviewed_at_ms: i64,
}

// ==================== Accelerated Engine ====================

/// Accelerated kernel: the easiness gain of a correct answer is folded into
/// a constant at build time, and batches run data-parallel on a dedicated
/// thread pool. Must agree exactly with `scheduler::advance_reference`.
struct TurboEngine {
    pool: rayon::ThreadPool,
    correct_gain: f64,
}

impl TurboEngine {
    fn build() -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|index| format!("mento-algo-{index}"))
            .build()?;
        Ok(Self {
            pool,
            correct_gain: scheduler::correct_easiness_gain(),
        })
    }

    fn advance(
        &self,
        state: &SchedulingState,
        outcome: ReviewOutcome,
        reviewed_at_ms: i64,
    ) -> SchedulingState {
        if !outcome.was_correct {
            let easiness = (state.easiness_factor - EASINESS_PENALTY).max(MIN_EASINESS_FACTOR);
            return SchedulingState {
                easiness_factor: easiness,
                consecutive_correct: 0,
                interval_days: 1,
                next_review_at: reviewed_at_ms + MS_PER_DAY,
            };
        }

        let streak = state.consecutive_correct + 1;
        let easiness =
            (state.easiness_factor + self.correct_gain).clamp(MIN_EASINESS_FACTOR, MAX_EASINESS_FACTOR);
        let interval_days = match streak {
            1 => 1,
            2 => 6,
            _ => (state.interval_days as f64 * easiness).round() as u32,
        };

        SchedulingState {
            easiness_factor: easiness,
            consecutive_correct: streak,
            interval_days,
            next_review_at: reviewed_at_ms + interval_days as i64 * MS_PER_DAY,
        }
    }

    fn advance_batch(&self, items: &[BatchReviewItem]) -> Vec<SchedulingState> {
        self.pool.install(|| {
            items
                .par_iter()
                .map(|item| self.advance(&item.state, item.outcome, item.reviewed_at_ms))
                .collect()
        })
    }
}

// ==================== Tests ====================
