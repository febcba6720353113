//! Mastery Aggregation
//!
//! Turns review events into per-day activity buckets, retention rates, and
//! categorical mastery levels.
//!
//! Timezone policy: a record is bucketed by the UTC calendar date of its
//! own timestamp. The policy is fixed so heatmaps stay consistent across
//! daylight-saving boundaries; no server-local conversion is ever applied.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, MasteryLevel, ReviewRecord, MS_PER_DAY};

// ==================== Constants ====================

/// Record counts at or above this size aggregate in parallel
const PARALLEL_THRESHOLD: usize = 4096;

/// Default retention-rate band boundaries
const DEFAULT_LOW_THRESHOLD: f64 = 30.0;
const DEFAULT_MEDIUM_THRESHOLD: f64 = 60.0;
const DEFAULT_HIGH_THRESHOLD: f64 = 80.0;

// ==================== Types ====================

/// Per-calendar-day review aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapBucket {
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    pub count: u32,
    pub correct_count: u32,
    /// Rounded percentage, 0..=100
    pub accuracy: u8,
}

/// Retention-rate band boundaries. Three thresholds map to four levels;
/// see [`classify`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for MasteryThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl MasteryThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range =
            |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.low)
            || !in_range(self.medium)
            || !in_range(self.high)
            || self.low >= self.medium
            || self.medium >= self.high
        {
            return Err(ConfigError::InvalidThresholds {
                low: self.low,
                medium: self.medium,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Consecutive-study-day streaks derived from heatmap buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStreaks {
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct DayCount {
    count: u32,
    correct: u32,
}

// ==================== Aggregation ====================

/// Aggregate review records into per-day heatmap buckets.
///
/// Only records with a timestamp inside `[now - window_days, now]`
/// participate; `window_days` must be positive. It is a parameter rather
/// than a constant because callers differ on the default (90 and 365 are
/// both in use). Days with no activity are omitted; see
/// [`aggregate_dense`] for the zero-filled variant. Records whose timestamp cannot be represented as a datetime
/// are skipped with a diagnostic. Buckets come back sorted by date.
pub fn aggregate(
    records: &[ReviewRecord],
    window_days: i64,
    now_ms: i64,
) -> Result<Vec<HeatmapBucket>, ConfigError> {
    let counts = count_by_day(records, window_days, now_ms)?;
    Ok(into_buckets(counts))
}

/// Like [`aggregate`], but emits a bucket for every calendar day of the
/// window, including days with zero activity.
pub fn aggregate_dense(
    records: &[ReviewRecord],
    window_days: i64,
    now_ms: i64,
) -> Result<Vec<HeatmapBucket>, ConfigError> {
    let mut counts = count_by_day(records, window_days, now_ms)?;

    let start =
        DateTime::from_timestamp_millis(now_ms.saturating_sub(window_days.saturating_mul(MS_PER_DAY)));
    let end = DateTime::from_timestamp_millis(now_ms);
    let (Some(start), Some(end)) = (start, end) else {
        tracing::warn!(now_ms, window_days, "dense window out of datetime range");
        return Ok(into_buckets(counts));
    };

    let mut day = start.date_naive();
    let last = end.date_naive();
    while day <= last {
        counts.entry(day).or_default();
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }

    Ok(into_buckets(counts))
}

fn count_by_day(
    records: &[ReviewRecord],
    window_days: i64,
    now_ms: i64,
) -> Result<HashMap<NaiveDate, DayCount>, ConfigError> {
    if window_days <= 0 {
        return Err(ConfigError::InvalidWindow(window_days));
    }
    let start_ms = now_ms.saturating_sub(window_days.saturating_mul(MS_PER_DAY));

    // Splitting on the bucketing key keeps the merge order-independent, so
    // large inputs can fold in parallel and reduce partial maps.
    let counts = if records.len() >= PARALLEL_THRESHOLD {
        records
            .par_iter()
            .fold(HashMap::new, |mut acc, record| {
                accumulate(&mut acc, record, start_ms, now_ms);
                acc
            })
            .reduce(HashMap::new, merge_counts)
    } else {
        let mut acc = HashMap::new();
        for record in records {
            accumulate(&mut acc, record, start_ms, now_ms);
        }
        acc
    };

    Ok(counts)
}

fn accumulate(
    acc: &mut HashMap<NaiveDate, DayCount>,
    record: &ReviewRecord,
    start_ms: i64,
    now_ms: i64,
) {
    if record.timestamp < start_ms || record.timestamp > now_ms {
        return;
    }
    let Some(date) = bucket_date(record) else {
        return;
    };
    let entry = acc.entry(date).or_default();
    entry.count += 1;
    if record.was_correct {
        entry.correct += 1;
    }
}

fn bucket_date(record: &ReviewRecord) -> Option<NaiveDate> {
    match DateTime::from_timestamp_millis(record.timestamp) {
        Some(datetime) => Some(datetime.date_naive()),
        None => {
            tracing::warn!(
                card_id = %record.card_id,
                timestamp = record.timestamp,
                "skipping review record with unrepresentable timestamp"
            );
            None
        }
    }
}

fn merge_counts(
    mut left: HashMap<NaiveDate, DayCount>,
    right: HashMap<NaiveDate, DayCount>,
) -> HashMap<NaiveDate, DayCount> {
    for (date, partial) in right {
        let entry = left.entry(date).or_default();
        entry.count += partial.count;
        entry.correct += partial.correct;
    }
    left
}

fn into_buckets(counts: HashMap<NaiveDate, DayCount>) -> Vec<HeatmapBucket> {
    let mut days: Vec<(NaiveDate, DayCount)> = counts.into_iter().collect();
    days.sort_by_key(|(date, _)| *date);
    days.into_iter()
        .map(|(date, day)| HeatmapBucket {
            date: date.format("%Y-%m-%d").to_string(),
            count: day.count,
            correct_count: day.correct,
            accuracy: accuracy_percent(day.count, day.correct),
        })
        .collect()
}

fn accuracy_percent(count: u32, correct: u32) -> u8 {
    if count == 0 {
        return 0;
    }
    ((correct as f64 / count as f64) * 100.0)
        .round()
        .clamp(0.0, 100.0) as u8
}

// ==================== Retention & Classification ====================

/// Percentage of reviews answered correctly; zero for an empty window.
pub fn retention_rate(total: u32, correct: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 / total as f64 * 100.0).round()
}

/// Band a retention-rate score into a mastery level.
///
/// Four bands from three thresholds: `score < low` is Beginner,
/// `low <= score < medium` Intermediate, `medium <= score < high` Advanced,
/// `score >= high` Expert. Thresholds are validated on every call; invalid
/// thresholds are rejected, never clamped.
pub fn classify(
    score: f64,
    thresholds: &MasteryThresholds,
) -> Result<MasteryLevel, ConfigError> {
    thresholds.validate()?;
    let level = if score < thresholds.low {
        MasteryLevel::Beginner
    } else if score < thresholds.medium {
        MasteryLevel::Intermediate
    } else if score < thresholds.high {
        MasteryLevel::Advanced
    } else {
        MasteryLevel::Expert
    };
    Ok(level)
}

/// Scale per-concept mastery scores in `[0, 1]` to display percentages.
/// Display only; no banding is applied here.
pub fn concept_mastery_percent(scores: &HashMap<String, f64>) -> BTreeMap<String, f64> {
    scores
        .iter()
        .map(|(concept, score)| (concept.clone(), score.clamp(0.0, 1.0) * 100.0))
        .collect()
}

// ==================== Streaks ====================

/// Current and longest consecutive-study-day streaks over heatmap buckets.
/// The current streak counts runs ending today or yesterday relative to
/// `now_ms`, matching the UTC bucketing policy above.
pub fn study_streaks(buckets: &[HeatmapBucket], now_ms: i64) -> StudyStreaks {
    let mut dates: Vec<NaiveDate> = buckets
        .iter()
        .filter(|bucket| bucket.count > 0)
        .filter_map(|bucket| NaiveDate::parse_from_str(&bucket.date, "%Y-%m-%d").ok())
        .collect();
    dates.sort();
    dates.dedup();

    if dates.is_empty() {
        return StudyStreaks {
            current_streak: 0,
            longest_streak: 0,
        };
    }

    let mut longest = 1u32;
    let mut run = 1u32;
    for pair in dates.windows(2) {
        if pair[0].succ_opt() == Some(pair[1]) {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }

    let current = match DateTime::from_timestamp_millis(now_ms) {
        Some(now) => {
            let today = now.date_naive();
            let last = dates[dates.len() - 1];
            let ends_recently = last == today || last.succ_opt() == Some(today);
            if ends_recently {
                run
            } else {
                0
            }
        }
        None => 0,
    };

    StudyStreaks {
        current_streak: current,
        longest_streak: longest,
    }
}

// ==================== Tests ====================
