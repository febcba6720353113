//! Study Session Segmentation
//!
//! Groups a stream of review events into study sessions with an
//! inactivity-gap rule, then derives duration statistics over the result.
//!
//! Records are sorted internally by timestamp before segmentation, so
//! callers do not need to pre-sort. A gap strictly greater than `gap_ms`
//! between neighboring events closes the current session.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike};
use serde::Serialize;

use crate::types::{ConfigError, ReviewRecord, MS_PER_MINUTE};

// ==================== Types ====================

/// A contiguous run of review activity. Derived on demand, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    /// First review of the session, epoch milliseconds
    pub start: i64,
    /// Last review of the session, epoch milliseconds
    pub end: i64,
    pub review_count: u32,
    pub correct_count: u32,
}

impl StudySession {
    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    pub fn accuracy(&self) -> f64 {
        if self.review_count == 0 {
            return 0.0;
        }
        self.correct_count as f64 / self.review_count as f64
    }
}

/// Duration statistics over a set of sessions.
///
/// `study_efficiency` is correct reviews per minute of total session time,
/// zero when no session time was accumulated. Study time is bucketed by the
/// UTC calendar date (daily) and ISO week (weekly) of the session start.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub session_count: usize,
    pub total_study_time_ms: i64,
    pub average_session_length_ms: f64,
    pub longest_session_ms: i64,
    pub shortest_session_ms: i64,
    pub daily_study_time: BTreeMap<String, i64>,
    pub weekly_study_time: BTreeMap<String, i64>,
    pub study_efficiency: f64,
}

impl SessionStats {
    fn empty() -> Self {
        Self {
            session_count: 0,
            total_study_time_ms: 0,
            average_session_length_ms: 0.0,
            longest_session_ms: 0,
            shortest_session_ms: 0,
            daily_study_time: BTreeMap::new(),
            weekly_study_time: BTreeMap::new(),
            study_efficiency: 0.0,
        }
    }
}

// ==================== Segmentation ====================

/// Split review records into study sessions.
///
/// `gap_ms` must be positive; the 30-minute default lives in
/// [`crate::types::DEFAULT_SESSION_GAP_MS`]. Empty input yields an empty
/// list; a single record yields one zero-duration session.
pub fn segment(records: &[ReviewRecord], gap_ms: i64) -> Result<Vec<StudySession>, ConfigError> {
    if gap_ms <= 0 {
        return Err(ConfigError::InvalidSessionGap(gap_ms));
    }
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut ordered: Vec<&ReviewRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.timestamp);

    let mut sessions = Vec::new();
    let first = ordered[0];
    let mut current = StudySession {
        start: first.timestamp,
        end: first.timestamp,
        review_count: 1,
        correct_count: u32::from(first.was_correct),
    };

    for record in &ordered[1..] {
        if record.timestamp - current.end > gap_ms {
            sessions.push(current);
            current = StudySession {
                start: record.timestamp,
                end: record.timestamp,
                review_count: 1,
                correct_count: u32::from(record.was_correct),
            };
        } else {
            current.end = record.timestamp;
            current.review_count += 1;
            current.correct_count += u32::from(record.was_correct);
        }
    }
    sessions.push(current);

    Ok(sessions)
}

/// Derive duration statistics over segmented sessions.
pub fn session_stats(sessions: &[StudySession]) -> SessionStats {
    if sessions.is_empty() {
        return SessionStats::empty();
    }

    let mut total_ms = 0i64;
    let mut longest = i64::MIN;
    let mut shortest = i64::MAX;
    let mut correct_total = 0u64;
    let mut daily: BTreeMap<String, i64> = BTreeMap::new();
    let mut weekly: BTreeMap<String, i64> = BTreeMap::new();

    for session in sessions {
        let duration = session.duration_ms();
        total_ms += duration;
        longest = longest.max(duration);
        shortest = shortest.min(duration);
        correct_total += session.correct_count as u64;

        if let Some(start) = DateTime::from_timestamp_millis(session.start) {
            let date = start.date_naive();
            *daily.entry(date.format("%Y-%m-%d").to_string()).or_default() += duration;
            let week = date.iso_week();
            *weekly
                .entry(format!("{}-W{:02}", week.year(), week.week()))
                .or_default() += duration;
        } else {
            tracing::warn!(
                start = session.start,
                "skipping session with unrepresentable start time in study-time buckets"
            );
        }
    }

    let minutes = total_ms as f64 / MS_PER_MINUTE as f64;
    let study_efficiency = if total_ms > 0 {
        correct_total as f64 / minutes
    } else {
        0.0
    };

    SessionStats {
        session_count: sessions.len(),
        total_study_time_ms: total_ms,
        average_session_length_ms: total_ms as f64 / sessions.len() as f64,
        longest_session_ms: longest,
        shortest_session_ms: shortest,
        daily_study_time: daily,
        weekly_study_time: weekly,
        study_efficiency,
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_SESSION_GAP_MS;
    use chrono::{TimeZone, Utc};

    fn record(timestamp: i64, was_correct: bool) -> ReviewRecord {
        ReviewRecord {
            card_id: "card-1".to_string(),
            timestamp,
            was_correct,
            response_time_ms: None,
        }
    }

    fn at(hour: u32, minute: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 3, 5, hour, minute, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_thirty_minute_gap_splits_two_sessions() {
        let records = vec![
            record(at(9, 0), true),
            record(at(9, 10), true),
            record(at(10, 5), false),
        ];
        let sessions = segment(&records, DEFAULT_SESSION_GAP_MS).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].start, at(9, 0));
        assert_eq!(sessions[0].end, at(9, 10));
        assert_eq!(sessions[0].review_count, 2);
        assert_eq!(sessions[1].start, at(10, 5));
        assert_eq!(sessions[1].end, at(10, 5));
        assert_eq!(sessions[1].duration_ms(), 0);
    }

    #[test]
    fn test_sixty_minute_gap_keeps_one_session() {
        let records = vec![
            record(at(9, 0), true),
            record(at(9, 10), true),
            record(at(10, 5), false),
        ];
        let sessions = segment(&records, 60 * MS_PER_MINUTE).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start, at(9, 0));
        assert_eq!(sessions[0].end, at(10, 5));
        assert_eq!(sessions[0].review_count, 3);
        assert_eq!(sessions[0].correct_count, 2);
    }

    #[test]
    fn test_gap_exactly_at_threshold_does_not_split() {
        let records = vec![record(at(9, 0), true), record(at(9, 30), true)];
        let sessions = segment(&records, 30 * MS_PER_MINUTE).unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_unsorted_input_is_sorted_internally() {
        let records = vec![
            record(at(10, 5), true),
            record(at(9, 0), true),
            record(at(9, 10), false),
        ];
        let sessions = segment(&records, DEFAULT_SESSION_GAP_MS).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].start, at(9, 0));
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let sessions = segment(&[], DEFAULT_SESSION_GAP_MS).unwrap();
        assert!(sessions.is_empty());
        let stats = session_stats(&sessions);
        assert_eq!(stats.session_count, 0);
        assert_eq!(stats.total_study_time_ms, 0);
        assert_eq!(stats.average_session_length_ms, 0.0);
        assert_eq!(stats.study_efficiency, 0.0);
    }

    #[test]
    fn test_single_record_yields_zero_duration_session() {
        let sessions = segment(&[record(at(9, 0), true)], DEFAULT_SESSION_GAP_MS).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_ms(), 0);
    }

    #[test]
    fn test_invalid_gap_is_rejected() {
        assert!(matches!(
            segment(&[record(at(9, 0), true)], 0),
            Err(ConfigError::InvalidSessionGap(0))
        ));
        assert!(segment(&[], -5).is_err());
    }

    #[test]
    fn test_stats_over_two_sessions() {
        let records = vec![
            record(at(9, 0), true),
            record(at(9, 10), true),
            record(at(10, 5), true),
            record(at(10, 15), false),
        ];
        let sessions = segment(&records, DEFAULT_SESSION_GAP_MS).unwrap();
        let stats = session_stats(&sessions);

        assert_eq!(stats.session_count, 2);
        assert_eq!(stats.total_study_time_ms, 20 * MS_PER_MINUTE);
        assert_eq!(stats.average_session_length_ms, 10.0 * MS_PER_MINUTE as f64);
        assert_eq!(stats.longest_session_ms, 10 * MS_PER_MINUTE);
        assert_eq!(stats.shortest_session_ms, 10 * MS_PER_MINUTE);
        // 3 correct reviews over 20 minutes of session time
        assert!((stats.study_efficiency - 0.15).abs() < 1e-12);
        assert_eq!(stats.daily_study_time.get("2024-03-05"), Some(&(20 * MS_PER_MINUTE)));
        assert_eq!(stats.weekly_study_time.get("2024-W10"), Some(&(20 * MS_PER_MINUTE)));
    }

    #[test]
    fn test_session_accuracy() {
        let session = StudySession {
            start: 0,
            end: 0,
            review_count: 4,
            correct_count: 3,
        };
        assert_eq!(session.accuracy(), 0.75);
    }
}
