//! Property-Based Tests for Session and Mastery Analytics
//!
//! Tests the following invariants:
//! - Segmentation partitions records: review counts sum to the input size
//! - Neighboring events inside a session are within the gap; neighboring
//!   sessions are separated by more than the gap
//! - Heatmap aggregation is idempotent and its counts sum to the number of
//!   in-window records
//! - Retention rate is monotonic in the correct count and classification
//!   respects band ordering

use proptest::prelude::*;

use mento_algo::mastery::{aggregate, classify, retention_rate, MasteryThresholds};
use mento_algo::session::segment;
use mento_algo::types::{ReviewRecord, MS_PER_DAY};

const NOW: i64 = 1_700_000_000_000;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_record() -> impl Strategy<Value = ReviewRecord> {
    (0i64..90 * MS_PER_DAY, any::<bool>()).prop_map(|(offset, was_correct)| ReviewRecord {
        card_id: "card-1".to_string(),
        timestamp: NOW - offset,
        was_correct,
        response_time_ms: None,
    })
}

fn arb_records() -> impl Strategy<Value = Vec<ReviewRecord>> {
    prop::collection::vec(arb_record(), 0..300)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn segmentation_partitions_all_records(
        records in arb_records(),
        gap_ms in 1i64..3 * MS_PER_DAY
    ) {
        let sessions = segment(&records, gap_ms).unwrap();
        let total: u64 = sessions.iter().map(|s| s.review_count as u64).sum();
        prop_assert_eq!(total as usize, records.len());

        let correct: u64 = sessions.iter().map(|s| s.correct_count as u64).sum();
        let expected = records.iter().filter(|r| r.was_correct).count();
        prop_assert_eq!(correct as usize, expected);
    }

    #[test]
    fn sessions_respect_the_gap_rule(
        records in arb_records(),
        gap_ms in 1i64..3 * MS_PER_DAY
    ) {
        let sessions = segment(&records, gap_ms).unwrap();
        for session in &sessions {
            prop_assert!(session.start <= session.end);
        }
        for pair in sessions.windows(2) {
            prop_assert!(pair[1].start - pair[0].end > gap_ms);
        }
    }

    #[test]
    fn heatmap_counts_sum_to_in_window_records(records in arb_records()) {
        let buckets = aggregate(&records, 90, NOW).unwrap();
        let total: u64 = buckets.iter().map(|b| b.count as u64).sum();
        let in_window = records
            .iter()
            .filter(|r| r.timestamp >= NOW - 90 * MS_PER_DAY && r.timestamp <= NOW)
            .count();
        prop_assert_eq!(total as usize, in_window);
    }

    #[test]
    fn heatmap_aggregation_is_idempotent(records in arb_records()) {
        let first = aggregate(&records, 90, NOW).unwrap();
        let second = aggregate(&records, 90, NOW).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn retention_rate_is_monotonic_in_correct_count(total in 1u32..1000) {
        let mut last = -1.0f64;
        for correct in [0, total / 4, total / 2, total] {
            let rate = retention_rate(total, correct);
            prop_assert!(rate >= last);
            prop_assert!((0.0..=100.0).contains(&rate));
            last = rate;
        }
    }

    #[test]
    fn classification_respects_band_ordering(
        lower in 0u32..=100,
        higher in 0u32..=100
    ) {
        let thresholds = MasteryThresholds::default();
        let (lower, higher) = (lower.min(higher) as f64, lower.max(higher) as f64);
        let low_level = classify(lower, &thresholds).unwrap();
        let high_level = classify(higher, &thresholds).unwrap();
        prop_assert!(low_level <= high_level);
    }
}
