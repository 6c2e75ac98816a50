//! Result aggregation and statistics.
//!
//! This module tallies classification records in a single pass and derives
//! the summary percentages from the resulting counts.

use crate::error::StatsError;
use crate::models::{ClassificationRecord, ReportCounts, ResultSet, StatisticsReport};
use serde_json::Value;
use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use tracing::debug;

/// `100 * numerator / denominator`, or `0.0` when the denominator is zero.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64) * 100.0
}

/// Running counts over a set of records.
///
/// Tallies over disjoint record shards combine by addition, and
/// `Tally::default()` is the identity. Percentages are only derived in
/// [`Tally::finish`], after every shard has been merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    counts: ReportCounts,
}

impl Tally {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one record.
    pub fn observe(&mut self, record: &ClassificationRecord) {
        let c = &mut self.counts;
        c.total_items += 1;

        if record.is_target_category {
            c.items_in_category += 1;
        } else {
            c.items_not_in_category += 1;
        }

        if record.label_match {
            c.match_count += 1;
        }

        if record.is_target_category && record.predicted_target_category {
            c.correct_category_count += 1;
        }

        if !record.is_target_category && !record.predicted_target_category {
            c.correct_noncategory_count += 1;
        }

        if record.category_and_label_correct() {
            c.correct_category_and_label_count += 1;
        }
    }

    /// Adds another tally's counts into this one.
    pub fn merge(&mut self, other: Tally) {
        let (a, b) = (&mut self.counts, other.counts);
        a.total_items += b.total_items;
        a.items_in_category += b.items_in_category;
        a.items_not_in_category += b.items_not_in_category;
        a.match_count += b.match_count;
        a.correct_category_count += b.correct_category_count;
        a.correct_noncategory_count += b.correct_noncategory_count;
        a.correct_category_and_label_count += b.correct_category_and_label_count;
    }

    /// Number of records observed so far.
    pub fn total_items(&self) -> usize {
        self.counts.total_items
    }

    /// Derives percentages and freezes the counts into a report.
    pub fn finish(self) -> StatisticsReport {
        StatisticsReport::from_counts(self.counts)
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Tally) {
        self.merge(rhs);
    }
}

impl Add for Tally {
    type Output = Tally;

    fn add(mut self, rhs: Tally) -> Tally {
        self.merge(rhs);
        self
    }
}

impl Sum for Tally {
    fn sum<I: Iterator<Item = Tally>>(iter: I) -> Tally {
        iter.fold(Tally::default(), Add::add)
    }
}

impl<'a> FromIterator<&'a ClassificationRecord> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a ClassificationRecord>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for record in iter {
            tally.observe(record);
        }
        tally
    }
}

/// Compute summary statistics over a result set in a single pass.
///
/// An empty result set yields an all-zero report.
pub fn compute_statistics(results: &ResultSet) -> StatisticsReport {
    let tally: Tally = results.values().collect();
    debug!("Tallied {} classification records", tally.total_items());
    tally.finish()
}

/// Validate positional entries and compute statistics over them.
///
/// Fails on the first malformed entry (in key order); no record is skipped.
pub fn compute_statistics_positional(
    results: &BTreeMap<String, Vec<Value>>,
) -> Result<StatisticsReport, StatsError> {
    let mut tally = Tally::default();
    for (key, fields) in results {
        let record = ClassificationRecord::from_positional(key, fields)?;
        tally.observe(&record);
    }
    Ok(tally.finish())
}

/// Compute statistics by tallying `shards` chunks on worker threads.
///
/// Produces the same report as [`compute_statistics`]. Zero shards is
/// treated as one.
pub fn compute_statistics_sharded(results: &ResultSet, shards: usize) -> StatisticsReport {
    let shards = shards.max(1);
    if shards == 1 || results.len() < 2 {
        return compute_statistics(results);
    }

    let records: Vec<&ClassificationRecord> = results.values().collect();
    let chunk_size = records.len().div_ceil(shards);
    debug!(
        "Tallying {} records across {} shards of up to {}",
        records.len(),
        shards,
        chunk_size
    );

    let tally: Tally = std::thread::scope(|scope| {
        let handles: Vec<_> = records
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().copied().collect::<Tally>()))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(tally) => tally,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .sum()
    });

    tally.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(
        label: &str,
        predicted: &str,
        matched: bool,
        dog: bool,
        predicted_dog: bool,
    ) -> ClassificationRecord {
        ClassificationRecord::new(label, predicted, matched, dog, predicted_dog)
    }

    fn positional(fields: Value) -> Vec<Value> {
        fields.as_array().cloned().unwrap_or_default()
    }

    fn sample_results() -> ResultSet {
        let mut results = ResultSet::new();
        results.insert(
            "image_1.jpg".to_string(),
            record("golden retriever", "golden retriever", true, true, true),
        );
        results.insert("image_2.jpg".to_string(), record("pug", "bulldog", false, true, true));
        results.insert("image_3.jpg".to_string(), record("cat", "persian cat", false, false, false));
        results.insert("image_4.jpg".to_string(), record("beagle", "beagle", true, true, true));
        results
    }

    fn mixed_results(n: usize) -> ResultSet {
        (0..n)
            .map(|i| {
                let rec = record(
                    "label",
                    if i % 3 == 0 { "label" } else { "other" },
                    i % 3 == 0,
                    i % 2 == 0,
                    i % 5 != 0,
                );
                (format!("item_{:04}", i), rec)
            })
            .collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_sample_scenario() {
        let report = compute_statistics(&sample_results());

        assert_eq!(report.total_items(), 4);
        assert_eq!(report.items_in_category(), 3);
        assert_eq!(report.items_not_in_category(), 1);
        assert_eq!(report.match_count(), 2);
        assert_eq!(report.correct_category_count(), 3);
        assert_eq!(report.correct_noncategory_count(), 1);
        assert_eq!(report.correct_category_and_label_count(), 2);
        assert_close(report.pct_match(), 50.0);
        assert_close(report.pct_correct_category(), 100.0);
        assert_close(report.pct_correct_category_and_label(), 200.0 / 3.0);
        assert_close(report.pct_correct_noncategory(), 100.0);
    }

    #[test]
    fn test_empty_results() {
        let report = compute_statistics(&ResultSet::new());

        for (name, value) in report.entries() {
            assert_eq!(value.as_f64(), 0.0, "{} should be zero", name);
        }
    }

    #[test]
    fn test_false_positive_counts_only_as_not_in_category() {
        let mut results = ResultSet::new();
        results.insert("x".to_string(), record("cat", "chihuahua", false, false, true));

        let report = compute_statistics(&results);
        assert_eq!(report.items_not_in_category(), 1);
        assert_eq!(report.items_in_category(), 0);
        assert_eq!(report.correct_category_count(), 0);
        assert_eq!(report.correct_noncategory_count(), 0);
        assert_eq!(report.correct_category_and_label_count(), 0);
        assert_eq!(report.pct_correct_noncategory(), 0.0);
        assert_eq!(report.pct_correct_category(), 0.0);
    }

    #[test]
    fn test_label_match_without_category_is_not_combined_correct() {
        let mut results = ResultSet::new();
        results.insert("y".to_string(), record("beagle", "beagle", true, true, false));

        let report = compute_statistics(&results);
        assert_eq!(report.match_count(), 1);
        assert_eq!(report.correct_category_count(), 0);
        assert_eq!(report.correct_category_and_label_count(), 0);
    }

    #[test]
    fn test_partition_and_percentage_range() {
        for n in [1, 2, 7, 30, 101] {
            let report = compute_statistics(&mixed_results(n));
            assert_eq!(
                report.items_in_category() + report.items_not_in_category(),
                report.total_items()
            );
            for pct in report.percentages() {
                assert!((0.0..=100.0).contains(&pct), "{} out of range", pct);
            }
        }
    }

    #[test]
    fn test_order_independence() {
        let forward = mixed_results(40);
        let reversed: Vec<_> = forward.iter().rev().collect();

        let tally_forward: Tally = forward.values().collect();
        let tally_reversed: Tally = reversed.iter().map(|(_, r)| *r).collect();

        assert_eq!(tally_forward, tally_reversed);
        assert_eq!(tally_forward.finish(), tally_reversed.finish());
    }

    #[test]
    fn test_percentages_rederive_from_counts() {
        let report = compute_statistics(&mixed_results(23));

        assert_close(
            report.pct_match(),
            percentage(report.match_count(), report.total_items()),
        );
        assert_close(
            report.pct_correct_category(),
            percentage(report.correct_category_count(), report.items_in_category()),
        );
        assert_close(
            report.pct_correct_category_and_label(),
            percentage(
                report.correct_category_and_label_count(),
                report.items_in_category(),
            ),
        );
        assert_close(
            report.pct_correct_noncategory(),
            percentage(report.correct_noncategory_count(), report.items_not_in_category()),
        );
    }

    #[test]
    fn test_merge_shards_matches_single_pass() {
        let results = mixed_results(50);
        let records: Vec<_> = results.values().collect();

        let merged: Tally = records
            .chunks(7)
            .map(|chunk| chunk.iter().copied().collect::<Tally>())
            .sum();
        let single: Tally = results.values().collect();

        assert_eq!(merged, single);
        assert_eq!(merged + Tally::new(), single);
    }

    #[test]
    fn test_sharded_matches_sequential() {
        let results = mixed_results(97);
        let expected = compute_statistics(&results);

        for shards in [0, 1, 2, 4, 13, 200] {
            assert_eq!(compute_statistics_sharded(&results, shards), expected);
        }
        assert_eq!(
            compute_statistics_sharded(&ResultSet::new(), 4),
            compute_statistics(&ResultSet::new())
        );
    }

    #[test]
    fn test_positional_input() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "image_1.jpg".to_string(),
            positional(json!(["golden retriever", "golden retriever", 1, 1, 1])),
        );
        raw.insert(
            "image_3.jpg".to_string(),
            positional(json!(["cat", "persian cat", 0, 0, 0])),
        );

        let report = compute_statistics_positional(&raw).unwrap();
        assert_eq!(report.total_items(), 2);
        assert_eq!(report.correct_noncategory_count(), 1);
        assert_close(report.pct_match(), 50.0);
    }

    #[test]
    fn test_positional_input_rejects_bad_flag() {
        let mut raw = BTreeMap::new();
        raw.insert("good".to_string(), positional(json!(["pug", "pug", 1, 1, 1])));
        raw.insert("bad".to_string(), positional(json!(["pug", "pug", 1, 1, 5])));

        let err = compute_statistics_positional(&raw).unwrap_err();
        assert_eq!(err.key(), "bad");
        assert!(matches!(
            err,
            StatsError::InvalidRecord { field: "predicted_target_category", .. }
        ));
    }

    #[test]
    fn test_percentage_zero_denominator() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
        assert_close(percentage(1, 3), 100.0 / 3.0);
    }
}
