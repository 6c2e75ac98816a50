//! Data models for classifier run statistics.
//!
//! This module contains the per-item classification record, the result
//! set it lives in, and the statistics report produced from it.

use crate::analysis::percentage as percent;
use crate::error::StatsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A 0/1 flag as supplied by the classifier harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Flag(bool);

impl Flag {
    pub const NO: Flag = Flag(false);
    pub const YES: Flag = Flag(true);

    /// Returns `true` when the flag is set (1).
    pub fn is_set(self) -> bool {
        self.0
    }
}

impl TryFrom<i64> for Flag {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Flag(false)),
            1 => Ok(Flag(true)),
            other => Err(format!("must be 0 or 1, got {}", other)),
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Flag(value)
    }
}

impl From<Flag> for u8 {
    fn from(flag: Flag) -> Self {
        u8::from(flag.0)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Outcome of classifying a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// Ground-truth descriptive label.
    pub true_label: String,
    /// Label produced by the classifier.
    pub predicted_label: String,
    /// Whether the two labels were judged equivalent.
    pub label_match: bool,
    /// Whether the item truly belongs to the target category.
    pub is_target_category: bool,
    /// Whether the classifier placed the item in the target category.
    pub predicted_target_category: bool,
}

impl ClassificationRecord {
    /// Creates a record from its labels and flags.
    pub fn new(
        true_label: impl Into<String>,
        predicted_label: impl Into<String>,
        label_match: bool,
        is_target_category: bool,
        predicted_target_category: bool,
    ) -> Self {
        Self {
            true_label: true_label.into(),
            predicted_label: predicted_label.into(),
            label_match,
            is_target_category,
            predicted_target_category,
        }
    }

    /// Builds a record from the positional form
    /// `[true_label, predicted_label, label_match, is_target, predicted_target]`.
    ///
    /// Fields past index 4 are ignored.
    pub fn from_positional(key: &str, fields: &[Value]) -> Result<Self, StatsError> {
        if fields.len() < 5 {
            return Err(StatsError::invalid(
                key,
                fields.len(),
                format!("is missing (record has {} of 5 fields)", fields.len()),
            ));
        }

        Ok(Self {
            true_label: text_field(key, fields, 0)?,
            predicted_label: text_field(key, fields, 1)?,
            label_match: flag_field(key, fields, 2)?.is_set(),
            is_target_category: flag_field(key, fields, 3)?.is_set(),
            predicted_target_category: flag_field(key, fields, 4)?.is_set(),
        })
    }

    /// True when the category prediction agrees with the ground truth.
    pub fn category_correct(&self) -> bool {
        self.is_target_category == self.predicted_target_category
    }

    /// True when the item is correctly placed in the category and its label matches.
    pub fn category_and_label_correct(&self) -> bool {
        self.is_target_category && self.predicted_target_category && self.label_match
    }
}

fn text_field(key: &str, fields: &[Value], index: usize) -> Result<String, StatsError> {
    match &fields[index] {
        Value::String(s) => Ok(s.clone()),
        other => Err(StatsError::invalid(
            key,
            index,
            format!("must be text, got {}", other),
        )),
    }
}

fn flag_field(key: &str, fields: &[Value], index: usize) -> Result<Flag, StatsError> {
    let value = &fields[index];
    let raw = value.as_i64().ok_or_else(|| {
        StatsError::invalid(key, index, format!("must be an integer 0 or 1, got {}", value))
    })?;
    Flag::try_from(raw).map_err(|reason| StatsError::invalid(key, index, reason))
}

/// Classification results keyed by item identifier (e.g. image filename).
pub type ResultSet = BTreeMap<String, ClassificationRecord>;

/// A single named statistic value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(usize),
    Percent(f64),
}

impl StatValue {
    /// Numeric value as `f64`.
    pub fn as_f64(self) -> f64 {
        match self {
            StatValue::Count(n) => n as f64,
            StatValue::Percent(p) => p,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(n) => write!(f, "{}", n),
            StatValue::Percent(p) => write!(f, "{}", p),
        }
    }
}

/// Counts and percentages describing a classifier run.
///
/// Produced by the aggregator; there is no way to change a report after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    total_items: usize,
    items_in_category: usize,
    items_not_in_category: usize,
    match_count: usize,
    correct_category_count: usize,
    correct_noncategory_count: usize,
    correct_category_and_label_count: usize,
    pct_match: f64,
    pct_correct_category: f64,
    pct_correct_category_and_label: f64,
    pct_correct_noncategory: f64,
}

/// Seven raw counts a report is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReportCounts {
    pub total_items: usize,
    pub items_in_category: usize,
    pub items_not_in_category: usize,
    pub match_count: usize,
    pub correct_category_count: usize,
    pub correct_noncategory_count: usize,
    pub correct_category_and_label_count: usize,
}

impl StatisticsReport {
    pub(crate) fn from_counts(counts: ReportCounts) -> Self {
        Self {
            total_items: counts.total_items,
            items_in_category: counts.items_in_category,
            items_not_in_category: counts.items_not_in_category,
            match_count: counts.match_count,
            correct_category_count: counts.correct_category_count,
            correct_noncategory_count: counts.correct_noncategory_count,
            correct_category_and_label_count: counts.correct_category_and_label_count,
            pct_match: percent(counts.match_count, counts.total_items),
            pct_correct_category: percent(counts.correct_category_count, counts.items_in_category),
            pct_correct_category_and_label: percent(
                counts.correct_category_and_label_count,
                counts.items_in_category,
            ),
            pct_correct_noncategory: percent(
                counts.correct_noncategory_count,
                counts.items_not_in_category,
            ),
        }
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn items_in_category(&self) -> usize {
        self.items_in_category
    }

    pub fn items_not_in_category(&self) -> usize {
        self.items_not_in_category
    }

    pub fn match_count(&self) -> usize {
        self.match_count
    }

    pub fn correct_category_count(&self) -> usize {
        self.correct_category_count
    }

    pub fn correct_noncategory_count(&self) -> usize {
        self.correct_noncategory_count
    }

    /// Items correctly placed in the category whose label also matched.
    pub fn correct_category_and_label_count(&self) -> usize {
        self.correct_category_and_label_count
    }

    pub fn pct_match(&self) -> f64 {
        self.pct_match
    }

    pub fn pct_correct_category(&self) -> f64 {
        self.pct_correct_category
    }

    pub fn pct_correct_category_and_label(&self) -> f64 {
        self.pct_correct_category_and_label
    }

    pub fn pct_correct_noncategory(&self) -> f64 {
        self.pct_correct_noncategory
    }

    /// All eleven statistics as `(name, value)` pairs, counts first.
    pub fn entries(&self) -> [(&'static str, StatValue); 11] {
        [
            ("total_items", StatValue::Count(self.total_items)),
            ("items_in_category", StatValue::Count(self.items_in_category)),
            ("items_not_in_category", StatValue::Count(self.items_not_in_category)),
            ("match_count", StatValue::Count(self.match_count)),
            ("correct_category_count", StatValue::Count(self.correct_category_count)),
            ("correct_noncategory_count", StatValue::Count(self.correct_noncategory_count)),
            (
                "correct_category_and_label_count",
                StatValue::Count(self.correct_category_and_label_count),
            ),
            ("pct_match", StatValue::Percent(self.pct_match)),
            ("pct_correct_category", StatValue::Percent(self.pct_correct_category)),
            (
                "pct_correct_category_and_label",
                StatValue::Percent(self.pct_correct_category_and_label),
            ),
            ("pct_correct_noncategory", StatValue::Percent(self.pct_correct_noncategory)),
        ]
    }

    /// Looks up a statistic by name.
    pub fn get(&self, name: &str) -> Option<StatValue> {
        self.entries()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Percentages only, in report order.
    pub fn percentages(&self) -> [f64; 4] {
        [
            self.pct_match,
            self.pct_correct_category,
            self.pct_correct_category_and_label,
            self.pct_correct_noncategory,
        ]
    }
}
