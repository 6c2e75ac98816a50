//! Error types for record validation.

use thiserror::Error;

/// Names of the positional record fields, in input order.
pub const FIELD_NAMES: [&str; 5] = [
    "true_label",
    "predicted_label",
    "label_match",
    "is_target_category",
    "predicted_target_category",
];

/// Errors raised while turning raw input into classification records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// An entry is missing a field or holds a value of the wrong type/range.
    #[error("invalid record '{key}': field '{field}' {reason}")]
    InvalidRecord {
        key: String,
        field: &'static str,
        reason: String,
    },
}

impl StatsError {
    /// Build an `InvalidRecord` for the field at positional `index`.
    pub fn invalid(key: &str, index: usize, reason: impl Into<String>) -> Self {
        StatsError::InvalidRecord {
            key: key.to_string(),
            field: Self::field_name(index),
            reason: reason.into(),
        }
    }

    /// Build an `InvalidRecord` about the entry as a whole rather than one field.
    pub fn invalid_entry(key: &str, reason: impl Into<String>) -> Self {
        StatsError::InvalidRecord {
            key: key.to_string(),
            field: "record",
            reason: reason.into(),
        }
    }

    /// Map a positional index to its field name.
    pub fn field_name(index: usize) -> &'static str {
        FIELD_NAMES.get(index).copied().unwrap_or("unknown")
    }

    /// The result-set key of the offending entry.
    pub fn key(&self) -> &str {
        match self {
            StatsError::InvalidRecord { key, .. } => key,
        }
    }
}
