//! Loading result sets from JSON.
//!
//! Input is a JSON object mapping each item identifier to its positional
//! record, e.g. `{"image_1.jpg": ["golden retriever", "golden retriever", 1, 1, 1]}`.

use crate::error::StatsError;
use crate::models::{ClassificationRecord, ResultSet};
use anyhow::{Context, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Top-level entries of a result set in document order, repeated keys kept.
struct RawEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object mapping item ids to records")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parse a result set from a JSON string.
///
/// Every entry is validated in key order; the first malformed one aborts
/// the load. A key that appears more than once is an error.
pub fn parse_result_set(content: &str) -> Result<ResultSet> {
    let RawEntries(mut entries) =
        serde_json::from_str(content).context("Result set must be a JSON object")?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut results = ResultSet::new();
    for (key, value) in &entries {
        if results.contains_key(key) {
            return Err(StatsError::invalid_entry(key, "appears more than once").into());
        }

        let fields = match value {
            Value::Array(fields) => fields,
            other => {
                return Err(StatsError::invalid_entry(
                    key,
                    format!("must be an array of 5 fields, got {}", other),
                )
                .into())
            }
        };

        let record = ClassificationRecord::from_positional(key, fields)?;
        results.insert(key.clone(), record);
    }

    debug!("Parsed {} classification records", results.len());
    Ok(results)
}

/// Load a result set from a JSON file.
pub fn load_result_set(path: &Path) -> Result<ResultSet> {
    info!("Loading results from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {}", path.display()))?;

    parse_result_set(&content)
        .with_context(|| format!("Failed to load results file: {}", path.display()))
}
