//! PetStats - classifier run statistics.
//!
//! Tallies per-item classification results (true label, predicted label,
//! label match, true category flag, predicted category flag) into a
//! fixed-shape report of counts and percentages.

pub mod analysis;
pub mod error;
pub mod input;
pub mod models;

pub use analysis::{
    compute_statistics, compute_statistics_positional, compute_statistics_sharded, percentage,
    Tally,
};
pub use error::StatsError;
pub use models::{ClassificationRecord, Flag, ResultSet, StatValue, StatisticsReport};
