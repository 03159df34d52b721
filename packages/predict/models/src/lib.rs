#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core data types for grid-based crash risk prediction.
//!
//! These types flow between the reference store, the resolver/assembler
//! pipeline, and the risk model. They carry no behavior beyond
//! construction and rendering; all decision logic lives in
//! `danger_grid_predict`.

use serde::Deserialize;

/// Milli-degrees per degree; grid cells are 3-decimal-place buckets.
const MILLI: f64 = 1000.0;

/// A fixed spatial grid cell, identified by coordinates rounded to
/// 3 decimal places.
///
/// Stored internally as milli-degree integers so the type is `Eq`, `Ord`,
/// and `Hash` and table joins are exact equality rather than float
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    lat_milli: i32,
    lon_milli: i32,
}

impl GridCell {
    /// Snaps raw coordinates to the grid by rounding each to 3 decimal
    /// places.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat_milli: (lat * MILLI).round() as i32,
            lon_milli: (lon * MILLI).round() as i32,
        }
    }

    /// Latitude of the cell in degrees.
    #[must_use]
    pub fn lat(&self) -> f64 {
        f64::from(self.lat_milli) / MILLI
    }

    /// Longitude of the cell in degrees.
    #[must_use]
    pub fn lon(&self) -> f64 {
        f64::from(self.lon_milli) / MILLI
    }
}

/// Precomputed historical crash statistics for one [`GridCell`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStatistics {
    /// Total crash count observed in the cell.
    pub total_crashes: u64,
    /// Aggregate danger score for the cell.
    pub total_danger_score: f64,
    /// Average deaths per crash.
    pub avg_deaths: f64,
    /// Average injuries per crash.
    pub avg_injuries: f64,
}

/// Time-of-request context fed to the model alongside the grid
/// statistics.
///
/// Carried as `f64` because the batch path passes row values through
/// as-is; the single-query path validates both fields as integers before
/// constructing this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeContext {
    /// Hour of day, 0-23.
    pub hour: f64,
    /// Day of week, 0 (Monday) through 6.
    pub dayofweek: f64,
}

impl TimeContext {
    /// Substituted when a request omits the hour.
    pub const DEFAULT_HOUR: f64 = 12.0;
    /// Substituted when a request omits the day of week.
    pub const DEFAULT_DAYOFWEEK: f64 = 2.0;
}

impl Default for TimeContext {
    fn default() -> Self {
        Self {
            hour: Self::DEFAULT_HOUR,
            dayofweek: Self::DEFAULT_DAYOFWEEK,
        }
    }
}

/// Number of features the risk model consumes.
pub const FEATURE_COUNT: usize = 6;

/// The fixed-order numeric input consumed by the risk classifier.
///
/// Order is load-bearing: it must match the order the model was trained
/// on. See [`FeatureVector::from_parts`] for the canonical ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Builds the vector in its canonical order:
    /// `[total_crashes, total_danger_score, avg_deaths, avg_injuries,
    /// hour, dayofweek]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_parts(stats: &GridStatistics, time: &TimeContext) -> Self {
        Self([
            stats.total_crashes as f64,
            stats.total_danger_score,
            stats.avg_deaths,
            stats.avg_injuries,
            time.hour,
            time.dayofweek,
        ])
    }

    /// The raw feature values, in canonical order.
    #[must_use]
    pub const fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

/// Binary classification emitted by the risk model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLabel {
    /// Positive class: the cell/time combination is high risk.
    HighRisk,
    /// Negative class.
    NotHighRisk,
}

/// Final outcome of scoring one request or one batch row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prediction {
    /// Statistics found, model returned the positive class.
    HighRisk {
        /// Positive-class probability as a truncated integer percent.
        confidence_pct: u8,
    },
    /// Statistics found, model returned the negative class.
    NotHighRisk {
        /// Positive-class probability as a truncated integer percent.
        confidence_pct: u8,
    },
    /// A grid cell was resolved but has no statistics row.
    UnknownLocation,
    /// No grid cell could be resolved from the input.
    InvalidInput,
}

impl Prediction {
    /// Short category label, as used in batch output rows.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::HighRisk { .. } => "High Risk",
            Self::NotHighRisk { .. } => "Not High Risk",
            Self::UnknownLocation => "Unknown Location",
            Self::InvalidInput => "Invalid Input",
        }
    }

    /// Message shown for a single ad-hoc query, which words the
    /// invalid-input case as a prompt rather than a category.
    #[must_use]
    pub const fn query_message(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Please provide valid input.",
            other => other.label(),
        }
    }

    /// Positive-class confidence percent, when the row was scored.
    #[must_use]
    pub const fn confidence(&self) -> Option<u8> {
        match self {
            Self::HighRisk { confidence_pct } | Self::NotHighRisk { confidence_pct } => {
                Some(*confidence_pct)
            }
            Self::UnknownLocation | Self::InvalidInput => None,
        }
    }

    /// Confidence rendered for display: `"62%"` when scored, `"N/A"`
    /// otherwise.
    #[must_use]
    pub fn confidence_display(&self) -> String {
        self.confidence()
            .map_or_else(|| "N/A".to_string(), |pct| format!("{pct}%"))
    }
}

/// Raw fields of a single ad-hoc query, exactly as the caller supplied
/// them.
///
/// All fields are optional text; parsing and defaulting rules belong to
/// the query pipeline, which treats malformed coordinate or time text as
/// fatal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    /// Raw latitude text, e.g. `"40.712"`.
    #[serde(default)]
    pub latitude: Option<String>,
    /// Raw longitude text.
    #[serde(default)]
    pub longitude: Option<String>,
    /// First street of an intersection.
    #[serde(default)]
    pub primary_street: Option<String>,
    /// Second street of an intersection.
    #[serde(default)]
    pub secondary_street: Option<String>,
    /// Hour of day, 0-23; defaults to 12 when absent.
    #[serde(default)]
    pub hour: Option<String>,
    /// Day of week, 0-6; defaults to 2 when absent.
    #[serde(default)]
    pub dayofweek: Option<String>,
}

/// One row of an uploaded batch table.
///
/// Column names match the upload format; every field is optional and the
/// batch pipeline never treats a malformed row as fatal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRecord {
    /// Raw latitude text, if the row has one.
    #[serde(default)]
    pub latitude: Option<String>,
    /// Raw longitude text, if the row has one.
    #[serde(default)]
    pub longitude: Option<String>,
    /// First street of an intersection.
    #[serde(rename = "Primary address", default)]
    pub primary_street: Option<String>,
    /// Second street of an intersection.
    #[serde(rename = "Secondary address", default)]
    pub secondary_street: Option<String>,
    /// Hour of day; defaults to 12 when absent or unparseable.
    #[serde(default)]
    pub hour: Option<String>,
    /// Day of week; defaults to 2 when absent or unparseable.
    #[serde(default)]
    pub dayofweek: Option<String>,
}

/// Scored result for one batch row, echoing the location and time the
/// prediction was made for.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Normalized primary street from the input row.
    pub primary_street: String,
    /// Normalized secondary street from the input row.
    pub secondary_street: String,
    /// Resolved grid latitude, or the raw input text when unresolved.
    pub latitude: String,
    /// Resolved grid longitude, or the raw input text when unresolved.
    pub longitude: String,
    /// Hour the row was scored with (after defaulting).
    pub hour: f64,
    /// Day of week the row was scored with (after defaulting).
    pub dayofweek: f64,
    /// The prediction category and confidence for this row.
    pub prediction: Prediction,
}
