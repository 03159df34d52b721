#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location resolution, feature assembly, and risk scoring.
//!
//! The core of the system: decides which grid cell a request maps to
//! (coordinate snapping vs. intersection lookup), joins the per-cell
//! statistics, assembles the fixed-order feature vector, and derives the
//! classification and confidence from the model's output. Everything in
//! here is a pure function of the request plus an injected
//! [`ReferenceStore`](danger_grid_store::ReferenceStore) and
//! [`RiskModel`](danger_grid_model::RiskModel).

pub mod features;
pub mod pipeline;
pub mod resolver;
pub mod scorer;

use thiserror::Error;

pub use pipeline::Predictor;

/// Fatal single-query input errors.
///
/// Only the ad-hoc query path raises these; the batch path treats the
/// same malformed text as an absent value and keeps going.
#[derive(Debug, Error)]
pub enum PredictError {
    /// A coordinate field was supplied but is not numeric.
    #[error("invalid {field} value {value:?}: {source}")]
    InvalidCoordinate {
        /// Which field failed, `"latitude"` or `"longitude"`.
        field: &'static str,
        /// The raw text that failed to parse.
        value: String,
        /// The underlying parse failure.
        source: std::num::ParseFloatError,
    },

    /// An hour or day-of-week field was supplied but is not an integer.
    #[error("invalid {field} value {value:?}: {source}")]
    InvalidTimeField {
        /// Which field failed, `"hour"` or `"dayofweek"`.
        field: &'static str,
        /// The raw text that failed to parse.
        value: String,
        /// The underlying parse failure.
        source: std::num::ParseIntError,
    },
}
