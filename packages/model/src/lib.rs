#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pre-trained risk model seam.
//!
//! The pipelines consume the model through the [`RiskModel`] trait, which
//! exposes the two primitive operations of a binary classifier: the
//! predicted class label and the per-class probabilities. The shipped
//! implementation is [`LogisticModel`], a logistic-regression artifact
//! loaded once at startup from a JSON file and never mutated.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use danger_grid_predict_models::{FEATURE_COUNT, FeatureVector, RiskLabel};

/// Errors raised while loading a model artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Failed to read the artifact file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact is not valid JSON or is missing fields.
    #[error("artifact parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The artifact's weight count does not match the feature vector the
    /// pipelines assemble. Catching this at load time makes inference
    /// itself infallible.
    #[error("artifact has {actual} weights, expected {expected}")]
    FeatureCount {
        /// Required weight count.
        expected: usize,
        /// Weight count found in the artifact.
        actual: usize,
    },
}

/// A binary risk classifier over assembled feature vectors.
///
/// `predict` and `predict_probability` must be mutually consistent: the
/// label is the positive class exactly when the positive-class
/// probability clears the model's decision threshold.
pub trait RiskModel {
    /// Predicted class label for a feature vector.
    fn predict(&self, features: &FeatureVector) -> RiskLabel;

    /// Per-class probabilities as `[negative, positive]`.
    fn predict_probability(&self, features: &FeatureVector) -> [f64; 2];
}

/// On-disk shape of the model artifact.
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    weights: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

const fn default_threshold() -> f64 {
    0.5
}

/// A logistic-regression classifier loaded from a JSON artifact.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
    threshold: f64,
}

impl LogisticModel {
    /// Loads the model artifact from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the JSON is
    /// malformed, or the weight count does not equal the feature count.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let contents = std::fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&contents)?;
        let model = Self::from_artifact(artifact)?;
        log::info!(
            "Loaded risk model ({FEATURE_COUNT} weights, threshold {})",
            model.threshold
        );
        Ok(model)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let weights: [f64; FEATURE_COUNT] =
            artifact
                .weights
                .try_into()
                .map_err(|weights: Vec<f64>| ModelError::FeatureCount {
                    expected: FEATURE_COUNT,
                    actual: weights.len(),
                })?;

        Ok(Self {
            weights,
            intercept: artifact.intercept,
            threshold: artifact.threshold,
        })
    }

    /// Probability of the positive ("high risk") class.
    fn positive_probability(&self, features: &FeatureVector) -> f64 {
        let logit: f64 = self
            .weights
            .iter()
            .zip(features.as_array())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        sigmoid(logit)
    }
}

impl RiskModel for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> RiskLabel {
        if self.positive_probability(features) >= self.threshold {
            RiskLabel::HighRisk
        } else {
            RiskLabel::NotHighRisk
        }
    }

    fn predict_probability(&self, features: &FeatureVector) -> [f64; 2] {
        let positive = self.positive_probability(features);
        [1.0 - positive, positive]
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
