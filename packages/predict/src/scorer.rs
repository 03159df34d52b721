//! Risk scoring: classification plus confidence from the model's two
//! primitive operations.

use danger_grid_model::RiskModel;
use danger_grid_predict_models::{FeatureVector, RiskLabel};

/// A scored feature vector: the class label and the positive-class
/// probability it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Predicted class.
    pub label: RiskLabel,
    /// Probability of the positive ("high risk") class, 0.0-1.0.
    pub probability: f64,
}

/// Scores one feature vector.
#[must_use]
pub fn score<M: RiskModel>(model: &M, features: &FeatureVector) -> Score {
    let [_, positive] = model.predict_probability(features);
    Score {
        label: model.predict(features),
        probability: positive,
    }
}

/// Renders a probability as a truncated (not rounded) integer percent.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn confidence_percent(probability: f64) -> u8 {
    (probability.clamp(0.0, 1.0) * 100.0) as u8
}
