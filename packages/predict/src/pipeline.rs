//! Query and batch pipelines.
//!
//! [`Predictor`] is the explicitly constructed, immutable context
//! holding the reference store and the model; it is handed to callers
//! at startup and shared freely (nothing in it mutates after load).

use danger_grid_model::RiskModel;
use danger_grid_predict_models::{
    BatchOutcome, BatchRecord, FeatureVector, Prediction, QueryRequest, RiskLabel, TimeContext,
};
use danger_grid_store::{ReferenceStore, normalize_street};

use crate::{PredictError, features, resolver, scorer};

/// The two reference tables plus the model, wired together for scoring.
pub struct Predictor<M> {
    store: ReferenceStore,
    model: M,
}

impl<M: RiskModel> Predictor<M> {
    /// Builds a predictor over an already-loaded store and model.
    pub const fn new(store: ReferenceStore, model: M) -> Self {
        Self { store, model }
    }

    /// The reference store this predictor scores against.
    #[must_use]
    pub const fn store(&self) -> &ReferenceStore {
        &self.store
    }

    /// Scores a single ad-hoc query.
    ///
    /// Resolution failures surface as [`Prediction`] categories, never
    /// as errors. Malformed numeric text is fatal in this path:
    /// coordinates that are present must parse as floats, and
    /// hour/dayofweek that are present must parse as integers
    /// (absent ones default to 12 and 2).
    ///
    /// # Errors
    ///
    /// Returns [`PredictError`] when a supplied coordinate, hour, or
    /// day-of-week field is not numeric.
    pub fn query(&self, request: &QueryRequest) -> Result<Prediction, PredictError> {
        let lat = parse_coordinate("latitude", request.latitude.as_deref())?;
        let lon = parse_coordinate("longitude", request.longitude.as_deref())?;
        let primary = normalize_street(request.primary_street.as_deref().unwrap_or(""));
        let secondary = normalize_street(request.secondary_street.as_deref().unwrap_or(""));
        let time = TimeContext {
            hour: parse_time_field("hour", request.hour.as_deref(), TimeContext::DEFAULT_HOUR)?,
            dayofweek: parse_time_field(
                "dayofweek",
                request.dayofweek.as_deref(),
                TimeContext::DEFAULT_DAYOFWEEK,
            )?,
        };

        let Some(cell) = resolver::resolve_query(&self.store, lat, lon, &primary, &secondary)
        else {
            return Ok(Prediction::InvalidInput);
        };

        let Some(feature_vector) = features::assemble(&self.store, cell, &time) else {
            return Ok(Prediction::UnknownLocation);
        };

        Ok(self.classify(&feature_vector))
    }

    /// Scores every row of an uploaded table, in input order.
    ///
    /// One outcome per row, always: rows that resolve no cell come back
    /// as `Invalid Input`, rows with no statistics as
    /// `Unknown Location`, and no row can abort the batch. Rows are
    /// mutually independent.
    #[must_use]
    pub fn batch(&self, rows: &[BatchRecord]) -> Vec<BatchOutcome> {
        rows.iter().map(|row| self.score_record(row)).collect()
    }

    fn score_record(&self, record: &BatchRecord) -> BatchOutcome {
        let time = TimeContext {
            hour: parse_lenient_time(record.hour.as_deref(), TimeContext::DEFAULT_HOUR),
            dayofweek: parse_lenient_time(
                record.dayofweek.as_deref(),
                TimeContext::DEFAULT_DAYOFWEEK,
            ),
        };

        let cell = resolver::resolve_record(&self.store, record);
        let prediction = match cell {
            None => Prediction::InvalidInput,
            Some(cell) => features::assemble(&self.store, cell, &time)
                .map_or(Prediction::UnknownLocation, |feature_vector| {
                    self.classify(&feature_vector)
                }),
        };

        // Resolved rows echo the grid coordinates; unresolved rows echo
        // whatever the input carried.
        let (latitude, longitude) = cell.map_or_else(
            || {
                (
                    record.latitude.clone().unwrap_or_default(),
                    record.longitude.clone().unwrap_or_default(),
                )
            },
            |cell| (format!("{:.3}", cell.lat()), format!("{:.3}", cell.lon())),
        );

        BatchOutcome {
            primary_street: normalize_street(record.primary_street.as_deref().unwrap_or("")),
            secondary_street: normalize_street(record.secondary_street.as_deref().unwrap_or("")),
            latitude,
            longitude,
            hour: time.hour,
            dayofweek: time.dayofweek,
            prediction,
        }
    }

    fn classify(&self, feature_vector: &FeatureVector) -> Prediction {
        let scored = scorer::score(&self.model, feature_vector);
        let confidence_pct = scorer::confidence_percent(scored.probability);
        match scored.label {
            RiskLabel::HighRisk => Prediction::HighRisk { confidence_pct },
            RiskLabel::NotHighRisk => Prediction::NotHighRisk { confidence_pct },
        }
    }
}

/// Parses an optional coordinate field for the single-query path.
///
/// Absent or empty text counts as not supplied; anything else must be a
/// valid float.
fn parse_coordinate(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<f64>, PredictError> {
    match value {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|source| PredictError::InvalidCoordinate {
                field,
                value: text.to_string(),
                source,
            }),
    }
}

/// Parses an optional hour/dayofweek field for the single-query path.
///
/// Absent defaults; present text must be an integer (including the
/// empty string, which is a parse failure, not an absence).
#[allow(clippy::cast_precision_loss)]
fn parse_time_field(
    field: &'static str,
    value: Option<&str>,
    default: f64,
) -> Result<f64, PredictError> {
    match value {
        None => Ok(default),
        Some(text) => text
            .trim()
            .parse::<i64>()
            .map(|parsed| parsed as f64)
            .map_err(|source| PredictError::InvalidTimeField {
                field,
                value: text.to_string(),
                source,
            }),
    }
}

/// Lenient batch-row time parse: absent or unparseable values take the
/// default, and non-integer numeric text passes through as-is.
fn parse_lenient_time(value: Option<&str>, default: f64) -> f64 {
    value
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use danger_grid_store::{GridStatsRow, IntersectionRow};

    /// Model stub returning a fixed positive-class probability.
    struct FixedModel {
        positive: f64,
    }

    impl RiskModel for FixedModel {
        fn predict(&self, _features: &FeatureVector) -> RiskLabel {
            if self.positive >= 0.5 {
                RiskLabel::HighRisk
            } else {
                RiskLabel::NotHighRisk
            }
        }

        fn predict_probability(&self, _features: &FeatureVector) -> [f64; 2] {
            [1.0 - self.positive, self.positive]
        }
    }

    fn store() -> ReferenceStore {
        ReferenceStore::new(
            vec![GridStatsRow {
                lat_grid: 40.712,
                lon_grid: -74.006,
                total_crashes: 10,
                total_danger_score: 5.0,
                avg_deaths: 0.1,
                avg_injuries: 2.0,
            }],
            vec![IntersectionRow {
                primary: "Main St".to_string(),
                secondary: "1st Ave".to_string(),
                lat_grid: 40.712,
                lon_grid: -74.006,
            }],
        )
        .unwrap()
    }

    fn predictor(positive: f64) -> Predictor<FixedModel> {
        Predictor::new(store(), FixedModel { positive })
    }

    fn coordinate_request(lat: &str, lon: &str) -> QueryRequest {
        QueryRequest {
            latitude: Some(lat.to_string()),
            longitude: Some(lon.to_string()),
            ..QueryRequest::default()
        }
    }

    #[test]
    fn query_scores_known_coordinates_high_risk() {
        let prediction = predictor(0.831)
            .query(&coordinate_request("40.7121", "-74.0059"))
            .unwrap();
        assert_eq!(prediction, Prediction::HighRisk { confidence_pct: 83 });
        assert_eq!(prediction.confidence_display(), "83%");
    }

    #[test]
    fn query_scores_known_coordinates_not_high_risk() {
        let prediction = predictor(0.129)
            .query(&coordinate_request("40.712", "-74.006"))
            .unwrap();
        assert_eq!(prediction, Prediction::NotHighRisk { confidence_pct: 12 });
    }

    #[test]
    fn query_via_intersection_matches_table_cell() {
        let request = QueryRequest {
            primary_street: Some("  MAIN ST ".to_string()),
            secondary_street: Some("1st Ave".to_string()),
            hour: Some("8".to_string()),
            dayofweek: Some("1".to_string()),
            ..QueryRequest::default()
        };
        let prediction = predictor(0.9).query(&request).unwrap();
        assert_eq!(prediction, Prediction::HighRisk { confidence_pct: 90 });
    }

    #[test]
    fn query_unknown_cell_is_unknown_location() {
        let prediction = predictor(0.9)
            .query(&coordinate_request("41.0", "-75.0"))
            .unwrap();
        assert_eq!(prediction, Prediction::UnknownLocation);
        assert_eq!(prediction.confidence_display(), "N/A");
    }

    #[test]
    fn query_partial_coordinates_are_invalid_input() {
        let request = QueryRequest {
            latitude: Some("40.0".to_string()),
            ..QueryRequest::default()
        };
        let prediction = predictor(0.9).query(&request).unwrap();
        assert_eq!(prediction, Prediction::InvalidInput);
        assert_eq!(prediction.query_message(), "Please provide valid input.");
    }

    #[test]
    fn query_empty_request_is_invalid_input() {
        let prediction = predictor(0.9).query(&QueryRequest::default()).unwrap();
        assert_eq!(prediction, Prediction::InvalidInput);
    }

    #[test]
    fn query_malformed_coordinate_is_fatal() {
        let result = predictor(0.9).query(&coordinate_request("not-a-number", "-74.006"));
        assert!(matches!(
            result,
            Err(PredictError::InvalidCoordinate {
                field: "latitude",
                ..
            })
        ));
    }

    #[test]
    fn query_malformed_hour_is_fatal() {
        let request = QueryRequest {
            hour: Some("noon".to_string()),
            ..coordinate_request("40.712", "-74.006")
        };
        let result = predictor(0.9).query(&request);
        assert!(matches!(
            result,
            Err(PredictError::InvalidTimeField { field: "hour", .. })
        ));
    }

    #[test]
    fn query_absent_time_fields_default() {
        // Defaults are hour 12, dayofweek 2; the request still scores.
        let prediction = predictor(0.75)
            .query(&coordinate_request("40.712", "-74.006"))
            .unwrap();
        assert_eq!(prediction, Prediction::HighRisk { confidence_pct: 75 });
    }

    #[test]
    fn query_is_deterministic() {
        let predictor = predictor(0.6);
        let request = coordinate_request("40.712", "-74.006");
        assert_eq!(
            predictor.query(&request).unwrap(),
            predictor.query(&request).unwrap()
        );
    }

    fn batch_row(lat: Option<&str>, lon: Option<&str>) -> BatchRecord {
        BatchRecord {
            latitude: lat.map(String::from),
            longitude: lon.map(String::from),
            ..BatchRecord::default()
        }
    }

    #[test]
    fn batch_yields_one_outcome_per_row_in_order() {
        let rows = vec![
            batch_row(Some("40.712"), Some("-74.006")),
            batch_row(None, None),
            batch_row(Some("41.0"), Some("-75.0")),
        ];
        let outcomes = predictor(0.9).batch(&rows);

        assert_eq!(outcomes.len(), rows.len());
        assert_eq!(
            outcomes[0].prediction,
            Prediction::HighRisk { confidence_pct: 90 }
        );
        assert_eq!(outcomes[1].prediction, Prediction::InvalidInput);
        assert_eq!(outcomes[2].prediction, Prediction::UnknownLocation);
    }

    #[test]
    fn batch_malformed_row_does_not_abort_the_batch() {
        let rows = vec![
            batch_row(Some("garbage"), Some("also-garbage")),
            batch_row(Some("40.712"), Some("-74.006")),
        ];
        let outcomes = predictor(0.9).batch(&rows);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].prediction, Prediction::InvalidInput);
        assert_eq!(
            outcomes[1].prediction,
            Prediction::HighRisk { confidence_pct: 90 }
        );
    }

    #[test]
    fn batch_resolves_streets_and_echoes_grid_coordinates() {
        let row = BatchRecord {
            primary_street: Some("Main St".to_string()),
            secondary_street: Some("1ST AVE".to_string()),
            hour: Some("8".to_string()),
            dayofweek: Some("1".to_string()),
            ..BatchRecord::default()
        };
        let outcomes = predictor(0.9).batch(&[row]);

        assert_eq!(outcomes[0].latitude, "40.712");
        assert_eq!(outcomes[0].longitude, "-74.006");
        assert_eq!(outcomes[0].primary_street, "main st");
        assert!((outcomes[0].hour - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn batch_defaults_malformed_time_fields() {
        let row = BatchRecord {
            hour: Some("noon".to_string()),
            dayofweek: Some("".to_string()),
            ..batch_row(Some("40.712"), Some("-74.006"))
        };
        let outcomes = predictor(0.4).batch(&[row]);

        assert!((outcomes[0].hour - TimeContext::DEFAULT_HOUR).abs() < f64::EPSILON);
        assert!((outcomes[0].dayofweek - TimeContext::DEFAULT_DAYOFWEEK).abs() < f64::EPSILON);
        assert_eq!(
            outcomes[0].prediction,
            Prediction::NotHighRisk { confidence_pct: 40 }
        );
    }

    #[test]
    fn batch_passes_non_integer_time_through() {
        let row = BatchRecord {
            hour: Some("7.5".to_string()),
            ..batch_row(Some("40.712"), Some("-74.006"))
        };
        let outcomes = predictor(0.9).batch(&[row]);
        assert!((outcomes[0].hour - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn batch_unresolved_rows_echo_raw_input() {
        let row = batch_row(Some("garbage"), None);
        let outcomes = predictor(0.9).batch(&[row]);
        assert_eq!(outcomes[0].latitude, "garbage");
        assert_eq!(outcomes[0].longitude, "");
    }
}
