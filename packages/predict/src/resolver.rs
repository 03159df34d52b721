//! Grid cell resolution.
//!
//! Two entry points with deliberately different input policies:
//! [`resolve_query`] for single ad-hoc requests (strict field
//! precedence, parsing handled upstream) and [`resolve_record`] for
//! batch rows (lenient, coordinates first). The asymmetry is observable
//! behavior and must not be unified.

use danger_grid_predict_models::{BatchRecord, GridCell};
use danger_grid_store::{ReferenceStore, normalize_street};

/// Resolves a single ad-hoc query to a grid cell.
///
/// Precedence:
/// 1. Both streets present (non-empty after normalization) and neither
///    coordinate present: intersection lookup, `None` on a miss.
/// 2. Both coordinates present: snap to the grid by rounding to
///    3 decimal places.
/// 3. Anything else (a partial coordinate pair, or no usable input):
///    `None`.
///
/// Coordinates are already parsed here; malformed coordinate text is
/// fatal upstream in this path and never reaches the resolver.
#[must_use]
pub fn resolve_query(
    store: &ReferenceStore,
    lat: Option<f64>,
    lon: Option<f64>,
    primary: &str,
    secondary: &str,
) -> Option<GridCell> {
    if !primary.is_empty() && !secondary.is_empty() && lat.is_none() && lon.is_none() {
        store.intersection(primary, secondary)
    } else if let (Some(lat), Some(lon)) = (lat, lon) {
        Some(GridCell::from_degrees(lat, lon))
    } else {
        None
    }
}

/// Resolves one batch row to a grid cell.
///
/// Coordinates win whenever both parse; absent, empty, or unparseable
/// coordinate text counts as missing and the row falls through to the
/// street lookup. Nothing in this path is fatal.
#[must_use]
pub fn resolve_record(store: &ReferenceStore, record: &BatchRecord) -> Option<GridCell> {
    let lat = parse_lenient_coordinate(record.latitude.as_deref());
    let lon = parse_lenient_coordinate(record.longitude.as_deref());

    if let (Some(lat), Some(lon)) = (lat, lon) {
        return Some(GridCell::from_degrees(lat, lon));
    }

    let primary = normalize_street(record.primary_street.as_deref().unwrap_or(""));
    let secondary = normalize_street(record.secondary_street.as_deref().unwrap_or(""));
    if primary.is_empty() || secondary.is_empty() {
        return None;
    }
    store.intersection(&primary, &secondary)
}

/// Not-missing predicate for batch coordinates: present, non-empty, and
/// numeric.
fn parse_lenient_coordinate(value: Option<&str>) -> Option<f64> {
    value?.trim().parse().ok()
}
