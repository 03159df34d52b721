//! Feature assembly: the join between a resolved grid cell and the
//! statistics table.

use danger_grid_predict_models::{FeatureVector, GridCell, TimeContext};
use danger_grid_store::ReferenceStore;

/// Joins a resolved cell against the grid-statistics table and builds
/// the model's feature vector.
///
/// Returns `None` when the cell has no statistics row; the caller
/// reports that as an unknown location. Cells are already snapped to
/// 3 decimal places, so the join is exact equality.
#[must_use]
pub fn assemble(
    store: &ReferenceStore,
    cell: GridCell,
    time: &TimeContext,
) -> Option<FeatureVector> {
    store
        .grid_statistics(&cell)
        .map(|stats| FeatureVector::from_parts(stats, time))
}
