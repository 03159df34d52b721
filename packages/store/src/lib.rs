#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Read-only reference store for grid risk prediction.
//!
//! Holds the two tables loaded once at process start: per-cell crash
//! statistics keyed by [`GridCell`], and an intersection lookup keyed by
//! a normalized street-name pair. Both are immutable for the life of the
//! process and safe to share across threads without locking.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use danger_grid_predict_models::{GridCell, GridStatistics};

/// Errors raised while loading or validating the reference tables.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open a reference table file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A reference table row failed to parse.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The grid-statistics table carries two rows for the same cell.
    ///
    /// Statistics must be unique per cell or lookups would silently pick
    /// an arbitrary row, so this is rejected at load time.
    #[error("duplicate grid statistics for cell ({lat}, {lon})")]
    DuplicateCell {
        /// Latitude of the duplicated cell.
        lat: f64,
        /// Longitude of the duplicated cell.
        lon: f64,
    },
}

/// One row of the grid-statistics CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct GridStatsRow {
    /// Grid latitude, already rounded to 3 decimal places upstream.
    pub lat_grid: f64,
    /// Grid longitude, already rounded to 3 decimal places upstream.
    pub lon_grid: f64,
    /// Total crash count for the cell.
    pub total_crashes: u64,
    /// Aggregate danger score for the cell.
    pub total_danger_score: f64,
    /// Average deaths per crash.
    pub avg_deaths: f64,
    /// Average injuries per crash.
    pub avg_injuries: f64,
}

/// One row of the intersection-lookup CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct IntersectionRow {
    /// First street of the intersection, as exported.
    #[serde(rename = "Primary address")]
    pub primary: String,
    /// Second street of the intersection, as exported.
    #[serde(rename = "Secondary address")]
    pub secondary: String,
    /// Grid latitude containing the intersection.
    pub lat_grid: f64,
    /// Grid longitude containing the intersection.
    pub lon_grid: f64,
}

/// Normalizes a street name for lookup: trim surrounding whitespace,
/// lowercase.
///
/// Applied identically to the intersection table at load time and to
/// request fields at query time; matches silently fail if either side
/// skips this transform.
#[must_use]
pub fn normalize_street(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The two read-only reference tables, indexed for exact-equality
/// lookups.
#[derive(Debug, Default)]
pub struct ReferenceStore {
    grid_stats: BTreeMap<GridCell, GridStatistics>,
    intersections: BTreeMap<(String, String), GridCell>,
}

impl ReferenceStore {
    /// Builds the store from already-parsed table rows.
    ///
    /// Street names are normalized here, so callers pass rows exactly as
    /// exported. Duplicate intersection pairs keep the first row;
    /// duplicate statistics cells are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateCell`] if two statistics rows map
    /// to the same grid cell.
    pub fn new(
        stats: Vec<GridStatsRow>,
        intersections: Vec<IntersectionRow>,
    ) -> Result<Self, StoreError> {
        let mut grid_stats = BTreeMap::new();
        for row in stats {
            let cell = GridCell::from_degrees(row.lat_grid, row.lon_grid);
            let statistics = GridStatistics {
                total_crashes: row.total_crashes,
                total_danger_score: row.total_danger_score,
                avg_deaths: row.avg_deaths,
                avg_injuries: row.avg_injuries,
            };
            if grid_stats.insert(cell, statistics).is_some() {
                return Err(StoreError::DuplicateCell {
                    lat: row.lat_grid,
                    lon: row.lon_grid,
                });
            }
        }

        let mut index = BTreeMap::new();
        for row in intersections {
            let key = (normalize_street(&row.primary), normalize_street(&row.secondary));
            let cell = GridCell::from_degrees(row.lat_grid, row.lon_grid);
            // First row wins for duplicate pairs
            index.entry(key).or_insert(cell);
        }

        Ok(Self {
            grid_stats,
            intersections: index,
        })
    }

    /// Loads both reference tables from CSV files.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be opened, a row fails to
    /// parse, or the statistics table violates cell uniqueness.
    pub fn from_csv_paths(
        grid_stats: impl AsRef<Path>,
        intersections: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let stats_rows = read_grid_stats(std::fs::File::open(grid_stats)?)?;
        let intersection_rows = read_intersections(std::fs::File::open(intersections)?)?;

        log::info!(
            "Loaded {} grid statistics rows and {} intersections",
            stats_rows.len(),
            intersection_rows.len()
        );

        Self::new(stats_rows, intersection_rows)
    }

    /// Looks up the statistics row for a grid cell, if one exists.
    #[must_use]
    pub fn grid_statistics(&self, cell: &GridCell) -> Option<&GridStatistics> {
        self.grid_stats.get(cell)
    }

    /// Looks up the grid cell containing a named intersection.
    ///
    /// Arguments are normalized before the lookup, so callers may pass
    /// raw request text. Both streets must match the same row exactly.
    #[must_use]
    pub fn intersection(&self, primary: &str, secondary: &str) -> Option<GridCell> {
        self.intersections
            .get(&(normalize_street(primary), normalize_street(secondary)))
            .copied()
    }

    /// Number of cells with statistics.
    #[must_use]
    pub fn grid_stats_len(&self) -> usize {
        self.grid_stats.len()
    }

    /// Number of indexed intersections.
    #[must_use]
    pub fn intersections_len(&self) -> usize {
        self.intersections.len()
    }
}

/// Parses grid-statistics CSV rows from a reader.
///
/// # Errors
///
/// Returns an error if any row fails to deserialize.
pub fn read_grid_stats(reader: impl Read) -> Result<Vec<GridStatsRow>, StoreError> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)
}

/// Parses intersection-lookup CSV rows from a reader.
///
/// # Errors
///
/// Returns an error if any row fails to deserialize.
pub fn read_intersections(reader: impl Read) -> Result<Vec<IntersectionRow>, StoreError> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)
}
