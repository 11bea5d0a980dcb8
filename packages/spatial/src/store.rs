//! Process-wide, lazily loaded spatial datasets.

use std::borrow::Cow;
use std::sync::OnceLock;

use hydrax_spatial_models::{BuildingFootprint, GeoPoint, RainfallSample};

use crate::buildings::load_buildings;
use crate::containment::BuildingIndex;
use crate::paths::DatasetPaths;
use crate::rainfall::{RainfallField, load_rainfall_field, sample_rainfall};

/// Holds the building index and rainfall raster.
///
/// Each dataset is loaded at most once, on first use, and is read-only
/// afterwards, so a single store can be shared by every request thread.
#[derive(Debug)]
pub struct SpatialStore {
    paths: DatasetPaths,
    buildings: OnceLock<BuildingIndex>,
    rainfall: OnceLock<Option<RainfallField>>,
}

impl SpatialStore {
    #[must_use]
    pub const fn new(paths: DatasetPaths) -> Self {
        Self {
            paths,
            buildings: OnceLock::new(),
            rainfall: OnceLock::new(),
        }
    }

    /// A store over the dataset locations configured in the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(DatasetPaths::from_env())
    }

    /// A store over already-loaded datasets. No files are read.
    #[must_use]
    pub fn from_parts(buildings: Vec<BuildingFootprint>, rainfall: Option<RainfallField>) -> Self {
        Self {
            paths: DatasetPaths {
                buildings: std::path::PathBuf::new(),
                rainfall: std::path::PathBuf::new(),
            },
            buildings: OnceLock::from(BuildingIndex::new(buildings)),
            rainfall: OnceLock::from(rainfall),
        }
    }

    #[must_use]
    pub const fn paths(&self) -> &DatasetPaths {
        &self.paths
    }

    /// The building index, loading it on first call.
    pub fn buildings(&self) -> &BuildingIndex {
        self.buildings
            .get_or_init(|| BuildingIndex::new(load_buildings(&self.paths.buildings)))
    }

    /// The rainfall raster, loading it on first call.
    pub fn rainfall_field(&self) -> Option<&RainfallField> {
        self.rainfall
            .get_or_init(|| load_rainfall_field(&self.paths.rainfall))
            .as_ref()
    }

    /// Loads both datasets now instead of on the first request.
    pub fn preload(&self) {
        let buildings = self.buildings().len();
        let rainfall = self.rainfall_field().is_some();
        log::debug!("Spatial store ready: {buildings} footprints, rainfall raster: {rainfall}");
    }

    /// Whether no building dataset is loaded, so every lookup synthesizes a
    /// footprint.
    pub fn is_mock_mode(&self) -> bool {
        self.buildings().is_empty()
    }

    /// The footprint containing `point`, or a synthetic one in mock mode.
    pub fn resolve_footprint(&self, point: GeoPoint) -> Option<Cow<'_, BuildingFootprint>> {
        self.buildings().resolve(point)
    }

    /// Annual rainfall at `point`.
    pub fn sample_rainfall(&self, point: GeoPoint) -> RainfallSample {
        sample_rainfall(point, self.rainfall_field())
    }
}

impl Default for SpatialStore {
    fn default() -> Self {
        Self::from_env()
    }
}
