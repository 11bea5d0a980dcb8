#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial dataset store for the HydraX pipeline.
//!
//! Loads the building-footprint dataset and the rainfall raster once,
//! normalizes both into the canonical planar CRS, and answers the two
//! per-request spatial questions: which footprint contains a point, and how
//! much rain falls there. Expected failures (missing files, empty datasets,
//! no-data cells) degrade to documented fallbacks instead of errors.

pub mod buildings;
pub mod containment;
pub mod paths;
pub mod projection;
pub mod rainfall;
pub mod store;

pub use containment::{BuildingIndex, synthetic_footprint};
pub use rainfall::{GeoTransform, RainfallField, sample_rainfall};
pub use store::SpatialStore;

use hydrax_spatial_models::Crs;
use thiserror::Error;

/// Errors from loading or transforming spatial data.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Reading a dataset file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The building dataset is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The rainfall raster could not be decoded.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// The dataset declares a CRS this crate cannot transform.
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// A coordinate lies outside the domain of a projection.
    #[error("Coordinate ({x}, {y}) cannot be projected in {crs}")]
    Projection {
        /// The CRS whose domain was violated.
        crs: Crs,
        /// First coordinate component.
        x: f64,
        /// Second coordinate component.
        y: f64,
    },

    /// The dataset parsed but its structure is not what the loader expects.
    #[error("Invalid dataset: {message}")]
    InvalidDataset {
        /// Description of the problem.
        message: String,
    },
}
