#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial types shared across the HydraX pipeline.
//!
//! Defines the coordinate reference systems understood by the dataset
//! loaders, the canonical planar point type used for every containment and
//! area computation, the normalized building footprint record, and the
//! tagged result of sampling the rainfall raster.

pub use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Rainfall depth (mm/year) substituted whenever the raster cannot provide a
/// valid sample.
pub const RAINFALL_FALLBACK_MM: f64 = 600.0;

/// Radius of the disk synthesized around the query point when no building
/// dataset is loaded.
pub const SYNTHETIC_FOOTPRINT_RADIUS_M: f64 = 25.0;

/// Building id assigned to synthesized footprints.
pub const SYNTHETIC_FOOTPRINT_ID: i64 = 0;

/// The planar CRS all geometry is normalized into.
pub const CANONICAL_CRS: Crs = Crs::WebMercator;

/// A coordinate reference system supported by the dataset loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:4326, longitude/latitude in degrees.
    Wgs84,
    /// EPSG:3857, spherical Web Mercator in meters.
    WebMercator,
    /// EPSG:27700, Ordnance Survey National Grid on the OSGB36 datum.
    BritishNationalGrid,
    /// Universal Transverse Mercator on the WGS84 ellipsoid, in meters.
    Utm {
        /// Zone number (1-60).
        zone: u8,
        /// Northern hemisphere when `true`.
        north: bool,
    },
}

impl Crs {
    /// Maps an EPSG code to a supported CRS.
    ///
    /// ETRS89 UTM zones (`258xx`) are treated as their WGS84 equivalents;
    /// the datums differ by well under a meter.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(Self::Wgs84),
            3857 | 900_913 | 3785 => Some(Self::WebMercator),
            27700 => Some(Self::BritishNationalGrid),
            32601..=32660 => Some(Self::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Some(Self::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            25801..=25860 => Some(Self::Utm {
                zone: (code - 25800) as u8,
                north: true,
            }),
            _ => None,
        }
    }

    /// Parses a CRS identifier such as `EPSG:3857`,
    /// `urn:ogc:def:crs:EPSG::27700` or `urn:ogc:def:crs:OGC:1.3:CRS84`.
    #[must_use]
    pub fn from_urn(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.to_ascii_uppercase().ends_with("CRS84") {
            return Some(Self::Wgs84);
        }
        let code = name.rsplit(':').next()?.trim().parse::<u32>().ok()?;
        Self::from_epsg(code)
    }

    /// The EPSG code for this CRS.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
            Self::BritishNationalGrid => 27700,
            Self::Utm { zone, north: true } => 32600 + zone as u32,
            Self::Utm { zone, north: false } => 32700 + zone as u32,
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// A point in the canonical planar CRS, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.x, point.y)
    }
}

/// Where a [`BuildingFootprint`] came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FootprintSource {
    /// Loaded from the building dataset.
    Dataset,
    /// Synthesized around the query point because no dataset is loaded.
    Synthetic,
}

/// A normalized building footprint in the canonical CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingFootprint {
    /// Identifier, stable within a loaded dataset.
    pub id: i64,
    /// Footprint outline in canonical meters.
    pub geometry: MultiPolygon<f64>,
    /// Roof area in square meters, never negative.
    pub area_m2: f64,
    /// Dataset row or synthesized fallback.
    pub source: FootprintSource,
}

impl BuildingFootprint {
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.source == FootprintSource::Synthetic
    }
}

/// Why a rainfall sample fell back to [`RAINFALL_FALLBACK_MM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FallbackReason {
    /// No rainfall raster is loaded.
    FieldAbsent,
    /// The point could not be transformed into the raster CRS.
    Projection,
    /// The point lies outside the raster extent.
    OutOfExtent,
    /// The cell holds the raster's no-data sentinel.
    NoData,
    /// The cell value is NaN or infinite.
    NotFinite,
    /// The cell value is negative.
    Negative,
}

/// Result of sampling the rainfall raster at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RainfallSample {
    /// A valid cell value in mm/year.
    Sampled {
        /// Annual rainfall in millimeters.
        mm: f64,
    },
    /// The documented fallback was used.
    Fallback {
        /// Why the raster value could not be used.
        reason: FallbackReason,
    },
}

impl RainfallSample {
    /// Annual rainfall in mm, substituting the fallback where needed.
    #[must_use]
    pub const fn value(&self) -> f64 {
        match self {
            Self::Sampled { mm } => *mm,
            Self::Fallback { .. } => RAINFALL_FALLBACK_MM,
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}
