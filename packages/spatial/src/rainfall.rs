//! Annual rainfall raster and point sampling.
//!
//! The raster is a single-band `GeoTIFF` geo-referenced by `ModelPixelScale`
//! and `ModelTiepoint`, with its CRS taken from the `GeoKey` directory and its
//! no-data sentinel from `GDAL_NODATA`. The whole band is read into memory
//! once; sampling is a nearest-cell lookup with no interpolation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo::Coord;
use hydrax_spatial_models::{CANONICAL_CRS, Crs, FallbackReason, GeoPoint, RainfallSample};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::SpatialError;
use crate::projection::reproject;

const PROJECTED_CS_TYPE_KEY: u16 = 3072;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const RASTER_TYPE_KEY: u16 = 1025;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// North-up affine mapping from raster cells to CRS coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X of the raster's top-left corner.
    pub origin_x: f64,
    /// Y of the raster's top-left corner.
    pub origin_y: f64,
    /// Cell width in CRS units.
    pub pixel_width: f64,
    /// Cell height in CRS units; rows advance southward.
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Builds a transform from `GeoTIFF` `ModelPixelScale` and the first
    /// `ModelTiepoint`.
    #[must_use]
    pub fn from_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        let (&[sx, sy, ..], &[i, j, _, x, y, ..]) = (scale, tiepoint) else {
            return None;
        };
        if !(sx.is_finite() && sy.is_finite() && sx > 0.0 && sy > 0.0) {
            return None;
        }
        Some(Self {
            origin_x: i.mul_add(-sx, x),
            origin_y: j.mul_add(sy, y),
            pixel_width: sx,
            pixel_height: sy,
        })
    }

    /// Moves the origin from a cell center to its corner, for rasters whose
    /// tiepoint refers to pixel centers.
    #[must_use]
    pub fn pixel_is_point(self) -> Self {
        Self {
            origin_x: self.pixel_width.mul_add(-0.5, self.origin_x),
            origin_y: self.pixel_height.mul_add(0.5, self.origin_y),
            ..self
        }
    }

    /// The `(column, row)` of the cell containing `(x, y)`, if inside a
    /// `width` × `height` grid.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn cell(&self, x: f64, y: f64, width: usize, height: usize) -> Option<(usize, usize)> {
        let col = ((x - self.origin_x) / self.pixel_width).floor();
        let row = ((self.origin_y - y) / self.pixel_height).floor();
        if !(col.is_finite() && row.is_finite()) || col < 0.0 || row < 0.0 {
            return None;
        }
        if col >= width as f64 || row >= height as f64 {
            return None;
        }
        Some((col as usize, row as usize))
    }
}

/// Geo-referencing details read from the `GeoKey` directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GeoKeys {
    epsg: Option<u16>,
    pixel_is_point: bool,
}

impl GeoKeys {
    fn parse(directory: &[u16]) -> Self {
        let mut keys = Self::default();
        let Some(&count) = directory.get(3) else {
            return keys;
        };
        let mut projected = None;
        let mut geographic = None;
        for entry in directory[4..]
            .chunks_exact(4)
            .take(usize::from(count))
        {
            // Only inline SHORT values (tag location 0) are relevant here.
            if entry[1] != 0 {
                continue;
            }
            match entry[0] {
                PROJECTED_CS_TYPE_KEY => projected = Some(entry[3]),
                GEOGRAPHIC_TYPE_KEY => geographic = Some(entry[3]),
                RASTER_TYPE_KEY => keys.pixel_is_point = entry[3] == RASTER_PIXEL_IS_POINT,
                _ => {}
            }
        }
        keys.epsg = projected
            .filter(|&code| code != USER_DEFINED)
            .or_else(|| geographic.filter(|&code| code != USER_DEFINED));
        keys
    }
}

fn parse_nodata(text: &str) -> Option<f64> {
    let text = text.trim_matches('\0').trim();
    if text.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    text.parse().ok()
}

/// Widens the decoded samples to `f64` and keeps only the first band of
/// pixel-interleaved data.
#[allow(clippy::cast_precision_loss)]
fn first_band(image: DecodingResult, pixels: usize) -> Result<Vec<f64>, SpatialError> {
    let values: Vec<f64> = match image {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(SpatialError::InvalidDataset {
                message: "unsupported raster sample format".to_string(),
            });
        }
    };
    if pixels == 0 || values.len() < pixels || values.len() % pixels != 0 {
        return Err(SpatialError::InvalidDataset {
            message: format!(
                "raster has {} samples for {pixels} pixels",
                values.len()
            ),
        });
    }
    let bands = values.len() / pixels;
    Ok(if bands == 1 {
        values
    } else {
        values.into_iter().step_by(bands).collect()
    })
}

/// An in-memory annual rainfall grid (mm/year).
#[derive(Debug, Clone, PartialEq)]
pub struct RainfallField {
    width: usize,
    height: usize,
    values: Vec<f64>,
    transform: GeoTransform,
    crs: Crs,
    nodata: Option<f64>,
}

impl RainfallField {
    /// Creates a field from row-major cell values.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidDataset`] if `values` does not hold
    /// exactly `width * height` cells.
    pub fn new(
        width: usize,
        height: usize,
        values: Vec<f64>,
        transform: GeoTransform,
        crs: Crs,
        nodata: Option<f64>,
    ) -> Result<Self, SpatialError> {
        if values.len() != width * height {
            return Err(SpatialError::InvalidDataset {
                message: format!(
                    "rainfall grid {width}x{height} needs {} cells, got {}",
                    width * height,
                    values.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            values,
            transform,
            crs,
            nodata,
        })
    }

    /// Reads the first band of a `GeoTIFF`.
    ///
    /// Rasters without `GeoKey`s are assumed to be in the canonical CRS.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be opened or decoded, has
    /// no geo-referencing, or declares an unsupported CRS.
    pub fn open(path: &Path) -> Result<Self, SpatialError> {
        let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
        let (width, height) = decoder.dimensions()?;

        let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok();
        let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok();
        let geokeys = decoder
            .get_tag_u16_vec(Tag::GeoKeyDirectoryTag)
            .map(|directory| GeoKeys::parse(&directory))
            .unwrap_or_default();
        let nodata = decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|text| parse_nodata(&text));

        let transform = match (scale, tiepoint) {
            (Some(scale), Some(tiepoint)) => GeoTransform::from_tiepoint(&scale, &tiepoint),
            _ => None,
        }
        .ok_or_else(|| SpatialError::InvalidDataset {
            message: "raster has no usable ModelPixelScale/ModelTiepoint".to_string(),
        })?;
        let transform = if geokeys.pixel_is_point {
            transform.pixel_is_point()
        } else {
            transform
        };

        let crs = match geokeys.epsg {
            Some(code) => Crs::from_epsg(u32::from(code))
                .ok_or_else(|| SpatialError::UnsupportedCrs(format!("EPSG:{code}")))?,
            None => CANONICAL_CRS,
        };

        let to_usize = |n: u32| {
            usize::try_from(n).map_err(|_| SpatialError::InvalidDataset {
                message: format!("raster dimension {n} is too large"),
            })
        };
        let (width, height) = (to_usize(width)?, to_usize(height)?);
        let values = first_band(decoder.read_image()?, width * height)?;

        Self::new(width, height, values, transform, crs, nodata)
    }

    /// The CRS cell coordinates are expressed in.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// Grid size as `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[must_use]
    pub const fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// The no-data sentinel, if declared.
    #[must_use]
    pub const fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// The raw cell value at `(x, y)` in the field's own CRS.
    #[must_use]
    pub fn cell_value(&self, x: f64, y: f64) -> Option<f64> {
        let (col, row) = self.transform.cell(x, y, self.width, self.height)?;
        self.values.get(row * self.width + col).copied()
    }

    fn is_nodata(&self, value: f64) -> bool {
        self.nodata.is_some_and(|nodata| {
            if nodata.is_nan() {
                value.is_nan()
            } else {
                (value - nodata).abs() <= nodata.abs().max(1.0) * 1e-9
            }
        })
    }

    /// Samples the field at a canonical point.
    #[must_use]
    pub fn sample(&self, point: GeoPoint) -> RainfallSample {
        let fallback = |reason| RainfallSample::Fallback { reason };

        let coord = match reproject(
            Coord {
                x: point.x,
                y: point.y,
            },
            CANONICAL_CRS,
            self.crs,
        ) {
            Ok(coord) => coord,
            Err(e) => {
                log::debug!("Rainfall sample transform failed: {e}");
                return fallback(FallbackReason::Projection);
            }
        };

        let Some(value) = self.cell_value(coord.x, coord.y) else {
            return fallback(FallbackReason::OutOfExtent);
        };
        if self.is_nodata(value) {
            fallback(FallbackReason::NoData)
        } else if !value.is_finite() {
            fallback(FallbackReason::NotFinite)
        } else if value < 0.0 {
            fallback(FallbackReason::Negative)
        } else {
            RainfallSample::Sampled { mm: value }
        }
    }
}

/// Opens the rainfall raster at `path`.
///
/// A missing file is the normal "no raster" configuration and returns
/// `None` quietly apart from a warning; an unreadable file is logged and
/// also treated as absent.
#[must_use]
pub fn load_rainfall_field(path: &Path) -> Option<RainfallField> {
    if !path.exists() {
        log::warn!(
            "Rainfall raster {} not found; every sample will use the fallback",
            path.display()
        );
        return None;
    }
    match RainfallField::open(path) {
        Ok(field) => {
            let (width, height) = field.dimensions();
            log::info!(
                "Loaded {width}x{height} rainfall raster from {} ({})",
                path.display(),
                field.crs()
            );
            Some(field)
        }
        Err(e) => {
            log::warn!(
                "Could not read rainfall raster {}: {e}; every sample will use the fallback",
                path.display()
            );
            None
        }
    }
}

/// Samples annual rainfall (mm/year) at a canonical point.
///
/// Never fails: an absent field, a transform failure, an out-of-extent point
/// or an invalid cell all produce [`RainfallSample::Fallback`].
#[must_use]
pub fn sample_rainfall(point: GeoPoint, field: Option<&RainfallField>) -> RainfallSample {
    let sample = field.map_or(
        RainfallSample::Fallback {
            reason: FallbackReason::FieldAbsent,
        },
        |field| field.sample(point),
    );
    if let RainfallSample::Fallback { reason } = sample {
        log::debug!(
            "Rainfall at ({:.1}, {:.1}) fell back to {} mm: {reason}",
            point.x,
            point.y,
            sample.value()
        );
    }
    sample
}
