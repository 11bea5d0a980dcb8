//! Building footprint dataset loading.
//!
//! The primary format is a `GeoJSON` `FeatureCollection`, optionally carrying
//! a legacy `crs` member. When that fails to parse, a generic reader accepts
//! newline-delimited `GeoJSON` (`GeoJSONSeq`), a single `Feature`, or a bare
//! geometry. Rows are read into [`RawBuildingRecord`]s with optional columns
//! and normalized once into [`BuildingFootprint`]s in the canonical CRS.

use std::path::Path;

use geo::{Area, MultiPolygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, feature::Id};
use hydrax_spatial_models::{BuildingFootprint, CANONICAL_CRS, Crs, FootprintSource};
use serde_json::Value;

use crate::SpatialError;
use crate::projection::reproject_multipolygon;

/// A building row as read from the source dataset, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBuildingRecord {
    /// Zero-based position of the feature in the source file.
    pub row: usize,
    /// `building_id`/`id` property or feature id, if present.
    pub id: Option<i64>,
    /// `area_m2` property, if present.
    pub area: Option<RawArea>,
    /// Footprint in the dataset's CRS.
    pub geometry: MultiPolygon<f64>,
}

/// The `area_m2` column as stored in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArea {
    /// Stored as a JSON number.
    Number(f64),
    /// Stored as text, possibly numeric.
    Text(String),
}

/// Raw rows together with the CRS their coordinates are expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    /// Source CRS of every geometry.
    pub crs: Crs,
    /// Polygonal rows in file order.
    pub records: Vec<RawBuildingRecord>,
}

/// Loads and normalizes the building dataset at `path`.
///
/// Never fails: an unreadable or empty dataset yields an empty collection
/// and a warning, which puts the pipeline into synthetic-footprint mode.
#[must_use]
pub fn load_buildings(path: &Path) -> Vec<BuildingFootprint> {
    match read_buildings(path) {
        Ok(buildings) if buildings.is_empty() => {
            log::warn!(
                "Building dataset {} is empty; using synthetic footprints",
                path.display()
            );
            buildings
        }
        Ok(buildings) => {
            log::info!(
                "Loaded {} building footprints from {}",
                buildings.len(),
                path.display()
            );
            buildings
        }
        Err(e) => {
            log::warn!(
                "Could not load building dataset {}: {e}; using synthetic footprints",
                path.display()
            );
            Vec::new()
        }
    }
}

/// Reads and normalizes the building dataset at `path`.
///
/// A `FeatureCollection` is always read with its declared CRS; only other
/// shapes go through the generic reader.
///
/// # Errors
///
/// Returns [`SpatialError`] if the file cannot be read, neither reader can
/// parse it, or it declares an unsupported CRS.
pub fn read_buildings(path: &Path) -> Result<Vec<BuildingFootprint>, SpatialError> {
    let text = std::fs::read_to_string(path)?;
    let dataset = match text.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => dataset_from_collection(collection)?,
        parsed => {
            log::debug!(
                "{} is not a FeatureCollection ({}); retrying with the generic reader",
                path.display(),
                parsed.map_or_else(|e| e.to_string(), |_| "other GeoJSON shape".to_string())
            );
            parse_generic(&text)?
        }
    };
    Ok(normalize(dataset))
}

/// Parses a `GeoJSON` `FeatureCollection`.
///
/// # Errors
///
/// Returns [`SpatialError`] if the text is not a `FeatureCollection` or its
/// `crs` member names an unsupported CRS.
pub fn parse_feature_collection(text: &str) -> Result<RawDataset, SpatialError> {
    let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
        return Err(SpatialError::InvalidDataset {
            message: "expected a FeatureCollection".to_string(),
        });
    };
    dataset_from_collection(collection)
}

fn dataset_from_collection(collection: FeatureCollection) -> Result<RawDataset, SpatialError> {
    let crs = declared_crs(collection.foreign_members.as_ref())?.unwrap_or(Crs::Wgs84);
    Ok(RawDataset {
        crs,
        records: records_from_features(collection.features),
    })
}

/// Parses any `GeoJSON` shape: a feature collection, a single feature, a
/// bare geometry, or a newline-delimited feature sequence. Collections keep
/// their declared CRS; everything else is assumed WGS84.
///
/// # Errors
///
/// Returns [`SpatialError`] if no line of the input is valid `GeoJSON`, or a
/// collection declares an unsupported CRS.
pub fn parse_generic(text: &str) -> Result<RawDataset, SpatialError> {
    let features = match text.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => return dataset_from_collection(collection),
        Ok(GeoJson::Feature(feature)) => vec![feature],
        Ok(GeoJson::Geometry(geometry)) => vec![Feature::from(geometry)],
        Err(_) => parse_feature_sequence(text)?,
    };
    Ok(RawDataset {
        crs: Crs::Wgs84,
        records: records_from_features(features),
    })
}

fn parse_feature_sequence(text: &str) -> Result<Vec<Feature>, SpatialError> {
    let mut features = Vec::new();
    for line in text.lines() {
        let line = line.trim_matches('\u{1e}').trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<GeoJson>()? {
            GeoJson::Feature(feature) => features.push(feature),
            GeoJson::Geometry(geometry) => features.push(Feature::from(geometry)),
            GeoJson::FeatureCollection(collection) => features.extend(collection.features),
        }
    }
    Ok(features)
}

fn declared_crs(members: Option<&JsonObject>) -> Result<Option<Crs>, SpatialError> {
    let Some(crs) = members.and_then(|m| m.get("crs")) else {
        return Ok(None);
    };
    let name = crs
        .pointer("/properties/name")
        .and_then(Value::as_str)
        .ok_or_else(|| SpatialError::InvalidDataset {
            message: "crs member has no properties.name".to_string(),
        })?;
    Crs::from_urn(name)
        .map(Some)
        .ok_or_else(|| SpatialError::UnsupportedCrs(name.to_string()))
}

fn records_from_features(features: Vec<Feature>) -> Vec<RawBuildingRecord> {
    features
        .into_iter()
        .enumerate()
        .filter_map(|(row, feature)| {
            let id = feature_id(&feature);
            let area = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("area_m2"))
                .and_then(raw_area);
            let geometry = feature_geometry(row, feature)?;
            Some(RawBuildingRecord {
                row,
                id,
                area,
                geometry,
            })
        })
        .collect()
}

fn feature_geometry(row: usize, feature: Feature) -> Option<MultiPolygon<f64>> {
    let Some(geometry) = feature.geometry else {
        log::warn!("Skipping building row {row}: no geometry");
        return None;
    };
    match geo::Geometry::<f64>::try_from(geometry) {
        Ok(geo::Geometry::Polygon(polygon)) => Some(MultiPolygon(vec![polygon])),
        Ok(geo::Geometry::MultiPolygon(multi_polygon)) => Some(multi_polygon),
        Ok(_) => {
            log::warn!("Skipping building row {row}: geometry is not polygonal");
            None
        }
        Err(e) => {
            log::warn!("Skipping building row {row}: {e}");
            None
        }
    }
}

fn feature_id(feature: &Feature) -> Option<i64> {
    let from_properties = feature.properties.as_ref().and_then(|p| {
        p.get("building_id")
            .or_else(|| p.get("id"))
            .and_then(integer_value)
    });
    from_properties.or_else(|| match feature.id.as_ref()? {
        Id::Number(n) => n.as_i64(),
        Id::String(s) => s.trim().parse().ok(),
    })
}

#[allow(clippy::cast_possible_truncation)]
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn raw_area(value: &Value) -> Option<RawArea> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(RawArea::Number),
        Value::String(s) => Some(RawArea::Text(s.clone())),
        other => Some(RawArea::Text(other.to_string())),
    }
}

/// Normalizes raw rows into canonical footprints.
///
/// Geometries are reprojected into the canonical CRS, `area_m2` is parsed
/// or computed from the canonical geometry, and missing ids fall back to the
/// source row index. Rows whose coordinates cannot be reprojected are
/// skipped.
#[must_use]
pub fn normalize(dataset: RawDataset) -> Vec<BuildingFootprint> {
    dataset
        .records
        .into_iter()
        .filter_map(|record| {
            let geometry = match reproject_multipolygon(&record.geometry, dataset.crs, CANONICAL_CRS)
            {
                Ok(geometry) => geometry,
                Err(e) => {
                    log::warn!("Skipping building row {}: {e}", record.row);
                    return None;
                }
            };
            let area_m2 = resolve_area(record.row, record.area.as_ref(), &geometry);
            let id = record
                .id
                .unwrap_or_else(|| i64::try_from(record.row).unwrap_or(i64::MAX));
            Some(BuildingFootprint {
                id,
                geometry,
                area_m2,
                source: FootprintSource::Dataset,
            })
        })
        .collect()
}

fn resolve_area(row: usize, area: Option<&RawArea>, geometry: &MultiPolygon<f64>) -> f64 {
    let stored = match area {
        None => return geometry.unsigned_area(),
        Some(RawArea::Number(value)) => Some(*value),
        Some(RawArea::Text(text)) => text.trim().parse::<f64>().ok(),
    };
    match stored {
        Some(value) if value.is_finite() && value >= 0.0 => value,
        _ => {
            log::warn!("Building row {row} has invalid area_m2 {area:?}; computing from geometry");
            geometry.unsigned_area()
        }
    }
}
