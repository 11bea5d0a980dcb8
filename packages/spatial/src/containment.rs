//! In-memory spatial index for building containment lookups.
//!
//! Footprints are kept in dataset order and indexed by an R-tree over their
//! bounding boxes; the exact point-in-polygon test only runs on envelope
//! candidates.

use std::borrow::Cow;

use geo::{BoundingRect, Contains, Coord, LineString, MultiPolygon, Polygon};
use hydrax_spatial_models::{
    BuildingFootprint, FootprintSource, GeoPoint, SYNTHETIC_FOOTPRINT_ID,
    SYNTHETIC_FOOTPRINT_RADIUS_M,
};
use rstar::{AABB, RTree, RTreeObject};

/// Segments used to approximate the synthetic footprint's disk.
const DISK_SEGMENTS: usize = 64;

/// An R-tree entry pointing back into the footprint list.
#[derive(Debug)]
struct FootprintEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for FootprintEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Building footprints with an R-tree for point lookups.
///
/// Constructed once at load time and shared read-only across requests.
#[derive(Debug)]
pub struct BuildingIndex {
    footprints: Vec<BuildingFootprint>,
    tree: RTree<FootprintEntry>,
}

impl BuildingIndex {
    /// Builds the index, preserving the order of `footprints`.
    #[must_use]
    pub fn new(footprints: Vec<BuildingFootprint>) -> Self {
        let entries = footprints
            .iter()
            .enumerate()
            .filter_map(|(index, footprint)| {
                Some(FootprintEntry {
                    index,
                    envelope: compute_envelope(&footprint.geometry)?,
                })
            })
            .collect();

        Self {
            footprints,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed footprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    /// Whether no dataset footprints are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Looks up the footprint whose interior contains `point`.
    ///
    /// Points on a boundary are not contained. Footprints can overlap; the
    /// one that comes first in dataset order wins.
    #[must_use]
    pub fn find_building(&self, point: GeoPoint) -> Option<&BuildingFootprint> {
        let target = geo::Point::from(point);
        let query_env = AABB::from_point([point.x, point.y]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| self.footprints[entry.index].geometry.contains(&target))
            .map(|entry| entry.index)
            .min()
            .map(|index| &self.footprints[index])
    }

    /// Resolves the footprint for `point`, synthesizing one when the index
    /// is empty.
    ///
    /// Returns `None` only when footprints are loaded and none contains the
    /// point.
    #[must_use]
    pub fn resolve(&self, point: GeoPoint) -> Option<Cow<'_, BuildingFootprint>> {
        if self.is_empty() {
            return Some(Cow::Owned(synthetic_footprint(point)));
        }
        self.find_building(point).map(Cow::Borrowed)
    }
}

/// A disk of [`SYNTHETIC_FOOTPRINT_RADIUS_M`] around `point`, standing in for
/// a real footprint when no building dataset is loaded.
///
/// The outline is a 64-gon; `area_m2` is the exact disk area.
#[must_use]
pub fn synthetic_footprint(point: GeoPoint) -> BuildingFootprint {
    let radius = SYNTHETIC_FOOTPRINT_RADIUS_M;
    #[allow(clippy::cast_precision_loss)]
    let ring: Vec<Coord<f64>> = (0..=DISK_SEGMENTS)
        .map(|i| {
            let theta = std::f64::consts::TAU * (i % DISK_SEGMENTS) as f64 / DISK_SEGMENTS as f64;
            Coord {
                x: radius.mul_add(theta.cos(), point.x),
                y: radius.mul_add(theta.sin(), point.y),
            }
        })
        .collect();

    BuildingFootprint {
        id: SYNTHETIC_FOOTPRINT_ID,
        geometry: MultiPolygon(vec![Polygon::new(LineString(ring), vec![])]),
        area_m2: std::f64::consts::PI * radius * radius,
        source: FootprintSource::Synthetic,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`]. Empty
/// geometries have none and are left out of the tree.
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
