//! Point reprojection between the supported coordinate reference systems.
//!
//! Every transform passes through WGS84 longitude/latitude. Web Mercator is
//! the spherical variant used by EPSG:3857; UTM and the British National
//! Grid are transverse Mercator projections on their own ellipsoids, with a
//! seven-parameter Helmert shift between WGS84 and OSGB36 for the latter
//! (accurate to a few meters, which is well inside a building footprint).

use geo::{Coord, MapCoords, MultiPolygon};
use hydrax_spatial_models::{CANONICAL_CRS, Crs, GeoPoint};

use crate::SpatialError;

/// Latitude limit of the square Web Mercator world.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    f: f64,
}

impl Ellipsoid {
    const fn e2(self) -> f64 {
        self.f * (2.0 - self.f)
    }
}

const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    f: 1.0 / 298.257_223_563,
};

const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    f: 1.0 / 299.324_964_6,
};

/// WGS84 -> OSGB36 Helmert parameters (meters, ppm, arc-seconds).
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    s_ppm: f64,
    rx: f64,
    ry: f64,
    rz: f64,
}

const WGS84_TO_OSGB36: Helmert = Helmert {
    tx: -446.448,
    ty: 125.157,
    tz: -542.060,
    s_ppm: 20.4894,
    rx: -0.1502,
    ry: -0.2470,
    rz: -0.8421,
};

impl Helmert {
    fn apply(&self, [x, y, z]: [f64; 3], inverse: bool) -> [f64; 3] {
        let sign = if inverse { -1.0 } else { 1.0 };
        let arcsec = std::f64::consts::PI / (180.0 * 3600.0);
        let s = 1.0 + sign * self.s_ppm * 1e-6;
        let (rx, ry, rz) = (
            sign * self.rx * arcsec,
            sign * self.ry * arcsec,
            sign * self.rz * arcsec,
        );
        [
            sign.mul_add(self.tx, s * x - rz * y + ry * z),
            sign.mul_add(self.ty, rz * x + s * y - rx * z),
            sign.mul_add(self.tz, -ry * x + rx * y + s * z),
        ]
    }
}

fn geodetic_to_cartesian(lon: f64, lat: f64, ellipsoid: Ellipsoid) -> [f64; 3] {
    let (phi, lambda) = (lat.to_radians(), lon.to_radians());
    let e2 = ellipsoid.e2();
    let nu = ellipsoid.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
    [
        nu * phi.cos() * lambda.cos(),
        nu * phi.cos() * lambda.sin(),
        (1.0 - e2) * nu * phi.sin(),
    ]
}

fn cartesian_to_geodetic([x, y, z]: [f64; 3], ellipsoid: Ellipsoid) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let p = x.hypot(y);
    let mut phi = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = ellipsoid.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let next = (z + e2 * nu * phi.sin()).atan2(p);
        if (next - phi).abs() < 1e-12 {
            phi = next;
            break;
        }
        phi = next;
    }
    (y.atan2(x).to_degrees(), phi.to_degrees())
}

/// Transverse Mercator projection parameters (Snyder, USGS PP 1395).
#[derive(Debug, Clone, Copy)]
struct TransverseMercator {
    ellipsoid: Ellipsoid,
    lat0: f64,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl TransverseMercator {
    fn utm(zone: u8, north: bool) -> Self {
        Self {
            ellipsoid: WGS84,
            lat0: 0.0,
            lon0: f64::from(zone).mul_add(6.0, -183.0),
            k0: 0.9996,
            false_easting: 500_000.0,
            false_northing: if north { 0.0 } else { 10_000_000.0 },
        }
    }

    const fn british_national_grid() -> Self {
        Self {
            ellipsoid: AIRY_1830,
            lat0: 49.0,
            lon0: -2.0,
            k0: 0.999_601_271_7,
            false_easting: 400_000.0,
            false_northing: -100_000.0,
        }
    }

    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.ellipsoid.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let e2 = self.ellipsoid.e2();
        let ep2 = e2 / (1.0 - e2);
        let phi = lat.to_radians();
        let (sin_phi, cos_phi, tan_phi) = (phi.sin(), phi.cos(), phi.tan());

        let n = self.ellipsoid.a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lon - self.lon0).to_radians();
        let m = self.meridian_arc(phi);
        let m0 = self.meridian_arc(self.lat0.to_radians());

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
        let y = self.k0
            * (m - m0
                + n * tan_phi
                    * (a * a / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6)
                            / 720.0));

        (x + self.false_easting, y + self.false_northing)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let x = x - self.false_easting;
        let m = self.meridian_arc(self.lat0.to_radians()) + (y - self.false_northing) / self.k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let j1 = 3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0;
        let j2 = 21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0;
        let j3 = 151.0 * e1.powi(3) / 96.0;
        let j4 = 1097.0 * e1.powi(4) / 512.0;
        let fp = mu
            + j1 * (2.0 * mu).sin()
            + j2 * (4.0 * mu).sin()
            + j3 * (6.0 * mu).sin()
            + j4 * (8.0 * mu).sin();

        let (sin_fp, cos_fp, tan_fp) = (fp.sin(), fp.cos(), fp.tan());
        let c1 = ep2 * cos_fp * cos_fp;
        let t1 = tan_fp * tan_fp;
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_fp * sin_fp).powf(1.5);
        let n1 = a / (1.0 - e2 * sin_fp * sin_fp).sqrt();
        let d = x / (n1 * self.k0);

        let lat = fp
            - (n1 * tan_fp / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_fp;

        (self.lon0 + lon.to_degrees(), lat.to_degrees())
    }
}

fn out_of_domain(crs: Crs, coord: Coord<f64>) -> SpatialError {
    SpatialError::Projection {
        crs,
        x: coord.x,
        y: coord.y,
    }
}

/// Converts a coordinate in `crs` to WGS84 `(lon, lat)` degrees.
fn to_lon_lat(coord: Coord<f64>, crs: Crs) -> Result<(f64, f64), SpatialError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(out_of_domain(crs, coord));
    }
    let (lon, lat) = match crs {
        Crs::Wgs84 => (coord.x, coord.y),
        Crs::WebMercator => {
            let a = WGS84.a;
            let lat = 2.0f64
                .mul_add((coord.y / a).exp().atan(), -std::f64::consts::FRAC_PI_2)
                .to_degrees();
            ((coord.x / a).to_degrees(), lat)
        }
        Crs::Utm { zone, north } => TransverseMercator::utm(zone, north).inverse(coord.x, coord.y),
        Crs::BritishNationalGrid => {
            let (lon, lat) = TransverseMercator::british_national_grid().inverse(coord.x, coord.y);
            let osgb = geodetic_to_cartesian(lon, lat, AIRY_1830);
            cartesian_to_geodetic(WGS84_TO_OSGB36.apply(osgb, true), WGS84)
        }
    };
    if !(-90.0..=90.0).contains(&lat) || !lon.is_finite() {
        return Err(out_of_domain(crs, coord));
    }
    Ok((lon, lat))
}

/// Converts WGS84 `(lon, lat)` degrees to a coordinate in `crs`.
fn from_lon_lat(lon: f64, lat: f64, crs: Crs) -> Result<Coord<f64>, SpatialError> {
    let invalid = || {
        out_of_domain(
            Crs::Wgs84,
            Coord {
                x: lon,
                y: lat,
            },
        )
    };
    if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(invalid());
    }
    let (x, y) = match crs {
        Crs::Wgs84 => (lon, lat),
        Crs::WebMercator => {
            if lat.abs() > MAX_MERCATOR_LATITUDE {
                return Err(invalid());
            }
            let phi = lat.to_radians();
            (
                WGS84.a * lon.to_radians(),
                WGS84.a * (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln(),
            )
        }
        Crs::Utm { zone, north } => TransverseMercator::utm(zone, north).forward(lon, lat),
        Crs::BritishNationalGrid => {
            let wgs = geodetic_to_cartesian(lon, lat, WGS84);
            let (lon, lat) = cartesian_to_geodetic(WGS84_TO_OSGB36.apply(wgs, false), AIRY_1830);
            TransverseMercator::british_national_grid().forward(lon, lat)
        }
    };
    Ok(Coord { x, y })
}

/// Transforms a single coordinate from one CRS to another.
///
/// # Errors
///
/// Returns [`SpatialError::Projection`] if the coordinate is not finite or
/// falls outside the domain of either CRS.
pub fn reproject(coord: Coord<f64>, from: Crs, to: Crs) -> Result<Coord<f64>, SpatialError> {
    if from == to {
        return Ok(coord);
    }
    let (lon, lat) = to_lon_lat(coord, from)?;
    from_lon_lat(lon, lat, to)
}

/// Transforms every vertex of a multi-polygon.
///
/// # Errors
///
/// Returns [`SpatialError::Projection`] for the first vertex that cannot be
/// transformed.
pub fn reproject_multipolygon(
    geometry: &MultiPolygon<f64>,
    from: Crs,
    to: Crs,
) -> Result<MultiPolygon<f64>, SpatialError> {
    if from == to {
        return Ok(geometry.clone());
    }
    geometry.try_map_coords(|coord| reproject(coord, from, to))
}

/// Projects a WGS84 latitude/longitude into the canonical CRS.
///
/// # Errors
///
/// Returns [`SpatialError::Projection`] for non-finite input or latitudes
/// beyond the Web Mercator limit.
pub fn lat_lon_to_canonical(lat: f64, lon: f64) -> Result<GeoPoint, SpatialError> {
    let coord = reproject(Coord { x: lon, y: lat }, Crs::Wgs84, CANONICAL_CRS)?;
    Ok(GeoPoint::new(coord.x, coord.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn projects_big_ben_to_web_mercator() {
        let point = lat_lon_to_canonical(51.500_7, -0.124_6).unwrap();
        assert!(close(point.x, -13_870.41, 0.05), "x = {}", point.x);
        assert!(close(point.y, 6_710_344.26, 0.05), "y = {}", point.y);
    }

    #[test]
    fn web_mercator_round_trip() {
        let point = lat_lon_to_canonical(51.5074, -0.1278).unwrap();
        let back = reproject(
            Coord {
                x: point.x,
                y: point.y,
            },
            CANONICAL_CRS,
            Crs::Wgs84,
        )
        .unwrap();
        assert!(close(back.y, 51.5074, 1e-9));
        assert!(close(back.x, -0.1278, 1e-9));
    }

    #[test]
    fn rejects_polar_latitudes_in_web_mercator() {
        assert!(matches!(
            lat_lon_to_canonical(89.0, 0.0),
            Err(SpatialError::Projection { .. })
        ));
        assert!(lat_lon_to_canonical(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn utm_central_meridian_on_equator_is_false_origin() {
        let coord = reproject(
            Coord { x: 3.0, y: 0.0 },
            Crs::Wgs84,
            Crs::Utm {
                zone: 31,
                north: true,
            },
        )
        .unwrap();
        assert!(close(coord.x, 500_000.0, 1e-6));
        assert!(close(coord.y, 0.0, 1e-6));
    }

    #[test]
    fn utm_round_trip() {
        let utm = Crs::Utm {
            zone: 30,
            north: true,
        };
        let coord = reproject(Coord { x: -3.7038, y: 40.4168 }, Crs::Wgs84, utm).unwrap();
        assert!(close(coord.x, 440_290.46, 0.05), "x = {}", coord.x);
        assert!(close(coord.y, 4_474_257.38, 0.05), "y = {}", coord.y);

        let back = reproject(coord, utm, Crs::Wgs84).unwrap();
        assert!(close(back.x, -3.7038, 1e-7));
        assert!(close(back.y, 40.4168, 1e-7));
    }

    #[test]
    fn national_grid_matches_ordnance_survey_worked_example() {
        // OSGB36 52°39'27.2531"N 1°43'4.5177"E -> E 651409.903 N 313177.270
        let tm = TransverseMercator::british_national_grid();
        let lat = 52.0 + 39.0 / 60.0 + 27.2531 / 3600.0;
        let lon = 1.0 + 43.0 / 60.0 + 4.5177 / 3600.0;
        let (e, n) = tm.forward(lon, lat);
        assert!(close(e, 651_409.903, 0.01), "e = {e}");
        assert!(close(n, 313_177.270, 0.01), "n = {n}");

        let (back_lon, back_lat) = tm.inverse(e, n);
        assert!(close(back_lon, lon, 1e-6));
        assert!(close(back_lat, lat, 1e-6));
    }

    #[test]
    fn national_grid_round_trip_through_datum_shift() {
        let coord = reproject(
            Coord {
                x: -0.124_6,
                y: 51.500_7,
            },
            Crs::Wgs84,
            Crs::BritishNationalGrid,
        )
        .unwrap();
        assert!(close(coord.x, 530_268.0, 10.0), "e = {}", coord.x);
        assert!(close(coord.y, 179_640.0, 10.0), "n = {}", coord.y);

        let back = reproject(coord, Crs::BritishNationalGrid, Crs::Wgs84).unwrap();
        assert!(close(back.x, -0.124_6, 1e-6));
        assert!(close(back.y, 51.500_7, 1e-6));
    }

    #[test]
    fn identity_transform_is_untouched() {
        let coord = Coord { x: 12.5, y: -7.25 };
        assert_eq!(
            reproject(coord, Crs::WebMercator, Crs::WebMercator).unwrap(),
            coord
        );
    }
}
