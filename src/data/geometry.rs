//! Geographic geometry primitives on a spherical earth.
//!
//! Coordinates are WGS84 degrees. Distances use the haversine formula with the
//! mean earth radius, which is plenty for buffer queries of a few hundred km.
//! The map canvas draws in Web Mercator; [`project`] and [`unproject`] convert.

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Web Mercator cut-off latitude.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Default number of vertices used to draw a circle.
pub const CIRCLE_SEGMENTS: usize = 60;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Point reached by travelling `distance_m` along the initial `bearing_deg`
    /// (clockwise from north).
    pub fn destination(&self, bearing_deg: f64, distance_m: f64) -> GeoPoint {
        let delta = distance_m / EARTH_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
        GeoPoint::new(lat2.to_degrees(), normalize_longitude(lon2.to_degrees()))
    }
}

fn normalize_longitude(lon: f64) -> f64 {
    let mut l = (lon + 180.0) % 360.0;
    if l < 0.0 {
        l += 360.0;
    }
    l - 180.0
}

/// Linear unit of a circle radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadiusUnit {
    #[default]
    Meters,
    Kilometers,
    Feet,
    Miles,
    NauticalMiles,
}

impl RadiusUnit {
    /// Convert `value` expressed in this unit to meters.
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            RadiusUnit::Meters => value,
            RadiusUnit::Kilometers => value * 1_000.0,
            RadiusUnit::Feet => value * 0.3048,
            RadiusUnit::Miles => value * 1_609.344,
            RadiusUnit::NauticalMiles => value * 1_852.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RadiusUnit::Meters => "m",
            RadiusUnit::Kilometers => "km",
            RadiusUnit::Feet => "ft",
            RadiusUnit::Miles => "mi",
            RadiusUnit::NauticalMiles => "nmi",
        }
    }
}

/// A geodesic circle: all points within `radius` of `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: GeoPoint,
    pub radius: f64,
    pub radius_unit: RadiusUnit,
}

impl Circle {
    pub fn new(center: GeoPoint, radius: f64, radius_unit: RadiusUnit) -> Self {
        Self {
            center,
            radius,
            radius_unit,
        }
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_unit.to_meters(self.radius)
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        self.center.distance_to(p) <= self.radius_meters()
    }

    /// Closed ring approximating the circle outline (first vertex repeated last).
    pub fn ring(&self, segments: usize) -> Vec<GeoPoint> {
        let n = segments.max(3);
        let r = self.radius_meters();
        let mut pts: Vec<GeoPoint> = (0..n)
            .map(|i| self.center.destination(360.0 * i as f64 / n as f64, r))
            .collect();
        pts.push(pts[0]);
        pts
    }
}

/// Geometry of a feature, a graphic or a query region.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(GeoPoint),
    Multipoint(Vec<GeoPoint>),
    /// One or more paths.
    Polyline(Vec<Vec<GeoPoint>>),
    /// Rings evaluated with the even-odd rule, so holes and multi-part polygons
    /// share one representation.
    Polygon(Vec<Vec<GeoPoint>>),
    Circle(Circle),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "point",
            Geometry::Multipoint(_) => "multipoint",
            Geometry::Polyline(_) => "polyline",
            Geometry::Polygon(_) => "polygon",
            Geometry::Circle(_) => "circle",
        }
    }

    /// Whether this geometry shares at least one point with `circle`.
    pub fn intersects_circle(&self, circle: &Circle) -> bool {
        let r = circle.radius_meters();
        match self {
            Geometry::Point(p) => circle.contains(p),
            Geometry::Multipoint(pts) => pts.iter().any(|p| circle.contains(p)),
            Geometry::Polyline(paths) => paths
                .iter()
                .any(|path| path_distance_m(&circle.center, path) <= r),
            Geometry::Polygon(rings) => {
                polygon_contains(rings, &circle.center)
                    || rings
                        .iter()
                        .any(|ring| path_distance_m(&circle.center, ring) <= r)
            }
            Geometry::Circle(other) => {
                circle.center.distance_to(&other.center) <= r + other.radius_meters()
            }
        }
    }

    /// Representative point: the point itself, or the mean of all vertices.
    pub fn label_point(&self) -> Option<GeoPoint> {
        let vertices: Vec<GeoPoint> = match self {
            Geometry::Point(p) => return Some(*p),
            Geometry::Circle(c) => return Some(c.center),
            Geometry::Multipoint(pts) => pts.clone(),
            Geometry::Polyline(parts) | Geometry::Polygon(parts) => {
                parts.iter().flatten().copied().collect()
            }
        };
        if vertices.is_empty() {
            return None;
        }
        let n = vertices.len() as f64;
        let (lat, lon) = vertices
            .iter()
            .fold((0.0, 0.0), |acc, p| (acc.0 + p.latitude, acc.1 + p.longitude));
        Some(GeoPoint::new(lat / n, lon / n))
    }
}

/// Even-odd point-in-polygon test on raw lon/lat.
pub fn polygon_contains(rings: &[Vec<GeoPoint>], p: &GeoPoint) -> bool {
    let mut inside = false;
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (a, b) = (&ring[i], &ring[j]);
            if (a.latitude > p.latitude) != (b.latitude > p.latitude) {
                let x = (b.longitude - a.longitude) * (p.latitude - a.latitude)
                    / (b.latitude - a.latitude)
                    + a.longitude;
                if p.longitude < x {
                    inside = !inside;
                }
            }
            j = i;
        }
    }
    inside
}

/// Minimum distance in meters from `origin` to a path, using an equirectangular
/// projection centred on `origin`.
fn path_distance_m(origin: &GeoPoint, path: &[GeoPoint]) -> f64 {
    let local = |p: &GeoPoint| -> [f64; 2] {
        let k = EARTH_RADIUS_M * origin.latitude.to_radians().cos();
        [
            (p.longitude - origin.longitude).to_radians() * k,
            (p.latitude - origin.latitude).to_radians() * EARTH_RADIUS_M,
        ]
    };
    match path {
        [] => f64::INFINITY,
        [only] => origin.distance_to(only),
        _ => path
            .windows(2)
            .map(|w| segment_distance(local(&w[0]), local(&w[1])))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Distance from the local origin to segment `a`-`b`.
fn segment_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let d = [b[0] - a[0], b[1] - a[1]];
    let len2 = d[0] * d[0] + d[1] * d[1];
    let t = if len2 == 0.0 {
        0.0
    } else {
        (-(a[0] * d[0] + a[1] * d[1]) / len2).clamp(0.0, 1.0)
    };
    let c = [a[0] + t * d[0], a[1] + t * d[1]];
    (c[0] * c[0] + c[1] * c[1]).sqrt()
}

/// Web Mercator projection to plot space, in degree-like units so that the
/// x axis reads directly as longitude.
pub fn project(p: &GeoPoint) -> [f64; 2] {
    let lat = p.latitude.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let y = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln().to_degrees();
    [p.longitude, y]
}

pub fn unproject(xy: [f64; 2]) -> GeoPoint {
    let lat = (2.0 * xy[1].to_radians().exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    GeoPoint::new(lat, xy[0])
}

/// Latitude shown for a plot-space y value.
pub fn mercator_y_to_lat(y: f64) -> f64 {
    unproject([0.0, y]).latitude
}
