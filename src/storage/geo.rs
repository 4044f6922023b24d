//! Fixed-point unit conversions, bounding boxes and point lists.
//!
//! Coordinates and distances are stored as scaled `i32` cells. Everything
//! outside the storage layer sees degrees and meters as `f64`.

use serde::Serialize;

/// Degrees to fixed-point scale: the full `i32` range covers +-400 degrees,
/// about 1.9e-7 degree per unit.
pub const DEGREE_FACTOR: f64 = i32::MAX as f64 / 400.0;

/// Meters to fixed-point scale: millimeter units, roughly +-2000 km range.
pub const DIST_FACTOR: f64 = 1000.0;

/// Converts degrees to the stored fixed-point value.
#[inline]
pub fn degree_to_int(degree: f64) -> i32 {
    (degree * DEGREE_FACTOR).round() as i32
}

/// Converts a stored fixed-point value back to degrees.
#[inline]
pub fn int_to_degree(value: i32) -> f64 {
    f64::from(value) / DEGREE_FACTOR
}

/// Converts meters to the stored fixed-point value.
#[inline]
pub fn dist_to_int(meters: f64) -> i32 {
    (meters * DIST_FACTOR).round() as i32
}

/// Converts a stored fixed-point distance back to meters.
#[inline]
pub fn int_to_dist(value: i32) -> f64 {
    f64::from(value) / DIST_FACTOR
}

/// Axis-aligned geographic bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BBox {
    /// Smallest longitude seen.
    pub min_lon: f64,
    /// Largest longitude seen.
    pub max_lon: f64,
    /// Smallest latitude seen.
    pub min_lat: f64,
    /// Largest latitude seen.
    pub max_lat: f64,
}

impl BBox {
    /// Empty box: any update replaces every bound.
    pub const INVERSE: BBox = BBox {
        min_lon: f64::MAX,
        max_lon: -f64::MAX,
        min_lat: f64::MAX,
        max_lat: -f64::MAX,
    };

    /// Widens the box to include the point.
    pub fn update(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    /// True once at least one point has been added.
    pub fn is_valid(&self) -> bool {
        self.min_lat <= self.max_lat && self.min_lon <= self.max_lon
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::INVERSE
    }
}

/// A single coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Ordered sequence of coordinates, used for pillar points and path geometry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PointList {
    points: Vec<GeoPoint>,
}

impl PointList {
    /// Creates an empty list with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Builds a list from flat `lat, lon, lat, lon, ...` pairs.
    pub fn from_pairs(pairs: &[f64]) -> Self {
        debug_assert!(pairs.len() % 2 == 0, "odd number of coordinates");
        Self {
            points: pairs
                .chunks_exact(2)
                .map(|pair| GeoPoint::new(pair[0], pair[1]))
                .collect(),
        }
    }

    /// Appends a point.
    pub fn push(&mut self, lat: f64, lon: f64) {
        self.points.push(GeoPoint::new(lat, lon));
    }

    /// Reverses the order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the list holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`.
    pub fn get(&self, index: usize) -> Option<GeoPoint> {
        self.points.get(index).copied()
    }

    /// Last point, if any.
    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    /// Iterates the points in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = GeoPoint> + ExactSizeIterator + '_ {
        self.points.iter().copied()
    }

    /// Checks point-wise equality within `epsilon` degrees.
    pub fn approx_eq(&self, other: &PointList, epsilon: f64) -> bool {
        self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(a, b)| {
                (a.lat - b.lat).abs() <= epsilon && (a.lon - b.lon).abs() <= epsilon
            })
    }
}

impl FromIterator<GeoPoint> for PointList {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
