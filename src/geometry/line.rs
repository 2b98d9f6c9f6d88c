//! Planar polylines with linear referencing.
//!
//! Distances are measured along the line from its first vertex. Segments of
//! zero length are tolerated (they occur where two lines were concatenated)
//! but never used as interpolation bases, so no operation here can produce a
//! NaN coordinate from finite input.

use crate::network_error::NetworkError;

const EPS: f64 = 1e-12;

/// A 2-D point.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn lerp(a: &Coordinate, b: &Coordinate, t: f64) -> Coordinate {
        Coordinate::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// Linear-referencing operations the network consumes from a branch line.
pub trait LineGeometry: Sized {
    /// Total length of the line.
    fn length(&self) -> f64;

    /// Point at `distance` from the start, clamped into `[0, length]`.
    fn point_at_distance(&self, distance: f64) -> Coordinate;

    /// Distance along the line of the point on it closest to `point`.
    fn distance_along(&self, point: &Coordinate) -> f64;

    /// Split into `[0, distance]` and `[distance, length]`.
    ///
    /// # Errors
    /// `InvalidGeometry` unless `0 < distance < length`.
    fn split_at(&self, distance: f64) -> Result<(Self, Self), NetworkError>;

    /// Same line, traversed the other way.
    fn reversed(&self) -> Self;

    /// `self` followed by `other`. A shared joint vertex is kept once.
    fn concat(&self, other: &Self) -> Result<Self, NetworkError>;
}

/// An ordered list of at least two finite vertices.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineString {
    coords: Vec<Coordinate>,
}

impl LineString {
    /// Build a line from its vertices.
    ///
    /// # Errors
    /// `InvalidGeometry` for fewer than two vertices, `NonFinite` for NaN or
    /// infinite coordinates.
    pub fn new(coords: Vec<Coordinate>) -> Result<Self, NetworkError> {
        if coords.len() < 2 {
            return Err(NetworkError::InvalidGeometry(format!(
                "a line needs at least 2 vertices, got {}",
                coords.len()
            )));
        }
        if let Some(bad) = coords.iter().find(|c| !c.is_finite()) {
            let value = if bad.x.is_finite() { bad.y } else { bad.x };
            return Err(NetworkError::NonFinite {
                what: "coordinate",
                value,
            });
        }
        Ok(Self { coords })
    }

    /// Straight line between two points.
    pub fn segment(from: Coordinate, to: Coordinate) -> Result<Self, NetworkError> {
        Self::new(vec![from, to])
    }

    /// Convenience constructor from `(x, y)` tuples.
    pub fn from_xy(points: &[(f64, f64)]) -> Result<Self, NetworkError> {
        Self::new(points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect())
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn start(&self) -> Coordinate {
        self.coords[0]
    }

    pub fn end(&self) -> Coordinate {
        self.coords[self.coords.len() - 1]
    }

    fn segments(&self) -> impl Iterator<Item = (&Coordinate, &Coordinate, f64)> {
        self.coords
            .windows(2)
            .map(|w| (&w[0], &w[1], w[0].distance(&w[1])))
    }
}

impl LineGeometry for LineString {
    fn length(&self) -> f64 {
        self.segments().map(|(_, _, len)| len).sum()
    }

    fn point_at_distance(&self, distance: f64) -> Coordinate {
        if distance <= 0.0 {
            return self.start();
        }
        let mut walked = 0.0;
        for (a, b, len) in self.segments() {
            if len > EPS && walked + len >= distance {
                return Coordinate::lerp(a, b, (distance - walked) / len);
            }
            walked += len;
        }
        self.end()
    }

    fn distance_along(&self, point: &Coordinate) -> f64 {
        let mut best = (f64::INFINITY, 0.0);
        let mut walked = 0.0;
        for (a, b, len) in self.segments() {
            let t = if len > EPS {
                let dot = (point.x - a.x) * (b.x - a.x) + (point.y - a.y) * (b.y - a.y);
                (dot / (len * len)).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let d = Coordinate::lerp(a, b, t).distance(point);
            if d < best.0 {
                best = (d, walked + t * len);
            }
            walked += len;
        }
        best.1
    }

    fn split_at(&self, distance: f64) -> Result<(Self, Self), NetworkError> {
        let distance = NetworkError::check_finite("split distance", distance)?;
        let total = self.length();
        if distance <= 0.0 || distance >= total {
            return Err(NetworkError::InvalidGeometry(format!(
                "split distance {distance} not strictly inside (0, {total})"
            )));
        }
        let mut head = vec![self.coords[0]];
        let mut walked = 0.0;
        for (i, (a, b, len)) in self.segments().enumerate() {
            if len > EPS && walked + len >= distance {
                let cut = Coordinate::lerp(a, b, (distance - walked) / len);
                head.push(cut);
                let mut tail = vec![cut];
                tail.extend_from_slice(&self.coords[i + 1..]);
                if tail.len() >= 2 && tail[0] == tail[1] {
                    tail.remove(0);
                }
                return Ok((Self::new(head)?, Self::new(tail)?));
            }
            head.push(*b);
            walked += len;
        }
        Err(NetworkError::InvalidGeometry(format!(
            "split distance {distance} not reached on line of length {total}"
        )))
    }

    fn reversed(&self) -> Self {
        let mut coords = self.coords.clone();
        coords.reverse();
        Self { coords }
    }

    fn concat(&self, other: &Self) -> Result<Self, NetworkError> {
        let mut coords = self.coords.clone();
        let skip = usize::from(self.end() == other.start());
        coords.extend_from_slice(&other.coords[skip..]);
        Self::new(coords)
    }
}
