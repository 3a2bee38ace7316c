//! Planar coordinates
//!
//! Every coordinate in localkrige is stored, indexed and queried as
//! `(x, y)`: x is the first axis (easting / longitude), y the second
//! (northing / latitude). Using named fields instead of positional pairs
//! keeps that order explicit at every call site.

use std::fmt;

/// A 2D location.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another coordinate
    #[inline]
    pub fn dist_sq(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another coordinate
    #[inline]
    pub fn dist(&self, other: &Coordinate) -> f64 {
        self.dist_sq(other).sqrt()
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
