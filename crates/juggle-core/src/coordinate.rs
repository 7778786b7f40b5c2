use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A point or vector in centimeters.
///
/// Whether the value is juggler-relative (local) or world (global) depends on
/// where it came from; the type does not track the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub const ZERO: Coordinate = Coordinate {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise maximum. Used to grow bounding boxes.
    #[must_use]
    pub fn max(self, other: Coordinate) -> Coordinate {
        Coordinate::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Coordinate) -> Coordinate {
        Coordinate::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    #[must_use]
    pub fn distance(self, other: Coordinate) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub fn dot(self, other: Coordinate) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(self, other: Coordinate) -> Coordinate {
        Coordinate::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Snap components whose magnitude is below `epsilon` to zero.
    #[must_use]
    pub fn truncate(self, epsilon: f64) -> Coordinate {
        let snap = |v: f64| if v.abs() < epsilon { 0.0 } else { v };
        Coordinate::new(snap(self.x), snap(self.y), snap(self.z))
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Linear interpolation, `frac = 0` gives `self`.
    #[must_use]
    pub fn lerp(self, other: Coordinate, frac: f64) -> Coordinate {
        self + (other - self) * frac
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Coordinate {
    fn add_assign(&mut self, rhs: Coordinate) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Coordinate {
    type Output = Coordinate;

    fn mul(self, rhs: f64) -> Coordinate {
        Coordinate::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;

    fn neg(self) -> Coordinate {
        Coordinate::new(-self.x, -self.y, -self.z)
    }
}

impl From<Vector3<f64>> for Coordinate {
    fn from(v: Vector3<f64>) -> Self {
        Coordinate::new(v.x, v.y, v.z)
    }
}

impl From<Coordinate> for Vector3<f64> {
    fn from(c: Coordinate) -> Self {
        Vector3::new(c.x, c.y, c.z)
    }
}
