//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};

use super::{Point3, Vector3};

/// Axis-aligned bounding box in physical space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox {
    /// Box that contains nothing. Growing it by any point yields that point.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing all `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.grow(p);
        }
        bounds
    }

    /// Returns true if no point has been added.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Extend the box to contain `p`.
    pub fn grow(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Edge lengths of the box.
    pub fn extent(&self) -> Vector3 {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    /// Index (0, 1, 2) of the axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        self.extent().imax()
    }

    /// Squared distance from `p` to the box, zero when `p` is inside.
    pub fn distance_squared(&self, p: &Point3) -> f64 {
        let mut d = 0.0;
        for axis in 0..3 {
            let v = p[axis];
            if v < self.min[axis] {
                d += (self.min[axis] - v).powi(2);
            } else if v > self.max[axis] {
                d += (v - self.max[axis]).powi(2);
            }
        }
        d
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let points = [Point3::new(1.0, -2.0, 0.5), Point3::new(-1.0, 3.0, 0.0)];
        let b = BoundingBox::from_points(&points);
        assert_eq!(b.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Point3::new(1.0, 3.0, 0.5));
        assert_eq!(b.longest_axis(), 1);
    }

    #[test]
    fn test_empty_box() {
        let b = BoundingBox::empty();
        assert!(b.is_empty());
        assert_eq!(b.extent(), Vector3::zeros());
    }

    #[test]
    fn test_distance_squared() {
        let b = BoundingBox {
            min: Point3::new(0.0, 0.0, 0.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        assert_eq!(b.distance_squared(&Point3::new(0.5, 0.5, 0.5)), 0.0);
        assert_eq!(b.distance_squared(&Point3::new(3.0, 0.5, 0.5)), 4.0);
        assert_eq!(b.distance_squared(&Point3::new(2.0, 2.0, 0.5)), 2.0);
    }
}
