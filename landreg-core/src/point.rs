//! Point types and landmark correspondences

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A pair of landmarks sharing the same index in the source and target sequences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCorrespondence {
    /// Position of the pair in both landmark sequences
    pub index: usize,
    pub source: Point3d,
    pub target: Point3d,
}

impl PointCorrespondence {
    pub fn new(index: usize, source: Point3d, target: Point3d) -> Self {
        Self { index, source, target }
    }

    /// Distance between the two landmarks of the pair
    pub fn distance(&self) -> f64 {
        (self.target - self.source).magnitude()
    }
}

/// Check that every coordinate of a point is finite
pub fn is_finite_point(point: &Point3d) -> bool {
    point.coords.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_correspondence_distance() {
        let pair = PointCorrespondence::new(
            2,
            Point3d::new(1.0, 2.0, 3.0),
            Point3d::new(4.0, 6.0, 3.0),
        );
        assert_eq!(pair.index, 2);
        assert_relative_eq!(pair.distance(), 5.0);
    }

    #[test]
    fn test_is_finite_point() {
        assert!(is_finite_point(&Point3d::new(0.0, -1.0, 1e300)));
        assert!(!is_finite_point(&Point3d::new(f64::NAN, 0.0, 0.0)));
        assert!(!is_finite_point(&Point3d::new(0.0, f64::INFINITY, 0.0)));
    }
}
