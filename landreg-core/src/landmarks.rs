//! Ordered landmark containers

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An ordered sequence of landmarks.
///
/// Order is significant: the i-th landmark of a source set corresponds to the
/// i-th landmark of the matching target set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: Vec<Point3d>,
}

impl LandmarkSet {
    /// Create a new empty landmark set
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a landmark set from a vector of points
    pub fn from_points(points: Vec<Point3d>) -> Self {
        Self { points }
    }

    /// Get the number of landmarks
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the landmark set is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a landmark
    pub fn push(&mut self, point: Point3d) {
        self.points.push(point);
    }

    /// Get an iterator over the landmarks
    pub fn iter(&self) -> std::slice::Iter<'_, Point3d> {
        self.points.iter()
    }

    /// Borrow the landmarks as a slice
    pub fn as_slice(&self) -> &[Point3d] {
        &self.points
    }

    /// Arithmetic mean of the landmarks, `None` when the set is empty
    pub fn centroid(&self) -> Option<Point3d> {
        if self.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3d::zeros(), |acc, p| acc + p.coords);
        Some(Point3d::from(sum / self.len() as f64))
    }

    /// Landmarks expressed relative to `origin`
    pub fn centered_on(&self, origin: &Point3d) -> Vec<Vector3d> {
        self.points.iter().map(|p| p - origin).collect()
    }

    /// Sum of squared distances of the landmarks to their centroid
    pub fn spread(&self) -> f64 {
        match self.centroid() {
            Some(c) => self.points.iter().map(|p| (p - c).magnitude_squared()).sum(),
            None => 0.0,
        }
    }

    /// Largest absolute coordinate over all landmarks, zero for an empty set
    pub fn max_abs_coordinate(&self) -> f64 {
        self.points
            .iter()
            .flat_map(|p| p.coords.iter())
            .fold(0.0, |acc: f64, c| acc.max(c.abs()))
    }

    /// Whether every coordinate of every landmark is finite
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(is_finite_point)
    }

    /// Pair these landmarks index-wise with `targets`.
    ///
    /// Fails when the two sets differ in length.
    pub fn pair_with(&self, targets: &LandmarkSet) -> Result<Vec<PointCorrespondence>> {
        if self.len() != targets.len() {
            return Err(Error::InvalidInput(format!(
                "{} source landmarks but {} target landmarks",
                self.len(),
                targets.len()
            )));
        }
        Ok(self
            .points
            .iter()
            .zip(targets.points.iter())
            .enumerate()
            .map(|(index, (s, t))| PointCorrespondence::new(index, *s, *t))
            .collect())
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Point3d;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IntoIterator for LandmarkSet {
    type Item = Point3d;
    type IntoIter = std::vec::IntoIter<Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a LandmarkSet {
    type Item = &'a Point3d;
    type IntoIter = std::slice::Iter<'a, Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<Point3d> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl From<Vec<Point3d>> for LandmarkSet {
    fn from(points: Vec<Point3d>) -> Self {
        Self::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tetrahedron() -> LandmarkSet {
        LandmarkSet::from_points(vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
        ])
    }

    #[test]
    fn test_centroid() {
        let set = tetrahedron();
        let c = set.centroid().unwrap();
        assert_relative_eq!(c, Point3d::new(0.25, 0.25, 0.25));
        assert!(LandmarkSet::new().centroid().is_none());
    }

    #[test]
    fn test_spread() {
        let set = tetrahedron();
        // 3 * 0.25^2 for the origin, 0.75^2 + 2 * 0.25^2 for each unit point
        assert_relative_eq!(set.spread(), 0.1875 + 3.0 * 0.6875, epsilon = 1e-12);

        let collapsed: LandmarkSet =
            std::iter::repeat(Point3d::new(2.0, 2.0, 2.0)).take(4).collect();
        assert_eq!(collapsed.spread(), 0.0);
    }

    #[test]
    fn test_centered_on() {
        let set = tetrahedron();
        let centered = set.centered_on(&set.centroid().unwrap());
        let sum = centered.iter().fold(Vector3d::zeros(), |acc, v| acc + v);
        assert_relative_eq!(sum, Vector3d::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_pair_with() {
        let source = tetrahedron();
        let mut target = tetrahedron();
        let pairs = source.pair_with(&target).unwrap();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs[3].index, 3);
        assert_eq!(pairs[3].source, Point3d::new(0.0, 0.0, 1.0));

        target.push(Point3d::new(5.0, 5.0, 5.0));
        assert!(matches!(source.pair_with(&target), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_conversions() {
        let points = tetrahedron().points;
        let set = LandmarkSet::from(points.clone());
        assert_eq!(set.len(), 4);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), points);
    }

    #[test]
    fn test_max_abs_coordinate() {
        let mut set = tetrahedron();
        assert_eq!(set.max_abs_coordinate(), 1.0);
        set.push(Point3d::new(0.5, -7.5, 2.0));
        assert_eq!(set.max_abs_coordinate(), 7.5);
        assert_eq!(LandmarkSet::new().max_abs_coordinate(), 0.0);
    }

    #[test]
    fn test_is_finite() {
        let mut set = tetrahedron();
        assert!(set.is_finite());
        set.push(Point3d::new(f64::NAN, 0.0, 0.0));
        assert!(!set.is_finite());
    }
}
