//! Core traits for landreg

use crate::{landmarks::LandmarkSet, point::Point3d, transform::Transform3D};

/// Trait for objects that can be transformed
pub trait Transformable {
    /// Apply a transformation to the object
    fn transform(&mut self, transform: &Transform3D);
}

impl Transformable for Point3d {
    fn transform(&mut self, transform: &Transform3D) {
        *self = transform.transform_point(self);
    }
}

impl Transformable for LandmarkSet {
    fn transform(&mut self, transform: &Transform3D) {
        for point in &mut self.points {
            point.transform(transform);
        }
    }
}
