//! Core data structures and traits for landreg
//!
//! This crate provides the fundamental types shared by the landmark registration
//! algorithms: points, ordered landmark sets, correspondences, homogeneous
//! transforms and the common error type.

pub mod point;
pub mod landmarks;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use landmarks::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Vector4, Isometry3, Similarity3, UnitQuaternion};
