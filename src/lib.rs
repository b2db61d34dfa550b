//! # landreg
//!
//! Landmark-based rigid and similarity point-set registration for Rust.
//!
//! This is the umbrella crate that provides convenient access to all landreg functionality.
//! You can use this crate to get everything in one place, or use individual crates for
//! more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Points, ordered landmark sets, correspondences and homogeneous transforms
//! - **Algorithms**: Horn's closed-form absolute orientation with a Jacobi eigensolver
//!
//! ## Quick Start
//!
//! ```rust
//! use landreg::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let source = vec![
//!     Point3d::new(0.0, 0.0, 0.0),
//!     Point3d::new(1.0, 0.0, 0.0),
//!     Point3d::new(0.0, 1.0, 0.0),
//!     Point3d::new(0.0, 0.0, 1.0),
//! ];
//! // quarter turn about z, then shifted along x
//! let target: Vec<Point3d> = source
//!     .iter()
//!     .map(|p| Point3d::new(5.0 - p.y, p.x, p.z))
//!     .collect();
//!
//! let mut registrar = PointSetRegistrar::new();
//! registrar.set_source_landmarks(source);
//! registrar.set_target_landmarks(target);
//! registrar.register()?;
//!
//! let matrix = registrar.rigid_body_matrix()?;
//! assert!((matrix[(0, 3)] - 5.0).abs() < 1e-9);
//! assert!(registrar.rigid_body_residual()? < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core and algorithms
//! - `algorithms`: Registration algorithms

// Re-export core functionality
pub use landreg_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use landreg_algorithms as algorithms;

/// Convenient imports for common use cases
pub mod prelude {
    pub use landreg_core::*;

    #[cfg(feature = "algorithms")]
    pub use landreg_algorithms::*;
}
