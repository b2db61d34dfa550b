//! # landreg algorithms
//!
//! Numerical building blocks for landmark-based point-set registration:
//! a Jacobi eigensolver for small symmetric matrices, Horn's quaternion
//! formulation of absolute orientation, and the registration pipeline that
//! combines them.

pub mod eigen;
pub mod horn;
pub mod registration;

// Re-export commonly used items
pub use eigen::*;
pub use horn::*;
pub use registration::*;
