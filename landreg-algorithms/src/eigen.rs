//! Eigen-decomposition of symmetric 4x4 matrices
//!
//! Cyclic Jacobi method: each sweep visits every off-diagonal pair `(p, q)`
//! once and applies the plane rotation that annihilates it. The accumulated
//! rotations form the eigenvector matrix. At this fixed size the method
//! converges in a handful of sweeps and is accurate to the last few ulps,
//! including for repeated eigenvalues.
//!
//! Eigenpairs are reported in diagonal index order, without sorting. Callers
//! that need "the largest" eigenpair should go through
//! [`SymmetricEigen4::dominant_index`], which resolves ties towards the lowest
//! index.

use landreg_core::{Error, Result};
use log::trace;
use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

/// Convergence settings for the Jacobi eigensolver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EigenConfig {
    /// Maximum number of full sweeps over the off-diagonal entries
    pub max_sweeps: usize,
    /// Off-diagonal Frobenius norm, relative to the norm of the input, at
    /// which the matrix is considered diagonal
    pub tolerance: f64,
}

impl Default for EigenConfig {
    fn default() -> Self {
        Self {
            max_sweeps: 64,
            tolerance: 1e-15,
        }
    }
}

/// Eigenvalues and eigenvectors of a symmetric 4x4 matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricEigen4 {
    /// Eigenvalues in solver order
    pub eigenvalues: Vector4<f64>,
    /// Unit eigenvectors stored column-wise, column `i` belongs to `eigenvalues[i]`
    pub eigenvectors: Matrix4<f64>,
    /// Number of sweeps performed
    pub sweeps: usize,
}

impl SymmetricEigen4 {
    /// Index of the algebraically largest eigenvalue; the first one wins on ties
    pub fn dominant_index(&self) -> usize {
        let mut best = 0;
        for i in 1..4 {
            if self.eigenvalues[i] > self.eigenvalues[best] {
                best = i;
            }
        }
        best
    }

    /// Largest eigenvalue and its eigenvector
    pub fn dominant(&self) -> (f64, Vector4<f64>) {
        let i = self.dominant_index();
        (self.eigenvalues[i], self.eigenvectors.column(i).into_owned())
    }

    /// Eigenvalues sorted in descending order
    pub fn sorted_eigenvalues(&self) -> [f64; 4] {
        let mut values: [f64; 4] = self.eigenvalues.into();
        values.sort_by(|a, b| b.total_cmp(a));
        values
    }

    /// Difference between the largest and the second largest eigenvalue,
    /// counting multiplicity (zero for a repeated maximum)
    pub fn dominant_gap(&self) -> f64 {
        let values = self.sorted_eigenvalues();
        values[0] - values[1]
    }
}

/// Decompose a symmetric matrix with the cyclic Jacobi method.
///
/// Fails with [`Error::InvalidInput`] for non-finite or non-symmetric input
/// and with [`Error::Algorithm`] when `config.max_sweeps` is exhausted.
pub fn jacobi_eigen(matrix: &Matrix4<f64>, config: &EigenConfig) -> Result<SymmetricEigen4> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput(
            "eigen-decomposition of a matrix with non-finite entries".to_string(),
        ));
    }

    let norm = matrix.norm();
    let asymmetry = (matrix - matrix.transpose()).norm();
    if asymmetry > 1e-12 * norm.max(1.0) {
        return Err(Error::InvalidInput(format!(
            "matrix is not symmetric (asymmetry {asymmetry:e})"
        )));
    }

    let mut a = *matrix;
    let mut v = Matrix4::<f64>::identity();
    let threshold = config.tolerance * norm;
    let mut sweeps = 0;

    loop {
        let off = off_diagonal_norm(&a);
        if off <= threshold {
            break;
        }
        if sweeps == config.max_sweeps {
            return Err(Error::Algorithm(format!(
                "Jacobi eigensolver did not converge in {} sweeps (off-diagonal norm {off:e})",
                config.max_sweeps
            )));
        }
        sweeps += 1;

        for p in 0..3 {
            for q in (p + 1)..4 {
                let apq = a[(p, q)];
                if apq == 0.0 {
                    continue;
                }
                // tan of the rotation angle, smaller root of t^2 + 2*theta*t - 1 = 0
                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                rotate(&mut a, &mut v, p, q, c, s);
            }
        }
        trace!("jacobi sweep {sweeps}: off-diagonal norm {:e}", off_diagonal_norm(&a));
    }

    Ok(SymmetricEigen4 {
        eigenvalues: a.diagonal(),
        eigenvectors: v,
        sweeps,
    })
}

/// Apply `A <- J^T A J` and `V <- V J` for the plane rotation `J` in `(p, q)`.
fn rotate(a: &mut Matrix4<f64>, v: &mut Matrix4<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..4 {
        let akp = a[(k, p)];
        let akq = a[(k, q)];
        a[(k, p)] = c * akp - s * akq;
        a[(k, q)] = s * akp + c * akq;
    }
    for k in 0..4 {
        let apk = a[(p, k)];
        let aqk = a[(q, k)];
        a[(p, k)] = c * apk - s * aqk;
        a[(q, k)] = s * apk + c * aqk;
    }
    // annihilated exactly by construction
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;

    for k in 0..4 {
        let vkp = v[(k, p)];
        let vkq = v[(k, q)];
        v[(k, p)] = c * vkp - s * vkq;
        v[(k, q)] = s * vkp + c * vkq;
    }
}

fn off_diagonal_norm(a: &Matrix4<f64>) -> f64 {
    let mut sum = 0.0;
    for p in 0..4 {
        for q in 0..4 {
            if p != q {
                sum += a[(p, q)] * a[(p, q)];
            }
        }
    }
    sum.sqrt()
}
