//! Closed-form absolute orientation with unit quaternions (Horn, 1987)
//!
//! The rotation that best maps centered source landmarks `a_i` onto centered
//! target landmarks `b_i` is the unit quaternion maximising
//! `sum_i b_i . (q a_i q*)`. That quadratic form in `q` is represented by the
//! symmetric, traceless 4x4 key matrix built here from the 3x3
//! cross-covariance, and its maximiser is the eigenvector of the largest
//! eigenvalue.

use landreg_core::{Error, Result, Vector3d};
use nalgebra::{Matrix3, Matrix4, Vector4};

/// Cross-covariance `M = sum_i a_i * b_i^T`, i.e. `M[(i, j)] = sum a[i] * b[j]`.
///
/// Both slices must hold centered coordinates of the same length.
pub fn cross_covariance(source: &[Vector3d], target: &[Vector3d]) -> Matrix3<f64> {
    source
        .iter()
        .zip(target.iter())
        .fold(Matrix3::zeros(), |acc, (a, b)| acc + a * b.transpose())
}

/// Symmetric key matrix `N` whose dominant eigenvector is the optimal rotation
/// as a `(w, x, y, z)` quaternion.
pub fn key_matrix(m: &Matrix3<f64>) -> Matrix4<f64> {
    let (sxx, sxy, sxz) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (syx, syy, syz) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (szx, szy, szz) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);

    #[rustfmt::skip]
    let n = Matrix4::new(
        sxx + syy + szz, syz - szy,        szx - sxz,        sxy - syx,
        syz - szy,       sxx - syy - szz,  sxy + syx,        szx + sxz,
        szx - sxz,       sxy + syx,       -sxx + syy - szz,  syz + szy,
        sxy - syx,       szx + sxz,        syz + szy,       -sxx - syy + szz,
    );
    n
}

/// Rotation matrix of the quaternion `(w, x, y, z)`.
///
/// The quaternion is normalised first; a zero quaternion is rejected.
pub fn quaternion_to_rotation(q: &Vector4<f64>) -> Result<Matrix3<f64>> {
    let norm = q.norm();
    if !(norm > 0.0 && norm.is_finite()) {
        return Err(Error::DegenerateInput(
            "quaternion has zero or non-finite norm".to_string(),
        ));
    }
    let q = q / norm;
    let (w, x, y, z) = (q[0], q[1], q[2], q[3]);

    #[rustfmt::skip]
    let r = Matrix3::new(
        w * w + x * x - y * y - z * z, 2.0 * (x * y - w * z),         2.0 * (x * z + w * y),
        2.0 * (y * x + w * z),         w * w - x * x + y * y - z * z, 2.0 * (y * z - w * x),
        2.0 * (z * x - w * y),         2.0 * (z * y + w * x),         w * w - x * x - y * y + z * z,
    );
    Ok(r)
}

/// Flip a quaternion into the hemisphere `w >= 0`; `q` and `-q` encode the same rotation.
pub fn canonical_quaternion(q: Vector4<f64>) -> Vector4<f64> {
    if q[0] < 0.0 {
        -q
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eigen::{jacobi_eigen, EigenConfig};
    use approx::assert_relative_eq;
    use nalgebra::{Quaternion, UnitQuaternion};

    fn sample_points() -> Vec<Vector3d> {
        let raw = [
            Vector3d::new(1.0, 0.0, -0.5),
            Vector3d::new(-0.3, 2.0, 0.1),
            Vector3d::new(0.4, -1.2, 1.5),
            Vector3d::new(-1.1, -0.8, -1.1),
        ];
        let mean = raw.iter().fold(Vector3d::zeros(), |acc, v| acc + v) / raw.len() as f64;
        raw.iter().map(|v| v - mean).collect()
    }

    #[test]
    fn test_cross_covariance_convention() {
        let a = vec![Vector3d::new(1.0, 0.0, 0.0)];
        let b = vec![Vector3d::new(0.0, 2.0, 0.0)];
        let m = cross_covariance(&a, &b);
        assert_eq!(m[(0, 1)], 2.0);
        assert_eq!(m[(1, 0)], 0.0);
    }

    #[test]
    fn test_key_matrix_layout() {
        let m = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        let n = key_matrix(&m);
        assert_eq!(n, n.transpose());
        assert_eq!(n.trace(), 0.0);
        assert_eq!(n[(0, 0)], 15.0);
        assert_eq!(n[(1, 1)], 1.0 - 5.0 - 9.0);
        assert_eq!(n[(0, 1)], 6.0 - 8.0);
        assert_eq!(n[(0, 2)], 7.0 - 3.0);
        assert_eq!(n[(0, 3)], 2.0 - 4.0);
        assert_eq!(n[(1, 2)], 2.0 + 4.0);
        assert_eq!(n[(1, 3)], 7.0 + 3.0);
        assert_eq!(n[(2, 3)], 6.0 + 8.0);
    }

    #[test]
    fn test_quaternion_to_rotation_matches_nalgebra() {
        let q = UnitQuaternion::from_euler_angles(0.2, -1.3, 2.4);
        let v = Vector4::new(q.w, q.i, q.j, q.k);
        let r = quaternion_to_rotation(&v).unwrap();
        assert_relative_eq!(r, *q.to_rotation_matrix().matrix(), epsilon = 1e-12);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);

        // scaling the quaternion does not change the rotation
        let r_scaled = quaternion_to_rotation(&(v * 3.0)).unwrap();
        assert_relative_eq!(r, r_scaled, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_quaternion_rejected() {
        assert!(matches!(
            quaternion_to_rotation(&Vector4::zeros()),
            Err(Error::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_dominant_eigenvector_recovers_rotation() {
        let truth = UnitQuaternion::new_normalize(Quaternion::new(0.8, -0.2, 0.5, 0.3));
        let a = sample_points();
        let b: Vec<Vector3d> = a.iter().map(|v| truth * v).collect();

        let n = key_matrix(&cross_covariance(&a, &b));
        let eig = jacobi_eigen(&n, &EigenConfig::default()).unwrap();
        let (_, q) = eig.dominant();
        let q = canonical_quaternion(q);
        assert_relative_eq!(q, Vector4::new(truth.w, truth.i, truth.j, truth.k), epsilon = 1e-10);
    }

    #[test]
    fn test_canonical_quaternion() {
        let q = Vector4::new(-0.5, 0.5, 0.5, 0.5);
        assert_eq!(canonical_quaternion(q), Vector4::new(0.5, -0.5, -0.5, -0.5));
        assert_eq!(canonical_quaternion(-q), -q);
    }
}
