//! Landmark-based rigid and similarity registration
//!
//! Given two correspondence-ordered landmark sets, computes the rotation,
//! uniform scale and translation that best map the source landmarks onto the
//! target landmarks in the least-squares sense, together with RMS fitting
//! residuals for the rigid-body model (rotation + translation) and the
//! similarity model (rotation + uniform scale + translation).
//!
//! The transforms are expressed as
//!
//! ```text
//! rigid:      x -> R * (x + pre) + post
//! similarity: x -> s * R * (x + pre) + post
//! ```
//!
//! where `pre` is the negated source centroid and `post` the target centroid.

use crate::eigen::{jacobi_eigen, EigenConfig};
use crate::horn::{canonical_quaternion, cross_covariance, key_matrix, quaternion_to_rotation};
use landreg_core::{Error, Result};
use landreg_core::{LandmarkSet, Point3d, PointCorrespondence, Transform3D, Vector3d};
use log::{debug, warn};
use nalgebra::{
    Isometry3, Matrix3, Matrix4, Quaternion, Similarity3, Translation3, UnitQuaternion, Vector4,
};
use serde::{Deserialize, Serialize};

/// Configuration for landmark registration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Minimum number of landmark pairs accepted
    pub min_correspondences: usize,
    /// Centered source spread, in units of `n * (EPSILON * max |coordinate|)^2`,
    /// at or below which the source counts as a single point. The floor only
    /// depends on the coordinate resolution, so translating the landmarks far
    /// from the origin does not make a well-spread set degenerate.
    pub spread_tolerance: f64,
    /// Gap between the two largest key-matrix eigenvalues, relative to the
    /// norm of the key matrix, at or below which the rotation is ill-defined.
    /// `0.0` disables the check; ties then go to the first eigenpair in solver order.
    pub min_eigen_gap: f64,
    /// Eigensolver settings
    pub eigen: EigenConfig,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            min_correspondences: 3,
            spread_tolerance: 16.0,
            min_eigen_gap: 1e-9,
            eigen: EigenConfig::default(),
        }
    }
}

/// Outcome of a successful registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResult {
    rotation: Matrix3<f64>,
    scale: f64,
    pre_translation: Vector3d,
    post_translation: Vector3d,
    quaternion: Vector4<f64>,
    rigid_body_residual: f64,
    similarity_residual: f64,
    rigid_body_errors: Vec<f64>,
    similarity_errors: Vec<f64>,
    eigenvalues: [f64; 4],
}

impl RegistrationResult {
    /// Orthonormal rotation matrix (determinant +1)
    pub fn rotation(&self) -> Matrix3<f64> {
        self.rotation
    }

    /// Uniform scale factor of the similarity model
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Translation applied before rotating: the negated source centroid
    pub fn pre_translation(&self) -> Vector3d {
        self.pre_translation
    }

    /// Translation applied after rotating: the target centroid
    pub fn post_translation(&self) -> Vector3d {
        self.post_translation
    }

    /// Rotation as a unit `(w, x, y, z)` quaternion with `w >= 0`
    pub fn quaternion(&self) -> Vector4<f64> {
        self.quaternion
    }

    pub fn unit_quaternion(&self) -> UnitQuaternion<f64> {
        let q = &self.quaternion;
        UnitQuaternion::new_normalize(Quaternion::new(q[0], q[1], q[2], q[3]))
    }

    /// RMS distance between rigidly mapped source landmarks and their targets
    pub fn rigid_body_residual(&self) -> f64 {
        self.rigid_body_residual
    }

    /// RMS distance between similarity-mapped source landmarks and their targets
    pub fn similarity_residual(&self) -> f64 {
        self.similarity_residual
    }

    /// Per-landmark distances under the rigid-body model
    pub fn rigid_body_errors(&self) -> &[f64] {
        &self.rigid_body_errors
    }

    /// Per-landmark distances under the similarity model
    pub fn similarity_errors(&self) -> &[f64] {
        &self.similarity_errors
    }

    /// Key-matrix eigenvalues, largest first
    pub fn eigenvalues(&self) -> [f64; 4] {
        self.eigenvalues
    }

    /// Number of landmark pairs the result was computed from
    pub fn landmark_count(&self) -> usize {
        self.rigid_body_errors.len()
    }

    /// Homogeneous `[R | R * pre + post]` matrix
    pub fn rigid_body_matrix(&self) -> Matrix4<f64> {
        self.rigid_body_transform().matrix
    }

    /// Homogeneous `[s * R | s * R * pre + post]` matrix
    pub fn similarity_matrix(&self) -> Matrix4<f64> {
        self.similarity_transform().matrix
    }

    pub fn rigid_body_transform(&self) -> Transform3D {
        Transform3D::from_similarity_parts(
            &self.rotation,
            1.0,
            &self.pre_translation,
            &self.post_translation,
        )
    }

    pub fn similarity_transform(&self) -> Transform3D {
        Transform3D::from_similarity_parts(
            &self.rotation,
            self.scale,
            &self.pre_translation,
            &self.post_translation,
        )
    }

    /// Rigid-body transform as an [`Isometry3`]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let t = self.rotation * self.pre_translation + self.post_translation;
        Isometry3::from_parts(Translation3::from(t), self.unit_quaternion())
    }

    /// Similarity transform as a [`Similarity3`]
    pub fn to_similarity(&self) -> Similarity3<f64> {
        let t = self.rotation * self.pre_translation * self.scale + self.post_translation;
        Similarity3::from_parts(Translation3::from(t), self.unit_quaternion(), self.scale)
    }

    /// Map a source-frame point with the rigid-body model
    pub fn apply_rigid_body(&self, point: &Point3d) -> Point3d {
        Point3d::from(self.rotation * (point.coords + self.pre_translation) + self.post_translation)
    }

    /// Map a source-frame point with the similarity model
    pub fn apply_similarity(&self, point: &Point3d) -> Point3d {
        Point3d::from(
            self.rotation * (point.coords + self.pre_translation) * self.scale
                + self.post_translation,
        )
    }
}

/// Register `source` onto `target` with Horn's quaternion method.
///
/// The i-th source landmark is paired with the i-th target landmark. Fails with
/// [`Error::InvalidInput`] when the sets differ in length, hold fewer than
/// `config.min_correspondences` pairs or contain non-finite coordinates, and with
/// [`Error::DegenerateInput`] when the source has no spread or the rotation is
/// not uniquely determined (e.g. collinear landmarks).
pub fn register_landmarks(
    source: &LandmarkSet,
    target: &LandmarkSet,
    config: &RegistrationConfig,
) -> Result<RegistrationResult> {
    validate_landmarks(source, target, config)?;
    let n = source.len() as f64;

    let missing = || Error::InvalidInput("empty landmark set".to_string());
    let source_centroid = source.centroid().ok_or_else(missing)?;
    let target_centroid = target.centroid().ok_or_else(missing)?;
    let a = source.centered_on(&source_centroid);
    let b = target.centered_on(&target_centroid);

    let spread: f64 = a.iter().map(|v| v.magnitude_squared()).sum();
    let resolution = f64::EPSILON * source.max_abs_coordinate();
    if spread <= config.spread_tolerance * n * resolution * resolution {
        warn!("rejecting registration: source landmarks have no spread ({spread:e})");
        return Err(Error::DegenerateInput(
            "source landmarks coincide, scale is undefined".to_string(),
        ));
    }

    let n_matrix = key_matrix(&cross_covariance(&a, &b));
    let eig = jacobi_eigen(&n_matrix, &config.eigen)?;
    let eigenvalues = eig.sorted_eigenvalues();
    debug!("key matrix eigenvalues {eigenvalues:?} after {} sweeps", eig.sweeps);

    if config.min_eigen_gap > 0.0 {
        let gap = eig.dominant_gap();
        if gap <= config.min_eigen_gap * n_matrix.norm() {
            warn!("rejecting registration: eigen-gap {gap:e} too small, rotation is ambiguous");
            return Err(Error::DegenerateInput(
                "rotation is not uniquely determined (collinear or coincident landmarks)"
                    .to_string(),
            ));
        }
    }

    let (_, q) = eig.dominant();
    let quaternion = canonical_quaternion(q / q.norm());
    let rotation = quaternion_to_rotation(&quaternion)?;

    let rotated: Vec<Vector3d> = a.iter().map(|v| rotation * v).collect();
    let numerator: f64 = rotated.iter().zip(b.iter()).map(|(ra, b)| b.dot(ra)).sum();
    let scale = numerator / spread;
    if !(scale > 0.0 && scale.is_finite()) {
        warn!("rejecting registration: non-positive scale {scale}");
        return Err(Error::DegenerateInput(format!(
            "recovered scale {scale} is not positive"
        )));
    }

    let rigid_body_errors: Vec<f64> = rotated
        .iter()
        .zip(b.iter())
        .map(|(ra, b)| (ra - b).magnitude())
        .collect();
    let similarity_errors: Vec<f64> = rotated
        .iter()
        .zip(b.iter())
        .map(|(ra, b)| (ra * scale - b).magnitude())
        .collect();
    let rigid_body_residual = rms(&rigid_body_errors, n);
    let similarity_residual = rms(&similarity_errors, n);

    debug!(
        "registered {} landmarks: quaternion {:?}, scale {scale}, \
         rigid residual {rigid_body_residual:e}, similarity residual {similarity_residual:e}",
        source.len(),
        quaternion.as_slice()
    );

    Ok(RegistrationResult {
        rotation,
        scale,
        pre_translation: -source_centroid.coords,
        post_translation: target_centroid.coords,
        quaternion,
        rigid_body_residual,
        similarity_residual,
        rigid_body_errors,
        similarity_errors,
        eigenvalues,
    })
}

fn validate_landmarks(
    source: &LandmarkSet,
    target: &LandmarkSet,
    config: &RegistrationConfig,
) -> Result<()> {
    if source.len() != target.len() {
        return Err(Error::InvalidInput(format!(
            "{} source landmarks but {} target landmarks",
            source.len(),
            target.len()
        )));
    }
    if source.is_empty() {
        return Err(Error::InvalidInput("no landmarks to register".to_string()));
    }
    let required = config.min_correspondences.max(1);
    if source.len() < required {
        return Err(Error::InvalidInput(format!(
            "at least {required} landmark pairs required, got {}",
            source.len()
        )));
    }
    if !source.is_finite() || !target.is_finite() {
        return Err(Error::InvalidInput(
            "landmarks contain non-finite coordinates".to_string(),
        ));
    }
    Ok(())
}

fn rms(errors: &[f64], n: f64) -> f64 {
    (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt()
}

/// Stateful landmark registrar.
///
/// Source and target landmarks are set independently and may be replaced any
/// number of times; [`register`](Self::register) derives a new
/// [`RegistrationResult`] from the current landmarks. A failed registration
/// leaves the previous result untouched. Accessors fail with
/// [`Error::NotRegistered`] until the first successful registration.
///
/// Mutation goes through `&mut self`, so one instance has a single user at a
/// time; share it across threads behind a lock. Separate instances are fully
/// independent.
#[derive(Debug, Clone, Default)]
pub struct PointSetRegistrar {
    config: RegistrationConfig,
    source: LandmarkSet,
    target: LandmarkSet,
    result: Option<RegistrationResult>,
}

impl PointSetRegistrar {
    /// Create a registrar with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistrationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Replace the source landmarks
    pub fn set_source_landmarks<I: IntoIterator<Item = Point3d>>(&mut self, points: I) {
        self.source = points.into_iter().collect();
    }

    /// Replace the target landmarks
    pub fn set_target_landmarks<I: IntoIterator<Item = Point3d>>(&mut self, points: I) {
        self.target = points.into_iter().collect();
    }

    /// Replace both landmark sets from `(source, target)` pairs
    pub fn set_landmark_pairs<I: IntoIterator<Item = (Point3d, Point3d)>>(&mut self, pairs: I) {
        let (source, target): (Vec<Point3d>, Vec<Point3d>) = pairs.into_iter().unzip();
        self.source = LandmarkSet::from_points(source);
        self.target = LandmarkSet::from_points(target);
    }

    pub fn source_landmarks(&self) -> &LandmarkSet {
        &self.source
    }

    pub fn target_landmarks(&self) -> &LandmarkSet {
        &self.target
    }

    /// Current landmark pairs; fails when the two sets differ in length
    pub fn correspondences(&self) -> Result<Vec<PointCorrespondence>> {
        self.source.pair_with(&self.target)
    }

    /// Register the current landmarks and keep the result
    pub fn register(&mut self) -> Result<&RegistrationResult> {
        let result = register_landmarks(&self.source, &self.target, &self.config)?;
        Ok(&*self.result.insert(result))
    }

    pub fn is_registered(&self) -> bool {
        self.result.is_some()
    }

    /// Result of the most recent successful registration
    pub fn result(&self) -> Result<&RegistrationResult> {
        self.result.as_ref().ok_or(Error::NotRegistered)
    }

    pub fn rigid_body_matrix(&self) -> Result<Matrix4<f64>> {
        self.result().map(RegistrationResult::rigid_body_matrix)
    }

    pub fn similarity_matrix(&self) -> Result<Matrix4<f64>> {
        self.result().map(RegistrationResult::similarity_matrix)
    }

    pub fn rigid_body_residual(&self) -> Result<f64> {
        self.result().map(RegistrationResult::rigid_body_residual)
    }

    pub fn similarity_residual(&self) -> Result<f64> {
        self.result().map(RegistrationResult::similarity_residual)
    }

    pub fn rotation(&self) -> Result<Matrix3<f64>> {
        self.result().map(RegistrationResult::rotation)
    }

    pub fn scale(&self) -> Result<f64> {
        self.result().map(RegistrationResult::scale)
    }

    pub fn quaternion(&self) -> Result<Vector4<f64>> {
        self.result().map(RegistrationResult::quaternion)
    }

    pub fn pre_translation(&self) -> Result<Vector3d> {
        self.result().map(RegistrationResult::pre_translation)
    }

    pub fn post_translation(&self) -> Result<Vector3d> {
        self.result().map(RegistrationResult::post_translation)
    }
}
