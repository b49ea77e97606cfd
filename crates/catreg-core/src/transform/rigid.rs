//! Rigid transform implementation.
//!
//! This module provides a rigid transform (rotation + translation) with an
//! optional uniform scale: T(x) = s·R·x + t.

use nalgebra::{Rotation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use super::trait_::Transform;
use crate::spatial::{Matrix3, Matrix4, Point3, Vector3};

/// Rigid transform (unit quaternion rotation, translation, uniform scale).
///
/// Scale is 1 for a strictly rigid transform. The homogeneous form is
/// available through [`to_matrix`](Self::to_matrix) and
/// [`from_matrix`](Self::from_matrix).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    rotation: UnitQuaternion<f64>,
    translation: Vector3,
    scale: f64,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Create a new rigid transform without scaling.
    ///
    /// # Arguments
    /// * `rotation` - Rotation applied first
    /// * `translation` - Translation applied after the rotation
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3) -> Self {
        Self {
            rotation,
            translation,
            scale: 1.0,
        }
    }

    /// Create a similarity transform. `scale` must be positive.
    pub fn from_parts(rotation: UnitQuaternion<f64>, translation: Vector3, scale: f64) -> Self {
        debug_assert!(scale > 0.0, "scale must be positive, got {}", scale);
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Create an identity rigid transform (no rotation, no translation).
    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    /// Pure translation.
    pub fn from_translation(translation: Vector3) -> Self {
        Self::new(UnitQuaternion::identity(), translation)
    }

    /// Rotation of `angle` radians about `axis`, followed by `translation`.
    ///
    /// A zero axis yields no rotation.
    pub fn from_axis_angle(axis: &Vector3, angle: f64, translation: Vector3) -> Self {
        let rotation = match nalgebra::Unit::try_new(*axis, f64::EPSILON) {
            Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle),
            None => UnitQuaternion::identity(),
        };
        Self::new(rotation, translation)
    }

    /// Euler angles in radians, R = R_z(gamma) · R_y(beta) · R_x(alpha).
    pub fn from_euler_angles(alpha: f64, beta: f64, gamma: f64, translation: Vector3) -> Self {
        Self::new(UnitQuaternion::from_euler_angles(alpha, beta, gamma), translation)
    }

    /// Build from a rotation matrix. The matrix is re-orthonormalized.
    pub fn from_rotation_matrix(rotation: &Matrix3, translation: Vector3) -> Self {
        let rotation = Rotation3::from_matrix(rotation);
        Self::new(UnitQuaternion::from_rotation_matrix(&rotation), translation)
    }

    /// Decompose a 4×4 homogeneous matrix holding s·R and t.
    ///
    /// Returns `None` when the bottom row is not `[0, 0, 0, 1]`, the linear
    /// part is not a positive multiple of a rotation, or any entry is not
    /// finite.
    pub fn from_matrix(matrix: &Matrix4) -> Option<Self> {
        const TOLERANCE: f64 = 1e-6;

        if matrix.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let bottom = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)] - 1.0];
        if bottom.iter().any(|v| v.abs() > TOLERANCE) {
            return None;
        }

        let linear: Matrix3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let det = linear.determinant();
        if det <= 0.0 {
            return None;
        }
        let scale = det.cbrt();
        let rotation = linear / scale;
        if (rotation.transpose() * rotation - Matrix3::identity()).norm() > TOLERANCE {
            return None;
        }

        let translation: Vector3 = matrix.fixed_view::<3, 1>(0, 3).into_owned();
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation));
        Some(Self::from_parts(rotation, translation, scale))
    }

    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    pub fn rotation_matrix(&self) -> Matrix3 {
        self.rotation.to_rotation_matrix().into_inner()
    }

    pub fn translation(&self) -> &Vector3 {
        &self.translation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Rotation angle in radians, in `[0, π]`.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// 4×4 homogeneous matrix of this transform.
    pub fn to_matrix(&self) -> Matrix4 {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(self.rotation_matrix() * self.scale));
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &RigidTransform) -> RigidTransform {
        *next * *self
    }

    /// Exact inverse: x = R⁻¹·(y - t) / s.
    pub fn inverse(&self) -> RigidTransform {
        let rotation = self.rotation.inverse();
        let scale = 1.0 / self.scale;
        let translation = -(rotation * self.translation) * scale;
        Self::from_parts(rotation, translation, scale)
    }

    /// Returns true if rotation angle, translation norm and scale deviation
    /// are all below `tolerance`.
    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.rotation_angle() < tolerance
            && self.translation.norm() < tolerance
            && (self.scale - 1.0).abs() < tolerance
    }

    /// Largest displacement this transform and `other` produce on `points`
    /// relative to each other.
    pub fn max_point_deviation(&self, other: &RigidTransform, points: &[Point3]) -> f64 {
        points
            .iter()
            .map(|p| (self.transform_point(p) - other.transform_point(p)).norm())
            .fold(0.0, f64::max)
    }
}

impl std::ops::Mul for RigidTransform {
    type Output = RigidTransform;

    /// `a * b` applies `b` first, like the matrix product.
    fn mul(self, rhs: RigidTransform) -> RigidTransform {
        RigidTransform::from_parts(
            self.rotation * rhs.rotation,
            self.rotation * rhs.translation * self.scale + self.translation,
            self.scale * rhs.scale,
        )
    }
}

impl Transform for RigidTransform {
    fn transform_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.rotation * point.coords * self.scale + self.translation)
    }

    fn inverse_transform(&self) -> Option<Box<dyn Transform>> {
        Some(Box::new(self.inverse()))
    }
}
