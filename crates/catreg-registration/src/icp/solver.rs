//! Closed-form rigid fit between paired point sets.

use catreg_core::spatial::{self, Matrix3, Point3, Vector3};
use catreg_core::RigidTransform;
use nalgebra::UnitQuaternion;

use crate::error::{RegistrationError, Result};

/// Relative singular value below which the cross-covariance counts as rank deficient.
const RANK_TOLERANCE: f64 = 1e-10;

/// Outcome of [`fit_rigid`].
#[derive(Debug, Clone, Copy)]
pub struct RigidFit {
    /// Transform mapping `source` onto `target`.
    pub transform: RigidTransform,
    /// True when the pairs could not determine a rotation.
    pub translation_only: bool,
}

/// Least-squares similarity mapping `source[i]` onto `target[i]` (Kabsch/Umeyama).
///
/// Both sets are centered, the cross-covariance is decomposed by SVD and a
/// reflection is replaced by the nearest proper rotation. With fewer than three
/// non-collinear pairs the rotation is left at identity and only the centroid
/// offset is fitted.
pub fn fit_rigid(source: &[Point3], target: &[Point3], estimate_scale: bool) -> Result<RigidFit> {
    if source.len() != target.len() {
        return Err(RegistrationError::invalid_parameter(format!(
            "Point pair count mismatch: {} source vs {} target",
            source.len(),
            target.len()
        )));
    }
    let (Some(source_center), Some(target_center)) = (spatial::centroid(source), spatial::centroid(target))
    else {
        return Err(RegistrationError::degenerate_input("no point pairs to fit"));
    };

    let mut covariance = Matrix3::zeros();
    let mut source_variance = 0.0;
    for (s, t) in source.iter().zip(target) {
        let s = s - source_center;
        let t = t - target_center;
        covariance += s * t.transpose();
        source_variance += s.norm_squared();
    }

    let svd = covariance.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(RegistrationError::numerical_instability(
            "SVD of the cross-covariance did not converge",
        ));
    };
    let sigma = svd.singular_values;

    let mut sorted = [sigma[0], sigma[1], sigma[2]];
    sorted.sort_by(|a, b| b.total_cmp(a));
    let rank_deficient =
        source.len() < 3 || sorted[0] <= f64::EPSILON || sorted[1] <= RANK_TOLERANCE * sorted[0];

    if rank_deficient {
        let translation = target_center - source_center;
        return Ok(RigidFit {
            transform: RigidTransform::from_translation(translation),
            translation_only: true,
        });
    }

    let v = v_t.transpose();
    let mut correction = Vector3::repeat(1.0);
    let smallest = sigma.imin();
    if (v * u.transpose()).determinant() < 0.0 {
        correction[smallest] = -1.0;
    }
    let rotation = v * Matrix3::from_diagonal(&correction) * u.transpose();

    let scale = if estimate_scale && source_variance > f64::EPSILON {
        sigma.dot(&correction) / source_variance
    } else {
        1.0
    };
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RegistrationError::numerical_instability(format!(
            "Estimated scale {} is not positive",
            scale
        )));
    }

    let rotation = UnitQuaternion::from_matrix(&rotation);
    let translation = target_center.coords - rotation * source_center.coords * scale;
    if !translation.iter().all(|v| v.is_finite()) {
        return Err(RegistrationError::numerical_instability(
            "Fitted translation is not finite",
        ));
    }

    Ok(RigidFit {
        transform: RigidTransform::from_parts(rotation, translation, scale),
        translation_only: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catreg_core::Transform;

    fn cloud() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 3.0, 2.0),
        ]
    }

    #[test]
    fn test_recovers_rotation_and_translation() {
        let truth = RigidTransform::from_euler_angles(0.3, -0.5, 1.2, Vector3::new(3.0, -1.0, 7.0));
        let source = cloud();
        let target = truth.transform_points(&source);

        let fit = fit_rigid(&source, &target, false).unwrap();
        assert!(!fit.translation_only);
        assert!(fit.transform.max_point_deviation(&truth, &source) < 1e-9);
    }

    #[test]
    fn test_never_returns_reflection() {
        let source = cloud();
        let mirrored: Vec<Point3> = source.iter().map(|p| Point3::new(-p.x, p.y, p.z)).collect();

        let fit = fit_rigid(&source, &mirrored, false).unwrap();
        assert!((fit.transform.rotation_matrix().determinant() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_estimate() {
        let truth = RigidTransform::from_parts(
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
            Vector3::new(1.0, 2.0, 3.0),
            1.25,
        );
        let source = cloud();
        let target = truth.transform_points(&source);

        let fit = fit_rigid(&source, &target, true).unwrap();
        assert!((fit.transform.scale() - 1.25).abs() < 1e-9);
        assert!(fit.transform.max_point_deviation(&truth, &source) < 1e-9);
    }

    #[test]
    fn test_collinear_pairs_fit_translation_only() {
        let source = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let target: Vec<Point3> = source.iter().map(|p| p + Vector3::new(0.0, 5.0, 0.0)).collect();

        let fit = fit_rigid(&source, &target, false).unwrap();
        assert!(fit.translation_only);
        assert!((fit.transform.translation() - Vector3::new(0.0, 5.0, 0.0)).norm() < 1e-12);
        assert!(fit.transform.rotation_angle() < 1e-12);
    }

    #[test]
    fn test_empty_pairs() {
        assert!(matches!(
            fit_rigid(&[], &[], false),
            Err(RegistrationError::DegenerateInput(_))
        ));
    }
}
