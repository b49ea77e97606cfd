use catreg_core::{Point3, RigidTransform, SurfaceMesh, Transform, Vector3};
use catreg_registration::{
    analyze, Confidence, CorrespondenceMetric, HistoryCallback, IcpConfig, IcpRegistration, ProgressTracker,
    RegistrationError, RegistrationWarning,
};
use std::sync::Arc;
use std::time::Duration;

/// Unit cube, 8 points and 12 outward-facing triangles.
fn unit_cube() -> SurfaceMesh {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let triangles = vec![
        [0, 2, 1], [0, 3, 2], // bottom
        [4, 5, 6], [4, 6, 7], // top
        [0, 1, 5], [0, 5, 4], // front
        [2, 3, 7], [2, 7, 6], // back
        [0, 4, 7], [0, 7, 3], // left
        [1, 2, 6], [1, 6, 5], // right
    ];
    SurfaceMesh::new(points, triangles).unwrap()
}

/// Open tube around a bent centerline, `rings` x `sides` points.
fn bent_tube(rings: usize, sides: usize, radius: f64) -> SurfaceMesh {
    let mut points = Vec::with_capacity(rings * sides);
    for i in 0..rings {
        let s = i as f64 / (rings - 1) as f64;
        let center = Vector3::new(30.0 * s, 12.0 * s * s, 6.0 * (2.0 * s).sin());
        let tangent = Vector3::new(30.0, 24.0 * s, 12.0 * (2.0 * s).cos()).normalize();
        let normal = tangent.cross(&Vector3::z()).normalize();
        let binormal = tangent.cross(&normal);
        for j in 0..sides {
            let phi = 2.0 * std::f64::consts::PI * j as f64 / sides as f64;
            points.push(Point3::from(center + radius * (phi.cos() * normal + phi.sin() * binormal)));
        }
    }
    let mut triangles = Vec::new();
    for i in 0..rings - 1 {
        for j in 0..sides {
            let a = i * sides + j;
            let b = i * sides + (j + 1) % sides;
            triangles.push([a, b, a + sides]);
            triangles.push([b, b + sides, a + sides]);
        }
    }
    SurfaceMesh::new(points, triangles).unwrap()
}

#[test]
fn test_cube_translation_is_recovered() {
    let cube = unit_cube();
    let shifted = cube.transformed(&RigidTransform::from_translation(Vector3::new(5.0, 0.0, 0.0)));

    let engine = IcpRegistration::new(IcpConfig::new().with_convergence_threshold(1e-14));
    let result = engine.register(&shifted, &cube, None).unwrap();

    let translation = result.transform.translation();
    assert!((translation - Vector3::new(-5.0, 0.0, 0.0)).norm() < 1e-3, "got {:?}", translation);
    assert!(result.transform.rotation_angle() < 1e-6);
    assert_eq!(result.confidence, Confidence::Full);

    let histogram = analyze(&cube, &shifted, &result.transform, 10).unwrap();
    assert!(histogram.mean_distance < 1e-3);
    assert!(histogram.maximum_hausdorff < 1e-3);
    assert_eq!(histogram.total_frequency(), 8);
}

#[test]
fn test_mse_history_never_increases_past_best() {
    let cube = unit_cube();
    let shifted = cube.transformed(&RigidTransform::from_translation(Vector3::new(5.0, 0.0, 0.0)));
    let result = IcpRegistration::default().register(&shifted, &cube, None).unwrap();

    let best = result.mse_history.iter().copied().fold(f64::INFINITY, f64::min);
    assert_eq!(result.mse, best);
    assert_eq!(result.mse_history.len(), result.iterations + 1);
}

#[test]
fn test_known_transform_point_to_point() {
    let fixed = bent_tube(40, 12, 1.0);
    let truth = RigidTransform::from_euler_angles(0.002, -0.001, 0.002, Vector3::new(0.05, -0.04, 0.03));
    let moving = fixed.transformed(&truth);

    let engine = IcpRegistration::new(IcpConfig::new().with_metric(CorrespondenceMetric::PointToPoint));
    let result = engine.register(&moving, &fixed, None).unwrap();

    assert!(result.converged);
    // Recovered transform undoes the perturbation on every vertex.
    let aligned = result.transform * truth;
    assert!(aligned.max_point_deviation(&RigidTransform::identity(), fixed.points()) < 1e-6);
}

/// Flat `n` x `n` grid on the plane x = 0 with unit spacing.
fn planar_grid(n: usize) -> SurfaceMesh {
    let points = (0..n * n)
        .map(|i| Point3::new(0.0, (i % n) as f64, (i / n) as f64))
        .collect();
    let mut triangles = Vec::new();
    for row in 0..n - 1 {
        for col in 0..n - 1 {
            let a = row * n + col;
            triangles.push([a, a + 1, a + n]);
            triangles.push([a + 1, a + n + 1, a + n]);
        }
    }
    SurfaceMesh::new(points, triangles).unwrap()
}

#[test]
fn test_point_to_point_on_planar_grid() {
    // Every point shares x = 0, which overflows a single k-d tree bucket.
    let fixed = planar_grid(8);
    let shift = Vector3::new(0.1, 0.1, 0.1);
    let moving = fixed.transformed(&RigidTransform::from_translation(shift));

    let engine = IcpRegistration::new(IcpConfig::new().with_metric(CorrespondenceMetric::PointToPoint));
    let result = engine.register(&moving, &fixed, None).unwrap();

    assert!(result.mse < 1e-12);
    let undo = RigidTransform::from_translation(-shift);
    assert!(result.transform.max_point_deviation(&undo, moving.points()) < 1e-9);
}

#[test]
fn test_initial_guess_is_composed() {
    let fixed = bent_tube(30, 10, 1.0);
    let truth = RigidTransform::from_euler_angles(0.0, 0.0, 0.4, Vector3::new(4.0, -2.0, 1.0));
    let moving = fixed.transformed(&truth);

    // Start close to the answer so nearest neighbours are already right.
    let guess = RigidTransform::from_euler_angles(0.0, 0.0, -0.398, Vector3::zeros())
        * RigidTransform::from_translation(Vector3::new(-4.0, 2.0, -1.0));
    let engine = IcpRegistration::new(IcpConfig::new().with_metric(CorrespondenceMetric::PointToPoint));
    let result = engine.register(&moving, &fixed, Some(&guess)).unwrap();

    let p = moving.points()[17];
    let q = fixed.points()[17];
    assert!((result.transform.transform_point(&p) - q).norm() < 1e-6);
}

#[test]
fn test_point_to_surface_reduces_distance() {
    let fixed = bent_tube(40, 16, 1.0);
    let truth = RigidTransform::from_euler_angles(0.005, 0.003, -0.006, Vector3::new(0.1, -0.08, 0.05));
    let moving = fixed.transformed(&truth);

    let before = analyze(&fixed, &moving, &RigidTransform::identity(), 20).unwrap();
    let engine = IcpRegistration::new(IcpConfig::new().with_max_iterations(200));
    let result = engine.register(&moving, &fixed, None).unwrap();
    let after = analyze(&fixed, &moving, &result.transform, 20).unwrap();

    assert!(after.mean_distance < 0.2 * before.mean_distance);
}

#[test]
fn test_progress_reports_each_iteration() {
    let cube = unit_cube();
    let shifted = cube.transformed(&RigidTransform::from_translation(Vector3::new(0.5, 0.25, 0.0)));
    let history = Arc::new(HistoryCallback::new());
    let engine = IcpRegistration::new(IcpConfig::new()).with_progress(ProgressTracker::new().with_callback(history.clone()));

    let result = engine.register(&shifted, &cube, None).unwrap();
    assert_eq!(history.get_history().len(), result.iterations);
    assert_eq!(history.mse_values(), result.mse_history[1..].to_vec());
}

#[test]
fn test_progress_carries_correspondence_metrics() {
    let fixed = bent_tube(20, 8, 1.0);
    let moving = fixed.transformed(&RigidTransform::from_translation(Vector3::new(0.05, 0.0, 0.0)));
    // One stray point well outside the distance limit.
    let moving = SurfaceMesh::new(
        moving.points().iter().chain([Point3::new(100.0, 100.0, 100.0)].iter()).copied().collect(),
        moving.triangles().to_vec(),
    )
    .unwrap();
    let history = Arc::new(HistoryCallback::new());
    let engine = IcpRegistration::new(IcpConfig::new().with_max_correspondence_distance(5.0))
        .with_progress(ProgressTracker::new().with_callback(history.clone()));

    engine.register(&moving, &fixed, None).unwrap();
    let history = history.get_history();
    assert!(!history.is_empty());
    for info in &history {
        let metric = |name: &str| info.metrics.iter().find(|(n, _)| n == name).map(|&(_, v)| v).unwrap();
        assert_eq!(metric("correspondences"), 160.0);
        assert_eq!(metric("rejected"), 1.0);
        assert!((metric("fitness") - 160.0 / 161.0).abs() < 1e-12);
    }
}

#[test]
fn test_iteration_cap_warns() {
    let cube = unit_cube();
    let shifted = cube.transformed(&RigidTransform::from_translation(Vector3::new(5.0, 0.0, 0.0)));
    let engine = IcpRegistration::new(IcpConfig::new().with_max_iterations(2).with_convergence_threshold(0.0));
    let result = engine.register(&shifted, &cube, None).unwrap();

    assert!(!result.converged);
    assert_eq!(result.iterations, 2);
    assert!(matches!(
        result.warnings.as_slice(),
        [RegistrationWarning::ConvergenceWarning { iterations: 2, .. }]
    ));
}

#[test]
fn test_time_budget_warns() {
    let cube = unit_cube();
    let shifted = cube.transformed(&RigidTransform::from_translation(Vector3::new(5.0, 0.0, 0.0)));
    let engine = IcpRegistration::new(IcpConfig::new().with_max_duration(Duration::from_nanos(1)));
    let result = engine.register(&shifted, &cube, None).unwrap();

    assert!(!result.converged);
    assert!(result
        .warnings
        .iter()
        .any(|w| matches!(w, RegistrationWarning::TimeBudgetExhausted { .. })));
    assert!(!result
        .warnings
        .iter()
        .any(|w| matches!(w, RegistrationWarning::ConvergenceWarning { .. })));
}

#[test]
fn test_degenerate_inputs() {
    let cube = unit_cube();
    let engine = IcpRegistration::default();

    let err = engine.register(&SurfaceMesh::empty(), &cube, None).unwrap_err();
    assert!(matches!(err, RegistrationError::DegenerateInput(_)));

    let err = engine.register(&cube, &SurfaceMesh::empty(), None).unwrap_err();
    assert!(matches!(err, RegistrationError::DegenerateInput(_)));

    let err = analyze(&SurfaceMesh::from_points(cube.points().to_vec()), &cube, &RigidTransform::identity(), 10)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DegenerateInput(_)));
}

#[test]
fn test_parallel_and_sequential_agree() {
    let fixed = bent_tube(20, 8, 1.0);
    let moving = fixed.transformed(&RigidTransform::from_translation(Vector3::new(0.2, 0.1, 0.0)));

    let parallel = IcpRegistration::new(IcpConfig::new()).register(&moving, &fixed, None).unwrap();
    let sequential = IcpRegistration::new(IcpConfig::new().with_parallel(false))
        .register(&moving, &fixed, None)
        .unwrap();

    assert_eq!(parallel.iterations, sequential.iterations);
    assert_eq!(parallel.transform, sequential.transform);
}
