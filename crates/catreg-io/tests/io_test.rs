use catreg_core::{CatheterSet, Point3, RigidTransform, SurfaceMesh, Vector3};
use catreg_io::{
    list_catheter_files, read_catheter_folder, read_histogram_csv, read_obj, read_transform_json,
    write_catheter_folder, write_histogram_csv, write_obj, write_report_json, write_transform_json,
};
use catreg_registration::{CatheterRegistration, DistanceHistogram, PipelineConfig};
use std::fs;

fn tetra(offset: f64) -> SurfaceMesh {
    SurfaceMesh::new(
        vec![
            Point3::new(offset, 0.0, 0.0),
            Point3::new(offset + 1.25, 0.0, 0.0),
            Point3::new(offset, 1.0 / 3.0, 0.0),
            Point3::new(offset, 0.0, -2.5e-7),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
    .unwrap()
}

#[test]
fn test_obj_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = tetra(0.1);

    for name in ["mesh.obj", "mesh.obj.gz"] {
        let path = dir.path().join(name);
        write_obj(&path, &mesh).unwrap();
        let back = read_obj(&path).unwrap();
        assert_eq!(back, mesh, "round trip through {}", name);
    }
}

#[test]
fn test_missing_file_has_context() {
    let err = read_obj("/definitely/not/here.obj").unwrap_err();
    assert!(err.to_string().contains("Failed to open mesh file"));
}

#[test]
fn test_catheter_folder_order() {
    let dir = tempfile::tempdir().unwrap();
    let set = CatheterSet::new("phantom")
        .with_catheter("Catheter_2", tetra(2.0))
        .with_catheter("Catheter_1", tetra(1.0))
        .with_catheter("Catheter_3", tetra(3.0));
    write_catheter_folder(dir.path(), &set).unwrap();
    fs::write(dir.path().join("README.txt"), "not a mesh").unwrap();
    fs::create_dir(dir.path().join("nested.obj")).unwrap();

    let files = list_catheter_files(dir.path()).unwrap();
    assert_eq!(files.len(), 3);

    let read = read_catheter_folder(dir.path(), "Reconstructed").unwrap();
    assert_eq!(read.name(), "Reconstructed");
    let names: Vec<&str> = read.catheters().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Catheter_1", "Catheter_2", "Catheter_3"]);
    assert_eq!(read.get("Catheter_2").unwrap().mesh, tetra(2.0));
}

#[test]
fn test_not_a_directory() {
    let file = tempfile::NamedTempFile::new().unwrap();
    assert!(read_catheter_folder(file.path(), "x").is_err());
}

#[test]
fn test_histogram_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("histogram.csv");
    let histogram = DistanceHistogram::from_distances(&[0.0, 0.5, 1.0, 2.0], 4).unwrap();
    write_histogram_csv(&path, &histogram).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Bin lower,Bin upper,Frequencies\n"));

    let rows = read_histogram_csv(&path).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], (0.0, 0.5, 1.0));
    assert_eq!(rows[3], (1.5, 2.0, 1.0));
    assert_eq!(rows.iter().map(|r| r.2).sum::<f64>(), 4.0);
}

#[test]
fn test_transform_json_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transform.json");
    let transform = RigidTransform::from_euler_angles(0.1, 0.2, 0.3, Vector3::new(-5.0, 1.0, 2.0));
    write_transform_json(&path, &transform).unwrap();

    let back = read_transform_json(&path).unwrap();
    let probe = [Point3::new(1.0, 2.0, 3.0), Point3::new(-7.0, 0.0, 4.0)];
    assert!(back.max_point_deviation(&transform, &probe) < 1e-9);
}

#[test]
fn test_report_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let set = CatheterSet::from_meshes("set", vec![tetra(0.0), tetra(4.0)]);
    let report = CatheterRegistration::new(PipelineConfig::new().with_histogram_bins(5))
        .run(&set, &set)
        .unwrap();
    write_report_json(&path, &report).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["catheter_count"], 2);
    assert_eq!(value["histogram"]["bins"].as_array().unwrap().len(), 5);
    assert_eq!(value["transform_matrix"]["matrix"][3][3], 1.0);
}
