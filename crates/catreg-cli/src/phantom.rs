//! Synthetic catheter phantoms for trying the registration end to end.
//!
//! Each catheter is a closed tube swept along a smooth curve. The segmented
//! side holds the tubes as generated. The reconstructed side holds the same
//! tubes displaced by a known rigid misalignment.

use anyhow::{bail, Result};
use catreg_core::spatial::{self, Point3, Vector3};
use catreg_core::{Catheter, CatheterSet, RigidTransform, SurfaceMesh};
use catreg_io::{write_catheter_folder, write_transform_json};
use std::path::Path;
use tracing::info;

/// Phantom geometry and misalignment.
#[derive(Debug, Clone)]
pub struct PhantomConfig {
    pub catheters: usize,
    /// Cross sections along each tube.
    pub rings: usize,
    /// Points per cross section.
    pub sides: usize,
    pub radius: f64,
    pub length: f64,
    /// Translation applied to the reconstructed side.
    pub offset: Vector3,
    /// Rotation about the phantom's vertical axis, in degrees.
    pub angle_degrees: f64,
}

impl Default for PhantomConfig {
    fn default() -> Self {
        Self {
            catheters: 3,
            rings: 48,
            sides: 16,
            radius: 1.0,
            length: 60.0,
            offset: Vector3::new(2.0, -1.0, 0.5),
            angle_degrees: 3.0,
        }
    }
}

/// Generated phantom plus the transform that undoes the misalignment.
pub struct Phantom {
    pub segmented: CatheterSet,
    pub reconstructed: CatheterSet,
    /// Maps reconstructed coordinates back onto the segmented ones.
    pub ground_truth: RigidTransform,
}

fn centerline(index: usize, length: f64, s: f64) -> Point3 {
    let k = index as f64;
    Point3::new(
        6.0 * k + 2.0 * (std::f64::consts::PI * s + k).sin(),
        (4.0 + 1.5 * k) * s * s,
        length * s,
    )
}

/// Closed tube of `config.radius` around the curve of catheter `index`.
pub fn catheter_tube(index: usize, config: &PhantomConfig) -> Result<SurfaceMesh> {
    let (rings, sides) = (config.rings, config.sides);
    if rings < 2 || sides < 3 {
        bail!("A tube needs at least 2 rings of 3 sides, got {} x {}", rings, sides);
    }

    let mut points = Vec::with_capacity(rings * sides + 2);
    let h = 1e-4;
    for i in 0..rings {
        let s = i as f64 / (rings - 1) as f64;
        let center = centerline(index, config.length, s);
        let tangent =
            (centerline(index, config.length, s + h) - centerline(index, config.length, s - h)).normalize();
        // Reference axis least aligned with the tangent.
        let reference = if tangent.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let normal = tangent.cross(&reference).normalize();
        let binormal = tangent.cross(&normal);
        for j in 0..sides {
            let phi = std::f64::consts::TAU * j as f64 / sides as f64;
            points.push(center + config.radius * (phi.cos() * normal + phi.sin() * binormal));
        }
    }

    let mut triangles = Vec::with_capacity(2 * rings * sides);
    for i in 0..rings - 1 {
        for j in 0..sides {
            let a = i * sides + j;
            let b = i * sides + (j + 1) % sides;
            triangles.push([a, b, a + sides]);
            triangles.push([b, b + sides, a + sides]);
        }
    }

    // End caps.
    let start = points.len();
    points.push(centerline(index, config.length, 0.0));
    points.push(centerline(index, config.length, 1.0));
    let last_ring = (rings - 1) * sides;
    for j in 0..sides {
        let next = (j + 1) % sides;
        triangles.push([start, next, j]);
        triangles.push([start + 1, last_ring + j, last_ring + next]);
    }

    Ok(SurfaceMesh::new(points, triangles)?)
}

/// Build both catheter sets.
pub fn generate(config: &PhantomConfig) -> Result<Phantom> {
    if config.catheters == 0 {
        bail!("A phantom needs at least one catheter");
    }

    let segmented = (0..config.catheters)
        .map(|i| Ok(Catheter::new(format!("Segment_{}", i + 1), catheter_tube(i, config)?)))
        .collect::<Result<Vec<_>>>()?;
    let segmented = CatheterSet::from_catheters("Segmented Catheter Models", segmented);

    // Rotate about the vertical axis through the phantom centroid, then shift.
    let aggregate = segmented.aggregate()?;
    let pivot = spatial::centroid(aggregate.points()).unwrap_or_else(Point3::origin).coords;
    let misalignment = RigidTransform::from_translation(pivot + config.offset)
        * RigidTransform::from_axis_angle(&Vector3::z(), config.angle_degrees.to_radians(), Vector3::zeros())
        * RigidTransform::from_translation(-pivot);

    let reconstructed = segmented
        .catheters()
        .iter()
        .enumerate()
        .map(|(i, c)| Catheter::new(format!("Catheter_{}", i + 1), c.mesh.transformed(&misalignment)))
        .collect();

    Ok(Phantom {
        segmented,
        reconstructed: CatheterSet::from_catheters("Reconstructed Catheter Models", reconstructed),
        ground_truth: misalignment.inverse(),
    })
}

/// Write `segmented/`, `reconstructed/` and `ground_truth.json` under `output`.
pub fn write_phantom(output: &Path, config: &PhantomConfig) -> Result<Phantom> {
    let phantom = generate(config)?;
    write_catheter_folder(output.join("segmented"), &phantom.segmented)?;
    write_catheter_folder(output.join("reconstructed"), &phantom.reconstructed)?;
    write_transform_json(output.join("ground_truth.json"), &phantom.ground_truth)?;
    info!(
        "Wrote phantom with {} catheters ({} points each side) to {}",
        config.catheters,
        phantom.segmented.num_points(),
        output.display()
    );
    Ok(phantom)
}
