//! Disjoint union of surface meshes.

use std::borrow::Borrow;

use super::surface::SurfaceMesh;
use crate::error::{MeshError, Result};

/// Merge meshes into one surface.
///
/// Points and triangles are concatenated in input order. Triangle indices of
/// mesh *i* are offset by the number of points in meshes `0..i`, so every
/// triangle keeps referencing the points of its own source mesh. Coincident
/// points are not welded and nothing is deduplicated or reoriented.
///
/// # Errors
/// Returns [`MeshError::NoGeometry`] when `meshes` is empty.
///
/// # Examples
/// ```rust
/// use catreg_core::mesh::{aggregate, SurfaceMesh};
/// use catreg_core::spatial::Point3;
///
/// let a = SurfaceMesh::new(vec![Point3::origin(); 3], vec![[0, 1, 2]]).unwrap();
/// let b = a.clone();
/// let merged = aggregate([&a, &b]).unwrap();
/// assert_eq!(merged.triangles(), &[[0, 1, 2], [3, 4, 5]]);
/// ```
pub fn aggregate<I, M>(meshes: I) -> Result<SurfaceMesh>
where
    I: IntoIterator<Item = M>,
    M: Borrow<SurfaceMesh>,
{
    let meshes: Vec<M> = meshes.into_iter().collect();
    if meshes.is_empty() {
        return Err(MeshError::no_geometry("no surfaces to aggregate"));
    }

    let total_points: usize = meshes.iter().map(|m| m.borrow().num_points()).sum();
    let total_triangles: usize = meshes.iter().map(|m| m.borrow().num_triangles()).sum();

    let mut points = Vec::with_capacity(total_points);
    let mut triangles = Vec::with_capacity(total_triangles);

    for mesh in &meshes {
        let mesh = mesh.borrow();
        let offset = points.len();
        points.extend_from_slice(mesh.points());
        triangles.extend(
            mesh.triangles()
                .iter()
                .map(|&[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }

    Ok(SurfaceMesh::from_parts_unchecked(points, triangles))
}
