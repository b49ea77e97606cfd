//! Triangle surface mesh.
//!
//! This module provides the SurfaceMesh struct, the geometry handed to the
//! registration engine and the distance analyzer.

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::geometry::Triangle;
use crate::spatial::{self, BoundingBox, Point3};
use crate::transform::Transform;

/// Triangle surface mesh in physical space.
///
/// A mesh is an ordered list of points plus triangles given as triples of
/// point indices. Points may be shared between triangles and the surface does
/// not need to be manifold. Every triangle index is checked at construction,
/// and the mesh is read-only afterwards.
///
/// # Examples
/// ```rust
/// use catreg_core::mesh::SurfaceMesh;
/// use catreg_core::spatial::Point3;
///
/// let mesh = SurfaceMesh::new(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// )
/// .unwrap();
/// assert_eq!(mesh.num_points(), 3);
/// assert_eq!(mesh.num_triangles(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSurfaceMesh")]
pub struct SurfaceMesh {
    /// Point positions.
    points: Vec<Point3>,
    /// Triangles as point index triples.
    triangles: Vec<[usize; 3]>,
}

/// Unchecked serialized form. Deserialization goes through [`SurfaceMesh::new`].
#[derive(Deserialize)]
struct RawSurfaceMesh {
    points: Vec<Point3>,
    #[serde(default)]
    triangles: Vec<[usize; 3]>,
}

impl TryFrom<RawSurfaceMesh> for SurfaceMesh {
    type Error = MeshError;

    fn try_from(raw: RawSurfaceMesh) -> Result<Self> {
        Self::new(raw.points, raw.triangles)
    }
}

impl SurfaceMesh {
    /// Create a mesh, checking that every triangle index is in range.
    ///
    /// # Errors
    /// Returns [`MeshError::IndexOutOfRange`] for the first offending triangle.
    pub fn new(points: Vec<Point3>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        let num_points = points.len();
        for (triangle, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i >= num_points) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    num_points,
                });
            }
        }
        Ok(Self { points, triangles })
    }

    /// Create a mesh of bare points without triangles.
    pub fn from_points(points: Vec<Point3>) -> Self {
        Self {
            points,
            triangles: Vec::new(),
        }
    }

    /// Mesh with no points and no triangles.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a mesh whose indices are known to be valid.
    pub(crate) fn from_parts_unchecked(points: Vec<Point3>, triangles: Vec<[usize; 3]>) -> Self {
        debug_assert!(triangles.iter().flatten().all(|&i| i < points.len()));
        Self { points, triangles }
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Corner positions of triangle `index`.
    ///
    /// # Panics
    /// Panics if `index >= num_triangles()`.
    pub fn triangle(&self, index: usize) -> Triangle {
        let [a, b, c] = self.triangles[index];
        Triangle::new(self.points[a], self.points[b], self.points[c])
    }

    /// Iterate over the triangles as corner positions.
    pub fn iter_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles
            .iter()
            .map(move |&[a, b, c]| Triangle::new(self.points[a], self.points[b], self.points[c]))
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Mean of the point positions, `None` for an empty mesh.
    pub fn centroid(&self) -> Option<Point3> {
        spatial::centroid(&self.points)
    }

    /// Total triangle area.
    pub fn surface_area(&self) -> f64 {
        self.iter_triangles().map(|t| t.area()).sum()
    }

    /// Copy of this mesh with every point mapped through `transform`.
    ///
    /// Topology is unchanged and the original mesh is left untouched.
    pub fn transformed<T: Transform + ?Sized>(&self, transform: &T) -> Self {
        Self {
            points: transform.transform_points(&self.points),
            triangles: self.triangles.clone(),
        }
    }
}
