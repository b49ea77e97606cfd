//! Core geometry for catheter surface registration.
//!
//! Provides triangle surface meshes, named catheter collections, rigid
//! transforms and closest-point spatial indices. Everything here is plain
//! double-precision nalgebra geometry.

pub mod error;
pub mod geometry;
pub mod index;
pub mod mesh;
pub mod spatial;
pub mod transform;

pub use error::{MeshError, Result};
pub use geometry::Triangle;
pub use index::{ClosestPoint, ClosestPointIndex, PointKdTree, TriangleBvh};
pub use mesh::{aggregate, Catheter, CatheterSet, SurfaceMesh};
pub use spatial::{BoundingBox, Point3, Vector3};
pub use transform::{RigidTransform, Transform};
