//! Surface mesh types and operations.
//!
//! This module provides the SurfaceMesh type, named catheter collections and
//! the aggregation of a collection into one comparable surface.

pub mod surface;
pub mod catheter;
pub mod aggregate;

pub use surface::SurfaceMesh;
pub use catheter::{Catheter, CatheterSet};
pub use aggregate::aggregate;
