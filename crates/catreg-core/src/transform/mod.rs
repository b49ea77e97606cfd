//! Transform types and operations.
//!
//! This module provides the transform trait and the rigid transform produced
//! by registration.

pub mod trait_;
pub mod rigid;

pub use trait_::Transform;
pub use rigid::RigidTransform;
