//! Named catheter surfaces and catheter sets.

use serde::{Deserialize, Serialize};

use super::aggregate::aggregate;
use super::surface::SurfaceMesh;
use crate::error::Result;

/// One catheter surface, identified by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catheter {
    pub name: String,
    pub mesh: SurfaceMesh,
}

impl Catheter {
    pub fn new(name: impl Into<String>, mesh: SurfaceMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
        }
    }
}

/// Ordered collection of catheter surfaces from one source.
///
/// A set holds either the catheters reconstructed from tracking data or the
/// catheters segmented from imaging. Order is preserved and determines the
/// layout of the aggregate surface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatheterSet {
    name: String,
    catheters: Vec<Catheter>,
}

impl CatheterSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catheters: Vec::new(),
        }
    }

    /// Create a set from already named catheters.
    pub fn from_catheters(name: impl Into<String>, catheters: Vec<Catheter>) -> Self {
        Self {
            name: name.into(),
            catheters,
        }
    }

    /// Create a set from bare meshes, naming them `<set name> <index>`.
    pub fn from_meshes(name: impl Into<String>, meshes: Vec<SurfaceMesh>) -> Self {
        let name = name.into();
        let catheters = meshes
            .into_iter()
            .enumerate()
            .map(|(i, mesh)| Catheter::new(format!("{} {}", name, i + 1), mesh))
            .collect();
        Self { name, catheters }
    }

    /// Append a catheter.
    pub fn push(&mut self, catheter: Catheter) {
        self.catheters.push(catheter);
    }

    /// Builder variant of [`push`](Self::push).
    pub fn with_catheter(mut self, name: impl Into<String>, mesh: SurfaceMesh) -> Self {
        self.push(Catheter::new(name, mesh));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn catheters(&self) -> &[Catheter] {
        &self.catheters
    }

    pub fn len(&self) -> usize {
        self.catheters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catheters.is_empty()
    }

    /// Look up a catheter by name.
    pub fn get(&self, name: &str) -> Option<&Catheter> {
        self.catheters.iter().find(|c| c.name == name)
    }

    /// Total number of points over all catheters.
    pub fn num_points(&self) -> usize {
        self.catheters.iter().map(|c| c.mesh.num_points()).sum()
    }

    /// Merge every catheter surface into one aggregate surface.
    ///
    /// # Errors
    /// Fails with `NoGeometry` when the set is empty.
    pub fn aggregate(&self) -> Result<SurfaceMesh> {
        let meshes: Vec<&SurfaceMesh> = self.catheters.iter().map(|c| &c.mesh).collect();
        aggregate(meshes)
    }
}
