//! Error types for mesh construction and aggregation.

use thiserror::Error;

/// Errors raised while building or combining surface meshes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A triangle references a point that does not exist.
    #[error("Triangle {triangle} references point {index}, but the mesh has {num_points} points")]
    IndexOutOfRange {
        triangle: usize,
        index: usize,
        num_points: usize,
    },

    /// Nothing to combine or register.
    #[error("No geometry to register: {0}")]
    NoGeometry(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;

impl MeshError {
    /// Create a no-geometry error.
    pub fn no_geometry(msg: impl Into<String>) -> Self {
        Self::NoGeometry(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::IndexOutOfRange {
            triangle: 3,
            index: 9,
            num_points: 8,
        };
        assert_eq!(
            err.to_string(),
            "Triangle 3 references point 9, but the mesh has 8 points"
        );

        let err = MeshError::no_geometry("empty catheter set");
        assert_eq!(err.to_string(), "No geometry to register: empty catheter set");
    }
}
