//! Error types for accessor encoding and buffer packing.

use thiserror::Error;

/// Errors that can occur while encoding, welding or packing mesh data.
///
/// Every error is local and synchronous. Callers treat any of them as a
/// rejection of the whole mesh or primitive being packed.
#[derive(Error, Debug)]
pub enum PackError {
    /// An impossible encoding, dimension or normalization combination was
    /// requested, or index data was supplied for a point primitive.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An accessor layout failed its validity predicate.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
    /// An index or byte range is out of bounds.
    #[error("out of bounds: {0}")]
    Bounds(String),
    /// A source primitive failed structural validation.
    #[error("mesh {mesh} primitive {primitive} failed validation: {reason}")]
    Validation {
        /// Mesh index in the packed batch.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
        /// What was inconsistent.
        reason: String,
    },
    /// The packer reached a state it cannot emit.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Failed to parse a glTF document.
    #[cfg(feature = "gltf")]
    #[error("glTF parse error: {0}")]
    Gltf(#[from] gltf_dep::Error),
    /// Failed to serialize a glTF document.
    #[cfg(feature = "gltf")]
    #[error("export error: {0}")]
    Export(String),
}

/// Result alias used throughout the crate.
pub type PackResult<T> = Result<T, PackError>;

impl PackError {
    pub(crate) fn validation(mesh: usize, primitive: usize, reason: impl Into<String>) -> Self {
        Self::Validation {
            mesh,
            primitive,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PackError::InvalidLayout("stride 6 is not a multiple of 4".to_string());
        assert_eq!(
            err.to_string(),
            "invalid layout: stride 6 is not a multiple of 4"
        );

        let err = PackError::validation(2, 1, "index 9 out of range");
        assert_eq!(
            err.to_string(),
            "mesh 2 primitive 1 failed validation: index 9 out of range"
        );
    }
}
