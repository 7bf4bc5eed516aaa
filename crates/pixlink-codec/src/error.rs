use crate::geometry::Geometry;

/// Errors that can occur while building or reconstructing pixel buffers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The byte count does not match the declared geometry.
    #[error("buffer of {actual} bytes does not match {geometry} ({expected} bytes)")]
    ShapeMismatch {
        geometry: Geometry,
        expected: usize,
        actual: usize,
    },

    /// The padded canvas cannot hold the target content.
    #[error("padded geometry {padded} is smaller than target geometry {target}")]
    InvalidLayout { target: Geometry, padded: Geometry },

    /// A geometry string or value is malformed.
    #[error("invalid geometry '{0}' (expected WIDTHxHEIGHT, both non-zero)")]
    InvalidGeometry(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
