//! Error types for mesh construction.

use thiserror::Error;

/// Errors produced when validating mesh data at construction time.
///
/// Construction never clamps or repairs bad input; every violation is
/// reported with enough context to locate the offending entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// `faces` and `uv_faces` must be parallel arrays.
    #[error("face array mismatch: {faces} faces but {uv_faces} UV faces")]
    FaceArrayMismatch {
        /// Number of geometric faces.
        faces: usize,
        /// Number of UV faces.
        uv_faces: usize,
    },

    /// A face references a vertex index outside the vertex array.
    #[error("face {face} references vertex {index} but mesh has {count} vertices")]
    VertexIndexOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// A UV face references a UV index outside the UV coordinate array.
    #[error("UV face {face} references UV {index} but mesh has {count} UV coordinates")]
    UvIndexOutOfRange {
        /// Index of the offending UV face.
        face: usize,
        /// The out-of-range UV index.
        index: u32,
        /// Number of UV coordinates in the mesh.
        count: usize,
    },

    /// A vertex position contains a NaN or infinite component.
    #[error("vertex {index} has a non-finite coordinate")]
    NonFiniteVertex {
        /// Index of the offending vertex.
        index: usize,
    },

    /// A UV coordinate contains a NaN or infinite component.
    #[error("UV coordinate {index} has a non-finite component")]
    NonFiniteUv {
        /// Index of the offending UV coordinate.
        index: usize,
    },
}
