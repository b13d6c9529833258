//! Umbrella crate for the seam-aware mesh stack.
//!
//! Downstream code depends on this single crate instead of tracking the
//! individual `mesh-*` members. The split crates stay the unit of
//! compilation; this one only re-exports.
//!
//! ```
//! use mesh::prelude::*;
//!
//! let mesh = mesh::types::fixtures::planar_grid(4);
//! let result = decimate(&mesh, &DecimateParams::default());
//! assert!(result.final_vertices <= mesh.vertex_count());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use mesh_decimate as decimate;
pub use mesh_types as types;

/// The names almost every consumer wants in scope.
pub mod prelude {
    pub use mesh_decimate::{
        decimate, decimate_to_face_count, DecimateParams, DecimationResult, Strictness,
    };
    pub use mesh_types::{MeshError, UvMesh};
}
