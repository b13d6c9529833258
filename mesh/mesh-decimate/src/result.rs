//! Result types for decimation operations.

// Vertex counts don't overflow f64 in practice
#![allow(clippy::cast_precision_loss)]

use mesh_types::UvMesh;

/// Result of a decimation run.
///
/// The driver never fails mid-run: when no finite-cost collapse remains it
/// returns the best mesh achieved so far. Compare `final_vertices` against
/// the requested target to detect under-achievement.
#[derive(Debug, Clone)]
pub struct DecimationResult {
    /// The decimated mesh, compacted and valid by construction.
    pub mesh: UvMesh,

    /// Vertex count of the input mesh.
    pub original_vertices: usize,

    /// Face count of the input mesh.
    pub original_faces: usize,

    /// Vertex count of the output mesh.
    pub final_vertices: usize,

    /// Face count of the output mesh.
    pub final_faces: usize,

    /// Number of edge collapses performed
    /// (`original_vertices - final_vertices`).
    pub collapses: usize,
}

impl DecimationResult {
    /// Surviving fraction of vertices (`final / original`).
    #[must_use]
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_vertices == 0 {
            1.0
        } else {
            self.final_vertices as f64 / self.original_vertices as f64
        }
    }

    /// Percentage of vertices removed.
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        (1.0 - self.reduction_ratio()) * 100.0
    }

    /// True when at least one collapse was performed.
    #[must_use]
    pub const fn was_decimated(&self) -> bool {
        self.collapses > 0
    }
}

impl std::fmt::Display for DecimationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Decimation: {} → {} vertices, {} → {} faces ({:.1}% reduction, {} collapses)",
            self.original_vertices,
            self.final_vertices,
            self.original_faces,
            self.final_faces,
            self.reduction_percent(),
            self.collapses
        )
    }
}
