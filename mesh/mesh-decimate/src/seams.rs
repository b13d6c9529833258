//! UV seam classification.
//!
//! An interior edge is a seam when the two adjacent faces disagree on the UV
//! index of either shared endpoint. Boundary edges are always seams: there is
//! no second chart to compare against.
//!
//! Comparison is by UV *index* identity, not by coordinate value. Two UV
//! entries holding numerically identical coordinates under different indices
//! (common after independent triangulation) still classify as a seam; the
//! strict seam-preservation policy depends on this definition.

use crate::connectivity::EdgeFlaps;

/// Seam flags for every edge and vertex of a mesh.
#[derive(Debug, Clone)]
pub struct SeamSet {
    /// Per-edge seam flag, parallel to [`EdgeFlaps::edges`].
    pub edge_is_seam: Vec<bool>,

    /// Per-vertex flag: touches at least one seam edge.
    pub vertex_is_seam: Vec<bool>,
}

impl SeamSet {
    /// Number of seam edges.
    #[must_use]
    pub fn seam_edge_count(&self) -> usize {
        self.edge_is_seam.iter().filter(|&&s| s).count()
    }
}

/// Find the UV index that face `f` assigns to geometric vertex `v`.
///
/// Returns `None` when `v` is not a corner of `f` (possible for the
/// ignored extra faces of a non-manifold edge).
#[inline]
fn uv_of_vertex(face: &[u32; 3], uv_face: &[u32; 3], v: u32) -> Option<u32> {
    (0..3).find(|&c| face[c] == v).map(|c| uv_face[c])
}

/// Classify every edge of the mesh as seam or interior.
///
/// `vertex_count` sizes the per-vertex table; it must cover every index used
/// by `faces`.
#[must_use]
pub fn build_seam_edges(
    faces: &[[u32; 3]],
    uv_faces: &[[u32; 3]],
    flaps: &EdgeFlaps,
    vertex_count: usize,
) -> SeamSet {
    let mut edge_is_seam = vec![false; flaps.edge_count()];
    let mut vertex_is_seam = vec![false; vertex_count];

    for (e, &[a, b]) in flaps.edges.iter().enumerate() {
        let seam = if flaps.is_boundary(e) {
            true
        } else {
            let f0 = flaps.edge_faces[e][0] as usize;
            let f1 = flaps.edge_faces[e][1] as usize;

            let differs = |v: u32| {
                let uv0 = uv_of_vertex(&faces[f0], &uv_faces[f0], v);
                let uv1 = uv_of_vertex(&faces[f1], &uv_faces[f1], v);
                uv0 != uv1
            };

            differs(a) || differs(b)
        };

        if seam {
            edge_is_seam[e] = true;
            vertex_is_seam[a as usize] = true;
            vertex_is_seam[b as usize] = true;
        }
    }

    SeamSet {
        edge_is_seam,
        vertex_is_seam,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::build_edge_flaps;
    use mesh_types::fixtures::{planar_grid, unit_cube_uv_islands};

    #[test]
    fn boundary_edges_are_seams() {
        let tri = mesh_types::fixtures::single_triangle();
        let flaps = build_edge_flaps(&tri.faces);
        let seams = build_seam_edges(&tri.faces, &tri.uv_faces, &flaps, tri.vertex_count());

        assert_eq!(seams.seam_edge_count(), 3);
        assert!(seams.vertex_is_seam.iter().all(|&s| s));
    }

    #[test]
    fn shared_chart_interior_edges_are_not_seams() {
        let grid = planar_grid(3);
        let flaps = build_edge_flaps(&grid.faces);
        let seams = build_seam_edges(&grid.faces, &grid.uv_faces, &flaps, grid.vertex_count());

        for e in 0..flaps.edge_count() {
            assert_eq!(
                seams.edge_is_seam[e],
                flaps.is_boundary(e),
                "grid seam flags must match boundary flags"
            );
        }
        // Interior vertices of the grid touch no seam.
        let interior = grid
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, p)| p.x > 0.01 && p.x < 0.99 && p.y > 0.01 && p.y < 0.99)
            .map(|(i, _)| i);
        for v in interior {
            assert!(!seams.vertex_is_seam[v], "vertex {v} wrongly marked seam");
        }
    }

    #[test]
    fn island_cube_is_all_seams() {
        let cube = unit_cube_uv_islands();
        let flaps = build_edge_flaps(&cube.faces);
        let seams = build_seam_edges(&cube.faces, &cube.uv_faces, &flaps, cube.vertex_count());

        // 12 quad-boundary edges separate islands; the 6 quad diagonals are
        // interior to their island.
        assert_eq!(seams.seam_edge_count(), 12);
        assert!(seams.vertex_is_seam.iter().all(|&s| s));
    }

    #[test]
    fn duplicate_uv_indices_classify_as_seam() {
        // Two triangles sharing edge (1, 2) geometrically, but the second
        // face stores its corners under different UV indices with identical
        // coordinates. Index identity wins: this is a seam.
        let mesh = mesh_types::UvMesh::from_parts(
            vec![
                mesh_types::Point3::new(0.0, 0.0, 0.0),
                mesh_types::Point3::new(1.0, 0.0, 0.0),
                mesh_types::Point3::new(0.0, 1.0, 0.0),
                mesh_types::Point3::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [2, 1, 3]],
            vec![
                mesh_types::Point2::new(0.0, 0.0),
                mesh_types::Point2::new(1.0, 0.0),
                mesh_types::Point2::new(0.0, 1.0),
                // Duplicates of 1 and 2 by value.
                mesh_types::Point2::new(0.0, 1.0),
                mesh_types::Point2::new(1.0, 0.0),
                mesh_types::Point2::new(1.0, 1.0),
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
        .unwrap();

        let flaps = build_edge_flaps(&mesh.faces);
        let seams = build_seam_edges(&mesh.faces, &mesh.uv_faces, &flaps, mesh.vertex_count());

        let shared = flaps.edges.iter().position(|e| *e == [1, 2]).unwrap();
        assert!(!flaps.is_boundary(shared));
        assert!(seams.edge_is_seam[shared]);
    }
}
