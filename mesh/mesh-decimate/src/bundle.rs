//! Half-edge bundles: the per-UV-chart instances of a geometric edge.
//!
//! Collapse candidates are evaluated per bundle entry, not per geometric
//! edge. The two sides of a seam carry distinct UV identities and must be
//! placed independently in UV space while staying coincident in 3D.

use smallvec::SmallVec;

use crate::connectivity::{EdgeFlaps, NO_FACE};

/// One UV-chart instance of a geometric edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge {
    /// The adjacent face realizing this instance.
    pub face: usize,

    /// UV index the face assigns to the edge's first vertex (`edges[e][0]`).
    pub uv_a: u32,

    /// UV index the face assigns to the edge's second vertex (`edges[e][1]`).
    pub uv_b: u32,
}

/// The 1-2 half-edge instances of a geometric edge.
pub type Bundle = SmallVec<[HalfEdge; 2]>;

/// Locate the UV corner a face assigns to a geometric vertex.
#[inline]
fn uv_corner(face: &[u32; 3], uv_face: &[u32; 3], v: u32) -> Option<u32> {
    (0..3).find(|&c| face[c] == v).map(|c| uv_face[c])
}

/// Enumerate the half-edge instances of edge `e`.
///
/// A boundary edge yields one entry; an interior edge yields two. A
/// non-seam interior edge's entries share one UV identity; a full seam's
/// entries differ in both corners. Adjacent faces that no longer reference
/// both edge vertices (stale connectivity mid-decimation) are skipped.
#[must_use]
pub fn half_edge_bundle(
    e: usize,
    flaps: &EdgeFlaps,
    faces: &[[u32; 3]],
    uv_faces: &[[u32; 3]],
) -> Bundle {
    let [a, b] = flaps.edges[e];
    let mut bundle = Bundle::new();

    for slot in 0..2 {
        let f = flaps.edge_faces[e][slot];
        if f == NO_FACE {
            continue;
        }
        let f = f as usize;
        if let (Some(uv_a), Some(uv_b)) = (
            uv_corner(&faces[f], &uv_faces[f], a),
            uv_corner(&faces[f], &uv_faces[f], b),
        ) {
            bundle.push(HalfEdge { face: f, uv_a, uv_b });
        }
    }

    bundle
}

/// True when the bundle's two instances carry distinct UV identities for
/// either endpoint (the edge crosses a UV discontinuity).
#[must_use]
pub fn is_chart_split(bundle: &Bundle) -> bool {
    match bundle.as_slice() {
        [first, second] => first.uv_a != second.uv_a || first.uv_b != second.uv_b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::build_edge_flaps;
    use mesh_types::fixtures::{planar_grid, single_triangle, unit_cube_uv_islands};

    #[test]
    fn boundary_edge_yields_one_instance() {
        let tri = single_triangle();
        let flaps = build_edge_flaps(&tri.faces);
        for e in 0..flaps.edge_count() {
            let bundle = half_edge_bundle(e, &flaps, &tri.faces, &tri.uv_faces);
            assert_eq!(bundle.len(), 1);
            assert!(!is_chart_split(&bundle));
        }
    }

    #[test]
    fn interior_shared_chart_edge() {
        let grid = planar_grid(2);
        let flaps = build_edge_flaps(&grid.faces);
        for e in 0..flaps.edge_count() {
            let bundle = half_edge_bundle(e, &flaps, &grid.faces, &grid.uv_faces);
            if flaps.is_boundary(e) {
                assert_eq!(bundle.len(), 1);
            } else {
                assert_eq!(bundle.len(), 2);
                // Shared chart: both instances agree on UV identity.
                assert!(!is_chart_split(&bundle));
                assert_eq!(bundle[0].uv_a, bundle[1].uv_a);
            }
        }
    }

    #[test]
    fn island_cube_seam_edges_split() {
        let cube = unit_cube_uv_islands();
        let flaps = build_edge_flaps(&cube.faces);
        let seams = crate::seams::build_seam_edges(
            &cube.faces,
            &cube.uv_faces,
            &flaps,
            cube.vertex_count(),
        );

        for e in 0..flaps.edge_count() {
            let bundle = half_edge_bundle(e, &flaps, &cube.faces, &cube.uv_faces);
            assert_eq!(bundle.len(), 2);
            assert_eq!(
                is_chart_split(&bundle),
                seams.edge_is_seam[e],
                "chart split must match seam classification on the cube"
            );
        }
    }
}
