//! Edge connectivity ("edge flaps") derived from a triangle face list.
//!
//! For every unique undirected edge this records the one or two adjacent
//! faces and, per face, the vertex opposite the edge. A reverse table maps
//! each face corner to the edge opposite that corner.

use std::collections::HashMap;

/// Sentinel for a missing adjacent face (boundary edge).
pub const NO_FACE: i32 = -1;

/// Unique-edge connectivity for a triangle mesh.
///
/// All arrays are parallel over edge index. Edge order is fixed by face
/// iteration order, never by hash-map iteration, so repeated builds over the
/// same face list produce identical tables.
#[derive(Debug, Clone)]
pub struct EdgeFlaps {
    /// Unordered vertex pairs, stored as `[a, b]` with `a < b`.
    pub edges: Vec<[u32; 2]>,

    /// Up to two adjacent face indices per edge; [`NO_FACE`] marks a
    /// boundary edge's empty slot.
    pub edge_faces: Vec<[i32; 2]>,

    /// Per adjacent face, the vertex opposite the edge (the face's third
    /// corner). Slots align with `edge_faces`.
    pub edge_opposites: Vec<[i32; 2]>,

    /// For each face corner `(f, c)`, the index of the edge opposite
    /// corner `c` of face `f`.
    pub face_edges: Vec<[u32; 3]>,
}

impl EdgeFlaps {
    /// Number of unique edges.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True when the edge has exactly one adjacent face.
    #[inline]
    #[must_use]
    pub fn is_boundary(&self, edge: usize) -> bool {
        self.edge_faces[edge][1] == NO_FACE
    }
}

/// Build unique-edge connectivity from a face list.
///
/// Each face contributes its three undirected edges. An edge seen by exactly
/// one face is a boundary edge. An edge shared by more than two faces is
/// non-manifold; the extra contributors are ignored and only the first two
/// observed faces are tracked, since UV-chart duplication legitimately
/// produces such connectivity.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn build_edge_flaps(faces: &[[u32; 3]]) -> EdgeFlaps {
    let mut edges: Vec<[u32; 2]> = Vec::with_capacity(faces.len() * 3 / 2);
    let mut edge_faces: Vec<[i32; 2]> = Vec::with_capacity(faces.len() * 3 / 2);
    let mut edge_opposites: Vec<[i32; 2]> = Vec::with_capacity(faces.len() * 3 / 2);
    let mut face_edges: Vec<[u32; 3]> = vec![[0; 3]; faces.len()];

    // Lookup only; iteration order of this map is never observed.
    let mut index: HashMap<(u32, u32), usize> = HashMap::with_capacity(faces.len() * 3 / 2);

    for (f, face) in faces.iter().enumerate() {
        for c in 0..3 {
            // Edge opposite corner c.
            let a = face[(c + 1) % 3];
            let b = face[(c + 2) % 3];
            let key = if a < b { (a, b) } else { (b, a) };

            let e = match index.get(&key) {
                Some(&e) => {
                    if edge_faces[e][1] == NO_FACE && edge_faces[e][0] != f as i32 {
                        edge_faces[e][1] = f as i32;
                        edge_opposites[e][1] = face[c] as i32;
                    }
                    // A third (or later) incident face is dropped here.
                    e
                }
                None => {
                    let e = edges.len();
                    edges.push([key.0, key.1]);
                    edge_faces.push([f as i32, NO_FACE]);
                    edge_opposites.push([face[c] as i32, NO_FACE]);
                    index.insert(key, e);
                    e
                }
            };

            face_edges[f][c] = e as u32;
        }
    }

    EdgeFlaps {
        edges,
        edge_faces,
        edge_opposites,
        face_edges,
    }
}
