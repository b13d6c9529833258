//! Canonical test meshes.
//!
//! These generators are used by unit tests and benchmarks across the mesh
//! crates. They are part of the public API so downstream crates can test
//! against the same shapes.

use nalgebra::{Point2, Point3};

use crate::UvMesh;

/// A single triangle in the XY plane with a trivial UV chart.
#[must_use]
pub fn single_triangle() -> UvMesh {
    UvMesh::from_parts_unchecked(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ],
        vec![[0, 1, 2]],
    )
}

/// A unit cube where each of the 6 sides is its own UV island.
///
/// Every geometric edge of the cube lies between two islands (or inside one
/// quad), so all 12 outer quad-boundary edges classify as UV seams. 8
/// vertices, 12 faces, 24 UV coordinates.
#[must_use]
pub fn unit_cube_uv_islands() -> UvMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0), // 0
        Point3::new(1.0, 0.0, 0.0), // 1
        Point3::new(1.0, 1.0, 0.0), // 2
        Point3::new(0.0, 1.0, 0.0), // 3
        Point3::new(0.0, 0.0, 1.0), // 4
        Point3::new(1.0, 0.0, 1.0), // 5
        Point3::new(1.0, 1.0, 1.0), // 6
        Point3::new(0.0, 1.0, 1.0), // 7
    ];

    // One quad per side, CCW when viewed from outside.
    let quads: [[u32; 4]; 6] = [
        [0, 3, 2, 1], // bottom (z=0)
        [4, 5, 6, 7], // top (z=1)
        [0, 1, 5, 4], // front (y=0)
        [2, 3, 7, 6], // back (y=1)
        [3, 0, 4, 7], // left (x=0)
        [1, 2, 6, 5], // right (x=1)
    ];

    let mut faces = Vec::with_capacity(12);
    let mut uv_coords = Vec::with_capacity(24);
    let mut uv_faces = Vec::with_capacity(12);

    for (island, quad) in quads.iter().enumerate() {
        let o = (island * 4) as u32;
        uv_coords.push(Point2::new(0.0, 0.0));
        uv_coords.push(Point2::new(1.0, 0.0));
        uv_coords.push(Point2::new(1.0, 1.0));
        uv_coords.push(Point2::new(0.0, 1.0));

        faces.push([quad[0], quad[1], quad[2]]);
        faces.push([quad[0], quad[2], quad[3]]);
        uv_faces.push([o, o + 1, o + 2]);
        uv_faces.push([o, o + 2, o + 3]);
    }

    UvMesh::from_parts_unchecked(vertices, faces, uv_coords, uv_faces)
}

/// A seam-free subdivided unit square in the XY plane.
///
/// `divisions` cells per side: `(divisions + 1)²` vertices and
/// `2 * divisions²` faces, all sharing one UV chart that mirrors the
/// geometric layout.
///
/// # Panics
///
/// Panics if `divisions` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn planar_grid(divisions: u32) -> UvMesh {
    assert!(divisions > 0, "grid needs at least one division");
    let n = divisions;
    let side = n + 1;

    let mut vertices = Vec::with_capacity((side * side) as usize);
    let mut uv_coords = Vec::with_capacity((side * side) as usize);
    for j in 0..side {
        for i in 0..side {
            let u = f64::from(i) / f64::from(n);
            let v = f64::from(j) / f64::from(n);
            vertices.push(Point3::new(u, v, 0.0));
            uv_coords.push(Point2::new(u, v));
        }
    }

    let mut faces = Vec::with_capacity((2 * n * n) as usize);
    for j in 0..n {
        for i in 0..n {
            let a = j * side + i;
            let b = a + 1;
            let c = a + side;
            let d = c + 1;
            faces.push([a, b, d]);
            faces.push([a, d, c]);
        }
    }

    // One shared chart: UV indices mirror vertex indices.
    let uv_faces = faces.clone();

    UvMesh::from_parts_unchecked(vertices, faces, uv_coords, uv_faces)
}
