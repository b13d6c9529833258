//! Public-surface regression tests.
//!
//! These pin down the contract downstream consumers rely on: constructor
//! validation, the high-level decimation entry points, seam policies, and
//! the low-level primitives staying composable through the umbrella crate.

use mesh::decimate::{
    build_edge_flaps, build_seam_edges, compute_half_edge_qslim_5d, cost_and_placement,
    decimate, decimate_to_face_count, half_edge_bundle, is_chart_split, solve_quadprog,
    DecimateParams, Strictness,
};
use mesh::types::fixtures::{planar_grid, single_triangle, unit_cube_uv_islands};
use mesh::types::{MeshError, Point2, Point3, UvMesh};

fn assert_well_formed(mesh: &UvMesh) {
    UvMesh::from_parts(
        mesh.vertices.clone(),
        mesh.faces.clone(),
        mesh.uv_coords.clone(),
        mesh.uv_faces.clone(),
    )
    .expect("decimated mesh must stay well-formed");
}

#[test]
fn constructor_validates_input() {
    let bad = UvMesh::from_parts(
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
        vec![[0, 1, 7]],
        vec![Point2::new(0.0, 0.0)],
        vec![[0, 0, 0]],
    );
    assert!(matches!(
        bad,
        Err(MeshError::VertexIndexOutOfRange { .. })
    ));

    let mismatched = UvMesh::from_parts(
        single_triangle().vertices,
        vec![[0, 1, 2]],
        single_triangle().uv_coords,
        vec![],
    );
    assert!(matches!(mismatched, Err(MeshError::FaceArrayMismatch { .. })));
}

#[test]
fn percent_target_reduces_grid() {
    let grid = planar_grid(6);
    let result = decimate(&grid, &DecimateParams::with_target_percent(50.0));

    assert!(result.final_vertices < grid.vertex_count());
    assert_eq!(result.collapses, grid.vertex_count() - result.final_vertices);
    assert_well_formed(&result.mesh);
}

#[test]
fn absolute_target_wins_over_percent() {
    let grid = planar_grid(6);
    let mut params = DecimateParams::with_target_vertices(30);
    params.target_percent = 1.0;
    let result = decimate(&grid, &params);

    assert!(result.final_vertices >= 30);
    assert_well_formed(&result.mesh);
}

#[test]
fn face_count_target_path() {
    let grid = planar_grid(6);
    let out = decimate_to_face_count(&grid, grid.face_count() / 2, Strictness::PenalizeSeams);
    assert!(out.face_count() < grid.face_count());
    assert_well_formed(&out);

    let untouched = decimate_to_face_count(&grid, grid.face_count() + 10, Strictness::IgnoreUv);
    assert_eq!(untouched.face_count(), grid.face_count());
}

#[test]
fn identity_at_full_percent() {
    let cube = unit_cube_uv_islands();
    let result = decimate(&cube, &DecimateParams::with_target_percent(100.0));
    assert_eq!(result.final_vertices, 8);
    assert_eq!(result.final_faces, 12);
    assert_eq!(result.collapses, 0);
}

#[test]
fn strictness_ordering_on_seam_heavy_mesh() {
    let cube = unit_cube_uv_islands();
    let mut finals = Vec::new();
    for strictness in [
        Strictness::IgnoreUv,
        Strictness::PenalizeSeams,
        Strictness::PreserveSeams,
    ] {
        let params = DecimateParams::with_target_vertices(4).with_strictness(strictness);
        let result = decimate(&cube, &params);
        assert!(result.final_vertices >= 4);
        assert_well_formed(&result.mesh);
        finals.push(result.final_vertices);
    }
    // Stricter policies never remove more vertices than looser ones.
    assert!(finals[0] <= finals[1]);
    assert!(finals[1] <= finals[2]);
}

#[test]
fn decimation_is_deterministic() {
    let grid = planar_grid(5);
    let params = DecimateParams::with_target_percent(40.0);
    let a = decimate(&grid, &params);
    let b = decimate(&grid, &params);
    assert_eq!(a.mesh.vertices, b.mesh.vertices);
    assert_eq!(a.mesh.faces, b.mesh.faces);
    assert_eq!(a.mesh.uv_coords, b.mesh.uv_coords);
    assert_eq!(a.mesh.uv_faces, b.mesh.uv_faces);
}

#[test]
fn low_level_primitives_compose() {
    let cube = unit_cube_uv_islands();
    let flaps = build_edge_flaps(&cube.faces);
    assert_eq!(flaps.edge_count(), 18);

    let seams = build_seam_edges(&cube.faces, &cube.uv_faces, &flaps, cube.vertex_count());
    assert_eq!(seams.seam_edge_count(), 12);
    assert!(seams.vertex_is_seam.iter().all(|&s| s));

    let quadrics = compute_half_edge_qslim_5d(&cube);
    assert_eq!(quadrics.len(), 8);
    assert!(quadrics.iter().all(|q| q.chart_count() == 3));

    // Seam edges split into two chart instances, island diagonals into one.
    let split = (0..flaps.edge_count())
        .filter(|&e| {
            let bundle = half_edge_bundle(e, &flaps, &cube.faces, &cube.uv_faces);
            is_chart_split(&bundle)
        })
        .count();
    assert_eq!(split, 12);
}

#[test]
fn qp_solver_reachable_through_umbrella() {
    use nalgebra::{DMatrix, DVector};

    // minimize x^2 + y^2 subject to x + y = 2.
    let g = DMatrix::from_diagonal_element(2, 2, 2.0);
    let g0 = DVector::zeros(2);
    let ce = DMatrix::from_column_slice(2, 1, &[1.0, 1.0]);
    let ce0 = DVector::from_element(1, -2.0);
    let ci = DMatrix::zeros(2, 0);
    let ci0 = DVector::zeros(0);

    let sol = solve_quadprog(&g, &g0, &ce, &ce0, &ci, &ci0).expect("solvable");
    assert!((sol.x[0] - 1.0).abs() < 1e-9);
    assert!((sol.x[1] - 1.0).abs() < 1e-9);
}

#[test]
fn cost_evaluator_reachable_through_umbrella() {
    use mesh::decimate::{compute_plane_quadrics, CollapseContext};

    let grid = planar_grid(3);
    let flaps = build_edge_flaps(&grid.faces);
    let seams = build_seam_edges(&grid.faces, &grid.uv_faces, &flaps, grid.vertex_count());
    let chart_quadrics = compute_half_edge_qslim_5d(&grid);
    let plane_quadrics = compute_plane_quadrics(&grid);

    let mut vertex_faces = vec![Vec::new(); grid.vertex_count()];
    for (f, face) in grid.faces.iter().enumerate() {
        for &v in face {
            vertex_faces[v as usize].push(u32::try_from(f).unwrap());
        }
    }
    let face_alive = vec![true; grid.face_count()];

    let ctx = CollapseContext {
        vertices: &grid.vertices,
        uv_coords: &grid.uv_coords,
        faces: &grid.faces,
        uv_faces: &grid.uv_faces,
        face_alive: &face_alive,
        vertex_faces: &vertex_faces,
        chart_quadrics: &chart_quadrics,
        plane_quadrics: &plane_quadrics,
        seam_vertices: &seams.vertex_is_seam,
    };

    // An interior edge of the 4x4 grid: 5 and 6 are both off-boundary.
    let candidate = cost_and_placement(5, 6, &ctx, Strictness::PreserveSeams);
    assert!(candidate.cost.is_finite());
    assert!(candidate.placement.is_some());
}
