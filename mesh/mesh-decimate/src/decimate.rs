//! Seam-aware edge-collapse decimation driver.
//!
//! The driver owns the mutable working state: positions, UV coordinates,
//! face corner arrays with tombstones, per-vertex quadric accumulators, and
//! a forwarding table mapping collapsed-away vertices to their survivors.
//! Edge identities stay fixed for the whole run (they index the initial
//! connectivity), so the indexed heap can address them stably; an edge whose
//! endpoints have merged is simply dead.
//!
//! Queue entries are revalidated lazily: a popped candidate is rescored
//! against the current mesh, collapsed only when its key is still accurate,
//! and re-queued otherwise. After each collapse the survivor's one-ring is
//! rescored eagerly so the queue never drifts far from the truth.

use nalgebra::{Point2, Point3};
use tracing::{debug, info};

use mesh_types::UvMesh;

use crate::connectivity::{build_edge_flaps, EdgeFlaps};
use crate::cost::{cost_and_placement, CollapseContext, Placement, STALE_EPS};
use crate::heap::EdgeHeap;
use crate::params::{DecimateParams, Strictness};
use crate::quadric::{
    compute_half_edge_qslim_5d, compute_plane_quadrics, ChartQuadrics, PlaneQuadric,
};
use crate::result::DecimationResult;
use crate::seams::build_seam_edges;

/// Smallest surviving vertex count the driver will ever go below, matching
/// the smallest closed manifold.
const ABSOLUTE_MIN_VERTICES: usize = 4;

/// What the run is trying to reach.
#[derive(Debug, Clone, Copy)]
enum Target {
    Vertices(usize),
    Faces(usize),
}

/// Decimate `mesh` according to `params`.
///
/// Never fails: when no further finite-cost collapse exists the best mesh
/// achieved so far is returned, and the caller can compare
/// [`DecimationResult::final_vertices`] against the target.
#[must_use]
pub fn decimate(mesh: &UvMesh, params: &DecimateParams) -> DecimationResult {
    let target = params.target_vertex_count(mesh.vertex_count());
    run(
        mesh,
        Target::Vertices(target),
        params.strictness,
        params.min_vertices,
    )
}

/// Decimate `mesh` until at most `target_faces` faces remain (or no further
/// collapse is possible), returning the mesh alone.
///
/// A target at or above the current face count returns the input unchanged.
#[must_use]
pub fn decimate_to_face_count(
    mesh: &UvMesh,
    target_faces: usize,
    strictness: Strictness,
) -> UvMesh {
    run(
        mesh,
        Target::Faces(target_faces),
        strictness,
        ABSOLUTE_MIN_VERTICES,
    )
    .mesh
}

#[allow(clippy::cast_possible_truncation)]
fn run(
    mesh: &UvMesh,
    target: Target,
    strictness: Strictness,
    min_vertices: usize,
) -> DecimationResult {
    let original_vertices = mesh.vertex_count();
    let original_faces = mesh.face_count();
    let floor = min_vertices.max(ABSOLUTE_MIN_VERTICES);

    let satisfied = match target {
        Target::Vertices(t) => original_vertices <= t.max(floor),
        Target::Faces(t) => original_faces <= t,
    };
    if mesh.is_empty() || satisfied {
        info!(
            vertices = original_vertices,
            faces = original_faces,
            ?target,
            "decimation target already satisfied"
        );
        return identity_result(mesh);
    }

    info!(
        vertices = original_vertices,
        faces = original_faces,
        ?target,
        ?strictness,
        "starting decimation"
    );

    let mut state = WorkingState::new(mesh);

    let costs: Vec<f64> = (0..state.flaps.edge_count())
        .map(|e| {
            let [a, b] = state.flaps.edges[e];
            cost_and_placement(a, b, &state.ctx(), strictness).cost
        })
        .collect();
    let mut heap = EdgeHeap::from_costs(&costs);
    debug!(
        edges = state.flaps.edge_count(),
        queued = heap.len(),
        "initial queue built"
    );

    let mut performed = 0usize;
    loop {
        let done = match target {
            Target::Vertices(t) => state.live_vertices <= t,
            Target::Faces(t) => state.live_faces <= t,
        };
        if done || state.live_vertices <= floor {
            break;
        }

        let Some((e, key)) = heap.extract_min() else {
            debug!(
                live_vertices = state.live_vertices,
                "queue exhausted before target"
            );
            break;
        };

        let [a, b] = state.flaps.edges[e as usize];
        let va = state.find(a);
        let vb = state.find(b);
        if va == vb || !state.vertex_alive[va as usize] || !state.vertex_alive[vb as usize] {
            continue;
        }

        let candidate = cost_and_placement(va, vb, &state.ctx(), strictness);
        if !candidate.cost.is_finite() {
            continue;
        }
        if (candidate.cost - key).abs() > STALE_EPS * (1.0 + key.abs()) {
            // Stale key: requeue at the current cost instead of collapsing.
            heap.insert(e, candidate.cost);
            continue;
        }
        let Some(placement) = candidate.placement else {
            continue;
        };

        state.collapse(va, vb, &placement);
        performed += 1;
        state.rescore_around(va, &mut heap, strictness);
    }

    if performed == 0 {
        info!("no collapse was possible; returning the input mesh");
        return identity_result(mesh);
    }

    let out = state.compact();
    let result = DecimationResult {
        original_vertices,
        original_faces,
        final_vertices: out.vertex_count(),
        final_faces: out.face_count(),
        collapses: original_vertices - out.vertex_count(),
        mesh: out,
    };
    info!(%result, "decimation finished");
    result
}

fn identity_result(mesh: &UvMesh) -> DecimationResult {
    DecimationResult {
        mesh: mesh.clone(),
        original_vertices: mesh.vertex_count(),
        original_faces: mesh.face_count(),
        final_vertices: mesh.vertex_count(),
        final_faces: mesh.face_count(),
        collapses: 0,
    }
}

/// Mutable decimation state over one mesh.
struct WorkingState {
    vertices: Vec<Point3<f64>>,
    uv_coords: Vec<Point2<f64>>,
    faces: Vec<[u32; 3]>,
    uv_faces: Vec<[u32; 3]>,
    face_alive: Vec<bool>,
    vertex_alive: Vec<bool>,
    /// Alive incident faces per surviving vertex, ascending. Dead faces may
    /// linger and are filtered through `face_alive`.
    vertex_faces: Vec<Vec<u32>>,
    /// Initial edge ids incident to each vertex, merged forward on collapse.
    vertex_edges: Vec<Vec<u32>>,
    chart_quadrics: Vec<ChartQuadrics>,
    plane_quadrics: Vec<PlaneQuadric>,
    seam_vertices: Vec<bool>,
    /// Forwarding pointers: `rep[v] == v` for survivors.
    rep: Vec<u32>,
    live_vertices: usize,
    live_faces: usize,
    flaps: EdgeFlaps,
}

impl WorkingState {
    #[allow(clippy::cast_possible_truncation)]
    fn new(mesh: &UvMesh) -> Self {
        let flaps = build_edge_flaps(&mesh.faces);
        let seams = build_seam_edges(&mesh.faces, &mesh.uv_faces, &flaps, mesh.vertex_count());
        let chart_quadrics = compute_half_edge_qslim_5d(mesh);
        let plane_quadrics = compute_plane_quadrics(mesh);

        let mut vertex_faces = vec![Vec::new(); mesh.vertex_count()];
        for (f, face) in mesh.faces.iter().enumerate() {
            for &v in face {
                vertex_faces[v as usize].push(f as u32);
            }
        }

        let mut vertex_edges = vec![Vec::new(); mesh.vertex_count()];
        for (e, &[a, b]) in flaps.edges.iter().enumerate() {
            vertex_edges[a as usize].push(e as u32);
            vertex_edges[b as usize].push(e as u32);
        }

        Self {
            vertices: mesh.vertices.clone(),
            uv_coords: mesh.uv_coords.clone(),
            faces: mesh.faces.clone(),
            uv_faces: mesh.uv_faces.clone(),
            face_alive: vec![true; mesh.face_count()],
            vertex_alive: vec![true; mesh.vertex_count()],
            vertex_faces,
            vertex_edges,
            chart_quadrics,
            plane_quadrics,
            seam_vertices: seams.vertex_is_seam,
            rep: (0..mesh.vertex_count() as u32).collect(),
            live_vertices: mesh.vertex_count(),
            live_faces: mesh.face_count(),
            flaps,
        }
    }

    fn ctx(&self) -> CollapseContext<'_> {
        CollapseContext {
            vertices: &self.vertices,
            uv_coords: &self.uv_coords,
            faces: &self.faces,
            uv_faces: &self.uv_faces,
            face_alive: &self.face_alive,
            vertex_faces: &self.vertex_faces,
            chart_quadrics: &self.chart_quadrics,
            plane_quadrics: &self.plane_quadrics,
            seam_vertices: &self.seam_vertices,
        }
    }

    /// Resolve a vertex through the forwarding table, compressing the path.
    fn find(&mut self, v: u32) -> u32 {
        let mut root = v;
        while self.rep[root as usize] != root {
            root = self.rep[root as usize];
        }
        let mut cur = v;
        while self.rep[cur as usize] != root {
            let next = self.rep[cur as usize];
            self.rep[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Merge `vb` into `va` at the proposed placement.
    fn collapse(&mut self, va: u32, vb: u32, placement: &Placement) {
        self.vertices[va as usize] = placement.position;
        for uvp in &placement.uv_placements {
            self.uv_coords[uvp.uv_a as usize] = uvp.uv;
        }

        // vb's chart accumulators fold into va, with the merged UV indices
        // remapped onto their survivors.
        let vb_charts = std::mem::take(&mut self.chart_quadrics[vb as usize]);
        for (uv, q) in vb_charts.iter() {
            let key = placement
                .uv_placements
                .iter()
                .find(|p| p.uv_b == uv)
                .map_or(uv, |p| p.uv_a);
            self.chart_quadrics[va as usize].add(key, q);
        }
        let q3 = self.plane_quadrics[vb as usize];
        self.plane_quadrics[va as usize].add(&q3);
        self.seam_vertices[va as usize] |= self.seam_vertices[vb as usize];

        // Rewrite vb's faces onto va and retire the ones that degenerate.
        let vb_faces = std::mem::take(&mut self.vertex_faces[vb as usize]);
        for &f in &vb_faces {
            if !self.face_alive[f as usize] {
                continue;
            }
            for corner in &mut self.faces[f as usize] {
                if *corner == vb {
                    *corner = va;
                }
            }
            for corner in &mut self.uv_faces[f as usize] {
                if let Some(p) = placement
                    .uv_placements
                    .iter()
                    .find(|p| p.uv_b == *corner && p.uv_b != p.uv_a)
                {
                    *corner = p.uv_a;
                }
            }
            let [x, y, z] = self.faces[f as usize];
            if x == y || y == z || x == z {
                self.face_alive[f as usize] = false;
                self.live_faces -= 1;
            }
        }

        let mut merged = std::mem::take(&mut self.vertex_faces[va as usize]);
        merged.extend(vb_faces);
        merged.retain(|&f| self.face_alive[f as usize]);
        merged.sort_unstable();
        merged.dedup();
        self.vertex_faces[va as usize] = merged;

        let vb_edges = std::mem::take(&mut self.vertex_edges[vb as usize]);
        let va_edges = &mut self.vertex_edges[va as usize];
        va_edges.extend(vb_edges);
        va_edges.sort_unstable();
        va_edges.dedup();

        self.vertex_alive[vb as usize] = false;
        self.rep[vb as usize] = va;
        self.live_vertices -= 1;
    }

    /// Rescore every edge touching `va` or its one-ring.
    fn rescore_around(&mut self, va: u32, heap: &mut EdgeHeap, strictness: Strictness) {
        let mut ring: Vec<u32> = vec![va];
        for &f in &self.vertex_faces[va as usize] {
            if self.face_alive[f as usize] {
                ring.extend_from_slice(&self.faces[f as usize]);
            }
        }
        ring.sort_unstable();
        ring.dedup();

        let mut edges: Vec<u32> = ring
            .iter()
            .flat_map(|&v| self.vertex_edges[v as usize].iter().copied())
            .collect();
        edges.sort_unstable();
        edges.dedup();

        for e in edges {
            let [a, b] = self.flaps.edges[e as usize];
            let pa = self.find(a);
            let pb = self.find(b);
            if pa == pb
                || !self.vertex_alive[pa as usize]
                || !self.vertex_alive[pb as usize]
            {
                heap.remove(e);
                continue;
            }
            let candidate = cost_and_placement(pa, pb, &self.ctx(), strictness);
            if candidate.cost.is_finite() {
                heap.update(e, candidate.cost);
            } else {
                heap.remove(e);
            }
        }
    }

    /// Emit the surviving mesh with dense indices.
    ///
    /// Vertices and UV coordinates are renumbered in order of first
    /// reference by a surviving face, which drops anything orphaned.
    #[allow(clippy::cast_possible_truncation)]
    fn compact(&self) -> UvMesh {
        let mut vertex_map = vec![u32::MAX; self.vertices.len()];
        let mut uv_map = vec![u32::MAX; self.uv_coords.len()];
        let mut vertices = Vec::with_capacity(self.live_vertices);
        let mut uv_coords = Vec::new();
        let mut faces = Vec::with_capacity(self.live_faces);
        let mut uv_faces = Vec::with_capacity(self.live_faces);

        for f in 0..self.faces.len() {
            if !self.face_alive[f] {
                continue;
            }
            let mut face = [0u32; 3];
            let mut uv_face = [0u32; 3];
            for c in 0..3 {
                let v = self.faces[f][c] as usize;
                if vertex_map[v] == u32::MAX {
                    vertex_map[v] = vertices.len() as u32;
                    vertices.push(self.vertices[v]);
                }
                face[c] = vertex_map[v];

                let t = self.uv_faces[f][c] as usize;
                if uv_map[t] == u32::MAX {
                    uv_map[t] = uv_coords.len() as u32;
                    uv_coords.push(self.uv_coords[t]);
                }
                uv_face[c] = uv_map[t];
            }
            faces.push(face);
            uv_faces.push(uv_face);
        }

        debug!(
            vertices = vertices.len(),
            faces = faces.len(),
            uv_coords = uv_coords.len(),
            "compacted decimated mesh"
        );
        UvMesh::from_parts_unchecked(vertices, faces, uv_coords, uv_faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::fixtures::{planar_grid, single_triangle, unit_cube_uv_islands};

    fn assert_valid(mesh: &UvMesh) {
        let checked = UvMesh::from_parts(
            mesh.vertices.clone(),
            mesh.faces.clone(),
            mesh.uv_coords.clone(),
            mesh.uv_faces.clone(),
        );
        assert!(checked.is_ok(), "decimated mesh failed validation");
        for face in &mesh.faces {
            assert!(
                face[0] != face[1] && face[1] != face[2] && face[0] != face[2],
                "degenerate face survived compaction"
            );
        }
    }

    #[test]
    fn grid_halves_vertex_count() {
        let grid = planar_grid(6);
        let result = decimate(&grid, &DecimateParams::with_target_percent(50.0));

        assert_eq!(result.original_vertices, 49);
        assert!(result.final_vertices < result.original_vertices);
        assert!(result.final_vertices >= 4);
        assert_eq!(
            result.collapses,
            result.original_vertices - result.final_vertices
        );
        assert!(result.was_decimated());
        assert_valid(&result.mesh);
    }

    #[test]
    fn full_percent_is_identity() {
        let grid = planar_grid(4);
        let result = decimate(&grid, &DecimateParams::with_target_percent(100.0));

        assert_eq!(result.final_vertices, grid.vertex_count());
        assert_eq!(result.final_faces, grid.face_count());
        assert_eq!(result.collapses, 0);
        assert!(!result.was_decimated());
        assert_eq!(result.mesh.vertices, grid.vertices);
        assert_eq!(result.mesh.uv_faces, grid.uv_faces);
    }

    #[test]
    fn single_triangle_is_untouched() {
        let tri = single_triangle();
        let result = decimate(&tri, &DecimateParams::default());
        assert_eq!(result.final_vertices, 3);
        assert_eq!(result.collapses, 0);
    }

    #[test]
    fn empty_mesh_is_untouched() {
        let result = decimate(&UvMesh::new(), &DecimateParams::default());
        assert_eq!(result.final_vertices, 0);
        assert_eq!(result.collapses, 0);
    }

    #[test]
    fn cube_never_drops_below_four_vertices() {
        let cube = unit_cube_uv_islands();
        let params = DecimateParams::with_target_vertices(1)
            .with_strictness(Strictness::PreserveSeams);
        let result = decimate(&cube, &params);

        assert!(result.final_vertices >= 4);
        assert_valid(&result.mesh);
    }

    #[test]
    fn strictness_is_monotone() {
        let grid = planar_grid(5);
        let loose = decimate(
            &grid,
            &DecimateParams::with_target_percent(25.0).with_strictness(Strictness::IgnoreUv),
        );
        let strict = decimate(
            &grid,
            &DecimateParams::with_target_percent(25.0)
                .with_strictness(Strictness::PreserveSeams),
        );
        assert!(strict.final_vertices >= loose.final_vertices);
    }

    #[test]
    fn runs_are_deterministic() {
        let grid = planar_grid(5);
        let params = DecimateParams::with_target_percent(40.0);
        let first = decimate(&grid, &params);
        let second = decimate(&grid, &params);

        assert_eq!(first.final_vertices, second.final_vertices);
        assert_eq!(first.mesh.vertices, second.mesh.vertices);
        assert_eq!(first.mesh.faces, second.mesh.faces);
        assert_eq!(first.mesh.uv_coords, second.mesh.uv_coords);
        assert_eq!(first.mesh.uv_faces, second.mesh.uv_faces);
    }

    #[test]
    fn face_target_is_reached_or_exhausted() {
        let grid = planar_grid(5);
        let target = grid.face_count() / 2;
        let out = decimate_to_face_count(&grid, target, Strictness::PenalizeSeams);

        assert!(out.face_count() < grid.face_count());
        assert_valid(&out);
    }

    #[test]
    fn face_target_at_or_above_count_is_identity() {
        let grid = planar_grid(3);
        let out = decimate_to_face_count(&grid, grid.face_count(), Strictness::IgnoreUv);
        assert_eq!(out.face_count(), grid.face_count());
        assert_eq!(out.vertices, grid.vertices);
    }

    #[test]
    fn min_vertices_floor_is_respected() {
        let grid = planar_grid(4);
        let params = DecimateParams::with_target_vertices(1)
            .with_min_vertices(12)
            .with_strictness(Strictness::IgnoreUv);
        let result = decimate(&grid, &params);
        assert!(result.final_vertices >= 12);
    }
}
