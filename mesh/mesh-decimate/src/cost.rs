//! Collapse cost and placement evaluation.
//!
//! Given an edge's two surviving endpoints and the current working state,
//! this module answers the only question the driver asks: what does
//! collapsing this edge cost, and where do the merged vertex and its UV
//! instances land? The evaluation is pure so the driver can speculatively
//! re-evaluate popped candidates against the current mesh without side
//! effects.
//!
//! The placement solve pins the homogeneous coordinate of the quadric to 1
//! and minimizes via the dual active-set solver in [`crate::quadprog`].
//! When a seam edge carries two distinct UV-chart instances, both are
//! assembled into a single joint program sharing the 3D position block, so
//! the reported position truly minimizes the summed error across charts.

use nalgebra::{DMatrix, DVector, Point2, Point3};
use smallvec::SmallVec;

use crate::foldover::same_side;
use crate::params::Strictness;
use crate::quadprog::solve_quadprog;
use crate::quadric::{ChartQuadrics, PlaneQuadric, Quadric};

/// Multiplier applied to the cost of seam-adjacent collapses under
/// [`Strictness::PenalizeSeams`], pushing them to the back of the queue.
pub const SEAM_PENALTY: f64 = 10.0;

/// Relative tolerance for deciding a popped heap key is stale.
pub const STALE_EPS: f64 = 1e-12;

/// Tikhonov weight pulling rank-deficient placements toward the edge
/// midpoint. Flat regions have quadrics that vanish on a whole affine set;
/// without the pull the solver would pick an arbitrary point on it.
const PLACEMENT_TIKHONOV: f64 = 1e-9;

/// One UV-chart instance of a collapse: merge UV index `uv_b` into `uv_a`,
/// writing `uv` as the merged coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvPlacement {
    /// UV index at the kept endpoint; survives the collapse.
    pub uv_a: u32,
    /// UV index at the removed endpoint; remapped onto `uv_a`.
    pub uv_b: u32,
    /// Merged UV coordinate for this chart.
    pub uv: Point2<f64>,
}

/// Where the merged vertex lands, in 3D and per touched chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Merged 3D position.
    pub position: Point3<f64>,
    /// One entry per distinct UV-chart instance of the collapsed edge.
    pub uv_placements: SmallVec<[UvPlacement; 2]>,
}

/// A scored collapse. Infinite cost means the collapse is forbidden; the
/// placement is absent in that case.
#[derive(Debug, Clone)]
pub struct CollapseCandidate {
    /// Quadric error of the proposed placement, `+inf` when forbidden.
    pub cost: f64,
    /// Proposed placement, `None` when the collapse is forbidden.
    pub placement: Option<Placement>,
}

impl CollapseCandidate {
    fn rejected() -> Self {
        Self {
            cost: f64::INFINITY,
            placement: None,
        }
    }
}

/// Borrowed view of the driver's working state.
///
/// `vertex_faces` lists the alive incident faces of each surviving vertex in
/// ascending face order; dead faces may linger in the lists and are filtered
/// through `face_alive`.
#[derive(Debug, Clone, Copy)]
pub struct CollapseContext<'a> {
    /// Current vertex positions (stale entries for removed vertices).
    pub vertices: &'a [Point3<f64>],
    /// Current UV coordinates (stale entries for merged-away indices).
    pub uv_coords: &'a [Point2<f64>],
    /// Current face corner indices, rewritten in place by collapses.
    pub faces: &'a [[u32; 3]],
    /// Current UV corner indices, parallel to `faces`.
    pub uv_faces: &'a [[u32; 3]],
    /// Tombstone flags for faces.
    pub face_alive: &'a [bool],
    /// Incident-face lists per surviving vertex.
    pub vertex_faces: &'a [Vec<u32>],
    /// Per-vertex, per-chart 5D quadric accumulators.
    pub chart_quadrics: &'a [ChartQuadrics],
    /// Per-vertex 3D plane quadric accumulators.
    pub plane_quadrics: &'a [PlaneQuadric],
    /// Seam/boundary classification, merged forward through collapses.
    pub seam_vertices: &'a [bool],
}

/// A distinct UV-chart instance of the edge `(va, vb)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Instance {
    uv_a: u32,
    uv_b: u32,
}

/// Score the collapse of the edge between surviving vertices `va` and `vb`
/// and propose a placement.
///
/// Both endpoints must be alive and distinct; the caller resolves stale edge
/// endpoints through its remap table first.
#[must_use]
pub fn cost_and_placement(
    va: u32,
    vb: u32,
    ctx: &CollapseContext<'_>,
    strictness: Strictness,
) -> CollapseCandidate {
    // Faces currently straddling the edge, ascending. More than two means a
    // non-manifold fan; the first two carry the evaluation.
    let mut adjacent: SmallVec<[u32; 2]> = SmallVec::new();
    for &f in &ctx.vertex_faces[va as usize] {
        if !ctx.face_alive[f as usize] {
            continue;
        }
        let face = &ctx.faces[f as usize];
        if face.contains(&va) && face.contains(&vb) && !adjacent.contains(&f) {
            adjacent.push(f);
            if adjacent.len() == 2 {
                break;
            }
        }
    }
    if adjacent.is_empty() {
        // The edge no longer exists in the current mesh.
        return CollapseCandidate::rejected();
    }

    let mut instances: SmallVec<[Instance; 2]> = SmallVec::new();
    for &f in &adjacent {
        let Some(inst) = instance_of_face(f, va, vb, ctx) else {
            return CollapseCandidate::rejected();
        };
        if !instances.contains(&inst) {
            instances.push(inst);
        }
    }

    // A UV index shared between instances on one side only would force a
    // chart split during the rewrite, which collapse cannot express.
    if instances.len() == 2 {
        let [i0, i1] = [instances[0], instances[1]];
        if i0.uv_a == i1.uv_a || i0.uv_b == i1.uv_b {
            return CollapseCandidate::rejected();
        }
    }

    let boundary = adjacent.len() == 1;
    let seam_edge = boundary || instances.len() > 1;
    let seam_endpoint =
        ctx.seam_vertices[va as usize] || ctx.seam_vertices[vb as usize];

    if strictness == Strictness::PreserveSeams {
        // An interior edge touching a seam vertex would drag the seam; a
        // seam edge whose endpoints are not both on the seam cannot keep
        // the seam structure intact either way.
        if !seam_edge && seam_endpoint {
            return CollapseCandidate::rejected();
        }
        if seam_edge
            && !(ctx.seam_vertices[va as usize] && ctx.seam_vertices[vb as usize])
        {
            return CollapseCandidate::rejected();
        }
    }

    // Summed endpoint quadric per instance. A missing chart accumulator
    // means the chart was entirely degenerate; nothing sane to score.
    let mut summed: SmallVec<[Quadric; 2]> = SmallVec::new();
    for inst in &instances {
        let (Some(qa), Some(qb)) = (
            ctx.chart_quadrics[va as usize].get(inst.uv_a),
            ctx.chart_quadrics[vb as usize].get(inst.uv_b),
        ) else {
            return CollapseCandidate::rejected();
        };
        let mut q = *qa;
        q.add(qb);
        summed.push(q);
    }

    let (cost, placement) = if strictness == Strictness::IgnoreUv {
        place_geometry_only(va, vb, ctx, &instances, &summed)
    } else {
        place_joint(va, vb, ctx, &instances, &summed)
    };

    if !cost.is_finite() {
        return CollapseCandidate::rejected();
    }

    // UV foldover guard. Skipped when UV structure is ignored outright.
    if strictness != Strictness::IgnoreUv {
        for uvp in &placement.uv_placements {
            if !one_ring_keeps_orientation(va, vb, uvp, &adjacent, ctx) {
                return CollapseCandidate::rejected();
            }
        }
    }

    let cost = if strictness == Strictness::PenalizeSeams && (seam_edge || seam_endpoint) {
        cost * SEAM_PENALTY
    } else {
        cost
    };

    CollapseCandidate {
        cost,
        placement: Some(placement),
    }
}

/// The `(uv at va, uv at vb)` pair face `f` assigns to the edge.
fn instance_of_face(f: u32, va: u32, vb: u32, ctx: &CollapseContext<'_>) -> Option<Instance> {
    let face = &ctx.faces[f as usize];
    let uv_face = &ctx.uv_faces[f as usize];
    let ca = (0..3).find(|&c| face[c] == va)?;
    let cb = (0..3).find(|&c| face[c] == vb)?;
    Some(Instance {
        uv_a: uv_face[ca],
        uv_b: uv_face[cb],
    })
}

/// Joint position+UV placement: one QP over the shared 3D position, one UV
/// block per instance, and a pinned homogeneous coordinate.
fn place_joint(
    va: u32,
    vb: u32,
    ctx: &CollapseContext<'_>,
    instances: &[Instance],
    summed: &[Quadric],
) -> (f64, Placement) {
    let k = instances.len();
    let n = 3 + 2 * k + 1;

    // Variable layout: x y z, then (u, v) per instance, then homogeneous.
    let mut joint = DMatrix::<f64>::zeros(n, n);
    for (i, q) in summed.iter().enumerate() {
        let m = q.matrix();
        let map = |src: usize| match src {
            0..=2 => src,
            3 | 4 => 3 + 2 * i + (src - 3),
            _ => n - 1,
        };
        for r in 0..6 {
            for c in 0..6 {
                joint[(map(r), map(c))] += m[(r, c)];
            }
        }
    }

    let anchor_placement = midpoint_placement(va, vb, ctx, instances);
    let mut anchor = DVector::zeros(n);
    anchor[0] = anchor_placement.position.x;
    anchor[1] = anchor_placement.position.y;
    anchor[2] = anchor_placement.position.z;
    for (i, uvp) in anchor_placement.uv_placements.iter().enumerate() {
        anchor[3 + 2 * i] = uvp.uv.x;
        anchor[4 + 2 * i] = uvp.uv.y;
    }

    let placement = match solve_pinned(&joint, &anchor) {
        Some(x) => Placement {
            position: Point3::new(x[0], x[1], x[2]),
            uv_placements: instances
                .iter()
                .enumerate()
                .map(|(i, inst)| UvPlacement {
                    uv_a: inst.uv_a,
                    uv_b: inst.uv_b,
                    uv: Point2::new(x[3 + 2 * i], x[4 + 2 * i]),
                })
                .collect(),
        },
        None => anchor_placement,
    };

    // Score the true quadric at the landing point; the solve objective
    // carries the midpoint pull and would misreport slightly.
    let cost: f64 = summed
        .iter()
        .zip(&placement.uv_placements)
        .map(|(q, uvp)| q.evaluate(&placement.position, &uvp.uv))
        .sum();
    (cost.max(0.0), placement)
}

/// Placement under [`Strictness::IgnoreUv`]: the 3D plane quadric decides
/// both position and cost; UVs follow by minimizing each instance's 5D
/// quadric with the position held fixed.
fn place_geometry_only(
    va: u32,
    vb: u32,
    ctx: &CollapseContext<'_>,
    instances: &[Instance],
    summed: &[Quadric],
) -> (f64, Placement) {
    let mut q3 = ctx.plane_quadrics[va as usize];
    q3.add(&ctx.plane_quadrics[vb as usize]);

    let m = q3.matrix();
    let mut joint = DMatrix::<f64>::zeros(4, 4);
    for r in 0..4 {
        for c in 0..4 {
            joint[(r, c)] = m[(r, c)];
        }
    }

    let mid = midpoint3(&ctx.vertices[va as usize], &ctx.vertices[vb as usize]);
    let mut anchor = DVector::zeros(4);
    anchor[0] = mid.x;
    anchor[1] = mid.y;
    anchor[2] = mid.z;

    let position = match solve_pinned(&joint, &anchor) {
        Some(x) => Point3::new(x[0], x[1], x[2]),
        None => mid,
    };
    let cost = q3.evaluate(&position).max(0.0);

    let uv_placements = instances
        .iter()
        .zip(summed)
        .map(|(inst, q)| {
            let anchor_uv = midpoint2(
                &ctx.uv_coords[inst.uv_a as usize],
                &ctx.uv_coords[inst.uv_b as usize],
            );
            let uv = uv_given_position(q, &position, &anchor_uv).unwrap_or(anchor_uv);
            UvPlacement {
                uv_a: inst.uv_a,
                uv_b: inst.uv_b,
                uv,
            }
        })
        .collect();

    (
        cost,
        Placement {
            position,
            uv_placements,
        },
    )
}

/// Minimize `v^T M v + lam * |v - anchor|^2` over homogeneous `v` with the
/// last coordinate pinned to 1. The anchor term breaks ties on
/// rank-deficient quadrics without disturbing well-posed ones. Returns
/// `None` when the solver cannot factor the system.
fn solve_pinned(m: &DMatrix<f64>, anchor: &DVector<f64>) -> Option<DVector<f64>> {
    let n = m.nrows();
    let lam = PLACEMENT_TIKHONOV * (1.0 + m.trace().abs());

    let mut g = m * 2.0;
    let mut g0 = DVector::zeros(n);
    for i in 0..n - 1 {
        g[(i, i)] += 2.0 * lam;
        g0[i] = -2.0 * lam * anchor[i];
    }

    let mut ce = DMatrix::zeros(n, 1);
    ce[(n - 1, 0)] = 1.0;
    let ce0 = DVector::from_element(1, -1.0);
    let ci = DMatrix::zeros(n, 0);
    let ci0 = DVector::zeros(0);

    match solve_quadprog(&g, &g0, &ce, &ce0, &ci, &ci0) {
        Ok(sol) if sol.cost.is_finite() => Some(sol.x),
        _ => None,
    }
}

/// Minimize one instance's 5D quadric over UV with the position fixed.
fn uv_given_position(
    q: &Quadric,
    position: &Point3<f64>,
    anchor: &Point2<f64>,
) -> Option<Point2<f64>> {
    let m = q.matrix();
    let lam = PLACEMENT_TIKHONOV * (1.0 + m.trace().abs());

    // E(t) = t^T Mtt t + 2 (Mtp p + bt)^T t + const.
    let mut g = DMatrix::<f64>::zeros(2, 2);
    for r in 0..2 {
        for c in 0..2 {
            g[(r, c)] = 2.0 * m[(3 + r, 3 + c)];
        }
        g[(r, r)] += 2.0 * lam;
    }
    let p = [position.x, position.y, position.z];
    let a = [anchor.x, anchor.y];
    let mut g0 = DVector::<f64>::zeros(2);
    for r in 0..2 {
        let cross: f64 = (0..3).map(|c| m[(3 + r, c)] * p[c]).sum();
        g0[r] = 2.0 * (cross + m[(3 + r, 5)]) - 2.0 * lam * a[r];
    }
    let ce = DMatrix::zeros(2, 0);
    let ce0 = DVector::zeros(0);
    let ci = DMatrix::zeros(2, 0);
    let ci0 = DVector::zeros(0);

    match solve_quadprog(&g, &g0, &ce, &ce0, &ci, &ci0) {
        Ok(sol) if sol.cost.is_finite() => Some(Point2::new(sol.x[0], sol.x[1])),
        _ => None,
    }
}

/// Whether every one-ring UV triangle of the instance keeps the moved
/// corner on the same side of its opposite edge.
fn one_ring_keeps_orientation(
    va: u32,
    vb: u32,
    uvp: &UvPlacement,
    adjacent: &[u32],
    ctx: &CollapseContext<'_>,
) -> bool {
    for (vertex, uv_index) in [(va, uvp.uv_a), (vb, uvp.uv_b)] {
        for &f in &ctx.vertex_faces[vertex as usize] {
            if !ctx.face_alive[f as usize] || adjacent.contains(&f) {
                continue;
            }
            let uv_face = &ctx.uv_faces[f as usize];
            // Faces of other charts around this vertex are unaffected.
            let Some(c) = (0..3).find(|&c| uv_face[c] == uv_index) else {
                continue;
            };
            let opposite_a = &ctx.uv_coords[uv_face[(c + 1) % 3] as usize];
            let opposite_b = &ctx.uv_coords[uv_face[(c + 2) % 3] as usize];
            let old = &ctx.uv_coords[uv_index as usize];
            if !same_side(opposite_a, opposite_b, old, &uvp.uv) {
                return false;
            }
        }
    }
    true
}

fn midpoint_placement(
    va: u32,
    vb: u32,
    ctx: &CollapseContext<'_>,
    instances: &[Instance],
) -> Placement {
    Placement {
        position: midpoint3(&ctx.vertices[va as usize], &ctx.vertices[vb as usize]),
        uv_placements: instances
            .iter()
            .map(|inst| UvPlacement {
                uv_a: inst.uv_a,
                uv_b: inst.uv_b,
                uv: midpoint2(
                    &ctx.uv_coords[inst.uv_a as usize],
                    &ctx.uv_coords[inst.uv_b as usize],
                ),
            })
            .collect(),
    }
}

#[inline]
fn midpoint3(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) * 0.5)
}

#[inline]
fn midpoint2(a: &Point2<f64>, b: &Point2<f64>) -> Point2<f64> {
    Point2::from((a.coords + b.coords) * 0.5)
}
