//! 5D quadric error metrics over joint position + texture space.
//!
//! Each triangle contributes a rank-≤3 quadric measuring squared distance
//! from a homogeneous `(x, y, z, u, v, 1)` point to the triangle's affine
//! span in 5D. Summed per vertex, the quadric scores candidate collapse
//! placements jointly in geometry and UV, so a placement that preserves the
//! surface but shears the texture still pays for it.
//!
//! Construction follows the generalized (attribute-extended) quadric: build
//! an orthonormal tangent frame `e1, e2` of the triangle embedded in 5D and
//! take the projector onto its orthogonal complement.

use nalgebra::{Matrix4, Matrix5, Matrix6, Point2, Point3, Vector4, Vector5, Vector6};
use smallvec::SmallVec;

use mesh_types::UvMesh;

/// Squared-length threshold under which a triangle edge or tangent is
/// considered degenerate and contributes no quadric.
const DEGENERATE_EPS: f64 = 1e-24;

/// A symmetric 6×6 quadric over homogeneous `(x, y, z, u, v, 1)` vectors.
///
/// Indices 0-2 are position, 3-4 are UV, 5 is the homogeneous coordinate.
/// Quadrics are additive: summing two quadrics scores a point against both
/// contributing plane sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadric {
    m: Matrix6<f64>,
}

impl Default for Quadric {
    fn default() -> Self {
        Self {
            m: Matrix6::zeros(),
        }
    }
}

impl Quadric {
    /// Build the quadric of one triangle from its corner positions and
    /// texture coordinates.
    ///
    /// Returns `None` for degenerate triangles (coincident or collinear
    /// corners in the joint 5D embedding), which carry no usable tangent
    /// frame.
    #[must_use]
    pub fn from_face(
        p0: &Point3<f64>,
        p1: &Point3<f64>,
        p2: &Point3<f64>,
        t0: &Point2<f64>,
        t1: &Point2<f64>,
        t2: &Point2<f64>,
    ) -> Option<Self> {
        let p = embed(p0, t0);
        let q = embed(p1, t1);
        let r = embed(p2, t2);

        let d1 = q - p;
        if d1.norm_squared() < DEGENERATE_EPS {
            return None;
        }
        let e1 = d1.normalize();

        let d2 = r - p;
        let t = d2 - e1 * d2.dot(&e1);
        if t.norm_squared() < DEGENERATE_EPS {
            return None;
        }
        let e2 = t.normalize();

        // Projector onto the orthogonal complement of the tangent plane:
        // A = I - e1 e1^T - e2 e2^T, b = (p.e1) e1 + (p.e2) e2 - p,
        // c = p.p - (p.e1)^2 - (p.e2)^2.
        let p_e1 = p.dot(&e1);
        let p_e2 = p.dot(&e2);

        let a: Matrix5<f64> =
            Matrix5::identity() - e1 * e1.transpose() - e2 * e2.transpose();
        let b: Vector5<f64> = e1 * p_e1 + e2 * p_e2 - p;
        let c = p.dot(&p) - p_e1 * p_e1 - p_e2 * p_e2;

        let mut m = Matrix6::zeros();
        m.fixed_view_mut::<5, 5>(0, 0).copy_from(&a);
        m.fixed_view_mut::<5, 1>(0, 5).copy_from(&b);
        m.fixed_view_mut::<1, 5>(5, 0).copy_from(&b.transpose());
        m[(5, 5)] = c;

        Some(Self { m })
    }

    /// Add another quadric into this one.
    pub fn add(&mut self, other: &Self) {
        self.m += other.m;
    }

    /// Evaluate the error for a position + UV pair.
    #[must_use]
    pub fn evaluate(&self, position: &Point3<f64>, uv: &Point2<f64>) -> f64 {
        let v = homogeneous(position, uv);
        (v.transpose() * self.m * v)[(0, 0)]
    }

    /// The full symmetric 6×6 matrix.
    #[inline]
    #[must_use]
    pub const fn matrix(&self) -> &Matrix6<f64> {
        &self.m
    }

    /// Split into the terms of the unconstrained minimization
    /// `x^T A x + 2 b^T x + c` over the 5D (position, uv) vector `x`.
    #[must_use]
    pub fn minimize_terms(&self) -> (Matrix5<f64>, Vector5<f64>, f64) {
        let a = self.m.fixed_view::<5, 5>(0, 0).into_owned();
        let b = self.m.fixed_view::<5, 1>(0, 5).into_owned();
        (a, b, self.m[(5, 5)])
    }
}

/// A classic 4×4 plane-distance quadric over homogeneous `(x, y, z, 1)`.
///
/// Used when the seam policy scores on geometry alone: the 5D quadric would
/// charge for UV distortion, which that policy explicitly ignores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneQuadric {
    m: Matrix4<f64>,
}

impl Default for PlaneQuadric {
    fn default() -> Self {
        Self {
            m: Matrix4::zeros(),
        }
    }
}

impl PlaneQuadric {
    /// Build the quadric of one triangle's supporting plane.
    ///
    /// Returns `None` for triangles with a degenerate normal.
    #[must_use]
    pub fn from_face(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Option<Self> {
        let n = (p1 - p0).cross(&(p2 - p0));
        if n.norm_squared() < DEGENERATE_EPS {
            return None;
        }
        let n = n.normalize();
        let d = -n.dot(&p0.coords);
        let plane = Vector4::new(n.x, n.y, n.z, d);
        Some(Self {
            m: plane * plane.transpose(),
        })
    }

    /// Add another quadric into this one.
    pub fn add(&mut self, other: &Self) {
        self.m += other.m;
    }

    /// Squared plane distance sum at `position`.
    #[must_use]
    pub fn evaluate(&self, position: &Point3<f64>) -> f64 {
        let v = Vector4::new(position.x, position.y, position.z, 1.0);
        (v.transpose() * self.m * v)[(0, 0)]
    }

    /// The full symmetric 4×4 matrix.
    #[inline]
    #[must_use]
    pub const fn matrix(&self) -> &Matrix4<f64> {
        &self.m
    }
}

/// Accumulate one plane quadric per vertex, ignoring UV structure.
#[must_use]
pub fn compute_plane_quadrics(mesh: &UvMesh) -> Vec<PlaneQuadric> {
    let mut quadrics = vec![PlaneQuadric::default(); mesh.vertex_count()];
    for face in &mesh.faces {
        let Some(q) = PlaneQuadric::from_face(
            &mesh.vertices[face[0] as usize],
            &mesh.vertices[face[1] as usize],
            &mesh.vertices[face[2] as usize],
        ) else {
            continue;
        };
        for &v in face {
            quadrics[v as usize].add(&q);
        }
    }
    quadrics
}

/// Embed a position + UV pair as a 5D point.
#[inline]
fn embed(p: &Point3<f64>, t: &Point2<f64>) -> Vector5<f64> {
    Vector5::new(p.x, p.y, p.z, t.x, t.y)
}

/// Homogeneous 6D lift of a position + UV pair.
#[inline]
fn homogeneous(p: &Point3<f64>, t: &Point2<f64>) -> Vector6<f64> {
    Vector6::new(p.x, p.y, p.z, t.x, t.y, 1.0)
}

/// The quadrics a single vertex owns, keyed by UV-chart identity.
///
/// A vertex on a UV island boundary appears in several charts and owns one
/// independent accumulator per distinct UV index. Charts per vertex are
/// bounded in practice (rarely above 6), so a sorted association list beats
/// a map.
#[derive(Debug, Clone, Default)]
pub struct ChartQuadrics {
    entries: SmallVec<[(u32, Quadric); 2]>,
}

impl ChartQuadrics {
    /// Add a contribution into the accumulator for UV index `uv`.
    pub fn add(&mut self, uv: u32, q: &Quadric) {
        match self.entries.binary_search_by_key(&uv, |&(k, _)| k) {
            Ok(i) => self.entries[i].1.add(q),
            Err(i) => self.entries.insert(i, (uv, *q)),
        }
    }

    /// The accumulator for UV index `uv`, if this vertex touches that chart.
    #[must_use]
    pub fn get(&self, uv: u32) -> Option<&Quadric> {
        self.entries
            .binary_search_by_key(&uv, |&(k, _)| k)
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Iterate `(uv index, quadric)` pairs in ascending UV-index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Quadric)> {
        self.entries.iter().map(|(k, q)| (*k, q))
    }

    /// Number of distinct charts this vertex touches.
    #[must_use]
    pub fn chart_count(&self) -> usize {
        self.entries.len()
    }
}

/// Accumulate per-`(vertex, chart)` quadrics for every vertex of the mesh.
///
/// Each triangle's 5D quadric is added into each corner's accumulator under
/// the UV index that corner uses, so chart-split vertices keep their charts
/// independent.
#[must_use]
pub fn compute_half_edge_qslim_5d(mesh: &UvMesh) -> Vec<ChartQuadrics> {
    let mut quadrics = vec![ChartQuadrics::default(); mesh.vertex_count()];

    for (face, uv_face) in mesh.faces.iter().zip(&mesh.uv_faces) {
        let Some(q) = Quadric::from_face(
            &mesh.vertices[face[0] as usize],
            &mesh.vertices[face[1] as usize],
            &mesh.vertices[face[2] as usize],
            &mesh.uv_coords[uv_face[0] as usize],
            &mesh.uv_coords[uv_face[1] as usize],
            &mesh.uv_coords[uv_face[2] as usize],
        ) else {
            continue;
        };

        for c in 0..3 {
            quadrics[face[c] as usize].add(uv_face[c], &q);
        }
    }

    quadrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::fixtures::{planar_grid, unit_cube_uv_islands};

    fn sample_quadric() -> Quadric {
        Quadric::from_face(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.5),
            &Point3::new(0.0, 1.0, -0.25),
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn face_quadric_is_symmetric() {
        let q = sample_quadric();
        let m = q.matrix();
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(m[(i, j)], m[(j, i)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn face_quadric_vanishes_on_its_corners() {
        let q = sample_quadric();
        assert_relative_eq!(
            q.evaluate(&Point3::new(0.0, 0.0, 0.0), &Point2::new(0.0, 0.0)),
            0.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(
            q.evaluate(&Point3::new(1.0, 0.0, 0.5), &Point2::new(1.0, 0.0)),
            0.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(
            q.evaluate(&Point3::new(0.0, 1.0, -0.25), &Point2::new(0.0, 1.0)),
            0.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn off_span_point_has_positive_error() {
        let q = Quadric::from_face(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
        )
        .unwrap();

        // One unit off the plane in z: squared distance 1.
        let err = q.evaluate(&Point3::new(0.2, 0.2, 1.0), &Point2::new(0.2, 0.2));
        assert_relative_eq!(err, 1.0, epsilon = 1e-10);

        // UV shear with the position kept on-plane also pays. The nearest
        // 5D span point splits the 0.5 u-offset with an x-offset, leaving
        // 2 * 0.25^2 of squared distance.
        let err = q.evaluate(&Point3::new(0.2, 0.2, 0.0), &Point2::new(0.7, 0.2));
        assert_relative_eq!(err, 0.125, epsilon = 1e-10);
    }

    #[test]
    fn degenerate_triangle_yields_none() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let t = Point2::new(0.5, 0.5);
        assert!(Quadric::from_face(&p, &p, &p, &t, &t, &t).is_none());
    }

    #[test]
    fn accumulated_quadric_vanishes_at_own_corner() {
        let grid = planar_grid(3);
        let quadrics = compute_half_edge_qslim_5d(&grid);

        for (face, uv_face) in grid.faces.iter().zip(&grid.uv_faces) {
            for c in 0..3 {
                let v = face[c] as usize;
                let q = quadrics[v].get(uv_face[c]).expect("chart accumulator");
                let err = q.evaluate(
                    &grid.vertices[v],
                    &grid.uv_coords[uv_face[c] as usize],
                );
                assert!(
                    err.abs() < 1e-9,
                    "vertex {v} should lie on all incident faces, err {err}"
                );
            }
        }
    }

    #[test]
    fn island_cube_corner_owns_three_charts() {
        let cube = unit_cube_uv_islands();
        let quadrics = compute_half_edge_qslim_5d(&cube);
        // Every cube corner touches 3 islands.
        for q in &quadrics {
            assert_eq!(q.chart_count(), 3);
        }
    }

    #[test]
    fn plane_quadric_measures_squared_distance() {
        let q = PlaneQuadric::from_face(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(q.evaluate(&Point3::new(0.3, 0.3, 0.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.evaluate(&Point3::new(0.3, 0.3, 2.0)), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn plane_quadrics_vanish_on_grid_vertices() {
        let grid = planar_grid(2);
        let quadrics = compute_plane_quadrics(&grid);
        for (v, q) in quadrics.iter().enumerate() {
            assert!(q.evaluate(&grid.vertices[v]).abs() < 1e-10);
        }
    }

    #[test]
    fn chart_quadrics_sorted_insertion() {
        let q = sample_quadric();
        let mut charts = ChartQuadrics::default();
        charts.add(7, &q);
        charts.add(2, &q);
        charts.add(7, &q);

        let keys: Vec<u32> = charts.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![2, 7]);
        assert_eq!(charts.chart_count(), 2);
        assert!(charts.get(3).is_none());
    }
}
