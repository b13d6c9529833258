//! UV-space orientation test guarding against triangle foldover.
//!
//! A collapse that flips a one-ring triangle's orientation in UV space
//! corrupts the texture mapping even when the 3D surface stays sound. The
//! guard compares signed areas before and after the tentative move.

use nalgebra::Point2;

/// Twice the signed area of triangle `(a, b, c)`.
#[inline]
#[must_use]
pub fn triangle_sign(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether `p` and `q` lie on the same side of the line through `a` and `b`.
///
/// Zero signed area counts as same-side, and a degenerate (zero-length)
/// reference segment always reports same-side so that collapsed-out
/// triangles do not spuriously reject a placement.
#[must_use]
pub fn same_side(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>, q: &Point2<f64>) -> bool {
    if (a.x - b.x).abs() < f64::EPSILON && (a.y - b.y).abs() < f64::EPSILON {
        return true;
    }
    let sp = triangle_sign(a, b, p);
    let sq = triangle_sign(a, b, q);
    sp == 0.0 || sq == 0.0 || (sp > 0.0) == (sq > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn opposite_sides_detected() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        assert!(!same_side(&a, &b, &p(0.5, 1.0), &p(0.5, -1.0)));
    }

    #[test]
    fn same_side_accepted() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        assert!(same_side(&a, &b, &p(0.2, 0.5), &p(0.9, 2.0)));
    }

    #[test]
    fn collinear_point_is_same_side() {
        let a = p(0.0, 0.0);
        let b = p(1.0, 0.0);
        assert!(same_side(&a, &b, &p(0.5, 0.0), &p(0.5, -3.0)));
    }

    #[test]
    fn degenerate_segment_is_same_side() {
        let a = p(0.25, 0.25);
        assert!(same_side(&a, &a, &p(0.0, 1.0), &p(0.0, -1.0)));
    }

    #[test]
    fn triangle_sign_orientation() {
        assert!(triangle_sign(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0)) > 0.0);
        assert!(triangle_sign(&p(0.0, 0.0), &p(0.0, 1.0), &p(1.0, 0.0)) < 0.0);
    }
}
