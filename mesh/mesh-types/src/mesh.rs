//! Indexed triangle mesh with per-corner texture coordinates.

use nalgebra::{Point2, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MeshError;

/// An indexed triangle mesh carrying baked UV texture coordinates.
///
/// Positions and texture coordinates are stored in separate index spaces:
/// `faces` indexes into `vertices` while `uv_faces` indexes into `uv_coords`.
/// The two face arrays are parallel, so corner `c` of triangle `f` has
/// position `vertices[faces[f][c]]` and texture coordinate
/// `uv_coords[uv_faces[f][c]]`. This split lets a single geometric vertex
/// carry several texture coordinates when it sits on a UV island boundary.
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from outside.
///
/// # Example
///
/// ```
/// use mesh_types::{UvMesh, Point2, Point3};
///
/// let mesh = UvMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
///     vec![
///         Point2::new(0.0, 0.0),
///         Point2::new(1.0, 0.0),
///         Point2::new(0.0, 1.0),
///     ],
///     vec![[0, 1, 2]],
/// )
/// .unwrap();
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UvMesh {
    /// Unique 3D vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Triangle faces as indices into `vertices`, CCW winding.
    pub faces: Vec<[u32; 3]>,

    /// Unique texture coordinates.
    pub uv_coords: Vec<Point2<f64>>,

    /// Per-triangle texture-coordinate indices into `uv_coords`.
    /// Parallel to `faces`: `uv_faces[f][c]` is the UV of corner `c`.
    pub uv_faces: Vec<[u32; 3]>,
}

impl UvMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            uv_coords: Vec::new(),
            uv_faces: Vec::new(),
        }
    }

    /// Create a validated mesh from its component arrays.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`] when the face arrays have different lengths,
    /// any face or UV index is out of range, or any coordinate is NaN or
    /// infinite. Bad input is never clamped or repaired.
    pub fn from_parts(
        vertices: Vec<Point3<f64>>,
        faces: Vec<[u32; 3]>,
        uv_coords: Vec<Point2<f64>>,
        uv_faces: Vec<[u32; 3]>,
    ) -> Result<Self, MeshError> {
        if faces.len() != uv_faces.len() {
            return Err(MeshError::FaceArrayMismatch {
                faces: faces.len(),
                uv_faces: uv_faces.len(),
            });
        }

        for (i, v) in vertices.iter().enumerate() {
            if !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
                return Err(MeshError::NonFiniteVertex { index: i });
            }
        }

        for (i, t) in uv_coords.iter().enumerate() {
            if !(t.x.is_finite() && t.y.is_finite()) {
                return Err(MeshError::NonFiniteUv { index: i });
            }
        }

        for (f, face) in faces.iter().enumerate() {
            for &index in face {
                if index as usize >= vertices.len() {
                    return Err(MeshError::VertexIndexOutOfRange {
                        face: f,
                        index,
                        count: vertices.len(),
                    });
                }
            }
        }

        for (f, face) in uv_faces.iter().enumerate() {
            for &index in face {
                if index as usize >= uv_coords.len() {
                    return Err(MeshError::UvIndexOutOfRange {
                        face: f,
                        index,
                        count: uv_coords.len(),
                    });
                }
            }
        }

        Ok(Self {
            vertices,
            faces,
            uv_coords,
            uv_faces,
        })
    }

    /// Create a mesh from component arrays without validation.
    ///
    /// Intended for algorithm output that is valid by construction
    /// (e.g. post-decimation compaction). External input should always go
    /// through [`UvMesh::from_parts`].
    #[inline]
    #[must_use]
    pub const fn from_parts_unchecked(
        vertices: Vec<Point3<f64>>,
        faces: Vec<[u32; 3]>,
        uv_coords: Vec<Point2<f64>>,
        uv_faces: Vec<[u32; 3]>,
    ) -> Self {
        Self {
            vertices,
            faces,
            uv_coords,
            uv_faces,
        }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangle faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of unique texture coordinates.
    #[inline]
    #[must_use]
    pub fn uv_count(&self) -> usize {
        self.uv_coords.len()
    }

    /// True when the mesh has no faces.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_parts() -> (Vec<Point3<f64>>, Vec<[u32; 3]>, Vec<Point2<f64>>, Vec<[u32; 3]>) {
        (
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

    #[test]
    fn valid_triangle_constructs() {
        let (v, f, t, tf) = triangle_parts();
        let mesh = UvMesh::from_parts(v, f, t, tf).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.uv_count(), 3);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn empty_mesh_is_empty() {
        let mesh = UvMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn face_array_mismatch_rejected() {
        let (v, f, t, _) = triangle_parts();
        let err = UvMesh::from_parts(v, f, t, vec![]).unwrap_err();
        assert_eq!(
            err,
            MeshError::FaceArrayMismatch {
                faces: 1,
                uv_faces: 0
            }
        );
    }

    #[test]
    fn vertex_index_out_of_range_rejected() {
        let (v, _, t, tf) = triangle_parts();
        let err = UvMesh::from_parts(v, vec![[0, 1, 3]], t, tf).unwrap_err();
        assert_eq!(
            err,
            MeshError::VertexIndexOutOfRange {
                face: 0,
                index: 3,
                count: 3
            }
        );
    }

    #[test]
    fn uv_index_out_of_range_rejected() {
        let (v, f, t, _) = triangle_parts();
        let err = UvMesh::from_parts(v, f, t, vec![[0, 1, 9]]).unwrap_err();
        assert_eq!(
            err,
            MeshError::UvIndexOutOfRange {
                face: 0,
                index: 9,
                count: 3
            }
        );
    }

    #[test]
    fn non_finite_vertex_rejected() {
        let (mut v, f, t, tf) = triangle_parts();
        v[1].y = f64::NAN;
        let err = UvMesh::from_parts(v, f, t, tf).unwrap_err();
        assert_eq!(err, MeshError::NonFiniteVertex { index: 1 });
    }

    #[test]
    fn non_finite_uv_rejected() {
        let (v, f, mut t, tf) = triangle_parts();
        t[2].x = f64::INFINITY;
        let err = UvMesh::from_parts(v, f, t, tf).unwrap_err();
        assert_eq!(err, MeshError::NonFiniteUv { index: 2 });
    }
}
