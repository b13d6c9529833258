//! Core mesh types for seam-aware mesh processing.
//!
//! This crate provides the foundational types for UV-aware mesh algorithms:
//!
//! - [`UvMesh`] - An indexed triangle mesh with per-corner texture coordinates
//! - [`MeshError`] - Construction-time validation errors
//! - [`fixtures`] - Canonical test meshes shared across crates
//!
//! # Layer 0 Crate
//!
//! This crate has **zero GUI/engine dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Python bindings
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`. Texture
//! coordinates conventionally live in `[0, 1]²` but this is not enforced.
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system**. Face winding is
//! **counter-clockwise (CCW) when viewed from outside**.
//!
//! # Example
//!
//! ```
//! use mesh_types::{UvMesh, Point2, Point3};
//!
//! let mesh = UvMesh::from_parts(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.5, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//!     vec![
//!         Point2::new(0.0, 0.0),
//!         Point2::new(1.0, 0.0),
//!         Point2::new(0.5, 1.0),
//!     ],
//!     vec![[0, 1, 2]],
//! )
//! .unwrap();
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
pub mod fixtures;
mod mesh;

pub use error::MeshError;
pub use mesh::UvMesh;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};
