//! Seam-aware mesh decimation via 5D quadric error metrics.
//!
//! Classic quadric-error decimation treats a mesh as bare geometry and
//! shreds UV mappings in the process: collapses slide vertices across
//! texture-island boundaries and the atlas tears. This crate decimates
//! jointly in position and texture space. Every triangle contributes a
//! quadric over `(x, y, z, u, v)`, vertices on island boundaries keep one
//! quadric accumulator per UV chart, and each candidate collapse is placed
//! by a small equality-constrained quadratic program solved with a dual
//! active-set method.
//!
//! # Seam policies
//!
//! Seam handling is graded by [`Strictness`]:
//!
//! - [`Strictness::PreserveSeams`] (default) forbids collapses that would
//!   move or merge UV seams,
//! - [`Strictness::PenalizeSeams`] allows them at a cost multiplier,
//! - [`Strictness::IgnoreUv`] scores on 3D geometry alone.
//!
//! # Example
//!
//! ```
//! use mesh_decimate::{decimate, DecimateParams};
//! use mesh_types::fixtures::planar_grid;
//!
//! let mesh = planar_grid(6);
//! let result = decimate(&mesh, &DecimateParams::with_target_percent(50.0));
//! assert!(result.final_vertices < mesh.vertex_count());
//! println!("{result}");
//! ```
//!
//! The lower-level building blocks (connectivity, seam classification,
//! quadrics, the QP solver) are exported for callers composing their own
//! pipelines.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]
// Mesh indices are u32 by construction; narrowing from usize is checked by
// the validating constructors upstream.
#![allow(clippy::cast_possible_truncation)]

mod bundle;
mod connectivity;
mod cost;
mod decimate;
mod error;
mod foldover;
mod heap;
mod params;
mod quadprog;
mod quadric;
mod result;
mod seams;

pub use bundle::{half_edge_bundle, is_chart_split, Bundle, HalfEdge};
pub use connectivity::{build_edge_flaps, EdgeFlaps, NO_FACE};
pub use cost::{
    cost_and_placement, CollapseCandidate, CollapseContext, Placement, UvPlacement,
};
pub use decimate::{decimate, decimate_to_face_count};
pub use error::QuadprogError;
pub use foldover::{same_side, triangle_sign};
pub use heap::EdgeHeap;
pub use params::{DecimateParams, Strictness};
pub use quadprog::{solve_quadprog, solve_quadprog_opts, QpSolution};
pub use quadric::{
    compute_half_edge_qslim_5d, compute_plane_quadrics, ChartQuadrics, PlaneQuadric, Quadric,
};
pub use result::DecimationResult;
pub use seams::{build_seam_edges, SeamSet};
