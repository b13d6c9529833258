//! Error types for the decimation crates.
//!
//! Infeasible quadratic programs and foldover rejections are *not* errors;
//! they surface as `cost = +inf` and are consumed by the decimation driver.
//! Only genuinely exceptional numerical conditions are reported here.

use thiserror::Error;

/// Errors from the quadratic-program solver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuadprogError {
    /// The objective matrix has a negative diagonal pivot and
    /// regularization was disabled.
    #[error("matrix is not positive definite (pivot {pivot} at row {row})")]
    NotPositiveDefinite {
        /// Row at which factorization failed.
        row: usize,
        /// The offending pivot value.
        pivot: f64,
    },

    /// The equality constraints are linearly dependent.
    #[error("equality constraints are linearly dependent")]
    DependentEqualities,

    /// Constraint matrices do not agree with the objective dimension.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}
