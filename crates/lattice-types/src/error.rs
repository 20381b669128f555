// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Phi Lattice Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Phi Lattice failures.
///
/// Every operation either fully succeeds or fails with one of these
/// without mutating any state. Identical inputs always produce the
/// identical error, so retrying inside the kernel is never useful.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LatticeError {
    /// Negative, NaN, infinite or otherwise malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Index or value beyond the configured sequence cap.
    #[error("resource exceeded: {detail} (cap = {cap})")]
    ResourceExceeded { detail: String, cap: usize },

    /// An internal guarantee failed. Unreachable in a correct build.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl LatticeError {
    pub fn resource(detail: impl Into<String>, cap: usize) -> Self {
        Self::ResourceExceeded {
            detail: detail.into(),
            cap,
        }
    }

    /// Build an `InvariantViolation`, logging it at error level first.
    pub fn invariant(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::error!("lattice invariant violated: {detail}");
        Self::InvariantViolation(detail)
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

pub type LatticeResult<T> = Result<T, LatticeError>;
