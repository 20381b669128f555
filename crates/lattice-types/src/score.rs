// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Phi Lattice Result Types
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// 2D projection of a decomposition onto golden-ratio powers.
///
/// Pure function of the decomposition; never persisted by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Σ (φ^i − ψ^i).
    pub q: f64,
    /// Σ (φ^i + ψ^i).
    pub p: f64,
    /// sqrt(q² + p²).
    pub energy: f64,
    /// atan2(p, q).
    pub phase: f64,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate {
        q: 0.0,
        p: 0.0,
        energy: 0.0,
        phase: 0.0,
    };

    pub fn from_qp(q: f64, p: f64) -> Self {
        Self {
            q,
            p,
            energy: q.hypot(p),
            phase: p.atan2(q),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.q.is_finite() && self.p.is_finite() && self.energy.is_finite() && self.phase.is_finite()
    }
}

/// Convergence state of a session. Non-terminal: re-evaluated on every
/// step and may revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EquilibriumPhase {
    #[default]
    Seeking,
    Converged,
}

impl fmt::Display for EquilibriumPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seeking => f.write_str("SEEKING"),
            Self::Converged => f.write_str("CONVERGED"),
        }
    }
}

/// Outcome of one equilibrium check. Pure output; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumResult {
    /// `stability_ok ∧ boundary_match ∧ lyapunov_ok` (∧ aux gate if required).
    pub is_equilibrium: bool,
    /// Blended confidence in [0, 1].
    pub confidence: f64,
    /// `n + 1` lies within tolerance of a companion term.
    pub boundary_match: bool,
    /// `S` below the stability threshold.
    pub stability_ok: bool,
    /// `V = S²` did not increase over the previous recorded value.
    pub lyapunov_ok: bool,
    /// Index of the companion term closest to `n + 1`.
    pub nearest_companion_index: usize,
    /// Exact `|(n + 1) − companion[nearest_companion_index]|`.
    pub distance: BigUint,
    /// Session phase after this step.
    pub phase: EquilibriumPhase,
}
