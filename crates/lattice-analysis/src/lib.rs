// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Phi Lattice Analysis
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Offline analysis over Zeckendorf decompositions: the index-sum
//! divergence series V/U/S and the log-scaled phase-space trajectory
//! built from it.
//!
//! Nothing here feeds the equilibrium gate; the series is an
//! exploratory view of how decompositions evolve along the integers.

pub mod divergence;
pub mod trajectory;

pub use divergence::{DivergenceMetrics, DivergenceSeries, SeriesValues, DEFAULT_MAX_N};
pub use trajectory::{PhasePoint, PhaseTrajectory, StablePoint, DEFAULT_MIN_STABILITY};
