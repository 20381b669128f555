// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Phi Lattice Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Phi Lattice kernel: exact Zeckendorf arithmetic feeding an
//! equilibrium gate.

pub mod config;
pub mod error;
pub mod score;

pub use config::{LatticeConfig, MAX_SUPPORTED_INDEX, PHI_CUBED};
pub use error::{LatticeError, LatticeResult};
pub use score::{clamp_score, Coordinate, EquilibriumPhase, EquilibriumResult};
