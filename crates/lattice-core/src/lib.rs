// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Phi Lattice Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Exact Zeckendorf decomposition, cascade combination, golden-ratio
//! projection and equilibrium detection.
//!
//! Pipeline: integer → `Decomposer::encode` → `Decomposition` →
//! `Combiner::combine` / `CoordinateMapper::project` →
//! `EquilibriumDetector::detect` against a caller-supplied stability
//! scalar.
//!
//! # Invariants
//!
//! 1. **Canonical form**: every `Decomposition` handed out has strictly
//!    descending indices ≥ 2 with gaps of at least 2, and its value is
//!    the exact sum of the primary terms it names.
//!
//! 2. **Bounded work**: every table refuses indices above
//!    `max_index`, and the cascade loop carries an explicit guard
//!    derived from its inputs. Overrun is an error, never a hang.
//!
//! 3. **Exact integers**: sequence terms and decomposition values are
//!    arbitrary precision. Floating point enters only at projection and
//!    confidence scoring.
//!
//! 4. **Atomic steps**: `detect` validates every input before touching
//!    the caller's `StabilityState`; a rejected step leaves it as it was.

pub mod cache;
pub mod cascade;
pub mod coordinate;
pub mod decomposer;
pub mod engine;
pub mod equilibrium;
pub mod sequence;
pub mod strategy;

pub use cache::{LatticeCache, MIN_CAP};
pub use cascade::{CascadeTrace, Combiner};
pub use coordinate::{CoordinateMapper, PowerCache, PHI, PSI};
pub use decomposer::{Decomposer, Decomposition};
pub use engine::LatticeEngine;
pub use equilibrium::{EquilibriumDetector, StabilitySnapshot, StabilityState};
pub use sequence::{Companion, CompanionSequence, Primary, PrimarySequence, RecurrenceTable};
pub use strategy::{ConfidenceSignals, ConfidenceStrategy, ExternalConfidence, WeightedBlend};
