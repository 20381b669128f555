// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Coordinate Mapper
// ─────────────────────────────────────────────────────────────────────
//! Projects a decomposition onto the plane spanned by golden-ratio
//! powers:
//!
//!   q = Σ (φ^i − ψ^i),  p = Σ (φ^i + ψ^i)
//!   energy = sqrt(q² + p²),  phase = atan2(p, q)
//!
//! with φ = (1 + √5)/2 and its real conjugate ψ = (1 − √5)/2.
//! This is the only floating-point stage of the pipeline; everything
//! upstream stays exact.

use std::sync::Arc;

use parking_lot::RwLock;

use lattice_types::{Coordinate, LatticeError, LatticeResult};

use crate::decomposer::Decomposition;
use crate::LatticeCache;

/// Golden ratio φ.
pub const PHI: f64 = 1.618_033_988_749_895;

/// Real algebraic conjugate ψ = 1 − φ, |ψ| < 1.
pub const PSI: f64 = -0.618_033_988_749_895;

/// One cached power pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerPair {
    pub phi: f64,
    pub psi: f64,
}

/// Lazily extended cache of φ^i and ψ^i, bounded by the sequence cap.
#[derive(Debug)]
pub struct PowerCache {
    max_index: usize,
    powers: RwLock<Vec<PowerPair>>,
}

impl PowerCache {
    pub fn new(max_index: usize) -> Self {
        Self {
            max_index,
            powers: RwLock::new(vec![PowerPair { phi: 1.0, psi: 1.0 }]),
        }
    }

    pub fn len(&self) -> usize {
        self.powers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extend_to(&self, index: usize) -> LatticeResult<()> {
        if index > self.max_index {
            return Err(LatticeError::resource(
                format!("power index {index} requested"),
                self.max_index,
            ));
        }
        if self.powers.read().len() > index {
            return Ok(());
        }
        let mut powers = self.powers.write();
        let start = powers.len();
        while powers.len() <= index {
            let i = powers.len() as i32;
            powers.push(PowerPair {
                phi: PHI.powi(i),
                psi: PSI.powi(i),
            });
        }
        log::debug!("power cache extended {} -> {} entries", start, powers.len());
        Ok(())
    }

    pub fn prebuild(&self) -> LatticeResult<()> {
        self.extend_to(self.max_index)
    }

    pub fn get(&self, index: usize) -> LatticeResult<PowerPair> {
        self.extend_to(index)?;
        Ok(self.powers.read()[index])
    }
}

/// Pure projection of decompositions to `Coordinate`s.
pub struct CoordinateMapper {
    cache: Arc<LatticeCache>,
}

impl CoordinateMapper {
    pub fn new(cache: Arc<LatticeCache>) -> Self {
        Self { cache }
    }

    /// Project `d` to its coordinate. The empty decomposition maps to
    /// the origin.
    pub fn project(&self, d: &Decomposition) -> LatticeResult<Coordinate> {
        let Some(top) = d.highest_index() else {
            return Ok(Coordinate::ORIGIN);
        };
        let powers = self.cache.powers();
        powers.extend_to(top)?;

        let (q, p) = {
            let table = powers.powers.read();
            d.indices().iter().fold((0.0, 0.0), |(q, p), &i| {
                let pair = table[i];
                (q + (pair.phi - pair.psi), p + (pair.phi + pair.psi))
            })
        };

        let coordinate = Coordinate::from_qp(q, p);
        if !coordinate.is_finite() {
            return Err(LatticeError::invariant(format!(
                "non-finite projection for highest index {top}: {coordinate:?}"
            )));
        }
        Ok(coordinate)
    }
}
