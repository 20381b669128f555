// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Shared Lattice Tables
// ─────────────────────────────────────────────────────────────────────
//! Primary, companion and power tables bundled under one cap and shared
//! by every component through an `Arc`.

use std::time::Instant;

use lattice_types::{LatticeError, LatticeResult};

use crate::coordinate::PowerCache;
use crate::sequence::{CompanionSequence, PrimarySequence};

/// Smallest cap that still holds a canonical index (F2) and its carry.
pub const MIN_CAP: usize = 3;

#[derive(Debug)]
pub struct LatticeCache {
    max_index: usize,
    primary: PrimarySequence,
    companion: CompanionSequence,
    powers: PowerCache,
}

impl LatticeCache {
    /// Empty tables that grow lazily up to `max_index`.
    pub fn new(max_index: usize) -> LatticeResult<Self> {
        if max_index < MIN_CAP {
            return Err(LatticeError::InvalidArgument(format!(
                "max_index must be >= {MIN_CAP}, got {max_index}"
            )));
        }
        Ok(Self {
            max_index,
            primary: PrimarySequence::new(max_index),
            companion: CompanionSequence::new(max_index),
            powers: PowerCache::new(max_index),
        })
    }

    /// Tables filled to the cap up front.
    pub fn prebuilt(max_index: usize) -> LatticeResult<Self> {
        let cache = Self::new(max_index)?;
        cache.prebuild()?;
        Ok(cache)
    }

    /// Fill every table to the cap.
    pub fn prebuild(&self) -> LatticeResult<()> {
        let start = Instant::now();
        self.primary.prebuild()?;
        self.companion.prebuild()?;
        self.powers.prebuild()?;
        log::info!(
            "lattice tables prebuilt to index {} in {:.2} ms",
            self.max_index,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    pub fn max_index(&self) -> usize {
        self.max_index
    }

    pub fn primary(&self) -> &PrimarySequence {
        &self.primary
    }

    pub fn companion(&self) -> &CompanionSequence {
        &self.companion
    }

    pub fn powers(&self) -> &PowerCache {
        &self.powers
    }
}
