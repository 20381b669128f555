// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Lattice Engine
// ─────────────────────────────────────────────────────────────────────
//! Single entry point wiring every component to one validated
//! configuration and one shared set of tables.

use std::sync::Arc;

use num_bigint::BigUint;

use lattice_types::{Coordinate, EquilibriumResult, LatticeConfig, LatticeResult};

use crate::cascade::{CascadeTrace, Combiner};
use crate::coordinate::CoordinateMapper;
use crate::decomposer::{Decomposer, Decomposition};
use crate::equilibrium::{EquilibriumDetector, StabilityState};
use crate::strategy::ConfidenceStrategy;
use crate::LatticeCache;

/// Facade over decomposition, combination, projection and detection.
///
/// All methods take `&self`; the engine can be shared across threads
/// behind an `Arc`. Session state lives in caller-owned
/// [`StabilityState`] values.
pub struct LatticeEngine {
    config: LatticeConfig,
    cache: Arc<LatticeCache>,
    decomposer: Decomposer,
    combiner: Combiner,
    mapper: CoordinateMapper,
    detector: EquilibriumDetector,
}

impl LatticeEngine {
    /// Validate `config`, build tables, and use the default confidence blend.
    pub fn new(config: LatticeConfig) -> LatticeResult<Self> {
        Self::build(config, None)
    }

    /// Same as [`LatticeEngine::new`] with a custom confidence strategy.
    pub fn with_strategy(
        config: LatticeConfig,
        strategy: Arc<dyn ConfidenceStrategy>,
    ) -> LatticeResult<Self> {
        Self::build(config, Some(strategy))
    }

    fn build(
        config: LatticeConfig,
        strategy: Option<Arc<dyn ConfidenceStrategy>>,
    ) -> LatticeResult<Self> {
        config.validate()?;
        let cache = Arc::new(LatticeCache::new(config.max_index)?);
        if config.prebuild_tables {
            cache.prebuild()?;
        }

        let detector = match strategy {
            Some(s) => EquilibriumDetector::with_strategy(config.clone(), cache.clone(), s),
            None => EquilibriumDetector::new(config.clone(), cache.clone()),
        };
        log::info!(
            "lattice engine ready: max_index={} tolerance={} threshold={:e} window={}",
            config.max_index,
            config.boundary_tolerance,
            config.stability_threshold,
            config.history_window
        );

        Ok(Self {
            decomposer: Decomposer::new(cache.clone()),
            combiner: Combiner::new(cache.clone()),
            mapper: CoordinateMapper::new(cache.clone()),
            detector,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<LatticeCache> {
        &self.cache
    }

    pub fn decomposer(&self) -> &Decomposer {
        &self.decomposer
    }

    pub fn combiner(&self) -> &Combiner {
        &self.combiner
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn detector(&self) -> &EquilibriumDetector {
        &self.detector
    }

    pub fn encode(&self, n: &BigUint) -> LatticeResult<Decomposition> {
        self.decomposer.encode(n)
    }

    pub fn decode(&self, d: &Decomposition) -> LatticeResult<BigUint> {
        self.decomposer.decode(d)
    }

    pub fn validate(&self, d: &Decomposition) -> LatticeResult<()> {
        self.decomposer.validate(d)
    }

    pub fn combine(&self, a: &Decomposition, b: &Decomposition) -> LatticeResult<Decomposition> {
        self.combiner.combine(a, b)
    }

    pub fn combine_traced(
        &self,
        a: &Decomposition,
        b: &Decomposition,
    ) -> LatticeResult<CascadeTrace> {
        self.combiner.combine_traced(a, b)
    }

    pub fn project(&self, d: &Decomposition) -> LatticeResult<Coordinate> {
        self.mapper.project(d)
    }

    /// Encode `n` and project it in one call.
    pub fn coordinate_of(&self, n: &BigUint) -> LatticeResult<Coordinate> {
        self.project(&self.encode(n)?)
    }

    pub fn new_state(&self) -> LatticeResult<StabilityState> {
        self.detector.new_state()
    }

    pub fn detect(
        &self,
        state: &mut StabilityState,
        n: &BigUint,
        stability: f64,
    ) -> LatticeResult<EquilibriumResult> {
        self.detector.detect(state, n, stability)
    }

    pub fn detect_with_aux(
        &self,
        state: &mut StabilityState,
        n: &BigUint,
        stability: f64,
        aux: Option<f64>,
    ) -> LatticeResult<EquilibriumResult> {
        self.detector.detect_with_aux(state, n, stability, aux)
    }
}
