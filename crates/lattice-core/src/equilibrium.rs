// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Equilibrium Detector
// ─────────────────────────────────────────────────────────────────────
//! Stateful equilibrium gate layered on an externally supplied
//! stability scalar S.
//!
//! Three independent conditions, all required for equilibrium:
//!
//! 1. **Boundary**: `n + 1` lies within `boundary_tolerance` of the
//!    nearest companion-sequence term.
//! 2. **Stability**: `S < stability_threshold`.
//! 3. **Lyapunov**: `V = S²` does not exceed the previously recorded V
//!    (vacuously true on the first step).
//!
//! A session moves between SEEKING and CONVERGED on every step and may
//! revert. Its `StabilityState` is owned by the caller and mutated only
//! after every input has been validated.

use std::collections::VecDeque;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use lattice_types::score::clamp_score;
use lattice_types::{
    EquilibriumPhase, EquilibriumResult, LatticeConfig, LatticeError, LatticeResult,
};

use crate::strategy::{ConfidenceSignals, ConfidenceStrategy, WeightedBlend};
use crate::LatticeCache;

/// Per-session stability history.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityState {
    window: usize,
    current: Option<f64>,
    history: VecDeque<f64>,
    phase: EquilibriumPhase,
    steps: u64,
}

/// Plain-data export of a `StabilityState` for caller-side persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilitySnapshot {
    pub current: Option<f64>,
    /// V values, oldest first.
    pub history: Vec<f64>,
    pub phase: EquilibriumPhase,
    pub steps: u64,
}

impl StabilityState {
    /// Empty state retaining at most `window` V values.
    pub fn new(window: usize) -> LatticeResult<Self> {
        if window < 1 {
            return Err(LatticeError::InvalidArgument(format!(
                "history window must be >= 1, got {window}"
            )));
        }
        Ok(Self {
            window,
            current: None,
            history: VecDeque::with_capacity(window),
            phase: EquilibriumPhase::Seeking,
            steps: 0,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Most recently accepted S.
    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// Most recently recorded V = S².
    pub fn last_v(&self) -> Option<f64> {
        self.history.back().copied()
    }

    /// Recorded V values, oldest first.
    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    pub fn phase(&self) -> EquilibriumPhase {
        self.phase
    }

    /// Number of accepted steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Forget everything, as on a session restart.
    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
        self.phase = EquilibriumPhase::Seeking;
        self.steps = 0;
        log::info!("stability state reset");
    }

    pub fn export(&self) -> StabilitySnapshot {
        StabilitySnapshot {
            current: self.current,
            history: self.history.iter().copied().collect(),
            phase: self.phase,
            steps: self.steps,
        }
    }

    /// Rebuild a state from a snapshot, keeping the newest `window` values.
    pub fn restore(snapshot: StabilitySnapshot, window: usize) -> LatticeResult<Self> {
        let valid = |x: f64| x.is_finite() && x >= 0.0;
        if let Some(s) = snapshot.current {
            if !valid(s) {
                return Err(LatticeError::InvalidArgument(format!(
                    "snapshot current S must be finite and >= 0, got {s}"
                )));
            }
        }
        if let Some(bad) = snapshot.history.iter().find(|v| !valid(**v)) {
            return Err(LatticeError::InvalidArgument(format!(
                "snapshot history holds invalid V {bad}"
            )));
        }

        let mut state = Self::new(window)?;
        let skip = snapshot.history.len().saturating_sub(state.window);
        state.history.extend(snapshot.history.into_iter().skip(skip));
        state.current = snapshot.current;
        state.phase = snapshot.phase;
        state.steps = snapshot.steps;
        log::info!(
            "stability state restored: {} V values, phase {}",
            state.history.len(),
            state.phase
        );
        Ok(state)
    }

    fn record(&mut self, s: f64, v: f64, phase: EquilibriumPhase) {
        self.current = Some(s);
        self.history.push_back(v);
        if self.history.len() > self.window {
            self.history.pop_front();
        }
        self.phase = phase;
        self.steps += 1;
    }
}

/// Boundary/stability/Lyapunov equilibrium gate.
pub struct EquilibriumDetector {
    config: LatticeConfig,
    cache: Arc<LatticeCache>,
    strategy: Arc<dyn ConfidenceStrategy>,
}

impl EquilibriumDetector {
    pub fn new(config: LatticeConfig, cache: Arc<LatticeCache>) -> Self {
        let strategy = Arc::new(WeightedBlend::from_config(&config));
        Self::with_strategy(config, cache, strategy)
    }

    pub fn with_strategy(
        config: LatticeConfig,
        cache: Arc<LatticeCache>,
        strategy: Arc<dyn ConfidenceStrategy>,
    ) -> Self {
        Self {
            config,
            cache,
            strategy,
        }
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    /// Fresh session state sized by the configured window.
    pub fn new_state(&self) -> LatticeResult<StabilityState> {
        StabilityState::new(self.config.history_window)
    }

    /// Companion index closest to `target` and the exact distance.
    /// Ties resolve to the lower index.
    pub fn nearest_companion(&self, target: &BigUint) -> LatticeResult<(usize, BigUint)> {
        let companion = self.cache.companion();
        let cap = companion.max_index();
        let top = companion.extend_covering(target);

        companion.with_available(|terms| {
            if top == cap && terms[cap] < *target {
                return Err(LatticeError::resource(
                    format!("boundary target {target} lies above the last companion term"),
                    cap,
                ));
            }
            // terms[1..] = 1, 3, 4, 7, … is strictly increasing; L0 = 2 is
            // checked separately.
            let above = 1 + terms[1..=top].partition_point(|t| t < target);
            let mut candidates = vec![0];
            if above > 1 {
                candidates.push(above - 1);
            }
            candidates.push(above);

            let mut best: Option<(usize, BigUint)> = None;
            for i in candidates {
                let d = abs_diff(&terms[i], target);
                let closer = match &best {
                    Some((_, best_d)) => d < *best_d,
                    None => true,
                };
                if closer {
                    best = Some((i, d));
                }
            }
            best.ok_or_else(|| LatticeError::invariant("no companion candidate"))
        })
    }

    /// One equilibrium step without an advisory score.
    pub fn detect(
        &self,
        state: &mut StabilityState,
        n: &BigUint,
        stability: f64,
    ) -> LatticeResult<EquilibriumResult> {
        self.detect_with_aux(state, n, stability, None)
    }

    /// One equilibrium step. `state` changes only if this returns `Ok`.
    pub fn detect_with_aux(
        &self,
        state: &mut StabilityState,
        n: &BigUint,
        stability: f64,
        aux: Option<f64>,
    ) -> LatticeResult<EquilibriumResult> {
        if !stability.is_finite() || stability < 0.0 {
            log::warn!("detect rejected stability scalar {stability}");
            return Err(LatticeError::InvalidArgument(format!(
                "stability scalar must be finite and >= 0, got {stability}"
            )));
        }
        if let Some(a) = aux {
            if !a.is_finite() || a < 0.0 {
                log::warn!("detect rejected advisory score {a}");
                return Err(LatticeError::InvalidArgument(format!(
                    "advisory score must be finite and >= 0, got {a}"
                )));
            }
        }

        let target = n + 1u32;
        let (nearest_companion_index, distance) = self.nearest_companion(&target)?;

        let tolerance = BigUint::from(self.config.boundary_tolerance);
        let boundary_match = distance <= tolerance;
        let stability_ok = stability < self.config.stability_threshold;
        let v = stability * stability;
        let lyapunov_ok = state.last_v().map_or(true, |prev| v <= prev);
        let aux_ok = !self.config.require_aux
            || aux.is_some_and(|a| a >= self.config.aux_threshold);
        let is_equilibrium = stability_ok && boundary_match && lyapunov_ok && aux_ok;

        let boundary_excess = if boundary_match {
            0.0
        } else {
            (&distance - &tolerance).to_f64().unwrap_or(f64::INFINITY)
        };
        let signals = ConfidenceSignals {
            stability,
            stability_threshold: self.config.stability_threshold,
            boundary_match,
            boundary_excess,
            lyapunov_ok,
            aux,
        };
        let raw = self.strategy.confidence(&signals);
        if !raw.is_finite() {
            log::warn!("confidence strategy returned non-finite {raw}");
        }
        let confidence = clamp_score(raw, 0.0, 1.0);

        let phase = if is_equilibrium {
            EquilibriumPhase::Converged
        } else {
            EquilibriumPhase::Seeking
        };
        match (state.phase(), phase) {
            (EquilibriumPhase::Seeking, EquilibriumPhase::Converged) => {
                log::info!("equilibrium reached at n={n} (S={stability:.3e}, confidence {confidence:.4})");
            }
            (EquilibriumPhase::Converged, EquilibriumPhase::Seeking) => {
                log::warn!(
                    "equilibrium lost at n={n}: boundary={boundary_match} stability={stability_ok} lyapunov={lyapunov_ok}"
                );
            }
            _ => {}
        }
        state.record(stability, v, phase);

        Ok(EquilibriumResult {
            is_equilibrium,
            confidence,
            boundary_match,
            stability_ok,
            lyapunov_ok,
            nearest_companion_index,
            distance,
            phase,
        })
    }
}

fn abs_diff(a: &BigUint, b: &BigUint) -> BigUint {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ExternalConfidence;

    fn detector() -> EquilibriumDetector {
        detector_with(LatticeConfig::default())
    }

    fn detector_with(config: LatticeConfig) -> EquilibriumDetector {
        let cache = Arc::new(LatticeCache::new(config.max_index).unwrap());
        EquilibriumDetector::new(config, cache)
    }

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_boundary_positive_exact() {
        // L(10) = 123 → n = 122
        let det = detector();
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(122), 0.0).unwrap();
        assert!(r.boundary_match);
        assert_eq!(r.distance, big(0));
        assert_eq!(r.nearest_companion_index, 10);
    }

    #[test]
    fn test_boundary_positive_large_index() {
        let det = detector();
        let l150 = det.cache.companion().term(150).unwrap();
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &(l150 - 1u32), 0.0).unwrap();
        assert!(r.boundary_match);
        assert_eq!(r.distance, big(0));
        assert_eq!(r.nearest_companion_index, 150);
    }

    #[test]
    fn test_boundary_within_tolerance() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        // n + 1 = 124, one above L(10)
        let r = det.detect(&mut state, &big(123), 0.0).unwrap();
        assert!(r.boundary_match);
        assert_eq!(r.distance, big(1));
    }

    #[test]
    fn test_boundary_negative() {
        // L(12) = 322, L(13) = 521: n + 1 = 421 sits 99 from the nearer
        let det = detector();
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(420), 0.0).unwrap();
        assert!(!r.boundary_match);
        assert!(r.distance > big(50));
        assert!(!r.is_equilibrium);
    }

    #[test]
    fn test_nearest_small_targets() {
        let det = detector();
        // L0 = 2, L1 = 1, L2 = 3
        assert_eq!(det.nearest_companion(&big(1)).unwrap(), (1, big(0)));
        assert_eq!(det.nearest_companion(&big(2)).unwrap(), (0, big(0)));
        assert_eq!(det.nearest_companion(&big(3)).unwrap(), (2, big(0)));
        // |5 − L3| = 1, |L4 − 5| = 2
        assert_eq!(det.nearest_companion(&big(5)).unwrap(), (3, big(1)));
    }

    #[test]
    fn test_nearest_tie_prefers_lower_index() {
        // 9 is two from both L4 = 7 and L5 = 11
        let det = detector();
        assert_eq!(det.nearest_companion(&big(9)).unwrap(), (4, big(2)));
    }

    #[test]
    fn test_target_above_cap_rejected() {
        let det = detector_with(LatticeConfig {
            max_index: 10,
            ..Default::default()
        });
        let mut state = det.new_state().unwrap();
        // L(10) = 123; n + 1 = 124 is beyond the table
        let err = det.detect(&mut state, &big(123), 0.0).unwrap_err();
        assert!(matches!(err, LatticeError::ResourceExceeded { cap: 10, .. }));
        assert_eq!(state.steps(), 0);
        assert!(det.detect(&mut state, &big(122), 0.0).is_ok());
    }

    #[test]
    fn test_stability_threshold() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(122), 5e-7).unwrap();
        assert!(r.stability_ok);
        let r = det.detect(&mut state, &big(122), 1e-6).unwrap();
        assert!(!r.stability_ok, "threshold is strict");
    }

    #[test]
    fn test_rejects_nan_and_negative_without_mutation() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        det.detect(&mut state, &big(122), 1e-7).unwrap();
        let before = state.clone();

        for bad in [f64::NAN, -1e-9, f64::INFINITY] {
            let err = det.detect(&mut state, &big(122), bad).unwrap_err();
            assert!(matches!(err, LatticeError::InvalidArgument(_)), "{bad}");
            assert_eq!(state, before, "state mutated on rejected S={bad}");
        }
        let err = det
            .detect_with_aux(&mut state, &big(122), 1e-8, Some(f64::NAN))
            .unwrap_err();
        assert!(matches!(err, LatticeError::InvalidArgument(_)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_lyapunov_first_step_vacuous() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(122), 0.5).unwrap();
        assert!(r.lyapunov_ok);
        assert_eq!(state.last_v(), Some(0.25));
    }

    #[test]
    fn test_lyapunov_strictly_decreasing_sequence() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        for step in 0..20 {
            let s = 1.0 / (step as f64 + 1.0);
            let r = det.detect(&mut state, &big(500), s).unwrap();
            assert!(r.lyapunov_ok, "step {step} failed for S={s}");
        }
        assert_eq!(state.steps(), 20);
    }

    #[test]
    fn test_lyapunov_increase_detected() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        det.detect(&mut state, &big(122), 1e-8).unwrap();
        let r = det.detect(&mut state, &big(122), 2e-8).unwrap();
        assert!(!r.lyapunov_ok);
        assert!(!r.is_equilibrium);
        // equal V is not an increase
        let r = det.detect(&mut state, &big(122), 2e-8).unwrap();
        assert!(r.lyapunov_ok);
    }

    #[test]
    fn test_full_equilibrium_and_revert() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(122), 1e-8).unwrap();
        assert!(r.is_equilibrium);
        assert_eq!(r.phase, EquilibriumPhase::Converged);
        assert_eq!(state.phase(), EquilibriumPhase::Converged);
        assert!(r.confidence > 0.9, "confidence {}", r.confidence);

        // off-boundary: revert to seeking
        let r = det.detect(&mut state, &big(420), 1e-9).unwrap();
        assert!(!r.is_equilibrium);
        assert_eq!(state.phase(), EquilibriumPhase::Seeking);

        // and back
        let r = det.detect(&mut state, &big(122), 1e-10).unwrap();
        assert!(r.is_equilibrium);
        assert_eq!(state.phase(), EquilibriumPhase::Converged);
    }

    #[test]
    fn test_aux_is_advisory_by_default() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        let r = det
            .detect_with_aux(&mut state, &big(122), 1e-8, Some(0.0))
            .unwrap();
        assert!(r.is_equilibrium, "aux must not gate by default");
    }

    #[test]
    fn test_require_aux_gates() {
        let det = detector_with(LatticeConfig {
            require_aux: true,
            ..Default::default()
        });
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(122), 1e-8).unwrap();
        assert!(!r.is_equilibrium, "missing aux must fail the gate");
        let r = det
            .detect_with_aux(&mut state, &big(122), 1e-9, Some(1.0))
            .unwrap();
        assert!(!r.is_equilibrium, "aux below threshold must fail the gate");
        let r = det
            .detect_with_aux(&mut state, &big(122), 1e-10, Some(5.0))
            .unwrap();
        assert!(r.is_equilibrium);
    }

    #[test]
    fn test_history_window_eviction() {
        let det = detector_with(LatticeConfig {
            history_window: 5,
            ..Default::default()
        });
        let mut state = det.new_state().unwrap();
        for i in 0..12 {
            det.detect(&mut state, &big(122), i as f64).unwrap();
        }
        assert_eq!(state.history().len(), 5);
        assert_eq!(state.last_v(), Some(121.0));
        assert_eq!(state.history().front().copied(), Some(49.0));
    }

    #[test]
    fn test_custom_strategy() {
        let config = LatticeConfig::default();
        let cache = Arc::new(LatticeCache::new(config.max_index).unwrap());
        let det = EquilibriumDetector::with_strategy(
            config,
            cache,
            Arc::new(ExternalConfidence::new(|_| 0.25)),
        );
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(122), 0.0).unwrap();
        assert!((r.confidence - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_strategy_clamped() {
        let config = LatticeConfig::default();
        let cache = Arc::new(LatticeCache::new(config.max_index).unwrap());
        let det = EquilibriumDetector::with_strategy(
            config,
            cache,
            Arc::new(ExternalConfidence::new(|_| f64::NAN)),
        );
        let mut state = det.new_state().unwrap();
        let r = det.detect(&mut state, &big(122), 0.0).unwrap();
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        for s in [0.4, 0.3, 0.2] {
            det.detect(&mut state, &big(122), s).unwrap();
        }
        let json = serde_json::to_string(&state.export()).unwrap();
        let snapshot: StabilitySnapshot = serde_json::from_str(&json).unwrap();
        let restored = StabilityState::restore(snapshot, state.window()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_restore_truncates_and_validates() {
        let snapshot = StabilitySnapshot {
            current: Some(0.1),
            history: vec![5.0, 4.0, 3.0, 2.0, 1.0],
            phase: EquilibriumPhase::Seeking,
            steps: 5,
        };
        let state = StabilityState::restore(snapshot.clone(), 3).unwrap();
        assert_eq!(state.history().iter().copied().collect::<Vec<_>>(), vec![3.0, 2.0, 1.0]);

        let bad = StabilitySnapshot {
            history: vec![1.0, f64::NAN],
            ..snapshot
        };
        assert!(StabilityState::restore(bad, 3).is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            StabilityState::new(0),
            Err(LatticeError::InvalidArgument(_))
        ));
        let snapshot = StabilityState::new(4).unwrap().export();
        assert!(matches!(
            StabilityState::restore(snapshot, 0),
            Err(LatticeError::InvalidArgument(_))
        ));

        let det = detector_with(LatticeConfig {
            history_window: 0,
            ..Default::default()
        });
        assert!(det.new_state().is_err());
    }

    #[test]
    fn test_reset() {
        let det = detector();
        let mut state = det.new_state().unwrap();
        det.detect(&mut state, &big(122), 1e-8).unwrap();
        state.reset();
        assert_eq!(state, det.new_state().unwrap());
    }
}
