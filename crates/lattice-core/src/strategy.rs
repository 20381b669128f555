// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Confidence Strategies
// ─────────────────────────────────────────────────────────────────────
//! Pluggable confidence scoring for the equilibrium detector.
//!
//! The blend of stability, boundary, advisory and Lyapunov signals is
//! heuristic, not derived from a model, so it sits behind a trait.
//! `WeightedBlend` is the default; `ExternalConfidence` lets a caller
//! supply any scoring function.

use lattice_types::LatticeConfig;

/// Signals available to a confidence strategy for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSignals {
    /// Stability scalar S (finite, ≥ 0).
    pub stability: f64,
    pub stability_threshold: f64,
    pub boundary_match: bool,
    /// Distance beyond the boundary tolerance; 0 when matched.
    pub boundary_excess: f64,
    pub lyapunov_ok: bool,
    /// Optional advisory score (finite, ≥ 0).
    pub aux: Option<f64>,
}

/// Trait for confidence scorers.
///
/// Returns a confidence in [0, 1]. Out-of-range or non-finite values
/// are clamped by the detector.
pub trait ConfidenceStrategy: Send + Sync {
    fn confidence(&self, signals: &ConfidenceSignals) -> f64;
}

/// Weighted blend of the four signals:
///
/// `w1·exp(−S/threshold) + w2·(1 | decay) + w3·min(1, aux/aux_threshold)
///  + w4·(1 | 0.5)`
///
/// When no advisory score is given its term is dropped and the remaining
/// weights are renormalised.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedBlend {
    pub w_stability: f64,
    pub w_boundary: f64,
    pub w_aux: f64,
    pub w_lyapunov: f64,
    pub aux_threshold: f64,
    pub boundary_decay_length: f64,
}

impl WeightedBlend {
    pub fn from_config(config: &LatticeConfig) -> Self {
        Self {
            w_stability: config.w_stability,
            w_boundary: config.w_boundary,
            w_aux: config.w_aux,
            w_lyapunov: config.w_lyapunov,
            aux_threshold: config.aux_threshold,
            boundary_decay_length: config.boundary_decay_length,
        }
    }

    fn boundary_term(&self, signals: &ConfidenceSignals) -> f64 {
        if signals.boundary_match {
            1.0
        } else {
            (-signals.boundary_excess / self.boundary_decay_length).exp()
        }
    }
}

impl Default for WeightedBlend {
    fn default() -> Self {
        Self::from_config(&LatticeConfig::default())
    }
}

impl ConfidenceStrategy for WeightedBlend {
    fn confidence(&self, signals: &ConfidenceSignals) -> f64 {
        let stability = (-signals.stability / signals.stability_threshold).exp();
        let lyapunov = if signals.lyapunov_ok { 1.0 } else { 0.5 };

        let mut total = self.w_stability * stability
            + self.w_boundary * self.boundary_term(signals)
            + self.w_lyapunov * lyapunov;
        let mut weight = self.w_stability + self.w_boundary + self.w_lyapunov;

        if let Some(aux) = signals.aux {
            total += self.w_aux * (aux / self.aux_threshold).min(1.0);
            weight += self.w_aux;
        }

        if weight <= 0.0 {
            return 0.0;
        }
        total / weight
    }
}

type ConfidenceFn = Box<dyn Fn(&ConfidenceSignals) -> f64 + Send + Sync>;

/// Confidence strategy backed by a caller-supplied function.
pub struct ExternalConfidence {
    score_fn: ConfidenceFn,
}

impl ExternalConfidence {
    pub fn new(score_fn: impl Fn(&ConfidenceSignals) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            score_fn: Box::new(score_fn),
        }
    }
}

impl ConfidenceStrategy for ExternalConfidence {
    fn confidence(&self, signals: &ConfidenceSignals) -> f64 {
        (self.score_fn)(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> ConfidenceSignals {
        ConfidenceSignals {
            stability: 0.0,
            stability_threshold: 1e-6,
            boundary_match: true,
            boundary_excess: 0.0,
            lyapunov_ok: true,
            aux: None,
        }
    }

    #[test]
    fn test_perfect_signals_give_one() {
        let blend = WeightedBlend::default();
        assert!((blend.confidence(&signals()) - 1.0).abs() < 1e-12);
        let with_aux = ConfidenceSignals {
            aux: Some(10.0),
            ..signals()
        };
        assert!((blend.confidence(&with_aux) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_renormalises_without_aux() {
        // stability term e^-1, others 1: (0.3e^-1 + 0.3 + 0.2) / 0.8
        let blend = WeightedBlend::default();
        let s = ConfidenceSignals {
            stability: 1e-6,
            ..signals()
        };
        let expected = (0.3 * (-1f64).exp() + 0.5) / 0.8;
        assert!((blend.confidence(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_aux_term_saturates() {
        let blend = WeightedBlend::default();
        let half = ConfidenceSignals {
            aux: Some(blend.aux_threshold / 2.0),
            ..signals()
        };
        // 0.3 + 0.3 + 0.2·0.5 + 0.2 = 0.9
        assert!((blend.confidence(&half) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_lyapunov_failure_halves_term() {
        let blend = WeightedBlend::default();
        let s = ConfidenceSignals {
            lyapunov_ok: false,
            ..signals()
        };
        // (0.3 + 0.3 + 0.2·0.5) / 0.8
        assert!((blend.confidence(&s) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_decay() {
        let blend = WeightedBlend::default();
        let near = ConfidenceSignals {
            boundary_match: false,
            boundary_excess: 1.0,
            ..signals()
        };
        let far = ConfidenceSignals {
            boundary_excess: 100.0,
            ..near
        };
        let c_near = blend.confidence(&near);
        let c_far = blend.confidence(&far);
        assert!(c_near > c_far);
        assert!(c_near < 1.0);
        // boundary term vanishes far away: (0.3 + 0.2) / 0.8
        assert!((c_far - 0.625).abs() < 1e-4);
    }

    #[test]
    fn test_zero_weights() {
        let blend = WeightedBlend {
            w_stability: 0.0,
            w_boundary: 0.0,
            w_aux: 1.0,
            w_lyapunov: 0.0,
            ..Default::default()
        };
        assert_eq!(blend.confidence(&signals()), 0.0);
    }

    #[test]
    fn test_external_confidence() {
        let strategy = ExternalConfidence::new(|s| if s.boundary_match { 0.42 } else { 0.0 });
        assert!((strategy.confidence(&signals()) - 0.42).abs() < 1e-12);
    }
}
