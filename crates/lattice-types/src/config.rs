// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Phi Lattice Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};

/// Largest `max_index` accepted. φ^1400 ≈ 1e292 keeps every projected
/// coordinate finite in `f64`.
pub const MAX_SUPPORTED_INDEX: usize = 1400;

/// φ³, the advisory score level treated as saturated.
pub const PHI_CUBED: f64 = 4.236_067_977_499_79;

/// Runtime configuration for the Phi Lattice kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// Highest sequence index any table may hold.
    /// Default: 200.
    pub max_index: usize,

    /// Build every table up to `max_index` when the engine is created,
    /// so steady-state operation never writes shared state.
    /// Default: true.
    pub prebuild_tables: bool,

    /// Boundary match if `|(n+1) − nearest companion| ≤ tolerance`.
    /// Default: 1.
    pub boundary_tolerance: u64,

    /// Decay length of the boundary-miss confidence term, in units of
    /// distance beyond the tolerance.
    /// Default: 8.0.
    pub boundary_decay_length: f64,

    /// Stability holds if `S < stability_threshold`.
    /// Default: 1e-6.
    pub stability_threshold: f64,

    /// Number of V = S² values retained per session.
    /// Default: 50.
    pub history_window: usize,

    /// Weight of the stability term in the confidence blend.
    /// Default: 0.3.
    pub w_stability: f64,

    /// Weight of the boundary term in the confidence blend.
    /// Default: 0.3.
    pub w_boundary: f64,

    /// Weight of the advisory term in the confidence blend.
    /// Default: 0.2.
    pub w_aux: f64,

    /// Weight of the Lyapunov term in the confidence blend.
    /// Default: 0.2.
    pub w_lyapunov: f64,

    /// Advisory score at which its confidence term saturates.
    /// Default: φ³.
    pub aux_threshold: f64,

    /// Gate `is_equilibrium` on `aux ≥ aux_threshold` as well.
    /// Default: false.
    pub require_aux: bool,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            max_index: 200,
            prebuild_tables: true,
            boundary_tolerance: 1,
            boundary_decay_length: 8.0,
            stability_threshold: 1e-6,
            history_window: 50,
            w_stability: 0.3,
            w_boundary: 0.3,
            w_aux: 0.2,
            w_lyapunov: 0.2,
            aux_threshold: PHI_CUBED,
            require_aux: false,
        }
    }
}

impl LatticeConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> LatticeResult<()> {
        if self.max_index < 3 || self.max_index > MAX_SUPPORTED_INDEX {
            return Err(LatticeError::Config(format!(
                "max_index must be in [3, {MAX_SUPPORTED_INDEX}], got {}",
                self.max_index
            )));
        }
        if !(self.stability_threshold.is_finite() && self.stability_threshold > 0.0) {
            return Err(LatticeError::Config(format!(
                "stability_threshold must be finite and > 0, got {}",
                self.stability_threshold
            )));
        }
        if !(self.boundary_decay_length.is_finite() && self.boundary_decay_length > 0.0) {
            return Err(LatticeError::Config(format!(
                "boundary_decay_length must be finite and > 0, got {}",
                self.boundary_decay_length
            )));
        }
        if !(self.aux_threshold.is_finite() && self.aux_threshold > 0.0) {
            return Err(LatticeError::Config(format!(
                "aux_threshold must be finite and > 0, got {}",
                self.aux_threshold
            )));
        }
        if self.history_window < 1 {
            return Err(LatticeError::Config(format!(
                "history_window must be >= 1, got {}",
                self.history_window
            )));
        }
        let weights = self.weights();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(LatticeError::Config(format!(
                "blend weights must be finite and >= 0, got {weights:?}"
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(LatticeError::Config(format!(
                "w_stability + w_boundary + w_aux + w_lyapunov must equal 1.0, got {total}"
            )));
        }
        Ok(())
    }

    /// `[w_stability, w_boundary, w_aux, w_lyapunov]`.
    pub fn weights(&self) -> [f64; 4] {
        [self.w_stability, self.w_boundary, self.w_aux, self.w_lyapunov]
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> LatticeResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LatticeError::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
