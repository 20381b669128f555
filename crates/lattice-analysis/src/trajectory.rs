// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Phase-Space Trajectory
// ─────────────────────────────────────────────────────────────────────
//! Log-scaled (V, U, S) phase space and the scans run over it.

use serde::{Deserialize, Serialize};

use lattice_types::{LatticeError, LatticeResult};

use crate::divergence::{DivergenceSeries, SeriesValues};

/// Default cut-off for `PhaseTrajectory::stable_points`.
pub const DEFAULT_MIN_STABILITY: f64 = 0.8;

/// Point in phase space. `x, y, z` are `ln` of V, U, S (0 when the
/// value is 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasePoint {
    pub n: u64,
    pub v: u64,
    pub u: u64,
    pub s: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

fn log_coord(value: u64) -> f64 {
    if value > 0 {
        (value as f64).ln()
    } else {
        0.0
    }
}

impl PhasePoint {
    pub fn from_values(values: SeriesValues) -> Self {
        Self {
            n: values.n,
            v: values.v,
            u: values.u,
            s: values.s,
            x: log_coord(values.v),
            y: log_coord(values.u),
            z: log_coord(values.s),
        }
    }

    pub fn at(series: &DivergenceSeries, n: u64) -> LatticeResult<Self> {
        series.values(n).map(Self::from_values)
    }

    pub fn distance_to(&self, other: &PhasePoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Finite-difference velocity from `self` to `other`; zero when both
    /// share the same `n`.
    pub fn velocity_to(&self, other: &PhasePoint) -> (f64, f64, f64) {
        let dt = other.n as f64 - self.n as f64;
        if dt == 0.0 {
            return (0.0, 0.0, 0.0);
        }
        (
            (other.x - self.x) / dt,
            (other.y - self.y) / dt,
            (other.z - self.z) / dt,
        )
    }

    pub fn speed_to(&self, other: &PhasePoint) -> f64 {
        let (vx, vy, vz) = self.velocity_to(other);
        (vx * vx + vy * vy + vz * vz).sqrt()
    }
}

/// A point whose neighbourhood is tightly clustered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StablePoint {
    pub n: u64,
    pub v: u64,
    pub u: u64,
    pub s: u64,
    /// Mean of `1 / (1 + distance)` over the neighbourhood, in (0, 1].
    pub stability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTrajectory {
    pub start: u64,
    pub end: u64,
    pub points: Vec<PhasePoint>,
}

impl PhaseTrajectory {
    /// Trajectory over `start..=end`.
    pub fn new(series: &DivergenceSeries, start: u64, end: u64) -> LatticeResult<Self> {
        let points = series
            .range(start, end)?
            .into_iter()
            .map(PhasePoint::from_values)
            .collect();
        Ok(Self { start, end, points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of consecutive point distances.
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    /// `n` of every point whose speed to its successor is below `threshold`.
    pub fn find_quiet_points(&self, threshold: f64) -> Vec<u64> {
        self.points
            .windows(2)
            .filter(|w| w[0].speed_to(&w[1]) < threshold)
            .map(|w| w[0].n)
            .collect()
    }

    /// Points whose inverse-distance stability over `window` neighbours
    /// on each side exceeds `min_stability`.
    ///
    /// Only points with a full window on both sides are scanned.
    pub fn stable_points(
        &self,
        window: usize,
        min_stability: f64,
    ) -> LatticeResult<Vec<StablePoint>> {
        if window == 0 {
            return Err(LatticeError::InvalidArgument(
                "stability window must be >= 1".to_string(),
            ));
        }
        if !min_stability.is_finite() {
            return Err(LatticeError::InvalidArgument(format!(
                "min_stability must be finite, got {min_stability}"
            )));
        }

        let len = self.points.len();
        if len < 2 * window + 1 {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for i in window..len - window {
            let point = &self.points[i];
            let total: f64 = (i - window..=i + window)
                .filter(|&j| j != i)
                .map(|j| 1.0 / (1.0 + point.distance_to(&self.points[j])))
                .sum();
            let stability = total / (2 * window) as f64;

            if stability > min_stability {
                found.push(StablePoint {
                    n: point.n,
                    v: point.v,
                    u: point.u,
                    s: point.s,
                    stability,
                });
            }
        }

        log::debug!(
            "stable point scan over [{}, {}] (window {window}): {} found",
            self.start,
            self.end,
            found.len()
        );
        Ok(found)
    }
}
