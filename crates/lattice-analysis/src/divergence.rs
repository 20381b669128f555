// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Index-Sum Divergence
// ─────────────────────────────────────────────────────────────────────
//! Index-sum series over Zeckendorf decompositions:
//!
//!   V(n) = Σ indices of n
//!   U(n) = Σ_{k=1..n} V(k)
//!   S(n) = Σ_{k=1..n} U(k)
//!
//! Values are exact `u64`; overflow is reported, never wrapped.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use lattice_core::{Decomposer, LatticeCache, LatticeEngine};
use lattice_types::{LatticeError, LatticeResult};

/// Default upper bound on `n` for a series.
pub const DEFAULT_MAX_N: u64 = 1_000_000;

/// One row of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesValues {
    pub n: u64,
    pub v: u64,
    pub u: u64,
    pub s: u64,
}

#[derive(Debug)]
struct Prefix {
    v: Vec<u64>,
    u: Vec<u64>,
    s: Vec<u64>,
}

impl Prefix {
    fn row(&self, n: usize) -> SeriesValues {
        SeriesValues {
            n: n as u64,
            v: self.v[n],
            u: self.u[n],
            s: self.s[n],
        }
    }
}

/// Memoised V/U/S prefix tables, grown on demand up to `max_n`.
pub struct DivergenceSeries {
    decomposer: Decomposer,
    max_n: u64,
    prefix: Mutex<Prefix>,
}

impl DivergenceSeries {
    pub fn new(cache: Arc<LatticeCache>, max_n: u64) -> Self {
        Self {
            decomposer: Decomposer::new(cache),
            max_n,
            prefix: Mutex::new(Prefix {
                v: vec![0],
                u: vec![0],
                s: vec![0],
            }),
        }
    }

    /// Series sharing the engine's tables.
    pub fn from_engine(engine: &LatticeEngine, max_n: u64) -> Self {
        Self::new(engine.cache().clone(), max_n)
    }

    pub fn max_n(&self) -> u64 {
        self.max_n
    }

    /// Number of memoised rows, including n = 0.
    pub fn len(&self) -> usize {
        self.prefix.lock().v.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cap(&self) -> usize {
        usize::try_from(self.max_n).unwrap_or(usize::MAX)
    }

    fn overflow(&self, what: impl fmt::Display) -> LatticeError {
        LatticeError::resource(format!("{what} overflows u64"), self.cap())
    }

    fn extend(&self, prefix: &mut Prefix, n: u64) -> LatticeResult<usize> {
        if n > self.max_n {
            return Err(LatticeError::resource(
                format!("divergence series n={n} requested"),
                self.cap(),
            ));
        }
        let target = usize::try_from(n)
            .map_err(|_| LatticeError::InvalidArgument(format!("n={n} not addressable")))?;
        let start = prefix.v.len();

        while prefix.v.len() <= target {
            let k = prefix.v.len();
            let v = self.decomposer.encode_u64(k as u64)?.index_sum();
            let u = prefix.u[k - 1]
                .checked_add(v)
                .ok_or_else(|| self.overflow(format!("U({k})")))?;
            let s = prefix.s[k - 1]
                .checked_add(u)
                .ok_or_else(|| self.overflow(format!("S({k})")))?;
            prefix.v.push(v);
            prefix.u.push(u);
            prefix.s.push(s);
        }

        if prefix.v.len() > start {
            log::debug!(
                "divergence series extended {} -> {} rows",
                start,
                prefix.v.len()
            );
        }
        Ok(target)
    }

    /// V, U and S at `n`.
    pub fn values(&self, n: u64) -> LatticeResult<SeriesValues> {
        let mut prefix = self.prefix.lock();
        let idx = self.extend(&mut prefix, n)?;
        Ok(prefix.row(idx))
    }

    pub fn v(&self, n: u64) -> LatticeResult<u64> {
        self.values(n).map(|r| r.v)
    }

    pub fn u(&self, n: u64) -> LatticeResult<u64> {
        self.values(n).map(|r| r.u)
    }

    pub fn s(&self, n: u64) -> LatticeResult<u64> {
        self.values(n).map(|r| r.s)
    }

    /// Rows `start..=end` under one lock.
    pub fn range(&self, start: u64, end: u64) -> LatticeResult<Vec<SeriesValues>> {
        check_range(start, end)?;
        let mut prefix = self.prefix.lock();
        let hi = self.extend(&mut prefix, end)?;
        let lo = start as usize;
        Ok((lo..=hi).map(|i| prefix.row(i)).collect())
    }

    /// Drop every memoised row except n = 0.
    pub fn clear(&self) {
        let mut prefix = self.prefix.lock();
        prefix.v.truncate(1);
        prefix.u.truncate(1);
        prefix.s.truncate(1);
    }
}

pub(crate) fn check_range(start: u64, end: u64) -> LatticeResult<()> {
    if end < start {
        return Err(LatticeError::InvalidArgument(format!(
            "range end {end} precedes start {start}"
        )));
    }
    Ok(())
}

/// Totals, means and maxima of V/U/S over a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceMetrics {
    pub range_start: u64,
    pub range_end: u64,
    pub total_v: u64,
    pub total_u: u64,
    pub total_s: u64,
    pub mean_v: f64,
    pub mean_u: f64,
    pub mean_s: f64,
    pub max_v: u64,
    pub max_u: u64,
    pub max_s: u64,
}

impl DivergenceMetrics {
    pub fn compute(series: &DivergenceSeries, start: u64, end: u64) -> LatticeResult<Self> {
        let rows = series.range(start, end)?;
        let sum = |f: fn(&SeriesValues) -> u64, name: &str| -> LatticeResult<u64> {
            rows.iter().try_fold(0u64, |acc, r| {
                acc.checked_add(f(r)).ok_or_else(|| {
                    series.overflow(format!("total {name} over [{start}, {end}]"))
                })
            })
        };
        let max = |f: fn(&SeriesValues) -> u64| rows.iter().map(f).max().unwrap_or(0);

        let total_v = sum(|r| r.v, "V")?;
        let total_u = sum(|r| r.u, "U")?;
        let total_s = sum(|r| r.s, "S")?;
        let count = rows.len() as f64;

        Ok(Self {
            range_start: start,
            range_end: end,
            total_v,
            total_u,
            total_s,
            mean_v: total_v as f64 / count,
            mean_u: total_u as f64 / count,
            mean_s: total_s as f64 / count,
            max_v: max(|r| r.v),
            max_u: max(|r| r.u),
            max_s: max(|r| r.s),
        })
    }
}
