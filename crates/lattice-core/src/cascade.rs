// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Cascade Combiner
// ─────────────────────────────────────────────────────────────────────
//! Symbolic combination of two decompositions.
//!
//! 1. Symmetric difference of the two index sets.
//! 2. Normalize: while some `i, i+1` are both present, replace the
//!    pair with `i+2` (F(i) + F(i+1) = F(i+2)), lowest pair first,
//!    until no consecutive pair remains.
//!
//! The result is a new derived value. It is *not* the arithmetic sum
//! of the inputs: shared indices cancel, and a carry into an index that
//! is already present collapses onto it.
//!
//! Every normalize step removes two indices and inserts at most one, so
//! the loop runs fewer times than the symmetric difference has members.
//! That count is bounded by the highest input index, itself at most
//! log_φ(max value) + 2. The guard enforces that bound.

use std::collections::BTreeSet;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;

use lattice_types::{LatticeError, LatticeResult};

use crate::decomposer::Decomposition;
use crate::LatticeCache;

/// Slack added to the highest input index to form the loop guard.
pub const CASCADE_GUARD_SLACK: usize = 2;

/// A combination together with its normalize accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeTrace {
    pub result: Decomposition,
    /// Normalize steps performed.
    pub iterations: usize,
    /// Loop guard that was in force.
    pub bound: usize,
}

pub struct Combiner {
    cache: Arc<LatticeCache>,
}

impl Combiner {
    pub fn new(cache: Arc<LatticeCache>) -> Self {
        Self { cache }
    }

    /// Combine `a` and `b` into a new canonical decomposition.
    pub fn combine(&self, a: &Decomposition, b: &Decomposition) -> LatticeResult<Decomposition> {
        self.combine_traced(a, b).map(|trace| trace.result)
    }

    /// [`Combiner::combine`], also reporting iterations and the guard.
    pub fn combine_traced(
        &self,
        a: &Decomposition,
        b: &Decomposition,
    ) -> LatticeResult<CascadeTrace> {
        let cap = self.cache.max_index();
        let left: BTreeSet<usize> = a.indices().iter().copied().collect();
        let right: BTreeSet<usize> = b.indices().iter().copied().collect();
        let mut set: BTreeSet<usize> = left.symmetric_difference(&right).copied().collect();

        let highest = a
            .highest_index()
            .into_iter()
            .chain(b.highest_index())
            .max()
            .unwrap_or(0);
        let bound = highest + CASCADE_GUARD_SLACK;

        let iterations = normalize(&mut set, bound, cap).map_err(|e| {
            if e.is_invariant_violation() {
                log::error!("cascade inputs {:?} / {:?}", a.indices(), b.indices());
            }
            e
        })?;

        let indices: Vec<usize> = set.into_iter().rev().collect();
        let value = match indices.first() {
            Some(&top) => self
                .cache
                .primary()
                .with_terms(top, |t| indices.iter().map(|&i| &t[i]).sum())?,
            None => BigUint::zero(),
        };

        log::trace!("cascade settled after {iterations} steps (guard {bound})");
        Ok(CascadeTrace {
            result: Decomposition::from_parts(value, indices),
            iterations,
            bound,
        })
    }
}

/// Carry consecutive pairs, lowest first, until none remain.
///
/// Returns the number of carries. More than `bound` carries is an
/// invariant violation; a carry above `cap` exceeds the tables.
fn normalize(set: &mut BTreeSet<usize>, bound: usize, cap: usize) -> LatticeResult<usize> {
    let mut iterations = 0;
    while let Some(i) = lowest_consecutive(set) {
        iterations += 1;
        if iterations > bound {
            return Err(LatticeError::invariant(format!(
                "normalize did not settle within {bound} steps"
            )));
        }
        let carry = i + 2;
        if carry > cap {
            return Err(LatticeError::resource(
                format!("cascade carry into index {carry}"),
                cap,
            ));
        }
        set.remove(&i);
        set.remove(&(i + 1));
        set.insert(carry);
    }
    Ok(iterations)
}

/// Lowest `i` such that both `i` and `i+1` are in `set`.
fn lowest_consecutive(set: &BTreeSet<usize>) -> Option<usize> {
    let mut iter = set.iter().copied();
    let mut prev = iter.next()?;
    for i in iter {
        if i == prev + 1 {
            return Some(prev);
        }
        prev = i;
    }
    None
}
