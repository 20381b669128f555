// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Zeckendorf Decomposer
// ─────────────────────────────────────────────────────────────────────
//! Canonical decomposition of a non-negative integer into a set of
//! non-consecutive primary-sequence indices (Zeckendorf's theorem).
//!
//! Indexing convention: F0 = 0, F1 = 1, F2 = 1, F3 = 2, F4 = 3, …
//! Canonical index sets only use indices ≥ 2, so
//! `encode(100) = {11, 6, 4}` (89 + 8 + 3).
//!
//! Encoding is a greedy descent: take the largest `i` with
//! `F(i) ≤ remaining`, subtract, and continue from `i − 2`. The whole
//! path is exact integer arithmetic.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;

use lattice_types::{LatticeError, LatticeResult};

use crate::LatticeCache;

/// Lowest index a canonical decomposition may use.
pub const MIN_INDEX: usize = 2;

/// A canonical decomposition.
///
/// `indices` are strictly decreasing with pairwise gaps ≥ 2 and
/// `Σ F(i) == value`. Only the decomposer and the combiner construct
/// these, so the invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Decomposition {
    value: BigUint,
    indices: Vec<usize>,
}

impl Decomposition {
    pub(crate) fn from_parts(value: BigUint, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] >= w[1] + 2));
        Self { value, indices }
    }

    /// Decomposition of zero.
    pub fn empty() -> Self {
        Self {
            value: BigUint::zero(),
            indices: Vec::new(),
        }
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Indices, highest first.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn highest_index(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of terms (Zeckendorf weight).
    pub fn weight(&self) -> usize {
        self.indices.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Sum of the indices, V(n) in divergence terms.
    pub fn index_sum(&self) -> u64 {
        self.indices.iter().map(|&i| i as u64).sum()
    }

    /// Bit string, most significant first: bit `k` from the right is
    /// set iff index `k + 2` is present. Zero renders as `"0"`.
    pub fn to_bit_string(&self) -> String {
        let Some(top) = self.highest_index() else {
            return "0".to_string();
        };
        (MIN_INDEX..=top)
            .rev()
            .map(|i| if self.contains(i) { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.indices.is_empty() {
            return f.write_str("0");
        }
        let terms: Vec<String> = self.indices.iter().map(|i| format!("F{i}")).collect();
        write!(f, "{} = {}", self.value, terms.join(" + "))
    }
}

/// Encodes and decodes integers over the primary sequence.
pub struct Decomposer {
    cache: Arc<LatticeCache>,
}

impl Decomposer {
    pub fn new(cache: Arc<LatticeCache>) -> Self {
        Self { cache }
    }

    pub fn max_index(&self) -> usize {
        self.cache.max_index()
    }

    /// Largest value whose decomposition fits under the cap: F(cap+1) − 1.
    pub fn max_encodable(&self) -> LatticeResult<BigUint> {
        let cap = self.max_index();
        self.cache
            .primary()
            .with_terms(cap, |t| &t[cap] + &t[cap - 1] - 1u32)
    }

    /// Greedy Zeckendorf encoding of `n`.
    pub fn encode(&self, n: &BigUint) -> LatticeResult<Decomposition> {
        if n.is_zero() {
            return Ok(Decomposition::empty());
        }
        let primary = self.cache.primary();
        let cap = primary.max_index();
        let top = primary.extend_covering(n);

        primary.with_available(|terms| {
            if top == cap && *n >= &terms[cap] + &terms[cap - 1] {
                log::warn!("encode rejected: value needs an index above cap {cap}");
                return Err(LatticeError::resource(
                    format!("value {n} needs an index above the cap"),
                    cap,
                ));
            }

            let mut remaining = n.clone();
            let mut indices = Vec::new();
            let mut hi = top;
            loop {
                if hi < MIN_INDEX {
                    return Err(LatticeError::invariant(format!(
                        "greedy descent exhausted indices with {remaining} left while encoding {n}"
                    )));
                }
                // terms[2..] is strictly increasing
                let taken = terms[MIN_INDEX..=hi].partition_point(|t| *t <= remaining);
                if taken == 0 {
                    return Err(LatticeError::invariant(format!(
                        "no primary term <= {remaining} while encoding {n}"
                    )));
                }
                let i = MIN_INDEX + taken - 1;
                indices.push(i);
                remaining -= &terms[i];
                if remaining.is_zero() {
                    break;
                }
                hi = i.saturating_sub(2);
            }
            Ok(Decomposition::from_parts(n.clone(), indices))
        })
    }

    pub fn encode_u64(&self, n: u64) -> LatticeResult<Decomposition> {
        self.encode(&BigUint::from(n))
    }

    /// Encode every value, failing on the first one that does not fit.
    pub fn encode_batch(&self, values: &[BigUint]) -> LatticeResult<Vec<Decomposition>> {
        values.iter().map(|n| self.encode(n)).collect()
    }

    /// Σ F(i) over the indices of `d`.
    pub fn decode(&self, d: &Decomposition) -> LatticeResult<BigUint> {
        let Some(top) = d.highest_index() else {
            return Ok(BigUint::zero());
        };
        self.cache
            .primary()
            .with_terms(top, |t| d.indices.iter().map(|&i| &t[i]).sum())
    }

    /// Guard for decompositions crossing into the kernel: canonical
    /// indices, consistent value.
    pub fn validate(&self, d: &Decomposition) -> LatticeResult<()> {
        self.check_indices(&d.indices)?;
        let sum = self.decode(d)?;
        if sum != d.value {
            return Err(LatticeError::invariant(format!(
                "decomposition value {} disagrees with its indices (sum {sum})",
                d.value
            )));
        }
        Ok(())
    }

    /// Build a decomposition from an externally supplied index set.
    ///
    /// Order does not matter. Duplicates and indices below 2 are
    /// invalid arguments; consecutive indices are an invariant violation.
    pub fn from_indices(&self, indices: &[usize]) -> LatticeResult<Decomposition> {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(LatticeError::InvalidArgument(format!(
                "duplicate index {}",
                w[0]
            )));
        }
        self.check_indices(&sorted)?;
        let d = Decomposition::from_parts(BigUint::zero(), sorted);
        let value = self.decode(&d)?;
        Ok(Decomposition { value, ..d })
    }

    /// Parse the form produced by [`Decomposition::to_bit_string`].
    pub fn parse_bit_string(&self, bits: &str) -> LatticeResult<Decomposition> {
        if bits.is_empty() {
            return Err(LatticeError::InvalidArgument(
                "empty bit string".to_string(),
            ));
        }
        let len = bits.len();
        let mut indices = Vec::new();
        for (pos, c) in bits.chars().enumerate() {
            match c {
                '1' => indices.push(len - 1 - pos + MIN_INDEX),
                '0' => {}
                other => {
                    return Err(LatticeError::InvalidArgument(format!(
                        "invalid bit character {other:?}"
                    )))
                }
            }
        }
        self.from_indices(&indices)
    }

    /// True if `n` is itself a primary term (weight 1).
    pub fn is_primary_term(&self, n: &BigUint) -> LatticeResult<bool> {
        Ok(self.encode(n)?.weight() == 1)
    }

    fn check_indices(&self, indices: &[usize]) -> LatticeResult<()> {
        let cap = self.max_index();
        for &i in indices {
            if i < MIN_INDEX {
                return Err(LatticeError::InvalidArgument(format!(
                    "index {i} is below the canonical minimum {MIN_INDEX}"
                )));
            }
            if i > cap {
                return Err(LatticeError::resource(format!("index {i} present"), cap));
            }
        }
        for w in indices.windows(2) {
            if w[0] <= w[1] {
                return Err(LatticeError::InvalidArgument(format!(
                    "indices must be strictly decreasing, found {} before {}",
                    w[0], w[1]
                )));
            }
            if w[0] == w[1] + 1 {
                return Err(LatticeError::invariant(format!(
                    "consecutive indices {} and {}",
                    w[0], w[1]
                )));
            }
        }
        Ok(())
    }
}
