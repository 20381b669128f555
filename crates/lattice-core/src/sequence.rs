// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Recurrence Sequence Tables
// ─────────────────────────────────────────────────────────────────────
//! Exact, lazily extended tables for the two integer recurrences
//! a(i) = a(i-1) + a(i-2) used by the kernel:
//!
//! - **Primary** (F0 = 0, F1 = 1): 0, 1, 1, 2, 3, 5, 8, …; the basis
//!   of every decomposition.
//! - **Companion** (L0 = 2, L1 = 1): 2, 1, 3, 4, 7, 11, …; used only
//!   by boundary detection.
//!
//! The two are distinct types so one can never be passed where the
//! other is expected. Neither has anything to do with the real
//! conjugate ψ = (1 − √5)/2 used by the coordinate mapper.
//!
//! Tables grow under a single-writer `RwLock` and are read-only once a
//! term exists. Indices above the configured cap are refused.

use std::marker::PhantomData;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use parking_lot::RwLock;

use lattice_types::{LatticeError, LatticeResult};

/// Seed pair of a recurrence table.
pub trait SeedPair: Send + Sync + 'static {
    const NAME: &'static str;
    const SEEDS: (u32, u32);
}

/// Marker for the primary (Fibonacci) recurrence.
#[derive(Debug)]
pub struct Primary;

/// Marker for the companion (Lucas) recurrence.
#[derive(Debug)]
pub struct Companion;

impl SeedPair for Primary {
    const NAME: &'static str = "primary";
    const SEEDS: (u32, u32) = (0, 1);
}

impl SeedPair for Companion {
    const NAME: &'static str = "companion";
    const SEEDS: (u32, u32) = (2, 1);
}

pub type PrimarySequence = RecurrenceTable<Primary>;
pub type CompanionSequence = RecurrenceTable<Companion>;

/// Memoised recurrence table bounded by `max_index`.
#[derive(Debug)]
pub struct RecurrenceTable<S: SeedPair> {
    max_index: usize,
    terms: RwLock<Vec<BigUint>>,
    _seeds: PhantomData<S>,
}

impl<S: SeedPair> RecurrenceTable<S> {
    pub fn new(max_index: usize) -> Self {
        let (a, b) = S::SEEDS;
        Self {
            max_index,
            terms: RwLock::new(vec![BigUint::from(a), BigUint::from(b)]),
            _seeds: PhantomData,
        }
    }

    pub fn max_index(&self) -> usize {
        self.max_index
    }

    /// Number of terms computed so far.
    pub fn len(&self) -> usize {
        self.terms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_index(&self, index: usize) -> LatticeResult<()> {
        if index > self.max_index {
            return Err(LatticeError::resource(
                format!("{} index {index} requested", S::NAME),
                self.max_index,
            ));
        }
        Ok(())
    }

    /// Extend the table so that `index` is present.
    pub fn extend_to(&self, index: usize) -> LatticeResult<()> {
        self.check_index(index)?;
        if self.terms.read().len() > index {
            return Ok(());
        }
        let mut terms = self.terms.write();
        let start = terms.len();
        while terms.len() <= index {
            let n = terms.len();
            let next = &terms[n - 1] + &terms[n - 2];
            terms.push(next);
        }
        if terms.len() > start {
            log::debug!(
                "{} table extended {} -> {} terms",
                S::NAME,
                start,
                terms.len()
            );
        }
        Ok(())
    }

    /// Extend until the last term exceeds `value` or the cap is reached.
    ///
    /// Returns the highest index now available.
    pub fn extend_covering(&self, value: &BigUint) -> usize {
        {
            let terms = self.terms.read();
            let last = terms.len() - 1;
            if terms[last] > *value || last >= self.max_index {
                return last;
            }
        }
        let mut terms = self.terms.write();
        let start = terms.len();
        while terms.len() <= self.max_index && terms[terms.len() - 1] <= *value {
            let n = terms.len();
            let next = &terms[n - 1] + &terms[n - 2];
            terms.push(next);
        }
        if terms.len() > start {
            log::debug!(
                "{} table extended {} -> {} terms to cover {value}",
                S::NAME,
                start,
                terms.len()
            );
        }
        terms.len() - 1
    }

    /// Eagerly build every term up to the cap.
    pub fn prebuild(&self) -> LatticeResult<()> {
        self.extend_to(self.max_index)
    }

    /// Exact term at `index`.
    pub fn term(&self, index: usize) -> LatticeResult<BigUint> {
        self.extend_to(index)?;
        Ok(self.terms.read()[index].clone())
    }

    /// Signed entry point: negative indices are rejected.
    pub fn generate(&self, index: i64) -> LatticeResult<BigUint> {
        let index = usize::try_from(index).map_err(|_| {
            LatticeError::InvalidArgument(format!("{} index must be >= 0, got {index}", S::NAME))
        })?;
        self.term(index)
    }

    /// Terms `start..=end`, cloned out of the table.
    pub fn range(&self, start: usize, end: usize) -> LatticeResult<Vec<BigUint>> {
        if end < start {
            return Err(LatticeError::InvalidArgument(format!(
                "{} range end {end} precedes start {start}",
                S::NAME
            )));
        }
        self.with_terms(end, |t| t[start..=end].to_vec())
    }

    /// Run `f` over terms `0..=upto` under a shared read lock.
    pub fn with_terms<R>(&self, upto: usize, f: impl FnOnce(&[BigUint]) -> R) -> LatticeResult<R> {
        self.extend_to(upto)?;
        let terms = self.terms.read();
        Ok(f(&terms[..=upto]))
    }

    /// Run `f` over every term computed so far.
    pub fn with_available<R>(&self, f: impl FnOnce(&[BigUint]) -> R) -> R {
        let terms = self.terms.read();
        f(&terms)
    }
}

impl RecurrenceTable<Primary> {
    /// F(n+1) / F(n), which converges to φ.
    pub fn golden_ratio_estimate(&self, n: usize) -> LatticeResult<f64> {
        if n == 0 {
            return Err(LatticeError::InvalidArgument(
                "golden ratio estimate needs n >= 1".to_string(),
            ));
        }
        let next = n.checked_add(1).ok_or_else(|| {
            LatticeError::resource(
                format!("{} index {n} + 1 requested", Primary::NAME),
                self.max_index,
            )
        })?;
        let (num, den) = self.with_terms(next, |t| (t[next].clone(), t[n].clone()))?;
        let num = num.to_f64().unwrap_or(f64::INFINITY);
        let den = den.to_f64().unwrap_or(f64::INFINITY);
        Ok(num / den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_primary_base_cases() {
        let f = PrimarySequence::new(200);
        let expected = [0u64, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
        for (i, &v) in expected.iter().enumerate() {
            assert_eq!(f.term(i).unwrap(), big(v), "F({i})");
        }
    }

    #[test]
    fn test_companion_base_cases() {
        let l = CompanionSequence::new(200);
        let expected = [2u64, 1, 3, 4, 7, 11, 18, 29, 47, 76, 123];
        for (i, &v) in expected.iter().enumerate() {
            assert_eq!(l.term(i).unwrap(), big(v), "L({i})");
        }
    }

    #[test]
    fn test_primary_large_exact() {
        let f = PrimarySequence::new(200);
        assert_eq!(f.term(100).unwrap().to_string(), "354224848179261915075");
    }

    #[test]
    fn test_lazy_growth() {
        let f = PrimarySequence::new(200);
        assert_eq!(f.len(), 2);
        f.term(30).unwrap();
        assert_eq!(f.len(), 31);
        f.term(10).unwrap();
        assert_eq!(f.len(), 31, "reads below the frontier must not grow the table");
    }

    #[test]
    fn test_prebuild_fills_to_cap() {
        let f = PrimarySequence::new(120);
        f.prebuild().unwrap();
        assert_eq!(f.len(), 121);
    }

    #[test]
    fn test_negative_index_rejected() {
        let f = PrimarySequence::new(200);
        let err = f.generate(-1).unwrap_err();
        assert!(matches!(err, LatticeError::InvalidArgument(_)));
        assert_eq!(f.generate(7).unwrap(), big(13));
    }

    #[test]
    fn test_index_beyond_cap() {
        let f = PrimarySequence::new(50);
        let err = f.term(51).unwrap_err();
        assert!(matches!(err, LatticeError::ResourceExceeded { cap: 50, .. }));
        assert!(f.term(50).is_ok());
    }

    #[test]
    fn test_lucas_fibonacci_identity() {
        // L(n) = F(n-1) + F(n+1)
        let f = PrimarySequence::new(200);
        let l = CompanionSequence::new(200);
        for n in 1..150 {
            let lhs = l.term(n).unwrap();
            let rhs = f.term(n - 1).unwrap() + f.term(n + 1).unwrap();
            assert_eq!(lhs, rhs, "identity failed at n={n}");
        }
    }

    #[test]
    fn test_extend_covering() {
        let f = PrimarySequence::new(200);
        let top = f.extend_covering(&big(100));
        // F(12) = 144 is the first term above 100
        assert_eq!(top, 12);
        assert!(f.term(top).unwrap() > big(100));
    }

    #[test]
    fn test_extend_covering_stops_at_cap() {
        let f = PrimarySequence::new(10);
        assert_eq!(f.extend_covering(&big(1_000_000)), 10);
    }

    #[test]
    fn test_golden_ratio_estimate() {
        let f = PrimarySequence::new(200);
        let ratio = f.golden_ratio_estimate(20).unwrap();
        assert!((ratio - 1.618_033_988_749_895).abs() < 1e-4);
        assert!(f.golden_ratio_estimate(0).is_err());
    }

    #[test]
    fn test_golden_ratio_estimate_at_limits() {
        let f = PrimarySequence::new(200);
        assert!(f.golden_ratio_estimate(199).is_ok());
        for n in [200, usize::MAX] {
            let err = f.golden_ratio_estimate(n).unwrap_err();
            assert!(
                matches!(err, LatticeError::ResourceExceeded { cap: 200, .. }),
                "n={n}: {err}"
            );
        }
    }

    #[test]
    fn test_range() {
        let l = CompanionSequence::new(50);
        let terms = l.range(3, 7).unwrap();
        let expected: Vec<BigUint> = [4u64, 7, 11, 18, 29].into_iter().map(big).collect();
        assert_eq!(terms, expected);
        assert_eq!(l.range(5, 5).unwrap(), vec![big(11)]);
        assert!(matches!(l.range(7, 3), Err(LatticeError::InvalidArgument(_))));
        assert!(matches!(
            l.range(40, 51),
            Err(LatticeError::ResourceExceeded { cap: 50, .. })
        ));
    }

    #[test]
    fn test_with_terms_slice_bounds() {
        let l = CompanionSequence::new(20);
        let len = l.with_terms(20, |t| t.len()).unwrap();
        assert_eq!(len, 21);
    }
}
