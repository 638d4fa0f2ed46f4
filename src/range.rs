//! Deterministic partitioning of a job's record space into fixed-size ranges.

use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` of record indices within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(end > start);
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Partition `[0, amount)` into `step`-sized ranges (the last one truncated).
///
/// Pure and deterministic: re-running with the same `(amount, step)` always
/// reproduces the same ranges, which is what makes artifact existence a valid
/// resume signal across runs. `amount == 0` plans nothing.
pub fn plan(amount: u64, step: u64) -> Vec<Range> {
    debug_assert!(step > 0);
    let mut ranges = Vec::with_capacity(amount.div_ceil(step) as usize);
    let mut start = 0;
    while start < amount {
        let end = (start + step).min(amount);
        ranges.push(Range { start, end });
        start = end;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_amount_plans_nothing() {
        assert!(plan(0, 5000).is_empty());
    }

    #[test]
    fn test_exact_multiple() {
        let ranges = plan(10_000, 5000);
        assert_eq!(
            ranges,
            vec![Range::new(0, 5000), Range::new(5000, 10_000)]
        );
    }

    #[test]
    fn test_truncated_tail() {
        let ranges = plan(12_000, 5000);
        assert_eq!(
            ranges,
            vec![
                Range::new(0, 5000),
                Range::new(5000, 10_000),
                Range::new(10_000, 12_000),
            ]
        );
    }

    #[test]
    fn test_amount_smaller_than_step() {
        assert_eq!(plan(3, 5000), vec![Range::new(0, 3)]);
    }

    #[test]
    fn test_partition_invariant() {
        // Disjoint, contiguous, union exactly [0, amount), ceil(amount/step) ranges.
        for amount in [0u64, 1, 7, 4999, 5000, 5001, 12_000, 99_999] {
            for step in [1u64, 7, 5000] {
                let ranges = plan(amount, step);
                assert_eq!(ranges.len() as u64, amount.div_ceil(step));

                let mut expected_start = 0;
                for r in &ranges {
                    assert_eq!(r.start, expected_start);
                    assert!(r.end > r.start);
                    assert!(r.len() <= step);
                    expected_start = r.end;
                }
                assert_eq!(expected_start, amount);
            }
        }
    }
}
