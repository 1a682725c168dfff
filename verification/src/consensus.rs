//! Weighted consensus: pure functions over accumulated weights.
//!
//! Comparisons against the threshold are exact (cross-multiplied integers),
//! so a score that equals the threshold passes and rounding can never move a
//! claim across the boundary.

use crate::dispute::DisputeResult;
use attest_types::BPS_SCALE;
use serde::{Deserialize, Serialize};

/// A ratio in `[0, 1]` kept as an exact fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    numerator: u128,
    denominator: u128,
}

impl Ratio {
    /// The inconclusive midpoint, reported when no weight has been cast.
    pub const HALF: Self = Self {
        numerator: 1,
        denominator: 2,
    };

    /// `numerator / denominator`; `None` for a zero denominator or a value above one.
    pub fn new(numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 || numerator > denominator {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u128 {
        self.numerator
    }

    pub fn denominator(&self) -> u128 {
        self.denominator
    }

    /// The ratio in basis points, rounded down.
    pub fn as_bps(&self) -> u32 {
        let (n, d) = scaled(self.numerator, self.denominator);
        (n * BPS_SCALE as u128 / d) as u32
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// Which way a claim resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    True,
    False,
    Inconclusive,
}

/// Share of weight asserting `true`: `true / (true + false)`, or one half
/// when nothing has been cast.
pub fn weighted_score(true_weight: u128, false_weight: u128) -> Ratio {
    let total = true_weight.saturating_add(false_weight);
    if total == 0 {
        return Ratio::HALF;
    }
    // Saturation only bites beyond u128::MAX total weight; clamp to keep the ratio valid.
    Ratio::new(true_weight.min(total), total).unwrap_or(Ratio::HALF)
}

/// Compare a score against a threshold in basis points.
///
/// `ratio >= threshold` resolves True, `ratio <= 1 - threshold` resolves
/// False, anything between is inconclusive. Callers must treat
/// [`Direction::Inconclusive`] as a cancellation, never as a direction.
pub fn passes_threshold(ratio: Ratio, threshold_bps: u32) -> Direction {
    let threshold = threshold_bps.min(BPS_SCALE) as u128;
    let scale = BPS_SCALE as u128;
    let (n, d) = scaled(ratio.numerator, ratio.denominator);

    if n * scale >= threshold * d {
        Direction::True
    } else if n * scale <= (scale - threshold) * d {
        Direction::False
    } else {
        Direction::Inconclusive
    }
}

/// Simple weighted majority over a dispute's votes. Ties keep the original
/// resolution. An empty vote is reported as [`DisputeResult::NoQuorum`],
/// which is not upheld either.
pub fn dispute_majority(votes_for: u128, votes_against: u128) -> DisputeResult {
    if votes_for == 0 && votes_against == 0 {
        DisputeResult::NoQuorum
    } else if votes_for > votes_against {
        DisputeResult::Upheld
    } else {
        DisputeResult::Rejected
    }
}

/// Shrink a fraction until multiplying by the bps scale cannot overflow.
fn scaled(mut numerator: u128, mut denominator: u128) -> (u128, u128) {
    let limit = u128::MAX / BPS_SCALE as u128;
    while denominator > limit {
        numerator >>= 1;
        denominator >>= 1;
    }
    (numerator, denominator.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weight_is_half_and_inconclusive() {
        let score = weighted_score(0, 0);
        assert_eq!(score, Ratio::HALF);
        assert_eq!(score.as_bps(), 5_000);
        assert_eq!(passes_threshold(score, 5_001), Direction::Inconclusive);
        assert_eq!(passes_threshold(score, 10_000), Direction::Inconclusive);
    }

    #[test]
    fn reputation_weighted_majority_resolves_true() {
        let score = weighted_score(800, 200);
        assert_eq!(score.as_bps(), 8_000);
        assert_eq!(passes_threshold(score, 7_000), Direction::True);
    }

    #[test]
    fn equality_passes_in_both_directions() {
        assert_eq!(passes_threshold(weighted_score(7, 3), 7_000), Direction::True);
        assert_eq!(passes_threshold(weighted_score(3, 7), 7_000), Direction::False);
    }

    #[test]
    fn rounding_cannot_cross_the_boundary() {
        // 0.30004 rounds down to 3000 bps but is not <= 0.3.
        let score = weighted_score(30_004, 69_996);
        assert_eq!(score.as_bps(), 3_000);
        assert_eq!(passes_threshold(score, 7_000), Direction::Inconclusive);
        // 0.69999 is just short of 0.7.
        assert_eq!(
            passes_threshold(weighted_score(69_999, 30_001), 7_000),
            Direction::Inconclusive
        );
    }

    #[test]
    fn unanimous_threshold_requires_unanimity() {
        assert_eq!(passes_threshold(weighted_score(5, 0), 10_000), Direction::True);
        assert_eq!(passes_threshold(weighted_score(0, 5), 10_000), Direction::False);
        assert_eq!(
            passes_threshold(weighted_score(999, 1), 10_000),
            Direction::Inconclusive
        );
    }

    #[test]
    fn huge_weights_do_not_overflow() {
        let score = weighted_score(u128::MAX / 2, u128::MAX / 4);
        assert_eq!(passes_threshold(score, 6_000), Direction::True);
        assert_eq!(score.as_bps(), 6_666);
    }

    #[test]
    fn ratio_rejects_invalid_fractions() {
        assert!(Ratio::new(1, 0).is_none());
        assert!(Ratio::new(3, 2).is_none());
        assert_eq!(Ratio::new(1, 4).unwrap().as_f64(), 0.25);
    }

    #[test]
    fn dispute_majority_prefers_status_quo_on_ties() {
        assert_eq!(dispute_majority(0, 0), DisputeResult::NoQuorum);
        assert_eq!(dispute_majority(10, 10), DisputeResult::Rejected);
        assert_eq!(dispute_majority(11, 10), DisputeResult::Upheld);
        assert_eq!(dispute_majority(0, 1), DisputeResult::Rejected);
    }
}
