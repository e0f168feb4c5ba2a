//! Arm scoring and argmax with stable tie-breaks.

use std::cmp::Ordering;

/// Upper-confidence score of one arm for one user context.
///
/// Arms with no data rank above every scored arm without putting an infinity
/// into the comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArmScore {
    /// Mean reweighted reward for the user plus the exploration bonus.
    Scored(f64),
    /// Never pulled overall, or never pulled for this user.
    Unseen,
}

impl ArmScore {
    /// UCB score from the sufficient statistics.
    ///
    /// `mean = reward_sum / user_count`, `bonus = sqrt(c * ln(t) / arm_count)`.
    pub fn ucb(
        reward_sum: f64,
        user_count: u64,
        arm_count: u64,
        total_rounds: u64,
        exploration_factor: f64,
    ) -> Self {
        if arm_count == 0 || user_count == 0 {
            return ArmScore::Unseen;
        }
        let mean = reward_sum / user_count as f64;
        let ln_t = (total_rounds.max(1) as f64).ln();
        let bonus = (exploration_factor * ln_t / arm_count as f64).sqrt();
        ArmScore::Scored(mean + bonus)
    }

    pub fn is_unseen(&self) -> bool {
        matches!(self, ArmScore::Unseen)
    }

    /// The numeric score, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            ArmScore::Scored(x) => Some(*x),
            ArmScore::Unseen => None,
        }
    }
}

impl PartialOrd for ArmScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ArmScore::Unseen, ArmScore::Unseen) => Some(Ordering::Equal),
            (ArmScore::Unseen, ArmScore::Scored(_)) => Some(Ordering::Greater),
            (ArmScore::Scored(_), ArmScore::Unseen) => Some(Ordering::Less),
            (ArmScore::Scored(a), ArmScore::Scored(b)) => a.partial_cmp(b),
        }
    }
}

/// Index of the greatest value; ties (and incomparable values) keep the earliest.
///
/// `candidates` yields `(arm, value)` pairs in increasing arm order.
pub fn argmax_first<T, I>(candidates: I) -> Option<usize>
where
    T: PartialOrd,
    I: IntoIterator<Item = (usize, T)>,
{
    let mut best: Option<(usize, T)> = None;
    for (arm, value) in candidates {
        let replace = match &best {
            Some((_, b)) => value.partial_cmp(b) == Some(Ordering::Greater),
            None => true,
        };
        if replace {
            best = Some((arm, value));
        }
    }
    best.map(|(arm, _)| arm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_beats_any_scored_value() {
        assert!(ArmScore::Unseen > ArmScore::Scored(f64::MAX));
        assert!(ArmScore::Scored(1e9) < ArmScore::Unseen);
        assert_eq!(
            ArmScore::Unseen.partial_cmp(&ArmScore::Unseen),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn ucb_is_unseen_without_data() {
        assert!(ArmScore::ucb(0.0, 0, 5, 10, 2.0).is_unseen());
        assert!(ArmScore::ucb(0.0, 3, 0, 10, 2.0).is_unseen());
    }

    #[test]
    fn ucb_adds_mean_and_bonus() {
        let s = ArmScore::ucb(3.0, 4, 8, 100, 2.0).value().unwrap();
        let expected = 0.75 + (2.0 * 100f64.ln() / 8.0).sqrt();
        assert!((s - expected).abs() < 1e-12);
    }

    #[test]
    fn bonus_shrinks_with_more_pulls() {
        let few = ArmScore::ucb(1.0, 2, 2, 100, 2.0).value().unwrap();
        let many = ArmScore::ucb(1.0, 2, 50, 100, 2.0).value().unwrap();
        assert!(many < few);
    }

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax_first([(0, 1.0), (1, 1.0), (2, 0.5)]), Some(0));
        assert_eq!(argmax_first([(1, 0.0), (3, 2.0), (4, 2.0)]), Some(3));
        assert_eq!(argmax_first(Vec::<(usize, f64)>::new()), None);
    }

    #[test]
    fn argmax_over_scores_picks_unseen_first() {
        let scores = [
            (0, ArmScore::Scored(5.0)),
            (1, ArmScore::Unseen),
            (2, ArmScore::Unseen),
        ];
        assert_eq!(argmax_first(scores), Some(1));
    }
}
