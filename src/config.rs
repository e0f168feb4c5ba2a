//! Problem instance and tuning configuration.
//!
//! [`Instance`] is everything the environment tells the planner up front; it is
//! immutable for the planner's lifetime. [`PlannerConfig`] holds the knobs that
//! are ours to tune (regime cutoff, exploration strength, window scale).

use crate::error::{PlannerError, Result};

/// Tolerance on `sum(user_distribution) == 1`.
///
/// Only per-user probabilities are ever read, so distributions rounded to a
/// few decimals (three users at `0.333`) are accepted.
const DISTRIBUTION_TOL: f64 = 1e-2;

/// Problem instance known to the planner at construction time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    /// Total number of rounds in the run.
    pub num_rounds: u64,
    /// Rounds per phase.
    pub phase_len: u64,
    /// Number of arms; arms are indexed `0..num_arms`.
    pub num_arms: usize,
    /// Number of user contexts; users are indexed `0..num_users`.
    pub num_users: usize,
    /// Minimum activations per phase for each arm to stay active.
    pub arm_thresholds: Vec<u64>,
    /// Sampling probability of each user context.
    pub user_distribution: Vec<f64>,
}

impl Instance {
    /// Check the instance for parameters the planner cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.num_rounds == 0 {
            return Err(PlannerError::ZeroParameter("num_rounds"));
        }
        if self.phase_len == 0 {
            return Err(PlannerError::ZeroParameter("phase_len"));
        }
        if self.num_arms == 0 {
            return Err(PlannerError::ZeroParameter("num_arms"));
        }
        if self.num_users == 0 {
            return Err(PlannerError::ZeroParameter("num_users"));
        }
        if self.arm_thresholds.len() != self.num_arms {
            return Err(PlannerError::LengthMismatch {
                what: "arm_thresholds",
                expected: self.num_arms,
                actual: self.arm_thresholds.len(),
            });
        }
        if self.user_distribution.len() != self.num_users {
            return Err(PlannerError::LengthMismatch {
                what: "user_distribution",
                expected: self.num_users,
                actual: self.user_distribution.len(),
            });
        }
        for (arm, &threshold) in self.arm_thresholds.iter().enumerate() {
            if threshold > self.phase_len {
                return Err(PlannerError::ThresholdUnreachable {
                    arm,
                    threshold,
                    phase_len: self.phase_len,
                });
            }
        }
        let mut total = 0.0;
        for (user, &probability) in self.user_distribution.iter().enumerate() {
            if !(probability.is_finite() && probability > 0.0 && probability <= 1.0) {
                return Err(PlannerError::InvalidProbability { user, probability });
            }
            total += probability;
        }
        if (total - 1.0).abs() > DISTRIBUTION_TOL {
            return Err(PlannerError::DistributionNotNormalized { total });
        }
        Ok(())
    }

    /// Uniform user distribution over `num_users` contexts.
    pub fn uniform_users(num_users: usize) -> Vec<f64> {
        let n = num_users.max(1) as f64;
        vec![1.0 / n; num_users]
    }

    /// Skew of the user distribution: `(max - min) / (max + min)`, in `[0, 1)`.
    ///
    /// `0` for a uniform distribution.
    pub fn user_skew(&self) -> f64 {
        let (lo, hi) = self
            .user_distribution
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            });
        let denom = hi + lo;
        if !denom.is_finite() || denom <= 0.0 {
            return 0.0;
        }
        (hi - lo) / denom
    }
}

/// Tuning knobs for a [`Planner`][crate::Planner].
///
/// Start with [`PlannerConfig::default()`] and adjust through the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerConfig {
    /// Round number from which the UCB score replaces the best-observed table.
    ///
    /// Below it the planner exploits the per-user maximum raw reward.
    pub ucb_cutoff: u64,
    /// Constant inside the UCB bonus: `sqrt(exploration_factor * ln(t) / n)`.
    pub exploration_factor: f64,
    /// Multiplier on the forced-exploration window (in phases).
    pub exploration_scale: f64,
    /// Label returned by [`Planner::id`][crate::Planner::id].
    pub label: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            ucb_cutoff: 900_000,
            exploration_factor: 2.0,
            exploration_scale: 1.0,
            label: "phasemab".to_string(),
        }
    }
}

impl PlannerConfig {
    /// Set the round at which selection switches to UCB.
    pub fn with_ucb_cutoff(mut self, round: u64) -> Self {
        self.ucb_cutoff = round;
        self
    }

    /// Set the UCB exploration constant.
    pub fn with_exploration_factor(mut self, c: f64) -> Self {
        self.exploration_factor = c;
        self
    }

    /// Scale the forced-exploration window.
    pub fn with_exploration_scale(mut self, scale: f64) -> Self {
        self.exploration_scale = scale;
        self
    }

    /// Set the identity label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.exploration_factor.is_finite() && self.exploration_factor >= 0.0) {
            return Err(PlannerError::InvalidConfig(
                "exploration_factor must be finite and >= 0",
            ));
        }
        if !(self.exploration_scale.is_finite() && self.exploration_scale >= 0.0) {
            return Err(PlannerError::InvalidConfig(
                "exploration_scale must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance {
            num_rounds: 100,
            phase_len: 10,
            num_arms: 3,
            num_users: 2,
            arm_thresholds: vec![2, 3, 1],
            user_distribution: vec![0.25, 0.75],
        }
    }

    #[test]
    fn valid_instance_passes() {
        assert_eq!(instance().validate(), Ok(()));
    }

    #[test]
    fn zero_counts_are_rejected() {
        let mut i = instance();
        i.phase_len = 0;
        assert_eq!(i.validate(), Err(PlannerError::ZeroParameter("phase_len")));
    }

    #[test]
    fn table_lengths_must_match() {
        let mut i = instance();
        i.arm_thresholds.pop();
        assert!(matches!(
            i.validate(),
            Err(PlannerError::LengthMismatch { what: "arm_thresholds", expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn threshold_above_phase_len_is_unreachable() {
        let mut i = instance();
        i.arm_thresholds[1] = 11;
        assert!(matches!(
            i.validate(),
            Err(PlannerError::ThresholdUnreachable { arm: 1, threshold: 11, phase_len: 10 })
        ));
    }

    #[test]
    fn zero_probability_is_rejected() {
        let mut i = instance();
        i.user_distribution = vec![0.0, 1.0];
        assert!(matches!(
            i.validate(),
            Err(PlannerError::InvalidProbability { user: 0, .. })
        ));
    }

    #[test]
    fn distribution_must_sum_to_one() {
        let mut i = instance();
        i.user_distribution = vec![0.5, 0.4];
        assert!(matches!(
            i.validate(),
            Err(PlannerError::DistributionNotNormalized { .. })
        ));
    }

    #[test]
    fn rounded_distribution_is_accepted() {
        let mut i = instance();
        i.num_users = 3;
        i.user_distribution = vec![0.333, 0.333, 0.333];
        assert_eq!(i.validate(), Ok(()));
        i.user_distribution = vec![0.33, 0.33, 0.32];
        assert!(matches!(
            i.validate(),
            Err(PlannerError::DistributionNotNormalized { .. })
        ));
    }

    #[test]
    fn user_skew_is_zero_when_uniform() {
        let mut i = instance();
        i.user_distribution = Instance::uniform_users(2);
        assert_eq!(i.user_skew(), 0.0);
        i.user_distribution = vec![0.25, 0.75];
        assert!((i.user_skew() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn config_rejects_negative_knobs() {
        let cfg = PlannerConfig::default().with_exploration_factor(-1.0);
        assert!(cfg.validate().is_err());
        let cfg = PlannerConfig::default().with_exploration_scale(f64::NAN);
        assert!(cfg.validate().is_err());
        assert!(PlannerConfig::default().validate().is_ok());
    }
}
