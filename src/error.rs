//! Error taxonomy for planner construction and the per-round calls.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Everything that can go wrong when building or driving a [`Planner`][crate::Planner].
///
/// Every failing call leaves the planner exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// A count parameter of the instance was zero.
    #[error("invalid instance: {0} must be non-zero")]
    ZeroParameter(&'static str),

    /// A per-arm or per-user table has the wrong length.
    #[error("invalid instance: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An arm's threshold can never be met inside one phase.
    #[error("arm {arm} threshold {threshold} exceeds phase length {phase_len}")]
    ThresholdUnreachable {
        arm: usize,
        threshold: u64,
        phase_len: u64,
    },

    /// A user-context probability is not in `(0, 1]`.
    #[error("user {user} has invalid probability {probability}")]
    InvalidProbability { user: usize, probability: f64 },

    /// The user-context distribution does not sum to one.
    #[error("user distribution sums to {total}, expected 1")]
    DistributionNotNormalized { total: f64 },

    /// A tuning knob is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),

    /// `choose` was given a user index outside `[0, num_users)`.
    #[error("user context {user} out of range (num_users = {num_users})")]
    UnknownUser { user: usize, num_users: usize },

    /// All `num_rounds` rounds have already been played.
    #[error("round budget of {num_rounds} exhausted")]
    RoundBudgetExhausted { num_rounds: u64 },

    /// Every arm has been deactivated; there is nothing left to choose.
    #[error("no eligible arms: all arms were deactivated")]
    NoEligibleArms,

    /// `choose` was called while the previous pull still awaits its outcome.
    #[error("outcome pending for arm {arm} (round {round})")]
    OutcomePending { arm: usize, round: u64 },

    /// `observe` was called without an outstanding pull.
    #[error("no pending pull to observe")]
    NoPendingPull,

    /// `observe` was given a pull that is not the outstanding one.
    #[error("stale pull for round {round}, pending round is {pending_round}")]
    StalePull { round: u64, pending_round: u64 },

    /// The observed reward is NaN or infinite.
    #[error("reward {0} is not finite")]
    NonFiniteReward(f64),

    /// A finite reward whose reweighted value, or the running sum it would
    /// join, overflows to a non-finite number.
    #[error("reward {reward} overflows the reward sum of arm {arm} for user {user}")]
    RewardOverflow { arm: usize, user: usize, reward: f64 },
}
