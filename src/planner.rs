//! The phase-constrained planner.
//!
//! [`Planner`] owns all per-arm state and exposes a two-call round protocol:
//!
//! ```text
//! let pull = planner.choose(user)?;      // pick an arm for this user
//! let reward = show(pull.arm, user);     // your code
//! planner.observe(pull, reward)?;        // record what happened
//! ```
//!
//! Each round goes through, in order:
//!
//! 1. **Forced exploration**: while the exploration window is open, an active
//!    arm whose remaining need this phase equals the rounds left in the phase
//!    is pulled unconditionally, so it cannot miss its threshold.
//! 2. **Value-based choice**: below [`PlannerConfig::ucb_cutoff`] the arm with
//!    the best raw reward ever seen for this user; from the cutoff on, the arm
//!    with the highest UCB score over reweighted rewards.
//! 3. **Rollover** (inside `observe`): when a phase ends, arms under threshold
//!    leave the active set for good.

use tracing::{debug, info, warn};

use crate::config::{Instance, PlannerConfig};
use crate::error::{PlannerError, Result};
use crate::schedule::ExplorationWindow;
use crate::score::{argmax_first, ArmScore};
use crate::stats::ArmStats;

/// Why an arm was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PullReason {
    /// Last chance this phase for the arm to reach its threshold.
    Forced,
    /// Greatest best-observed raw reward for the user (early regime).
    BestObserved,
    /// Greatest upper-confidence score for the user (late regime).
    Ucb,
}

/// One round's selection, handed back to [`Planner::observe`] with the reward.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pull {
    /// Chosen arm.
    pub arm: usize,
    /// User context the arm was shown to.
    pub user: usize,
    /// 1-based round number.
    pub round: u64,
    pub reason: PullReason,
}

/// Arms removed at a phase boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseReport {
    /// 1-based index of the phase that just closed.
    pub phase: u64,
    /// Arms deactivated because they missed their threshold, in index order.
    pub deactivated: Vec<usize>,
}

/// What `observe` recorded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    /// Reweighted reward added to the arm×user reward sum.
    pub reweighted: f64,
    /// Present when this round closed a phase.
    pub phase: Option<PhaseReport>,
}

/// Online policy for one run of `num_rounds` rounds.
///
/// ```rust
/// use phasemab::{Instance, Planner};
///
/// let instance = Instance {
///     num_rounds: 20,
///     phase_len: 4,
///     num_arms: 2,
///     num_users: 2,
///     arm_thresholds: vec![2, 2],
///     user_distribution: Instance::uniform_users(2),
/// };
/// let mut planner = Planner::from_instance(instance).unwrap();
///
/// for round in 0..20 {
///     let user = round % 2;
///     let pull = planner.choose(user).unwrap();
///     let reward = if pull.arm == 0 { 1.0 } else { 0.0 };
///     planner.observe(pull, reward).unwrap();
/// }
/// assert_eq!(planner.total_rounds(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct Planner {
    instance: Instance,
    cfg: PlannerConfig,
    window: ExplorationWindow,
    stats: ArmStats,
    total_rounds: u64,
    rounds_in_phase: u64,
    completed_phases: u64,
    pending: Option<Pull>,
}

impl Planner {
    /// Build a planner after validating the instance and config.
    pub fn new(instance: Instance, cfg: PlannerConfig) -> Result<Self> {
        instance.validate()?;
        cfg.validate()?;
        let window = ExplorationWindow::new(&instance, &cfg);
        let stats = ArmStats::new(instance.num_arms, instance.num_users);
        debug!(
            num_rounds = instance.num_rounds,
            phase_len = instance.phase_len,
            num_arms = instance.num_arms,
            num_users = instance.num_users,
            window_phases = window.phases,
            "planner created"
        );
        Ok(Self {
            instance,
            cfg,
            window,
            stats,
            total_rounds: 0,
            rounds_in_phase: 0,
            completed_phases: 0,
            pending: None,
        })
    }

    /// Build a planner with [`PlannerConfig::default()`].
    pub fn from_instance(instance: Instance) -> Result<Self> {
        Self::new(instance, PlannerConfig::default())
    }

    /// Fixed label identifying this policy.
    pub fn id(&self) -> &str {
        &self.cfg.label
    }

    // -----------------------------------------------------------------------
    // Round protocol
    // -----------------------------------------------------------------------

    /// Choose an arm for `user` and return it as a [`Pull`].
    ///
    /// Fails without touching any state if a pull is still outstanding, the
    /// user is unknown, the round budget is spent, or no arm is active.
    pub fn choose(&mut self, user: usize) -> Result<Pull> {
        if let Some(p) = &self.pending {
            return Err(PlannerError::OutcomePending {
                arm: p.arm,
                round: p.round,
            });
        }
        if user >= self.instance.num_users {
            return Err(PlannerError::UnknownUser {
                user,
                num_users: self.instance.num_users,
            });
        }
        if self.total_rounds >= self.instance.num_rounds {
            return Err(PlannerError::RoundBudgetExhausted {
                num_rounds: self.instance.num_rounds,
            });
        }
        let round = self.total_rounds + 1;
        let (arm, reason) = match self.forced_arm(self.rounds_in_phase + 1) {
            Some(arm) => {
                debug!(
                    arm,
                    round,
                    phase_count = self.stats.phase_count(arm),
                    threshold = self.instance.arm_thresholds[arm],
                    "forced pull"
                );
                (arm, PullReason::Forced)
            }
            None => self.value_arm(user, round)?,
        };

        self.total_rounds = round;
        self.rounds_in_phase += 1;
        self.stats.record_pull(arm, user);
        let pull = Pull {
            arm,
            user,
            round: self.total_rounds,
            reason,
        };
        self.pending = Some(pull.clone());
        Ok(pull)
    }

    /// Record the reward for `pull`, which must be the outstanding pull.
    ///
    /// A non-finite reward, or one that would push the reweighted reward sum
    /// past `f64` range, is rejected and the pull stays outstanding.
    pub fn observe(&mut self, pull: Pull, reward: f64) -> Result<Outcome> {
        match &self.pending {
            None => return Err(PlannerError::NoPendingPull),
            Some(p) if *p != pull => {
                return Err(PlannerError::StalePull {
                    round: pull.round,
                    pending_round: p.round,
                })
            }
            Some(_) => {}
        }
        if !reward.is_finite() {
            return Err(PlannerError::NonFiniteReward(reward));
        }
        let reweighted = self.reweight(pull.arm, pull.user, reward);
        let sum = self.stats.reward_sum(pull.arm, pull.user) + reweighted;
        if !(reweighted.is_finite() && sum.is_finite()) {
            return Err(PlannerError::RewardOverflow {
                arm: pull.arm,
                user: pull.user,
                reward,
            });
        }
        self.pending = None;

        self.stats
            .record_reward(pull.arm, pull.user, reward, reweighted);

        let phase = if self.rounds_in_phase >= self.instance.phase_len {
            Some(self.close_phase())
        } else {
            None
        };
        Ok(Outcome { reweighted, phase })
    }

    /// Index-only form of [`Planner::choose`].
    pub fn choose_arm(&mut self, user: usize) -> Result<usize> {
        self.choose(user).map(|p| p.arm)
    }

    /// Record the reward for the outstanding pull.
    pub fn notify_outcome(&mut self, reward: f64) -> Result<Outcome> {
        let pull = self.pending.clone().ok_or(PlannerError::NoPendingPull)?;
        self.observe(pull, reward)
    }

    // -----------------------------------------------------------------------
    // Selection internals
    // -----------------------------------------------------------------------

    /// First active arm whose remaining need equals the rounds left, this one included.
    ///
    /// `in_phase` is the 1-based position of the round being chosen.
    fn forced_arm(&self, in_phase: u64) -> Option<usize> {
        if !self.window.contains(self.completed_phases) {
            return None;
        }
        let remaining = self.instance.phase_len - in_phase + 1;
        self.stats.active().iter().copied().find(|&arm| {
            let need = self.instance.arm_thresholds[arm].saturating_sub(self.stats.phase_count(arm));
            need > 0 && need == remaining
        })
    }

    /// Value-based choice for `round` among active arms.
    fn value_arm(&self, user: usize, round: u64) -> Result<(usize, PullReason)> {
        let active = self.stats.active().iter().copied();
        let picked = if round < self.cfg.ucb_cutoff {
            argmax_first(active.map(|arm| (arm, self.stats.best_observed(user, arm))))
                .map(|arm| (arm, PullReason::BestObserved))
        } else {
            argmax_first(active.map(|arm| (arm, self.score_at(arm, user, round))))
                .map(|arm| (arm, PullReason::Ucb))
        };
        picked.ok_or(PlannerError::NoEligibleArms)
    }

    fn score_at(&self, arm: usize, user: usize, total_rounds: u64) -> ArmScore {
        ArmScore::ucb(
            self.stats.reward_sum(arm, user),
            self.stats.arm_user_count(arm, user),
            self.stats.arm_count(arm),
            total_rounds,
            self.cfg.exploration_factor,
        )
    }

    fn reweight(&self, arm: usize, user: usize, reward: f64) -> f64 {
        let rate = self.instance.arm_thresholds[arm] as f64 / self.instance.phase_len as f64;
        reward * rate / self.instance.user_distribution[user]
    }

    fn close_phase(&mut self) -> PhaseReport {
        self.completed_phases += 1;
        self.rounds_in_phase = 0;
        let short = self.stats.close_phase(&self.instance.arm_thresholds);
        for &(arm, count) in &short {
            info!(
                arm,
                phase = self.completed_phases,
                phase_count = count,
                threshold = self.instance.arm_thresholds[arm],
                "arm deactivated"
            );
        }
        debug!(
            phase = self.completed_phases,
            active = self.stats.active().len(),
            "phase closed"
        );
        if self.stats.active().is_empty() {
            warn!(phase = self.completed_phases, "all arms deactivated");
        }
        PhaseReport {
            phase: self.completed_phases,
            deactivated: short.into_iter().map(|(arm, _)| arm).collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.cfg
    }

    /// Rounds played so far.
    pub fn total_rounds(&self) -> u64 {
        self.total_rounds
    }

    /// Rounds played in the current phase.
    pub fn rounds_in_phase(&self) -> u64 {
        self.rounds_in_phase
    }

    pub fn completed_phases(&self) -> u64 {
        self.completed_phases
    }

    pub fn exploration_window(&self) -> ExplorationWindow {
        self.window
    }

    /// Whether forced exploration applies in the current phase.
    pub fn in_forced_window(&self) -> bool {
        self.window.contains(self.completed_phases)
    }

    /// Active arms in increasing index order.
    pub fn active_arms(&self) -> Vec<usize> {
        self.stats.active().iter().copied().collect()
    }

    pub fn is_active(&self, arm: usize) -> bool {
        self.stats.active().contains(&arm)
    }

    /// Lifetime pulls of `arm`.
    ///
    /// # Panics
    ///
    /// If `arm >= num_arms` (same for the other per-arm accessors).
    pub fn arm_count(&self, arm: usize) -> u64 {
        self.stats.arm_count(arm)
    }

    /// Pulls of `arm` in the current phase.
    pub fn phase_count(&self, arm: usize) -> u64 {
        self.stats.phase_count(arm)
    }

    pub fn arm_user_count(&self, arm: usize, user: usize) -> u64 {
        self.stats.arm_user_count(arm, user)
    }

    /// Accumulated reweighted reward of `arm` for `user`.
    pub fn reward_sum(&self, arm: usize, user: usize) -> f64 {
        self.stats.reward_sum(arm, user)
    }

    /// Greatest raw reward seen for `(user, arm)`; `0.0` before any observation.
    pub fn best_observed(&self, user: usize, arm: usize) -> f64 {
        self.stats.best_observed(user, arm)
    }

    /// Current UCB score of `arm` for `user`.
    pub fn score(&self, arm: usize, user: usize) -> ArmScore {
        self.score_at(arm, user, self.total_rounds)
    }

    /// The pull awaiting its reward, if any.
    pub fn pending(&self) -> Option<&Pull> {
        self.pending.as_ref()
    }
}
