//! Forced-exploration window.
//!
//! The planner only forces threshold-saving pulls during an initial stretch of
//! phases. Its length comes from an explore-then-commit style budget,
//! `(T / K) * (2/3) * ln(T)^(1/3)` rounds, turned into phases by dividing by
//! `K` and by the phase length. A skewed user distribution shortens it by the
//! factor `1 - (max_p - min_p) / (max_p + min_p)`.
//!
//! The formula is a heuristic; [`PlannerConfig::exploration_scale`] rescales it.

use crate::config::{Instance, PlannerConfig};

/// Number of completed phases (possibly fractional) during which forced
/// exploration stays enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExplorationWindow {
    /// Exploration budget in rounds, before conversion to phases.
    pub budget_rounds: f64,
    /// Window length in phases after skew and scale adjustment.
    pub phases: f64,
}

impl ExplorationWindow {
    /// Compute the window for an instance.
    pub fn new(instance: &Instance, cfg: &PlannerConfig) -> Self {
        let t = instance.num_rounds as f64;
        let k = instance.num_arms.max(1) as f64;
        let phase_len = instance.phase_len.max(1) as f64;

        let budget_rounds = (t / k) * (2.0 / 3.0) * t.ln().max(0.0).cbrt();
        let balance = 1.0 - instance.user_skew();
        let phases = budget_rounds / k / phase_len * balance * cfg.exploration_scale;

        Self {
            budget_rounds,
            phases: if phases.is_finite() { phases.max(0.0) } else { 0.0 },
        }
    }

    /// Whether forced exploration applies after `completed_phases` phases.
    pub fn contains(&self, completed_phases: u64) -> bool {
        (completed_phases as f64) <= self.phases
    }
}
