//! Per-arm and per-(arm, user) sufficient statistics.
//!
//! Tables are flat row-major `Vec`s: `arm * num_users + user` for the pull and
//! reward tables, `user * num_arms + arm` for the best-observed table (one row
//! per user, scanned across arms at selection time).

use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub(crate) struct ArmStats {
    num_arms: usize,
    num_users: usize,
    arm_counts: Vec<u64>,
    phase_counts: Vec<u64>,
    arm_user_counts: Vec<u64>,
    reward_sums: Vec<f64>,
    best_observed: Vec<f64>,
    active: BTreeSet<usize>,
}

impl ArmStats {
    pub(crate) fn new(num_arms: usize, num_users: usize) -> Self {
        Self {
            num_arms,
            num_users,
            arm_counts: vec![0; num_arms],
            phase_counts: vec![0; num_arms],
            arm_user_counts: vec![0; num_arms * num_users],
            reward_sums: vec![0.0; num_arms * num_users],
            best_observed: vec![0.0; num_arms * num_users],
            active: (0..num_arms).collect(),
        }
    }

    fn cell(&self, arm: usize, user: usize) -> usize {
        arm * self.num_users + user
    }

    fn mle_cell(&self, user: usize, arm: usize) -> usize {
        user * self.num_arms + arm
    }

    pub(crate) fn record_pull(&mut self, arm: usize, user: usize) {
        let c = self.cell(arm, user);
        self.arm_counts[arm] += 1;
        self.phase_counts[arm] += 1;
        self.arm_user_counts[c] += 1;
    }

    pub(crate) fn record_reward(&mut self, arm: usize, user: usize, raw: f64, reweighted: f64) {
        let c = self.cell(arm, user);
        self.reward_sums[c] += reweighted;
        let m = self.mle_cell(user, arm);
        if raw > self.best_observed[m] {
            self.best_observed[m] = raw;
        }
    }

    /// Deactivate every active arm below its threshold, then zero all phase counts.
    ///
    /// Returns the deactivated arms with their phase counts, in index order.
    pub(crate) fn close_phase(&mut self, thresholds: &[u64]) -> Vec<(usize, u64)> {
        let short: Vec<(usize, u64)> = self
            .active
            .iter()
            .copied()
            .filter(|&arm| self.phase_counts[arm] < thresholds[arm])
            .map(|arm| (arm, self.phase_counts[arm]))
            .collect();
        for (arm, _) in &short {
            self.active.remove(arm);
        }
        self.phase_counts.iter_mut().for_each(|c| *c = 0);
        short
    }

    pub(crate) fn active(&self) -> &BTreeSet<usize> {
        &self.active
    }

    pub(crate) fn arm_count(&self, arm: usize) -> u64 {
        self.arm_counts[arm]
    }

    pub(crate) fn phase_count(&self, arm: usize) -> u64 {
        self.phase_counts[arm]
    }

    pub(crate) fn arm_user_count(&self, arm: usize, user: usize) -> u64 {
        self.arm_user_counts[self.cell(arm, user)]
    }

    pub(crate) fn reward_sum(&self, arm: usize, user: usize) -> f64 {
        self.reward_sums[self.cell(arm, user)]
    }

    pub(crate) fn best_observed(&self, user: usize, arm: usize) -> f64 {
        self.best_observed[self.mle_cell(user, arm)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulls_update_all_counters() {
        let mut s = ArmStats::new(3, 2);
        s.record_pull(1, 0);
        s.record_pull(1, 1);
        s.record_pull(2, 1);
        assert_eq!(s.arm_count(1), 2);
        assert_eq!(s.phase_count(1), 2);
        assert_eq!(s.arm_user_count(1, 0), 1);
        assert_eq!(s.arm_user_count(1, 1), 1);
        assert_eq!(s.arm_user_count(2, 1), 1);
        assert_eq!(s.arm_count(0), 0);
    }

    #[test]
    fn best_observed_keeps_maximum_raw_reward() {
        let mut s = ArmStats::new(2, 2);
        s.record_reward(0, 1, 0.4, 10.0);
        s.record_reward(0, 1, 0.2, 10.0);
        assert_eq!(s.best_observed(1, 0), 0.4);
        assert_eq!(s.best_observed(0, 0), 0.0);
        assert_eq!(s.reward_sum(0, 1), 20.0);
    }

    #[test]
    fn close_phase_removes_short_arms_and_resets() {
        let mut s = ArmStats::new(3, 1);
        s.record_pull(0, 0);
        s.record_pull(0, 0);
        s.record_pull(2, 0);
        let gone = s.close_phase(&[2, 1, 2]);
        assert_eq!(gone, vec![(1, 0), (2, 1)]);
        assert_eq!(s.active().iter().copied().collect::<Vec<_>>(), vec![0]);
        assert!((0..3).all(|a| s.phase_count(a) == 0));
        // Lifetime counts survive the rollover.
        assert_eq!(s.arm_count(0), 2);
    }

    #[test]
    fn deactivated_arms_stay_out() {
        let mut s = ArmStats::new(2, 1);
        s.record_pull(0, 0);
        s.close_phase(&[1, 1]);
        s.record_pull(0, 0);
        s.record_pull(1, 0);
        s.close_phase(&[1, 1]);
        assert_eq!(s.active().iter().copied().collect::<Vec<_>>(), vec![0]);
    }
}
