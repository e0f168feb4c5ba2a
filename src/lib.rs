//! `phasemab`: a contextual bandit planner under per-phase activation thresholds.
//!
//! Each round a user context is revealed, the planner picks one of a fixed set
//! of arms, and a reward comes back. Rounds are grouped into fixed-length
//! phases, and every arm has a minimum number of activations it must receive
//! in each phase. An arm that misses its threshold is deactivated for the rest
//! of the run.
//!
//! The [`Planner`] balances three pressures:
//!
//! 1. **Forced exploration**: keep arms above threshold while it still pays
//!    to learn them (the [`ExplorationWindow`]).
//! 2. **Statistical exploration**: a UCB bonus over per-user reweighted
//!    rewards ([`ArmScore`]).
//! 3. **Exploitation**: the best arm per user context, by best-observed reward
//!    early in the run and by UCB score late in the run.
//!
//! State only ever moves forward: counts grow, the active set shrinks, and
//! every choice is final.
//!
//! **Goals:**
//! - **Deterministic**: same instance + same rewards → same choices.
//! - **Explicit round protocol**: [`Planner::choose`] hands out a [`Pull`] that
//!   [`Planner::observe`] consumes; misuse is an error, not silent drift.
//! - **Small K**: O(num_arms) per call.
//!
//! **Non-goals:**
//! - No storage, persistence, or concurrency: one planner, one run, one owner.
//! - No environment simulation (see `demos/simulate.rs` for a toy one).
//!
//! # Example
//!
//! ```rust
//! use phasemab::{Instance, Planner, PlannerConfig, PullReason};
//!
//! let instance = Instance {
//!     num_rounds: 100,
//!     phase_len: 10,
//!     num_arms: 3,
//!     num_users: 2,
//!     arm_thresholds: vec![2, 2, 2],
//!     user_distribution: vec![0.3, 0.7],
//! };
//! let mut planner = Planner::new(instance, PlannerConfig::default()).unwrap();
//!
//! let pull = planner.choose(1).unwrap();
//! assert!(pull.arm < 3);
//! assert_ne!(pull.reason, PullReason::Ucb); // round 1 is far below the cutoff
//! let outcome = planner.observe(pull, 0.8).unwrap();
//! assert!(outcome.phase.is_none());
//! ```

#![forbid(unsafe_code)]

mod config;
pub use config::*;

mod error;
pub use error::*;

mod schedule;
pub use schedule::*;

mod score;
pub use score::*;

mod stats;

mod planner;
pub use planner::*;
