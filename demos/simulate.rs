//! Drive a planner against a seeded Bernoulli environment.
//!
//! `RUST_LOG=phasemab=debug cargo run --example simulate` shows forced pulls and
//! phase rollovers as they happen.

use phasemab::{Instance, Planner, PlannerConfig, PullReason};
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(
            "phasemab=info".parse().expect("static directive"),
        ))
        .init();

    let instance = Instance {
        num_rounds: 5_000,
        phase_len: 50,
        num_arms: 4,
        num_users: 3,
        arm_thresholds: vec![5, 10, 5, 20],
        user_distribution: vec![0.5, 0.3, 0.2],
    };

    let mut planner = Planner::new(
        instance.clone(),
        PlannerConfig::default().with_ucb_cutoff(2_500),
    )
    .expect("valid instance");

    let mut env = StdRng::seed_from_u64(123);

    // Success probability per (user, arm), drawn once from a skewed prior.
    let prior = Beta::new(2.0, 5.0).expect("valid beta");
    let p_success: Vec<Vec<f64>> = (0..instance.num_users)
        .map(|_| (0..instance.num_arms).map(|_| prior.sample(&mut env)).collect())
        .collect();
    let users = WeightedIndex::new(&instance.user_distribution).expect("valid distribution");

    let mut total = 0.0;
    let mut forced = 0u64;
    for t in 0..instance.num_rounds {
        let user = users.sample(&mut env);
        let pull = match planner.choose(user) {
            Ok(pull) => pull,
            Err(e) => {
                eprintln!("stopping at round {}: {e}", t + 1);
                break;
            }
        };
        if pull.reason == PullReason::Forced {
            forced += 1;
        }
        let reward = if env.random::<f64>() < p_success[user][pull.arm] {
            1.0
        } else {
            0.0
        };
        total += reward;
        let out = planner.observe(pull, reward).expect("pull is pending");

        if let Some(report) = out.phase {
            if report.phase % 20 == 0 || !report.deactivated.is_empty() {
                eprintln!(
                    "phase={:3} active={:?} deactivated={:?} reward={:.0}",
                    report.phase,
                    planner.active_arms(),
                    report.deactivated,
                    total
                );
            }
        }
    }

    println!(
        "{}: rounds={} reward={:.0} forced={} active={:?}",
        planner.id(),
        planner.total_rounds(),
        total,
        forced,
        planner.active_arms()
    );
}
