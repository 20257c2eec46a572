//! End-to-end run tests through the public API

use coin_toss::consts::SIM_DT;
use coin_toss::sim::{Orchestrator, Outcome, RunEvent, RunMode, RunPhase};
use coin_toss::ParameterSet;

#[test]
fn batch_of_100_counts_every_toss() {
    let mut orch = Orchestrator::default();
    let before = orch.aggregate_stats();
    orch.start_run(RunMode::BatchOf(100), ParameterSet::default())
        .unwrap();

    let mut ticks = 0u64;
    while orch.phase() == RunPhase::Running {
        let frame = orch.tick(SIM_DT);
        // Batch elements never overlap
        assert!(frame.entities.len() <= 1);
        let stats = orch.aggregate_stats();
        assert_eq!(stats.heads + stats.tails, stats.total);
        ticks += 1;
        assert!(ticks < 5_000_000, "batch never finished");
    }

    let after = orch.aggregate_stats();
    assert_eq!(after.total - before.total, 100);
    assert_eq!(after.heads + after.tails, after.total);

    let events = orch.drain_events();
    let classified = events
        .iter()
        .filter(|e| matches!(e, RunEvent::Classified { .. }))
        .count();
    assert_eq!(classified, 100);
    let Some(RunEvent::BatchComplete { summary, .. }) = events.last() else {
        panic!("batch should end with a summary");
    };
    assert_eq!(summary.outcomes.len(), 100);
    assert_eq!(summary.heads + summary.tails, 100);
}

#[test]
fn batch_indices_are_sequential() {
    let mut orch = Orchestrator::default();
    orch.start_run(RunMode::BatchOf(3), ParameterSet::default())
        .unwrap();
    let events = orch.run_to_completion().unwrap();

    let indices: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Classified { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn divergence_velocities_increase_with_index() {
    let mut orch = Orchestrator::default();
    orch.start_run(RunMode::DEFAULT_DIVERGENCE, ParameterSet::default())
        .unwrap();

    let coins = orch.entities();
    assert_eq!(coins.len(), 8);
    for pair in coins.windows(2) {
        assert!(pair[1].launch_speed > pair[0].launch_speed);
        assert!(pair[1].vel.length() > pair[0].vel.length());
        // Only the launch speed is perturbed
        assert_eq!(pair[0].angular_vel, pair[1].angular_vel);
        assert_eq!(pair[0].pos, pair[1].pos);
    }
    for (i, coin) in coins.iter().enumerate() {
        assert_eq!(coin.color_tag, i as u32);
    }
}

#[test]
fn divergence_does_not_touch_stats() {
    let mut orch = Orchestrator::default();
    orch.start_run(RunMode::DEFAULT_DIVERGENCE, ParameterSet::default())
        .unwrap();
    let events = orch.run_to_completion().unwrap();

    assert!(orch.aggregate_stats().is_empty());
    let [RunEvent::Divergence { summary, .. }] = events.as_slice() else {
        panic!("expected one divergence summary, got {:?}", events);
    };
    assert_eq!(summary.outcomes.len(), 8);
    assert_eq!(summary.heads + summary.tails, 8);
    assert!(summary.outcomes.iter().all(|o| o.is_resolved()));
    assert!(summary.launch_velocities.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn small_perturbation_can_split_the_ensemble() {
    let mut orch = Orchestrator::default();
    let mut split = None;

    'search: for height in [1.0_f32, 1.5, 2.5] {
        for step in 0..=90 {
            let params = ParameterSet {
                height,
                spin_rate: 5.0 + step as f32 * 0.5,
                ..Default::default()
            };
            orch.start_run(RunMode::DEFAULT_DIVERGENCE, params).unwrap();
            let events = orch.run_to_completion().unwrap();
            if let [RunEvent::Divergence { summary, .. }] = events.as_slice() {
                if summary.heads > 0 && summary.tails > 0 {
                    split = Some((params, summary.clone()));
                    break 'search;
                }
            }
        }
    }

    let (params, summary) = split.expect("no parameter set split the ensemble");
    assert!(summary.outcomes.contains(&Outcome::Heads), "{params:?}");
    assert!(summary.outcomes.contains(&Outcome::Tails), "{params:?}");
}

#[test]
fn clearing_stats_leaves_run_alone() {
    let mut orch = Orchestrator::default();
    orch.start_run(RunMode::Single, ParameterSet::default())
        .unwrap();
    orch.run_to_completion().unwrap();
    assert_eq!(orch.aggregate_stats().total, 1);

    orch.start_run(RunMode::Single, ParameterSet::default())
        .unwrap();
    for _ in 0..20 {
        orch.tick(SIM_DT);
    }
    let coin_before = orch.entities()[0].clone();

    orch.clear_aggregate_stats();
    let stats = orch.aggregate_stats();
    assert_eq!((stats.total, stats.heads, stats.tails), (0, 0, 0));

    let coin_after = &orch.entities()[0];
    assert_eq!(coin_after.pos, coin_before.pos);
    assert_eq!(coin_after.vel, coin_before.vel);
    assert_eq!(coin_after.rotation, coin_before.rotation);
    assert_eq!(orch.phase(), RunPhase::Running);

    // The in-flight toss still counts once it lands
    orch.run_to_completion().unwrap();
    assert_eq!(orch.aggregate_stats().total, 1);
}

#[test]
fn stats_survive_run_replacement() {
    let mut orch = Orchestrator::default();
    orch.start_run(RunMode::BatchOf(2), ParameterSet::default())
        .unwrap();
    orch.run_to_completion().unwrap();
    orch.start_run(RunMode::Single, ParameterSet::default())
        .unwrap();
    assert_eq!(orch.aggregate_stats().total, 2);
    orch.abort();
    assert_eq!(orch.aggregate_stats().total, 2);
}

#[test]
fn host_hiccups_never_break_the_run() {
    let mut orch = Orchestrator::default();
    orch.start_run(RunMode::Single, ParameterSet::default())
        .unwrap();
    let host_dts = [0.0_f32, -0.5, 1.0, f32::NAN, 0.016, 0.25];
    let mut i = 0;
    while orch.phase() == RunPhase::Running {
        let frame = orch.tick(host_dts[i % host_dts.len()]);
        for coin in &frame.entities {
            assert!(coin.pos.is_finite());
            assert!(coin.rotation.is_finite());
        }
        i += 1;
        assert!(i < 1_000_000);
    }
    assert_eq!(orch.phase(), RunPhase::Finished);
}

#[test]
fn tall_drop_is_not_cut_off() {
    let mut orch = Orchestrator::default();
    let params = ParameterSet {
        height: 10_000.0,
        ..Default::default()
    };
    orch.start_run(RunMode::Single, params).unwrap();

    let events = orch.run_to_completion().unwrap();
    assert!(matches!(
        events.as_slice(),
        [RunEvent::Classified { outcome, .. }] if *outcome != Outcome::Unresolved
    ));
    assert_eq!(orch.aggregate_stats().total, 1);
}
