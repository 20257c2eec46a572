//! Run orchestration
//!
//! Owns the coins for the current run and the lifetime statistics. The host
//! calls `tick` at its own cadence; everything else is synchronous.
//!
//! Phases: Idle -> Running (start_run) -> Finished (all coins settled) -> Idle
//! (next start_run or reset). A failed or aborted run goes straight to Idle.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::error::{SimError, SimResult};
use super::integrate;
use super::state::{Entity, Outcome, WorldBounds};
use crate::consts::*;
use crate::params::ParameterSet;
use crate::stats::AggregateStats;

/// What kind of run to start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunMode {
    /// One coin
    Single,
    /// Independent single tosses, one after another
    BatchOf(u32),
    /// An ensemble with launch speeds spread by `perturbation` per index step
    Divergence { count: u32, perturbation: f32 },
}

impl RunMode {
    /// Eight coins, ±0.7% launch speed spread
    pub const DEFAULT_DIVERGENCE: RunMode = RunMode::Divergence {
        count: 8,
        perturbation: 0.002,
    };

    /// Speed factor for ensemble member `index` of `count`, centered on 1.0
    pub fn divergence_factor(index: u32, count: u32, perturbation: f32) -> f32 {
        let center = (count as f32 - 1.0) / 2.0;
        1.0 + (index as f32 - center) * perturbation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Running,
    Finished,
}

/// Identifies one `start_run` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunHandle(pub u64);

/// Orchestrator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub bounds: WorldBounds,
    /// Step used by `run_to_completion` and `frames`
    pub dt: f32,
    /// Simulated seconds a run (or batch element) may take before it fails.
    /// `None` lets `tick` run forever; `run_to_completion` then stops at `COMPLETION_LIMIT`.
    pub max_run_seconds: Option<f32>,
    /// Relative launch speed and spin jitter for batch elements (0 = identical tosses)
    pub batch_jitter: f32,
    pub batch_seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bounds: WorldBounds::default(),
            dt: SIM_DT,
            max_run_seconds: None,
            batch_jitter: 0.0,
            batch_seed: 0,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> SimResult<()> {
        let b = self.bounds;
        if !(b.width.is_finite() && b.height.is_finite() && b.width > 0.0 && b.height > 0.0) {
            return Err(SimError::DegenerateParameter(format!(
                "world bounds must be positive and finite ({} x {})",
                b.width, b.height
            )));
        }
        if let Some(limit) = self.max_run_seconds {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(SimError::DegenerateParameter(format!(
                    "max_run_seconds must be positive and finite ({limit})"
                )));
            }
        }
        if !self.batch_jitter.is_finite() {
            return Err(SimError::DegenerateParameter(format!(
                "batch_jitter is not finite ({})",
                self.batch_jitter
            )));
        }
        Ok(())
    }
}

/// Clamp a host-supplied step into [MIN_DT, MAX_DT]. NaN and dt <= 0 map to MIN_DT.
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt > 0.0 {
        dt.clamp(MIN_DT, MAX_DT)
    } else {
        MIN_DT
    }
}

/// Render data for one coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub pos: Vec2,
    pub rotation: f32,
    pub settled: bool,
    pub outcome: Outcome,
    pub trajectory: Vec<Vec2>,
    pub color_tag: u32,
}

impl From<&Entity> for EntitySnapshot {
    fn from(coin: &Entity) -> Self {
        Self {
            id: coin.id,
            pos: coin.pos,
            rotation: coin.rotation,
            settled: coin.settled,
            outcome: coin.outcome,
            trajectory: coin.trajectory.clone(),
            color_tag: coin.color_tag,
        }
    }
}

/// Everything a renderer needs after a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub run: Option<RunHandle>,
    pub phase: RunPhase,
    /// Simulated seconds since the current run (or batch element) started
    pub elapsed: f32,
    pub entities: Vec<EntitySnapshot>,
}

/// Result of a divergence run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub outcomes: Vec<Outcome>,
    pub launch_velocities: Vec<f32>,
    pub heads: u32,
    pub tails: u32,
}

/// Result of a whole batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub outcomes: Vec<Outcome>,
    pub heads: u32,
    pub tails: u32,
}

fn count_faces(outcomes: &[Outcome]) -> (u32, u32) {
    outcomes.iter().fold((0, 0), |(h, t), o| match o {
        Outcome::Heads => (h + 1, t),
        Outcome::Tails => (h, t + 1),
        Outcome::Unresolved => (h, t),
    })
}

/// Emitted when a run (or batch element) ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    /// A single toss settled. `index` is the batch element (0 for Single).
    Classified {
        run: RunHandle,
        index: u32,
        outcome: Outcome,
    },
    /// Last element of a batch settled
    BatchComplete { run: RunHandle, summary: BatchSummary },
    /// Every coin of a divergence run settled
    Divergence {
        run: RunHandle,
        summary: EnsembleSummary,
    },
    /// The run was dropped; no outcome is reported
    Failed { run: RunHandle, reason: String },
}

/// Bookkeeping for a batch in progress
#[derive(Debug, Clone)]
struct BatchProgress {
    total: u32,
    outcomes: Vec<Outcome>,
    base: ParameterSet,
    rng: Pcg32,
}

/// State of the current run
#[derive(Debug, Clone)]
struct RunState {
    handle: RunHandle,
    mode: RunMode,
    phase: RunPhase,
    entities: Vec<Entity>,
    elapsed: f32,
    batch: Option<BatchProgress>,
}

type Listener = Box<dyn FnMut(&RunEvent)>;

/// Drives runs and keeps lifetime statistics
pub struct Orchestrator {
    config: RunConfig,
    run: Option<RunState>,
    stats: AggregateStats,
    next_run_id: u64,
    /// Events not yet drained by the host. Only filled while no listener is registered.
    events: Vec<RunEvent>,
    listeners: Vec<Listener>,
    /// Collects events for `run_to_completion` instead of the drain queue
    capture: Option<Vec<RunEvent>>,
    /// Error behind the most recent `Failed` event
    failure: Option<SimError>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(RunConfig::default())
    }
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            run: None,
            stats: AggregateStats::default(),
            next_run_id: 1,
            events: Vec::new(),
            listeners: Vec::new(),
            capture: None,
            failure: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.run.as_ref().map_or(RunPhase::Idle, |r| r.phase)
    }

    pub fn current_run(&self) -> Option<RunHandle> {
        self.run.as_ref().map(|r| r.handle)
    }

    /// Coins of the current run (empty when Idle)
    pub fn entities(&self) -> &[Entity] {
        self.run
            .as_ref()
            .map(|r| r.entities.as_slice())
            .unwrap_or(&[])
    }

    /// Start a run, replacing whatever was there before
    pub fn start_run(&mut self, mode: RunMode, params: ParameterSet) -> SimResult<RunHandle> {
        self.config.validate()?;
        params.validate()?;

        let bounds = self.config.bounds;
        let (entities, batch) = match mode {
            RunMode::Single => (vec![Entity::launch(1, &params, &bounds, 0)], None),
            RunMode::BatchOf(total) => {
                if total == 0 {
                    return Err(SimError::InvalidRunMode(
                        "batch size must be at least 1".to_string(),
                    ));
                }
                let mut batch = BatchProgress {
                    total,
                    outcomes: Vec::new(),
                    base: params,
                    rng: Pcg32::seed_from_u64(self.config.batch_seed),
                };
                let first = self.batch_params(&mut batch);
                (vec![Entity::launch(1, &first, &bounds, 0)], Some(batch))
            }
            RunMode::Divergence {
                count,
                perturbation,
            } => (Self::ensemble(count, perturbation, &params, &bounds)?, None),
        };

        if let Some(old) = self.run.take() {
            if old.phase == RunPhase::Running {
                log::info!("Run {} replaced before finishing", old.handle.0);
            }
        }

        let handle = RunHandle(self.next_run_id);
        self.next_run_id += 1;
        self.failure = None;

        log::info!(
            "Run {} started: {:?}, {} coin(s)",
            handle.0,
            mode,
            entities.len()
        );

        self.run = Some(RunState {
            handle,
            mode,
            phase: RunPhase::Running,
            entities,
            elapsed: 0.0,
            batch,
        });
        Ok(handle)
    }

    fn ensemble(
        count: u32,
        perturbation: f32,
        params: &ParameterSet,
        bounds: &WorldBounds,
    ) -> SimResult<Vec<Entity>> {
        if count == 0 || count > MAX_ENSEMBLE {
            return Err(SimError::InvalidRunMode(format!(
                "divergence ensemble needs 1..={MAX_ENSEMBLE} coins, got {count}"
            )));
        }
        (0..count)
            .map(|i| {
                let factor = RunMode::divergence_factor(i, count, perturbation);
                let perturbed = params.with_velocity_scale(factor);
                if !perturbed.launch_velocity.is_finite() {
                    return Err(SimError::InvalidRunMode(format!(
                        "perturbation {perturbation} gives non-finite launch velocity for coin {i}"
                    )));
                }
                Ok(Entity::launch(i + 1, &perturbed, bounds, i))
            })
            .collect()
    }

    /// Parameters for the next batch element
    fn batch_params(&self, batch: &mut BatchProgress) -> ParameterSet {
        let jitter = self.config.batch_jitter;
        if jitter == 0.0 {
            return batch.base;
        }
        let v = 1.0 + batch.rng.random_range(-1.0_f32..=1.0) * jitter;
        let s = 1.0 + batch.rng.random_range(-1.0_f32..=1.0) * jitter;
        ParameterSet {
            spin_rate: batch.base.spin_rate * s,
            ..batch.base.with_velocity_scale(v)
        }
    }

    /// Advance the current run by one clamped step and report what to draw
    pub fn tick(&mut self, dt: f32) -> FrameSnapshot {
        let dt = clamp_dt(dt);
        let bounds = self.config.bounds;

        let Some(run) = self.run.as_mut().filter(|r| r.phase == RunPhase::Running) else {
            return self.snapshot();
        };

        // Coins are independent; none sees another's post-tick state
        for coin in run.entities.iter_mut() {
            integrate::step(coin, dt, &bounds);
        }
        run.elapsed += dt;

        let degenerate = run.entities.iter().find(|c| !c.is_finite()).map(|coin| {
            format!(
                "coin {} reached a non-finite state (pos {:?}, vel {:?})",
                coin.id, coin.pos, coin.vel
            )
        });
        let all_settled = run.entities.iter().all(|c| c.settled);
        let timed_out = self
            .config
            .max_run_seconds
            .filter(|&limit| run.elapsed > limit);

        if let Some(reason) = degenerate {
            self.fail(SimError::DegenerateParameter(reason));
        } else if all_settled {
            self.finish();
        } else if let Some(seconds) = timed_out {
            self.fail(SimError::Timeout { seconds });
        }

        self.snapshot()
    }

    /// Render data for the current state without advancing
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            run: self.current_run(),
            phase: self.phase(),
            elapsed: self.run.as_ref().map_or(0.0, |r| r.elapsed),
            entities: self.entities().iter().map(EntitySnapshot::from).collect(),
        }
    }

    /// All coins settled: record and emit outcomes
    fn finish(&mut self) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        let handle = run.handle;

        match (run.mode, run.batch.take()) {
            (RunMode::Divergence { .. }, _) => self.finish_divergence(&mut run),
            (_, None) => {
                for (index, coin) in run.entities.iter().enumerate() {
                    self.stats.record(coin.outcome);
                    self.emit(RunEvent::Classified {
                        run: handle,
                        index: index as u32,
                        outcome: coin.outcome,
                    });
                }
                log::info!("Run {} finished: {}", handle.0, run.entities[0].outcome.as_str());
                run.phase = RunPhase::Finished;
            }
            (_, Some(mut batch)) => {
                let outcome = run.entities[0].outcome;
                let index = batch.outcomes.len() as u32;
                batch.outcomes.push(outcome);
                self.stats.record(outcome);
                self.emit(RunEvent::Classified {
                    run: handle,
                    index,
                    outcome,
                });

                if (batch.outcomes.len() as u32) < batch.total {
                    // Previous coin is discarded before the next one launches
                    let next = self.batch_params(&mut batch);
                    run.entities = vec![Entity::launch(index + 2, &next, &self.config.bounds, 0)];
                    run.elapsed = 0.0;
                    run.batch = Some(batch);
                } else {
                    let (heads, tails) = count_faces(&batch.outcomes);
                    log::info!(
                        "Batch run {} finished: {} heads, {} tails",
                        handle.0,
                        heads,
                        tails
                    );
                    self.emit(RunEvent::BatchComplete {
                        run: handle,
                        summary: BatchSummary {
                            outcomes: batch.outcomes,
                            heads,
                            tails,
                        },
                    });
                    run.phase = RunPhase::Finished;
                }
            }
        }

        self.run = Some(run);
    }

    /// Demonstration only, not counted in lifetime stats
    fn finish_divergence(&mut self, run: &mut RunState) {
        let outcomes: Vec<Outcome> = run.entities.iter().map(|c| c.outcome).collect();
        let (heads, tails) = count_faces(&outcomes);
        let launch_velocities = run.entities.iter().map(|c| c.launch_speed).collect();
        log::info!(
            "Divergence run {} finished: {} heads, {} tails",
            run.handle.0,
            heads,
            tails
        );
        self.emit(RunEvent::Divergence {
            run: run.handle,
            summary: EnsembleSummary {
                outcomes,
                launch_velocities,
                heads,
                tails,
            },
        });
        run.phase = RunPhase::Finished;
    }

    fn fail(&mut self, err: SimError) {
        let Some(run) = self.run.take() else {
            return;
        };
        log::warn!("Run {} failed: {}", run.handle.0, err);
        self.emit(RunEvent::Failed {
            run: run.handle,
            reason: err.to_string(),
        });
        self.failure = Some(err);
    }

    fn emit(&mut self, event: RunEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
        if let Some(captured) = self.capture.as_mut() {
            captured.push(event);
        } else if self.listeners.is_empty() {
            self.events.push(event);
        }
    }

    /// Discard the current run without reporting anything. Returns true if a run was in progress.
    pub fn abort(&mut self) -> bool {
        match self.run.take() {
            Some(run) if run.phase == RunPhase::Running => {
                log::warn!("Run {} aborted", run.handle.0);
                true
            }
            _ => false,
        }
    }

    /// Back to Idle from any phase. Statistics are kept.
    pub fn reset(&mut self) {
        self.abort();
        self.failure = None;
    }

    /// Register a callback for every emitted run event. While any listener is
    /// registered, events are no longer queued for `drain_events`.
    pub fn on_run_finished(&mut self, callback: impl FnMut(&RunEvent) + 'static) {
        self.listeners.push(Box::new(callback));
    }

    /// Take all queued events since the last drain (empty when listeners are registered)
    pub fn drain_events(&mut self) -> Vec<RunEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn aggregate_stats(&self) -> AggregateStats {
        self.stats
    }

    /// Zero the lifetime counters. The current run keeps going.
    pub fn clear_aggregate_stats(&mut self) {
        log::info!("Aggregate stats cleared ({} tosses)", self.stats.total);
        self.stats.clear();
    }

    /// Restore counters persisted by the host
    pub fn restore_aggregate_stats(&mut self, stats: AggregateStats) {
        self.stats = stats;
    }

    /// Tick with the configured dt until the current run ends
    ///
    /// Returns the events emitted along the way, or the error that failed the
    /// run. On success the events are not queued for `drain_events`; on failure
    /// they are, so the `Failed` event and any earlier batch outcomes survive.
    /// Without a configured run limit, a run (or batch element) still going
    /// after `COMPLETION_LIMIT` simulated seconds fails with `Timeout`.
    pub fn run_to_completion(&mut self) -> SimResult<Vec<RunEvent>> {
        if self.phase() != RunPhase::Running {
            return Err(SimError::NoActiveRun);
        }
        let dt = self.config.dt;
        let limit = self.config.max_run_seconds.unwrap_or(COMPLETION_LIMIT);
        self.capture = Some(Vec::new());
        while let Some(run) = self.run.as_ref().filter(|r| r.phase == RunPhase::Running) {
            if run.elapsed > limit {
                self.fail(SimError::Timeout { seconds: limit });
                break;
            }
            self.tick(dt);
        }
        let produced = self.capture.take().unwrap_or_default();
        match self.failure.take() {
            Some(err) => {
                if self.listeners.is_empty() {
                    self.events.extend(produced);
                }
                Err(err)
            }
            None => Ok(produced),
        }
    }

    /// One snapshot per tick until the current run ends
    pub fn frames(&mut self) -> Frames<'_> {
        let dt = self.config.dt;
        Frames { orch: self, dt }
    }
}

/// Iterator over animation frames of the current run
pub struct Frames<'a> {
    orch: &'a mut Orchestrator,
    dt: f32,
}

impl Iterator for Frames<'_> {
    type Item = FrameSnapshot;

    fn next(&mut self) -> Option<FrameSnapshot> {
        if self.orch.phase() != RunPhase::Running {
            return None;
        }
        Some(self.orch.tick(self.dt))
    }
}
