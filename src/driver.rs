//! Driver loop and simulation wiring.
//!
//! This module owns the logical clock, constructs the chosen policy from its
//! configuration, feeds arrivals from the workload into each tick, and keeps
//! the process-table bookkeeping the reporting side joins against. All
//! tunables live in configuration objects with documented defaults; the
//! algorithms never hard-code a tuning.

use crate::completion::{completion_channel, CompletionEvent};
use crate::level::{Level, LevelTable};
use crate::process::Pid;
use crate::scheduler::{CpuSlot, Mlfq, PolicyKind, RoundRobin, SchedulerPolicy, Sjf};
use crate::workload::Workload;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by the driver and the workload loader.
#[derive(Debug, Error)]
pub enum SimError {
    /// The arrival stream handed the engine a pid it has already seen. The
    /// engine never silently merges two records sharing an identity.
    #[error("duplicate process id {0} in the arrival stream")]
    DuplicatePid(Pid),
    #[error("failed to read workload file {path}")]
    WorkloadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse workload")]
    WorkloadParse(#[from] serde_json::Error),
}

/// Round Robin tuning knobs.
#[derive(Debug, Clone)]
pub struct RrConfig {
    /// Quantum in ticks before mandatory preemption.
    pub quantum_ticks: u32,
}

impl Default for RrConfig {
    fn default() -> Self {
        Self { quantum_ticks: 1 }
    }
}

/// MLFQ tuning knobs.
#[derive(Debug, Clone)]
pub struct MlfqConfig {
    /// Quantum per level in ticks, non-decreasing from L0 to L2.
    pub quantum_ticks: LevelTable<u32>,
    /// Time units between priority boosts.
    pub boost_period_ms: u64,
}

impl Default for MlfqConfig {
    fn default() -> Self {
        Self {
            quantum_ticks: LevelTable::from_fn(|level| match level {
                Level::L0 => 1,
                Level::L1 => 2,
                Level::L2 => 4,
            }),
            boost_period_ms: 100,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Logical-clock granularity shared by driver and engine.
    pub tick_ms: u64,
    /// Which policy drives the run.
    pub policy: PolicyKind,
    pub round_robin: RrConfig,
    pub mlfq: MlfqConfig,
    /// Capacity of the completion channel to the transport collaborator.
    pub completion_capacity: usize,
    /// Safety cap on ticks for workloads that never drain.
    pub max_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            policy: PolicyKind::default(),
            round_robin: RrConfig::default(),
            mlfq: MlfqConfig::default(),
            completion_capacity: 64,
            max_ticks: 1_000_000,
        }
    }
}

/// Bookkeeping entry for one spawned process.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProcessInfo {
    pub arrived_ms: u64,
    pub required_ms: u64,
}

/// Identity to bookkeeping for every process handed to the engine.
pub type ProcessTable = HashMap<Pid, ProcessInfo>;

/// What a finished (or stopped) run looked like from the driver's side.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunSummary {
    pub policy: PolicyKind,
    pub ticks_run: u64,
    pub clock_ms: u64,
    pub spawned: usize,
    pub dropped_notifications: u64,
}

/// Build the configured policy. One engine instance per simulation, so
/// independent runs never share queues or counters.
fn build_policy(config: &SimulationConfig) -> Box<dyn SchedulerPolicy> {
    match config.policy {
        PolicyKind::RoundRobin => Box::new(RoundRobin::new(
            config.tick_ms,
            config.round_robin.quantum_ticks,
        )),
        PolicyKind::Sjf => Box::new(Sjf::new(config.tick_ms)),
        PolicyKind::Mlfq => Box::new(Mlfq::new(
            config.tick_ms,
            config.mlfq.quantum_ticks.clone(),
            config.mlfq.boost_period_ms,
        )),
    }
}

/// A single simulation: clock, engine, CPU slot, and arrival feed.
///
/// The engine is single-threaded and synchronous; each [`Simulation::step`]
/// runs one tick to completion. Timestamps handed to the policy are
/// monotonically non-decreasing and nothing outside the policy mutates its
/// queues.
pub struct Simulation {
    config: SimulationConfig,
    policy: Box<dyn SchedulerPolicy>,
    workload: Workload,
    slot: CpuSlot,
    now_ms: u64,
    ticks_run: u64,
    completion_tx: Sender<CompletionEvent>,
    table: ProcessTable,
}

impl Simulation {
    /// Wire a simulation and return the receiving side of its completion
    /// channel for the transport collaborator.
    pub fn new(config: SimulationConfig, workload: Workload) -> (Self, Receiver<CompletionEvent>) {
        let (completion_tx, completion_rx) = completion_channel(config.completion_capacity);
        let policy = build_policy(&config);
        let simulation = Self {
            config,
            policy,
            workload,
            slot: CpuSlot::new(),
            now_ms: 0,
            ticks_run: 0,
            completion_tx,
            table: ProcessTable::new(),
        };
        (simulation, completion_rx)
    }

    /// Run exactly one tick: release due arrivals, register them, and let
    /// the policy do its four steps.
    pub fn step(&mut self) -> Result<(), SimError> {
        let now_ms = self.now_ms;
        let arrivals = self.workload.release_until(now_ms, &self.completion_tx);
        for record in &arrivals {
            if self.table.contains_key(&record.pid) {
                return Err(SimError::DuplicatePid(record.pid));
            }
            self.table.insert(
                record.pid,
                ProcessInfo {
                    arrived_ms: record.arrived_at_ms(),
                    required_ms: record.required_ms(),
                },
            );
        }

        self.policy.on_tick(now_ms, arrivals, &mut self.slot);
        self.ticks_run += 1;
        self.now_ms += self.config.tick_ms;
        Ok(())
    }

    /// Whether there is nothing left to schedule.
    pub fn is_idle(&self) -> bool {
        self.workload.is_exhausted() && self.slot.is_empty() && self.policy.ready_count() == 0
    }

    /// Tick until the workload drains, the cap is hit, or `stop` flips.
    pub fn run_until(&mut self, stop: &AtomicBool) -> Result<RunSummary, SimError> {
        loop {
            if stop.load(Ordering::Relaxed) {
                debug!(ticks_run = self.ticks_run, "stop requested");
                break;
            }
            if self.is_idle() {
                break;
            }
            if self.ticks_run >= self.config.max_ticks {
                warn!(
                    max_ticks = self.config.max_ticks,
                    "tick budget exhausted before the workload drained"
                );
                break;
            }
            self.step()?;
        }
        Ok(self.summary())
    }

    /// Tick until the workload drains or the cap is hit.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        let stop = AtomicBool::new(false);
        self.run_until(&stop)
    }

    pub fn process_table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            policy: self.policy.kind(),
            ticks_run: self.ticks_run,
            clock_ms: self.now_ms,
            spawned: self.table.len(),
            dropped_notifications: self.policy.dropped_notifications(),
        }
    }
}
