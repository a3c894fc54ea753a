//! Per-run reporting built from the driver's bookkeeping and the delivered
//! completion events.

use crate::completion::CompletionEvent;
use crate::driver::{ProcessTable, RunSummary};
use crate::process::Pid;
use crate::scheduler::PolicyKind;
use serde::Serialize;

/// Outcome of one completed process.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProcessOutcome {
    pub pid: Pid,
    pub arrived_ms: u64,
    pub required_ms: u64,
    pub completed_ms: u64,
    /// Completion minus arrival.
    pub turnaround_ms: u64,
    /// Turnaround minus the declared required time.
    pub waiting_ms: u64,
}

/// Aggregate view of a finished run, serializable for the JSON summary.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub policy: PolicyKind,
    pub ticks_run: u64,
    pub clock_ms: u64,
    pub spawned: usize,
    pub completed: usize,
    pub dropped_notifications: u64,
    pub mean_turnaround_ms: f64,
    pub mean_waiting_ms: f64,
    pub outcomes: Vec<ProcessOutcome>,
}

impl SimulationReport {
    /// Join delivered completion events against the process table.
    ///
    /// Events whose pid the driver never registered are skipped; dropped
    /// notifications show up in the counters, not in `outcomes`.
    pub fn build(
        summary: &RunSummary,
        table: &ProcessTable,
        completions: &[CompletionEvent],
    ) -> Self {
        let mut outcomes: Vec<ProcessOutcome> = completions
            .iter()
            .filter_map(|event| {
                table.get(&event.pid).map(|info| {
                    let turnaround_ms = event.timestamp_ms.saturating_sub(info.arrived_ms);
                    ProcessOutcome {
                        pid: event.pid,
                        arrived_ms: info.arrived_ms,
                        required_ms: info.required_ms,
                        completed_ms: event.timestamp_ms,
                        turnaround_ms,
                        waiting_ms: turnaround_ms.saturating_sub(info.required_ms),
                    }
                })
            })
            .collect();
        outcomes.sort_by_key(|outcome| (outcome.completed_ms, outcome.pid));

        let completed = outcomes.len();
        let (turnaround_total, waiting_total) = outcomes.iter().fold((0u64, 0u64), |acc, o| {
            (acc.0 + o.turnaround_ms, acc.1 + o.waiting_ms)
        });
        let mean = |total: u64| {
            if completed == 0 {
                0.0
            } else {
                total as f64 / completed as f64
            }
        };

        Self {
            policy: summary.policy,
            ticks_run: summary.ticks_run,
            clock_ms: summary.clock_ms,
            spawned: summary.spawned,
            completed,
            dropped_notifications: summary.dropped_notifications,
            mean_turnaround_ms: mean(turnaround_total),
            mean_waiting_ms: mean(waiting_total),
            outcomes,
        }
    }
}
