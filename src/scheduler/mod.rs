//! Scheduling policies and the tick-driven contract they implement.
//!
//! The driver owns the logical clock and the CPU slot; once per tick it hands
//! the engine the newly runnable records and lets the active policy advance
//! the running process, retire or requeue it, and refill the slot. All three
//! policies share the FIFO [`crate::queue::ReadyQueue`] and the completion
//! protocol; they differ only in how they pick the next occupant.

pub mod mlfq;
pub mod round_robin;
pub mod sjf;

pub use mlfq::Mlfq;
pub use round_robin::RoundRobin;
pub use sjf::Sjf;

use crate::process::{Pid, ProcessRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single CPU of the simulated machine.
///
/// Holds at most one record. Mutual exclusion is structural: there is one
/// slot and one owner per tick, so no locking is involved.
#[derive(Debug, Default)]
pub struct CpuSlot {
    running: Option<ProcessRecord>,
}

impl CpuSlot {
    pub fn new() -> Self {
        Self { running: None }
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_none()
    }

    /// Borrow the running record, if any.
    pub fn occupant(&self) -> Option<&ProcessRecord> {
        self.running.as_ref()
    }

    /// Mutably borrow the running record, if any.
    pub fn occupant_mut(&mut self) -> Option<&mut ProcessRecord> {
        self.running.as_mut()
    }

    /// Clear the slot, returning the record that was running.
    pub fn take(&mut self) -> Option<ProcessRecord> {
        self.running.take()
    }

    /// Place a record into the empty slot.
    pub fn dispatch(&mut self, record: ProcessRecord) {
        debug_assert!(self.running.is_none(), "dispatch into an occupied slot");
        self.running = Some(record);
    }

    /// Pid of the running record, if any.
    pub fn running_pid(&self) -> Option<Pid> {
        self.running.as_ref().map(|record| record.pid)
    }
}

/// Which scheduling policy drives the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    RoundRobin,
    Sjf,
    Mlfq,
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Mlfq
    }
}

impl PolicyKind {
    /// Parse a command-line policy name. Accepts the common spellings.
    pub fn from_arg(value: &str) -> Option<PolicyKind> {
        match value.to_ascii_lowercase().as_str() {
            "rr" | "round-robin" | "round_robin" => Some(PolicyKind::RoundRobin),
            "sjf" | "shortest-job-first" => Some(PolicyKind::Sjf),
            "mlfq" | "feedback" => Some(PolicyKind::Mlfq),
            _ => None,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PolicyKind::RoundRobin => "round_robin",
            PolicyKind::Sjf => "sjf",
            PolicyKind::Mlfq => "mlfq",
        };
        write!(f, "{label}")
    }
}

/// The tick-driven scheduling contract.
///
/// `on_tick` runs the four engine steps in order: ingest `arrivals`, apply
/// any policy-internal housekeeping (MLFQ's boost), advance the slot
/// occupant by one tick, and dispatch into an empty slot. Every call runs to
/// completion; the engine holds no state between ticks other than its queues
/// and counters. The driver must call it with monotonically non-decreasing
/// `now_ms` values and must not touch policy-owned queues between calls.
pub trait SchedulerPolicy {
    fn kind(&self) -> PolicyKind;

    /// Advance the engine by one tick of `tick_ms` granularity.
    fn on_tick(&mut self, now_ms: u64, arrivals: Vec<ProcessRecord>, slot: &mut CpuSlot);

    /// Number of runnable records currently waiting in the policy's queues.
    fn ready_count(&self) -> usize;

    /// Completion events that could not be handed to the transport.
    fn dropped_notifications(&self) -> u64;
}
