//! Round Robin: a single FIFO queue and a fixed quantum.
//!
//! Every tick advances the slot occupant by one tick of work. A process that
//! finishes is retired; one that exhausts the quantum is preempted to the
//! tail of the ready queue, behind every process already waiting. The slot
//! is then refilled from the head.

use crate::process::ProcessRecord;
use crate::queue::ReadyQueue;
use crate::scheduler::{CpuSlot, PolicyKind, SchedulerPolicy};
use tracing::{debug, trace};

pub struct RoundRobin {
    tick_ms: u64,
    quantum_ticks: u32,
    quantum_used: u32,
    ready: ReadyQueue,
    dropped: u64,
}

impl RoundRobin {
    /// Build the policy with a quantum expressed in ticks.
    ///
    /// A quantum of zero is clamped to one: the occupant always gets the
    /// tick of work that was just accounted to it.
    pub fn new(tick_ms: u64, quantum_ticks: u32) -> Self {
        Self {
            tick_ms,
            quantum_ticks: quantum_ticks.max(1),
            quantum_used: 0,
            ready: ReadyQueue::new(),
            dropped: 0,
        }
    }

    /// The ready queue, head first. Exposed for inspection and tests.
    pub fn ready(&self) -> &ReadyQueue {
        &self.ready
    }
}

impl SchedulerPolicy for RoundRobin {
    fn kind(&self) -> PolicyKind {
        PolicyKind::RoundRobin
    }

    fn on_tick(&mut self, now_ms: u64, arrivals: Vec<ProcessRecord>, slot: &mut CpuSlot) {
        for record in arrivals {
            self.ready.enqueue(record);
        }

        let mut finished = false;
        let mut expired = false;
        if let Some(running) = slot.occupant_mut() {
            running.advance(self.tick_ms);
            self.quantum_used += 1;
            finished = running.is_complete();
            expired = !finished && self.quantum_used >= self.quantum_ticks;
        }

        if finished {
            if let Some(record) = slot.take() {
                if !record.finish(now_ms) {
                    self.dropped += 1;
                }
            }
            self.quantum_used = 0;
        } else if expired {
            if let Some(record) = slot.take() {
                debug!(pid = record.pid, "quantum exhausted, requeueing");
                self.ready.enqueue(record);
            }
            self.quantum_used = 0;
        }

        if slot.is_empty() {
            if let Some(next) = self.ready.dequeue() {
                trace!(pid = next.pid, "dispatching");
                slot.dispatch(next);
                self.quantum_used = 0;
            }
        }
    }

    fn ready_count(&self) -> usize {
        self.ready.len()
    }

    fn dropped_notifications(&self) -> u64 {
        self.dropped
    }
}
