//! Multi-Level Feedback Queue, the core policy.
//!
//! Three FIFO level queues, L0 (most favoured) through L2, a per-level
//! quantum, and a periodic boost that undoes accumulated demotion.
//!
//! Each tick runs four steps in this exact order:
//! 1. Arrival ingestion: every newly runnable record enters at L0,
//!    irrespective of any prior run.
//! 2. Boost: once `boost_period_ms` has elapsed since the last boost, L1 and
//!    then L2 drain into the tail of L0 in FIFO order and every moved record
//!    is reset to L0. The slot occupant is not in any queue and is untouched.
//! 3. CPU advance: the occupant gets one tick of work. Completion retires
//!    it; quantum exhaustion demotes it one level (saturating at L2) and
//!    appends it to that queue's tail.
//! 4. Dispatch: an empty slot is refilled from the head of the first
//!    non-empty queue, L0 before L1 before L2, with no exceptions.
//!
//! Short interactive work therefore stays near L0 while CPU hogs sink to L2
//! and longer quanta, and the boost bounds how long anything can be stuck
//! behind them.

use crate::level::{Level, LevelTable};
use crate::process::ProcessRecord;
use crate::queue::ReadyQueue;
use crate::scheduler::{CpuSlot, PolicyKind, SchedulerPolicy};
use tracing::{debug, trace};

pub struct Mlfq {
    tick_ms: u64,
    /// Quantum per level, in ticks. Non-decreasing from L0 to L2.
    quanta: LevelTable<u32>,
    boost_period_ms: u64,
    last_boost_ms: u64,
    quantum_used: u32,
    queues: LevelTable<ReadyQueue>,
    dropped: u64,
}

impl Mlfq {
    /// Build the policy from its tuning knobs.
    ///
    /// Zero quanta are clamped to one tick, like the other policies.
    pub fn new(tick_ms: u64, quanta: LevelTable<u32>, boost_period_ms: u64) -> Self {
        let quanta = LevelTable::from_fn(|level| quanta[level].max(1));
        debug_assert!(
            quanta[Level::L0] <= quanta[Level::L1] && quanta[Level::L1] <= quanta[Level::L2],
            "quantum table must be non-decreasing across levels"
        );
        Self {
            tick_ms,
            quanta,
            boost_period_ms,
            last_boost_ms: 0,
            quantum_used: 0,
            queues: LevelTable::from_fn(|_| ReadyQueue::new()),
            dropped: 0,
        }
    }

    /// The ready queue of one level, head first. Exposed for inspection and
    /// tests.
    pub fn level_queue(&self, level: Level) -> &ReadyQueue {
        &self.queues[level]
    }

    fn maybe_boost(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.last_boost_ms) < self.boost_period_ms {
            return;
        }
        let moved = self.queues[Level::L1].len() + self.queues[Level::L2].len();
        for level in [Level::L1, Level::L2] {
            while let Some(mut record) = self.queues[level].dequeue() {
                record.level = Level::L0;
                self.queues[Level::L0].enqueue(record);
            }
        }
        self.last_boost_ms = now_ms;
        if moved > 0 {
            debug!(now_ms, moved, "priority boost");
        }
    }
}

impl SchedulerPolicy for Mlfq {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Mlfq
    }

    fn on_tick(&mut self, now_ms: u64, arrivals: Vec<ProcessRecord>, slot: &mut CpuSlot) {
        // 1. New arrivals always enter at the top level.
        for mut record in arrivals {
            record.level = Level::L0;
            self.queues[Level::L0].enqueue(record);
        }

        // 2. Periodic starvation correction.
        self.maybe_boost(now_ms);

        // 3. Advance the occupant and decide what becomes of it.
        let mut finished = false;
        let mut expired = false;
        if let Some(running) = slot.occupant_mut() {
            running.advance(self.tick_ms);
            self.quantum_used += 1;
            finished = running.is_complete();
            expired = !finished && self.quantum_used >= self.quanta[running.level];
        }

        if finished {
            if let Some(record) = slot.take() {
                if !record.finish(now_ms) {
                    self.dropped += 1;
                }
            }
            self.quantum_used = 0;
        } else if expired {
            if let Some(mut record) = slot.take() {
                record.level = record.level.demoted();
                debug!(pid = record.pid, level = %record.level, "quantum exhausted, demoting");
                let level = record.level;
                self.queues[level].enqueue(record);
            }
            self.quantum_used = 0;
        }

        // 4. Strict level precedence: L0 before L1 before L2.
        if slot.is_empty() {
            for level in Level::ALL {
                if let Some(next) = self.queues[level].dequeue() {
                    trace!(pid = next.pid, level = %level, "dispatching");
                    slot.dispatch(next);
                    self.quantum_used = 0;
                    break;
                }
            }
        }
    }

    fn ready_count(&self) -> usize {
        Level::ALL
            .iter()
            .map(|&level| self.queues[level].len())
            .sum()
    }

    fn dropped_notifications(&self) -> u64 {
        self.dropped
    }
}
