//! Shortest-Job-First, non-preemptive.
//!
//! Dispatch scans the whole ready queue once and picks the record with the
//! smallest required time; ties go to the earliest-enqueued record and the
//! relative order of everything not selected is untouched. Once dispatched a
//! process runs to completion. The scan is O(n), which is fine at the ready
//! queue sizes this simulator targets. Long jobs can starve under a steady
//! stream of short arrivals; that is inherent to the policy and accepted.

use crate::process::ProcessRecord;
use crate::queue::ReadyQueue;
use crate::scheduler::{CpuSlot, PolicyKind, SchedulerPolicy};
use tracing::trace;

pub struct Sjf {
    tick_ms: u64,
    ready: ReadyQueue,
    dropped: u64,
}

impl Sjf {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            tick_ms,
            ready: ReadyQueue::new(),
            dropped: 0,
        }
    }

    /// The ready queue, head first. Exposed for inspection and tests.
    pub fn ready(&self) -> &ReadyQueue {
        &self.ready
    }

    /// Remove the shortest job from the ready queue.
    ///
    /// `min_by_key` keeps the first of equally short records, so the
    /// earliest-enqueued one wins ties.
    fn dequeue_shortest(&mut self) -> Option<ProcessRecord> {
        let index = self
            .ready
            .iter()
            .enumerate()
            .min_by_key(|(_, record)| record.required_ms())
            .map(|(index, _)| index)?;
        self.ready.remove(index)
    }
}

impl SchedulerPolicy for Sjf {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Sjf
    }

    fn on_tick(&mut self, now_ms: u64, arrivals: Vec<ProcessRecord>, slot: &mut CpuSlot) {
        for record in arrivals {
            self.ready.enqueue(record);
        }

        let mut finished = false;
        if let Some(running) = slot.occupant_mut() {
            running.advance(self.tick_ms);
            finished = running.is_complete();
        }

        if finished {
            if let Some(record) = slot.take() {
                if !record.finish(now_ms) {
                    self.dropped += 1;
                }
            }
        }

        if slot.is_empty() {
            if let Some(next) = self.dequeue_shortest() {
                trace!(pid = next.pid, required_ms = next.required_ms(), "dispatching shortest job");
                slot.dispatch(next);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{completion_channel, CompletionEvent};
    use crate::process::Pid;
    use crossbeam_channel::{Receiver, Sender};

    const TICK_MS: u64 = 10;

    struct Harness {
        policy: Sjf,
        slot: CpuSlot,
        now_ms: u64,
        tx: Sender<CompletionEvent>,
        rx: Receiver<CompletionEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, rx) = completion_channel(16);
            Self {
                policy: Sjf::new(TICK_MS),
                slot: CpuSlot::new(),
                now_ms: 0,
                tx,
                rx,
            }
        }

        fn record(&self, pid: Pid, required_ms: u64) -> ProcessRecord {
            ProcessRecord::new(pid, required_ms, self.now_ms, self.tx.clone())
        }

        fn tick_with(&mut self, arrivals: Vec<ProcessRecord>) {
            self.policy.on_tick(self.now_ms, arrivals, &mut self.slot);
            self.now_ms += TICK_MS;
        }

        fn tick(&mut self) {
            self.tick_with(Vec::new());
        }

        fn ready_pids(&self) -> Vec<Pid> {
            self.policy.ready().iter().map(|r| r.pid).collect()
        }
    }

    #[test]
    fn dispatch_picks_the_smallest_required_time() {
        let mut harness = Harness::new();
        let arrivals = vec![
            harness.record(1, 50),
            harness.record(2, 20),
            harness.record(3, 80),
        ];
        harness.tick_with(arrivals);

        assert_eq!(harness.slot.running_pid(), Some(2));
        assert_eq!(harness.ready_pids(), vec![1, 3]);
    }

    #[test]
    fn ties_go_to_the_earliest_enqueued_record() {
        let mut harness = Harness::new();
        let arrivals = vec![
            harness.record(1, 40),
            harness.record(2, 20),
            harness.record(3, 20),
        ];
        harness.tick_with(arrivals);

        assert_eq!(harness.slot.running_pid(), Some(2));
        assert_eq!(harness.ready_pids(), vec![1, 3]);
    }

    #[test]
    fn running_job_is_never_preempted_by_a_shorter_arrival() {
        let mut harness = Harness::new();
        let arrivals = vec![harness.record(1, 40)];
        harness.tick_with(arrivals);
        assert_eq!(harness.slot.running_pid(), Some(1));

        let shorter = vec![harness.record(2, 10)];
        harness.tick_with(shorter);
        assert_eq!(harness.slot.running_pid(), Some(1), "non-preemptive");

        harness.tick();
        harness.tick();
        harness.tick();
        // pid 1 retired at elapsed 40; pid 2 dispatched in the same tick.
        assert_eq!(harness.slot.running_pid(), Some(2));
        let event = harness.rx.try_recv().expect("pid 1 completion");
        assert_eq!(event.pid, 1);
        assert_eq!(event.timestamp_ms, 40);
    }

    #[test]
    fn scan_leaves_non_selected_order_unchanged() {
        let mut harness = Harness::new();
        let arrivals = vec![
            harness.record(1, 90),
            harness.record(2, 70),
            harness.record(3, 10),
            harness.record(4, 70),
            harness.record(5, 90),
        ];
        harness.tick_with(arrivals);

        assert_eq!(harness.slot.running_pid(), Some(3));
        assert_eq!(harness.ready_pids(), vec![1, 2, 4, 5]);
    }
}
