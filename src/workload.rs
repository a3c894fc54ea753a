//! Arrival generation: the collaborator that creates process records and
//! hands them to the engine on the tick of their arrival.

use crate::completion::CompletionEvent;
use crate::driver::SimError;
use crate::process::{Pid, ProcessRecord};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PID: AtomicU64 = AtomicU64::new(1);

/// Declarative description of one process in a workload.
///
/// `required_ms` of zero is accepted and means the process completes on the
/// first tick it occupies the CPU. An explicit pid pins the identity;
/// otherwise one is assigned from a process-wide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    #[serde(default)]
    pub pid: Option<Pid>,
    pub arrival_ms: u64,
    pub required_ms: u64,
}

impl ProcessSpec {
    pub fn new(arrival_ms: u64, required_ms: u64) -> Self {
        Self {
            pid: None,
            arrival_ms,
            required_ms,
        }
    }

    pub fn with_pid(pid: Pid, arrival_ms: u64, required_ms: u64) -> Self {
        Self {
            pid: Some(pid),
            arrival_ms,
            required_ms,
        }
    }
}

#[derive(Debug)]
struct PendingArrival {
    pid: Pid,
    arrival_ms: u64,
    required_ms: u64,
}

/// Time-ordered arrival stream feeding one simulation.
#[derive(Debug)]
pub struct Workload {
    pending: VecDeque<PendingArrival>,
}

impl Workload {
    /// Build a workload from specs, ordering them by arrival time.
    ///
    /// The sort is stable, so specs sharing an arrival time keep their
    /// declaration order in the queue they land in.
    pub fn new(mut specs: Vec<ProcessSpec>) -> Self {
        specs.sort_by_key(|spec| spec.arrival_ms);
        let pending = specs
            .into_iter()
            .map(|spec| PendingArrival {
                pid: spec
                    .pid
                    .unwrap_or_else(|| NEXT_PID.fetch_add(1, Ordering::Relaxed)),
                arrival_ms: spec.arrival_ms,
                required_ms: spec.required_ms,
            })
            .collect();
        Self { pending }
    }

    /// Load a workload from a JSON file holding an array of specs.
    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path).map_err(|source| SimError::WorkloadFile {
            path: path.display().to_string(),
            source,
        })?;
        let specs: Vec<ProcessSpec> = serde_json::from_str(&text)?;
        Ok(Self::new(specs))
    }

    /// Materialize every process whose arrival time has been reached.
    ///
    /// Each record gets a clone of the completion sender as its notification
    /// handle and `now_ms` as its ingestion timestamp.
    pub fn release_until(
        &mut self,
        now_ms: u64,
        completion: &Sender<CompletionEvent>,
    ) -> Vec<ProcessRecord> {
        let mut released = Vec::new();
        while self
            .pending
            .front()
            .map_or(false, |front| front.arrival_ms <= now_ms)
        {
            if let Some(arrival) = self.pending.pop_front() {
                released.push(ProcessRecord::new(
                    arrival.pid,
                    arrival.required_ms,
                    now_ms,
                    completion.clone(),
                ));
            }
        }
        released
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::completion_channel;

    #[test]
    fn releases_in_arrival_order_with_stable_ties() {
        let (tx, _rx) = completion_channel(1);
        let mut workload = Workload::new(vec![
            ProcessSpec::with_pid(3, 20, 50),
            ProcessSpec::with_pid(1, 0, 30),
            ProcessSpec::with_pid(2, 0, 40),
        ]);

        let first: Vec<Pid> = workload
            .release_until(0, &tx)
            .iter()
            .map(|r| r.pid)
            .collect();
        assert_eq!(first, vec![1, 2], "same arrival keeps declaration order");
        assert_eq!(workload.remaining(), 1);

        assert!(workload.release_until(10, &tx).is_empty());

        let second: Vec<Pid> = workload
            .release_until(20, &tx)
            .iter()
            .map(|r| r.pid)
            .collect();
        assert_eq!(second, vec![3]);
        assert!(workload.is_exhausted());
    }

    #[test]
    fn released_records_carry_the_release_timestamp() {
        let (tx, _rx) = completion_channel(1);
        let mut workload = Workload::new(vec![ProcessSpec::with_pid(1, 15, 30)]);

        // Arrival at 15 lands on the tick stamped 20.
        let records = workload.release_until(20, &tx);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].arrived_at_ms(), 20);
        assert_eq!(records[0].required_ms(), 30);
    }

    #[test]
    fn auto_assigned_pids_are_unique() {
        let (tx, _rx) = completion_channel(1);
        let mut workload = Workload::new(vec![
            ProcessSpec::new(0, 10),
            ProcessSpec::new(0, 10),
            ProcessSpec::new(0, 10),
        ]);
        let mut pids: Vec<Pid> = workload
            .release_until(0, &tx)
            .iter()
            .map(|r| r.pid)
            .collect();
        pids.sort_unstable();
        pids.dedup();
        assert_eq!(pids.len(), 3);
    }
}
