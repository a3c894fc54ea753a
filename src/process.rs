//! Process records, the unit of schedulable work.

use crate::completion::CompletionEvent;
use crate::level::Level;
use crossbeam_channel::Sender;
use tracing::{trace, warn};

/// Process identity, unique within a simulation and immutable after creation.
pub type Pid = u64;

/// A runnable unit of work travelling between the ready queues and the CPU
/// slot.
///
/// Each record captures the total CPU time the process needs, the time it has
/// consumed so far, and the handle used to notify the completion collaborator
/// exactly once. A record lives in exactly one ready queue, occupies the CPU
/// slot, or has been destroyed by [`ProcessRecord::finish`]; never more than
/// one of these at a time.
#[derive(Debug)]
pub struct ProcessRecord {
    pub pid: Pid,
    /// Current MLFQ priority level. RR and SJF leave it untouched.
    pub level: Level,
    required_ms: u64,
    elapsed_ms: u64,
    arrived_at_ms: u64,
    completion: Sender<CompletionEvent>,
}

impl ProcessRecord {
    /// Create a record for a newly arrived process.
    ///
    /// `elapsed` starts at zero and the level starts at the top; a process
    /// re-entering the runnable state always restarts at [`Level::L0`].
    pub fn new(
        pid: Pid,
        required_ms: u64,
        arrived_at_ms: u64,
        completion: Sender<CompletionEvent>,
    ) -> Self {
        Self {
            pid,
            level: Level::L0,
            required_ms,
            elapsed_ms: 0,
            arrived_at_ms,
            completion,
        }
    }

    /// Total CPU time the process was declared to need.
    pub fn required_ms(&self) -> u64 {
        self.required_ms
    }

    /// CPU time consumed so far, in whole ticks.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Timestamp of the tick that handed the record to the engine.
    pub fn arrived_at_ms(&self) -> u64 {
        self.arrived_at_ms
    }

    /// Account one tick of CPU time.
    pub fn advance(&mut self, tick_ms: u64) {
        self.elapsed_ms += tick_ms;
    }

    /// Whether the process has consumed all the CPU time it asked for.
    ///
    /// A record with `required_ms == 0` reports complete after its first
    /// tick on the CPU.
    pub fn is_complete(&self) -> bool {
        self.elapsed_ms >= self.required_ms
    }

    /// Send the completion notification and destroy the record.
    ///
    /// Delivery is best-effort: a full or disconnected channel is reported
    /// and counted by the caller but never blocks the engine, and the record
    /// is destroyed either way. Returns whether the event was delivered.
    pub fn finish(self, now_ms: u64) -> bool {
        let event = CompletionEvent::completed(self.pid, now_ms);
        match self.completion.try_send(event) {
            Ok(()) => {
                trace!(pid = self.pid, timestamp_ms = now_ms, "completion delivered");
                true
            }
            Err(err) => {
                warn!(pid = self.pid, error = %err, "completion notification dropped");
                false
            }
        }
    }
}
