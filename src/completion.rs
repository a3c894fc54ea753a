//! Completion events and the channel carrying them to the transport
//! collaborator.

use crate::process::Pid;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Lifecycle events the engine reports about a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessEvent {
    Completed,
}

/// Notification emitted at most once per process, exactly at the tick where
/// its elapsed time first reaches its required time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub pid: Pid,
    pub event: ProcessEvent,
    pub timestamp_ms: u64,
}

impl CompletionEvent {
    pub fn completed(pid: Pid, timestamp_ms: u64) -> Self {
        Self {
            pid,
            event: ProcessEvent::Completed,
            timestamp_ms,
        }
    }
}

/// Build the bounded channel linking the engine to the completion transport.
///
/// Senders are cloned into every process record. The engine only ever uses
/// `try_send` on its side, so a slow or absent consumer can delay nothing; a
/// full buffer costs the event, not the tick.
pub fn completion_channel(capacity: usize) -> (Sender<CompletionEvent>, Receiver<CompletionEvent>) {
    bounded(capacity)
}
