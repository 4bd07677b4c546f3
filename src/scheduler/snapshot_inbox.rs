// ABOUTME: Lock-free hand-off of snapshots from the network thread to the render thread
// ABOUTME: Uses a crossbeam queue so the socket reader never waits on the render loop

use crate::protocol::messages::ClockSyncMessage;
use crossbeam::queue::SegQueue;
use std::sync::Arc;

/// Arrival-ordered snapshot queue
///
/// Cloning yields another handle to the same queue: the network side pushes,
/// the render side drains, and the two never touch a `ClientClock` concurrently.
#[derive(Debug, Clone, Default)]
pub struct SnapshotInbox {
    incoming: Arc<SegQueue<ClockSyncMessage>>,
}

impl SnapshotInbox {
    /// Create an empty inbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snapshot received from the transport
    pub fn push(&self, message: ClockSyncMessage) {
        self.incoming.push(message);
    }

    /// Check if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }

    /// Snapshots waiting to be drained
    pub fn len(&self) -> usize {
        self.incoming.len()
    }

    /// Take queued snapshots, oldest first
    ///
    /// Snapshots pushed while the iterator is being consumed are yielded too.
    pub fn drain(&self) -> impl Iterator<Item = ClockSyncMessage> + '_ {
        std::iter::from_fn(move || self.incoming.pop())
    }
}
