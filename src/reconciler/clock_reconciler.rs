// ABOUTME: Pair of client clocks fed by authoritative snapshots
// ABOUTME: Drops out-of-order snapshots by seq and renders both sides on each tick

use crate::authority::Side;
use crate::protocol::messages::{ClockSyncMessage, SideSnapshot};
use crate::reconciler::client_clock::ClientClock;
use crate::reconciler::render::{render, DisplaySink};
use crate::scheduler::SnapshotInbox;
use crate::sync::MonotonicClock;
use std::time::Duration;

/// Client-side reconciler for one game session
pub struct ClockReconciler<C: MonotonicClock, S: DisplaySink> {
    clocks: [ClientClock<C>; 2],
    sink: S,
    last_seq: Option<u64>,
    /// Side changed by a snapshot and not yet rendered
    dirty: [bool; 2],
}

impl<C: MonotonicClock, S: DisplaySink> ClockReconciler<C, S> {
    /// Reconciler with both clocks at zero and no snapshot applied
    pub fn new(clock: C, sink: S) -> Self {
        Self {
            clocks: [ClientClock::new(clock.clone()), ClientClock::new(clock)],
            sink,
            last_seq: None,
            dirty: [false; 2],
        }
    }

    /// Apply a full snapshot; returns false unless it is newer than the last applied one
    pub fn apply(&mut self, message: &ClockSyncMessage) -> bool {
        if let Some(last) = self.last_seq {
            if message.seq <= last {
                log::debug!("dropping stale snapshot seq {} (have {})", message.seq, last);
                return false;
            }
        }

        for side in Side::BOTH {
            self.sync(side, message.side(side));
        }
        self.last_seq = Some(message.seq);
        true
    }

    /// Apply one side's snapshot values without any ordering check
    pub fn sync(&mut self, side: Side, snapshot: &SideSnapshot) {
        self.clocks[side.index()].sync(snapshot);
        self.dirty[side.index()] = true;
    }

    /// Render running sides, plus idle sides changed since the last tick
    pub fn tick(&mut self) {
        for side in Side::BOTH {
            let i = side.index();
            let clock = &self.clocks[i];
            let value = match clock.tick() {
                Some(predicted) => Some(predicted),
                None if self.dirty[i] => Some(clock.remaining()),
                None => None,
            };
            self.dirty[i] = false;

            if let Some(remaining) = value {
                render(&mut self.sink, side, remaining);
            }
        }
    }

    /// Apply everything queued in `inbox` in arrival order, then tick
    pub fn pump(&mut self, inbox: &SnapshotInbox) {
        for message in inbox.drain() {
            self.apply(&message);
        }
        self.tick();
    }

    /// Local prediction state for `side`
    pub fn clock(&self, side: Side) -> &ClientClock<C> {
        &self.clocks[side.index()]
    }

    /// Predicted remaining time for `side`
    pub fn predicted(&self, side: Side) -> Duration {
        self.clock(side).predicted()
    }

    /// Seq of the last applied snapshot
    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    /// Display collaborator
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the reconciler, handing back the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}
