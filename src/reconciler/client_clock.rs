// ABOUTME: Client-side projection of one side's authoritative clock
// ABOUTME: Rebases each snapshot on the local monotonic clock and predicts remaining time between snapshots

use crate::protocol::messages::SideSnapshot;
use crate::sync::MonotonicClock;
use std::time::{Duration, Instant};

/// Local projection of one side's clock
///
/// Only [`sync`](Self::sync) writes; prediction is derived on every read and
/// never stored, so re-applying the same snapshot is exact.
#[derive(Debug, Clone)]
pub struct ClientClock<C: MonotonicClock> {
    clock: C,
    remaining: Duration,
    running: bool,
    /// Local instant at which the last snapshot was applied
    base: Instant,
}

impl<C: MonotonicClock> ClientClock<C> {
    /// Stopped clock showing zero until the first snapshot
    pub fn new(clock: C) -> Self {
        let base = clock.now();
        Self {
            clock,
            remaining: Duration::ZERO,
            running: false,
            base,
        }
    }

    /// Apply an authoritative snapshot for this side
    pub fn sync(&mut self, snapshot: &SideSnapshot) {
        self.remaining = snapshot.remaining();
        self.running = snapshot.running;
        self.base = self.clock.now();
    }

    /// Predicted remaining time if running, `None` if the last value stands
    pub fn tick(&self) -> Option<Duration> {
        self.running.then(|| self.predicted())
    }

    /// Remaining time as of now, never below zero
    pub fn predicted(&self) -> Duration {
        if !self.running {
            return self.remaining;
        }
        let elapsed = self.clock.now().saturating_duration_since(self.base);
        self.remaining.saturating_sub(elapsed)
    }

    /// Remaining time carried by the last snapshot
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whether the last snapshot had this side running
    pub fn is_running(&self) -> bool {
        self.running
    }
}
