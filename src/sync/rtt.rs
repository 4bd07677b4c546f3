// ABOUTME: Round-trip time tracking for the clock client
// ABOUTME: Measures ping/pong RTT on the local monotonic clock and grades link quality

use crate::sync::clock::MonotonicClock;
use std::time::{Duration, Instant};

/// How far an RTT sample may age before the link counts as lost
const STALE_AFTER: Duration = Duration::from_secs(5);

/// Link quality as seen from the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncQuality {
    /// Good link (RTT < 50ms)
    Good,
    /// Degraded link (RTT 50-100ms)
    Degraded,
    /// Lost link (RTT > 100ms, stale, or never measured)
    Lost,
}

/// Round-trip tracker state
#[derive(Debug)]
pub struct RttTracker<C: MonotonicClock> {
    clock: C,

    /// When the outstanding ping left, if any
    pending: Option<Instant>,

    /// Last measured round trip
    rtt: Option<Duration>,

    /// When the last sample was taken (for staleness detection)
    last_update: Option<Instant>,
}

impl<C: MonotonicClock> RttTracker<C> {
    /// Create a tracker with no samples
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            pending: None,
            rtt: None,
            last_update: None,
        }
    }

    /// Stamp an outgoing ping, replacing any unanswered one
    pub fn ping_sent(&mut self) {
        self.pending = Some(self.clock.now());
    }

    /// Record the pong for the outstanding ping; unsolicited pongs are ignored
    pub fn pong_received(&mut self) {
        let Some(sent) = self.pending.take() else {
            return;
        };
        let now = self.clock.now();
        self.rtt = Some(now.saturating_duration_since(sent));
        self.last_update = Some(now);
    }

    /// Last measured RTT
    pub fn rtt(&self) -> Option<Duration> {
        self.rtt
    }

    /// RTT in nanoseconds, as attached to a clock press
    pub fn rtt_ns(&self) -> Option<u64> {
        self.rtt.map(|rtt| u64::try_from(rtt.as_nanos()).unwrap_or(u64::MAX))
    }

    /// Grade the link from the last RTT sample
    pub fn quality(&self) -> SyncQuality {
        if self.is_stale() {
            return SyncQuality::Lost;
        }
        match self.rtt {
            Some(rtt) if rtt < Duration::from_millis(50) => SyncQuality::Good,
            Some(rtt) if rtt < Duration::from_millis(100) => SyncQuality::Degraded,
            _ => SyncQuality::Lost,
        }
    }

    /// Check if the last sample is more than five seconds old
    pub fn is_stale(&self) -> bool {
        match self.last_update {
            Some(last) => self.clock.now().saturating_duration_since(last) > STALE_AFTER,
            None => true,
        }
    }
}
