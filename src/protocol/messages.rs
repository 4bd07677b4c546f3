// ABOUTME: Protocol message type definitions and serialization
// ABOUTME: Supports clock/sync, clock/expired, clock/press, clock/pause and clock/resume

use crate::authority::Side;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level protocol message envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    /// Authoritative snapshot of both clocks (server to client)
    #[serde(rename = "clock/sync")]
    Sync(ClockSyncMessage),

    /// A side ran out of time (server to client)
    #[serde(rename = "clock/expired")]
    Expired(ClockExpired),

    /// A side ended its turn (client to server)
    #[serde(rename = "clock/press")]
    Press(Press),

    /// Stop whichever side is running (client to server)
    #[serde(rename = "clock/pause")]
    Pause(Pause),

    /// Start a side after a pause (client to server)
    #[serde(rename = "clock/resume")]
    Resume(Resume),
}

/// One side's clock as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSnapshot {
    /// Budget left, in nanoseconds
    pub remaining_ns: u64,
    /// Whether this side's clock is consuming time
    pub running: bool,
}

impl SideSnapshot {
    /// Build from a duration, saturating at `u64::MAX` nanoseconds
    pub fn new(remaining: Duration, running: bool) -> Self {
        Self {
            remaining_ns: u64::try_from(remaining.as_nanos()).unwrap_or(u64::MAX),
            running,
        }
    }

    /// Budget left as a duration
    pub fn remaining(&self) -> Duration {
        Duration::from_nanos(self.remaining_ns)
    }
}

/// Snapshot of both sides at the instant of emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSyncMessage {
    /// Emission counter, strictly increasing per game
    pub seq: u64,
    /// Side that moved first
    #[serde(alias = "white")]
    pub first: SideSnapshot,
    /// Side that moved second
    #[serde(alias = "black")]
    pub second: SideSnapshot,
}

impl ClockSyncMessage {
    /// Snapshot for one side
    pub fn side(&self, side: Side) -> &SideSnapshot {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }

    /// The side whose clock is running, if any
    pub fn running_side(&self) -> Option<Side> {
        Side::BOTH.into_iter().find(|s| self.side(*s).running)
    }
}

/// Expiration notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockExpired {
    /// Seq of the sync message that carried the zeroed clock
    pub seq: u64,
    /// Side that ran out of time
    pub side: Side,
}

/// Turn switch request: `side` stops, its opponent starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Press {
    /// Side ending its turn
    pub side: Side,
    /// Client-measured round trip, used for lag compensation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtt_ns: Option<u64>,
}

/// Pause request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pause {}

/// Resume request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    /// Side whose clock restarts
    pub side: Side,
}
