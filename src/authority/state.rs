// ABOUTME: Per-side authoritative clock state and the side enumeration
// ABOUTME: ClockState is only ever mutated by ClockAuthority

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// One of the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Side that moves first (white)
    #[serde(alias = "white")]
    First,
    /// Side that moves second (black)
    #[serde(alias = "black")]
    Second,
}

impl Side {
    /// Both sides, first then second
    pub const BOTH: [Side; 2] = [Side::First, Side::Second];

    /// The other side
    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => f.write_str("first"),
            Side::Second => f.write_str("second"),
        }
    }
}

/// Lifecycle of one side's clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not running, budget left
    Idle,
    /// Budget being consumed
    Running,
    /// Budget exhausted; terminal
    Expired,
}

/// Authoritative clock for one side
#[derive(Debug, Clone)]
pub struct ClockState {
    /// Budget left as of the last stop (or the last resume while running)
    pub(crate) remaining: Duration,
    /// Set while running: the instant the side was last resumed
    pub(crate) running_since: Option<Instant>,
    pub(crate) expired: bool,
}

impl ClockState {
    pub(crate) fn new(budget: Duration) -> Self {
        Self {
            remaining: budget,
            running_since: None,
            expired: false,
        }
    }

    /// Budget stored at the last transition (not projected)
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whether the budget is currently being consumed
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        if self.expired {
            Phase::Expired
        } else if self.is_running() {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    /// Time charged so far in the current run
    pub(crate) fn elapsed(&self, now: Instant) -> Duration {
        self.running_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or(Duration::ZERO)
    }

    /// Remaining budget as of `now`, without touching stored state
    pub fn projected(&self, now: Instant) -> Duration {
        self.remaining.saturating_sub(self.elapsed(now))
    }
}
