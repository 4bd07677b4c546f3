// ABOUTME: Authoritative two-sided game clock
// ABOUTME: Charges elapsed time on stop, enforces turn exclusivity, detects expiration, builds snapshots

use crate::authority::state::{ClockState, Phase, Side};
use crate::config::AuthorityConfig;
use crate::error::Error;
use crate::protocol::messages::{ClockExpired, ClockSyncMessage, Message, SideSnapshot};
use crate::sync::{MonotonicClock, SystemClock};
use std::time::{Duration, Instant};

/// Something observers must be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    /// Clock state changed, or heartbeat
    Sync(ClockSyncMessage),
    /// `side` ran out of time; `sync` carries its zeroed clock
    Expired {
        /// Side whose flag fell
        side: Side,
        /// Final state, with neither side running
        sync: ClockSyncMessage,
    },
}

impl ClockEvent {
    /// The snapshot carried by this event
    pub fn sync(&self) -> &ClockSyncMessage {
        match self {
            ClockEvent::Sync(sync) | ClockEvent::Expired { sync, .. } => sync,
        }
    }

    /// Wire messages for this event, in send order
    pub fn messages(&self) -> Vec<Message> {
        match self {
            ClockEvent::Sync(sync) => vec![Message::Sync(*sync)],
            ClockEvent::Expired { side, sync } => vec![
                Message::Sync(*sync),
                Message::Expired(ClockExpired {
                    seq: sync.seq,
                    side: *side,
                }),
            ],
        }
    }
}

/// Single source of truth for both sides' remaining time
///
/// Not thread-safe by itself: wrap it in [`AuthorityHandle`](crate::AuthorityHandle)
/// (or any single-owner scope) so control events and timer ticks never interleave.
#[derive(Debug)]
pub struct ClockAuthority<C: MonotonicClock = SystemClock> {
    clock: C,
    sides: [ClockState; 2],
    increment: Duration,
    heartbeat: Duration,
    lag_cap: Duration,
    seq: u64,
    turn: u64,
    last_emit: Option<Instant>,
    expired: Option<Side>,
}

impl ClockAuthority<SystemClock> {
    /// Authority on the system monotonic clock
    pub fn new(config: &AuthorityConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: MonotonicClock> ClockAuthority<C> {
    /// Authority on a caller-supplied clock
    pub fn with_clock(config: &AuthorityConfig, clock: C) -> Self {
        let budget = config.time_control.initial;
        Self {
            clock,
            sides: [ClockState::new(budget), ClockState::new(budget)],
            increment: config.time_control.increment,
            heartbeat: config.heartbeat_interval,
            lag_cap: config.lag_compensation_cap,
            seq: 0,
            turn: 0,
            last_emit: None,
            expired: None,
        }
    }

    /// Start `side`, stopping its opponent first if it is running
    ///
    /// Starting a side that already runs is a no-op and returns `Ok(None)`.
    /// If the opponent flags while being stopped, `side` is not started and
    /// the expiration is returned instead.
    pub fn start(&mut self, side: Side) -> Result<Option<ClockEvent>, Error> {
        self.ensure_live()?;

        if self.state(side).is_running() {
            log::debug!("start({side}) ignored: already running");
            return Ok(None);
        }

        let now = self.clock.now();
        let opponent = side.opponent();
        if self.state(opponent).is_running() && self.charge(opponent, now, Duration::ZERO, true) {
            return Ok(Some(self.expiration(opponent, now)));
        }

        self.state_mut(side).running_since = Some(now);
        Ok(Some(ClockEvent::Sync(self.emit(now))))
    }

    /// Stop `side`, charging the time since it was last started
    ///
    /// Returns `None` when `side` was not running.
    pub fn stop(&mut self, side: Side) -> Option<ClockEvent> {
        if !self.state(side).is_running() {
            log::debug!("stop({side}) ignored: not running");
            return None;
        }

        let now = self.clock.now();
        if self.charge(side, now, Duration::ZERO, false) {
            return Some(self.expiration(side, now));
        }
        Some(ClockEvent::Sync(self.emit(now)))
    }

    /// End `side`'s turn and start its opponent
    ///
    /// Half of `rtt` (capped by the configured lag compensation) is credited
    /// back to `side` to cover the time its move spent in transit. A press by
    /// a side that is not running is ignored.
    pub fn press(&mut self, side: Side, rtt: Option<Duration>) -> Result<Option<ClockEvent>, Error> {
        self.ensure_live()?;

        if !self.state(side).is_running() {
            log::debug!("press({side}) ignored: not running");
            return Ok(None);
        }

        let now = self.clock.now();
        let lag = rtt.map(|rtt| rtt / 2).unwrap_or_default().min(self.lag_cap);
        if self.charge(side, now, lag, true) {
            return Ok(Some(self.expiration(side, now)));
        }

        self.state_mut(side.opponent()).running_since = Some(now);
        Ok(Some(ClockEvent::Sync(self.emit(now))))
    }

    /// Stop whichever side is running
    pub fn pause(&mut self) -> Option<ClockEvent> {
        self.running_side().and_then(|side| self.stop(side))
    }

    /// Start `side` after a pause
    pub fn resume(&mut self, side: Side) -> Result<Option<ClockEvent>, Error> {
        self.start(side)
    }

    /// Timer callback: detect expiration, otherwise emit a heartbeat when due
    pub fn tick(&mut self) -> Option<ClockEvent> {
        let side = self.running_side()?;
        let now = self.clock.now();

        if self.state(side).projected(now).is_zero() {
            self.charge(side, now, Duration::ZERO, false);
            return Some(self.expiration(side, now));
        }

        let due = self
            .last_emit
            .map_or(true, |last| now.saturating_duration_since(last) >= self.heartbeat);
        if due {
            return Some(ClockEvent::Sync(self.emit(now)));
        }
        None
    }

    /// Both sides projected to now, stamped with the last emitted seq
    pub fn snapshot(&self) -> ClockSyncMessage {
        self.project(self.clock.now())
    }

    /// Stored (unprojected) state for one side
    pub fn state(&self, side: Side) -> &ClockState {
        &self.sides[side.index()]
    }

    /// Lifecycle phase of `side`'s clock
    pub fn phase(&self, side: Side) -> Phase {
        self.state(side).phase()
    }

    /// The side currently running, if any
    pub fn running_side(&self) -> Option<Side> {
        Side::BOTH.into_iter().find(|s| self.state(*s).is_running())
    }

    /// Side that ran out of time, once the game is over
    pub fn expired(&self) -> Option<Side> {
        self.expired
    }

    /// True once any flag has fallen
    pub fn is_finished(&self) -> bool {
        self.expired.is_some()
    }

    /// Number of completed turns
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Seq of the last emitted snapshot
    pub fn seq(&self) -> u64 {
        self.seq
    }

    fn ensure_live(&self) -> Result<(), Error> {
        match self.expired {
            Some(side) => Err(Error::Expired(side)),
            None => Ok(()),
        }
    }

    fn state_mut(&mut self, side: Side) -> &mut ClockState {
        &mut self.sides[side.index()]
    }

    /// Stop a running side and charge it; returns true if it expired
    fn charge(&mut self, side: Side, now: Instant, lag: Duration, completes_turn: bool) -> bool {
        let increment = self.increment;
        let state = self.state_mut(side);
        let elapsed = state.elapsed(now).saturating_sub(lag);
        state.running_since = None;

        if elapsed >= state.remaining {
            state.remaining = Duration::ZERO;
            state.expired = true;
            self.expired = Some(side);
            log::info!("{side} clock expired");
            return true;
        }

        state.remaining -= elapsed;
        if completes_turn {
            state.remaining += increment;
            self.turn += 1;
        }
        false
    }

    fn expiration(&mut self, side: Side, now: Instant) -> ClockEvent {
        ClockEvent::Expired {
            side,
            sync: self.emit(now),
        }
    }

    fn emit(&mut self, now: Instant) -> ClockSyncMessage {
        debug_assert!(
            !(self.sides[0].is_running() && self.sides[1].is_running()),
            "both clocks running"
        );
        self.seq += 1;
        self.last_emit = Some(now);
        self.project(now)
    }

    fn project(&self, now: Instant) -> ClockSyncMessage {
        let side = |s: Side| {
            let state = self.state(s);
            SideSnapshot::new(state.projected(now), state.is_running())
        };
        ClockSyncMessage {
            seq: self.seq,
            first: side(Side::First),
            second: side(Side::Second),
        }
    }
}
