// ABOUTME: Authority tuning knobs: timer period, heartbeat, lag compensation cap
// ABOUTME: Defaults suit a browser client; each value can be overridden from the environment

use crate::error::Error;
use crate::time_control::TimeControl;
use std::env;
use std::time::Duration;

/// Environment variable overriding the tick period, in milliseconds
pub const ENV_TICK_MS: &str = "DUELCLOCK_TICK_MS";
/// Environment variable overriding the heartbeat interval, in milliseconds
pub const ENV_HEARTBEAT_MS: &str = "DUELCLOCK_HEARTBEAT_MS";
/// Environment variable overriding the lag compensation cap, in milliseconds
pub const ENV_LAG_CAP_MS: &str = "DUELCLOCK_LAG_CAP_MS";
/// Environment variable selecting a named time control preset
pub const ENV_TIME_CONTROL: &str = "DUELCLOCK_TIME_CONTROL";

/// Configuration for one [`ClockAuthority`](crate::ClockAuthority)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    /// How often the timer re-evaluates the running side
    pub tick_period: Duration,
    /// Maximum gap between two sync emissions while a side is running
    pub heartbeat_interval: Duration,
    /// Upper bound on the one-way latency credited back on a press
    pub lag_compensation_cap: Duration,
    /// Budget handed to both sides at game start
    pub time_control: TimeControl,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(100),
            heartbeat_interval: Duration::from_secs(1),
            lag_compensation_cap: Duration::from_millis(150),
            time_control: TimeControl::default(),
        }
    }
}

impl AuthorityConfig {
    /// Defaults with the given time control
    pub fn with_time_control(time_control: TimeControl) -> Self {
        Self {
            time_control,
            ..Self::default()
        }
    }

    /// Defaults overridden by any `DUELCLOCK_*` variables that are set
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from an arbitrary source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = millis(&lookup, ENV_TICK_MS)? {
            if ms.is_zero() {
                return Err(Error::Config(format!("{ENV_TICK_MS} must be positive")));
            }
            config.tick_period = ms;
        }
        if let Some(ms) = millis(&lookup, ENV_HEARTBEAT_MS)? {
            config.heartbeat_interval = ms;
        }
        if let Some(ms) = millis(&lookup, ENV_LAG_CAP_MS)? {
            config.lag_compensation_cap = ms;
        }
        if let Some(name) = lookup(ENV_TIME_CONTROL).filter(|v| !v.trim().is_empty()) {
            config.time_control = TimeControl::find(&name)?;
        }

        Ok(config)
    }
}

fn millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>, Error>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}"))),
    }
}
