// ABOUTME: Time budgets for a game: initial allowance per side and per-move increment
// ABOUTME: Also holds the catalogue of named presets offered to players

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time budget given to each side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    /// Display name, e.g. "Blitz 3+0"
    pub name: String,
    /// Starting budget for each side
    pub initial: Duration,
    /// Added to a side's budget after each completed (non-expiring) turn
    pub increment: Duration,
}

impl TimeControl {
    /// Budget with no increment
    pub fn new(initial: Duration) -> Self {
        Self::with_increment(initial, Duration::ZERO)
    }

    /// Budget with a per-turn increment
    pub fn with_increment(initial: Duration, increment: Duration) -> Self {
        Self {
            name: format!("{}+{}", initial.as_secs() / 60, increment.as_secs()),
            initial,
            increment,
        }
    }

    fn preset(name: &str, minutes: u64, increment_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            initial: Duration::from_secs(minutes * 60),
            increment: Duration::from_secs(increment_secs),
        }
    }

    /// All named presets, in display order
    pub fn presets() -> Vec<TimeControl> {
        vec![
            Self::preset("Standard 5+2", 5, 2),
            Self::preset("Blitz 3+0", 3, 0),
            Self::preset("Rapid 10+5", 10, 5),
        ]
    }

    /// Look a preset up by name, ignoring case and surrounding whitespace
    pub fn find(selection: &str) -> Result<TimeControl, Error> {
        let key = normalize(selection);
        Self::presets()
            .into_iter()
            .find(|tc| normalize(&tc.name) == key)
            .ok_or_else(|| Error::UnknownTimeControl(selection.trim().to_string()))
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
