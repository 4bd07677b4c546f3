// ABOUTME: Display sink abstraction and fixed-format time rendering
// ABOUTME: The only place the reconciler touches a UI collaborator

use crate::authority::Side;
use std::time::Duration;

const NANOS_PER_CENTI: u128 = 10_000_000;

/// Anything that can show a formatted clock for one side
pub trait DisplaySink {
    /// Replace the text shown for `side`
    fn show(&mut self, side: Side, text: &str);
}

/// Seconds with exactly two decimals, rounded half up: 3.5s -> "3.50"
pub fn format_remaining(remaining: Duration) -> String {
    let centis = (remaining.as_nanos() + NANOS_PER_CENTI / 2) / NANOS_PER_CENTI;
    format!("{}.{:02}", centis / 100, centis % 100)
}

/// Format `remaining` and hand it to the sink
pub fn render<S: DisplaySink + ?Sized>(sink: &mut S, side: Side, remaining: Duration) {
    sink.show(side, &format_remaining(remaining));
}

/// Sink that remembers the latest text and a frame count per side
///
/// Memory stays constant however long it runs, so headless clients can use
/// it as well as tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    last: [Option<String>; 2],
    counts: [usize; 2],
}

impl RecordingSink {
    /// Sink with nothing shown yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text shown for `side`
    pub fn last(&self, side: Side) -> Option<&str> {
        self.last[side.index()].as_deref()
    }

    /// Number of frames rendered for `side`
    pub fn count(&self, side: Side) -> usize {
        self.counts[side.index()]
    }
}

impl DisplaySink for RecordingSink {
    fn show(&mut self, side: Side, text: &str) {
        self.last[side.index()] = Some(text.to_string());
        self.counts[side.index()] += 1;
    }
}
