// ABOUTME: Client-side predictive clock display
// ABOUTME: Turns intermittent snapshots into a smooth, locally rendered countdown

/// Per-side local projection
pub mod client_clock;
/// Snapshot application and render ticks for both sides
pub mod clock_reconciler;
/// Display sink trait and formatting
pub mod render;

pub use client_clock::ClientClock;
pub use clock_reconciler::ClockReconciler;
pub use render::{format_remaining, DisplaySink, RecordingSink};
