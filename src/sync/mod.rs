// ABOUTME: Time sources for duelclock
// ABOUTME: Monotonic clocks shared by both sides of the trust boundary, plus RTT tracking

/// Monotonic time sources
pub mod clock;
/// Round-trip measurement and link quality
pub mod rtt;

pub use clock::{ManualClock, MonotonicClock, SystemClock};
pub use rtt::{RttTracker, SyncQuality};
