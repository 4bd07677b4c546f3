// ABOUTME: Server-side authoritative clock for duelclock
// ABOUTME: Clock state, the synchronous authority core and its single-owner task

/// Synchronous authority core
pub mod clock_authority;
/// Per-side state and the Side enum
pub mod state;
/// Tokio task wrapper serializing commands and ticks
pub mod task;

pub use clock_authority::{ClockAuthority, ClockEvent};
pub use state::{ClockState, Phase, Side};
pub use task::{AuthorityHandle, MIN_TICK_PERIOD};
