// ABOUTME: Main library entry point for duelclock
// ABOUTME: Exports public API for the clock authority, wire protocol and client reconciler

//! # duelclock
//!
//! Two-sided countdown clock for turn-based timed games.
//!
//! The server owns the only authoritative copy of both budgets
//! ([`ClockAuthority`]) and pushes snapshots to observers. Clients rebase each
//! snapshot against their own monotonic clock ([`ClockReconciler`]) and render
//! a smooth countdown between snapshots.

#![warn(missing_docs)]

/// Server-side authoritative clock
pub mod authority;
/// Authority configuration and environment overrides
pub mod config;
/// Client-side predictive reconciliation and rendering
pub mod reconciler;
/// Wire protocol, codec and WebSocket transport
pub mod protocol;
/// Per-process registry of running games
pub mod registry;
/// Snapshot hand-off and render scheduling
pub mod scheduler;
/// Monotonic time sources and round-trip tracking
pub mod sync;
/// Time budgets and named presets
pub mod time_control;

pub use authority::{AuthorityHandle, ClockAuthority, ClockEvent, Side};
pub use config::AuthorityConfig;
pub use protocol::messages::{ClockSyncMessage, Message, SideSnapshot};
pub use reconciler::{ClientClock, ClockReconciler, DisplaySink};
pub use scheduler::SnapshotInbox;
pub use sync::{ManualClock, MonotonicClock, SystemClock};
pub use time_control::TimeControl;

/// Result type for duelclock operations
pub type Result<T> = std::result::Result<T, error::Error>;

/// Error types for duelclock
pub mod error {
    use crate::authority::Side;
    use thiserror::Error;

    /// Error types for duelclock operations
    #[derive(Error, Debug)]
    pub enum Error {
        /// Message could not be decoded or is missing a field
        #[error("Malformed message: {0}")]
        MalformedMessage(String),

        /// Decoded clock state breaks turn exclusivity
        #[error("Invariant violation: {0}")]
        InvariantViolation(String),

        /// The game is over because this side ran out of time
        #[error("Clock expired for {0}")]
        Expired(Side),

        /// No preset with this name
        #[error("Unknown time control: {0}")]
        UnknownTimeControl(String),

        /// No game registered under this id
        #[error("Unknown game: {0}")]
        UnknownGame(String),

        /// The authority task is no longer running
        #[error("Clock authority closed")]
        AuthorityClosed,

        /// Invalid configuration value
        #[error("Config error: {0}")]
        Config(String),

        /// WebSocket-related error
        #[error("WebSocket error: {0}")]
        WebSocket(String),

        /// Protocol violation
        #[error("Protocol error: {0}")]
        Protocol(String),

        /// Connection-related error
        #[error("Connection error: {0}")]
        Connection(String),
    }
}
