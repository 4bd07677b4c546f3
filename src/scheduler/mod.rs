// ABOUTME: Client render scheduling for duelclock
// ABOUTME: Snapshot inbox shared with the transport, and the cancellable render loop

/// Cancellable fixed-cadence render loop
pub mod render_loop;
/// Lock-free snapshot queue
pub mod snapshot_inbox;

pub use render_loop::run_render_loop;
pub use snapshot_inbox::SnapshotInbox;
