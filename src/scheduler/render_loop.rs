// ABOUTME: Fixed-cadence render loop for the client clock display
// ABOUTME: Drains pending snapshots and ticks the reconciler until cancelled

use crate::reconciler::{ClockReconciler, DisplaySink};
use crate::scheduler::snapshot_inbox::SnapshotInbox;
use crate::sync::MonotonicClock;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};

/// Drive `reconciler` every `period` until `cancel` fires or its sender is dropped
///
/// Runs on the calling task, so the sink does not need to be `Send`.
pub async fn run_render_loop<C, S>(
    reconciler: &mut ClockReconciler<C, S>,
    inbox: &SnapshotInbox,
    period: Duration,
    mut cancel: oneshot::Receiver<()>,
) where
    C: MonotonicClock,
    S: DisplaySink,
{
    let mut frames = interval(period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut cancel => break,
            _ = frames.tick() => reconciler.pump(inbox),
        }
    }

    // Show whatever arrived after the last frame.
    reconciler.pump(inbox);
}
