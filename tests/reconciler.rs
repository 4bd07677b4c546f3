use duelclock::authority::Side;
use duelclock::protocol::codec::decode_sync;
use duelclock::protocol::messages::{ClockSyncMessage, SideSnapshot};
use duelclock::reconciler::{format_remaining, ClientClock, ClockReconciler, DisplaySink, RecordingSink};
use duelclock::{ManualClock, SnapshotInbox};
use std::time::Duration;

fn snapshot(seq: u64, first: (u64, bool), second: (u64, bool)) -> ClockSyncMessage {
    ClockSyncMessage {
        seq,
        first: SideSnapshot {
            remaining_ns: first.0,
            running: first.1,
        },
        second: SideSnapshot {
            remaining_ns: second.0,
            running: second.1,
        },
    }
}

#[test]
fn test_format_remaining() {
    assert_eq!(format_remaining(Duration::ZERO), "0.00");
    assert_eq!(format_remaining(Duration::from_millis(3_500)), "3.50");
    assert_eq!(format_remaining(Duration::from_millis(287_660)), "287.66");
    assert_eq!(format_remaining(Duration::from_millis(1_005)), "1.01");
    assert_eq!(format_remaining(Duration::from_millis(59_999)), "60.00");
    assert_eq!(format_remaining(Duration::from_nanos(4_999_999)), "0.00");
}

#[test]
fn test_tick_predicts_from_local_clock() {
    let clock = ManualClock::new();
    let mut reconciler = ClockReconciler::new(clock.clone(), RecordingSink::new());

    reconciler.apply(&snapshot(1, (5_000_000_000, true), (9_000_000_000, false)));
    clock.advance_ms(1_500);
    reconciler.tick();

    assert_eq!(reconciler.predicted(Side::First), Duration::from_millis(3_500));
    assert_eq!(reconciler.sink().last(Side::First), Some("3.50"));
    assert_eq!(reconciler.sink().last(Side::Second), Some("9.00"));
}

#[test]
fn test_zero_snapshot_renders_once() {
    let clock = ManualClock::new();
    let mut reconciler = ClockReconciler::new(clock.clone(), RecordingSink::new());
    let json = r#"{
        "type": "clock/sync",
        "payload": {
            "seq": 4,
            "first": { "remaining_ns": 0, "running": false },
            "second": { "remaining_ns": 12000000000, "running": false }
        }
    }"#;

    reconciler.apply(&decode_sync(json).unwrap());
    for _ in 0..5 {
        reconciler.tick();
        clock.advance_ms(100);
    }

    assert_eq!(reconciler.sink().last(Side::First), Some("0.00"));
    assert_eq!(reconciler.sink().count(Side::First), 1);
    assert_eq!(reconciler.predicted(Side::First), Duration::ZERO);
}

#[test]
fn test_prediction_never_increases() {
    let clock = ManualClock::new();
    let mut client = ClientClock::new(clock.clone());
    client.sync(&SideSnapshot {
        remaining_ns: 2_000_000_000,
        running: true,
    });

    let mut previous = client.tick().unwrap();
    for step in [0, 1, 16, 17, 250, 900, 3_000] {
        clock.advance_ms(step);
        let predicted = client.tick().unwrap();
        assert!(predicted <= previous);
        previous = predicted;
    }
}

#[test]
fn test_stalled_connection_clamps_to_zero() {
    let clock = ManualClock::new();
    let mut reconciler = ClockReconciler::new(clock.clone(), RecordingSink::new());

    reconciler.apply(&snapshot(1, (1_000_000_000, true), (1_000_000_000, false)));
    clock.advance(Duration::from_secs(3_600));
    reconciler.tick();
    clock.advance(Duration::from_secs(3_600));
    reconciler.tick();

    assert_eq!(reconciler.predicted(Side::First), Duration::ZERO);
    assert_eq!(reconciler.sink().last(Side::First), Some("0.00"));
}

#[test]
fn test_stopped_clock_is_not_predicted() {
    let clock = ManualClock::new();
    let mut client = ClientClock::new(clock.clone());
    client.sync(&SideSnapshot {
        remaining_ns: 7_000_000_000,
        running: false,
    });

    clock.advance_ms(5_000);
    assert!(client.tick().is_none());
    assert_eq!(client.predicted(), Duration::from_secs(7));
}

#[test]
fn test_resync_rebases_on_arrival() {
    let clock = ManualClock::new();
    let mut client = ClientClock::new(clock.clone());
    let update = SideSnapshot {
        remaining_ns: 10_000_000_000,
        running: true,
    };

    client.sync(&update);
    clock.advance_ms(4_000);
    client.sync(&update);

    assert_eq!(client.predicted(), Duration::from_secs(10));
}

#[test]
fn test_stale_snapshots_are_dropped() {
    let clock = ManualClock::new();
    let mut reconciler = ClockReconciler::new(clock, RecordingSink::new());

    assert!(reconciler.apply(&snapshot(5, (4_000_000_000, true), (8_000_000_000, false))));
    assert!(!reconciler.apply(&snapshot(3, (9_000_000_000, true), (9_000_000_000, false))));
    assert!(!reconciler.apply(&snapshot(5, (1_000_000_000, true), (8_000_000_000, false))));

    assert_eq!(reconciler.last_seq(), Some(5));
    assert_eq!(reconciler.predicted(Side::First), Duration::from_secs(4));
}

#[test]
fn test_idle_side_renders_only_after_change() {
    let clock = ManualClock::new();
    let mut reconciler = ClockReconciler::new(clock.clone(), RecordingSink::new());

    reconciler.apply(&snapshot(1, (60_000_000_000, true), (60_000_000_000, false)));
    reconciler.tick();
    clock.advance_ms(16);
    reconciler.tick();
    clock.advance_ms(16);
    reconciler.tick();

    assert_eq!(reconciler.sink().count(Side::First), 3);
    assert_eq!(reconciler.sink().count(Side::Second), 1);
}

#[test]
fn test_pump_applies_inbox_in_order() {
    let clock = ManualClock::new();
    let inbox = SnapshotInbox::new();
    let mut reconciler = ClockReconciler::new(clock, RecordingSink::new());

    inbox.push(snapshot(1, (30_000_000_000, true), (30_000_000_000, false)));
    inbox.push(snapshot(2, (29_000_000_000, false), (30_000_000_000, true)));
    reconciler.pump(&inbox);

    assert!(inbox.is_empty());
    assert_eq!(reconciler.last_seq(), Some(2));
    assert_eq!(reconciler.sink().last(Side::First), Some("29.00"));
    assert_eq!(reconciler.sink().last(Side::Second), Some("30.00"));
    assert!(reconciler.clock(Side::Second).is_running());
}

#[test]
fn test_recording_sink_keeps_latest_frame() {
    let mut sink = RecordingSink::new();
    assert_eq!(sink.last(Side::First), None);

    for centis in (0..100_000u64).rev() {
        sink.show(Side::First, &format_remaining(Duration::from_millis(centis * 10)));
    }
    sink.show(Side::Second, "12.00");

    assert_eq!(sink.count(Side::First), 100_000);
    assert_eq!(sink.last(Side::First), Some("0.00"));
    assert_eq!(sink.count(Side::Second), 1);
    assert_eq!(sink.last(Side::Second), Some("12.00"));
}
