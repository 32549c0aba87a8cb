use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use respire::broadcast::{BroadcasterConfig, DashboardEvent, EventKind};
use respire::Broadcaster;

#[test]
fn slow_subscriber_does_not_block_publish() {
    let broadcaster = Broadcaster::new(BroadcasterConfig { capacity: 4 });
    let _stalled = broadcaster.subscribe().unwrap();
    let live = broadcaster.subscribe().unwrap();

    let start = Instant::now();
    for i in 0..1_000 {
        broadcaster.publish(&DashboardEvent::new(
            EventKind::AqiUpdate,
            serde_json::json!({ "seq": i }),
        ));
        // Keep the live subscriber drained.
        while live.try_recv().unwrap().is_some() {}
    }
    assert!(start.elapsed() < Duration::from_secs(5));

    // The stalled buffer held the greeting plus three updates.
    assert_eq!(broadcaster.dropped_events(), 997);
    assert_eq!(broadcaster.subscriber_count(), 2);
}

#[test]
fn concurrent_publishers_reach_a_reader_thread() {
    let broadcaster = Arc::new(Broadcaster::new(BroadcasterConfig { capacity: 1024 }));
    let sub = broadcaster.subscribe().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let b = Arc::clone(&broadcaster);
            thread::spawn(move || {
                for i in 0..50 {
                    b.publish(&DashboardEvent::new(
                        EventKind::TrafficUpdate,
                        serde_json::json!({ "thread": t, "seq": i }),
                    ));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(sub.recv().unwrap().kind, EventKind::Connection);
    let mut received = 0;
    while let Some(event) = sub.try_recv().unwrap() {
        assert_eq!(event.kind, EventKind::TrafficUpdate);
        received += 1;
    }
    assert_eq!(received, 200);
    assert_eq!(broadcaster.dropped_events(), 0);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let broadcaster = Broadcaster::default();
    let a = broadcaster.subscribe().unwrap();
    let b = broadcaster.subscribe().unwrap();

    b.unsubscribe();
    b.unsubscribe();
    assert_eq!(broadcaster.subscriber_count(), 1);

    drop(a);
    assert_eq!(broadcaster.publish(&DashboardEvent::pong()), 0);
    assert_eq!(broadcaster.subscriber_count(), 0);
}
