use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use arena_terminal::lichess::FetchError;
use arena_terminal::poller::Poller;
use arena_terminal::state::{Delta, Tournament};

const LONG: Duration = Duration::from_secs(3600);
const WAIT: Duration = Duration::from_secs(5);

fn parsed(id: &str) -> Vec<Tournament> {
    let raw = format!(r#"{{"created":[{{"id":"{id}"}}]}}"#);
    arena_terminal::lichess::parse_tournaments_json(&raw).expect("valid json")
}

#[test]
fn fetches_immediately_on_start() {
    let (tx, rx) = mpsc::channel();
    let _poller = Poller::start(LONG, || Ok(parsed("first")), tx);

    match rx.recv_timeout(WAIT).expect("first poll delivered") {
        Delta::SetTournaments(items) => assert_eq!(items[0].id, "first"),
        other => panic!("unexpected delta {other:?}"),
    }
    // Nothing else until the interval elapses.
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
}

#[test]
fn polls_again_after_interval() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let (tx, rx) = mpsc::channel();
    let _poller = Poller::start(
        Duration::from_millis(30),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        },
        tx,
    );

    for _ in 0..3 {
        rx.recv_timeout(WAIT).expect("poll delivered");
    }
    assert!(calls.load(Ordering::SeqCst) >= 3);
}

#[test]
fn retry_runs_an_extra_fetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let (tx, rx) = mpsc::channel();
    let poller = Poller::start(
        LONG,
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(FetchError::RateLimited)
            } else {
                Ok(parsed("again"))
            }
        },
        tx,
    );

    assert!(matches!(
        rx.recv_timeout(WAIT),
        Ok(Delta::TournamentsFailed(FetchError::RateLimited))
    ));
    assert!(poller.retry());
    match rx.recv_timeout(WAIT).expect("retry delivered") {
        Delta::SetTournaments(items) => assert_eq!(items[0].id, "again"),
        other => panic!("unexpected delta {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn stop_discards_in_flight_result() {
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (tx, rx) = mpsc::channel();

    let mut poller = Poller::start(
        LONG,
        move || {
            let _ = started_tx.send(());
            let _ = release_rx.recv();
            Ok(parsed("late"))
        },
        tx,
    );

    started_rx.recv_timeout(WAIT).expect("fetch began");
    poller.stop();
    assert!(!poller.is_running());
    release_tx.send(()).expect("fetch still waiting");

    // The loop exits without delivering, which drops the only sender.
    match rx.recv_timeout(WAIT) {
        Err(RecvTimeoutError::Disconnected) => {}
        other => panic!("late result leaked: {other:?}"),
    }
}

#[test]
fn retry_after_stop_is_refused() {
    let (tx, rx) = mpsc::channel();
    let mut poller = Poller::start(LONG, || Ok(Vec::new()), tx);
    rx.recv_timeout(WAIT).expect("first poll delivered");
    poller.stop();
    assert!(!poller.retry());
}

#[test]
fn dropping_the_handle_stops_polling() {
    let (tx, rx) = mpsc::channel();
    let poller = Poller::start(Duration::from_millis(20), || Ok(Vec::new()), tx);
    rx.recv_timeout(WAIT).expect("first poll delivered");
    drop(poller);

    let mut saw_disconnect = false;
    for _ in 0..10 {
        match rx.recv_timeout(WAIT) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                saw_disconnect = true;
                break;
            }
            Err(RecvTimeoutError::Timeout) => break,
        }
    }
    assert!(saw_disconnect);
}

#[test]
fn slow_fetches_keep_a_fixed_cadence() {
    let (tx, rx) = mpsc::channel();
    let _poller = Poller::start(
        Duration::from_millis(200),
        || {
            std::thread::sleep(Duration::from_millis(150));
            Ok(Vec::new())
        },
        tx,
    );

    rx.recv_timeout(WAIT).expect("first poll delivered");
    let started = Instant::now();
    for _ in 0..5 {
        rx.recv_timeout(WAIT).expect("poll delivered");
    }
    // Five periods of 200ms. Timing from the end of each fetch would take 1750ms.
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
}

#[test]
fn overrunning_fetch_does_not_burst() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let (tx, rx) = mpsc::channel();
    let _poller = Poller::start(
        Duration::from_millis(50),
        move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                std::thread::sleep(Duration::from_millis(400));
            }
            Ok(Vec::new())
        },
        tx,
    );

    rx.recv_timeout(WAIT).expect("first poll delivered");
    rx.recv_timeout(WAIT).expect("slow poll delivered");
    let after_slow = Instant::now();
    rx.recv_timeout(WAIT).expect("catch-up poll delivered");
    rx.recv_timeout(WAIT).expect("next poll delivered");
    // One catch-up fetch, then back on the 50ms grid rather than eight
    // back-to-back fetches for the slots the slow one missed.
    assert!(after_slow.elapsed() >= Duration::from_millis(25));
}
