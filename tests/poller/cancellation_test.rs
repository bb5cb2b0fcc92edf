// =============================================================================
// INTEGRATION TESTS - POLLER CANCELLATION & CONCURRENCY
// stop() semantics, in-flight requests and sequential ticks
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::common::{advance, recording_poller, ScriptedProvider, PENDING};
use deposit_poller::services::poller::{DepositEvent, PollerConfig};

#[tokio::test(start_paused = true)]
async fn stop_before_first_tick_suppresses_everything() {
    let provider = Arc::new(ScriptedProvider::always(2));
    let (mut poller, sink) = recording_poller(provider.clone());

    poller.start("tx-stop", PollerConfig::default()).unwrap();
    advance(Duration::from_secs(5)).await;

    assert!(poller.stop());
    assert!(!poller.stop(), "Second stop should be a no-op");

    advance(Duration::from_secs(120)).await;
    assert_eq!(provider.calls(), 0);
    assert!(sink.events().is_empty());

    let state = poller.state().unwrap();
    assert!(state.terminal);
    assert_eq!(state.attempt_count, 0);
}

#[tokio::test(start_paused = true)]
async fn stop_discards_in_flight_request() {
    // Request takes 5s and would confirm
    let provider = Arc::new(ScriptedProvider::always(2).with_delay(Duration::from_secs(5)));
    let (mut poller, sink) = recording_poller(provider.clone());

    poller.start("tx-inflight", PollerConfig::new(1_000, 10)).unwrap();

    // First tick at 1s, request still running at 2s
    advance(Duration::from_secs(2)).await;
    assert_eq!(provider.calls(), 1);

    assert!(poller.stop());

    advance(Duration::from_secs(30)).await;
    assert!(sink.events().is_empty());
    assert_eq!(provider.calls(), 1);
    assert_eq!(poller.state().unwrap().attempt_count, 0);
}

#[tokio::test(start_paused = true)]
async fn stop_after_terminal_outcome_is_noop() {
    let provider = Arc::new(ScriptedProvider::codes(&[2]));
    let (mut poller, sink) = recording_poller(provider.clone());

    poller.start("tx-done", PollerConfig::default()).unwrap();
    advance(Duration::from_secs(15)).await;

    assert!(!poller.stop());
    assert!(!poller.stop());
    assert_eq!(sink.events(), vec![DepositEvent::Confirmed]);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_session_freezes_attempts() {
    let provider = Arc::new(ScriptedProvider::always(PENDING));
    let (mut poller, sink) = recording_poller(provider.clone());

    poller.start("tx-freeze", PollerConfig::default()).unwrap();
    advance(Duration::from_secs(35)).await;
    assert_eq!(poller.state().unwrap().attempt_count, 3);

    assert!(poller.stop());
    advance(Duration::from_secs(300)).await;

    assert_eq!(poller.state().unwrap().attempt_count, 3);
    assert_eq!(provider.calls(), 3);
    assert!(sink.events().is_empty(), "stop must not emit expiry");
}

#[tokio::test(start_paused = true)]
async fn slow_provider_never_overlaps_requests() {
    // Each request outlives the poll interval
    let provider =
        Arc::new(ScriptedProvider::always(PENDING).with_delay(Duration::from_millis(2_500)));
    let (mut poller, sink) = recording_poller(provider.clone());

    poller.start("tx-slow", PollerConfig::new(1_000, 10)).unwrap();
    advance(Duration::from_secs(60)).await;

    assert_eq!(provider.max_in_flight(), 1);
    assert_eq!(provider.calls(), 10);
    assert_eq!(sink.events(), vec![DepositEvent::Expired]);
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_stops_polling() {
    let provider = Arc::new(ScriptedProvider::always(2));
    let (mut poller, sink) = recording_poller(provider.clone());

    poller.start("tx-dropped", PollerConfig::default()).unwrap();
    advance(Duration::from_secs(5)).await;
    drop(poller);

    advance(Duration::from_secs(60)).await;
    assert_eq!(provider.calls(), 0);
    assert!(sink.events().is_empty());
}
