use async_trait::async_trait;
use axum_test::TestServer;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deposit_poller::services::poller::{
    DepositStatusPoller, PollerConfig, RecordingSink, StatusCode,
};
use deposit_poller::services::status_provider::{StatusFetchError, StatusProvider};
use deposit_poller::AppState;

/// Code the scripted provider returns once its script runs out
#[allow(dead_code)]
pub const PENDING: StatusCode = 0;

/// Status provider that replays a script, then keeps answering `fallback`
#[allow(dead_code)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<StatusCode, StatusFetchError>>>,
    fallback: StatusCode,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(script: Vec<Result<StatusCode, StatusFetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: PENDING,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn codes(codes: &[StatusCode]) -> Self {
        Self::new(codes.iter().copied().map(Ok).collect())
    }

    pub fn always(code: StatusCode) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.fallback = code;
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusProvider for ScriptedProvider {
    async fn fetch_status(&self, _transaction_id: &str) -> Result<StatusCode, StatusFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        let next = self.script.lock().unwrap().pop_front();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        next.unwrap_or(Ok(self.fallback))
    }
}

#[allow(dead_code)]
pub fn transport_error() -> Result<StatusCode, StatusFetchError> {
    Err(StatusFetchError::Http("connection refused".to_string()))
}

/// Poller wired to a recording sink
#[allow(dead_code)]
pub fn recording_poller(
    provider: Arc<ScriptedProvider>,
) -> (DepositStatusPoller, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let poller = DepositStatusPoller::new(provider, sink.clone());
    (poller, sink)
}

#[allow(dead_code)]
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub provider: Arc<ScriptedProvider>,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new(provider: ScriptedProvider) -> Self {
        Self::with_limits(provider, PollerConfig::new(1_000, 10), 100)
    }

    pub fn with_limits(provider: ScriptedProvider, defaults: PollerConfig, burst: u32) -> Self {
        Self::build(provider, defaults, burst, Duration::from_secs(3_600))
    }

    pub fn with_retention(provider: ScriptedProvider, retention: Duration) -> Self {
        Self::build(provider, PollerConfig::new(1_000, 10), 100, retention)
    }

    fn build(
        provider: ScriptedProvider,
        defaults: PollerConfig,
        burst: u32,
        retention: Duration,
    ) -> Self {
        let provider = Arc::new(provider);
        let retention = chrono::Duration::from_std(retention).expect("Retention out of range");
        let state = AppState::new(provider.clone(), defaults, retention)
            .expect("Failed to build app state");
        let app = deposit_poller::create_app(state.clone(), burst);
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            state,
            provider,
        }
    }
}
