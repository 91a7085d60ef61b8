//! Dispatch Flow Integration Tests
//!
//! Drives the session gate and dispatcher through the public API against
//! an in-memory recording engine, covering the full-universe sweep, the
//! targeted single-instrument shapes, and configuration failure.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use fx_feed_initiator::{
    ConfigError, DispatchError, EngineError, InitiatorConfig, Instrument, ProtocolEngine,
    SessionGate, SessionId, SettlementType, SubscriptionDispatcher, SubscriptionMode,
    SubscriptionRequest, SubscriptionRequestBuilder,
};

// =============================================================================
// Recording Engine
// =============================================================================

/// In-memory engine that records everything handed across the port.
struct RecordingEngine {
    session: Mutex<Option<SessionId>>,
    logged_on: AtomicBool,
    start_calls: AtomicUsize,
    logon_requests: Mutex<Vec<SessionId>>,
    logout_requests: Mutex<Vec<(SessionId, String)>>,
    sent: Mutex<Vec<(SubscriptionRequest, SessionId)>>,
}

impl RecordingEngine {
    fn new() -> Self {
        Self {
            session: Mutex::new(None),
            logged_on: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            logon_requests: Mutex::new(Vec::new()),
            logout_requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn session_id() -> SessionId {
        SessionId::new("FIXT.1.1", "FXFEED", "LP")
    }

    fn sent(&self) -> Vec<(SubscriptionRequest, SessionId)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl ProtocolEngine for RecordingEngine {
    async fn start(&self) -> Result<(), EngineError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.session.lock() = Some(Self::session_id());
        self.logged_on.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        *self.session.lock() = None;
        self.logged_on.store(false, Ordering::SeqCst);
    }

    fn session_ids(&self) -> Vec<SessionId> {
        self.session.lock().iter().cloned().collect()
    }

    fn is_logged_on(&self, session_id: &SessionId) -> bool {
        self.session.lock().as_ref() == Some(session_id) && self.logged_on.load(Ordering::SeqCst)
    }

    async fn logon_session(&self, session_id: &SessionId) -> Result<(), EngineError> {
        if self.session.lock().as_ref() != Some(session_id) {
            return Err(EngineError::SessionNotFound(session_id.clone()));
        }
        self.logon_requests.lock().push(session_id.clone());
        Ok(())
    }

    async fn logout_session(
        &self,
        session_id: &SessionId,
        reason: &str,
    ) -> Result<(), EngineError> {
        if self.session.lock().as_ref() != Some(session_id) {
            return Err(EngineError::SessionNotFound(session_id.clone()));
        }
        self.logout_requests
            .lock()
            .push((session_id.clone(), reason.to_string()));
        Ok(())
    }

    async fn send(
        &self,
        request: &SubscriptionRequest,
        session_id: &SessionId,
    ) -> Result<(), EngineError> {
        if self.session.lock().as_ref() != Some(session_id) {
            return Err(EngineError::SessionNotFound(session_id.clone()));
        }
        self.sent.lock().push((request.clone(), session_id.clone()));
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn bands(values: &[&str]) -> Vec<Decimal> {
    values
        .iter()
        .map(|v| Decimal::from_str(v).unwrap())
        .collect()
}

fn instruments(codes: &[&str]) -> Vec<Instrument> {
    codes
        .iter()
        .map(|c| Instrument::new(*c).unwrap())
        .collect()
}

// =============================================================================
// Scenario A: two instruments, two bands each
// =============================================================================

#[tokio::test]
async fn two_instrument_sweep_carries_both_bands() {
    let engine = Arc::new(RecordingEngine::new());
    let gate = SessionGate::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    gate.logon().await.unwrap();

    let builder = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
        .mode(SubscriptionMode::SnapshotUpdates)
        .size_bands(bands(&["3000000", "5000000"]));

    let dispatcher = SubscriptionDispatcher::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    let summary = dispatcher
        .dispatch(&builder, &instruments(&["AUD.CAD", "EUR.USD"]))
        .await
        .unwrap();

    assert_eq!(summary.sent, 2);
    let sent = engine.sent();
    assert_eq!(sent.len(), 2);

    assert_eq!(sent[0].0.instrument.as_str(), "AUD.CAD");
    assert_eq!(sent[1].0.instrument.as_str(), "EUR.USD");
    for (request, session) in &sent {
        assert_eq!(session, &RecordingEngine::session_id());
        assert_eq!(request.mode, SubscriptionMode::SnapshotUpdates);
        let entries: Vec<_> = request.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, Decimal::from_str("3000000").unwrap());
        assert_eq!(entries[1].1, Decimal::from_str("5000000").unwrap());
        for (entry_instrument, _) in entries {
            assert_eq!(entry_instrument, &request.instrument);
        }
    }
}

// =============================================================================
// Scenario B: full-universe sweep from the embedded configuration
// =============================================================================

#[tokio::test]
async fn full_universe_sweep_sends_one_request_per_instrument() {
    let config = InitiatorConfig::embedded_default().unwrap();
    assert_eq!(config.universe.instruments.len(), 39);

    let engine = Arc::new(RecordingEngine::new());
    let gate = SessionGate::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    gate.logon().await.unwrap();

    // Settlement and mode as they would arrive from the argument surface.
    let settlement: SettlementType = "1".parse().unwrap();
    let mode: SubscriptionMode = "1".parse().unwrap();
    let builder = SubscriptionRequestBuilder::new(
        &config.subscription.request_id,
        &config.subscription.party_id,
    )
    .settlement(settlement)
    .mode(mode)
    .size_bands(config.subscription.size_bands.clone());

    let dispatcher = SubscriptionDispatcher::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    let summary = dispatcher
        .dispatch(&builder, &config.universe.instruments)
        .await
        .unwrap();

    assert_eq!(summary.sent, 39);
    assert_eq!(summary.skipped, 0);

    let sent = engine.sent();
    assert_eq!(sent.len(), 39);
    // Iteration order follows the configured universe.
    for (i, (request, _)) in sent.iter().enumerate() {
        assert_eq!(&request.instrument, &config.universe.instruments[i]);
        assert_eq!(request.settlement, SettlementType::Today);
        assert_eq!(request.mode, SubscriptionMode::SnapshotUpdates);
    }
}

// =============================================================================
// Scenario C: targeted unsubscribe with a dedup index
// =============================================================================

#[tokio::test]
async fn targeted_unsubscribe_carries_the_dedup_index() {
    let engine = Arc::new(RecordingEngine::new());
    let gate = SessionGate::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    gate.logon().await.unwrap();

    let builder = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
        .mode(SubscriptionMode::Unsubscribe)
        .dedup_index(Some(476))
        .size_bands(bands(&["200000"]));

    let dispatcher = SubscriptionDispatcher::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    let summary = dispatcher
        .dispatch(&builder, &instruments(&["AUD.JPY"]))
        .await
        .unwrap();

    assert_eq!(summary.sent, 1);
    let sent = engine.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.instrument.as_str(), "AUD.JPY");
    assert_eq!(sent[0].0.dedup_index, Some(476));
    assert_eq!(sent[0].0.mode, SubscriptionMode::Unsubscribe);
}

// =============================================================================
// Scenario D: unresolvable configuration stops everything up front
// =============================================================================

#[test]
fn unresolvable_configuration_is_fatal_before_any_session_work() {
    let result = InitiatorConfig::resolve(Some(Path::new("/no/such/initiator.toml")));
    assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
}

// =============================================================================
// Session lifecycle properties
// =============================================================================

#[tokio::test]
async fn repeated_logon_reuses_the_single_session() {
    let engine = Arc::new(RecordingEngine::new());
    let gate = SessionGate::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);

    gate.logon().await.unwrap();
    gate.logon().await.unwrap();

    assert_eq!(engine.start_calls.load(Ordering::SeqCst), 1);
    // The second call acted on the existing session's id list.
    assert_eq!(
        engine.logon_requests.lock().clone(),
        vec![RecordingEngine::session_id()]
    );
}

#[tokio::test]
async fn logout_reaches_every_known_session() {
    let engine = Arc::new(RecordingEngine::new());
    let gate = SessionGate::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    gate.logon().await.unwrap();

    gate.logout("user requested").await;

    let logouts = engine.logout_requests.lock().clone();
    assert_eq!(logouts.len(), 1);
    assert_eq!(logouts[0].1, "user requested");
}

#[tokio::test]
async fn dispatch_without_a_session_raises_rather_than_dropping() {
    let engine = Arc::new(RecordingEngine::new());
    // No logon: the engine has no session.
    let builder = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
        .size_bands(bands(&["200000"]));

    let dispatcher = SubscriptionDispatcher::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    let result = dispatcher.dispatch(&builder, &instruments(&["EUR.USD"])).await;

    assert!(matches!(result, Err(DispatchError::NoActiveSession)));
    assert!(engine.sent().is_empty());
}

#[tokio::test]
async fn readiness_wait_observes_the_logged_on_session() {
    let engine = Arc::new(RecordingEngine::new());
    let gate = SessionGate::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);

    assert!(!gate.await_ready(std::time::Duration::from_millis(60)).await);
    gate.logon().await.unwrap();
    assert!(gate.await_ready(std::time::Duration::from_secs(1)).await);
}
