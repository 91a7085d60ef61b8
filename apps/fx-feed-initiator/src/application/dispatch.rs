//! Subscription Batch Dispatcher
//!
//! Iterates an instrument universe in order and sends one subscription
//! request per instrument, each carrying every configured size band as a
//! repeated group entry. A single parameterized path serves both the
//! targeted single-instrument shape and the full-universe sweep; callers
//! just vary the instrument list and builder parameters.
//!
//! # Error Policy
//!
//! A request that fails to build, or a send that fails for a per-message
//! reason, is logged and skipped so one bad instrument cannot hole the
//! rest of the feed coverage. A missing destination session is structural:
//! it aborts the remainder of the sweep and surfaces to the caller,
//! because silently dropped subscriptions are coverage gaps.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::instrument::Instrument;
use crate::domain::subscription::SubscriptionRequestBuilder;

use super::ports::{EngineError, ProtocolEngine};

// =============================================================================
// Errors
// =============================================================================

/// Failures that abort a dispatch sweep.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The engine currently has no session to dispatch on.
    #[error("no active session to dispatch subscriptions on")]
    NoActiveSession,

    /// The destination session disappeared mid-sweep.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Counts of what a dispatch sweep actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Requests handed to the engine.
    pub sent: usize,
    /// Instruments skipped over per-request failures.
    pub skipped: usize,
}

/// Dispatches subscription request batches over the active session.
pub struct SubscriptionDispatcher {
    engine: Arc<dyn ProtocolEngine>,
}

impl SubscriptionDispatcher {
    /// Create a dispatcher over the engine handle.
    #[must_use]
    pub fn new(engine: Arc<dyn ProtocolEngine>) -> Self {
        Self { engine }
    }

    /// Send one request per instrument, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoActiveSession`] when the engine has no
    /// session at all, and propagates [`EngineError::SessionNotFound`]
    /// when the destination vanishes mid-sweep. Per-request build and
    /// transport failures are logged, counted as skipped, and do not
    /// abort the sweep.
    pub async fn dispatch(
        &self,
        builder: &SubscriptionRequestBuilder,
        instruments: &[Instrument],
    ) -> Result<DispatchSummary, DispatchError> {
        let session_id = self
            .engine
            .session_ids()
            .into_iter()
            .next()
            .ok_or(DispatchError::NoActiveSession)?;

        let mut summary = DispatchSummary::default();

        for instrument in instruments {
            let request = match builder.build(instrument) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(
                        instrument = %instrument,
                        error = %e,
                        "skipping invalid subscription request"
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            tracing::info!(
                instrument = %instrument,
                bands = request.size_bands.len(),
                settlement = request.settlement.wire_code(),
                mode = request.mode.wire_code(),
                dedup_index = request.dedup_index,
                "sending market data request"
            );

            match self.engine.send(&request, &session_id).await {
                Ok(()) => summary.sent += 1,
                Err(e @ EngineError::SessionNotFound(_)) => {
                    tracing::error!(
                        instrument = %instrument,
                        error = %e,
                        "destination session lost; aborting sweep"
                    );
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::warn!(
                        instrument = %instrument,
                        error = %e,
                        "send failed; continuing sweep"
                    );
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::application::ports::{MockProtocolEngine, SessionId};
    use crate::domain::subscription::SubscriptionMode;

    fn session_id() -> SessionId {
        SessionId::new("FIXT.1.1", "FXFEED", "LP")
    }

    fn instruments(codes: &[&str]) -> Vec<Instrument> {
        codes
            .iter()
            .map(|c| Instrument::new(*c).unwrap())
            .collect()
    }

    fn builder() -> SubscriptionRequestBuilder {
        SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
            .size_bands(vec![Decimal::from_str("200000").unwrap()])
    }

    #[tokio::test]
    async fn one_send_per_instrument() {
        let id = session_id();
        let mut engine = MockProtocolEngine::new();
        engine
            .expect_session_ids()
            .returning(move || vec![id.clone()]);
        engine
            .expect_send()
            .times(3)
            .returning(|_, _| Ok(()));

        let dispatcher = SubscriptionDispatcher::new(Arc::new(engine));
        let summary = dispatcher
            .dispatch(&builder(), &instruments(&["AUD.CAD", "EUR.USD", "USD.JPY"]))
            .await
            .unwrap();

        assert_eq!(summary.sent, 3);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn no_session_is_an_error_not_a_silent_noop() {
        let mut engine = MockProtocolEngine::new();
        engine.expect_session_ids().returning(Vec::new);
        engine.expect_send().never();

        let dispatcher = SubscriptionDispatcher::new(Arc::new(engine));
        let result = dispatcher
            .dispatch(&builder(), &instruments(&["EUR.USD"]))
            .await;

        assert!(matches!(result, Err(DispatchError::NoActiveSession)));
    }

    #[tokio::test]
    async fn session_not_found_aborts_the_sweep() {
        let id = session_id();
        let lost = id.clone();
        let mut engine = MockProtocolEngine::new();
        engine
            .expect_session_ids()
            .returning(move || vec![id.clone()]);
        engine
            .expect_send()
            .times(1)
            .returning(move |_, _| Err(EngineError::SessionNotFound(lost.clone())));

        let dispatcher = SubscriptionDispatcher::new(Arc::new(engine));
        let result = dispatcher
            .dispatch(&builder(), &instruments(&["AUD.CAD", "EUR.USD"]))
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::Engine(EngineError::SessionNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn transport_failure_skips_but_continues() {
        let id = session_id();
        let mut engine = MockProtocolEngine::new();
        engine
            .expect_session_ids()
            .returning(move || vec![id.clone()]);
        let mut first = true;
        engine.expect_send().times(2).returning(move |_, _| {
            if first {
                first = false;
                Err(EngineError::Transport("queue full".to_string()))
            } else {
                Ok(())
            }
        });

        let dispatcher = SubscriptionDispatcher::new(Arc::new(engine));
        let summary = dispatcher
            .dispatch(&builder(), &instruments(&["AUD.CAD", "EUR.USD"]))
            .await
            .unwrap();

        assert_eq!(summary.sent, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn invalid_request_skips_only_that_instrument() {
        let id = session_id();
        let mut engine = MockProtocolEngine::new();
        engine
            .expect_session_ids()
            .returning(move || vec![id.clone()]);
        engine.expect_send().never();

        // Unsubscribe without a dedup index never builds.
        let invalid = builder().mode(SubscriptionMode::Unsubscribe);

        let dispatcher = SubscriptionDispatcher::new(Arc::new(engine));
        let summary = dispatcher
            .dispatch(&invalid, &instruments(&["AUD.CAD", "EUR.USD"]))
            .await
            .unwrap();

        assert_eq!(summary.sent, 0);
        assert_eq!(summary.skipped, 2);
    }
}
