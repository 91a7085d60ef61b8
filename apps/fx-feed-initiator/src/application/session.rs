//! Session Lifecycle Gate
//!
//! Owns the single engine handle for the process and gates logon/logout
//! around it. The first `logon` starts the engine; later calls re-issue a
//! logon for every session the engine knows, never creating a second one.
//!
//! A logon failure is deliberately non-fatal to the process: callers log
//! it and proceed, then rely on per-send errors (or [`await_ready`]) to
//! observe an unusable session.
//!
//! [`await_ready`]: SessionGate::await_ready

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::ports::{EngineError, ProtocolEngine};

/// How often the readiness wait re-checks the engine's logon state.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Gate around the process's one logical session.
pub struct SessionGate {
    engine: Arc<dyn ProtocolEngine>,
    // Guards the read-and-write of the started flag so concurrent logon
    // attempts cannot start the engine twice.
    started: Mutex<bool>,
}

impl SessionGate {
    /// Create a gate over the engine handle.
    #[must_use]
    pub fn new(engine: Arc<dyn ProtocolEngine>) -> Self {
        Self {
            engine,
            started: Mutex::new(false),
        }
    }

    /// Whether the engine has been started through this gate.
    pub async fn is_started(&self) -> bool {
        *self.started.lock().await
    }

    /// Start the engine on first call; re-issue logon for every known
    /// session on subsequent calls.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError`] from the start or per-session logon
    /// step. The started flag is only set once the engine start succeeds,
    /// so a failed first logon can be retried.
    pub async fn logon(&self) -> Result<(), EngineError> {
        let mut started = self.started.lock().await;
        if *started {
            for session_id in self.engine.session_ids() {
                tracing::info!(session = %session_id, "re-issuing logon");
                self.engine.logon_session(&session_id).await?;
            }
            return Ok(());
        }

        self.engine.start().await?;
        *started = true;
        Ok(())
    }

    /// Request logout for every known session with the given reason.
    ///
    /// Does not wait for acknowledgment; failures are logged per session
    /// and never propagated, since teardown is best-effort.
    pub async fn logout(&self, reason: &str) {
        for session_id in self.engine.session_ids() {
            tracing::info!(session = %session_id, reason, "requesting logout");
            if let Err(e) = self.engine.logout_session(&session_id, reason).await {
                tracing::warn!(session = %session_id, error = %e, "logout request failed");
            }
        }
    }

    /// Wait until some session reports logged-on, up to `timeout`.
    ///
    /// Returns `true` as soon as a session is ready, `false` when the
    /// timeout elapses first. Dispatching after a `false` return is
    /// allowed; sends then surface their own errors.
    pub async fn await_ready(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let ids = self.engine.session_ids();
            if ids.iter().any(|id| self.engine.is_logged_on(id)) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
