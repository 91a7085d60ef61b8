//! Shutdown Gate
//!
//! A one-shot gate that keeps the process alive after the subscription
//! batch has been dispatched. `signal` opens the gate exactly once;
//! `wait` returns immediately when called after the gate has opened, so
//! no wake-up is ever lost. The gate is intentionally decoupled from
//! session teardown: logon and logout have no effect on process lifetime.

use tokio_util::sync::CancellationToken;

/// One-shot process shutdown gate.
#[derive(Debug, Clone, Default)]
pub struct ShutdownGate {
    token: CancellationToken,
}

impl ShutdownGate {
    /// Create a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate. Idempotent: calls after the first are no-ops.
    pub fn signal(&self) {
        self.token.cancel();
    }

    /// Whether the gate has been opened.
    #[must_use]
    pub fn is_signalled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Suspend until the gate opens. Returns immediately if it already
    /// has.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

/// Open the gate when the operator sends SIGINT or SIGTERM.
///
/// Runs until a signal arrives; spawn it alongside the main path.
#[allow(clippy::expect_used)]
pub async fn signal_on_interrupt(gate: ShutdownGate) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("without a Ctrl+C handler the gate could never open");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("without a SIGTERM handler the gate could never open")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Ctrl+C received; opening the shutdown gate");
        }
        () = terminate => {
            tracing::info!("SIGTERM received; opening the shutdown gate");
        }
    }

    gate.signal();
}

// =============================================================================
// Tests
// =============================================================================
