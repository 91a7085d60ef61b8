//! Protocol Engine Port
//!
//! The boundary between this client and the underlying FIX engine.
//! Everything below this trait - connection management, framing, sequence
//! numbers, heartbeats, resend - belongs to the engine; the application
//! layer only starts it, asks for its sessions, and hands it requests to
//! deliver.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::subscription::SubscriptionRequest;

// =============================================================================
// Session Identity
// =============================================================================

/// Identity of one logical FIX session: protocol version plus the
/// sender/target comp id pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    /// FIX begin string, e.g. `FIXT.1.1`.
    pub begin_string: String,
    /// Our comp id.
    pub sender_comp_id: String,
    /// The counterparty's comp id.
    pub target_comp_id: String,
}

impl SessionId {
    /// Create a session id from its components.
    #[must_use]
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced across the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The destination session id is not currently known to the engine.
    #[error("no session found for {0}")]
    SessionNotFound(SessionId),

    /// The engine was already started; a session is never recreated.
    #[error("engine already started")]
    AlreadyStarted,

    /// Transport-level failure (connect, read, write, queue).
    #[error("engine transport failure: {0}")]
    Transport(String),
}

// =============================================================================
// Port
// =============================================================================

/// Driven port for the underlying protocol engine.
///
/// Implementations own the transport and the session-level conversation.
/// The application layer holds exactly one engine for the process
/// lifetime.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Establish the transport and open the session-level conversation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyStarted`] on repeat calls and
    /// [`EngineError::Transport`] when the connection cannot be
    /// established.
    async fn start(&self) -> Result<(), EngineError>;

    /// Tear down the transport and forget the session.
    async fn stop(&self);

    /// Session ids currently known to the engine.
    fn session_ids(&self) -> Vec<SessionId>;

    /// Whether the given session has completed its logon exchange.
    fn is_logged_on(&self, session_id: &SessionId) -> bool;

    /// Re-issue a logon for an existing session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] when the id is unknown.
    async fn logon_session(&self, session_id: &SessionId) -> Result<(), EngineError>;

    /// Request logout for a session with a human-readable reason. Does
    /// not wait for the counterparty's acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] when the id is unknown.
    async fn logout_session(&self, session_id: &SessionId, reason: &str)
    -> Result<(), EngineError>;

    /// Queue a subscription request for delivery on the given session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] when the destination id is
    /// unknown, and [`EngineError::Transport`] when the outbound path is
    /// down.
    async fn send(
        &self,
        request: &SubscriptionRequest,
        session_id: &SessionId,
    ) -> Result<(), EngineError>;
}
