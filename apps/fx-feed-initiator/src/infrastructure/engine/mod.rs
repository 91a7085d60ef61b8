//! Socket Initiator
//!
//! Thin transport adapter implementing the [`ProtocolEngine`] port over a
//! TCP socket. It connects, opens the conversation with a logon, keeps
//! the session alive (heartbeats out, test requests answered), and
//! delivers market data requests handed to it. Sequence-number recovery,
//! resend, and message persistence are left to the counterparty-facing
//! engine proper; this adapter only speaks enough of the session layer to
//! be a usable initiator.
//!
//! # Task Model
//!
//! `start` spawns a writer task (draining an outbound queue, stamping the
//! session header per message) and a reader task (framing inbound bytes
//! and handling session-level messages). Both stop on cancellation or
//! when the transport drops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{EngineError, ProtocolEngine, SessionId};
use crate::domain::subscription::SubscriptionRequest;
use crate::infrastructure::config::InitiatorConfig;
use crate::infrastructure::fix::{FixMessage, encode, msg_type, tag};

/// Outbound queue depth before senders back-pressure.
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Inbound read chunk size.
const READ_CHUNK_SIZE: usize = 4096;

// =============================================================================
// Configuration
// =============================================================================

/// Settings for the socket initiator.
#[derive(Clone)]
pub struct SocketInitiatorConfig {
    /// Counterparty host.
    pub host: String,
    /// Counterparty port.
    pub port: u16,
    /// FIX begin string.
    pub begin_string: String,
    /// Our comp id.
    pub sender_comp_id: String,
    /// The counterparty's comp id.
    pub target_comp_id: String,
    /// Heartbeat interval.
    pub heartbeat_interval: Duration,
    /// Logon username (may be empty).
    pub username: String,
    /// Logon password (may be empty).
    pub password: String,
}

impl SocketInitiatorConfig {
    /// The session id this configuration describes.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        SessionId::new(&self.begin_string, &self.sender_comp_id, &self.target_comp_id)
    }
}

impl From<&InitiatorConfig> for SocketInitiatorConfig {
    fn from(config: &InitiatorConfig) -> Self {
        Self {
            host: config.session.host.clone(),
            port: config.session.port,
            begin_string: config.session.begin_string.clone(),
            sender_comp_id: config.session.sender_comp_id.clone(),
            target_comp_id: config.session.target_comp_id.clone(),
            heartbeat_interval: config.session.heartbeat_interval(),
            username: config.credentials.username().to_string(),
            password: config.credentials.password().to_string(),
        }
    }
}

impl std::fmt::Debug for SocketInitiatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketInitiatorConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("session", &self.session_id().to_string())
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Initiator
// =============================================================================

#[derive(Clone)]
struct ActiveSession {
    id: SessionId,
    outbound: mpsc::Sender<FixMessage>,
    logged_on: Arc<AtomicBool>,
}

/// TCP initiator implementing the protocol engine port.
pub struct SocketInitiator {
    config: SocketInitiatorConfig,
    cancel: CancellationToken,
    active: RwLock<Option<ActiveSession>>,
}

impl SocketInitiator {
    /// Create an initiator; no connection is made until `start`.
    #[must_use]
    pub fn new(config: SocketInitiatorConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            active: RwLock::new(None),
        }
    }

    fn lookup(&self, session_id: &SessionId) -> Result<ActiveSession, EngineError> {
        self.active
            .read()
            .as_ref()
            .filter(|session| session.id == *session_id)
            .cloned()
            .ok_or_else(|| EngineError::SessionNotFound(session_id.clone()))
    }

    async fn enqueue(&self, session_id: &SessionId, msg: FixMessage) -> Result<(), EngineError> {
        let session = self.lookup(session_id)?;
        session
            .outbound
            .send(msg)
            .await
            .map_err(|_| EngineError::Transport("outbound queue closed".to_string()))
    }
}

#[async_trait]
impl ProtocolEngine for SocketInitiator {
    async fn start(&self) -> Result<(), EngineError> {
        if self.active.read().is_some() {
            return Err(EngineError::AlreadyStarted);
        }
        // Stop is terminal: one session per process lifetime.
        if self.cancel.is_cancelled() {
            return Err(EngineError::Transport("initiator already stopped".to_string()));
        }

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let session_id = self.config.session_id();
        tracing::info!(addr = %addr, session = %session_id, "connecting to counterparty");

        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| EngineError::Transport(format!("connect {addr}: {e}")))?;
        let (read_half, write_half) = stream.into_split();

        let (outbound_tx, outbound_rx) = mpsc::channel::<FixMessage>(OUTBOUND_QUEUE_CAPACITY);
        let logged_on = Arc::new(AtomicBool::new(false));

        tokio::spawn(write_loop(
            write_half,
            outbound_rx,
            self.config.clone(),
            self.cancel.clone(),
        ));
        tokio::spawn(read_loop(
            read_half,
            outbound_tx.clone(),
            Arc::clone(&logged_on),
            self.cancel.clone(),
        ));

        // Logon opens the session-level conversation.
        let logon = encode::logon(
            self.config.heartbeat_interval.as_secs(),
            &self.config.username,
            &self.config.password,
        );
        outbound_tx
            .send(logon)
            .await
            .map_err(|_| EngineError::Transport("outbound queue closed before logon".to_string()))?;

        *self.active.write() = Some(ActiveSession {
            id: session_id,
            outbound: outbound_tx,
            logged_on,
        });
        Ok(())
    }

    async fn stop(&self) {
        self.cancel.cancel();
        if let Some(session) = self.active.write().take() {
            tracing::info!(session = %session.id, "initiator stopped");
        }
    }

    fn session_ids(&self) -> Vec<SessionId> {
        self.active
            .read()
            .as_ref()
            .map(|session| vec![session.id.clone()])
            .unwrap_or_default()
    }

    fn is_logged_on(&self, session_id: &SessionId) -> bool {
        self.active
            .read()
            .as_ref()
            .is_some_and(|session| session.id == *session_id && session.logged_on.load(Ordering::SeqCst))
    }

    async fn logon_session(&self, session_id: &SessionId) -> Result<(), EngineError> {
        let logon = encode::logon(
            self.config.heartbeat_interval.as_secs(),
            &self.config.username,
            &self.config.password,
        );
        self.enqueue(session_id, logon).await
    }

    async fn logout_session(
        &self,
        session_id: &SessionId,
        reason: &str,
    ) -> Result<(), EngineError> {
        self.enqueue(session_id, encode::logout(Some(reason))).await
    }

    async fn send(
        &self,
        request: &SubscriptionRequest,
        session_id: &SessionId,
    ) -> Result<(), EngineError> {
        self.enqueue(session_id, encode::market_data_request(request))
            .await
    }
}

// =============================================================================
// Transport Tasks
// =============================================================================

/// Drain the outbound queue, stamping the session header per message, and
/// emit a heartbeat every interval of outbound silence.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<FixMessage>,
    config: SocketInitiatorConfig,
    cancel: CancellationToken,
) {
    let mut seq_num: u64 = 1;
    let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it.
    heartbeat.tick().await;

    loop {
        let msg = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("writer cancelled");
                return;
            }
            _ = heartbeat.tick() => encode::heartbeat(None),
            msg = outbound.recv() => {
                let Some(msg) = msg else {
                    tracing::debug!("outbound queue closed");
                    return;
                };
                heartbeat.reset();
                msg
            }
        };

        let bytes = msg.to_bytes(
            &config.begin_string,
            seq_num,
            &config.sender_comp_id,
            &config.target_comp_id,
            &Utc::now(),
        );
        if let Err(e) = writer.write_all(&bytes).await {
            tracing::error!(error = %e, "outbound write failed");
            return;
        }
        tracing::debug!(msg_type = msg.msg_type(), seq = seq_num, "sent");
        seq_num += 1;
    }
}

/// Frame inbound bytes and handle session-level messages.
async fn read_loop(
    mut reader: OwnedReadHalf,
    outbound: mpsc::Sender<FixMessage>,
    logged_on: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE * 2);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("reader cancelled");
                return;
            }
            read = reader.read(&mut chunk) => match read {
                Ok(0) => {
                    tracing::info!("counterparty closed the connection");
                    logged_on.store(false, Ordering::SeqCst);
                    return;
                }
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    for frame in encode::extract_frames(&mut buf) {
                        handle_frame(&frame, &outbound, &logged_on).await;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "inbound read failed");
                    logged_on.store(false, Ordering::SeqCst);
                    return;
                }
            }
        }
    }
}

async fn handle_frame(frame: &[u8], outbound: &mpsc::Sender<FixMessage>, logged_on: &AtomicBool) {
    let msg = match FixMessage::parse(frame) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed inbound frame");
            return;
        }
    };

    match msg.msg_type() {
        msg_type::LOGON => {
            logged_on.store(true, Ordering::SeqCst);
            tracing::info!("logon acknowledged");
        }
        msg_type::TEST_REQUEST => {
            let reply = encode::heartbeat(msg.get_field(tag::TEST_REQ_ID));
            if outbound.send(reply).await.is_err() {
                tracing::warn!("cannot answer test request; outbound queue closed");
            }
        }
        msg_type::HEARTBEAT => {
            tracing::trace!("heartbeat received");
        }
        msg_type::LOGOUT => {
            logged_on.store(false, Ordering::SeqCst);
            tracing::info!(
                reason = msg.get_field(tag::TEXT).unwrap_or(""),
                "logout received"
            );
        }
        other => {
            tracing::trace!(msg_type = other, "ignoring application-level message");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
