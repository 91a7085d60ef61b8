#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access
    )
)]

//! FX Feed Initiator - FIX Market Data Subscription Client
//!
//! Maintains a single authenticated FIX session to an FX liquidity
//! provider and dispatches market data subscription requests across a
//! configured universe of currency pairs. The process stays alive after
//! the subscription batch until an operator shutdown signal arrives.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Instrument identifiers and the subscription request model
//!   - `instrument`: Currency-pair codes
//!   - `subscription`: Settlement types, subscription modes, request builder
//!
//! - **Application**: Session orchestration over the engine port
//!   - `ports`: The protocol engine boundary
//!   - `session`: Session lifecycle gate (logon/logout)
//!   - `dispatch`: Subscription batch dispatcher
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `config`: TOML settings with an embedded default
//!   - `fix`: FIX tag constants, message values, wire encoding
//!   - `engine`: Socket-based initiator implementing the engine port
//!   - `telemetry`: Tracing initialization
//!
//! - **Runtime**: Process lifetime
//!   - `shutdown`: One-shot shutdown gate wired to OS signals
//!
//! # Control Flow
//!
//! ```text
//! config ──► engine ──► SessionGate::logon ──► readiness wait
//!                                                   │
//!             ShutdownGate::wait ◄── dispatch batch ┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Instruments and the subscription request model.
pub mod domain;

/// Application layer - Session gate, dispatcher, and the engine port.
pub mod application;

/// Infrastructure layer - Config, FIX encoding, socket engine, telemetry.
pub mod infrastructure;

/// Runtime layer - Process lifetime primitives.
pub mod runtime;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::instrument::{Instrument, InstrumentError};
pub use domain::subscription::{
    BuildError, SettlementType, SubscriptionMode, SubscriptionRequest, SubscriptionRequestBuilder,
};

// Application services and the engine boundary
pub use application::dispatch::{DispatchError, DispatchSummary, SubscriptionDispatcher};
pub use application::ports::{EngineError, ProtocolEngine, SessionId};
pub use application::session::SessionGate;

// Infrastructure config
pub use infrastructure::config::{ConfigError, CredentialSettings, InitiatorConfig};

// Socket engine adapter
pub use infrastructure::engine::{SocketInitiator, SocketInitiatorConfig};

// Runtime
pub use runtime::shutdown::ShutdownGate;
