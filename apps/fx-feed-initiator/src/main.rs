//! FX Feed Initiator Binary
//!
//! Brings up the FIX session, dispatches the configured subscription
//! batch, and stays alive until an operator shutdown signal.
//!
//! # Usage
//!
//! ```bash
//! # Sweep the whole configured universe with the configured defaults
//! cargo run -p fx-feed-initiator
//!
//! # Two size bands per instrument, streaming updates
//! cargo run -p fx-feed-initiator -- --amount 3000000 --amount 5000000 --mode updates
//!
//! # Cancel one instrument's subscription by its dedup index
//! cargo run -p fx-feed-initiator -- --symbol AUD.JPY --mode unsubscribe --dedup-index 476
//! ```
//!
//! # Environment Variables
//!
//! - `FX_FEED_USERNAME` / `FX_FEED_PASSWORD`: logon credential overrides
//! - `RUST_LOG`: log filter (default: `fx_feed_initiator=info`)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rust_decimal::Decimal;

use fx_feed_initiator::application::ports::ProtocolEngine;
use fx_feed_initiator::domain::instrument::Instrument;
use fx_feed_initiator::domain::subscription::{
    SettlementType, SubscriptionMode, SubscriptionRequestBuilder,
};
use fx_feed_initiator::infrastructure::telemetry;
use fx_feed_initiator::runtime::shutdown::{ShutdownGate, signal_on_interrupt};
use fx_feed_initiator::{
    InitiatorConfig, SessionGate, SocketInitiator, SocketInitiatorConfig, SubscriptionDispatcher,
};

/// How long to wait for the session to report logged-on before
/// dispatching anyway.
const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// FIX market data subscription initiator for streaming FX price feeds.
#[derive(Parser, Debug)]
#[command(name = "fx-feed-initiator", version)]
struct Cli {
    /// Path to a TOML configuration file; the embedded default is used
    /// when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Size band quantity; repeat the flag for multiple bands per
    /// instrument. Overrides the configured bands.
    #[arg(long = "amount")]
    amounts: Vec<Decimal>,

    /// Settlement type: spot | today (or wire codes 0 | 1).
    #[arg(long)]
    settl_type: Option<SettlementType>,

    /// Subscription mode: snapshot | updates | unsubscribe (or wire
    /// codes 0 | 1 | 2).
    #[arg(long)]
    mode: Option<SubscriptionMode>,

    /// Counterparty-assigned sequence value identifying the subscription
    /// to cancel; required for unsubscribe.
    #[arg(long)]
    dedup_index: Option<u64>,

    /// Instrument to target, or ALL for the whole configured universe.
    #[arg(long)]
    symbol: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();

    let cli = Cli::parse();
    tracing::info!("Starting FX feed initiator");

    let mut config = match InitiatorConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration unresolvable; not starting");
            return Err(e.into());
        }
    };
    config.apply_env_overrides();
    log_config(&config);

    let engine: Arc<SocketInitiator> =
        Arc::new(SocketInitiator::new(SocketInitiatorConfig::from(&config)));
    let gate = SessionGate::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);

    if let Err(e) = gate.logon().await {
        tracing::error!(error = %e, "logon failed; continuing to dispatch phase");
    }
    if !gate.await_ready(READY_TIMEOUT).await {
        tracing::warn!(
            timeout_secs = READY_TIMEOUT.as_secs(),
            "session not ready; dispatching anyway"
        );
    }

    let dispatcher =
        SubscriptionDispatcher::new(Arc::clone(&engine) as Arc<dyn ProtocolEngine>);
    dispatch_batch(&dispatcher, &cli, &config).await;

    let shutdown = ShutdownGate::new();
    tokio::spawn(signal_on_interrupt(shutdown.clone()));
    tracing::info!("Initiator running; awaiting shutdown signal");
    shutdown.wait().await;

    gate.logout("user requested").await;
    engine.stop().await;
    tracing::info!("Initiator stopped");
    Ok(())
}

/// Build the batch parameters from CLI and config and run the dispatch.
///
/// Dispatch failures are logged, never fatal: the process proceeds to the
/// shutdown gate regardless so a partial bring-up stays observable.
async fn dispatch_batch(dispatcher: &SubscriptionDispatcher, cli: &Cli, config: &InitiatorConfig) {
    let size_bands = if cli.amounts.is_empty() {
        config.subscription.size_bands.clone()
    } else {
        cli.amounts.clone()
    };
    let builder = SubscriptionRequestBuilder::new(
        &config.subscription.request_id,
        &config.subscription.party_id,
    )
    .settlement(cli.settl_type.unwrap_or(config.subscription.settl_type))
    .mode(cli.mode.unwrap_or(config.subscription.mode))
    .size_bands(size_bands)
    .dedup_index(cli.dedup_index);

    let instruments = match cli.symbol.as_deref() {
        None | Some("ALL") => config.universe.instruments.clone(),
        Some(symbol) => match Instrument::new(symbol) {
            Ok(instrument) => vec![instrument],
            Err(e) => {
                tracing::error!(symbol, error = %e, "invalid symbol; nothing to dispatch");
                return;
            }
        },
    };

    match dispatcher.dispatch(&builder, &instruments).await {
        Ok(summary) => tracing::info!(
            sent = summary.sent,
            skipped = summary.skipped,
            "subscription batch dispatched"
        ),
        Err(e) => tracing::error!(error = %e, "subscription dispatch aborted"),
    }
}

/// Log the parsed configuration.
fn log_config(config: &InitiatorConfig) {
    tracing::info!(
        session = %config.session.session_id(),
        host = %config.session.host,
        port = config.session.port,
        heartbeat_secs = config.session.heartbeat_interval_secs,
        universe = config.universe.instruments.len(),
        bands = config.subscription.size_bands.len(),
        "Configuration loaded"
    );
}

/// Load .env from the current directory or any ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
