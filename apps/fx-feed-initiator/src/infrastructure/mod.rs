//! Infrastructure layer.
//!
//! Adapters around the application core: configuration, FIX wire
//! encoding, the socket engine, and tracing setup.

pub mod config;
pub mod engine;
pub mod fix;
pub mod telemetry;
