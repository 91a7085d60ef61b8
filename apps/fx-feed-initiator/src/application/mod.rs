//! Application layer.
//!
//! Session orchestration and subscription dispatch over the protocol
//! engine port. These services carry the ordering and state rules; wire
//! concerns live behind the port.

pub mod dispatch;
pub mod ports;
pub mod session;
