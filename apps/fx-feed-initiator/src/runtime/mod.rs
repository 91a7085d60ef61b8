//! Runtime layer.
//!
//! Process-lifetime primitives, independent of the session lifecycle.

pub mod shutdown;
