//! Instrument Identifiers
//!
//! A tradeable currency pair such as `EUR.USD`. Instruments are immutable
//! and drawn from a configured universe; the code itself is opaque to this
//! client beyond being non-empty.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing an [`Instrument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    /// The instrument code was empty or whitespace.
    #[error("instrument code cannot be empty")]
    Empty,
}

/// A tradeable instrument pair, e.g. `EUR.USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument(String);

impl Instrument {
    /// Create an instrument from a pair code.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::Empty`] if the code is empty or
    /// whitespace-only.
    pub fn new(code: impl Into<String>) -> Result<Self, InstrumentError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(InstrumentError::Empty);
        }
        Ok(Self(code))
    }

    /// The pair code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Instrument {
    type Error = InstrumentError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<Instrument> for String {
    fn from(instrument: Instrument) -> Self {
        instrument.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
