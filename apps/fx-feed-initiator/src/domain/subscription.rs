//! Subscription Request Model
//!
//! Value types for market data subscription requests and the pure builder
//! that constructs them. A request targets one instrument and carries one
//! repeated group entry per size band, so a request with N bands asks the
//! counterparty for N separate depth tiers of the same pair.
//!
//! # Design
//!
//! The builder holds the parameters shared across a dispatch batch
//! (request id, party id, settlement, mode, bands, dedup index) and is
//! applied once per instrument. Construction is deterministic: identical
//! inputs produce identical values, with no clock or randomness involved.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::instrument::Instrument;

// =============================================================================
// Enumerations
// =============================================================================

/// Settlement type for the quoted instrument.
///
/// Wire codes follow the counterparty's convention: `0` for spot, `1` for
/// today (forward-dated) settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementType {
    /// Immediate (spot) settlement.
    #[default]
    Spot,
    /// Forward-dated settlement.
    Today,
}

impl SettlementType {
    /// The value carried in the settlement type field on the wire.
    #[must_use]
    pub const fn wire_code(self) -> &'static str {
        match self {
            Self::Spot => "0",
            Self::Today => "1",
        }
    }
}

/// Failed to parse a settlement type from its name or wire code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown settlement type: {0} (expected spot, today, 0 or 1)")]
pub struct ParseSettlementError(String);

impl std::str::FromStr for SettlementType {
    type Err = ParseSettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spot" | "0" => Ok(Self::Spot),
            "today" | "1" => Ok(Self::Today),
            other => Err(ParseSettlementError(other.to_string())),
        }
    }
}

/// What kind of streaming behavior a subscription request asks for.
///
/// Wire codes: `0` snapshot only, `1` snapshot plus updates, `2`
/// unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionMode {
    /// One-shot snapshot of the current book.
    Snapshot,
    /// Snapshot followed by streaming updates.
    #[default]
    #[serde(rename = "updates")]
    SnapshotUpdates,
    /// Cancel a previously established subscription.
    Unsubscribe,
}

impl SubscriptionMode {
    /// The value carried in the subscription request type field on the wire.
    #[must_use]
    pub const fn wire_code(self) -> &'static str {
        match self {
            Self::Snapshot => "0",
            Self::SnapshotUpdates => "1",
            Self::Unsubscribe => "2",
        }
    }

    /// Whether this mode cancels an existing subscription.
    #[must_use]
    pub const fn is_unsubscribe(self) -> bool {
        matches!(self, Self::Unsubscribe)
    }
}

/// Failed to parse a subscription mode from its name or wire code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown subscription mode: {0} (expected snapshot, updates, unsubscribe, 0, 1 or 2)")]
pub struct ParseModeError(String);

impl std::str::FromStr for SubscriptionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snapshot" | "0" => Ok(Self::Snapshot),
            "updates" | "1" => Ok(Self::SnapshotUpdates),
            "unsubscribe" | "2" => Ok(Self::Unsubscribe),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

// =============================================================================
// Request Value
// =============================================================================

/// A fully populated market data subscription request for one instrument.
///
/// Carries every field the dispatcher must populate; session-level header
/// fields are stamped by the transport at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    /// Client-assigned request identifier, reused across a batch.
    pub request_id: String,
    /// The instrument this request targets.
    pub instrument: Instrument,
    /// Depth tiers requested, one repeated group entry per band. Non-empty.
    pub size_bands: Vec<Decimal>,
    /// Settlement type for the quoted prices.
    pub settlement: SettlementType,
    /// Snapshot, streaming, or unsubscribe behavior.
    pub mode: SubscriptionMode,
    /// Counterparty-assigned sequence value identifying the subscription
    /// to cancel. Present exactly when `mode` is unsubscribe.
    pub dedup_index: Option<u64>,
    /// Party identifier naming the price stream.
    pub party_id: String,
}

impl SubscriptionRequest {
    /// The repeated group entries: the instrument paired with each band,
    /// in band order.
    pub fn entries(&self) -> impl Iterator<Item = (&Instrument, Decimal)> {
        self.size_bands.iter().map(|band| (&self.instrument, *band))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Validation failures when building a subscription request.
///
/// Instrument validity is not checked here: an [`Instrument`] is already
/// validated at construction, so the builder only guards the band and
/// dedup-index rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// At least one size band is required.
    #[error("at least one size band is required")]
    EmptySizeBands,
    /// Unsubscribing requires the counterparty-assigned dedup index.
    #[error("unsubscribe requires the dedup index assigned by the counterparty")]
    MissingDedupIndex,
}

/// Pure constructor for [`SubscriptionRequest`] values.
///
/// Holds the batch-wide parameters; [`build`](Self::build) applies them to
/// one instrument at a time.
#[derive(Debug, Clone)]
pub struct SubscriptionRequestBuilder {
    request_id: String,
    party_id: String,
    settlement: SettlementType,
    mode: SubscriptionMode,
    size_bands: Vec<Decimal>,
    dedup_index: Option<u64>,
}

impl SubscriptionRequestBuilder {
    /// Create a builder with default settlement and mode and no bands.
    #[must_use]
    pub fn new(request_id: impl Into<String>, party_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            party_id: party_id.into(),
            settlement: SettlementType::default(),
            mode: SubscriptionMode::default(),
            size_bands: Vec::new(),
            dedup_index: None,
        }
    }

    /// Set the settlement type.
    #[must_use]
    pub const fn settlement(mut self, settlement: SettlementType) -> Self {
        self.settlement = settlement;
        self
    }

    /// Set the subscription mode.
    #[must_use]
    pub const fn mode(mut self, mode: SubscriptionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the size bands requested for every instrument in the batch.
    #[must_use]
    pub fn size_bands(mut self, bands: Vec<Decimal>) -> Self {
        self.size_bands = bands;
        self
    }

    /// Set the counterparty-assigned dedup index for unsubscription.
    #[must_use]
    pub const fn dedup_index(mut self, index: Option<u64>) -> Self {
        self.dedup_index = index;
        self
    }

    /// Build the request for one instrument.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptySizeBands`] when no bands are set, and
    /// [`BuildError::MissingDedupIndex`] when the mode is unsubscribe but
    /// no dedup index was supplied.
    pub fn build(&self, instrument: &Instrument) -> Result<SubscriptionRequest, BuildError> {
        if self.size_bands.is_empty() {
            return Err(BuildError::EmptySizeBands);
        }
        if self.mode.is_unsubscribe() && self.dedup_index.is_none() {
            return Err(BuildError::MissingDedupIndex);
        }

        Ok(SubscriptionRequest {
            request_id: self.request_id.clone(),
            instrument: instrument.clone(),
            size_bands: self.size_bands.clone(),
            settlement: self.settlement,
            mode: self.mode,
            dedup_index: self.dedup_index,
            party_id: self.party_id.clone(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use test_case::test_case;

    use super::*;

    fn bands(values: &[&str]) -> Vec<Decimal> {
        values
            .iter()
            .map(|v| Decimal::from_str(v).unwrap())
            .collect()
    }

    fn instrument(code: &str) -> Instrument {
        Instrument::new(code).unwrap()
    }

    #[test_case("spot", SettlementType::Spot ; "spot by name")]
    #[test_case("SPOT", SettlementType::Spot ; "spot uppercase")]
    #[test_case("0", SettlementType::Spot ; "spot wire code")]
    #[test_case("today", SettlementType::Today ; "today by name")]
    #[test_case("1", SettlementType::Today ; "today wire code")]
    fn settlement_parses(input: &str, expected: SettlementType) {
        assert_eq!(input.parse::<SettlementType>().unwrap(), expected);
    }

    #[test]
    fn settlement_rejects_unknown() {
        assert!("t+2".parse::<SettlementType>().is_err());
    }

    #[test_case("snapshot", SubscriptionMode::Snapshot ; "snapshot by name")]
    #[test_case("0", SubscriptionMode::Snapshot ; "snapshot wire code")]
    #[test_case("updates", SubscriptionMode::SnapshotUpdates ; "updates by name")]
    #[test_case("1", SubscriptionMode::SnapshotUpdates ; "updates wire code")]
    #[test_case("unsubscribe", SubscriptionMode::Unsubscribe ; "unsubscribe by name")]
    #[test_case("2", SubscriptionMode::Unsubscribe ; "unsubscribe wire code")]
    fn mode_parses(input: &str, expected: SubscriptionMode) {
        assert_eq!(input.parse::<SubscriptionMode>().unwrap(), expected);
    }

    #[test]
    fn mode_rejects_unknown() {
        assert!("stream".parse::<SubscriptionMode>().is_err());
    }

    #[test]
    fn one_entry_per_band_in_input_order() {
        let request = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
            .size_bands(bands(&["3000000", "5000000", "10000000"]))
            .build(&instrument("AUD.CAD"))
            .unwrap();

        let entries: Vec<_> = request.entries().collect();
        assert_eq!(entries.len(), 3);
        for (entry_instrument, _) in &entries {
            assert_eq!(entry_instrument.as_str(), "AUD.CAD");
        }
        assert_eq!(entries[0].1, Decimal::from_str("3000000").unwrap());
        assert_eq!(entries[1].1, Decimal::from_str("5000000").unwrap());
        assert_eq!(entries[2].1, Decimal::from_str("10000000").unwrap());
    }

    #[test]
    fn identical_inputs_build_identical_requests() {
        let builder = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
            .settlement(SettlementType::Today)
            .mode(SubscriptionMode::SnapshotUpdates)
            .size_bands(bands(&["200000"]));

        let first = builder.build(&instrument("EUR.USD")).unwrap();
        let second = builder.build(&instrument("EUR.USD")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_bands_rejected() {
        let result =
            SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE").build(&instrument("EUR.USD"));
        assert_eq!(result, Err(BuildError::EmptySizeBands));
    }

    #[test]
    fn unsubscribe_without_dedup_index_rejected() {
        let result = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
            .size_bands(bands(&["200000"]))
            .mode(SubscriptionMode::Unsubscribe)
            .build(&instrument("EUR.USD"));
        assert_eq!(result, Err(BuildError::MissingDedupIndex));
    }

    #[test]
    fn unsubscribe_carries_dedup_index() {
        let request = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
            .size_bands(bands(&["200000"]))
            .mode(SubscriptionMode::Unsubscribe)
            .dedup_index(Some(476))
            .build(&instrument("AUD.JPY"))
            .unwrap();
        assert_eq!(request.dedup_index, Some(476));
    }

    #[test]
    fn dedup_index_passes_through_for_subscriptions() {
        // No local validation is possible for the index itself; it is
        // carried verbatim when supplied.
        let request = SubscriptionRequestBuilder::new("MDRQ-1", "PDP_PRICE")
            .size_bands(bands(&["200000"]))
            .dedup_index(Some(42))
            .build(&instrument("EUR.USD"))
            .unwrap();
        assert_eq!(request.dedup_index, Some(42));
    }
}
