//! Initiator Configuration
//!
//! TOML-backed settings for the session identity, counterparty endpoint,
//! credentials, subscription defaults, and the instrument universe. With
//! no `--config` argument the embedded default below is used, so the
//! binary always has a resolvable configuration unless an explicit path
//! cannot be read - that case is a startup error, not something to limp
//! past.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::application::ports::SessionId;
use crate::domain::instrument::Instrument;
use crate::domain::subscription::{SettlementType, SubscriptionMode};

/// Default configuration compiled into the binary.
pub const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Environment variable overriding the configured username.
pub const ENV_USERNAME: &str = "FX_FEED_USERNAME";

/// Environment variable overriding the configured password.
pub const ENV_PASSWORD: &str = "FX_FEED_PASSWORD";

// =============================================================================
// Errors
// =============================================================================

/// Configuration resolution failures. All of these are fatal to startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Unreadable {
        /// The path that was supplied.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration content is not valid TOML for these settings.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field was empty.
    #[error("configuration field {field} cannot be empty")]
    EmptyField {
        /// Dotted path of the offending field.
        field: &'static str,
    },

    /// A field value is out of range.
    #[error("configuration field {field} is invalid: {reason}")]
    InvalidField {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

// =============================================================================
// Settings
// =============================================================================

/// FIX session identity and counterparty endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// FIX begin string.
    #[serde(default = "default_begin_string")]
    pub begin_string: String,
    /// Our comp id.
    pub sender_comp_id: String,
    /// The counterparty's comp id.
    pub target_comp_id: String,
    /// Counterparty host.
    pub host: String,
    /// Counterparty port.
    pub port: u16,
    /// Heartbeat interval in seconds.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_interval_secs: u64,
}

fn default_begin_string() -> String {
    "FIXT.1.1".to_string()
}

const fn default_heartbeat_secs() -> u64 {
    30
}

impl SessionSettings {
    /// The session id this configuration describes.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        SessionId::new(&self.begin_string, &self.sender_comp_id, &self.target_comp_id)
    }

    /// Heartbeat interval as a [`Duration`].
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

/// Logon credential material.
#[derive(Clone, Default, Deserialize)]
pub struct CredentialSettings {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

impl CredentialSettings {
    /// The logon username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The logon password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Replace credential fields with the supplied values, when present.
    pub fn apply_overrides(&mut self, username: Option<String>, password: Option<String>) {
        if let Some(username) = username {
            self.username = username;
        }
        if let Some(password) = password {
            self.password = password;
        }
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Batch-wide subscription defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionSettings {
    /// Party identifier naming the price stream.
    pub party_id: String,
    /// Client-assigned request identifier reused across the batch.
    pub request_id: String,
    /// Default settlement type when none is given on the command line.
    #[serde(default)]
    pub settl_type: SettlementType,
    /// Default subscription mode when none is given on the command line.
    #[serde(default)]
    pub mode: SubscriptionMode,
    /// Default size bands when none are given on the command line.
    pub size_bands: Vec<Decimal>,
}

/// The instrument universe swept by a full dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct UniverseSettings {
    /// Ordered instrument list.
    pub instruments: Vec<Instrument>,
}

/// Complete initiator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatorConfig {
    /// Session identity and endpoint.
    pub session: SessionSettings,
    /// Logon credentials.
    #[serde(default)]
    pub credentials: CredentialSettings,
    /// Subscription defaults.
    pub subscription: SubscriptionSettings,
    /// Instrument universe.
    pub universe: UniverseSettings,
}

impl InitiatorConfig {
    /// Resolve configuration from an optional file path.
    ///
    /// No path means the embedded default; a path that cannot be read or
    /// parsed is an error rather than a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the source cannot be read, parsed, or
    /// validated.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::embedded_default()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse the embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the compiled-in TOML is invalid.
    pub fn embedded_default() -> Result<Self, ConfigError> {
        Ok(toml::from_str(DEFAULT_CONFIG)?)
    }

    /// Apply credential overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.credentials
            .apply_overrides(std::env::var(ENV_USERNAME).ok(), std::env::var(ENV_PASSWORD).ok());
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_empty: [(&'static str, &str); 5] = [
            ("session.sender_comp_id", &self.session.sender_comp_id),
            ("session.target_comp_id", &self.session.target_comp_id),
            ("session.host", &self.session.host),
            ("subscription.party_id", &self.subscription.party_id),
            ("subscription.request_id", &self.subscription.request_id),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
        }
        if self.session.port == 0 {
            return Err(ConfigError::InvalidField {
                field: "session.port",
                reason: "must be non-zero",
            });
        }
        if self.subscription.size_bands.is_empty() {
            return Err(ConfigError::EmptyField {
                field: "subscription.size_bands",
            });
        }
        if self.universe.instruments.is_empty() {
            return Err(ConfigError::EmptyField {
                field: "universe.instruments",
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn embedded_default_parses_and_validates() {
        let config = InitiatorConfig::resolve(None).unwrap();
        assert_eq!(config.session.session_id().to_string(), "FIXT.1.1:FXFEED->LP");
        assert_eq!(config.subscription.party_id, "PDP_PRICE");
        assert_eq!(config.subscription.settl_type, SettlementType::Today);
        assert_eq!(config.subscription.mode, SubscriptionMode::SnapshotUpdates);
        assert_eq!(config.subscription.size_bands.len(), 1);
    }

    #[test]
    fn embedded_universe_has_the_reference_pairs() {
        let config = InitiatorConfig::embedded_default().unwrap();
        let universe = &config.universe.instruments;
        assert_eq!(universe.len(), 39);
        assert_eq!(universe[0].as_str(), "AUD.CAD");
        assert_eq!(universe[38].as_str(), "XAU.USD");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = InitiatorConfig::resolve(Some(Path::new("/nonexistent/initiator.toml")));
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn file_config_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[session]
sender_comp_id = "CLIENT"
target_comp_id = "VENUE"
host = "fix.example.com"
port = 19878

[subscription]
party_id = "EFX_PRICE"
request_id = "MDRQ-9"
size_bands = ["3000000", "5000000"]

[universe]
instruments = ["EUR.USD"]
"#,
        )
        .unwrap();

        let config = InitiatorConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(config.session.begin_string, "FIXT.1.1");
        assert_eq!(config.session.port, 19878);
        assert_eq!(config.session.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.subscription.party_id, "EFX_PRICE");
        assert_eq!(config.subscription.size_bands.len(), 2);
        assert_eq!(config.universe.instruments.len(), 1);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really toml [").unwrap();

        let result = InitiatorConfig::resolve(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_universe_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[session]
sender_comp_id = "CLIENT"
target_comp_id = "VENUE"
host = "fix.example.com"
port = 19878

[subscription]
party_id = "EFX_PRICE"
request_id = "MDRQ-9"
size_bands = ["3000000"]

[universe]
instruments = []
"#,
        )
        .unwrap();

        let result = InitiatorConfig::resolve(Some(file.path()));
        assert!(matches!(
            result,
            Err(ConfigError::EmptyField {
                field: "universe.instruments"
            })
        ));
    }

    #[test]
    fn credential_overrides_replace_only_supplied_values() {
        let mut credentials = CredentialSettings::default();
        credentials.apply_overrides(Some("trader".to_string()), None);
        assert_eq!(credentials.username(), "trader");
        assert_eq!(credentials.password(), "");

        credentials.apply_overrides(None, Some("hunter2".to_string()));
        assert_eq!(credentials.username(), "trader");
        assert_eq!(credentials.password(), "hunter2");
    }

    #[test]
    fn credentials_redacted_in_debug() {
        let mut credentials = CredentialSettings::default();
        credentials.apply_overrides(Some("trader".to_string()), Some("hunter2".to_string()));
        let debug = format!("{credentials:?}");
        assert!(debug.contains("trader"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
