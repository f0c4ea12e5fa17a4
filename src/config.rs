//! Scenario configuration: JSON file plus environment overrides.
//!
//! The scenario file decides fleet size, message count, and signing
//! parameters; `V2X_*` environment variables override individual values so
//! sweep scripts can vary one knob without rewriting the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::signing::{SignatureScheme, SignerOptions};

/// Production port the transmitter sends fragments to.
pub const TX_PORT: u16 = 52_001;

/// Production port the receiver binds.
pub const RX_PORT: u16 = 4_444;

/// Port used when both sides run with `--test`, overridable via
/// `V2X_TEST_PORT`.
pub const DEFAULT_TEST_PORT: u16 = 6_666;

/// Errors raised while loading the scenario file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file was not valid JSON of the expected shape.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    scenario: ScenarioSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioSection {
    num_vehicles: u8,
    num_messages: u16,
    #[serde(default)]
    signature_scheme: Option<String>,
    #[serde(default)]
    falcon: FalconSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FalconSection {
    #[serde(default)]
    fragment_bytes: Option<usize>,
    #[serde(default)]
    compression: Option<String>,
}

/// Environment values that beat file values.
#[derive(Clone, Debug, Default)]
pub struct EnvOverrides {
    pub scheme: Option<String>,
    pub falcon_fragment_bytes: Option<usize>,
    pub compression: Option<String>,
    pub drop_probability: Option<f64>,
}

impl EnvOverrides {
    /// Capture the `V2X_*` override variables from the process environment.
    ///
    /// Values that fail to parse are treated as absent.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            scheme: std::env::var("V2X_SIGNATURE_SCHEME").ok(),
            falcon_fragment_bytes: std::env::var("V2X_FALCON_FRAGMENT_BYTES")
                .ok()
                .and_then(|value| value.parse().ok()),
            compression: std::env::var("V2X_FALCON_COMPRESSION").ok(),
            drop_probability: std::env::var("V2X_PACKET_LOSS_RATE")
                .ok()
                .and_then(|value| value.parse().ok()),
        }
    }
}

/// Effective settings for one simulation run.
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub num_vehicles: u8,
    pub num_messages: u16,
    pub scheme: SignatureScheme,
    /// Preferred Falcon chunk size in bytes; `0` means the full fragment
    /// capacity.
    pub falcon_fragment_bytes: usize,
    /// Opaque compression tag; the core transports raw bytes regardless.
    pub compression: String,
    /// Simulated per-fragment drop probability in `[0, 1]`.
    pub drop_probability: f64,
}

impl ScenarioConfig {
    /// Load the scenario from `path`, applying `env` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable or malformed.
    pub fn load(path: &Path, env: &EnvOverrides) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents, env).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a scenario document, applying `env` overrides.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] for malformed input.
    pub fn from_json(json: &str, env: &EnvOverrides) -> Result<Self, serde_json::Error> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let scenario = file.scenario;

        let scheme_label = env
            .scheme
            .clone()
            .or(scenario.signature_scheme)
            .unwrap_or_else(|| "ecdsa".to_owned());
        let falcon_fragment_bytes = env
            .falcon_fragment_bytes
            .or(scenario.falcon.fragment_bytes)
            .unwrap_or(256);
        let compression = env
            .compression
            .clone()
            .or(scenario.falcon.compression)
            .unwrap_or_else(|| "none".to_owned());
        let drop_probability = env.drop_probability.unwrap_or(0.0).clamp(0.0, 1.0);

        Ok(Self {
            num_vehicles: scenario.num_vehicles,
            num_messages: scenario.num_messages,
            scheme: SignatureScheme::parse(&scheme_label),
            falcon_fragment_bytes,
            compression,
            drop_probability,
        })
    }

    /// The signer options this scenario implies.
    #[must_use]
    pub fn signer_options(&self) -> SignerOptions {
        SignerOptions {
            scheme: self.scheme,
            falcon_chunk_size: self.falcon_fragment_bytes,
            compression: self.compression.clone(),
        }
    }
}

/// The `--test` port, from `V2X_TEST_PORT` when set to a valid port number.
#[must_use]
pub fn test_port() -> u16 {
    std::env::var("V2X_TEST_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|port| *port > 0)
        .unwrap_or(DEFAULT_TEST_PORT)
}
