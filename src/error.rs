//! Canonical error and result types for the crate.
//!
//! Every fatal condition (configuration, key material, signing, transport)
//! funnels into [`SimError`] and propagates to the run driver, which logs
//! and exits. Library code never terminates the process itself, so tests
//! can observe failures in-process.

use thiserror::Error;

use crate::config::ConfigError;
use crate::keys::KeyError;
use crate::signing::SigningError;
use crate::trace::TraceError;
use crate::verify::VerifyError;

/// Top-level error for simulator runs.
#[derive(Debug, Error)]
pub enum SimError {
    /// Scenario configuration was unreadable or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Key material was missing, malformed, or the wrong length.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// Trace data was missing, malformed, or exhausted.
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// Outbound signing or fragmentation failed.
    #[error(transparent)]
    Signing(#[from] SigningError),
    /// Verification aborted (not a mere signature mismatch).
    #[error(transparent)]
    Verify(#[from] VerifyError),
    /// Encoding a fragment for transmission failed.
    #[error("failed to encode datagram: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// A transport operation failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    /// A transmit task aborted or panicked.
    #[error("transmit task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Canonical result alias used across the crate.
pub type Result<T> = std::result::Result<T, SimError>;
