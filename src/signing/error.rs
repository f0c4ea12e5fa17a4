//! Errors produced while signing and fragmenting outbound messages.

use thiserror::Error;

use super::scheme::SignatureScheme;
use crate::fragment::VehicleId;

/// Errors raised by the signing strategy.
///
/// All variants are setup-time contract violations: the run driver aborts on
/// any of them rather than transmitting a message it could not sign.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The produced signature does not fit the configured capacity.
    #[error("{scheme} signature of {actual} bytes exceeds the {capacity}-byte capacity")]
    SignatureTooLarge {
        scheme: SignatureScheme,
        actual: usize,
        capacity: usize,
    },
    /// The post-quantum scheme was selected without loading its key.
    #[error("no Falcon private key loaded for vehicle {0}")]
    MissingFalconKey(VehicleId),
    /// Serialising the to-be-signed payload failed.
    #[error("failed to encode payload for signing: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The ECDSA primitive rejected the signing request.
    #[error("ECDSA signing failed: {0}")]
    Ecdsa(#[from] p256::ecdsa::Error),
}
