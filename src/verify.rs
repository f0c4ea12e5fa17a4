//! The verification pipeline for reassembled messages.
//!
//! Three independent checks run on every completed message: the issuer
//! signature over the embedded certificate, the message signature under the
//! scheme the template claims, and the freshness of the embedded generation
//! timestamp. All three are evaluated unconditionally; a message failing
//! the certificate check still reports whether its signature and timestamp
//! held up, which the tests rely on.
//!
//! Key lookups are the only side effect. Bad signatures are an expected
//! outcome (`Verdict` with a false flag); missing or malformed key material
//! is a fatal error propagated to the run driver.

use std::collections::HashMap;
use std::time::Duration;

use p256::ecdsa::Signature;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use pqcrypto_falcon::falcon512;
use pqcrypto_traits::sign::DetachedSignature as _;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::fragment::{SpduFragment, VehicleId};
use crate::keys::{KeyError, KeyStore};
use crate::message::Message;
use crate::signing::SignatureScheme;
use crate::time::Timestamp;

/// Maximum allowed age of a message's embedded timestamp at verification
/// time.
pub const FRESHNESS_WINDOW: Duration = Duration::from_millis(30_000);

/// Errors that abort verification entirely (as opposed to failing it).
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Key material for the claimed sender could not be loaded.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// Serialising payload bytes for digesting failed.
    #[error("failed to encode payload for verification: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

/// Outcome of the three verification checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub certificate_ok: bool,
    pub signature_ok: bool,
    pub fresh: bool,
}

impl Verdict {
    /// A message is accepted only when every check passed.
    #[must_use]
    pub const fn accepted(&self) -> bool { self.certificate_ok && self.signature_ok && self.fresh }
}

/// Verifier with its own post-quantum public-key cache.
///
/// The cache is owned by the instance rather than held as process-wide
/// state so harnesses can reset it between cases.
pub struct Verifier {
    keys: KeyStore,
    falcon_keys: HashMap<VehicleId, falcon512::PublicKey>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("keys", &self.keys)
            .field("cached_falcon_keys", &self.falcon_keys.len())
            .finish()
    }
}

impl Verifier {
    /// Create a verifier looking up key material in `keys`.
    #[must_use]
    pub fn new(keys: KeyStore) -> Self {
        Self {
            keys,
            falcon_keys: HashMap::new(),
        }
    }

    /// Run the full pipeline on a reconstructed message.
    ///
    /// `completed_at` is the wall-clock time reassembly finished; the
    /// freshness check measures the embedded generation timestamp against
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError`] when key material for the claimed sender is
    /// absent or malformed. Signature mismatches are not errors; they
    /// surface as a false flag in the returned [`Verdict`].
    pub fn verify(
        &mut self,
        spdu: &SpduFragment,
        signature: &[u8],
        completed_at: Timestamp,
    ) -> Result<Verdict, VerifyError> {
        let certificate_ok = self.check_certificate(spdu)?;
        let signature_ok = self.check_signature(spdu, signature)?;
        let elapsed = completed_at.saturating_since(spdu.data.tbs.header_info.timestamp);
        let fresh = elapsed < FRESHNESS_WINDOW;

        Ok(Verdict {
            certificate_ok,
            signature_ok,
            fresh,
        })
    }

    /// Number of Falcon public keys currently cached.
    #[must_use]
    pub fn cached_falcon_keys(&self) -> usize { self.falcon_keys.len() }

    /// Drop all cached Falcon public keys, forcing reloads on next use.
    pub fn reset_falcon_cache(&mut self) { self.falcon_keys.clear(); }

    fn check_certificate(&self, spdu: &SpduFragment) -> Result<bool, VerifyError> {
        let digest = Sha256::digest(spdu.data.certificate.to_bytes()?);
        let key = self.keys.certificate_verifying_key(spdu.sender)?;
        let valid = Signature::from_der(spdu.data.certificate_signature.as_slice())
            .is_ok_and(|signature| key.verify_prehash(&digest, &signature).is_ok());
        Ok(valid)
    }

    fn check_signature(&mut self, spdu: &SpduFragment, signature: &[u8]) -> Result<bool, VerifyError> {
        match spdu.scheme {
            SignatureScheme::Ecdsa => {
                let digest = Sha256::digest(spdu.data.tbs.to_bytes()?);
                let key = self.keys.vehicle_verifying_key(spdu.sender)?;
                Ok(Signature::from_der(signature)
                    .is_ok_and(|signature| key.verify_prehash(&digest, &signature).is_ok()))
            }
            SignatureScheme::Falcon => {
                let message = spdu.data.tbs.to_bytes()?;
                let key = self.falcon_public_key(spdu.sender)?;
                Ok(falcon512::DetachedSignature::from_bytes(signature).is_ok_and(|signature| {
                    falcon512::verify_detached_signature(&signature, &message, key).is_ok()
                }))
            }
        }
    }

    fn falcon_public_key(&mut self, vehicle: VehicleId) -> Result<&falcon512::PublicKey, KeyError> {
        if !self.falcon_keys.contains_key(&vehicle) {
            let key = self.keys.falcon_public_key(vehicle)?;
            self.falcon_keys.insert(vehicle, key);
        }
        Ok(&self.falcon_keys[&vehicle])
    }
}
