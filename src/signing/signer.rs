//! Per-vehicle signing state and fragment production.

use std::time::Duration;

use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pqcrypto_falcon::falcon512;
use pqcrypto_traits::sign::DetachedSignature as _;
use sha2::{Digest, Sha256};

use super::error::SigningError;
use super::scheme::SignatureScheme;
use crate::bsm::Bsm;
use crate::fragment::{
    CertificateSignature, LinkLayerHeaders, MAX_SIGNATURE_FRAGMENT_SIZE, MAX_SIGNATURE_TOTAL_SIZE,
    SequenceNumber, SignatureChunk, SpduFragment, VehicleId,
};
use crate::keys::{KeyError, KeyStore};
use crate::message::Message;
use crate::spdu::{BSM_PSID, ExplicitCertificate, HeaderInfo, SignedData, ToBeSignedData};
use crate::time::Timestamp;

/// Lifetime stamped into generated certificates. Nothing in the pipeline
/// checks it yet; it exists so the certificate digest covers a realistic
/// validity field.
const CERTIFICATE_VALIDITY: Duration = Duration::from_secs(7 * 24 * 3600);

/// Scheme selection and post-quantum chunking parameters.
#[derive(Clone, Debug)]
pub struct SignerOptions {
    pub scheme: SignatureScheme,
    /// Preferred Falcon chunk size in bytes; `0` means use the full
    /// fragment capacity. Values above capacity are clamped down.
    pub falcon_chunk_size: usize,
    /// Opaque compression tag passed through from configuration. The core
    /// transports raw bytes; any compression is an external transform that
    /// must be reversed before verification.
    pub compression: String,
}

impl Default for SignerOptions {
    fn default() -> Self {
        Self {
            scheme: SignatureScheme::Ecdsa,
            falcon_chunk_size: 256,
            compression: "none".to_owned(),
        }
    }
}

/// Clamp a requested chunk size to `[1, capacity]`, treating `0` as "use
/// the full capacity".
#[must_use]
pub fn clamp_chunk_size(requested: usize, capacity: usize) -> usize {
    if requested == 0 {
        capacity
    } else {
        requested.min(capacity)
    }
}

/// Signing identity of one vehicle: EC keys, the generated certificate, and
/// the Falcon key when the post-quantum scheme is selected.
#[derive(Clone)]
pub struct Signer {
    vehicle: VehicleId,
    signing_key: SigningKey,
    certificate_key: SigningKey,
    certificate: ExplicitCertificate,
    falcon_key: Option<falcon512::SecretKey>,
    options: SignerOptions,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("vehicle", &self.vehicle)
            .field("scheme", &self.options.scheme)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Load the signing identity for `vehicle` from `keys`.
    ///
    /// The Falcon private key is only loaded when the post-quantum scheme is
    /// selected; classical runs never touch the Falcon store.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when any required key is missing or malformed.
    pub fn load(
        vehicle: VehicleId,
        keys: &KeyStore,
        options: SignerOptions,
    ) -> Result<Self, KeyError> {
        let signing_key = keys.vehicle_signing_key(vehicle)?;
        let certificate_key = keys.certificate_signing_key(vehicle)?;
        let falcon_key = match options.scheme {
            SignatureScheme::Falcon => Some(keys.falcon_secret_key(vehicle)?),
            SignatureScheme::Ecdsa => None,
        };
        let certificate = Self::certificate_for(vehicle, &VerifyingKey::from(&signing_key));
        Ok(Self {
            vehicle,
            signing_key,
            certificate_key,
            certificate,
            falcon_key,
            options,
        })
    }

    /// The vehicle this signer speaks for.
    #[must_use]
    pub const fn vehicle(&self) -> VehicleId { self.vehicle }

    /// The configured options.
    #[must_use]
    pub const fn options(&self) -> &SignerOptions { &self.options }

    /// Sign one message and return its transmission-ready fragment set.
    ///
    /// The classical path always yields exactly one fragment; the
    /// post-quantum path yields `ceil(signature_len / chunk_size)` fragments
    /// in index order, each carrying the same payload.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] when key material is missing for the
    /// selected scheme or the produced signature violates a capacity bound.
    pub fn prepare_fragments(
        &self,
        sequence: SequenceNumber,
        bsm: Bsm,
        now: Timestamp,
    ) -> Result<Vec<SpduFragment>, SigningError> {
        let base = self.base_fragment(sequence, bsm, now)?;
        match self.options.scheme {
            SignatureScheme::Ecdsa => Ok(vec![self.sign_ecdsa(base)?]),
            SignatureScheme::Falcon => self.sign_falcon(&base),
        }
    }

    /// Build the unsigned fragment template: BSM, header info, certificate,
    /// and the issuer signature over the certificate.
    fn base_fragment(
        &self,
        sequence: SequenceNumber,
        bsm: Bsm,
        now: Timestamp,
    ) -> Result<SpduFragment, SigningError> {
        let tbs = ToBeSignedData {
            header_info: HeaderInfo {
                psid: BSM_PSID,
                timestamp: now,
            },
            message: bsm,
        };

        let certificate_digest = Sha256::digest(self.certificate.to_bytes()?);
        let issuer_signature: Signature = self.certificate_key.sign_prehash(&certificate_digest)?;
        let certificate_signature =
            CertificateSignature::copy_from(issuer_signature.to_der().as_bytes());

        Ok(SpduFragment {
            sender: self.vehicle,
            sequence,
            link: LinkLayerHeaders::default(),
            scheme: self.options.scheme,
            fragment_index: 0,
            fragment_count: 1,
            signature_total_len: 0,
            chunk_offset: 0,
            data: SignedData {
                tbs,
                certificate: self.certificate,
                certificate_signature,
            },
            signature_chunk: SignatureChunk::empty(),
        })
    }

    fn sign_ecdsa(&self, mut fragment: SpduFragment) -> Result<SpduFragment, SigningError> {
        let digest = Sha256::digest(fragment.data.tbs.to_bytes()?);
        let signature: Signature = self.signing_key.sign_prehash(&digest)?;
        let der = signature.to_der();
        let bytes = der.as_bytes();
        if bytes.len() > MAX_SIGNATURE_FRAGMENT_SIZE {
            return Err(SigningError::SignatureTooLarge {
                scheme: SignatureScheme::Ecdsa,
                actual: bytes.len(),
                capacity: MAX_SIGNATURE_FRAGMENT_SIZE,
            });
        }

        fragment.fragment_index = 0;
        fragment.fragment_count = 1;
        fragment.chunk_offset = 0;
        fragment.signature_total_len = bytes.len() as u32;
        fragment.signature_chunk = SignatureChunk::copy_from(bytes);
        Ok(fragment)
    }

    fn sign_falcon(&self, base: &SpduFragment) -> Result<Vec<SpduFragment>, SigningError> {
        let key = self
            .falcon_key
            .as_ref()
            .ok_or(SigningError::MissingFalconKey(self.vehicle))?;

        // Falcon signs the raw to-be-signed bytes; there is no pre-hash.
        let message = base.data.tbs.to_bytes()?;
        let signature = falcon512::detached_sign(&message, key);
        let bytes = signature.as_bytes();
        if bytes.len() > MAX_SIGNATURE_TOTAL_SIZE {
            return Err(SigningError::SignatureTooLarge {
                scheme: SignatureScheme::Falcon,
                actual: bytes.len(),
                capacity: MAX_SIGNATURE_TOTAL_SIZE,
            });
        }

        let chunk_size = clamp_chunk_size(self.options.falcon_chunk_size, MAX_SIGNATURE_FRAGMENT_SIZE);
        let fragment_count = bytes.len().div_ceil(chunk_size);

        let mut fragments = Vec::with_capacity(fragment_count);
        for (index, chunk) in bytes.chunks(chunk_size).enumerate() {
            let mut fragment = base.clone();
            #[expect(
                clippy::cast_possible_truncation,
                reason = "fragment count and offsets are bounded by the 1536-byte signature cap"
            )]
            {
                fragment.fragment_index = index as u16;
                fragment.fragment_count = fragment_count as u16;
                fragment.chunk_offset = (index * chunk_size) as u32;
                fragment.signature_total_len = bytes.len() as u32;
            }
            fragment.signature_chunk = SignatureChunk::copy_from(chunk);
            fragments.push(fragment);
        }

        Ok(fragments)
    }

    fn certificate_for(vehicle: VehicleId, verifying_key: &VerifyingKey) -> ExplicitCertificate {
        let point = verifying_key.as_affine().to_encoded_point(true);
        let mut verification_key = [0u8; 33];
        verification_key.copy_from_slice(point.as_bytes());
        ExplicitCertificate {
            subject: vehicle,
            expiry: Timestamp::now().saturating_add(CERTIFICATE_VALIDITY),
            verification_key,
        }
    }
}
