//! IEEE 1609.2-style payload carried by every fragment of a message.
//!
//! The layering follows the secured-message structure of the original
//! standard in miniature: a to-be-signed body (header info plus BSM), an
//! embedded explicit certificate naming the sender's verification key, and
//! an issuer signature over that certificate. Only the pieces the
//! verification pipeline consumes are modeled; chain validation beyond the
//! single issuer signature is out of scope.

use bincode::{Decode, Encode};

use crate::bsm::Bsm;
use crate::fragment::{CertificateSignature, VehicleId};
use crate::time::Timestamp;

/// Provider service identifier claimed by the WSMP header.
pub const BSM_PSID: u32 = 32;

/// Metadata bound into the signature alongside the BSM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Encode, Decode)]
pub struct HeaderInfo {
    pub psid: u32,
    /// Generation time; the freshness check compares this against the
    /// reassembly completion time.
    pub timestamp: Timestamp,
}

/// The exact bytes protected by the message signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Encode, Decode)]
pub struct ToBeSignedData {
    pub header_info: HeaderInfo,
    pub message: Bsm,
}

/// Minimal explicit certificate: who the sender claims to be and the
/// compressed P-256 point their messages verify against.
#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct ExplicitCertificate {
    pub subject: VehicleId,
    pub expiry: Timestamp,
    pub verification_key: [u8; 33],
}

impl Default for ExplicitCertificate {
    fn default() -> Self {
        Self {
            subject: VehicleId::default(),
            expiry: Timestamp::default(),
            verification_key: [0; 33],
        }
    }
}

/// Signed payload replicated onto every fragment of a message.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct SignedData {
    pub tbs: ToBeSignedData,
    pub certificate: ExplicitCertificate,
    /// Issuer signature over the encoded certificate.
    pub certificate_signature: CertificateSignature,
}

#[cfg(test)]
mod tests {
    use super::{ExplicitCertificate, SignedData};
    use crate::message::Message;
    use crate::time::Timestamp;

    #[test]
    fn certificate_encoding_is_stable_for_digesting() {
        let certificate = ExplicitCertificate {
            subject: crate::fragment::VehicleId::new(5),
            expiry: Timestamp::from_micros(1_700_000_000_000_000),
            verification_key: [7; 33],
        };
        let first = certificate.to_bytes().expect("encode certificate");
        let second = certificate.to_bytes().expect("encode certificate");
        assert_eq!(first, second);
    }

    #[test]
    fn signed_data_round_trips() {
        let data = SignedData::default();
        let bytes = data.to_bytes().expect("encode signed data");
        let (decoded, _) = SignedData::from_bytes(&bytes).expect("decode signed data");
        assert_eq!(decoded, data);
    }
}
