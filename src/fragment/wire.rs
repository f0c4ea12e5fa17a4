//! The fragment record and its datagram codec.
//!
//! One fragment is exactly one datagram. Every fragment of a message carries
//! the full application payload and certificate material; only the signature
//! chunk and its position differ between fragments of the same flow. That
//! redundancy keeps the receive side scheme-agnostic: a single-fragment
//! classical message and a six-fragment post-quantum one take the same path
//! through the reassembly engine.

use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};

use super::chunk::SignatureChunk;
use super::flow::{FlowKey, SequenceNumber, VehicleId};
use crate::message::Message;
use crate::signing::SignatureScheme;
use crate::spdu::SignedData;

/// Upper bound on an assembled signature across all fragments of a message.
pub const MAX_SIGNATURE_TOTAL_SIZE: usize = 1536;

/// Receive buffer size; comfortably above the largest encoded fragment.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// 802.2 LLC and WSMP header fields carried verbatim on every fragment.
///
/// These mirror the DSRC stack framing of the simulated radio and never vary
/// between messages; the receive path transports them untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct LinkLayerHeaders {
    pub llc_dsap_ssap: u32,
    pub llc_control: u8,
    pub llc_type: u32,
    pub wsmp_n_subtype_opt_version: u8,
    pub wsmp_n_tpid: u8,
    pub wsmp_t_header_length_and_psid: u8,
    pub wsmp_t_length: u8,
}

impl Default for LinkLayerHeaders {
    fn default() -> Self {
        Self {
            llc_dsap_ssap: 43690,
            llc_control: 3,
            llc_type: 35036,
            wsmp_n_subtype_opt_version: 3,
            wsmp_n_tpid: 0,
            wsmp_t_header_length_and_psid: 32,
            wsmp_t_length: 0,
        }
    }
}

/// One datagram's worth of a signed protocol data unit.
///
/// Invariants maintained by the producing side:
/// - `fragment_index < fragment_count`;
/// - `chunk_offset + signature_chunk.len() <= signature_total_len`;
/// - all fragments of a flow agree on `data`, `scheme`, `fragment_count`,
///   and `signature_total_len`;
/// - a classical-scheme message always has `fragment_count == 1`.
///
/// The receive side treats violations as protocol anomalies and drops the
/// offending chunk rather than failing the flow.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct SpduFragment {
    pub sender: VehicleId,
    pub sequence: SequenceNumber,
    pub link: LinkLayerHeaders,
    pub scheme: SignatureScheme,
    /// 0-based position of this fragment within the message.
    pub fragment_index: u16,
    /// Total fragments carrying this message's signature.
    pub fragment_count: u16,
    /// True byte length of the complete signature (not padded to a chunk
    /// multiple).
    pub signature_total_len: u32,
    /// Byte offset of this fragment's chunk within the assembled signature.
    pub chunk_offset: u32,
    /// The to-be-signed payload plus embedded certificate material,
    /// identical on every fragment of the message.
    pub data: SignedData,
    pub signature_chunk: SignatureChunk,
}

impl SpduFragment {
    /// The flow this fragment belongs to.
    #[must_use]
    pub const fn flow_key(&self) -> FlowKey { FlowKey::new(self.sender, self.sequence) }
}

/// Encode a fragment into datagram bytes.
///
/// # Errors
///
/// Returns an [`EncodeError`] if serialization fails.
pub fn encode_datagram(fragment: &SpduFragment) -> Result<Vec<u8>, EncodeError> {
    fragment.to_bytes()
}

/// Decode a datagram back into a fragment.
///
/// Trailing bytes beyond the encoded record are ignored, matching datagram
/// semantics where the payload length is authoritative.
///
/// # Errors
///
/// Returns a [`DecodeError`] for truncated or malformed datagrams.
pub fn decode_datagram(bytes: &[u8]) -> Result<SpduFragment, DecodeError> {
    SpduFragment::from_bytes(bytes).map(|(fragment, _)| fragment)
}
