//! Wire-level fragment primitives for oversized-signature transport.
//!
//! A post-quantum signature does not fit in one datagram, so each signed
//! message travels as one or more fragments sharing a flow key. This module
//! collects the domain types for that wire layer: bounded byte buffers with
//! an enforced valid length, typed identifiers, and the fragment record
//! itself together with its datagram codec.

pub mod chunk;
pub mod flow;
pub mod wire;

pub use chunk::{
    BoundedBytes, CertificateSignature, MAX_CERTIFICATE_SIGNATURE_SIZE,
    MAX_SIGNATURE_FRAGMENT_SIZE, SignatureChunk,
};
pub use flow::{FlowKey, SequenceNumber, VehicleId};
pub use wire::{
    LinkLayerHeaders, MAX_DATAGRAM_SIZE, MAX_SIGNATURE_TOTAL_SIZE, SpduFragment, decode_datagram,
    encode_datagram,
};
