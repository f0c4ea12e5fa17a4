//! Simulated vehicle-to-vehicle safety messaging with oversized signatures.
//!
//! This crate models the hard part of post-quantum V2V messaging: a
//! lattice-based signature is several times larger than a network frame, so
//! it must be fragmented, carried over an unreliable datagram channel,
//! reassembled out of order among concurrent senders, and verified
//! end-to-end with a freshness guarantee. The classical ECDSA path rides the
//! same fragment format with a count of one, which keeps the receive side
//! scheme-agnostic.

pub mod bsm;
pub mod config;
pub mod error;
pub mod fragment;
pub mod gui;
pub mod keys;
pub mod message;
pub mod metrics;
pub mod reassembly;
pub mod receive;
pub mod report;
pub mod signing;
pub mod spdu;
pub mod time;
pub mod trace;
pub mod transmit;
pub mod vehicle;
pub mod verify;

pub use bsm::Bsm;
pub use error::{Result, SimError};
pub use fragment::{
    FlowKey, MAX_DATAGRAM_SIZE, MAX_SIGNATURE_FRAGMENT_SIZE, MAX_SIGNATURE_TOTAL_SIZE,
    SequenceNumber, SignatureChunk, SpduFragment, VehicleId,
};
pub use keys::KeyStore;
pub use message::Message;
pub use reassembly::{ReassembledSpdu, ReassemblyEngine};
pub use receive::{Receiver, RunSummary};
pub use signing::{SignatureScheme, Signer, SignerOptions};
pub use time::Timestamp;
pub use transmit::{LossModel, Transmitter, TxStats};
pub use vehicle::Vehicle;
pub use verify::{FRESHNESS_WINDOW, Verdict, Verifier};
