//! Outbound signing: scheme selection and fragment production.
//!
//! The chunking policy lives here rather than in the wire layer so the
//! classical and post-quantum paths can share one fragment type while
//! differing only in fragment count and chunk sizing. That choice is what
//! keeps the reassembly engine scheme-agnostic.

pub mod error;
pub mod scheme;
pub mod signer;

pub use error::SigningError;
pub use scheme::SignatureScheme;
pub use signer::{Signer, SignerOptions, clamp_chunk_size};
