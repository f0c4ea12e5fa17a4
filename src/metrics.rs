//! Metric helpers for the simulator.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Helpers compile to no-ops
//! when the `metrics` feature is disabled so call sites stay unconditional.

/// Name of the counter tracking fragments handed to the transport.
pub const FRAGMENTS_SENT: &str = "pqv2v_fragments_sent_total";
/// Name of the counter tracking fragments accepted from the transport.
pub const FRAGMENTS_RECEIVED: &str = "pqv2v_fragments_received_total";
/// Name of the counter tracking completed reassemblies.
pub const MESSAGES_COMPLETED: &str = "pqv2v_messages_completed_total";
/// Name of the counter tracking messages rejected by verification.
pub const MESSAGES_REJECTED: &str = "pqv2v_messages_rejected_total";

/// Record a fragment handed to the transport.
pub fn inc_fragments_sent() {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(FRAGMENTS_SENT).increment(1);
}

/// Record a fragment accepted from the transport.
pub fn inc_fragments_received() {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(FRAGMENTS_RECEIVED).increment(1);
}

/// Record a completed reassembly.
pub fn inc_messages_completed() {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(MESSAGES_COMPLETED).increment(1);
}

/// Record a message that failed verification.
pub fn inc_messages_rejected() {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(MESSAGES_REJECTED).increment(1);
}
