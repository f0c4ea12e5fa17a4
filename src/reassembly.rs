//! Receiver-side reassembly of fragmented signed messages.
//!
//! One [`ReassemblyEngine`] owns a table of in-flight flows keyed by
//! [`FlowKey`]. Fragments may arrive in any order, interleaved across any
//! number of concurrent senders; the engine buffers signature chunks per
//! flow until every declared index has arrived, then hands the reconstructed
//! message to the caller and forgets the flow. Malformed and duplicate
//! fragments are dropped without failing the flow; the engine favors
//! availability over strict validation.
//!
//! Incomplete flows are never evicted by the receive loop itself (a flow
//! whose last fragment was lost persists for the life of the loop, matching
//! the recorded behavior of the simulated channel).
//! [`ReassemblyEngine::purge_stale`] exists for embedders that need an
//! eviction sweep.

use std::collections::HashMap;
use std::time::Duration;

use crate::fragment::{FlowKey, SignatureChunk, SpduFragment};
use crate::time::Timestamp;

/// A fully reconstructed message ready for verification.
#[derive(Clone, Debug)]
pub struct ReassembledSpdu {
    /// Shared payload and header fields, taken from the most recently seen
    /// fragment of the flow.
    pub spdu: SpduFragment,
    /// The assembled signature, exactly `signature_total_len` bytes.
    pub signature: Vec<u8>,
    /// Arrival time of the first fragment observed for the flow.
    pub first_fragment_at: Timestamp,
    /// Arrival time of the fragment that completed the flow.
    pub completed_at: Timestamp,
}

#[derive(Debug)]
struct PendingMessage {
    template: SpduFragment,
    signature: Vec<u8>,
    received: Vec<bool>,
    first_fragment_at: Timestamp,
}

impl PendingMessage {
    /// Size the flow's buffers from the first-seen fragment. A corrupted
    /// first fragment therefore poisons the whole flow; hardening against
    /// that is out of scope.
    fn new(fragment: &SpduFragment, now: Timestamp) -> Self {
        let mut template = fragment.clone();
        template.fragment_index = 0;
        template.chunk_offset = 0;
        template.signature_chunk = SignatureChunk::empty();
        Self {
            template,
            signature: vec![0; fragment.signature_total_len as usize],
            received: vec![false; usize::from(fragment.fragment_count)],
            first_fragment_at: now,
        }
    }

    fn absorb(&mut self, fragment: &SpduFragment) {
        let index = usize::from(fragment.fragment_index);
        match self.received.get_mut(index) {
            Some(received) if !*received => {
                let offset = fragment.chunk_offset as usize;
                let chunk = fragment.signature_chunk.as_slice();
                if let Some(target) = self.signature.get_mut(offset..offset + chunk.len()) {
                    target.copy_from_slice(chunk);
                    *received = true;
                } else {
                    tracing::debug!(
                        flow = %fragment.flow_key(),
                        offset,
                        chunk_len = chunk.len(),
                        buffer_len = self.signature.len(),
                        "dropping chunk outside the declared signature range",
                    );
                }
            }
            Some(_) => {} // duplicate index, nothing to do
            None => {
                tracing::debug!(
                    flow = %fragment.flow_key(),
                    index,
                    fragment_count = self.received.len(),
                    "dropping fragment with out-of-bounds index",
                );
            }
        }

        // Fields that the protocol requires to be identical across a flow
        // are refreshed from every arrival, last writer wins.
        self.template.data = fragment.data.clone();
        self.template.scheme = fragment.scheme;
        self.template.fragment_count = fragment.fragment_count;
        self.template.signature_total_len = fragment.signature_total_len;
    }

    fn is_complete(&self) -> bool { self.received.iter().all(|received| *received) }
}

/// Stateful multi-flow reassembler.
///
/// The engine is exclusively owned by the single receive loop and requires
/// no synchronisation.
#[derive(Debug, Default)]
pub struct ReassemblyEngine {
    flows: HashMap<FlowKey, PendingMessage>,
}

impl ReassemblyEngine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Process one arriving fragment.
    ///
    /// Returns `Some` exactly once per flow, on the arrival that completes
    /// it; the flow is removed from the table before returning. All other
    /// arrivals (first fragments, intermediate chunks, duplicates, and
    /// anomalous fragments) return `None`.
    pub fn push(&mut self, fragment: &SpduFragment, now: Timestamp) -> Option<ReassembledSpdu> {
        let key = fragment.flow_key();
        let complete = {
            let pending = self
                .flows
                .entry(key)
                .or_insert_with(|| PendingMessage::new(fragment, now));
            pending.absorb(fragment);
            pending.is_complete()
        };

        if !complete {
            return None;
        }

        let pending = self.flows.remove(&key)?;
        tracing::debug!(flow = %key, fragments = pending.received.len(), "flow complete");
        Some(ReassembledSpdu {
            spdu: pending.template,
            signature: pending.signature,
            first_fragment_at: pending.first_fragment_at,
            completed_at: now,
        })
    }

    /// Number of flows currently accumulating.
    #[must_use]
    pub fn pending_flows(&self) -> usize { self.flows.len() }

    /// Evict flows whose first fragment arrived more than `max_age` before
    /// `now`, returning the evicted keys.
    ///
    /// The receive loop deliberately never calls this; it is provided for
    /// embedders that cannot afford the unbounded table.
    pub fn purge_stale(&mut self, now: Timestamp, max_age: Duration) -> Vec<FlowKey> {
        let mut evicted = Vec::new();
        self.flows.retain(|key, pending| {
            let expired = now.saturating_since(pending.first_fragment_at) >= max_age;
            if expired {
                evicted.push(*key);
            }
            !expired
        });
        evicted
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ReassemblyEngine;
    use crate::fragment::{
        LinkLayerHeaders, SequenceNumber, SignatureChunk, SpduFragment, VehicleId,
    };
    use crate::signing::SignatureScheme;
    use crate::spdu::SignedData;
    use crate::time::Timestamp;

    const CHUNK: usize = 4;

    fn fragment(sender: u8, seq: u32, index: u16, count: u16, signature: &[u8]) -> SpduFragment {
        let offset = usize::from(index) * CHUNK;
        let end = (offset + CHUNK).min(signature.len());
        SpduFragment {
            sender: VehicleId::new(sender),
            sequence: SequenceNumber::new(seq),
            link: LinkLayerHeaders::default(),
            scheme: SignatureScheme::Falcon,
            fragment_index: index,
            fragment_count: count,
            signature_total_len: signature.len() as u32,
            chunk_offset: offset as u32,
            data: SignedData::default(),
            signature_chunk: SignatureChunk::copy_from(&signature[offset..end]),
        }
    }

    fn at(micros: u64) -> Timestamp { Timestamp::from_micros(micros) }

    #[test]
    fn out_of_order_arrival_completes_exactly_once() {
        let signature: Vec<u8> = (0..20).collect();
        let mut engine = ReassemblyEngine::new();

        for (step, index) in [4_u16, 2, 0, 3].into_iter().enumerate() {
            let result = engine.push(&fragment(1, 0, index, 5, &signature), at(step as u64));
            assert!(result.is_none(), "completed early at index {index}");
        }

        let message = engine
            .push(&fragment(1, 0, 1, 5, &signature), at(99))
            .expect("fifth distinct arrival completes the flow");
        assert_eq!(message.signature, signature);
        assert_eq!(message.first_fragment_at, at(0));
        assert_eq!(message.completed_at, at(99));
        assert_eq!(engine.pending_flows(), 0);
    }

    #[test]
    fn duplicate_delivery_is_idempotent() {
        let signature: Vec<u8> = (100..112).collect();
        let mut engine = ReassemblyEngine::new();

        assert!(engine.push(&fragment(1, 0, 0, 3, &signature), at(0)).is_none());
        assert!(engine.push(&fragment(1, 0, 0, 3, &signature), at(1)).is_none());
        assert!(engine.push(&fragment(1, 0, 1, 3, &signature), at(2)).is_none());
        assert_eq!(engine.pending_flows(), 1);

        let message = engine
            .push(&fragment(1, 0, 2, 3, &signature), at(3))
            .expect("three distinct indices complete the flow");
        assert_eq!(message.signature, signature);
    }

    #[test]
    fn interleaved_flows_do_not_cross_contaminate() {
        let sig_a: Vec<u8> = vec![0xAA; 8];
        let sig_b: Vec<u8> = vec![0xBB; 8];
        let mut engine = ReassemblyEngine::new();

        assert!(engine.push(&fragment(1, 0, 0, 2, &sig_a), at(0)).is_none());
        assert!(engine.push(&fragment(2, 0, 0, 2, &sig_b), at(1)).is_none());
        assert_eq!(engine.pending_flows(), 2);

        let b = engine
            .push(&fragment(2, 0, 1, 2, &sig_b), at(2))
            .expect("flow B completes");
        assert_eq!(b.signature, sig_b);
        assert_eq!(engine.pending_flows(), 1);

        let a = engine
            .push(&fragment(1, 0, 1, 2, &sig_a), at(3))
            .expect("flow A completes");
        assert_eq!(a.signature, sig_a);
        assert_eq!(engine.pending_flows(), 0);
    }

    #[test]
    fn same_sender_distinct_sequences_are_distinct_flows() {
        let signature: Vec<u8> = vec![1; 8];
        let mut engine = ReassemblyEngine::new();

        assert!(engine.push(&fragment(1, 0, 0, 2, &signature), at(0)).is_none());
        assert!(engine.push(&fragment(1, 1, 0, 2, &signature), at(1)).is_none());
        assert_eq!(engine.pending_flows(), 2);
    }

    #[test]
    fn out_of_bounds_index_is_ignored() {
        let signature: Vec<u8> = vec![7; 8];
        let mut engine = ReassemblyEngine::new();

        assert!(engine.push(&fragment(1, 0, 0, 2, &signature), at(0)).is_none());
        // Declared count is 2; index 5 must not be recorded.
        let mut rogue = fragment(1, 0, 1, 2, &signature);
        rogue.fragment_index = 5;
        rogue.chunk_offset = 0;
        assert!(engine.push(&rogue, at(1)).is_none());
        assert_eq!(engine.pending_flows(), 1);
    }

    #[test]
    fn chunk_past_declared_signature_length_is_dropped() {
        let signature: Vec<u8> = vec![3; 8];
        let mut engine = ReassemblyEngine::new();

        assert!(engine.push(&fragment(1, 0, 0, 2, &signature), at(0)).is_none());
        let mut rogue = fragment(1, 0, 1, 2, &signature);
        rogue.chunk_offset = 1000;
        // The chunk lands outside the 8-byte buffer, so index 1 stays
        // unreceived and the flow never completes from this arrival.
        assert!(engine.push(&rogue, at(1)).is_none());
        assert_eq!(engine.pending_flows(), 1);
    }

    #[test]
    fn single_fragment_flow_completes_immediately() {
        let signature: Vec<u8> = vec![9; 3];
        let mut engine = ReassemblyEngine::new();
        let message = engine
            .push(&fragment(4, 9, 0, 1, &signature), at(5))
            .expect("single fragment completes");
        assert_eq!(message.signature, signature);
        assert_eq!(message.spdu.sender, VehicleId::new(4));
    }

    #[test]
    fn purge_evicts_only_expired_flows() {
        let signature: Vec<u8> = vec![1; 8];
        let mut engine = ReassemblyEngine::new();

        assert!(engine.push(&fragment(1, 0, 0, 2, &signature), at(0)).is_none());
        assert!(
            engine
                .push(&fragment(2, 0, 0, 2, &signature), at(4_000_000))
                .is_none()
        );

        let evicted = engine.purge_stale(at(5_000_000), Duration::from_secs(2));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].vehicle(), VehicleId::new(1));
        assert_eq!(engine.pending_flows(), 1);
    }
}
