//! Property: splitting a signature into chunks and reassembling the
//! fragments in any arrival order reconstructs the original bytes exactly.

use pqv2v::fragment::{
    LinkLayerHeaders, MAX_SIGNATURE_FRAGMENT_SIZE, MAX_SIGNATURE_TOTAL_SIZE, SequenceNumber,
    SignatureChunk, SpduFragment, VehicleId,
};
use pqv2v::reassembly::ReassemblyEngine;
use pqv2v::signing::SignatureScheme;
use pqv2v::spdu::SignedData;
use pqv2v::time::Timestamp;
use proptest::prelude::*;

/// Build the fragment carrying chunk `index` of `signature`.
fn fragment_at(signature: &[u8], chunk_size: usize, index: usize) -> SpduFragment {
    let count = signature.len().div_ceil(chunk_size);
    let offset = index * chunk_size;
    let end = (offset + chunk_size).min(signature.len());
    SpduFragment {
        sender: VehicleId::new(9),
        sequence: SequenceNumber::new(1),
        link: LinkLayerHeaders::default(),
        scheme: SignatureScheme::Falcon,
        fragment_index: u16::try_from(index).expect("index fits u16"),
        fragment_count: u16::try_from(count).expect("count fits u16"),
        signature_total_len: u32::try_from(signature.len()).expect("length fits u32"),
        chunk_offset: u32::try_from(offset).expect("offset fits u32"),
        data: SignedData::default(),
        signature_chunk: SignatureChunk::copy_from(&signature[offset..end]),
    }
}

fn signature_and_arrival_order() -> impl Strategy<Value = (Vec<u8>, usize, Vec<usize>)> {
    (1..=MAX_SIGNATURE_TOTAL_SIZE, 1..=MAX_SIGNATURE_FRAGMENT_SIZE).prop_flat_map(
        |(len, chunk_size)| {
            let count = len.div_ceil(chunk_size);
            (
                proptest::collection::vec(any::<u8>(), len),
                Just(chunk_size),
                Just((0..count).collect::<Vec<usize>>()).prop_shuffle(),
            )
        },
    )
}

proptest! {
    #[test]
    fn reassembly_reconstructs_any_permutation(
        (signature, chunk_size, order) in signature_and_arrival_order(),
    ) {
        let mut engine = ReassemblyEngine::new();
        let mut completed = None;

        for (step, index) in order.iter().enumerate() {
            prop_assert!(completed.is_none(), "flow completed before the last fragment");
            completed = engine.push(
                &fragment_at(&signature, chunk_size, *index),
                Timestamp::from_micros(step as u64),
            );
        }

        let message = completed.expect("last fragment completes the flow");
        prop_assert_eq!(message.signature, signature);
        prop_assert_eq!(engine.pending_flows(), 0);
    }

    #[test]
    fn duplicates_interleaved_anywhere_do_not_corrupt_the_flow(
        (signature, chunk_size, order) in signature_and_arrival_order(),
        duplicate_pick in any::<prop::sample::Index>(),
    ) {
        let mut engine = ReassemblyEngine::new();
        let mut completed = None;
        let duplicate = order[duplicate_pick.index(order.len())];

        for index in &order {
            // Redeliver one index ahead of its ordinary slot; the engine
            // must treat the repeat as a no-op unless it is the genuinely
            // missing final piece.
            if completed.is_none() {
                completed = engine.push(
                    &fragment_at(&signature, chunk_size, duplicate),
                    Timestamp::from_micros(0),
                );
            }
            if completed.is_none() {
                completed = engine.push(
                    &fragment_at(&signature, chunk_size, *index),
                    Timestamp::from_micros(1),
                );
            }
        }

        let message = completed.expect("every index was delivered");
        prop_assert_eq!(message.signature, signature);
    }
}
