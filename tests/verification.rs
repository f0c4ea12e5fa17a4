//! Verification pipeline behavior on reconstructed messages.

mod common;

use std::time::Duration;

use pqv2v::fragment::{SequenceNumber, SignatureChunk, SpduFragment, VehicleId};
use pqv2v::reassembly::{ReassembledSpdu, ReassemblyEngine};
use pqv2v::signing::{SignatureScheme, Signer};
use pqv2v::time::Timestamp;
use pqv2v::verify::{FRESHNESS_WINDOW, Verifier};
use rstest::rstest;

use crate::common::{TestDir, options, provision_keys};

fn signer_for(dir: &TestDir, id: VehicleId, scheme: SignatureScheme) -> Signer {
    provision_keys(&dir.path, id, scheme == SignatureScheme::Falcon);
    Signer::load(id, &dir.keystore(), options(scheme)).expect("load signer")
}

/// Push a fragment set through a fresh engine and return the reconstruction.
fn reassemble(fragments: Vec<SpduFragment>, completed_at: Timestamp) -> ReassembledSpdu {
    let mut engine = ReassemblyEngine::new();
    let mut completed = None;
    for fragment in &fragments {
        completed = engine.push(fragment, completed_at);
    }
    completed.expect("all fragments delivered, flow must complete")
}

#[rstest]
#[case::classical(SignatureScheme::Ecdsa)]
#[case::post_quantum(SignatureScheme::Falcon)]
fn valid_message_passes_every_check(#[case] scheme: SignatureScheme) {
    let dir = TestDir::new(&format!("verify-valid-{}", scheme.code()));
    let id = VehicleId::new(3);
    let signer = signer_for(&dir, id, scheme);
    let mut verifier = Verifier::new(dir.keystore());

    let now = Timestamp::now();
    let fragments = signer
        .prepare_fragments(SequenceNumber::new(7), pqv2v::Bsm::default(), now)
        .expect("sign message");
    let message = reassemble(fragments, now);

    let verdict = verifier
        .verify(&message.spdu, &message.signature, message.completed_at)
        .expect("verification runs");
    assert!(verdict.certificate_ok);
    assert!(verdict.signature_ok);
    assert!(verdict.fresh);
    assert!(verdict.accepted());
}

#[rstest]
#[case::classical(SignatureScheme::Ecdsa)]
#[case::post_quantum(SignatureScheme::Falcon)]
fn corrupted_signature_chunk_fails_only_the_signature_check(#[case] scheme: SignatureScheme) {
    let dir = TestDir::new(&format!("verify-corrupt-{}", scheme.code()));
    let id = VehicleId::new(3);
    let signer = signer_for(&dir, id, scheme);
    let mut verifier = Verifier::new(dir.keystore());

    let now = Timestamp::now();
    let mut fragments = signer
        .prepare_fragments(SequenceNumber::new(7), pqv2v::Bsm::default(), now)
        .expect("sign message");

    // Flip one byte of the first chunk before reassembly.
    let mut chunk = fragments[0].signature_chunk.as_slice().to_vec();
    chunk[0] ^= 0x01;
    fragments[0].signature_chunk = SignatureChunk::copy_from(&chunk);

    let message = reassemble(fragments, now);
    let verdict = verifier
        .verify(&message.spdu, &message.signature, message.completed_at)
        .expect("verification runs");

    assert!(verdict.certificate_ok, "certificate check is independent");
    assert!(!verdict.signature_ok);
    assert!(verdict.fresh);
    assert!(!verdict.accepted());
}

#[test]
fn freshness_boundary_is_strict() {
    let dir = TestDir::new("verify-freshness");
    let id = VehicleId::new(1);
    let signer = signer_for(&dir, id, SignatureScheme::Ecdsa);
    let mut verifier = Verifier::new(dir.keystore());

    let completed_at = Timestamp::now();

    // 29 999 ms old: inside the window, accepted.
    let just_fresh = completed_at.saturating_sub(FRESHNESS_WINDOW - Duration::from_millis(1));
    let fragments = signer
        .prepare_fragments(SequenceNumber::new(0), pqv2v::Bsm::default(), just_fresh)
        .expect("sign message");
    let message = reassemble(fragments, completed_at);
    let verdict = verifier
        .verify(&message.spdu, &message.signature, completed_at)
        .expect("verification runs");
    assert!(verdict.signature_ok, "signatures are valid either way");
    assert!(verdict.fresh);
    assert!(verdict.accepted());

    // Exactly 30 000 ms old: on the boundary, rejected.
    let stale = completed_at.saturating_sub(FRESHNESS_WINDOW);
    let fragments = signer
        .prepare_fragments(SequenceNumber::new(1), pqv2v::Bsm::default(), stale)
        .expect("sign message");
    let message = reassemble(fragments, completed_at);
    let verdict = verifier
        .verify(&message.spdu, &message.signature, completed_at)
        .expect("verification runs");
    assert!(verdict.certificate_ok);
    assert!(verdict.signature_ok);
    assert!(!verdict.fresh);
    assert!(!verdict.accepted());
}

#[test]
fn falcon_public_keys_are_cached_per_sender_and_resettable() {
    let dir = TestDir::new("verify-cache");
    let id = VehicleId::new(2);
    let signer = signer_for(&dir, id, SignatureScheme::Falcon);
    let mut verifier = Verifier::new(dir.keystore());
    assert_eq!(verifier.cached_falcon_keys(), 0);

    let now = Timestamp::now();
    for sequence in 0..3 {
        let fragments = signer
            .prepare_fragments(SequenceNumber::new(sequence), pqv2v::Bsm::default(), now)
            .expect("sign message");
        let message = reassemble(fragments, now);
        let verdict = verifier
            .verify(&message.spdu, &message.signature, now)
            .expect("verification runs");
        assert!(verdict.accepted());
    }

    assert_eq!(verifier.cached_falcon_keys(), 1, "one sender, one cached key");
    verifier.reset_falcon_cache();
    assert_eq!(verifier.cached_falcon_keys(), 0);
}

#[test]
fn missing_sender_keys_abort_verification() {
    let dir = TestDir::new("verify-missing-keys");
    let id = VehicleId::new(5);
    let signer = signer_for(&dir, id, SignatureScheme::Ecdsa);

    // A verifier rooted elsewhere has no key material for the sender.
    let empty = TestDir::new("verify-missing-keys-empty");
    let mut verifier = Verifier::new(empty.keystore());

    let now = Timestamp::now();
    let fragments = signer
        .prepare_fragments(SequenceNumber::new(0), pqv2v::Bsm::default(), now)
        .expect("sign message");
    let message = reassemble(fragments, now);

    assert!(verifier.verify(&message.spdu, &message.signature, now).is_err());
}
