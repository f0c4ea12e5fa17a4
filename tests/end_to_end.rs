//! Full sign → transmit → reassemble → verify runs over loopback sockets.

mod common;

use pqv2v::fragment::VehicleId;
use pqv2v::receive::Receiver;
use pqv2v::signing::SignatureScheme;
use pqv2v::transmit::{LossModel, Transmitter};
use pqv2v::verify::Verifier;

use crate::common::{TestDir, vehicle};

const MESSAGES_PER_VEHICLE: u32 = 2;

async fn run_scenario(
    label: &str,
    scheme: SignatureScheme,
    vehicles: u8,
    loss: fn() -> LossModel,
) -> (pqv2v::RunSummary, usize) {
    let dir = TestDir::new(label);

    let fleet: Vec<_> = (0..vehicles)
        .map(|id| {
            vehicle(
                &dir,
                VehicleId::new(id),
                scheme,
                MESSAGES_PER_VEHICLE as usize + 1,
            )
        })
        .collect();

    let mut receiver = Receiver::bind(
        "127.0.0.1:0".parse().expect("loopback address"),
        Verifier::new(dir.keystore()),
        None,
    )
    .await
    .expect("bind receiver");
    let target = receiver.local_addr().expect("receiver address");

    let expected = usize::from(vehicles) * MESSAGES_PER_VEHICLE as usize;
    let receive_task = tokio::spawn(async move {
        let summary = receiver.run(expected).await.expect("receive loop");
        (summary, receiver.pending_flows())
    });

    let mut transmit_tasks = Vec::new();
    for vehicle in fleet {
        let loss = loss();
        transmit_tasks.push(tokio::spawn(async move {
            let mut transmitter = Transmitter::connect(vehicle, target, loss)
                .await
                .expect("connect transmitter");
            transmitter.run(MESSAGES_PER_VEHICLE).await.expect("transmit")
        }));
    }
    for task in transmit_tasks {
        task.await.expect("transmit task");
    }

    receive_task.await.expect("receive task")
}

#[tokio::test]
async fn classical_fleet_verifies_end_to_end() {
    let (summary, leaked) =
        run_scenario("e2e-ecdsa", SignatureScheme::Ecdsa, 2, LossModel::disabled).await;
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.accepted, 4);
    assert_eq!(summary.rejected, 0);
    assert_eq!(leaked, 0, "reliable channel leaves no half-open flows");
    assert!(summary.first_fragment_at.is_some());
    assert!(summary.last_completion_at >= summary.first_fragment_at);
}

#[tokio::test]
async fn post_quantum_fleet_verifies_despite_total_first_pass_loss() {
    // Drop probability 1.0 forces every fragment through the resend pass;
    // the flows still complete because resends are unconditional.
    let (summary, leaked) = run_scenario(
        "e2e-falcon-lossy",
        SignatureScheme::Falcon,
        2,
        || LossModel::seeded(1.0, 23),
    )
    .await;
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.accepted, 4);
    assert_eq!(summary.rejected, 0);
    assert_eq!(leaked, 0);
}
