//! The single-threaded receive loop.
//!
//! One loop blocks on the next inbound datagram, feeds it through the
//! reassembly engine, and, on flow completion, runs the verification
//! pipeline, reporting, and optional GUI forwarding before blocking again.
//! Only this loop ever touches the flow table, so no locking is needed; the
//! trade-off is that receiver throughput is capped at one fragment's
//! processing latency.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::error::SimError;
use crate::fragment::{MAX_DATAGRAM_SIZE, decode_datagram};
use crate::gui::{GuiForwarder, GuiRecord};
use crate::metrics;
use crate::reassembly::ReassemblyEngine;
use crate::report;
use crate::time::Timestamp;
use crate::verify::Verifier;

/// Counters and boundary timestamps accumulated over one receive run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages whose reassembly completed.
    pub completed: usize,
    /// Completed messages that passed all verification checks.
    pub accepted: usize,
    /// Completed messages that failed at least one check.
    pub rejected: usize,
    /// Arrival time of the first fragment of the run.
    pub first_fragment_at: Option<Timestamp>,
    /// Completion time of the last reassembled message.
    pub last_completion_at: Option<Timestamp>,
}

/// Receive-side driver owning the socket, flow table, and verifier.
#[derive(Debug)]
pub struct Receiver {
    socket: UdpSocket,
    engine: ReassemblyEngine,
    verifier: Verifier,
    gui: Option<GuiForwarder>,
}

impl Receiver {
    /// Bind the receive socket.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] when the bind fails; transport setup
    /// failures abort the run.
    pub async fn bind(
        addr: SocketAddr,
        verifier: Verifier,
        gui: Option<GuiForwarder>,
    ) -> Result<Self, SimError> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self {
            socket,
            engine: ReassemblyEngine::new(),
            verifier,
            gui,
        })
    }

    /// The bound local address (useful when binding to port 0).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] when the socket refuses to report its
    /// address.
    pub fn local_addr(&self) -> Result<SocketAddr, SimError> {
        Ok(self.socket.local_addr()?)
    }

    /// Run until `expected_messages` reassemblies have completed.
    ///
    /// Undecodable datagrams and protocol anomalies are dropped without
    /// affecting the count; verification failures count as completed (and
    /// rejected) messages. Incomplete flows are never evicted: a flow that
    /// lost its last fragment simply stays in the table for the life of the
    /// loop.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] on transport failures or missing key material
    /// for a claimed sender; both abort the run.
    pub async fn run(&mut self, expected_messages: usize) -> Result<RunSummary, SimError> {
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let mut summary = RunSummary::default();

        while summary.completed < expected_messages {
            let (len, _peer) = self.socket.recv_from(&mut buffer).await?;
            let now = Timestamp::now();

            let fragment = match decode_datagram(&buffer[..len]) {
                Ok(fragment) => fragment,
                Err(error) => {
                    tracing::debug!(%error, len, "discarding undecodable datagram");
                    continue;
                }
            };
            metrics::inc_fragments_received();
            summary.first_fragment_at.get_or_insert(now);

            let Some(message) = self.engine.push(&fragment, now) else {
                continue;
            };
            metrics::inc_messages_completed();

            let verdict =
                self.verifier
                    .verify(&message.spdu, &message.signature, message.completed_at)?;
            if verdict.accepted() {
                summary.accepted += 1;
            } else {
                metrics::inc_messages_rejected();
                summary.rejected += 1;
                tracing::warn!(
                    flow = %message.spdu.flow_key(),
                    certificate_ok = verdict.certificate_ok,
                    signature_ok = verdict.signature_ok,
                    fresh = verdict.fresh,
                    "message rejected",
                );
            }

            if let Some(gui) = &self.gui {
                gui.forward(&GuiRecord::new(&message.spdu, &verdict)).await;
            }
            report::print_message(&message.spdu, &verdict);

            summary.completed += 1;
            summary.last_completion_at = Some(message.completed_at);
        }

        Ok(summary)
    }

    /// Flows still accumulating (leaked flows after a lossy run).
    #[must_use]
    pub fn pending_flows(&self) -> usize { self.engine.pending_flows() }
}
