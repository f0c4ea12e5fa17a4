//! Loss-aware transmission of signed fragment sets.
//!
//! The transmitter models a single best-effort retransmission round: each
//! fragment is either sent immediately or withheld according to a uniform
//! draw against the configured drop probability. Withheld fragments are
//! resent once, unconditionally, after a short delay that stands in for a
//! lower-layer retransmission timer. Resends always go out, so a flow can
//! only be starved by genuine transport loss, which this simulator does not
//! model.

use std::net::SocketAddr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::net::UdpSocket;
use tokio::time::sleep;

use crate::error::SimError;
use crate::fragment::{SequenceNumber, SpduFragment, encode_datagram};
use crate::metrics;
use crate::time::Timestamp;
use crate::vehicle::Vehicle;

/// Delay before the withheld fragments of a message are resent.
pub const RESEND_DELAY: Duration = Duration::from_millis(5);

/// Fixed pacing between consecutive messages, applied regardless of loss.
pub const MESSAGE_PACING: Duration = Duration::from_millis(100);

/// Simulated channel-loss decision source.
///
/// A drop probability of zero disables the loss path entirely: no random
/// draws are made and the resend batch is always empty.
#[derive(Debug)]
pub struct LossModel {
    drop_probability: f64,
    rng: StdRng,
}

impl LossModel {
    /// Create a model with entropy-seeded randomness, clamping the
    /// probability into `[0, 1]`.
    #[must_use]
    pub fn new(drop_probability: f64) -> Self {
        Self::from_rng(drop_probability, StdRng::from_entropy())
    }

    /// Create a deterministic model for reproducible runs.
    #[must_use]
    pub fn seeded(drop_probability: f64, seed: u64) -> Self {
        Self::from_rng(drop_probability, StdRng::seed_from_u64(seed))
    }

    /// A model that never drops.
    #[must_use]
    pub fn disabled() -> Self { Self::new(0.0) }

    fn from_rng(drop_probability: f64, rng: StdRng) -> Self {
        Self {
            drop_probability: drop_probability.clamp(0.0, 1.0),
            rng,
        }
    }

    /// The configured drop probability.
    #[must_use]
    pub const fn drop_probability(&self) -> f64 { self.drop_probability }

    /// Decide whether the next fragment is withheld for the resend pass.
    pub fn should_drop(&mut self) -> bool {
        self.drop_probability > 0.0 && self.rng.gen_range(0.0..1.0) < self.drop_probability
    }
}

/// Counters accumulated over one vehicle's transmit loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxStats {
    pub messages: usize,
    pub fragments_sent: usize,
    pub dropped_fragments: usize,
    pub resent_fragments: usize,
}

/// Per-vehicle transmit loop over a connected datagram socket.
#[derive(Debug)]
pub struct Transmitter {
    vehicle: Vehicle,
    socket: UdpSocket,
    loss: LossModel,
}

impl Transmitter {
    /// Bind an ephemeral local socket and connect it to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] when the socket cannot be bound or
    /// connected; transport setup failures abort the run.
    pub async fn connect(
        vehicle: Vehicle,
        target: SocketAddr,
        loss: LossModel,
    ) -> Result<Self, SimError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.connect(target).await?;
        Ok(Self {
            vehicle,
            socket,
            loss,
        })
    }

    /// Sign and transmit `num_messages` messages, walking the vehicle's
    /// trace one timestep per message.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] on signing failures, trace exhaustion, or
    /// transport errors. All are fatal; there is no in-flow recovery.
    pub async fn run(&mut self, num_messages: u32) -> Result<TxStats, SimError> {
        let mut stats = TxStats::default();

        for index in 0..num_messages {
            let sequence = SequenceNumber::new(index);
            let fragments = self.vehicle.prepare_signed_fragments(
                sequence,
                index as usize,
                Timestamp::now(),
            )?;

            let mut resend_batch = Vec::new();
            for fragment in fragments {
                if self.loss.should_drop() {
                    stats.dropped_fragments += 1;
                    resend_batch.push(fragment);
                    continue;
                }
                self.send(&fragment).await?;
                stats.fragments_sent += 1;
            }

            if !resend_batch.is_empty() {
                sleep(RESEND_DELAY).await;
                for fragment in &resend_batch {
                    self.send(fragment).await?;
                    stats.fragments_sent += 1;
                    stats.resent_fragments += 1;
                }
            }

            stats.messages += 1;
            sleep(MESSAGE_PACING).await;
        }

        if self.loss.drop_probability() > 0.0 {
            tracing::info!(
                vehicle = %self.vehicle.id(),
                dropped = stats.dropped_fragments,
                resent = stats.resent_fragments,
                rate = self.loss.drop_probability(),
                "transmitter loss summary",
            );
        }

        Ok(stats)
    }

    async fn send(&self, fragment: &SpduFragment) -> Result<(), SimError> {
        let datagram = encode_datagram(fragment)?;
        self.socket.send(&datagram).await?;
        metrics::inc_fragments_sent();
        Ok(())
    }
}
