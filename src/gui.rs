//! Forwarding of completed messages to a local visualization endpoint.
//!
//! The GUI is a separate process listening on a localhost UDP port; it only
//! needs position, kinematics, the verification outcome, and the sender.
//! Forwarding is best-effort; a missing or wedged GUI must never stall the
//! receive loop.

use bincode::{Decode, Encode};
use tokio::net::UdpSocket;

use crate::error::SimError;
use crate::fragment::SpduFragment;
use crate::message::Message;
use crate::verify::Verdict;

/// Port the Tk-based visualizer listens on.
pub const TK_GUI_PORT: u16 = 9999;

/// Port the browser-based visualizer listens on.
pub const WEB_GUI_PORT: u16 = 8888;

/// Compact per-message record consumed by the visualizers.
#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct GuiRecord {
    pub latitude: f32,
    pub longitude: f32,
    pub elevation: f32,
    pub speed: f32,
    pub heading: f32,
    pub valid: bool,
    pub sender: u8,
}

impl GuiRecord {
    /// Derive the record from a reconstructed message and its verdict.
    #[must_use]
    pub fn new(spdu: &SpduFragment, verdict: &Verdict) -> Self {
        let bsm = &spdu.data.tbs.message;
        Self {
            latitude: bsm.latitude,
            longitude: bsm.longitude,
            elevation: bsm.elevation,
            speed: bsm.speed,
            heading: bsm.heading,
            valid: verdict.accepted(),
            sender: spdu.sender.get(),
        }
    }
}

/// Connected socket towards one visualization endpoint.
#[derive(Debug)]
pub struct GuiForwarder {
    socket: UdpSocket,
}

impl GuiForwarder {
    /// Connect to the visualizer on localhost `port`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] when the local socket cannot be set up.
    pub async fn connect(port: u16) -> Result<Self, SimError> {
        let socket = UdpSocket::bind(("127.0.0.1", 0)).await?;
        socket.connect(("127.0.0.1", port)).await?;
        Ok(Self { socket })
    }

    /// Send one record, logging (not propagating) any failure.
    pub async fn forward(&self, record: &GuiRecord) {
        let datagram = match record.to_bytes() {
            Ok(bytes) => bytes,
            Err(error) => {
                log::warn!("failed to encode GUI record: {error}");
                return;
            }
        };
        if let Err(error) = self.socket.send(&datagram).await {
            log::warn!("failed to forward GUI record: {error}");
        }
    }
}
