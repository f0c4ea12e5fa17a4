//! One simulated vehicle: signing identity plus mobility trace.

use std::path::Path;

use crate::bsm::Bsm;
use crate::error::SimError;
use crate::fragment::{SequenceNumber, SpduFragment, VehicleId};
use crate::keys::KeyStore;
use crate::signing::{Signer, SignerOptions};
use crate::time::Timestamp;
use crate::trace::Trace;

/// A transmitting vehicle.
///
/// Each vehicle owns its private key material, trace data, and sequence
/// numbering; concurrent vehicles share nothing mutable.
#[derive(Clone, Debug)]
pub struct Vehicle {
    signer: Signer,
    trace: Trace,
}

impl Vehicle {
    /// Load the vehicle's keys and trace from the run directory.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] when key material or the trace file is missing
    /// or malformed; both are fatal setup errors.
    pub fn load(
        id: VehicleId,
        base: &Path,
        keys: &KeyStore,
        options: SignerOptions,
    ) -> Result<Self, SimError> {
        let signer = Signer::load(id, keys, options)?;
        let trace = Trace::load(base, id)?;
        Ok(Self { signer, trace })
    }

    /// Assemble a vehicle from preloaded parts (synthetic runs, tests).
    #[must_use]
    pub fn from_parts(signer: Signer, trace: Trace) -> Self { Self { signer, trace } }

    /// The vehicle's identifier.
    #[must_use]
    pub const fn id(&self) -> VehicleId { self.signer.vehicle() }

    /// Number of trace rows available, bounding how many messages this
    /// vehicle can send.
    #[must_use]
    pub fn trace_len(&self) -> usize { self.trace.len() }

    /// Generate, sign, and fragment the message for `timestep`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] when the trace is exhausted or signing fails.
    pub fn prepare_signed_fragments(
        &self,
        sequence: SequenceNumber,
        timestep: usize,
        now: Timestamp,
    ) -> Result<Vec<SpduFragment>, SimError> {
        let (previous, current) = self.trace.sample(timestep)?;
        let bsm = Bsm::from_trace(previous, current);
        Ok(self.signer.prepare_fragments(sequence, bsm, now)?)
    }
}
