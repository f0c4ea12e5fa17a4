//! Typed identifiers naming one logical message across its fragments.

use bincode::{Decode, Encode};
use derive_more::{Display, From, Into};

/// Small unsigned identifier of the originating vehicle.
///
/// # Examples
///
/// ```
/// use pqv2v::fragment::VehicleId;
/// let id = VehicleId::new(3);
/// assert_eq!(id.get(), 3);
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Display,
    From, Into,
)]
#[display("{_0}")]
pub struct VehicleId(u8);

impl VehicleId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }
}

/// Monotonically increasing per-sender message counter.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Display,
    From, Into,
)]
#[display("{_0}")]
pub struct SequenceNumber(u32);

impl SequenceNumber {
    /// Create a new sequence number.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the inner numeric value.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }
}

/// Composite key identifying one logical message across all concurrent flows.
///
/// The key packs the vehicle id into the high byte and the sequence number
/// into the low 32 bits, giving a 40-bit value that is unique for the
/// lifetime of a run regardless of how many senders interleave.
///
/// # Examples
///
/// ```
/// use pqv2v::fragment::{FlowKey, SequenceNumber, VehicleId};
/// let key = FlowKey::new(VehicleId::new(3), SequenceNumber::new(7));
/// assert_eq!(key.get(), 0x3_0000_0007);
/// assert_eq!(key.vehicle(), VehicleId::new(3));
/// assert_eq!(key.sequence(), SequenceNumber::new(7));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey(u64);

impl std::fmt::Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.vehicle(), self.sequence())
    }
}

impl FlowKey {
    /// Combine a vehicle id and sequence number into a flow key.
    #[must_use]
    pub const fn new(vehicle: VehicleId, sequence: SequenceNumber) -> Self {
        Self(((vehicle.get() as u64) << 32) | sequence.get() as u64)
    }

    /// Return the packed 40-bit value.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }

    /// Extract the originating vehicle id.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "high byte of a 40-bit value")]
    pub const fn vehicle(self) -> VehicleId { VehicleId::new((self.0 >> 32) as u8) }

    /// Extract the per-sender sequence number.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, reason = "low 32 bits by construction")]
    pub const fn sequence(self) -> SequenceNumber { SequenceNumber::new(self.0 as u32) }
}
