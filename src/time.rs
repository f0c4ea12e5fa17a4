//! Wall-clock timestamps carried inside signed messages.
//!
//! The simulator timestamps messages at generation and again at reassembly
//! completion, then compares the two during the freshness check. Both sides
//! use microseconds since the Unix epoch so the value can be embedded in the
//! wire record and compared across processes.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bincode::{Decode, Encode};
use derive_more::{Display, From, Into};

/// Microseconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use pqv2v::time::Timestamp;
/// let ts = Timestamp::from_micros(1_000_000);
/// assert_eq!(ts.as_micros(), 1_000_000);
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Display,
    From, Into,
)]
#[display("{_0}")]
pub struct Timestamp(u64);

impl Timestamp {
    /// Capture the current wall-clock time.
    ///
    /// Clocks set before the Unix epoch collapse to zero rather than failing;
    /// the freshness check then rejects the message as stale, which is the
    /// safe outcome.
    #[must_use]
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
        Self(micros)
    }

    /// Construct a timestamp from raw microseconds.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self { Self(micros) }

    /// Return the raw microsecond count.
    #[must_use]
    pub const fn as_micros(self) -> u64 { self.0 }

    /// Elapsed time since `earlier`, clamped to zero if `earlier` is in the
    /// future.
    #[must_use]
    pub fn saturating_since(self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    /// Shift the timestamp backwards, clamping at zero.
    #[must_use]
    pub fn saturating_sub(self, delta: Duration) -> Self {
        let micros = u64::try_from(delta.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_sub(micros))
    }

    /// Shift the timestamp forwards, clamping at `u64::MAX`.
    #[must_use]
    pub fn saturating_add(self, delta: Duration) -> Self {
        let micros = u64::try_from(delta.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(micros))
    }
}
