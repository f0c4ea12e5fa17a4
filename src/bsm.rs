//! Basic safety message payload and its kinematic derivation.
//!
//! A BSM carries the transmitting vehicle's position and motion state. The
//! position comes straight from the vehicle's trace; speed and heading are
//! derived from the displacement between the previous and current trace rows,
//! sampled at a fixed interval.

use bincode::{Decode, Encode};

use crate::trace::TracePoint;

/// Sampling interval between consecutive trace rows, in milliseconds.
pub const TRACE_INTERVAL_MS: u32 = 100;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Position and kinematics reported by one vehicle at one timestep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Encode, Decode)]
pub struct Bsm {
    pub latitude: f32,
    pub longitude: f32,
    pub elevation: f32,
    /// Ground speed in km/h.
    pub speed: f32,
    /// Heading in degrees clockwise from true north, in `[0, 360)`.
    pub heading: f32,
}

impl Bsm {
    /// Build the BSM for a timestep from the current trace point and, when
    /// available, its predecessor.
    ///
    /// The first timestep of a trace has no predecessor, so speed and heading
    /// are reported as zero.
    #[must_use]
    pub fn from_trace(previous: Option<&TracePoint>, current: &TracePoint) -> Self {
        let (speed, heading) = previous.map_or((0.0, 0.0), |prev| {
            (
                speed_kph(prev, current, TRACE_INTERVAL_MS),
                heading_degrees(prev, current),
            )
        });
        Self {
            latitude: current.latitude,
            longitude: current.longitude,
            elevation: current.elevation,
            speed,
            heading,
        }
    }
}

/// Great-circle distance between two trace points in meters.
fn haversine_m(from: &TracePoint, to: &TracePoint) -> f64 {
    let lat1 = f64::from(from.latitude).to_radians();
    let lat2 = f64::from(to.latitude).to_radians();
    let dlat = (f64::from(to.latitude) - f64::from(from.latitude)).to_radians();
    let dlon = (f64::from(to.longitude) - f64::from(from.longitude)).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Speed in km/h given the displacement over one sampling interval.
fn speed_kph(from: &TracePoint, to: &TracePoint, interval_ms: u32) -> f32 {
    let meters = haversine_m(from, to);
    let seconds = f64::from(interval_ms) / 1000.0;
    let speed = meters / seconds * 3.6;
    speed as f32
}

/// Initial bearing from `from` to `to`, degrees clockwise from north.
fn heading_degrees(from: &TracePoint, to: &TracePoint) -> f32 {
    let lat1 = f64::from(from.latitude).to_radians();
    let lat2 = f64::from(to.latitude).to_radians();
    let dlon = (f64::from(to.longitude) - f64::from(from.longitude)).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let bearing = y.atan2(x).to_degrees();
    ((bearing + 360.0) % 360.0) as f32
}
