//! Vehicle mobility traces loaded from per-vehicle CSV files.
//!
//! Each row is one `latitude,longitude,elevation` triple sampled at the BSM
//! interval. The transmitter walks its trace one row per message, so the
//! trace must hold at least as many rows as the run sends messages.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fragment::VehicleId;

/// One position sample from a trace file.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TracePoint {
    pub latitude: f32,
    pub longitude: f32,
    pub elevation: f32,
}

/// Errors raised while loading or indexing a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("failed to read trace file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A row did not contain three parseable floats.
    #[error("malformed trace row {line} in {path}")]
    Malformed { path: PathBuf, line: usize },
    /// The run asked for more timesteps than the trace holds.
    #[error("trace for vehicle {vehicle} exhausted: timestep {timestep} of {rows} rows")]
    Exhausted {
        vehicle: VehicleId,
        timestep: usize,
        rows: usize,
    },
}

/// An ordered sequence of position samples for one vehicle.
#[derive(Clone, Debug)]
pub struct Trace {
    vehicle: VehicleId,
    rows: Vec<TracePoint>,
}

impl Trace {
    /// Load the trace for `vehicle` from `trace_files/<id>.csv` under `base`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError`] when the file is missing or a row cannot be
    /// parsed as three comma-separated floats.
    pub fn load(base: &Path, vehicle: VehicleId) -> Result<Self, TraceError> {
        let path = base.join("trace_files").join(format!("{vehicle}.csv"));
        let contents = fs::read_to_string(&path).map_err(|source| TraceError::Io {
            path: path.clone(),
            source,
        })?;

        let mut rows = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split(',').map(|field| field.trim().parse::<f32>());
            let (lat, lon, elev) = match (fields.next(), fields.next(), fields.next()) {
                (Some(Ok(lat)), Some(Ok(lon)), Some(Ok(elev))) => (lat, lon, elev),
                _ => {
                    return Err(TraceError::Malformed {
                        path,
                        line: index + 1,
                    });
                }
            };
            rows.push(TracePoint {
                latitude: lat,
                longitude: lon,
                elevation: elev,
            });
        }

        Ok(Self { vehicle, rows })
    }

    /// Construct a trace from in-memory rows (test traces, synthetic runs).
    #[must_use]
    pub fn from_rows(vehicle: VehicleId, rows: Vec<TracePoint>) -> Self { Self { vehicle, rows } }

    /// Number of rows in the trace.
    #[must_use]
    pub fn len(&self) -> usize { self.rows.len() }

    /// Whether the trace holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Return the sample for `timestep` together with its predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Exhausted`] when `timestep` is past the end of
    /// the trace; a run configured for more messages than trace rows is a
    /// setup mistake surfaced before any malformed BSM leaves the vehicle.
    pub fn sample(&self, timestep: usize) -> Result<(Option<&TracePoint>, &TracePoint), TraceError> {
        let current = self.rows.get(timestep).ok_or(TraceError::Exhausted {
            vehicle: self.vehicle,
            timestep,
            rows: self.rows.len(),
        })?;
        let previous = timestep.checked_sub(1).and_then(|prev| self.rows.get(prev));
        Ok((previous, current))
    }
}
