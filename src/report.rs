//! Console reporting and run-level metrics persistence.
//!
//! Per-message reporting echoes each completed SPDU and its BSM to the
//! console. At the end of a run the receiver emits one `METRIC` line and,
//! when configured, appends the same record as a CSV row for the offline
//! report tooling.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::fragment::SpduFragment;
use crate::receive::RunSummary;
use crate::signing::SignatureScheme;
use crate::verify::Verdict;

/// Print the standard per-message report block.
pub fn print_message(spdu: &SpduFragment, verdict: &Verdict) {
    let bsm = &spdu.data.tbs.message;
    let sent_secs = spdu.data.tbs.header_info.timestamp.as_micros() / 1_000_000;

    println!("{}", "-".repeat(80));
    println!("SPDU received!");
    println!("\tID:\t\t{}", spdu.sender);
    println!("\tSequence:\t{}", spdu.sequence);
    println!("\tValid:\t\t{}", if verdict.accepted() { "TRUE" } else { "FALSE" });
    println!("\tFragments:\t{}", spdu.fragment_count);
    println!("\tScheme:\t\t{}", spdu.scheme);
    println!("\tSent:\t\t{sent_secs}");
    println!("BSM received!");
    println!("\tLocation:\t{}, {}, {}", bsm.latitude, bsm.longitude, bsm.elevation);
    println!("\tSpeed:\t\t{}", bsm.speed);
    println!("\tHeading:\t{}", bsm.heading);
}

/// Destination for the end-of-run metrics record.
#[derive(Clone, Debug, Default)]
pub struct MetricsSink {
    path: Option<PathBuf>,
    run_id: String,
    note: String,
}

impl MetricsSink {
    /// Build a sink from the `V2X_METRICS_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os("V2X_METRICS_FILE").map(PathBuf::from),
            run_id: std::env::var("V2X_METRICS_RUN").unwrap_or_else(|_| "0".to_owned()),
            note: std::env::var("V2X_METRICS_NOTE").unwrap_or_default(),
        }
    }

    /// Build a sink with explicit settings.
    #[must_use]
    pub fn new(path: Option<PathBuf>, run_id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            path,
            run_id: run_id.into(),
            note: note.into(),
        }
    }

    /// Emit the run record: always to the console, and appended as a CSV
    /// row when a metrics file is configured.
    ///
    /// A run that never saw a fragment has nothing to report and emits
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] when the metrics file cannot be
    /// opened or written.
    pub fn record(&self, scheme: SignatureScheme, summary: &RunSummary) -> std::io::Result<()> {
        let (Some(first), Some(last)) = (summary.first_fragment_at, summary.last_completion_at)
        else {
            return Ok(());
        };
        let total_us = last.saturating_since(first).as_micros();
        let first_us = first.as_micros();
        let last_us = last.as_micros();

        println!(
            "METRIC run={} scheme={} total_us={total_us} first_us={first_us} last_us={last_us}",
            self.run_id,
            scheme.code(),
        );

        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(
                file,
                "{},{},{total_us},{first_us},{last_us},{}",
                self.run_id,
                scheme.code(),
                self.note,
            )?;
        }

        Ok(())
    }
}
