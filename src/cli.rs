//! Command line interface for the simulator binary.
//!
//! Kept free of crate-internal types so the build script can compile it
//! standalone for man page generation.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command line arguments for the `pqv2v` binary.
#[derive(Debug, Parser)]
#[command(
    name = "pqv2v",
    version,
    about = "Simulated V2V safety messaging with classical and post-quantum signatures"
)]
pub struct Cli {
    /// Role this process plays in the simulation.
    #[arg(value_enum)]
    pub role: Role,

    /// Visualization endpoint to forward completed messages to.
    #[arg(long, value_enum, default_value = "none")]
    pub gui: Gui,

    /// Use the loopback test port instead of the production DSRC ports.
    #[arg(long)]
    pub test: bool,

    /// Path to the scenario configuration file (overridden by
    /// `V2X_CONFIG_PATH`).
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,
}

/// Which half of the simulation this process runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Sign, fragment, and send messages for every configured vehicle.
    Transmitter,
    /// Reassemble, verify, and report incoming messages.
    Receiver,
}

/// Visualization endpoint selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Gui {
    /// Forward to the Tk visualizer on port 9999.
    Tk,
    /// Forward to the browser visualizer on port 8888.
    Web,
    /// No forwarding.
    #[default]
    None,
}
