//! Run driver for the simulator binary.
//!
//! Dispatches to the transmit or receive half of the simulation based on the
//! CLI role. All fatal errors propagate here, are logged, and turn into a
//! non-zero exit status; nothing below this function terminates the
//! process.

mod cli;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pqv2v::config::{self, EnvOverrides, ScenarioConfig};
use pqv2v::gui::{GuiForwarder, TK_GUI_PORT, WEB_GUI_PORT};
use pqv2v::report::MetricsSink;
use pqv2v::{
    KeyStore, LossModel, Receiver, SimError, Transmitter, TxStats, Vehicle, VehicleId, Verifier,
};

use crate::cli::{Cli, Gui, Role};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), SimError> {
    let config_path = std::env::var_os("V2X_CONFIG_PATH")
        .map_or(cli.config, PathBuf::from);
    let env = EnvOverrides::capture();
    let scenario = ScenarioConfig::load(&config_path, &env)?;
    tracing::info!(
        scheme = %scenario.scheme,
        vehicles = scenario.num_vehicles,
        messages = scenario.num_messages,
        compression = %scenario.compression,
        drop_probability = scenario.drop_probability,
        "scenario loaded",
    );

    let keys = KeyStore::new(".");
    match cli.role {
        Role::Transmitter => {
            let port = if cli.test { config::test_port() } else { config::TX_PORT };
            transmit(&scenario, &keys, port).await
        }
        Role::Receiver => {
            let port = if cli.test { config::test_port() } else { config::RX_PORT };
            receive(&scenario, keys, port, cli.gui).await
        }
    }
}

/// Spawn one independent transmit task per vehicle and wait for all of them.
async fn transmit(scenario: &ScenarioConfig, keys: &KeyStore, port: u16) -> Result<(), SimError> {
    let target = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let base = Path::new(".");

    let mut workers = Vec::with_capacity(usize::from(scenario.num_vehicles));
    for id in 0..scenario.num_vehicles {
        let vehicle = Vehicle::load(VehicleId::new(id), base, keys, scenario.signer_options())?;
        let loss = LossModel::new(scenario.drop_probability);
        let num_messages = u32::from(scenario.num_messages);
        workers.push(tokio::spawn(async move {
            let mut transmitter = Transmitter::connect(vehicle, target, loss).await?;
            transmitter.run(num_messages).await
        }));
    }

    let mut totals = TxStats::default();
    for worker in workers {
        let stats = worker.await??;
        totals.messages += stats.messages;
        totals.fragments_sent += stats.fragments_sent;
        totals.dropped_fragments += stats.dropped_fragments;
        totals.resent_fragments += stats.resent_fragments;
    }

    if scenario.drop_probability > 0.0 {
        println!(
            "Transmitter dropped {} fragments at configured rate {} (resent: {})",
            totals.dropped_fragments, scenario.drop_probability, totals.resent_fragments,
        );
    }
    tracing::info!(
        messages = totals.messages,
        fragments = totals.fragments_sent,
        "transmission complete",
    );
    Ok(())
}

/// Run the receive loop until every expected message has completed.
async fn receive(
    scenario: &ScenarioConfig,
    keys: KeyStore,
    port: u16,
    gui: Gui,
) -> Result<(), SimError> {
    let forwarder = match gui {
        Gui::Tk => Some(GuiForwarder::connect(TK_GUI_PORT).await?),
        Gui::Web => Some(GuiForwarder::connect(WEB_GUI_PORT).await?),
        Gui::None => None,
    };

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let mut receiver = Receiver::bind(addr, Verifier::new(keys), forwarder).await?;

    let expected = usize::from(scenario.num_messages) * usize::from(scenario.num_vehicles);
    let summary = receiver.run(expected).await?;
    tracing::info!(
        completed = summary.completed,
        accepted = summary.accepted,
        rejected = summary.rejected,
        leaked_flows = receiver.pending_flows(),
        "reception complete",
    );

    MetricsSink::from_env().record(scenario.scheme, &summary)?;
    Ok(())
}
