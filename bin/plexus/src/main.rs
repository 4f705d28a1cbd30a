//! Plexus node binary.

mod cli;
mod config;
mod logging;
mod network;
mod report;

use clap::Parser;
use eyre::WrapErr;
use libp2p::PeerId;
use plexus_net_protocol_grouper::ProtocolGrouper;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::NodeConfig;
use crate::network::{Network, UpdateSink};

/// Buffered identify updates between the swarm loop and the grouper task.
const UPDATE_CHANNEL_CAPACITY: usize = 128;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    let mut config = NodeConfig::load_or_create(cli.config.as_deref())?;
    config.apply_cli_args(&cli.network, &cli.protocols);

    let mut grouper = ProtocolGrouper::<PeerId>::new(config.protocols.clone());
    let reporter = tokio::spawn(report::report_protocols(
        grouper.index().clone(),
        grouper.subscribe(),
    ));

    let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    grouper
        .start(ReceiverStream::new(rx))
        .wrap_err("failed to start protocol grouper")?;

    let sink = UpdateSink::for_config(grouper.config(), tx);

    let mut network = Network::new(&config.network, sink).wrap_err("failed to build swarm")?;
    let dialed = network.dial_peers();
    info!(
        local_peer_id = %network.local_peer_id(),
        dialed,
        auto_subscribe = grouper.config().auto_subscribe,
        "Plexus node started"
    );

    network
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(%e, "Failed to listen for shutdown signal");
            }
        })
        .await;

    grouper.stop().await?;
    reporter.abort();

    let index = grouper.index();
    info!(
        peers = index.peer_count(),
        protocols = index.protocol_count(),
        associations = index.association_count(),
        "Plexus node stopped"
    );

    Ok(())
}
