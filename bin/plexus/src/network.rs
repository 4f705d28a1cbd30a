//! P2P networking for the Plexus node.
//!
//! The swarm runs two behaviours:
//! - Identify: learn the protocols each connected peer advertises
//! - Ping: keep connections alive
//!
//! Every identify `Received` event becomes a [`PeerUpdate`]. Whether it reaches the protocol
//! grouper depends on the [`UpdateSink`].

use std::future::Future;

use eyre::Result;
use futures::StreamExt;
use libp2p::{
    Multiaddr, PeerId, Swarm, SwarmBuilder, identify,
    identity::PublicKey,
    noise, ping,
    swarm::{NetworkBehaviour, SwarmEvent},
    tcp, yamux,
};
use plexus_net_protocol_grouper::{PeerUpdate, ProtocolGrouperConfig};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::config::NetworkConfig;

/// Identify protocol version announced to peers.
const PROTOCOL_VERSION: &str = "/plexus/1.0.0";

/// Combined network behaviour for the Plexus node.
#[derive(NetworkBehaviour)]
pub(crate) struct PlexusBehaviour {
    /// Identify protocol - exchange peer info.
    identify: identify::Behaviour,

    /// Ping protocol - keep connections alive.
    ping: ping::Behaviour,
}

impl PlexusBehaviour {
    fn new(local_public_key: PublicKey, config: &NetworkConfig) -> Self {
        Self {
            identify: identify::Behaviour::new(identify::Config::new(
                PROTOCOL_VERSION.to_string(),
                local_public_key,
            )),
            ping: ping::Behaviour::new(ping::Config::new().with_interval(config.ping_interval())),
        }
    }
}

/// Where identify-derived updates go.
#[derive(Debug, Clone)]
pub(crate) enum UpdateSink {
    /// Queued for the grouper's update task.
    Channel(mpsc::Sender<PeerUpdate>),
    /// Logged and dropped. The index only changes through `ProtocolGrouper::apply`.
    Detached,
}

impl UpdateSink {
    /// Sink for a grouper with `config`: the update channel when auto-subscribed, detached in
    /// manual mode.
    pub(crate) fn for_config(config: &ProtocolGrouperConfig, tx: mpsc::Sender<PeerUpdate>) -> Self {
        if config.auto_subscribe {
            Self::Channel(tx)
        } else {
            Self::Detached
        }
    }

    async fn deliver(&self, update: PeerUpdate) {
        match self {
            Self::Channel(tx) => {
                if tx.send(update).await.is_err() {
                    warn!("Protocol grouper is no longer accepting updates");
                }
            }
            Self::Detached => {
                trace!(peer_id = %update.peer_id, "Manual mode, identify update not applied");
            }
        }
    }
}

/// The network handle for managing the libp2p swarm.
pub(crate) struct Network {
    swarm: Swarm<PlexusBehaviour>,
    sink: UpdateSink,
    dial: Vec<Multiaddr>,
}

impl Network {
    /// Create a new network instance with a fresh identity.
    pub(crate) fn new(config: &NetworkConfig, sink: UpdateSink) -> Result<Self> {
        let mut swarm = SwarmBuilder::with_new_identity()
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )?
            .with_behaviour(|keypair| PlexusBehaviour::new(keypair.public(), config))?
            .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(config.idle_timeout()))
            .build();

        info!(local_peer_id = %swarm.local_peer_id(), "Local peer ID");

        for addr in &config.listen_addrs {
            match swarm.listen_on(addr.clone()) {
                Ok(_) => debug!(%addr, "Listen requested"),
                Err(e) => warn!(%addr, %e, "Failed to listen on address"),
            }
        }

        Ok(Self {
            swarm,
            sink,
            dial: config.dial.clone(),
        })
    }

    pub(crate) fn local_peer_id(&self) -> &PeerId {
        self.swarm.local_peer_id()
    }

    /// Dial the configured peers. Returns how many dials were initiated.
    pub(crate) fn dial_peers(&mut self) -> usize {
        let mut initiated = 0;
        for addr in &self.dial {
            match self.swarm.dial(addr.clone()) {
                Ok(()) => {
                    debug!(%addr, "Dial initiated");
                    initiated += 1;
                }
                Err(e) => warn!(%addr, %e, "Failed to dial peer"),
            }
        }
        initiated
    }

    /// Run the network event loop until `shutdown` resolves.
    pub(crate) async fn run(mut self, shutdown: impl Future<Output = ()>) {
        info!("Starting network event loop");
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Network event loop shutting down");
                    break;
                }
                event = self.swarm.select_next_some() => {
                    self.handle_swarm_event(event).await;
                }
            }
        }
    }

    async fn handle_swarm_event(&mut self, event: SwarmEvent<PlexusBehaviourEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                info!(%address, "Listening on address");
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                endpoint,
                num_established,
                ..
            } => {
                info!(
                    %peer_id,
                    endpoint = %endpoint.get_remote_address(),
                    num_established,
                    "Connection established"
                );
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                cause,
                num_established,
                ..
            } => {
                info!(%peer_id, num_established, cause = ?cause, "Connection closed");
            }
            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => match peer_id {
                Some(peer_id) => warn!(%peer_id, %error, "Outgoing connection error"),
                None => warn!(%error, "Outgoing connection error (unknown peer)"),
            },
            SwarmEvent::Behaviour(PlexusBehaviourEvent::Identify(event)) => {
                self.handle_identify_event(event).await;
            }
            SwarmEvent::Behaviour(PlexusBehaviourEvent::Ping(ping::Event { peer, result, .. })) => {
                match result {
                    Ok(rtt) => debug!(%peer, ?rtt, "Ping success"),
                    Err(e) => warn!(%peer, %e, "Ping failed"),
                }
            }
            _ => {}
        }
    }

    async fn handle_identify_event(&mut self, event: identify::Event) {
        if let identify::Event::Error { peer_id, error, .. } = &event {
            warn!(%peer_id, %error, "Identify error");
            return;
        }

        let Some(update) = PeerUpdate::from_identify(&event) else {
            return;
        };

        debug!(
            peer_id = %update.peer_id,
            protocols = update.protocols.len(),
            "Received identify info"
        );
        self.sink.deliver(update).await;
    }
}
