//! Protocol grouper lifecycle: owns the index and, when subscribed, the task feeding it.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use plexus_net_protocol_index::{
    NetPeerId, PeerProtocolIndex, ProtocolEvent, ProtocolEventEmitter,
};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ProtocolGrouperConfig;
use crate::error::GrouperError;
use crate::update::PeerUpdate;

/// Background task draining the update source, with its shutdown signal.
#[derive(Debug)]
struct UpdateTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
enum State {
    Stopped,
    /// Started with `auto_subscribe` disabled; updates arrive through `apply`.
    Manual,
    Subscribed(UpdateTask),
}

/// Groups peers by advertised protocol.
///
/// The index is created empty with the service and shared through [`Self::index`]; it outlives
/// `stop`, so queries keep working after the source is gone.
#[derive(Debug)]
pub struct ProtocolGrouper<Id: NetPeerId> {
    index: Arc<PeerProtocolIndex<Id>>,
    config: ProtocolGrouperConfig,
    state: State,
}

impl<Id: NetPeerId> ProtocolGrouper<Id> {
    pub fn new(config: ProtocolGrouperConfig) -> Self {
        let events = ProtocolEventEmitter::with_capacity(config.event_capacity.max(1));
        Self {
            index: Arc::new(PeerProtocolIndex::with_emitter(events)),
            config,
            state: State::Stopped,
        }
    }

    pub fn config(&self) -> &ProtocolGrouperConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<PeerProtocolIndex<Id>> {
        &self.index
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProtocolEvent<Id>> {
        self.index.subscribe()
    }

    /// False once stopped, or once the update task exited because its source ended.
    pub fn is_running(&self) -> bool {
        match &self.state {
            State::Stopped => false,
            State::Manual => true,
            State::Subscribed(task) => !task.handle.is_finished(),
        }
    }

    /// Feed one update into the index directly. Returns the number of new associations.
    pub fn apply(&self, update: PeerUpdate<Id>) -> usize {
        apply_update(&self.index, update)
    }

    /// Start the service.
    ///
    /// With `auto_subscribe` enabled, `source` is drained on a spawned task until it ends or
    /// [`Self::stop`] is called. Otherwise the source is dropped and the host is expected to
    /// drive the index through [`Self::apply`]. A service whose source already ended can be
    /// started again without a `stop`. Must be called within a tokio runtime.
    pub fn start<S>(&mut self, source: S) -> Result<(), GrouperError>
    where
        S: Stream<Item = PeerUpdate<Id>> + Send + 'static,
    {
        if self.is_running() {
            return Err(GrouperError::AlreadyRunning);
        }
        if let State::Subscribed(_) = std::mem::replace(&mut self.state, State::Stopped) {
            debug!("Replacing finished update task");
        }

        if !self.config.auto_subscribe {
            info!("Protocol grouper started in manual mode");
            self.state = State::Manual;
            return Ok(());
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let index = Arc::clone(&self.index);
        let handle = tokio::spawn(run_updates(index, source, shutdown_rx));

        info!("Protocol grouper subscribed to peer updates");
        self.state = State::Subscribed(UpdateTask { shutdown, handle });
        Ok(())
    }

    /// Stop the service, waiting for the update task to exit.
    pub async fn stop(&mut self) -> Result<(), GrouperError> {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Stopped => Err(GrouperError::NotRunning),
            State::Manual => {
                info!("Protocol grouper stopped");
                Ok(())
            }
            State::Subscribed(UpdateTask { shutdown, handle }) => {
                // The task may have exited already if the source ended.
                let _ = shutdown.send(());
                handle.await?;
                info!(
                    peers = self.index.peer_count(),
                    protocols = self.index.protocol_count(),
                    "Protocol grouper stopped"
                );
                Ok(())
            }
        }
    }
}

fn apply_update<Id: NetPeerId>(index: &PeerProtocolIndex<Id>, update: PeerUpdate<Id>) -> usize {
    let PeerUpdate { peer_id, protocols } = update;
    index.update(peer_id, protocols)
}

async fn run_updates<Id, S>(
    index: Arc<PeerProtocolIndex<Id>>,
    source: S,
    mut shutdown: oneshot::Receiver<()>,
) where
    Id: NetPeerId,
    S: Stream<Item = PeerUpdate<Id>> + Send + 'static,
{
    let mut source = std::pin::pin!(source);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Update task received shutdown");
                break;
            }
            update = source.next() => match update {
                Some(update) => {
                    apply_update(&index, update);
                }
                None => {
                    debug!("Peer update source closed");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    use super::*;

    fn update(peer: &str, protocols: &[&str]) -> PeerUpdate<String> {
        PeerUpdate::new(peer.to_string(), protocols.iter().copied())
    }

    #[tokio::test]
    async fn test_auto_subscribe_applies_streamed_updates() {
        let mut grouper = ProtocolGrouper::new(ProtocolGrouperConfig::default());
        let mut events = grouper.subscribe();
        let (tx, rx) = mpsc::channel(8);

        grouper.start(ReceiverStream::new(rx)).unwrap();
        assert!(grouper.is_running());

        tx.send(update("peerA", &["/chat/1.0", "/file/1.0"])).await.unwrap();
        tx.send(update("peerB", &["/chat/1.0"])).await.unwrap();

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();
            seen.insert((event.peer().clone(), event.protocol().to_string()));
        }
        assert!(seen.contains(&("peerB".to_string(), "/chat/1.0".to_string())));

        grouper.stop().await.unwrap();
        assert!(!grouper.is_running());

        let peers: HashSet<_> = grouper
            .index()
            .peers_with_protocol("/chat/1.0")
            .into_iter()
            .collect();
        assert_eq!(peers, HashSet::from(["peerA".to_string(), "peerB".to_string()]));
    }

    #[tokio::test]
    async fn test_source_end_then_stop() {
        let mut grouper = ProtocolGrouper::new(ProtocolGrouperConfig::default());

        grouper
            .start(futures::stream::iter(vec![update("peerA", &["/x"])]))
            .unwrap();

        // Stop after the finite source has been fully drained.
        let mut events = grouper.subscribe();
        if grouper.index().is_empty() {
            let _ = tokio::time::timeout(Duration::from_secs(5), events.recv()).await;
        }
        grouper.stop().await.unwrap();

        assert!(grouper.index().contains(&"peerA".to_string(), "/x"));
    }

    #[tokio::test]
    async fn test_finished_source_allows_restart() {
        let mut grouper = ProtocolGrouper::new(ProtocolGrouperConfig::default());

        grouper
            .start(futures::stream::iter(vec![update("peerA", &["/x"])]))
            .unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while grouper.is_running() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(grouper.index().contains(&"peerA".to_string(), "/x"));

        grouper
            .start(futures::stream::iter(vec![update("peerB", &["/x"])]))
            .unwrap();
        let mut events = grouper.subscribe();
        if !grouper.index().contains(&"peerB".to_string(), "/x") {
            let _ = tokio::time::timeout(Duration::from_secs(5), events.recv()).await;
        }
        assert_eq!(grouper.index().peer_count_for("/x"), 2);

        // A finished task still needs reaping.
        grouper.stop().await.unwrap();
        assert_matches!(grouper.stop().await, Err(GrouperError::NotRunning));
    }

    #[tokio::test]
    async fn test_manual_mode_ignores_source() {
        let mut grouper = ProtocolGrouper::new(ProtocolGrouperConfig::manual());
        let (tx, rx) = mpsc::channel(8);

        grouper.start(ReceiverStream::new(rx)).unwrap();
        assert!(grouper.is_running());

        // Receiver was dropped with the source.
        assert!(tx.send(update("peerA", &["/x"])).await.is_err());
        assert!(grouper.index().is_empty());

        assert_eq!(grouper.apply(update("peerA", &["/x", "/y"])), 2);
        assert_eq!(grouper.index().protocols_of_peer(&"peerA".to_string()).len(), 2);

        grouper.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_lifecycle_errors() {
        let mut grouper = ProtocolGrouper::<String>::new(ProtocolGrouperConfig::default());

        assert_matches!(grouper.stop().await, Err(GrouperError::NotRunning));

        grouper.start(futures::stream::pending()).unwrap();
        assert_matches!(
            grouper.start(futures::stream::pending()),
            Err(GrouperError::AlreadyRunning)
        );

        grouper.stop().await.unwrap();
        assert_matches!(grouper.stop().await, Err(GrouperError::NotRunning));

        // Can be restarted after a stop; the index is kept.
        grouper.start(futures::stream::pending()).unwrap();
        grouper.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_index_survives_stop() {
        let mut grouper = ProtocolGrouper::new(ProtocolGrouperConfig::manual());
        grouper.start(futures::stream::empty()).unwrap();
        grouper.apply(update("peerA", &["/x"]));
        grouper.stop().await.unwrap();

        assert_eq!(grouper.index().peers_with_protocol("/x"), vec!["peerA".to_string()]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let config = ProtocolGrouperConfig {
            event_capacity: 0,
            ..Default::default()
        };
        let grouper = ProtocolGrouper::<u64>::new(config);
        let mut rx = grouper.subscribe();

        grouper.apply(PeerUpdate::new(1, ["/x"]));
        assert_eq!(*rx.try_recv().unwrap().peer(), 1);
    }
}
