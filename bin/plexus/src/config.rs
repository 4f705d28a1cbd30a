//! Node configuration handling.

use std::{fs, path::Path, time::Duration};

use eyre::{Result, WrapErr};
use libp2p::Multiaddr;
use plexus_net_protocol_grouper::ProtocolGrouperConfig;
use serde::{Deserialize, Serialize};

use crate::cli::{NetworkArgs, ProtocolArgs};

const DEFAULT_LISTEN_ADDR: &str = "/ip4/0.0.0.0/tcp/0";
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PING_INTERVAL_SECS: u64 = 15;

/// Configuration for the Plexus node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct NodeConfig {
    /// Network configuration
    #[serde(default)]
    pub(crate) network: NetworkConfig,

    /// Protocol index configuration
    #[serde(default)]
    pub(crate) protocols: ProtocolGrouperConfig,
}

/// Network configuration (TOML-serializable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct NetworkConfig {
    /// Listen addresses for incoming connections
    #[serde(default = "default_listen_addrs")]
    pub(crate) listen_addrs: Vec<Multiaddr>,

    /// Peers to dial on startup
    #[serde(default)]
    pub(crate) dial: Vec<Multiaddr>,

    /// Seconds before an idle connection is closed
    #[serde(default = "default_idle_timeout_secs")]
    pub(crate) idle_timeout_secs: u64,

    /// Seconds between pings to connected peers
    #[serde(default = "default_ping_interval_secs")]
    pub(crate) ping_interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addrs: default_listen_addrs(),
            dial: Vec::new(),
            idle_timeout_secs: default_idle_timeout_secs(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl NetworkConfig {
    pub(crate) fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub(crate) fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

fn default_listen_addrs() -> Vec<Multiaddr> {
    DEFAULT_LISTEN_ADDR.parse().into_iter().collect()
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

fn default_ping_interval_secs() -> u64 {
    DEFAULT_PING_INTERVAL_SECS
}

impl NodeConfig {
    /// Load the configuration from the given path, or create a default one if it doesn't exist.
    ///
    /// Without a path the defaults are used and nothing is written.
    pub(crate) fn load_or_create(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            let config = Self::default();
            config
                .save(path)
                .wrap_err_with(|| format!("failed to write config file {}", path.display()))?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }

    /// Save the configuration to the given path.
    pub(crate) fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Apply command line arguments to override the configuration.
    pub(crate) fn apply_cli_args(
        &mut self,
        network_args: &NetworkArgs,
        protocol_args: &ProtocolArgs,
    ) {
        if !network_args.listen_addrs.is_empty() {
            self.network.listen_addrs = network_args.listen_addrs.clone();
        }
        self.network.dial.extend(network_args.dial.iter().cloned());

        if protocol_args.manual {
            self.protocols.auto_subscribe = false;
        }
        if let Some(capacity) = protocol_args.event_capacity {
            self.protocols.event_capacity = capacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plexus.toml");
        let config = NodeConfig::load_or_create(Some(&path)).unwrap();

        assert!(path.exists());
        assert!(config.protocols.auto_subscribe);
        assert_eq!(config.network.listen_addrs.len(), 1);
        assert_eq!(config.network.idle_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_no_path_uses_defaults() {
        let config = NodeConfig::load_or_create(None).unwrap();
        assert!(config.network.dial.is_empty());
        assert_eq!(config.protocols, ProtocolGrouperConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plexus.toml");
        fs::write(
            &path,
            r#"
[network]
dial = ["/ip4/10.0.0.1/tcp/4001"]

[protocols]
auto_subscribe = false
"#,
        )
        .unwrap();

        let config = NodeConfig::load_or_create(Some(&path)).unwrap();
        assert_eq!(config.network.dial.len(), 1);
        assert_eq!(config.network.ping_interval(), Duration::from_secs(15));
        assert!(!config.protocols.auto_subscribe);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plexus.toml");
        fs::write(&path, "protocols = 3").unwrap();

        assert!(NodeConfig::load_or_create(Some(&path)).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/plexus.toml");

        let mut config = NodeConfig::default();
        config.protocols.event_capacity = 16;
        config.save(&path).unwrap();

        let loaded = NodeConfig::load_or_create(Some(&path)).unwrap();
        assert_eq!(loaded.protocols, config.protocols);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NodeConfig::default();
        let network = NetworkArgs {
            listen_addrs: vec!["/ip4/127.0.0.1/tcp/4001".parse().unwrap()],
            dial: vec!["/ip4/10.0.0.2/tcp/4001".parse().unwrap()],
        };
        let protocols = ProtocolArgs {
            manual: true,
            event_capacity: Some(8),
        };

        config.apply_cli_args(&network, &protocols);

        assert_eq!(config.network.listen_addrs, network.listen_addrs);
        assert_eq!(config.network.dial, network.dial);
        assert!(!config.protocols.auto_subscribe);
        assert_eq!(config.protocols.event_capacity, 8);
    }
}
