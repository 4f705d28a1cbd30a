//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser};
use libp2p::Multiaddr;

/// Plexus - groups connected peers by the protocols they advertise
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration.
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Path to a TOML configuration file. Defaults are used if it does not exist.
    #[arg(long, short, env = "PLEXUS_CONFIG", value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Network configuration.
    #[command(flatten)]
    pub(crate) network: NetworkArgs,

    /// Protocol index configuration.
    #[command(flatten)]
    pub(crate) protocols: ProtocolArgs,
}

/// Logging configuration.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// Silence all output.
    #[arg(short, long)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "plexus=debug,libp2p=info").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    pub(crate) filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub(crate) json: bool,
}

/// Network arguments. Unset values fall back to the config file.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Network")]
pub(crate) struct NetworkArgs {
    /// Address to listen on (repeatable).
    #[arg(long = "listen", value_name = "MULTIADDR")]
    pub(crate) listen_addrs: Vec<Multiaddr>,

    /// Peer to dial on startup (repeatable).
    #[arg(long = "dial", value_name = "MULTIADDR")]
    pub(crate) dial: Vec<Multiaddr>,
}

/// Protocol index arguments.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Protocols")]
pub(crate) struct ProtocolArgs {
    /// Do not feed the index from identify; updates must be applied by hand.
    #[arg(long = "protocols.manual")]
    pub(crate) manual: bool,

    /// Buffered protocol events per subscriber.
    #[arg(long = "protocols.event-capacity", value_name = "COUNT")]
    pub(crate) event_capacity: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "plexus",
            "-vv",
            "--listen",
            "/ip4/127.0.0.1/tcp/4001",
            "--dial",
            "/ip4/10.0.0.1/tcp/4001",
            "--protocols.manual",
            "--protocols.event-capacity",
            "32",
        ])
        .unwrap();

        assert_eq!(cli.logs.verbosity, 2);
        assert_eq!(cli.network.listen_addrs.len(), 1);
        assert_eq!(cli.network.dial.len(), 1);
        assert!(cli.protocols.manual);
        assert_eq!(cli.protocols.event_capacity, Some(32));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["plexus"]).unwrap();

        assert!(cli.config.is_none());
        assert!(!cli.logs.quiet);
        assert!(cli.network.listen_addrs.is_empty());
        assert!(!cli.protocols.manual);
        assert_eq!(cli.protocols.event_capacity, None);
    }
}
