//! Logging configuration for the Plexus node.

use eyre::{Result, eyre};
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::cli::LogArgs;

/// Install the global subscriber: human-readable lines by default, JSON with `--log.json`.
pub(crate) fn init_logging(args: &LogArgs) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_filter(args))
        .with(args.json.then(|| fmt::layer().json()))
        .with((!args.json).then(|| fmt::layer().without_time()))
        .try_init()
        .map_err(|e| eyre!("failed to initialize logging: {e}"))
}

/// Level implied by `-v` repetitions.
fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// `--quiet` pins the filter to errors. Otherwise `RUST_LOG` is honoured, falling back to
/// the verbosity level, and every valid `--log.filter` directive is layered on top.
fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::default().add_directive(LevelFilter::ERROR.into());
    }

    let base = EnvFilter::builder()
        .with_default_directive(verbosity_level(args.verbosity).into())
        .from_env_lossy();

    args.filter
        .iter()
        .flat_map(|directives| directives.split(','))
        .filter_map(|directive| directive.trim().parse().ok())
        .fold(base, EnvFilter::add_directive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_verbosity() {
        let args = LogArgs {
            quiet: true,
            verbosity: 3,
            filter: Some("plexus=trace".to_string()),
            ..Default::default()
        };
        assert_eq!(build_filter(&args).max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(verbosity_level(0), LevelFilter::INFO);
        assert_eq!(verbosity_level(1), LevelFilter::DEBUG);
        assert_eq!(verbosity_level(5), LevelFilter::TRACE);
    }

    #[test]
    fn test_custom_directives_are_added() {
        let args = LogArgs {
            filter: Some("plexus=trace, libp2p_swarm=warn".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&args).to_string();
        assert!(filter.contains("plexus=trace"));
        assert!(filter.contains("libp2p_swarm=warn"));
    }
}
