use ferrous_dnsproxy_domain::config::LoggingConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the configured
/// level. Returns false when a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = build_filter(config);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if config.is_json() {
        subscriber.json().try_init()
    } else {
        subscriber.compact().try_init()
    };
    installed.is_ok()
}

/// The filter the subscriber would run with: `RUST_LOG` when set and valid,
/// the configured level otherwise.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let default_level = config
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}
