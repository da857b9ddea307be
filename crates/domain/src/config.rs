pub mod dnssec;
pub mod errors;
pub mod logging;
pub mod proxy;
pub mod root;

pub use dnssec::{DnssecConfig, TrustAnchorConfig};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use proxy::{ProxyConfig, MAX_INPUT_INTERFACES, MIN_MESSAGE_SIZE};
pub use root::Config;
