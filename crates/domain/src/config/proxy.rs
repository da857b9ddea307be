use serde::{Deserialize, Serialize};

/// Number of input interfaces the proxy can listen on.
pub const MAX_INPUT_INTERFACES: usize = 5;

/// Classic UDP payload limit for clients that send no EDNS0 OPT record.
pub const MIN_MESSAGE_SIZE: usize = 512;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Interface indexes queries are accepted on. Index 0 never matches.
    #[serde(default)]
    pub input_interfaces: Vec<u32>,

    /// Interface index upstream queries are bound to.
    #[serde(default)]
    pub output_interface: u32,

    /// Largest message the proxy will build, over UDP or TCP.
    #[serde(default = "default_absolute_max_message_size")]
    pub absolute_max_message_size: usize,

    #[serde(default = "default_validation_timeout_secs")]
    pub validation_timeout_secs: u64,

    #[serde(default = "default_max_cname_hops")]
    pub max_cname_hops: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            input_interfaces: Vec::new(),
            output_interface: 0,
            absolute_max_message_size: default_absolute_max_message_size(),
            validation_timeout_secs: default_validation_timeout_secs(),
            max_cname_hops: default_max_cname_hops(),
        }
    }
}

fn default_absolute_max_message_size() -> usize {
    8940
}

fn default_validation_timeout_secs() -> u64 {
    5
}

fn default_max_cname_hops() -> usize {
    10
}
