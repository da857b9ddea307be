use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnssecConfig {
    /// Seed the store with the IANA root KSK-2017 anchor.
    #[serde(default = "default_true")]
    pub include_root_anchor: bool,

    #[serde(default)]
    pub trust_anchors: Vec<TrustAnchorConfig>,
}

impl Default for DnssecConfig {
    fn default() -> Self {
        Self {
            include_root_anchor: true,
            trust_anchors: Vec::new(),
        }
    }
}

/// A DS-style trust anchor as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrustAnchorConfig {
    pub zone: String,
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    /// Hex encoded digest.
    pub digest: String,
    #[serde(default)]
    pub valid_from: u64,
    #[serde(default = "default_valid_until")]
    pub valid_until: u64,
}

impl TrustAnchorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zone.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Trust anchor zone cannot be empty".to_string(),
            ));
        }
        if self.digest.is_empty() || self.digest.len() % 2 != 0 {
            return Err(ConfigError::Validation(format!(
                "Trust anchor for {} has a malformed digest",
                self.zone
            )));
        }
        if self.valid_from > self.valid_until {
            return Err(ConfigError::Validation(format!(
                "Trust anchor for {} expires before it becomes valid",
                self.zone
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_valid_until() -> u64 {
    u64::from(u32::MAX)
}
