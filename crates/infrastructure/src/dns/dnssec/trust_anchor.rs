use super::crypto::dnskey_digest;
use data_encoding::HEXLOWER_PERMISSIVE;
use ferrous_dnsproxy_domain::config::TrustAnchorConfig;
use ferrous_dnsproxy_domain::dns_record::rdata::{digest_length, DnskeyData, DsData, DIGEST_SHA256};
use ferrous_dnsproxy_domain::{DomainError, DomainName};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Root KSK-2017, key tag 20326, as published by IANA.
const ROOT_KSK_20326_DIGEST: &str =
    "e06d44b80b8f1d39a95c0b0d7c65d08458e880409bbc683457104237c7f8ec8d";

const SUPPORTED_ALGORITHMS: [u8; 7] = [5, 7, 8, 10, 13, 14, 15];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pub zone: DomainName,
    pub ds: DsData,
    /// UNIX seconds.
    pub valid_from: u64,
    pub valid_until: u64,
}

impl TrustAnchor {
    pub fn new(zone: DomainName, ds: DsData) -> Self {
        Self {
            zone,
            ds,
            valid_from: 0,
            valid_until: u64::from(u32::MAX),
        }
    }

    pub fn with_validity(mut self, valid_from: u64, valid_until: u64) -> Self {
        self.valid_from = valid_from;
        self.valid_until = valid_until;
        self
    }

    pub fn from_config(config: &TrustAnchorConfig) -> Result<Self, DomainError> {
        let zone: DomainName = config.zone.parse()?;
        let digest = HEXLOWER_PERMISSIVE
            .decode(config.digest.as_bytes())
            .map_err(|e| DomainError::InvalidTrustAnchor(format!("{}: {}", config.zone, e)))?;
        Ok(Self::new(
            zone,
            DsData {
                key_tag: config.key_tag,
                algorithm: config.algorithm,
                digest_type: config.digest_type,
                digest,
            },
        )
        .with_validity(config.valid_from, config.valid_until))
    }

    pub fn root() -> Result<Self, DomainError> {
        let digest = HEXLOWER_PERMISSIVE
            .decode(ROOT_KSK_20326_DIGEST.as_bytes())
            .map_err(|e| DomainError::InvalidTrustAnchor(e.to_string()))?;
        Ok(Self::new(
            DomainName::root(),
            DsData {
                key_tag: 20326,
                algorithm: 8,
                digest_type: DIGEST_SHA256,
                digest,
            },
        ))
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        now >= self.valid_from && now <= self.valid_until
    }

    pub fn validate(&self, now: u64) -> Result<(), DomainError> {
        let expected = digest_length(self.ds.digest_type).ok_or_else(|| {
            DomainError::InvalidTrustAnchor(format!(
                "{}: unsupported digest type {}",
                self.zone, self.ds.digest_type
            ))
        })?;
        if self.ds.digest.len() != expected {
            return Err(DomainError::InvalidTrustAnchor(format!(
                "{}: digest is {} octets, expected {}",
                self.zone,
                self.ds.digest.len(),
                expected
            )));
        }
        if !SUPPORTED_ALGORITHMS.contains(&self.ds.algorithm) {
            return Err(DomainError::UnsupportedAlgorithm(self.ds.algorithm));
        }
        if !self.is_valid_at(now) {
            return Err(DomainError::InvalidTrustAnchor(format!(
                "{}: not valid at {}",
                self.zone, now
            )));
        }
        Ok(())
    }

    /// Whether `dnskey`, owned by this anchor's zone, hashes to the anchor's digest.
    pub fn matches_dnskey(&self, dnskey: &DnskeyData) -> bool {
        if dnskey.key_tag() != self.ds.key_tag || dnskey.algorithm != self.ds.algorithm {
            return false;
        }
        dnskey_digest(dnskey, &self.zone, self.ds.digest_type)
            .map(|digest| digest == self.ds.digest)
            .unwrap_or(false)
    }

    fn same_key(&self, other: &TrustAnchor) -> bool {
        self.zone == other.zone
            && self.ds.key_tag == other.ds.key_tag
            && self.ds.algorithm == other.ds.algorithm
            && self.ds.digest_type == other.ds.digest_type
            && self.ds.digest == other.ds.digest
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrustAnchorStore {
    anchors: Vec<TrustAnchor>,
}

impl TrustAnchorStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A store seeded with the root anchor.
    pub fn with_root() -> Result<Self, DomainError> {
        let mut store = Self::empty();
        store.add(TrustAnchor::root()?);
        Ok(store)
    }

    pub fn from_config(config: &ferrous_dnsproxy_domain::config::DnssecConfig) -> Result<Self, DomainError> {
        let mut store = if config.include_root_anchor {
            Self::with_root()?
        } else {
            Self::empty()
        };
        for anchor in &config.trust_anchors {
            store.add(TrustAnchor::from_config(anchor)?);
        }
        info!(anchors = store.len(), "trust anchors loaded");
        Ok(store)
    }

    /// Returns false when an identical anchor is already present.
    pub fn add(&mut self, anchor: TrustAnchor) -> bool {
        if self.anchors.iter().any(|a| a.same_key(&anchor)) {
            debug!(zone = %anchor.zone, key_tag = anchor.ds.key_tag, "duplicate trust anchor ignored");
            return false;
        }
        self.anchors.push(anchor);
        true
    }

    /// Removes every anchor for `zone`, returning how many went.
    pub fn delete(&mut self, zone: &DomainName) -> usize {
        let before = self.anchors.len();
        self.anchors.retain(|a| &a.zone != zone);
        before - self.anchors.len()
    }

    /// The valid anchor whose zone shares the most trailing labels with
    /// `name`, falling back to a root anchor.
    pub fn find(&self, name: &DomainName, now: u64) -> Option<&TrustAnchor> {
        let mut best: Option<&TrustAnchor> = None;
        for anchor in self.anchors.iter().filter(|a| a.is_valid_at(now)) {
            if !name.ends_with(&anchor.zone) {
                continue;
            }
            let better = best.map_or(true, |b| anchor.zone.label_count() > b.zone.label_count());
            if better {
                best = Some(anchor);
            }
        }
        best.or_else(|| self.anchors.iter().find(|a| a.zone.is_root()))
    }

    pub fn find_now(&self, name: &DomainName) -> Option<&TrustAnchor> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.find(name, now)
    }

    pub fn anchors(&self) -> &[TrustAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
