use super::algorithm_name;
use crate::errors::DomainError;
use std::fmt;

pub const DIGEST_SHA1: u8 = 1;
pub const DIGEST_SHA256: u8 = 2;
pub const DIGEST_SHA384: u8 = 4;

/// Expected digest length for a DS digest type, if the type is known.
pub fn digest_length(digest_type: u8) -> Option<usize> {
    match digest_type {
        DIGEST_SHA1 => Some(20),
        DIGEST_SHA256 => Some(32),
        DIGEST_SHA384 => Some(48),
        _ => None,
    }
}

pub fn digest_type_name(digest_type: u8) -> &'static str {
    match digest_type {
        DIGEST_SHA1 => "SHA-1",
        DIGEST_SHA256 => "SHA-256",
        DIGEST_SHA384 => "SHA-384",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsData {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

impl DsData {
    /// Rejects digests whose length does not match a known digest type.
    pub fn new(
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Vec<u8>,
    ) -> Result<Self, DomainError> {
        if let Some(expected) = digest_length(digest_type) {
            if digest.len() != expected {
                return Err(DomainError::MalformedRecord(format!(
                    "Invalid digest length for type {}: got {}, expected {}",
                    digest_type,
                    digest.len(),
                    expected
                )));
            }
        }

        Ok(Self {
            key_tag,
            algorithm,
            digest_type,
            digest,
        })
    }
}

impl fmt::Display for DsData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DS(tag={}, algo={}, digest={})",
            self.key_tag,
            algorithm_name(self.algorithm),
            digest_type_name(self.digest_type)
        )
    }
}
