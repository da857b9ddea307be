use super::algorithm_name;
use crate::dns_name::DomainName;
use crate::dns_record::RecordType;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrsigData {
    pub type_covered: RecordType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub signature_expiration: u32,
    pub signature_inception: u32,
    pub key_tag: u16,
    pub signer_name: DomainName,
    pub signature: Vec<u8>,
}

impl RrsigData {
    pub fn is_valid_at(&self, now: u32) -> bool {
        now >= self.signature_inception && now <= self.signature_expiration
    }
}

impl fmt::Display for RrsigData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RRSIG({}, algo={}, tag={}, signer={})",
            self.type_covered,
            algorithm_name(self.algorithm),
            self.key_tag,
            self.signer_name
        )
    }
}
