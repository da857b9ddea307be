use super::rdata::{Nsec3Data, NsecData, RData, RrsigData, SoaData};
use super::RecordType;
use crate::dns_name::DomainName;

pub const CLASS_IN: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,

    pub rtype: RecordType,

    pub class: u16,

    pub ttl: u32,

    pub rdata: RData,
}

impl ResourceRecord {
    pub fn new(name: DomainName, rtype: RecordType, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            rtype,
            class: CLASS_IN,
            ttl,
            rdata,
        }
    }

    pub fn is_expired(&self, elapsed_secs: u32) -> bool {
        elapsed_secs >= self.ttl
    }

    pub fn remaining_ttl(&self, elapsed_secs: u32) -> u32 {
        self.ttl.saturating_sub(elapsed_secs)
    }

    pub fn as_nsec(&self) -> Option<&NsecData> {
        match &self.rdata {
            RData::Nsec(nsec) => Some(nsec),
            _ => None,
        }
    }

    pub fn as_nsec3(&self) -> Option<&Nsec3Data> {
        match &self.rdata {
            RData::Nsec3(nsec3) => Some(nsec3),
            _ => None,
        }
    }

    pub fn as_rrsig(&self) -> Option<&RrsigData> {
        match &self.rdata {
            RData::Rrsig(rrsig) => Some(rrsig),
            _ => None,
        }
    }

    pub fn as_soa(&self) -> Option<&SoaData> {
        match &self.rdata {
            RData::Soa(soa) => Some(soa),
            _ => None,
        }
    }

    pub fn cname_target(&self) -> Option<&DomainName> {
        match &self.rdata {
            RData::Cname(target) => Some(target),
            _ => None,
        }
    }

    /// Type covered by an RRSIG, `None` for any other record.
    pub fn type_covered(&self) -> Option<RecordType> {
        self.as_rrsig().map(|sig| sig.type_covered)
    }
}
