use crate::dns_message::{MessageFlags, Rcode};
use crate::dns_name::DomainName;
use crate::dns_question::DnsQuestion;
use crate::dns_record::{RData, RecordType, ResourceRecord};
use crate::errors::DomainError;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Positive,
    /// Placeholder recording that the name or type does not exist.
    Negative,
}

/// Which denial records a negative chain is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    Nsec,
    Nsec3,
}

/// A record as the resolver cache holds it, with the auxiliary denial chain
/// and SOA it was received with.
#[derive(Debug, Clone)]
pub struct CachedRecord {
    pub record: ResourceRecord,
    pub kind: RecordKind,
    pub time_received: Instant,
    pub response_flags: MessageFlags,
    nsec: Vec<ResourceRecord>,
    soa: Option<ResourceRecord>,
}

impl CachedRecord {
    pub fn positive(record: ResourceRecord, time_received: Instant, response_flags: MessageFlags) -> Self {
        Self {
            record,
            kind: RecordKind::Positive,
            time_received,
            response_flags,
            nsec: Vec::new(),
            soa: None,
        }
    }

    pub fn negative(
        name: DomainName,
        rtype: RecordType,
        ttl: u32,
        time_received: Instant,
        response_flags: MessageFlags,
    ) -> Self {
        Self {
            record: ResourceRecord::new(name, rtype, ttl, RData::Unknown(Vec::new())),
            kind: RecordKind::Negative,
            time_received,
            response_flags,
            nsec: Vec::new(),
            soa: None,
        }
    }

    pub fn with_soa(mut self, soa: ResourceRecord) -> Self {
        self.soa = Some(soa);
        self
    }

    /// Attaches the denial chain after checking that it only holds NSEC,
    /// NSEC3, SOA and RRSIGs over those, with exactly one of NSEC or NSEC3.
    pub fn attach_nsec_chain(
        &mut self,
        chain: Vec<ResourceRecord>,
        rcode: Rcode,
    ) -> Result<(), DomainError> {
        if !matches!(rcode, Rcode::NoError | Rcode::NxDomain) {
            return Err(DomainError::InvalidNsecChain(format!(
                "denial records cannot accompany rcode {}",
                rcode
            )));
        }

        let mut nsecs_seen = false;
        let mut nsec3s_seen = false;
        for rr in &chain {
            match rr.rtype {
                RecordType::NSEC => nsecs_seen = true,
                RecordType::NSEC3 => nsec3s_seen = true,
                RecordType::SOA => {}
                RecordType::RRSIG => match rr.type_covered() {
                    Some(RecordType::NSEC | RecordType::NSEC3 | RecordType::SOA) => {}
                    covered => {
                        return Err(DomainError::InvalidNsecChain(format!(
                            "RRSIG covering {:?} in denial chain of {}",
                            covered, self.record.name
                        )))
                    }
                },
                other => {
                    return Err(DomainError::InvalidNsecChain(format!(
                        "{} record {} in denial chain",
                        other, rr.name
                    )))
                }
            }
        }

        if nsecs_seen == nsec3s_seen {
            return Err(DomainError::InvalidNsecChain(format!(
                "expected exactly one of NSEC or NSEC3 (nsec={}, nsec3={})",
                nsecs_seen, nsec3s_seen
            )));
        }

        self.nsec = chain;
        Ok(())
    }

    pub fn nsec_chain(&self) -> &[ResourceRecord] {
        &self.nsec
    }

    pub fn soa(&self) -> Option<&ResourceRecord> {
        self.soa.as_ref()
    }

    pub fn denial_kind(&self) -> Option<DenialKind> {
        self.nsec.iter().find_map(|rr| match rr.rtype {
            RecordType::NSEC => Some(DenialKind::Nsec),
            RecordType::NSEC3 => Some(DenialKind::Nsec3),
            _ => None,
        })
    }

    pub fn is_negative(&self) -> bool {
        self.kind == RecordKind::Negative
    }

    pub fn rcode(&self) -> Rcode {
        self.response_flags.rcode()
    }

    pub fn elapsed_secs(&self, now: Instant) -> u32 {
        let secs = now.saturating_duration_since(self.time_received).as_secs();
        u32::try_from(secs).unwrap_or(u32::MAX)
    }

    pub fn remaining_ttl(&self, now: Instant) -> u32 {
        self.record.remaining_ttl(self.elapsed_secs(now))
    }

    /// Whether this record belongs in the answer to `question`. Name and
    /// class must match; the type must match, be a CNAME, or be an RRSIG
    /// over the queried type for DNSSEC-aware clients. Negative entries only
    /// match their own type.
    pub fn answers(&self, question: &DnsQuestion, dnssec_ok: bool) -> bool {
        if self.record.class != question.qclass || self.record.name != question.name {
            return false;
        }
        let rtype = self.record.rtype;
        if self.is_negative() {
            return rtype == question.qtype;
        }
        if rtype == question.qtype || question.qtype == RecordType::ANY || rtype == RecordType::CNAME {
            return true;
        }
        dnssec_ok && rtype == RecordType::RRSIG && self.record.type_covered() == Some(question.qtype)
    }
}

/// All cached records for one owner name.
#[derive(Debug, Clone)]
pub struct CacheGroup {
    pub name: DomainName,
    pub members: Vec<Arc<CachedRecord>>,
}

impl CacheGroup {
    pub fn new(name: DomainName) -> Self {
        Self {
            name,
            members: Vec::new(),
        }
    }

    pub fn push(&mut self, record: CachedRecord) -> Arc<CachedRecord> {
        let shared = Arc::new(record);
        self.members.push(Arc::clone(&shared));
        shared
    }
}
