use super::wire::ParsedMessage;
use ferrous_dnsproxy_domain::{
    CacheGroup, CachedRecord, DomainError, DomainName, Rcode, RecordType, ResourceRecord,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// In-memory record store keyed by owner name, shaped like the resolver
/// cache the proxy reads from.
#[derive(Debug, Default)]
pub struct MemoryRecordCache {
    groups: FxHashMap<DomainName, CacheGroup>,
}

impl MemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, name: &DomainName) -> Option<&CacheGroup> {
        self.groups.get(name)
    }

    pub fn insert(&mut self, record: CachedRecord) -> Arc<CachedRecord> {
        let name = record.record.name.clone();
        self.groups
            .entry(name.clone())
            .or_insert_with(|| CacheGroup::new(name))
            .push(record)
    }

    /// Number of cached records across all names.
    pub fn len(&self) -> usize {
        self.groups.values().map(|g| g.members.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Drops records whose TTL ran out by `now`. Returns how many went.
    pub fn remove_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        self.groups.retain(|_, group| {
            let before = group.members.len();
            group
                .members
                .retain(|r| !r.record.is_expired(r.elapsed_secs(now)));
            removed += before - group.members.len();
            !group.members.is_empty()
        });
        removed
    }

    /// Caches the answers of an upstream response and, when the question's
    /// type is missing at the end of its CNAME chain, a negative entry
    /// carrying the authority section's denial records and SOA.
    pub fn ingest(
        &mut self,
        message: &ParsedMessage,
        now: Instant,
    ) -> Result<Vec<Arc<CachedRecord>>, DomainError> {
        let question = message.questions.first().ok_or_else(|| {
            DomainError::InvalidDnsResponse("response carries no question".to_string())
        })?;
        let flags = message.header.flags;
        let mut inserted = Vec::with_capacity(message.answers.len() + 1);

        for rr in &message.answers {
            inserted.push(self.insert(CachedRecord::positive(rr.clone(), now, flags)));
        }

        let target = follow_cnames(&question.name, question.qtype, &message.answers);
        let answered = message
            .answers
            .iter()
            .any(|rr| rr.name == target && (rr.rtype == question.qtype || question.qtype == RecordType::ANY));
        let rcode = flags.rcode();
        if answered || !matches!(rcode, Rcode::NoError | Rcode::NxDomain) {
            return Ok(inserted);
        }

        let soa = message
            .authorities
            .iter()
            .find(|rr| rr.rtype == RecordType::SOA)
            .cloned();
        let ttl = soa
            .as_ref()
            .and_then(|rr| rr.as_soa().map(|data| rr.ttl.min(data.minimum)))
            .unwrap_or(0);

        let mut negative = CachedRecord::negative(target.clone(), question.qtype, ttl, now, flags);
        let chain: Vec<ResourceRecord> = message
            .authorities
            .iter()
            .filter(|rr| {
                matches!(
                    rr.rtype,
                    RecordType::NSEC | RecordType::NSEC3 | RecordType::SOA | RecordType::RRSIG
                )
            })
            .cloned()
            .collect();
        if chain
            .iter()
            .any(|rr| matches!(rr.rtype, RecordType::NSEC | RecordType::NSEC3))
        {
            if let Err(e) = negative.attach_nsec_chain(chain, rcode) {
                debug!(name = %target, error = %e, "denial chain not cached");
            }
        }
        if let Some(soa) = soa {
            negative = negative.with_soa(soa);
        }

        debug!(name = %target, qtype = %question.qtype, rcode = %rcode, ttl, "negative answer cached");
        inserted.push(self.insert(negative));
        Ok(inserted)
    }
}

fn follow_cnames(name: &DomainName, qtype: RecordType, answers: &[ResourceRecord]) -> DomainName {
    let mut current = name.clone();
    if qtype == RecordType::CNAME {
        return current;
    }
    for _ in 0..answers.len() {
        let next = answers
            .iter()
            .find(|rr| rr.name == current && rr.rtype == RecordType::CNAME)
            .and_then(ResourceRecord::cname_target);
        match next {
            Some(target) => current = target.clone(),
            None => break,
        }
    }
    current
}
