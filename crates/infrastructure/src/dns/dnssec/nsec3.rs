//! Hashed authenticated denial (RFC 5155 §8).

use super::proof::{ProofError, ProofPlan};
use data_encoding::BASE32_DNSSEC;
use ferrous_dnsproxy_application::Nsec3Hasher;
use ferrous_dnsproxy_domain::dns_record::rdata::{Nsec3Data, NSEC3_HASH_SHA1};
use ferrous_dnsproxy_domain::{CacheGroup, DomainName, RecordType, ResourceRecord};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindMode {
    /// An NSEC3 whose owner hash equals the name's hash.
    ClosestEncloser,
    /// An NSEC3 whose hash range covers the name's hash.
    Covers,
    /// Walk up from the name looking for the closest encloser and the
    /// covering record of the next closer name.
    ClosestEncloserProof,
}

/// Result of [`Nsec3Chain::find`], as indexes into the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nsec3Match {
    pub closest: Option<usize>,
    pub closest_name: Option<DomainName>,
    pub closer: Option<usize>,
}

/// The NSEC3 records of a denial chain that share the parameters of the
/// first one.
pub struct Nsec3Chain<'a> {
    chain: &'a [ResourceRecord],
    params: &'a Nsec3Data,
    records: Vec<(usize, &'a ResourceRecord, &'a Nsec3Data)>,
}

/// Owner label against a base32hex hash: lengths first, then case-insensitively.
fn compare_hashed_label(label: &[u8], b32: &[u8]) -> Ordering {
    label.len().cmp(&b32.len()).then_with(|| {
        label
            .iter()
            .map(u8::to_ascii_lowercase)
            .cmp(b32.iter().map(u8::to_ascii_lowercase))
    })
}

/// Normal case: owner < hash < next. The last record of the chain wraps
/// around, so it covers anything above its owner or below its next hash.
pub fn covers_hash(owner_label: &[u8], nsec3: &Nsec3Data, hash: &[u8], b32: &[u8]) -> bool {
    let next = &nsec3.next_hashed_owner;
    if next.len() != hash.len() || owner_label.len() != b32.len() {
        return false;
    }

    let owner_vs_name = compare_hashed_label(owner_label, b32);
    let next_vs_name = next.as_slice().cmp(hash);
    if owner_vs_name == Ordering::Less && next_vs_name == Ordering::Greater {
        return true;
    }

    let next_b32 = BASE32_DNSSEC.encode(next);
    if next_b32.len() != b32.len() {
        return false;
    }
    compare_hashed_label(next_b32.as_bytes(), owner_label) != Ordering::Greater
        && (owner_vs_name == Ordering::Less || next_vs_name == Ordering::Greater)
}

impl<'a> Nsec3Chain<'a> {
    /// `None` when the chain holds no NSEC3.
    pub fn new(chain: &'a [ResourceRecord]) -> Option<Self> {
        let params = chain.iter().find_map(ResourceRecord::as_nsec3)?;
        let records = chain
            .iter()
            .enumerate()
            .filter_map(|(i, rr)| rr.as_nsec3().map(|data| (i, rr, data)))
            .filter(|(_, rr, data)| {
                let same = data.same_parameters(params);
                if !same {
                    debug!(owner = %rr.name, "ignoring NSEC3 with different parameters");
                }
                same
            })
            .collect();
        Some(Self {
            chain,
            params,
            records,
        })
    }

    pub fn params(&self) -> &Nsec3Data {
        self.params
    }

    pub fn record(&self, index: usize) -> &'a ResourceRecord {
        &self.chain[index]
    }

    fn data(&self, index: usize) -> Option<&'a Nsec3Data> {
        self.chain[index].as_nsec3()
    }

    pub fn opt_out(&self, index: usize) -> bool {
        self.data(index).is_some_and(Nsec3Data::opt_out)
    }

    pub fn check_algorithm(&self) -> Result<(), ProofError> {
        if self.params.hash_algorithm != NSEC3_HASH_SHA1 {
            return Err(ProofError::UnsupportedHash(self.params.hash_algorithm));
        }
        Ok(())
    }

    fn hash(&self, hasher: &dyn Nsec3Hasher, name: &DomainName) -> Option<Vec<u8>> {
        hasher.hash_name(
            name,
            self.params.hash_algorithm,
            &self.params.salt,
            self.params.iterations,
        )
    }

    pub fn find(&self, hasher: &dyn Nsec3Hasher, mode: FindMode, name: &DomainName) -> Option<Nsec3Match> {
        let walk = if mode == FindMode::ClosestEncloserProof {
            name.label_count()
        } else {
            0
        };
        // Covering record of the candidate one label below the current one
        let mut flag: Option<usize> = None;

        for skip in 0..=walk {
            let candidate = name.skip_leading_labels(skip);
            let Some(hash) = self.hash(hasher, &candidate) else {
                continue;
            };
            let b32 = BASE32_DNSSEC.encode(&hash);
            let mut matched = None;
            let mut covering = None;

            for &(index, rr, data) in &self.records {
                // The record's zone is its owner minus the hash label
                let zone = rr.name.skip_leading_labels(1);
                let placement = name.canonical_order(&zone);
                if !(placement.subdomain || placement.ordering == Ordering::Equal) {
                    continue;
                }
                let Some(owner_label) = rr.name.first_label() else {
                    continue;
                };

                if mode != FindMode::Covers
                    && compare_hashed_label(owner_label, b32.as_bytes()) == Ordering::Equal
                {
                    if mode == FindMode::ClosestEncloserProof {
                        if data.has_type(RecordType::DNAME) {
                            debug!(owner = %rr.name, "closest encloser is a DNAME");
                            return None;
                        }
                        if data.has_type(RecordType::NS) && !data.has_type(RecordType::SOA) {
                            debug!(owner = %rr.name, "closest encloser is a delegation");
                            return None;
                        }
                    }
                    matched = Some(index);
                    break;
                }

                if mode != FindMode::ClosestEncloser
                    && covering.is_none()
                    && covers_hash(owner_label, data, &hash, b32.as_bytes())
                {
                    if mode == FindMode::Covers {
                        return Some(Nsec3Match {
                            closer: Some(index),
                            ..Nsec3Match::default()
                        });
                    }
                    covering = Some(index);
                }
            }

            match (mode, matched) {
                (FindMode::ClosestEncloser, Some(index)) => {
                    return Some(Nsec3Match {
                        closest: Some(index),
                        closest_name: Some(candidate),
                        closer: None,
                    });
                }
                (FindMode::ClosestEncloserProof, Some(index)) => {
                    if flag.is_none() {
                        debug!(name = %candidate, "closest encloser without a covered next closer name");
                    }
                    return flag.map(|closer| Nsec3Match {
                        closest: Some(index),
                        closest_name: Some(candidate),
                        closer: Some(closer),
                    });
                }
                (FindMode::ClosestEncloserProof, None) => flag = covering,
                _ => {}
            }
        }
        None
    }

    /// The closest encloser and the record covering the next closer name.
    /// Fails when the closest encloser is the name itself.
    pub fn closest_encloser_proof(
        &self,
        hasher: &dyn Nsec3Hasher,
        name: &DomainName,
    ) -> Result<(usize, DomainName, usize), ProofError> {
        let found = self
            .find(hasher, FindMode::ClosestEncloserProof, name)
            .ok_or_else(|| ProofError::NoClosestEncloser(name.clone()))?;
        match (found.closest, found.closest_name, found.closer) {
            (Some(closest), Some(ce), Some(closer)) if &ce != name => Ok((closest, ce, closer)),
            _ => Err(ProofError::NoClosestEncloser(name.clone())),
        }
    }

    /// NODATA at the exact name: the hash matches, type and CNAME absent,
    /// and the record is from the right side of any zone cut.
    fn no_data_error(&self, hasher: &dyn Nsec3Hasher, name: &DomainName, qtype: RecordType) -> Option<usize> {
        let index = self.find(hasher, FindMode::ClosestEncloser, name)?.closest?;
        let data = self.data(index)?;
        types_absent_at(data, qtype).then_some(index)
    }
}

fn types_absent_at(data: &Nsec3Data, qtype: RecordType) -> bool {
    if data.has_type(qtype) || data.has_type(RecordType::CNAME) {
        return false;
    }
    if qtype == RecordType::DS {
        !data.has_type(RecordType::SOA)
    } else {
        !(data.has_type(RecordType::NS) && !data.has_type(RecordType::SOA))
    }
}

/// Each distinct record once, wildcard first, then next closer, then
/// closest encloser.
fn collapse(
    chain: &Nsec3Chain<'_>,
    closest: Option<usize>,
    closer: Option<usize>,
    wildcard: Option<usize>,
    opt_out: bool,
) -> ProofPlan {
    let mut closest = closest;
    let mut closer = closer;
    if closest.is_some() && closest == closer {
        closest = None;
    }
    if closer.is_some() && closer == wildcard {
        closer = None;
    }
    if closest.is_some() && closest == wildcard {
        closest = None;
    }

    let mut plan = ProofPlan {
        opt_out,
        ..ProofPlan::default()
    };
    for index in [wildcard, closer, closest].into_iter().flatten() {
        plan.push(chain.record(index));
    }
    plan
}

pub fn plan_name_error(
    chain: &[ResourceRecord],
    name: &DomainName,
    hasher: &dyn Nsec3Hasher,
) -> Result<ProofPlan, ProofError> {
    let nsec3 = Nsec3Chain::new(chain).ok_or(ProofError::MissingChain)?;
    nsec3.check_algorithm()?;

    let (closest, ce, closer) = nsec3.closest_encloser_proof(hasher, name)?;
    let wildcard = ce.wildcard_child()?;
    let wildcard_cover = nsec3
        .find(hasher, FindMode::Covers, &wildcard)
        .and_then(|found| found.closer)
        .ok_or(ProofError::WildcardNotDisproven(name.clone()))?;

    let opt_out = nsec3.opt_out(closer);
    debug!(name = %name, closest_encloser = %ce, opt_out, "NSEC3 name error proof planned");
    Ok(collapse(&nsec3, Some(closest), Some(closer), Some(wildcard_cover), opt_out))
}

pub fn plan_no_data(
    chain: &[ResourceRecord],
    name: &DomainName,
    qtype: RecordType,
    hasher: &dyn Nsec3Hasher,
) -> Result<ProofPlan, ProofError> {
    let nsec3 = Nsec3Chain::new(chain).ok_or(ProofError::MissingChain)?;
    nsec3.check_algorithm()?;

    if let Some(index) = nsec3.no_data_error(hasher, name, qtype) {
        debug!(name = %name, qtype = %qtype, "NSEC3 matches the name with the type absent");
        let mut plan = ProofPlan::default();
        plan.push(nsec3.record(index));
        return Ok(plan);
    }

    let (closest, ce, closer) = nsec3.closest_encloser_proof(hasher, name)?;
    let wildcard = ce.wildcard_child()?;
    let wildcard_match = nsec3
        .find(hasher, FindMode::ClosestEncloser, &wildcard)
        .and_then(|found| found.closest);

    let mut opt_out = false;
    match wildcard_match {
        None => {
            if !nsec3.opt_out(closer) {
                return Err(ProofError::TypeNotDisproven {
                    name: name.clone(),
                    qtype,
                });
            }
            debug!(name = %name, "next closer record has opt-out set");
            opt_out = true;
        }
        Some(index) => {
            let absent = nsec3.data(index).is_some_and(|data| types_absent_at(data, qtype));
            if !absent {
                return Err(ProofError::TypeNotDisproven {
                    name: wildcard,
                    qtype,
                });
            }
        }
    }

    Ok(collapse(&nsec3, Some(closest), Some(closer), wildcard_match, opt_out))
}

/// A wildcard expansion is only valid if the next closer name of the
/// original name does not exist.
pub fn plan_wildcard_answer(
    chain: &[ResourceRecord],
    name: &DomainName,
    wildcard_encloser: &DomainName,
    hasher: &dyn Nsec3Hasher,
) -> Result<ProofPlan, ProofError> {
    let nsec3 = Nsec3Chain::new(chain).ok_or(ProofError::MissingChain)?;
    nsec3.check_algorithm()?;

    let skip = name
        .label_count()
        .checked_sub(wildcard_encloser.label_count() + 1)
        .ok_or_else(|| ProofError::ClosestEncloserMismatch(name.clone()))?;
    let next_closer = name.skip_leading_labels(skip);

    let closer = nsec3
        .find(hasher, FindMode::Covers, &next_closer)
        .and_then(|found| found.closer)
        .ok_or_else(|| ProofError::NameNotProven(next_closer.clone()))?;

    let mut plan = ProofPlan {
        opt_out: nsec3.opt_out(closer),
        ..ProofPlan::default()
    };
    plan.push(nsec3.record(closer));
    Ok(plan)
}

/// The cached NSEC3 proving an insecure delegation at `name`: an exact
/// match with NS and neither SOA nor DS, or an opt-out record covering it.
pub fn nsec3_record_is_delegation(
    group: Option<&CacheGroup>,
    name: &DomainName,
    qtype: RecordType,
    hasher: &dyn Nsec3Hasher,
) -> Option<ResourceRecord> {
    let group = group?;
    for cached in &group.members {
        if !cached.is_negative() || cached.record.rtype != qtype {
            continue;
        }
        for rr in cached.nsec_chain() {
            let Some(data) = rr.as_nsec3() else { continue };
            let Some(owner_label) = rr.name.first_label() else {
                continue;
            };
            let Some(hash) = hasher.hash_name(name, data.hash_algorithm, &data.salt, data.iterations)
            else {
                continue;
            };
            let b32 = BASE32_DNSSEC.encode(&hash);

            if compare_hashed_label(owner_label, b32.as_bytes()) == Ordering::Equal {
                if data.has_type(RecordType::SOA) || data.has_type(RecordType::DS) {
                    return None;
                }
                if data.has_type(RecordType::NS) {
                    return Some(rr.clone());
                }
                return None;
            }

            if data.opt_out() && covers_hash(owner_label, data, &hash, b32.as_bytes()) {
                debug!(owner = %rr.name, name = %name, "opt-out NSEC3 covers the delegation");
                return Some(rr.clone());
            }
        }
    }
    None
}
