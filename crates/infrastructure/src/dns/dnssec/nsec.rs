//! Authenticated denial with NSEC records (RFC 4035 §5.4, RFC 4592).

use super::proof::{ProofError, ProofPlan};
use ferrous_dnsproxy_domain::dns_record::rdata::NsecData;
use ferrous_dnsproxy_domain::{CacheGroup, DomainName, RecordType, ResourceRecord};
use std::cmp::Ordering;
use tracing::debug;

/// What a single NSEC record says about a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameExistence {
    /// The record does not speak about the name.
    Inapplicable,
    /// The name falls inside the gap the record covers.
    Absent,
    /// The name is the owner or the next name of the record.
    Present,
}

/// How an NSEC proves that a type does not exist at a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataMatch {
    /// The owner is the name itself.
    Exact,
    /// A wildcard owner, carrying its closest encloser.
    Wildcard(DomainName),
}

/// Parent side of a zone cut: NS without SOA. Such an NSEC cannot speak for
/// anything but DS at its owner.
fn is_parent_side(nsec: &NsecData) -> bool {
    nsec.has_type(RecordType::NS) && !nsec.has_type(RecordType::SOA)
}

/// Applies the zone cut rules for a type query at the NSEC owner.
fn side_applies(nsec: &NsecData, qtype: RecordType) -> bool {
    if qtype == RecordType::DS {
        // DS lives in the parent; an apex NSEC is from the child
        !nsec.has_type(RecordType::SOA)
    } else {
        !is_parent_side(nsec)
    }
}

pub fn name_exists(
    owner: &DomainName,
    nsec: &NsecData,
    name: &DomainName,
    qtype: RecordType,
) -> NameExistence {
    let owner_vs_name = owner.canonical_order(name).ordering;
    if owner_vs_name == Ordering::Greater {
        return NameExistence::Inapplicable;
    }
    if owner_vs_name == Ordering::Equal {
        if !side_applies(nsec, qtype) {
            debug!(owner = %owner, qtype = %qtype, "NSEC from the wrong side of the zone cut");
            return NameExistence::Inapplicable;
        }
        return NameExistence::Present;
    }

    // Names below a delegation point or a DNAME are not covered by this zone
    if name.is_subdomain_of(owner)
        && (nsec.has_type(RecordType::DNAME) || is_parent_side(nsec))
    {
        debug!(owner = %owner, name = %name, "NSEC owner is a delegation or DNAME above the name");
        return NameExistence::Inapplicable;
    }

    let next = &nsec.next_name;
    let name_vs_next = name.canonical_order(next);
    if name_vs_next.ordering == Ordering::Equal {
        return NameExistence::Present;
    }

    match owner.canonical_cmp(next) {
        // Single record zone: owner and next are the apex
        Ordering::Equal => {
            if name_vs_next.subdomain {
                NameExistence::Absent
            } else {
                NameExistence::Inapplicable
            }
        }
        Ordering::Less => {
            if name_vs_next.ordering == Ordering::Less {
                NameExistence::Absent
            } else {
                NameExistence::Inapplicable
            }
        }
        // Last record of the chain: next wraps around to the apex
        Ordering::Greater => {
            if name_vs_next.subdomain {
                NameExistence::Absent
            } else {
                NameExistence::Inapplicable
            }
        }
    }
}

/// The NSEC proves `qname` is an empty non-terminal: the owner sorts before
/// it and the next name is below it.
pub fn answers_ent(owner: &DomainName, nsec: &NsecData, qname: &DomainName) -> bool {
    owner.canonical_cmp(qname) == Ordering::Less
        && nsec.next_name.canonical_order(qname).subdomain
}

/// Longest ancestor of `qname` that the NSEC shows to exist.
pub fn closest_encloser(owner: &DomainName, nsec: &NsecData, qname: &DomainName) -> DomainName {
    let owner_match = owner.count_labels_match(qname);
    let next_match = nsec.next_name.count_labels_match(qname);
    if owner_match > next_match {
        owner.skip_leading_labels(owner.label_count() - owner_match)
    } else {
        let next = &nsec.next_name;
        next.skip_leading_labels(next.label_count() - next_match)
    }
}

/// The NSEC covers `*.<closest encloser>` of `name`.
pub fn no_wildcard(
    owner: &DomainName,
    nsec: &NsecData,
    name: &DomainName,
    qtype: RecordType,
) -> Result<bool, ProofError> {
    let wildcard = closest_encloser(owner, nsec, name).wildcard_child()?;
    Ok(name_exists(owner, nsec, &wildcard, qtype) == NameExistence::Absent)
}

fn type_absent(nsec: &NsecData, qtype: RecordType) -> bool {
    !nsec.has_type(qtype) && !nsec.has_type(RecordType::CNAME)
}

/// Type absence at `name`, either at the exact owner or through a wildcard
/// that would have synthesized it.
pub fn no_data_error(
    owner: &DomainName,
    nsec: &NsecData,
    name: &DomainName,
    qtype: RecordType,
) -> Option<NoDataMatch> {
    if owner == name {
        if !side_applies(nsec, qtype) || !type_absent(nsec, qtype) {
            return None;
        }
        return Some(NoDataMatch::Exact);
    }

    if answers_ent(owner, nsec, name) {
        return None;
    }

    if owner.is_wildcard() {
        let encloser = owner.skip_leading_labels(1);
        if name.is_subdomain_of(&encloser)
            && type_absent(nsec, qtype)
            && side_applies(nsec, qtype)
        {
            return Some(NoDataMatch::Wildcard(encloser));
        }
    }
    None
}

fn nsec_records(chain: &[ResourceRecord]) -> impl Iterator<Item = (usize, &ResourceRecord, &NsecData)> {
    chain
        .iter()
        .enumerate()
        .filter_map(|(i, rr)| rr.as_nsec().map(|nsec| (i, rr, nsec)))
}

/// NXDOMAIN: one NSEC proving the name absent and one proving no wildcard
/// could have answered. Verified wildcard first.
pub fn plan_name_error(
    chain: &[ResourceRecord],
    name: &DomainName,
    qtype: RecordType,
) -> Result<ProofPlan, ProofError> {
    let mut no_name = None;
    let mut no_wild = None;

    for (i, rr, nsec) in nsec_records(chain) {
        if name_exists(&rr.name, nsec, name, qtype) == NameExistence::Absent {
            debug!(owner = %rr.name, name = %name, "NSEC proves the name does not exist");
            no_name = Some(i);
        }
        if no_wildcard(&rr.name, nsec, name, qtype)? {
            debug!(owner = %rr.name, name = %name, "NSEC proves no wildcard exists");
            no_wild = Some(i);
        }
    }

    let no_name = no_name.ok_or_else(|| ProofError::NameNotProven(name.clone()))?;
    let no_wild = no_wild.ok_or_else(|| ProofError::WildcardNotDisproven(name.clone()))?;

    let mut plan = ProofPlan::default();
    plan.push(&chain[no_wild]);
    if no_name != no_wild {
        plan.push(&chain[no_name]);
    }
    Ok(plan)
}

/// NODATA, including the wildcard NODATA case where the no-name and the
/// wildcard records must agree on the closest encloser.
pub fn plan_no_data(
    chain: &[ResourceRecord],
    name: &DomainName,
    qtype: RecordType,
) -> Result<ProofPlan, ProofError> {
    let mut exact = None;
    let mut wildcard: Option<(usize, DomainName)> = None;
    let mut no_name: Option<(usize, DomainName)> = None;

    for (i, rr, nsec) in nsec_records(chain) {
        match no_data_error(&rr.name, nsec, name, qtype) {
            Some(NoDataMatch::Exact) => exact = Some(i),
            Some(NoDataMatch::Wildcard(ce)) => wildcard = Some((i, ce)),
            None => {}
        }
        if name_exists(&rr.name, nsec, name, qtype) == NameExistence::Absent {
            no_name = Some((i, closest_encloser(&rr.name, nsec, name)));
        }
    }

    let mut plan = ProofPlan::default();
    if let Some(index) = exact {
        plan.push(&chain[index]);
        return Ok(plan);
    }

    if let Some((wild, ce)) = wildcard {
        let Some((no_name, no_name_ce)) = no_name else {
            return Err(ProofError::NoClosestEncloser(name.clone()));
        };
        if ce != no_name_ce {
            debug!(wildcard = %ce, closest = %no_name_ce, "wildcard and no-name proofs disagree");
            return Err(ProofError::ClosestEncloserMismatch(name.clone()));
        }
        plan.push(&chain[wild]);
        if no_name != wild {
            plan.push(&chain[no_name]);
        }
        return Ok(plan);
    }

    // Empty non-terminal
    match no_name {
        Some((index, _)) => {
            plan.push(&chain[index]);
            Ok(plan)
        }
        None => Err(ProofError::TypeNotDisproven {
            name: name.clone(),
            qtype,
        }),
    }
}

/// An NSEC proving the expanded name absent below the same closest encloser
/// the wildcard was expanded from. `None` when no NSEC in the chain does.
pub fn plan_wildcard_answer(
    chain: &[ResourceRecord],
    name: &DomainName,
    qtype: RecordType,
    wildcard_encloser: &DomainName,
) -> Option<Result<ProofPlan, ProofError>> {
    let (rr, nsec) = nsec_records(chain)
        .find(|(_, rr, nsec)| name_exists(&rr.name, nsec, name, qtype) == NameExistence::Absent)
        .map(|(_, rr, nsec)| (rr, nsec))?;

    let ce = closest_encloser(&rr.name, nsec, name);
    if &ce != wildcard_encloser {
        debug!(closest = %ce, wildcard = %wildcard_encloser, "wildcard expanded from the wrong encloser");
        return Some(Err(ProofError::ClosestEncloserMismatch(name.clone())));
    }

    let mut plan = ProofPlan::default();
    plan.push(rr);
    Some(Ok(plan))
}

/// The cached NSEC at `name` marking an insecure delegation: NS present,
/// neither SOA nor DS.
pub fn nsec_record_is_delegation(
    group: Option<&CacheGroup>,
    name: &DomainName,
    qtype: RecordType,
) -> Option<ResourceRecord> {
    let group = group?;
    for cached in &group.members {
        if !cached.is_negative() || cached.record.rtype != qtype {
            continue;
        }
        for rr in cached.nsec_chain() {
            let Some(nsec) = rr.as_nsec() else { continue };
            if &rr.name != name {
                continue;
            }
            if nsec.has_type(RecordType::SOA) || nsec.has_type(RecordType::DS) {
                return None;
            }
            if nsec.has_type(RecordType::NS) {
                return Some(rr.clone());
            }
            return None;
        }
    }
    None
}
