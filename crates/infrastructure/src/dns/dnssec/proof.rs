use super::{nsec, nsec3};
use ferrous_dnsproxy_application::Nsec3Hasher;
use ferrous_dnsproxy_domain::{
    CachedRecord, DenialKind, DnsQuestion, DomainError, DomainName, Rcode, RecordType,
    ResourceRecord,
};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("answer for {0} is not negative")]
    NotNegative(DomainName),

    #[error("rcode {0} cannot be proven with denial records")]
    InvalidRcode(Rcode),

    #[error("no denial records in the chain")]
    MissingChain,

    #[error("nothing proves that {0} does not exist")]
    NameNotProven(DomainName),

    #[error("nothing proves that no wildcard answers {0}")]
    WildcardNotDisproven(DomainName),

    #[error("nothing proves that {name} has no {qtype} records")]
    TypeNotDisproven { name: DomainName, qtype: RecordType },

    #[error("no closest encloser for {0}")]
    NoClosestEncloser(DomainName),

    #[error("closest encloser of {0} does not match the wildcard")]
    ClosestEncloserMismatch(DomainName),

    #[error("unsupported NSEC3 hash algorithm {0}")]
    UnsupportedHash(u8),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// The denial records that must verify, in order, for a proof to hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofPlan {
    pub records: SmallVec<[ResourceRecord; 3]>,
    /// The proof leans on an opt-out NSEC3; Secure downgrades to Insecure.
    pub opt_out: bool,
}

impl ProofPlan {
    pub fn push(&mut self, record: &ResourceRecord) {
        self.records.push(record.clone());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Picks the proof a negative answer needs: NODATA for NOERROR, name error
/// for NXDOMAIN, built from NSEC or NSEC3 depending on the chain.
pub fn plan_negative(
    question: &DnsQuestion,
    record: &CachedRecord,
    hasher: &dyn Nsec3Hasher,
) -> Result<ProofPlan, ProofError> {
    if !record.is_negative() {
        return Err(ProofError::NotNegative(question.name.clone()));
    }
    let kind = record.denial_kind().ok_or(ProofError::MissingChain)?;
    let chain = record.nsec_chain();
    let name = &question.name;
    let qtype = question.qtype;

    let plan = match (record.rcode(), kind) {
        (Rcode::NoError, DenialKind::Nsec) => nsec::plan_no_data(chain, name, qtype)?,
        (Rcode::NoError, DenialKind::Nsec3) => nsec3::plan_no_data(chain, name, qtype, hasher)?,
        (Rcode::NxDomain, DenialKind::Nsec) => nsec::plan_name_error(chain, name, qtype)?,
        (Rcode::NxDomain, DenialKind::Nsec3) => nsec3::plan_name_error(chain, name, hasher)?,
        (rcode, _) => return Err(ProofError::InvalidRcode(rcode)),
    };

    debug!(
        name = %name,
        qtype = %qtype,
        rcode = %record.rcode(),
        records = plan.len(),
        opt_out = plan.opt_out,
        "negative proof planned"
    );
    Ok(plan)
}

/// Proves a wildcard-expanded positive answer could not have matched the
/// name directly. `wildcard_encloser` is the owner of the wildcard minus
/// its `*` label. NSEC is tried first, NSEC3 when no NSEC applies.
pub fn plan_wildcard_answer(
    question: &DnsQuestion,
    record: &CachedRecord,
    wildcard_encloser: &DomainName,
    hasher: &dyn Nsec3Hasher,
) -> Result<ProofPlan, ProofError> {
    let chain = record.nsec_chain();
    if let Some(plan) =
        nsec::plan_wildcard_answer(chain, &question.name, question.qtype, wildcard_encloser)
    {
        return plan;
    }
    nsec3::plan_wildcard_answer(chain, &question.name, wildcard_encloser, hasher)
}

/// Signatures in `chain` over the RRset owned by `record.name` of `record.rtype`.
pub fn covering_signatures(chain: &[ResourceRecord], record: &ResourceRecord) -> Vec<ResourceRecord> {
    chain
        .iter()
        .filter(|rr| rr.name == record.name && rr.type_covered() == Some(record.rtype))
        .cloned()
        .collect()
}
