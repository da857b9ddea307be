use ferrous_dnsproxy_domain::{DnssecStatus, ResourceRecord};

/// Correlates an asynchronous verification result with the request that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerificationTicket(pub u64);

/// One RRset together with the signatures that cover it.
#[derive(Debug, Clone)]
pub struct RrsetVerification {
    pub ticket: VerificationTicket,
    pub rrset: Vec<ResourceRecord>,
    pub signatures: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPoll {
    Ready(DnssecStatus),
    /// The result arrives later through `on_verification_result` with the same ticket.
    Pending,
}

pub trait RrsetVerifier {
    fn verify(&mut self, request: RrsetVerification) -> VerificationPoll;
}
