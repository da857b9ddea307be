//! Verifier lifecycle for negative proofs.
//!
//! A proof node owns the queue of denial records still to verify. Each
//! record is checked through a child node that points back at its proof by
//! id. Results either come back synchronously or later through
//! [`VerifierArena::resume`] with the ticket the child was issued.

use super::proof::{self, covering_signatures, ProofError, ProofPlan};
use ferrous_dnsproxy_application::{
    Nsec3Hasher, RrsetVerification, RrsetVerifier, VerificationPoll, VerificationTicket,
};
use ferrous_dnsproxy_domain::{CachedRecord, DnsQuestion, DnssecStatus, DomainName, ResourceRecord};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Generation-tagged arena slot index. Stale ids never alias a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifierId {
    index: u32,
    generation: u32,
}

pub type ProofId = VerifierId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofCompletion {
    pub proof: ProofId,
    pub question: DnsQuestion,
    pub status: DnssecStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofProgress {
    Complete(ProofCompletion),
    /// Waiting on a verification result for one of the proof's records.
    Pending(ProofId),
}

enum Role {
    Proof {
        pending: VecDeque<ResourceRecord>,
        signatures: SmallVec<[ResourceRecord; 4]>,
        opt_out: bool,
        child: Option<VerifierId>,
    },
    Record {
        ticket: VerificationTicket,
    },
}

struct VerifierNode {
    question: DnsQuestion,
    parent: Option<VerifierId>,
    role: Role,
}

struct Slot {
    generation: u32,
    node: Option<VerifierNode>,
}

#[derive(Default)]
pub struct VerifierArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    tickets: FxHashMap<VerificationTicket, VerifierId>,
    next_ticket: u64,
    completed: u64,
}

impl VerifierArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes currently allocated, proofs and their record children.
    pub fn live_verifiers(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn completed_count(&self) -> u64 {
        self.completed
    }

    pub fn is_live(&self, id: VerifierId) -> bool {
        self.node(id).is_some()
    }

    fn node(&self, id: VerifierId) -> Option<&VerifierNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: VerifierId) -> Option<&mut VerifierNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn allocate(&mut self, node: VerifierNode) -> VerifierId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return VerifierId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        VerifierId {
            index,
            generation: 0,
        }
    }

    fn release(&mut self, id: VerifierId) -> Option<VerifierNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    fn issue_ticket(&mut self) -> VerificationTicket {
        self.next_ticket += 1;
        VerificationTicket(self.next_ticket)
    }

    /// Plans and starts the proof for a negative answer. A proof that
    /// cannot be planned completes immediately as Bogus.
    pub fn start_negative<V>(
        &mut self,
        question: DnsQuestion,
        record: &CachedRecord,
        hasher: &dyn Nsec3Hasher,
        verifier: &mut V,
    ) -> ProofProgress
    where
        V: RrsetVerifier + ?Sized,
    {
        let plan = proof::plan_negative(&question, record, hasher);
        self.start_planned(question, plan, record.nsec_chain(), verifier)
    }

    /// Starts the denial proof behind a wildcard-expanded answer.
    pub fn start_wildcard_answer<V>(
        &mut self,
        question: DnsQuestion,
        record: &CachedRecord,
        wildcard_encloser: &DomainName,
        hasher: &dyn Nsec3Hasher,
        verifier: &mut V,
    ) -> ProofProgress
    where
        V: RrsetVerifier + ?Sized,
    {
        let plan = proof::plan_wildcard_answer(&question, record, wildcard_encloser, hasher);
        self.start_planned(question, plan, record.nsec_chain(), verifier)
    }

    fn start_planned<V>(
        &mut self,
        question: DnsQuestion,
        plan: Result<ProofPlan, ProofError>,
        chain: &[ResourceRecord],
        verifier: &mut V,
    ) -> ProofProgress
    where
        V: RrsetVerifier + ?Sized,
    {
        // An empty queue completes as Bogus on the first step
        let plan = plan.unwrap_or_else(|e| {
            warn!(name = %question.name, qtype = %question.qtype, error = %e, "negative proof failed");
            ProofPlan::default()
        });

        let signatures = chain
            .iter()
            .filter(|rr| rr.as_rrsig().is_some())
            .cloned()
            .collect();
        let fallback = question.clone();
        let proof = self.allocate(VerifierNode {
            question,
            parent: None,
            role: Role::Proof {
                pending: plan.records.into_iter().collect(),
                signatures,
                opt_out: plan.opt_out,
                child: None,
            },
        });

        self.advance(proof, verifier).unwrap_or_else(|| {
            ProofProgress::Complete(ProofCompletion {
                proof,
                question: fallback,
                status: DnssecStatus::Bogus,
            })
        })
    }

    /// Verifies the next queued record of `proof` until a result is pending
    /// or the proof completes. `None` when `proof` is not live.
    fn advance<V>(&mut self, proof: ProofId, verifier: &mut V) -> Option<ProofProgress>
    where
        V: RrsetVerifier + ?Sized,
    {
        loop {
            let node = self.node_mut(proof)?;
            let Role::Proof {
                pending, signatures, ..
            } = &mut node.role
            else {
                return None;
            };
            let next = pending.pop_front().map(|record| {
                let covering = covering_signatures(signatures, &record);
                (record, covering)
            });

            let Some((record, covering)) = next else {
                return self.complete(proof, DnssecStatus::Bogus).map(ProofProgress::Complete);
            };
            if covering.is_empty() {
                debug!(owner = %record.name, rtype = %record.rtype, "no signature covers denial record");
                return self.complete(proof, DnssecStatus::Bogus).map(ProofProgress::Complete);
            }

            let ticket = self.issue_ticket();
            let child = self.allocate(VerifierNode {
                question: DnsQuestion::with_class(record.name.clone(), record.rtype, record.class),
                parent: Some(proof),
                role: Role::Record { ticket },
            });
            if let Some(VerifierNode {
                role: Role::Proof { child: slot, .. },
                ..
            }) = self.node_mut(proof)
            {
                *slot = Some(child);
            }

            debug!(owner = %record.name, rtype = %record.rtype, ticket = ticket.0, "verifying denial record");
            let request = RrsetVerification {
                ticket,
                rrset: vec![record],
                signatures: covering,
            };
            match verifier.verify(request) {
                VerificationPoll::Ready(status) => {
                    if let Some(done) = self.child_finished(child, status) {
                        return Some(ProofProgress::Complete(done));
                    }
                }
                VerificationPoll::Pending => {
                    self.tickets.insert(ticket, child);
                    return Some(ProofProgress::Pending(proof));
                }
            }
        }
    }

    /// Detaches and frees a record child, then applies its status to the
    /// parent. Returns the completion when the parent is done.
    fn child_finished(&mut self, child: VerifierId, status: DnssecStatus) -> Option<ProofCompletion> {
        let mut node = self.release(child)?;
        let proof = node.parent.take()?;

        let parent = self.node_mut(proof)?;
        let Role::Proof {
            pending,
            opt_out,
            child: slot,
            ..
        } = &mut parent.role
        else {
            return None;
        };
        *slot = None;

        if !pending.is_empty() {
            if status != DnssecStatus::Secure {
                debug!(status = %status, "intermediate denial record not secure");
                return self.complete(proof, DnssecStatus::Bogus);
            }
            return None;
        }

        let status = if status == DnssecStatus::Secure && *opt_out {
            DnssecStatus::Insecure
        } else {
            status
        };
        self.complete(proof, status)
    }

    /// Feeds an asynchronous verification result back. Returns the
    /// completion when it finishes the proof; stale or unknown tickets are
    /// ignored.
    pub fn resume<V>(
        &mut self,
        ticket: VerificationTicket,
        status: DnssecStatus,
        verifier: &mut V,
    ) -> Option<ProofCompletion>
    where
        V: RrsetVerifier + ?Sized,
    {
        let Some(child) = self.tickets.remove(&ticket) else {
            debug!(ticket = ticket.0, "verification result for unknown ticket");
            return None;
        };
        let proof = self.node(child)?.parent?;

        if let Some(done) = self.child_finished(child, status) {
            return Some(done);
        }
        match self.advance(proof, verifier)? {
            ProofProgress::Complete(done) => Some(done),
            ProofProgress::Pending(_) => None,
        }
    }

    /// Abandons a proof, completing it as Indeterminate.
    pub fn cancel(&mut self, proof: ProofId) -> Option<ProofCompletion> {
        let node = self.node(proof)?;
        let child = match &node.role {
            Role::Proof { child, .. } => *child,
            Role::Record { .. } => return None,
        };
        if let Some(child) = child {
            if let Some(VerifierNode {
                role: Role::Record { ticket },
                ..
            }) = self.release(child)
            {
                self.tickets.remove(&ticket);
            }
        }
        self.complete(proof, DnssecStatus::Indeterminate)
    }

    fn complete(&mut self, proof: ProofId, status: DnssecStatus) -> Option<ProofCompletion> {
        let question = self.release(proof)?.question;
        self.completed += 1;
        debug!(name = %question.name, qtype = %question.qtype, status = %status, "proof complete");
        Some(ProofCompletion {
            proof,
            question,
            status,
        })
    }
}
