pub mod crypto;
pub mod hash;
pub mod nsec;
pub mod nsec3;
pub mod proof;
pub mod trust_anchor;
pub mod verifier;

pub use crypto::KeyedRrsetVerifier;
pub use hash::Sha1Nsec3Hasher;
pub use nsec::{nsec_record_is_delegation, NameExistence, NoDataMatch};
pub use nsec3::{nsec3_record_is_delegation, FindMode, Nsec3Chain};
pub use proof::{plan_negative, plan_wildcard_answer, ProofError, ProofPlan};
pub use trust_anchor::{TrustAnchor, TrustAnchorStore};
pub use verifier::{ProofCompletion, ProofId, ProofProgress, VerifierArena, VerifierId};
