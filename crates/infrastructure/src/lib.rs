//! Ferrous DNS Proxy Infrastructure Layer
//!
//! The wire codec, the proxy engine, NSEC/NSEC3 negative proofs and the
//! ring-backed RRset verifier behind the application ports.
pub mod dns;
pub mod logging;

pub use dns::dnssec::{
    KeyedRrsetVerifier, ProofError, Sha1Nsec3Hasher, TrustAnchor, TrustAnchorStore, VerifierArena,
};
pub use dns::proxy::{AnswerEvent, DnsProxy, InboundPacket, PacketOutcome, SharedDnsProxy};
pub use dns::record_cache::MemoryRecordCache;
pub use logging::init_logging;
