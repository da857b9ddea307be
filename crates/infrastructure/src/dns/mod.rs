pub mod dnssec;
pub mod proxy;
pub mod record_cache;
pub mod wire;

pub use dnssec::{KeyedRrsetVerifier, Sha1Nsec3Hasher, TrustAnchorStore, VerifierArena};
pub use proxy::{AnswerEvent, DnsProxy, InboundPacket, PacketOutcome, SharedDnsProxy};
pub use record_cache::MemoryRecordCache;
