use ferrous_dnsproxy_application::Nsec3Hasher;
use ferrous_dnsproxy_domain::dns_record::rdata::NSEC3_HASH_SHA1;
use ferrous_dnsproxy_domain::DomainName;
use sha1::{Digest, Sha1};

/// RFC 5155 §5 iterated hash with SHA-1, the only algorithm defined.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Nsec3Hasher;

impl Nsec3Hasher for Sha1Nsec3Hasher {
    fn hash_name(
        &self,
        name: &DomainName,
        algorithm: u8,
        salt: &[u8],
        iterations: u16,
    ) -> Option<Vec<u8>> {
        if algorithm != NSEC3_HASH_SHA1 {
            return None;
        }

        let mut hasher = Sha1::new();
        hasher.update(name.canonical_wire());
        hasher.update(salt);
        let mut digest = hasher.finalize();

        for _ in 0..iterations {
            let mut hasher = Sha1::new();
            hasher.update(digest);
            hasher.update(salt);
            digest = hasher.finalize();
        }
        Some(digest.to_vec())
    }
}
