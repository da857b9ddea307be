use ferrous_dnsproxy_domain::DomainName;

pub trait Nsec3Hasher {
    /// RFC 5155 §5 hash of `name`. `None` for an unsupported algorithm.
    fn hash_name(
        &self,
        name: &DomainName,
        algorithm: u8,
        salt: &[u8],
        iterations: u16,
    ) -> Option<Vec<u8>>;
}
