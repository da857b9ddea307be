mod bitmap;
mod dnskey;
mod ds;
mod nsec;
mod nsec3;
mod rrsig;
mod soa;

pub use bitmap::TypeBitmap;
pub use dnskey::{DnskeyData, DNSKEY_FLAG_SEP, DNSKEY_FLAG_ZONE};
pub use ds::{digest_length, digest_type_name, DsData, DIGEST_SHA1, DIGEST_SHA256, DIGEST_SHA384};
pub use nsec::NsecData;
pub use nsec3::{Nsec3Data, NSEC3_FLAG_OPT_OUT, NSEC3_HASH_SHA1};
pub use rrsig::RrsigData;
pub use soa::SoaData;

use crate::dns_name::DomainName;
use std::net::{Ipv4Addr, Ipv6Addr};

pub fn algorithm_name(algorithm: u8) -> &'static str {
    match algorithm {
        5 => "RSA/SHA-1",
        7 => "RSASHA1-NSEC3-SHA1",
        8 => "RSA/SHA-256",
        10 => "RSA/SHA-512",
        13 => "ECDSA P-256/SHA-256",
        14 => "ECDSA P-384/SHA-384",
        15 => "Ed25519",
        _ => "Unknown",
    }
}

/// Typed RDATA. Types the proxy never looks inside keep their raw RDATA octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(DomainName),
    Ns(DomainName),
    Ptr(DomainName),
    Mx { preference: u16, exchange: DomainName },
    Soa(SoaData),
    Nsec(NsecData),
    Nsec3(Nsec3Data),
    Rrsig(RrsigData),
    Dnskey(DnskeyData),
    Ds(DsData),
    Unknown(Vec<u8>),
}
