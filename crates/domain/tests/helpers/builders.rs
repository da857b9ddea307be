#![allow(dead_code)]
use ferrous_dnsproxy_domain::dns_record::rdata::{Nsec3Data, NsecData, RrsigData, SoaData, TypeBitmap};
use ferrous_dnsproxy_domain::{DomainName, RData, RecordType, ResourceRecord};

pub fn name(s: &str) -> DomainName {
    s.parse().unwrap()
}

pub fn nsec(owner: &str, next: &str, types: &[RecordType]) -> ResourceRecord {
    ResourceRecord::new(
        name(owner),
        RecordType::NSEC,
        3600,
        RData::Nsec(NsecData::new(name(next), types)),
    )
}

pub fn nsec3(owner: &str, next_hash: &[u8], types: &[RecordType]) -> ResourceRecord {
    ResourceRecord::new(
        name(owner),
        RecordType::NSEC3,
        3600,
        RData::Nsec3(Nsec3Data {
            hash_algorithm: 1,
            flags: 0,
            iterations: 0,
            salt: Vec::new(),
            next_hashed_owner: next_hash.to_vec(),
            types: TypeBitmap::from_types(types),
        }),
    )
}

pub fn rrsig(owner: &str, covered: RecordType) -> ResourceRecord {
    ResourceRecord::new(
        name(owner),
        RecordType::RRSIG,
        3600,
        RData::Rrsig(RrsigData {
            type_covered: covered,
            algorithm: 8,
            labels: name(owner).label_count() as u8,
            original_ttl: 3600,
            signature_expiration: u32::MAX,
            signature_inception: 0,
            key_tag: 12345,
            signer_name: name("example."),
            signature: vec![0xAB; 16],
        }),
    )
}

pub fn soa(owner: &str) -> ResourceRecord {
    ResourceRecord::new(
        name(owner),
        RecordType::SOA,
        3600,
        RData::Soa(SoaData {
            mname: name("ns1.example."),
            rname: name("hostmaster.example."),
            serial: 2024010101,
            refresh: 7200,
            retry: 3600,
            expire: 1209600,
            minimum: 300,
        }),
    )
}

pub fn a_record(owner: &str, ip: [u8; 4]) -> ResourceRecord {
    ResourceRecord::new(name(owner), RecordType::A, 300, RData::A(ip.into()))
}
