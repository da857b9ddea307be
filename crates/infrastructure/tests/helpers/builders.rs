#![allow(dead_code)]
use data_encoding::BASE32_DNSSEC;
use ferrous_dnsproxy_domain::dns_record::rdata::{
    Nsec3Data, NsecData, RrsigData, SoaData, TypeBitmap, NSEC3_FLAG_OPT_OUT,
};
use ferrous_dnsproxy_domain::{
    CachedRecord, DomainName, MessageFlags, RData, Rcode, RecordType, ResourceRecord,
};
use std::time::Instant;

/// Salt and iterations of the RFC 5155 appendix A zone.
pub const EXAMPLE_SALT: [u8; 4] = [0xaa, 0xbb, 0xcc, 0xdd];
pub const EXAMPLE_ITERATIONS: u16 = 12;

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

/// NSEC3 in `zone` with the appendix A parameters. Owner and next are
/// base32hex hashes.
pub fn nsec3(owner_hash: &str, zone: &str, next_hash: &str, types: &[RecordType]) -> ResourceRecord {
    nsec3_with_flags(owner_hash, zone, next_hash, types, 0)
}

pub fn nsec3_opt_out(
    owner_hash: &str,
    zone: &str,
    next_hash: &str,
    types: &[RecordType],
) -> ResourceRecord {
    nsec3_with_flags(owner_hash, zone, next_hash, types, NSEC3_FLAG_OPT_OUT)
}

fn nsec3_with_flags(
    owner_hash: &str,
    zone: &str,
    next_hash: &str,
    types: &[RecordType],
    flags: u8,
) -> ResourceRecord {
    ResourceRecord::new(
        name(&format!("{}.{}", owner_hash, zone)),
        RecordType::NSEC3,
        3600,
        RData::Nsec3(Nsec3Data {
            hash_algorithm: 1,
            flags,
            iterations: EXAMPLE_ITERATIONS,
            salt: EXAMPLE_SALT.to_vec(),
            next_hashed_owner: BASE32_DNSSEC.decode(next_hash.as_bytes()).unwrap(),
            types: TypeBitmap::from_types(types),
        }),
    )
}

pub fn rrsig(owner: &str, covered: RecordType) -> ResourceRecord {
    let owner = name(owner);
    let labels = if owner.is_wildcard() {
        owner.label_count() - 1
    } else {
        owner.label_count()
    };
    ResourceRecord::new(
        owner,
        RecordType::RRSIG,
        3600,
        RData::Rrsig(RrsigData {
            type_covered: covered,
            algorithm: 8,
            labels: labels as u8,
            original_ttl: 3600,
            signature_expiration: u32::MAX,
            signature_inception: 0,
            key_tag: 12345,
            signer_name: name("example."),
            signature: vec![0xAB; 16],
        }),
    )
}

/// Each record followed by an RRSIG over it.
pub fn signed(records: &[ResourceRecord]) -> Vec<ResourceRecord> {
    records
        .iter()
        .flat_map(|rr| {
            let sig = rrsig(&rr.name.to_string(), rr.rtype);
            [rr.clone(), sig]
        })
        .collect()
}

pub fn soa(zone: &str) -> ResourceRecord {
    ResourceRecord::new(
        name(zone),
        RecordType::SOA,
        3600,
        RData::Soa(SoaData {
            mname: name("ns1.example."),
            rname: name("bugs.x.w.example."),
            serial: 1081539377,
            refresh: 3600,
            retry: 300,
            expire: 3600000,
            minimum: 3600,
        }),
    )
}

pub fn a_record(owner: &str, ip: [u8; 4]) -> ResourceRecord {
    ResourceRecord::new(name(owner), RecordType::A, 300, RData::A(ip.into()))
}

pub fn cname(owner: &str, target: &str) -> ResourceRecord {
    ResourceRecord::new(name(owner), RecordType::CNAME, 300, RData::Cname(name(target)))
}

pub fn response_flags(rcode: Rcode) -> MessageFlags {
    MessageFlags(MessageFlags::QR | MessageFlags::RD | MessageFlags::RA).with_rcode(rcode)
}

/// Negative cache entry carrying `chain` and the `example.` SOA.
pub fn negative(
    owner: &str,
    qtype: RecordType,
    rcode: Rcode,
    chain: Vec<ResourceRecord>,
    now: Instant,
) -> CachedRecord {
    let mut record = CachedRecord::negative(name(owner), qtype, 3600, now, response_flags(rcode));
    record.attach_nsec_chain(chain, rcode).unwrap();
    record.with_soa(soa("example."))
}

/// RFC 4035 appendix A zone as an NSEC chain.
pub fn example_nsec_zone() -> Vec<ResourceRecord> {
    use RecordType::*;
    vec![
        nsec("example.", "a.example.", &[NS, SOA, MX, RRSIG, NSEC, DNSKEY]),
        nsec("a.example.", "ai.example.", &[NS, DS, RRSIG, NSEC]),
        nsec("ai.example.", "b.example.", &[A, AAAA, RRSIG, NSEC]),
        nsec("b.example.", "ns1.example.", &[NS, RRSIG, NSEC]),
        nsec("ns1.example.", "ns2.example.", &[A, RRSIG, NSEC]),
        nsec("ns2.example.", "*.w.example.", &[A, RRSIG, NSEC]),
        nsec("*.w.example.", "x.w.example.", &[MX, RRSIG, NSEC]),
        nsec("x.w.example.", "x.y.w.example.", &[MX, RRSIG, NSEC]),
        nsec("x.y.w.example.", "xx.example.", &[MX, RRSIG, NSEC]),
        nsec("xx.example.", "example.", &[A, AAAA, RRSIG, NSEC]),
    ]
}

/// One record of [`example_nsec_zone`] by owner.
pub fn example_nsec(owner: &str) -> ResourceRecord {
    let owner = name(owner);
    example_nsec_zone()
        .into_iter()
        .find(|rr| rr.name == owner)
        .unwrap()
}

/// Builds a client query. `edns` is the advertised payload size and DO bit.
pub fn query(id: u16, flags: u16, qname: &str, qtype: RecordType, edns: Option<(u16, bool)>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&flags.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    buf.extend_from_slice(&0u16.to_be_bytes()); // ANCOUNT
    buf.extend_from_slice(&0u16.to_be_bytes()); // NSCOUNT
    let arcount: u16 = if edns.is_some() { 1 } else { 0 };
    buf.extend_from_slice(&arcount.to_be_bytes());
    buf.extend_from_slice(name(qname).as_wire());
    buf.extend_from_slice(&qtype.to_u16().to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes()); // IN
    if let Some((payload, dnssec_ok)) = edns {
        buf.push(0x00);
        buf.extend_from_slice(&41u16.to_be_bytes());
        buf.extend_from_slice(&payload.to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x00]); // extended rcode, version
        let do_flag: u16 = if dnssec_ok { 0x8000 } else { 0 };
        buf.extend_from_slice(&do_flag.to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x00]); // RDLEN
    }
    buf
}

/// RD set, no EDNS0.
pub fn plain_query(id: u16, qname: &str, qtype: RecordType) -> Vec<u8> {
    query(id, MessageFlags::RD, qname, qtype, None)
}

/// RD set, 1232 byte payload, DO set.
pub fn dnssec_query(id: u16, qname: &str, qtype: RecordType) -> Vec<u8> {
    query(id, MessageFlags::RD, qname, qtype, Some((1232, true)))
}
