mod helpers;

use data_encoding::BASE32_DNSSEC;
use ferrous_dnsproxy_application::Nsec3Hasher;
use ferrous_dnsproxy_domain::dns_record::rdata::Nsec3Data;
use ferrous_dnsproxy_domain::{CacheGroup, Rcode, RecordType, ResourceRecord};
use ferrous_dnsproxy_infrastructure::dns::dnssec::nsec3::{self, covers_hash};
use ferrous_dnsproxy_infrastructure::dns::dnssec::{FindMode, Nsec3Chain, ProofError, Sha1Nsec3Hasher};
use helpers::builders::{
    name, negative, nsec3, nsec3_opt_out, signed, EXAMPLE_ITERATIONS, EXAMPLE_SALT,
};
use std::time::Instant;

// RFC 5155 appendix A hashes
const H_EXAMPLE: &str = "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom";
const H_NS1: &str = "2t7b4g4vsa5smi47k61mv5bv1a22bojr";
const H_X_Y_W: &str = "2vptu5timamqttgl4luu9kg21e0aor3s";
const H_A: &str = "35mthgpgcu1qg68fab165klnsnk3dpvl";
const H_X_W: &str = "b4um86eghhds6nea196smvmlo4ors995";
const H_AI: &str = "gjeqe526plbf1g8mklp59enfd789njgi";
const H_Y_W: &str = "ji6neoaepv8b5o6k4ev33abha8ht9fgc";
const H_W: &str = "k8udemvp1j2f7eg6jebps17vp3n8i58h";
const H_NS2: &str = "q04jkcevqvmu85r014c7dkba38o0ji5r";
const H_WILD_W: &str = "r53bq7cc2uvmubfu5ocmm6pers9tk9en";
const H_XX: &str = "t644ebqk9bibcna874givr6joj62mlhv";

fn apex() -> ResourceRecord {
    use RecordType::*;
    nsec3(H_EXAMPLE, "example.", H_NS1, &[MX, DNSKEY, NS, SOA, NSEC3PARAM, RRSIG])
}

fn x_w() -> ResourceRecord {
    nsec3(H_X_W, "example.", H_AI, &[RecordType::MX, RecordType::RRSIG])
}

fn a_delegation() -> ResourceRecord {
    use RecordType::*;
    nsec3(H_A, "example.", H_X_W, &[NS, DS, RRSIG])
}

fn hash(owner: &str) -> String {
    let digest = Sha1Nsec3Hasher
        .hash_name(&name(owner), 1, &EXAMPLE_SALT, EXAMPLE_ITERATIONS)
        .unwrap();
    BASE32_DNSSEC.encode(&digest)
}

#[test]
fn test_hasher_matches_published_owner_hashes() {
    assert_eq!(hash("example."), H_EXAMPLE);
    assert_eq!(hash("ns1.example."), H_NS1);
    assert_eq!(hash("x.y.w.example."), H_X_Y_W);
    assert_eq!(hash("x.w.example."), H_X_W);
    assert_eq!(hash("ai.example."), H_AI);
    assert_eq!(hash("y.w.example."), H_Y_W);
    assert_eq!(hash("w.example."), H_W);
    assert_eq!(hash("ns2.example."), H_NS2);
    assert_eq!(hash("*.w.example."), H_WILD_W);
    assert_eq!(hash("xx.example."), H_XX);
}

#[test]
fn test_covers_hash_inside_range() {
    let rr = apex();
    let data: &Nsec3Data = rr.as_nsec3().unwrap();
    let target = "0va5bpr2ou0vk0lbqeeljri88laipsfh";
    let raw = BASE32_DNSSEC.decode(target.as_bytes()).unwrap();

    assert!(covers_hash(H_EXAMPLE.as_bytes(), data, &raw, target.as_bytes()));

    let outside = BASE32_DNSSEC.decode(H_X_W.as_bytes()).unwrap();
    assert!(!covers_hash(H_EXAMPLE.as_bytes(), data, &outside, H_X_W.as_bytes()));
}

#[test]
fn test_covers_hash_wraps_on_last_record() {
    let rr = nsec3(H_XX, "example.", H_EXAMPLE, &[RecordType::A]);
    let data = rr.as_nsec3().unwrap();

    let above = "v0000000000000000000000000000000";
    let raw = BASE32_DNSSEC.decode(above.as_bytes()).unwrap();
    assert!(covers_hash(H_XX.as_bytes(), data, &raw, above.as_bytes()));

    let below = "00000000000000000000000000000000";
    let raw = BASE32_DNSSEC.decode(below.as_bytes()).unwrap();
    assert!(covers_hash(H_XX.as_bytes(), data, &raw, below.as_bytes()));

    let middle = BASE32_DNSSEC.decode(H_W.as_bytes()).unwrap();
    assert!(!covers_hash(H_XX.as_bytes(), data, &middle, H_W.as_bytes()));
}

#[test]
fn test_chain_skips_records_with_other_parameters() {
    let mut odd = nsec3(H_W, "example.", H_NS2, &[]);
    if let ferrous_dnsproxy_domain::RData::Nsec3(data) = &mut odd.rdata {
        data.iterations = 1;
    }
    let records = vec![apex(), odd];
    let chain = Nsec3Chain::new(&records).unwrap();

    let found = chain.find(&Sha1Nsec3Hasher, FindMode::ClosestEncloser, &name("w.example."));
    assert!(found.is_none());
    let found = chain
        .find(&Sha1Nsec3Hasher, FindMode::ClosestEncloser, &name("example."))
        .unwrap();
    assert_eq!(found.closest, Some(0));
}

#[test]
fn test_chain_without_nsec3_is_none() {
    assert!(Nsec3Chain::new(&[]).is_none());
}

#[test]
fn test_closest_encloser_proof_for_deep_name() {
    let records = vec![apex(), x_w(), a_delegation()];
    let chain = Nsec3Chain::new(&records).unwrap();

    let (closest, ce, closer) = chain
        .closest_encloser_proof(&Sha1Nsec3Hasher, &name("a.c.x.w.example."))
        .unwrap();
    assert_eq!(ce, name("x.w.example."));
    assert_eq!(closest, 1);
    assert_eq!(closer, 0);
}

#[test]
fn test_closest_encloser_at_delegation_is_rejected() {
    let records = vec![apex(), a_delegation()];
    let chain = Nsec3Chain::new(&records).unwrap();
    let err = chain
        .closest_encloser_proof(&Sha1Nsec3Hasher, &name("mc.a.example."))
        .unwrap_err();
    assert_eq!(err, ProofError::NoClosestEncloser(name("mc.a.example.")));
}

#[test]
fn test_name_error_plan() {
    let records = vec![apex(), x_w(), a_delegation()];
    let plan = nsec3::plan_name_error(&records, &name("a.c.x.w.example."), &Sha1Nsec3Hasher).unwrap();

    let owners: Vec<_> = plan.records.iter().map(|rr| rr.name.clone()).collect();
    assert_eq!(
        owners,
        vec![
            name(&format!("{}.example.", H_A)),
            name(&format!("{}.example.", H_EXAMPLE)),
            name(&format!("{}.example.", H_X_W)),
        ]
    );
    assert!(!plan.opt_out);
}

#[test]
fn test_name_error_without_wildcard_cover_fails() {
    let records = vec![apex(), x_w()];
    let err = nsec3::plan_name_error(&records, &name("a.c.x.w.example."), &Sha1Nsec3Hasher).unwrap_err();
    assert_eq!(err, ProofError::WildcardNotDisproven(name("a.c.x.w.example.")));
}

#[test]
fn test_name_error_with_unknown_hash_algorithm() {
    let mut rr = apex();
    if let ferrous_dnsproxy_domain::RData::Nsec3(data) = &mut rr.rdata {
        data.hash_algorithm = 2;
    }
    let err = nsec3::plan_name_error(&[rr], &name("a.example."), &Sha1Nsec3Hasher).unwrap_err();
    assert_eq!(err, ProofError::UnsupportedHash(2));
}

#[test]
fn test_no_data_exact_match() {
    let records = vec![nsec3(H_NS1, "example.", H_X_Y_W, &[RecordType::A, RecordType::RRSIG])];
    let plan = nsec3::plan_no_data(&records, &name("ns1.example."), RecordType::MX, &Sha1Nsec3Hasher).unwrap();
    assert_eq!(plan.len(), 1);
    assert!(!plan.opt_out);
}

#[test]
fn test_no_data_empty_non_terminal() {
    let records = vec![nsec3(H_Y_W, "example.", H_W, &[])];
    let plan = nsec3::plan_no_data(&records, &name("y.w.example."), RecordType::A, &Sha1Nsec3Hasher).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.records[0].name, name(&format!("{}.example.", H_Y_W)));
}

#[test]
fn test_no_data_through_wildcard() {
    let records = vec![
        nsec3(H_W, "example.", H_NS2, &[]),
        nsec3(H_NS2, "example.", H_WILD_W, &[RecordType::A, RecordType::RRSIG]),
        nsec3(H_WILD_W, "example.", H_XX, &[RecordType::MX, RecordType::RRSIG]),
    ];
    let plan =
        nsec3::plan_no_data(&records, &name("a.z.w.example."), RecordType::AAAA, &Sha1Nsec3Hasher).unwrap();

    let owners: Vec<_> = plan.records.iter().map(|rr| rr.name.clone()).collect();
    assert_eq!(
        owners,
        vec![
            name(&format!("{}.example.", H_WILD_W)),
            name(&format!("{}.example.", H_NS2)),
            name(&format!("{}.example.", H_W)),
        ]
    );
}

#[test]
fn test_no_data_wildcard_with_type_fails() {
    let records = vec![
        nsec3(H_W, "example.", H_NS2, &[]),
        nsec3(H_NS2, "example.", H_WILD_W, &[RecordType::A, RecordType::RRSIG]),
        nsec3(H_WILD_W, "example.", H_XX, &[RecordType::MX, RecordType::RRSIG]),
    ];
    let err = nsec3::plan_no_data(&records, &name("a.z.w.example."), RecordType::MX, &Sha1Nsec3Hasher)
        .unwrap_err();
    assert_eq!(
        err,
        ProofError::TypeNotDisproven {
            name: name("*.w.example."),
            qtype: RecordType::MX
        }
    );
}

#[test]
fn test_no_data_opt_out_marks_plan() {
    use RecordType::*;
    let records = vec![
        nsec3_opt_out(H_EXAMPLE, "example.", H_NS1, &[MX, DNSKEY, NS, SOA, NSEC3PARAM, RRSIG]),
        x_w(),
    ];
    let plan = nsec3::plan_no_data(&records, &name("a.c.x.w.example."), A, &Sha1Nsec3Hasher).unwrap();
    assert!(plan.opt_out);
    assert_eq!(plan.len(), 2);
}

#[test]
fn test_no_data_without_opt_out_or_wildcard_fails() {
    let records = vec![apex(), x_w()];
    let err = nsec3::plan_no_data(&records, &name("a.c.x.w.example."), RecordType::A, &Sha1Nsec3Hasher)
        .unwrap_err();
    assert!(matches!(err, ProofError::TypeNotDisproven { .. }));
}

#[test]
fn test_wildcard_answer_covers_next_closer() {
    let records = vec![apex(), x_w()];
    let plan = nsec3::plan_wildcard_answer(
        &records,
        &name("c.x.w.example."),
        &name("x.w.example."),
        &Sha1Nsec3Hasher,
    )
    .unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.records[0].name, name(&format!("{}.example.", H_EXAMPLE)));
}

#[test]
fn test_wildcard_answer_with_shallow_name_fails() {
    let records = vec![apex()];
    let err = nsec3::plan_wildcard_answer(&records, &name("example."), &name("x.w.example."), &Sha1Nsec3Hasher)
        .unwrap_err();
    assert_eq!(err, ProofError::ClosestEncloserMismatch(name("example.")));
}

#[test]
fn test_delegation_by_exact_match() {
    let now = Instant::now();
    use RecordType::*;
    let chain = signed(&[nsec3(H_A, "example.", H_X_W, &[NS, RRSIG])]);
    let mut group = CacheGroup::new(name("a.example."));
    group.push(negative("a.example.", DS, Rcode::NoError, chain, now));

    let found = nsec3::nsec3_record_is_delegation(Some(&group), &name("a.example."), DS, &Sha1Nsec3Hasher);
    assert!(found.is_some());
}

#[test]
fn test_delegation_with_ds_is_secure() {
    let now = Instant::now();
    let chain = signed(&[a_delegation()]);
    let mut group = CacheGroup::new(name("a.example."));
    group.push(negative("a.example.", RecordType::DS, Rcode::NoError, chain, now));

    let found =
        nsec3::nsec3_record_is_delegation(Some(&group), &name("a.example."), RecordType::DS, &Sha1Nsec3Hasher);
    assert!(found.is_none());
}

#[test]
fn test_delegation_by_opt_out_cover() {
    let now = Instant::now();
    use RecordType::*;
    let chain = signed(&[nsec3_opt_out(H_EXAMPLE, "example.", H_NS1, &[NS, SOA, RRSIG])]);
    let mut group = CacheGroup::new(name("c.x.w.example."));
    group.push(negative("c.x.w.example.", DS, Rcode::NoError, chain, now));

    let found =
        nsec3::nsec3_record_is_delegation(Some(&group), &name("c.x.w.example."), DS, &Sha1Nsec3Hasher);
    assert!(found.is_some());
}
