mod helpers;

use ferrous_dnsproxy_domain::{CacheGroup, Rcode, RecordType};
use ferrous_dnsproxy_infrastructure::dns::dnssec::nsec::{
    self, closest_encloser, name_exists, no_data_error, NameExistence, NoDataMatch,
};
use ferrous_dnsproxy_infrastructure::dns::dnssec::ProofError;
use helpers::builders::{example_nsec, example_nsec_zone, name, negative, nsec, signed};
use std::time::Instant;

fn data(rr: &ferrous_dnsproxy_domain::ResourceRecord) -> &ferrous_dnsproxy_domain::dns_record::rdata::NsecData {
    rr.as_nsec().unwrap()
}

#[test]
fn test_name_inside_gap_is_absent() {
    let rr = example_nsec("b.example.");
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("ml.example."), RecordType::A),
        NameExistence::Absent
    );
}

#[test]
fn test_owner_and_next_are_present() {
    let rr = example_nsec("ns1.example.");
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("ns1.example."), RecordType::MX),
        NameExistence::Present
    );
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("ns2.example."), RecordType::A),
        NameExistence::Present
    );
}

#[test]
fn test_name_outside_gap_is_inapplicable() {
    let rr = example_nsec("b.example.");
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("a.example."), RecordType::A),
        NameExistence::Inapplicable
    );
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("xx.example."), RecordType::A),
        NameExistence::Inapplicable
    );
}

#[test]
fn test_last_nsec_wraps_to_apex() {
    let rr = example_nsec("xx.example.");
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("zz.example."), RecordType::A),
        NameExistence::Absent
    );
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("a.example."), RecordType::A),
        NameExistence::Inapplicable
    );
}

#[test]
fn test_parent_side_nsec_only_speaks_for_ds() {
    let rr = example_nsec("a.example.");
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("a.example."), RecordType::A),
        NameExistence::Inapplicable
    );
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("a.example."), RecordType::DS),
        NameExistence::Present
    );
}

#[test]
fn test_apex_nsec_cannot_prove_ds_absence() {
    let rr = example_nsec("example.");
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("example."), RecordType::DS),
        NameExistence::Inapplicable
    );
    assert_eq!(no_data_error(&rr.name, data(&rr), &name("example."), RecordType::DS), None);
}

#[test]
fn test_names_below_delegation_are_inapplicable() {
    let rr = example_nsec("b.example.");
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("host.b.example."), RecordType::A),
        NameExistence::Inapplicable
    );
}

#[test]
fn test_names_below_dname_are_inapplicable() {
    let rr = nsec("d.example.", "e.example.", &[RecordType::DNAME, RecordType::RRSIG]);
    assert_eq!(
        name_exists(&rr.name, data(&rr), &name("x.d.example."), RecordType::A),
        NameExistence::Inapplicable
    );
}

#[test]
fn test_closest_encloser_uses_longest_shared_suffix() {
    let rr = example_nsec("x.y.w.example.");
    assert_eq!(
        closest_encloser(&rr.name, data(&rr), &name("a.z.w.example.")),
        name("w.example.")
    );
    let rr = example_nsec("b.example.");
    assert_eq!(
        closest_encloser(&rr.name, data(&rr), &name("ml.example.")),
        name("example.")
    );
}

#[test]
fn test_no_data_exact_match() {
    let rr = example_nsec("ns1.example.");
    assert_eq!(
        no_data_error(&rr.name, data(&rr), &name("ns1.example."), RecordType::MX),
        Some(NoDataMatch::Exact)
    );
    assert_eq!(
        no_data_error(&rr.name, data(&rr), &name("ns1.example."), RecordType::A),
        None
    );
}

#[test]
fn test_no_data_rejects_cname_owner() {
    let rr = nsec("c.example.", "d.example.", &[RecordType::CNAME, RecordType::RRSIG]);
    assert_eq!(
        no_data_error(&rr.name, data(&rr), &name("c.example."), RecordType::A),
        None
    );
}

#[test]
fn test_no_data_through_wildcard() {
    let rr = example_nsec("*.w.example.");
    assert_eq!(
        no_data_error(&rr.name, data(&rr), &name("a.z.w.example."), RecordType::AAAA),
        Some(NoDataMatch::Wildcard(name("w.example.")))
    );
}

#[test]
fn test_name_error_plan_orders_wildcard_first() {
    let chain = example_nsec_zone();
    let plan = nsec::plan_name_error(&chain, &name("ml.example."), RecordType::A).unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.records[0].name, name("example."));
    assert_eq!(plan.records[1].name, name("b.example."));
    assert!(!plan.opt_out);
}

#[test]
fn test_name_error_without_wildcard_proof_fails() {
    let chain = vec![example_nsec("b.example.")];
    let err = nsec::plan_name_error(&chain, &name("ml.example."), RecordType::A).unwrap_err();
    assert_eq!(err, ProofError::WildcardNotDisproven(name("ml.example.")));
}

#[test]
fn test_name_error_without_covering_nsec_fails() {
    let chain = vec![example_nsec("example.")];
    let err = nsec::plan_name_error(&chain, &name("ml.example."), RecordType::A).unwrap_err();
    assert_eq!(err, ProofError::NameNotProven(name("ml.example.")));
}

#[test]
fn test_no_data_plan_exact() {
    let chain = vec![example_nsec("ns1.example.")];
    let plan = nsec::plan_no_data(&chain, &name("ns1.example."), RecordType::MX).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.records[0].name, name("ns1.example."));
}

#[test]
fn test_no_data_plan_empty_non_terminal() {
    let chain = vec![example_nsec("x.w.example.")];
    let plan = nsec::plan_no_data(&chain, &name("y.w.example."), RecordType::A).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.records[0].name, name("x.w.example."));
}

#[test]
fn test_no_data_plan_wildcard_needs_both_records() {
    let chain = vec![example_nsec("x.y.w.example."), example_nsec("*.w.example.")];
    let plan = nsec::plan_no_data(&chain, &name("a.z.w.example."), RecordType::AAAA).unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.records[0].name, name("*.w.example."));
    assert_eq!(plan.records[1].name, name("x.y.w.example."));
}

#[test]
fn test_no_data_plan_wildcard_record_used_once() {
    use RecordType::*;
    let chain = vec![nsec("*.w.example.", "zz.w.example.", &[MX, RRSIG, NSEC])];
    let plan = nsec::plan_no_data(&chain, &name("a.z.w.example."), AAAA).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.records[0].name, name("*.w.example."));
}

#[test]
fn test_no_data_plan_exact_wins_over_wildcard() {
    use RecordType::*;
    let chain = vec![
        example_nsec("ns1.example."),
        nsec("*.example.", "a.example.", &[A, RRSIG, NSEC]),
    ];
    let plan = nsec::plan_no_data(&chain, &name("ns1.example."), MX).unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.records[0].name, name("ns1.example."));
}

#[test]
fn test_no_data_plan_wildcard_without_no_name_proof_fails() {
    let chain = vec![example_nsec("*.w.example.")];
    let err = nsec::plan_no_data(&chain, &name("a.z.w.example."), RecordType::AAAA).unwrap_err();
    assert_eq!(err, ProofError::NoClosestEncloser(name("a.z.w.example.")));
}

#[test]
fn test_no_data_plan_type_present_fails() {
    let chain = vec![example_nsec("ns1.example.")];
    let err = nsec::plan_no_data(&chain, &name("ns1.example."), RecordType::A).unwrap_err();
    assert_eq!(
        err,
        ProofError::TypeNotDisproven {
            name: name("ns1.example."),
            qtype: RecordType::A
        }
    );
}

#[test]
fn test_wildcard_answer_plan() {
    let chain = example_nsec_zone();
    let plan = nsec::plan_wildcard_answer(&chain, &name("a.z.w.example."), RecordType::MX, &name("w.example."))
        .unwrap()
        .unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.records[0].name, name("x.y.w.example."));
}

#[test]
fn test_wildcard_answer_from_wrong_encloser() {
    let chain = example_nsec_zone();
    let result = nsec::plan_wildcard_answer(&chain, &name("a.z.w.example."), RecordType::MX, &name("example."))
        .unwrap();
    assert_eq!(
        result.unwrap_err(),
        ProofError::ClosestEncloserMismatch(name("a.z.w.example."))
    );
}

#[test]
fn test_wildcard_answer_without_nsec_is_none() {
    let chain = vec![example_nsec("ns1.example.")];
    assert!(nsec::plan_wildcard_answer(&chain, &name("a.z.w.example."), RecordType::MX, &name("w.example."))
        .is_none());
}

#[test]
fn test_insecure_delegation_detected() {
    let now = Instant::now();
    let chain = signed(&[example_nsec("b.example.")]);
    let mut group = CacheGroup::new(name("b.example."));
    group.push(negative("b.example.", RecordType::DS, Rcode::NoError, chain, now));

    let found = nsec::nsec_record_is_delegation(Some(&group), &name("b.example."), RecordType::DS);
    assert_eq!(found.map(|rr| rr.name), Some(name("b.example.")));
}

#[test]
fn test_signed_delegation_is_not_insecure() {
    let now = Instant::now();
    let chain = signed(&[example_nsec("a.example.")]);
    let mut group = CacheGroup::new(name("a.example."));
    group.push(negative("a.example.", RecordType::DS, Rcode::NoError, chain, now));

    assert!(nsec::nsec_record_is_delegation(Some(&group), &name("a.example."), RecordType::DS).is_none());
    assert!(nsec::nsec_record_is_delegation(None, &name("a.example."), RecordType::DS).is_none());
}
