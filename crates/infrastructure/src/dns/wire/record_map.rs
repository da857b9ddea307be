//! Conversions between the domain record model and hickory-proto records.

use super::WireError;
use ferrous_dnsproxy_domain::dns_record::rdata::{
    DnskeyData, DsData, Nsec3Data, NsecData, RrsigData, SoaData, TypeBitmap,
};
use ferrous_dnsproxy_domain::{DnsQuestion, DomainName, RData, RecordType, ResourceRecord};
use hickory_proto::dnssec::rdata::{DNSSECRData, DNSKEY as HickoryDNSKEY, DS, NSEC, NSEC3, RRSIG};
use hickory_proto::dnssec::{Algorithm, DigestType, Nsec3HashAlgorithm, PublicKey, PublicKeyBuf};
use hickory_proto::op::Query;
use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, NULL, PTR, SOA};
use hickory_proto::rr::{
    DNSClass, Name, RData as HickoryRData, Record, RecordType as HickoryRecordType,
};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use std::borrow::Borrow;

pub struct RecordMapper;

impl RecordMapper {
    pub fn type_to_hickory(rtype: RecordType) -> HickoryRecordType {
        HickoryRecordType::from(rtype.to_u16())
    }

    pub fn type_from_hickory(rtype: HickoryRecordType) -> RecordType {
        RecordType::from_u16(u16::from(rtype))
    }

    pub fn class_to_hickory(class: u16) -> Result<DNSClass, WireError> {
        DNSClass::from_bytes(&class.to_be_bytes()).map_err(codec)
    }

    pub fn name_to_hickory(name: &DomainName) -> Result<Name, WireError> {
        Name::from_bytes(name.as_wire()).map_err(codec)
    }

    pub fn name_from_hickory(name: &Name) -> Result<DomainName, WireError> {
        let wire = name.to_bytes().map_err(codec)?;
        let (name, _) = DomainName::from_wire(&wire)?;
        Ok(name)
    }

    pub fn question_to_hickory(question: &DnsQuestion) -> Result<Query, WireError> {
        let mut query = Query::new();
        query
            .set_name(Self::name_to_hickory(&question.name)?)
            .set_query_type(Self::type_to_hickory(question.qtype))
            .set_query_class(Self::class_to_hickory(question.qclass)?);
        Ok(query)
    }

    pub fn question_from_hickory(query: &Query) -> Result<DnsQuestion, WireError> {
        Ok(DnsQuestion::with_class(
            Self::name_from_hickory(query.name())?,
            Self::type_from_hickory(query.query_type()),
            u16::from(query.query_class()),
        ))
    }

    pub fn record_from_hickory(record: &Record) -> Result<ResourceRecord, WireError> {
        Ok(ResourceRecord {
            name: Self::name_from_hickory(record.name())?,
            rtype: Self::type_from_hickory(record.record_type()),
            class: u16::from(record.dns_class()),
            ttl: record.ttl(),
            rdata: Self::rdata_from_hickory(record.data())?,
        })
    }

    /// `ttl` replaces the TTL stored on the record.
    pub fn record_to_hickory(record: &ResourceRecord, ttl: u32) -> Result<Record, WireError> {
        let rdata = Self::rdata_to_hickory(record.rtype, &record.rdata)?;
        let mut out = Record::from_rdata(Self::name_to_hickory(&record.name)?, ttl, rdata);
        out.set_dns_class(Self::class_to_hickory(record.class)?);
        Ok(out)
    }

    fn rdata_from_hickory(data: &HickoryRData) -> Result<RData, WireError> {
        let name = Self::name_from_hickory;
        Ok(match data {
            HickoryRData::A(a) => RData::A(a.0),
            HickoryRData::AAAA(aaaa) => RData::Aaaa(aaaa.0),
            HickoryRData::CNAME(target) => RData::Cname(name(&target.0)?),
            HickoryRData::NS(target) => RData::Ns(name(&target.0)?),
            HickoryRData::PTR(target) => RData::Ptr(name(&target.0)?),
            HickoryRData::MX(mx) => RData::Mx {
                preference: mx.preference(),
                exchange: name(mx.exchange())?,
            },
            HickoryRData::SOA(soa) => RData::Soa(SoaData {
                mname: name(soa.mname())?,
                rname: name(soa.rname())?,
                serial: soa.serial(),
                refresh: soa.refresh() as u32,
                retry: soa.retry() as u32,
                expire: soa.expire() as u32,
                minimum: soa.minimum(),
            }),
            HickoryRData::DNSSEC(DNSSECRData::NSEC(nsec)) => RData::Nsec(NsecData {
                next_name: name(nsec.next_domain_name())?,
                types: types_from_hickory(nsec.type_bit_maps()),
            }),
            HickoryRData::DNSSEC(DNSSECRData::NSEC3(nsec3)) => RData::Nsec3(Nsec3Data {
                hash_algorithm: u8::from(nsec3.hash_algorithm()),
                flags: nsec3.flags(),
                iterations: nsec3.iterations(),
                salt: nsec3.salt().to_vec(),
                next_hashed_owner: nsec3.next_hashed_owner_name().to_vec(),
                types: types_from_hickory(nsec3.type_bit_maps()),
            }),
            HickoryRData::DNSSEC(DNSSECRData::RRSIG(rrsig)) => {
                let input = rrsig.input();
                RData::Rrsig(RrsigData {
                    type_covered: Self::type_from_hickory(input.type_covered),
                    algorithm: u8::from(input.algorithm),
                    labels: input.num_labels,
                    original_ttl: input.original_ttl,
                    signature_expiration: input.sig_expiration.get(),
                    signature_inception: input.sig_inception.get(),
                    key_tag: input.key_tag,
                    signer_name: name(&input.signer_name)?,
                    signature: rrsig.sig().to_vec(),
                })
            }
            HickoryRData::DNSSEC(DNSSECRData::DNSKEY(dnskey)) => {
                let pk = dnskey.public_key();
                RData::Dnskey(DnskeyData {
                    flags: dnskey.flags(),
                    protocol: 3,
                    algorithm: u8::from(<dyn PublicKey>::algorithm(pk)),
                    public_key: <dyn PublicKey>::public_bytes(pk).to_vec(),
                })
            }
            HickoryRData::DNSSEC(DNSSECRData::DS(ds)) => RData::Ds(DsData::new(
                ds.key_tag(),
                u8::from(ds.algorithm()),
                u8::from(ds.digest_type()),
                ds.digest().to_vec(),
            )?),
            HickoryRData::Unknown { rdata, .. } => RData::Unknown(rdata.anything().to_vec()),
            other => RData::Unknown(other.to_bytes().map_err(codec)?),
        })
    }

    fn rdata_to_hickory(rtype: RecordType, data: &RData) -> Result<HickoryRData, WireError> {
        let name = Self::name_to_hickory;
        Ok(match data {
            RData::A(addr) => HickoryRData::A(A(*addr)),
            RData::Aaaa(addr) => HickoryRData::AAAA(AAAA(*addr)),
            RData::Cname(target) => HickoryRData::CNAME(CNAME(name(target)?)),
            RData::Ns(target) => HickoryRData::NS(NS(name(target)?)),
            RData::Ptr(target) => HickoryRData::PTR(PTR(name(target)?)),
            RData::Mx {
                preference,
                exchange,
            } => HickoryRData::MX(MX::new(*preference, name(exchange)?)),
            RData::Soa(soa) => HickoryRData::SOA(SOA::new(
                name(&soa.mname)?,
                name(&soa.rname)?,
                soa.serial,
                soa.refresh as i32,
                soa.retry as i32,
                soa.expire as i32,
                soa.minimum,
            )),
            RData::Nsec(nsec) => HickoryRData::DNSSEC(DNSSECRData::NSEC(NSEC::new(
                name(&nsec.next_name)?,
                types_to_hickory(&nsec.types),
            ))),
            RData::Nsec3(nsec3) => {
                let algorithm = Nsec3HashAlgorithm::from_u8(nsec3.hash_algorithm).map_err(|_| {
                    WireError::Unsupported(format!("NSEC3 hash algorithm {}", nsec3.hash_algorithm))
                })?;
                HickoryRData::DNSSEC(DNSSECRData::NSEC3(NSEC3::new(
                    algorithm,
                    nsec3.opt_out(),
                    nsec3.iterations,
                    nsec3.salt.clone(),
                    nsec3.next_hashed_owner.clone(),
                    types_to_hickory(&nsec3.types),
                )))
            }
            RData::Rrsig(rrsig) => HickoryRData::DNSSEC(DNSSECRData::RRSIG(RRSIG::new(
                Self::type_to_hickory(rrsig.type_covered),
                Algorithm::from_u8(rrsig.algorithm),
                rrsig.labels,
                rrsig.original_ttl,
                rrsig.signature_expiration.into(),
                rrsig.signature_inception.into(),
                rrsig.key_tag,
                name(&rrsig.signer_name)?,
                rrsig.signature.clone(),
            ))),
            RData::Dnskey(key) => HickoryRData::DNSSEC(DNSSECRData::DNSKEY(
                HickoryDNSKEY::with_flags(
                    key.flags,
                    PublicKeyBuf::new(key.public_key.clone(), Algorithm::from_u8(key.algorithm)),
                ),
            )),
            RData::Ds(ds) => {
                let digest_type = DigestType::try_from(ds.digest_type).map_err(|_| {
                    WireError::Unsupported(format!("DS digest type {}", ds.digest_type))
                })?;
                HickoryRData::DNSSEC(DNSSECRData::DS(DS::new(
                    ds.key_tag,
                    Algorithm::from_u8(ds.algorithm),
                    digest_type,
                    ds.digest.clone(),
                )))
            }
            RData::Unknown(raw) => HickoryRData::Unknown {
                code: Self::type_to_hickory(rtype).into(),
                rdata: if raw.is_empty() {
                    NULL::new()
                } else {
                    NULL::with(raw.clone())
                },
            },
        })
    }
}

fn types_from_hickory<T, I>(types: I) -> TypeBitmap
where
    T: Borrow<HickoryRecordType>,
    I: IntoIterator<Item = T>,
{
    types
        .into_iter()
        .map(|rtype| RecordMapper::type_from_hickory(*rtype.borrow()))
        .collect()
}

fn types_to_hickory(types: &TypeBitmap) -> Vec<HickoryRecordType> {
    types
        .types()
        .into_iter()
        .map(RecordMapper::type_to_hickory)
        .collect()
}

pub(super) fn codec<E: std::fmt::Display>(error: E) -> WireError {
    WireError::Codec(error.to_string())
}
