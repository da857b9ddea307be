use crate::dns::wire::RecordMapper;
use ferrous_dnsproxy_application::{RrsetVerification, RrsetVerifier, VerificationPoll};
use ferrous_dnsproxy_domain::dns_record::rdata::{
    DnskeyData, DsData, RrsigData, DIGEST_SHA1, DIGEST_SHA256, DIGEST_SHA384,
};
use ferrous_dnsproxy_domain::{DnssecStatus, DomainError, DomainName, ResourceRecord};
use hickory_proto::dnssec::rdata::sig::SigInput;
use hickory_proto::dnssec::tbs::TBS;
use hickory_proto::dnssec::Algorithm;
use hickory_proto::rr::SerialNumber;
use ring::signature;
use sha1::Digest as Sha1Digest;
use sha2::{Sha256, Sha384};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Checks RRSIGs against DNSKEYs that the chain-of-trust code has already
/// authenticated. Every request is answered synchronously.
#[derive(Debug, Clone, Default)]
pub struct KeyedRrsetVerifier {
    keys: Vec<(DomainName, DnskeyData)>,
    /// Fixed clock for signature windows; `None` reads the system time.
    now: Option<u32>,
}

impl KeyedRrsetVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time(now: u32) -> Self {
        Self {
            keys: Vec::new(),
            now: Some(now),
        }
    }

    pub fn add_key(&mut self, owner: DomainName, key: DnskeyData) {
        self.keys.push((owner, key));
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    fn current_time(&self) -> u32 {
        self.now.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        })
    }

    /// Status of `rrset` given its covering signatures: Secure if any of them
    /// verifies under a known key, Indeterminate if no known key could have
    /// made any of them, Bogus otherwise.
    pub fn verify_rrset(&self, rrset: &[ResourceRecord], signatures: &[ResourceRecord]) -> DnssecStatus {
        let mut any_key = false;

        for sig in signatures {
            let Some(rrsig) = sig.as_rrsig() else { continue };
            for (owner, key) in &self.keys {
                if owner != &rrsig.signer_name {
                    continue;
                }
                any_key = true;
                match self.verify_rrsig(rrsig, key, rrset) {
                    Ok(true) => return DnssecStatus::Secure,
                    Ok(false) => {}
                    Err(e) => {
                        debug!(signer = %rrsig.signer_name, error = %e, "signature check failed");
                    }
                }
            }
        }

        if any_key {
            DnssecStatus::Bogus
        } else {
            DnssecStatus::Indeterminate
        }
    }

    pub fn verify_rrsig(
        &self,
        rrsig: &RrsigData,
        dnskey: &DnskeyData,
        rrset: &[ResourceRecord],
    ) -> Result<bool, DomainError> {
        if !rrsig.is_valid_at(self.current_time()) {
            return Ok(false);
        }

        if dnskey.key_tag() != rrsig.key_tag {
            return Ok(false);
        }

        if dnskey.algorithm != rrsig.algorithm {
            return Ok(false);
        }

        let data = signed_data(rrsig, rrset)?;
        let sig = rrsig.signature.as_slice();

        match rrsig.algorithm {
            5 | 7 => verify_rsa(&signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY, &data, sig, dnskey),
            8 => verify_rsa(&signature::RSA_PKCS1_2048_8192_SHA256, &data, sig, dnskey),
            10 => verify_rsa(&signature::RSA_PKCS1_2048_8192_SHA512, &data, sig, dnskey),
            13 => verify_ecdsa(&signature::ECDSA_P256_SHA256_FIXED, 64, &data, sig, dnskey),
            14 => verify_ecdsa(&signature::ECDSA_P384_SHA384_FIXED, 96, &data, sig, dnskey),
            15 => verify_ed25519(&data, sig, dnskey),
            other => Err(DomainError::UnsupportedAlgorithm(other)),
        }
    }
}

impl RrsetVerifier for KeyedRrsetVerifier {
    fn verify(&mut self, request: RrsetVerification) -> VerificationPoll {
        let status = self.verify_rrset(&request.rrset, &request.signatures);
        debug!(ticket = request.ticket.0, status = %status, "RRset verified");
        VerificationPoll::Ready(status)
    }
}

/// RFC 4034 §3.1.8.1 signed data, built by hickory's `TBS`: RRSIG RDATA
/// without the signature, then each RR in canonical form and order with the
/// original TTL. Wildcard owners are rebuilt from the labels field.
pub fn signed_data(rrsig: &RrsigData, rrset: &[ResourceRecord]) -> Result<Vec<u8>, DomainError> {
    let first = rrset
        .first()
        .ok_or_else(|| DomainError::DnssecValidationFailed("empty RRset".to_string()))?;

    let records = rrset
        .iter()
        .map(|rr| RecordMapper::record_to_hickory(rr, rr.ttl))
        .collect::<Result<Vec<_>, _>>()
        .map_err(invalid)?;
    let name = RecordMapper::name_to_hickory(&first.name).map_err(invalid)?;
    let class = RecordMapper::class_to_hickory(first.class).map_err(invalid)?;

    let sig_input = SigInput {
        type_covered: RecordMapper::type_to_hickory(rrsig.type_covered),
        algorithm: Algorithm::from_u8(rrsig.algorithm),
        num_labels: rrsig.labels,
        original_ttl: rrsig.original_ttl,
        sig_expiration: SerialNumber::from(rrsig.signature_expiration),
        sig_inception: SerialNumber::from(rrsig.signature_inception),
        key_tag: rrsig.key_tag,
        signer_name: RecordMapper::name_to_hickory(&rrsig.signer_name.to_lowercase())
            .map_err(invalid)?,
    };

    let tbs = TBS::from_input(&name, class, &sig_input, records.iter()).map_err(invalid)?;
    Ok(tbs.as_ref().to_vec())
}

fn invalid<E: std::fmt::Display>(error: E) -> DomainError {
    DomainError::DnssecValidationFailed(error.to_string())
}

/// DS digest over the DNSKEY's owner and RDATA (RFC 4034 §5.1.4).
pub fn verify_ds(ds: &DsData, dnskey: &DnskeyData, owner: &DomainName) -> Result<bool, DomainError> {
    if dnskey.key_tag() != ds.key_tag || dnskey.algorithm != ds.algorithm {
        return Ok(false);
    }
    Ok(dnskey_digest(dnskey, owner, ds.digest_type)? == ds.digest)
}

pub fn dnskey_digest(dnskey: &DnskeyData, owner: &DomainName, digest_type: u8) -> Result<Vec<u8>, DomainError> {
    let mut dnskey_data = owner.canonical_wire();
    dnskey_data.extend_from_slice(&dnskey.flags.to_be_bytes());
    dnskey_data.push(dnskey.protocol);
    dnskey_data.push(dnskey.algorithm);
    dnskey_data.extend_from_slice(&dnskey.public_key);

    let digest = match digest_type {
        DIGEST_SHA1 => {
            let mut hasher = sha1::Sha1::new();
            hasher.update(&dnskey_data);
            hasher.finalize().to_vec()
        }
        DIGEST_SHA256 => {
            let mut hasher = Sha256::new();
            hasher.update(&dnskey_data);
            hasher.finalize().to_vec()
        }
        DIGEST_SHA384 => {
            let mut hasher = Sha384::new();
            hasher.update(&dnskey_data);
            hasher.finalize().to_vec()
        }
        _ => {
            return Err(DomainError::InvalidTrustAnchor(format!(
                "Unsupported DS digest type: {}",
                digest_type
            )))
        }
    };
    Ok(digest)
}

fn verify_rsa(
    algorithm: &'static signature::RsaParameters,
    data: &[u8],
    sig: &[u8],
    dnskey: &DnskeyData,
) -> Result<bool, DomainError> {
    let (exponent, modulus) = parse_rsa_key(&dnskey.public_key)?;
    let public_key = signature::RsaPublicKeyComponents {
        n: modulus,
        e: exponent,
    };
    Ok(public_key.verify(algorithm, data, sig).is_ok())
}

fn verify_ecdsa(
    algorithm: &'static signature::EcdsaVerificationAlgorithm,
    key_len: usize,
    data: &[u8],
    sig: &[u8],
    dnskey: &DnskeyData,
) -> Result<bool, DomainError> {
    if dnskey.public_key.len() != key_len {
        return Err(DomainError::MalformedRecord(format!(
            "ECDSA public key of {} octets, expected {}",
            dnskey.public_key.len(),
            key_len
        )));
    }
    if sig.len() != key_len {
        return Ok(false);
    }

    // ring expects an uncompressed SEC1 point
    let mut pk = Vec::with_capacity(key_len + 1);
    pk.push(0x04);
    pk.extend_from_slice(&dnskey.public_key);

    let public_key = signature::UnparsedPublicKey::new(algorithm, &pk);
    Ok(public_key.verify(data, sig).is_ok())
}

fn verify_ed25519(data: &[u8], sig: &[u8], dnskey: &DnskeyData) -> Result<bool, DomainError> {
    if dnskey.public_key.len() != 32 {
        return Err(DomainError::MalformedRecord(
            "Invalid Ed25519 public key length".into(),
        ));
    }
    if sig.len() != 64 {
        return Ok(false);
    }

    let public_key = signature::UnparsedPublicKey::new(&signature::ED25519, &dnskey.public_key);
    Ok(public_key.verify(data, sig).is_ok())
}

/// Splits an RFC 3110 key into exponent and modulus.
fn parse_rsa_key(key_data: &[u8]) -> Result<(&[u8], &[u8]), DomainError> {
    let Some(&first_byte) = key_data.first() else {
        return Err(DomainError::MalformedRecord("Empty RSA public key".into()));
    };

    let (exp_len, exp_start) = if first_byte == 0 {
        if key_data.len() < 3 {
            return Err(DomainError::MalformedRecord(
                "RSA key too short for long form".into(),
            ));
        }
        (u16::from_be_bytes([key_data[1], key_data[2]]) as usize, 3)
    } else {
        (first_byte as usize, 1)
    };

    let exp_end = exp_start + exp_len;
    if exp_end >= key_data.len() {
        return Err(DomainError::MalformedRecord(
            "RSA exponent leaves no modulus".into(),
        ));
    }

    Ok((&key_data[exp_start..exp_end], &key_data[exp_end..]))
}
