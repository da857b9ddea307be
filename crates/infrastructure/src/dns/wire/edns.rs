use ferrous_dnsproxy_domain::RecordType;

/// OPT pseudo-record advertising a 4096 byte payload, no extended rcode,
/// version 0, no flags and no options.
pub const OPT_RECORD: [u8; 11] = [
    0x00, 0x00, 0x29, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// What the proxy keeps from a client's OPT record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnsInfo {
    /// Requestor's UDP payload size, carried in the OPT CLASS field.
    pub udp_payload_size: u16,
    pub dnssec_ok: bool,
    /// The whole OPT record as received, mirrored on upstream queries.
    pub raw: Vec<u8>,
}

/// Reads an OPT record laid out as root owner, TYPE, CLASS, TTL, RDLENGTH, RDATA.
///
/// Returns `None` for anything that does not look like one. Callers treat
/// that as a client without EDNS0 support.
pub fn parse_opt(raw: &[u8]) -> Option<EdnsInfo> {
    if raw.len() < OPT_RECORD.len() || raw[0] != 0 {
        return None;
    }
    let fixed = &raw[1..];
    let rtype = u16::from_be_bytes([fixed[0], fixed[1]]);
    if RecordType::from_u16(rtype) != RecordType::OPT {
        return None;
    }
    let rdlength = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;
    if OPT_RECORD.len() + rdlength != raw.len() {
        return None;
    }

    Some(EdnsInfo {
        udp_payload_size: u16::from_be_bytes([fixed[2], fixed[3]]),
        // DO is the top bit of the flags half of the TTL field
        dnssec_ok: fixed[6] & 0x80 != 0,
        raw: raw.to_vec(),
    })
}
