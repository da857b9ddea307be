//! Checks an inbound client packet before any state is created for it.

use crate::dns::wire::{locate_opt, parse_opt, read_question, EdnsInfo, Header};
use ferrous_dnsproxy_application::ClientHandle;
use ferrous_dnsproxy_domain::{DnsQuestion, MessageFlags, Rcode, HEADER_LEN};
use std::fmt;
use thiserror::Error;

/// QR plus the four opcode bits: anything set means not a standard query.
const NOT_A_QUERY_MASK: u8 = 0xF8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("interface {0} is not an input interface")]
    InterfaceNotAllowed(u32),

    #[error("packet of {0} octets is shorter than a header")]
    TooShort(usize),

    #[error("not a standard query (flags 0x{0:02x})")]
    NotImplemented(u8),

    #[error("malformed query: {0}")]
    FormatError(FormatIssue),

    #[error("duplicate of {0}")]
    Duplicate(ClientHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatIssue {
    SectionCounts,
    Question,
}

impl fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatIssue::SectionCounts => write!(f, "expected one question and no answers"),
            FormatIssue::Question => write!(f, "question does not parse"),
        }
    }
}

impl Rejection {
    /// Rcode to answer with; `None` means drop silently.
    pub fn reply_rcode(&self) -> Option<Rcode> {
        match self {
            Rejection::NotImplemented(_) => Some(Rcode::NotImp),
            Rejection::FormatError(_) => Some(Rcode::FormErr),
            Rejection::InterfaceNotAllowed(_) | Rejection::TooShort(_) | Rejection::Duplicate(_) => {
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdmittedQuery {
    pub id: u16,
    pub flags: MessageFlags,
    pub question: DnsQuestion,
    /// `None` when the client sent no OPT record or one that does not parse.
    pub edns: Option<EdnsInfo>,
}

impl AdmittedQuery {
    pub fn dnssec_ok(&self) -> bool {
        self.edns.as_ref().is_some_and(|e| e.dnssec_ok)
    }
}

/// Header, opcode, section count and question checks, in that order.
pub fn inspect_query(packet: &[u8]) -> Result<AdmittedQuery, Rejection> {
    if packet.len() < HEADER_LEN {
        return Err(Rejection::TooShort(packet.len()));
    }
    if packet[2] & NOT_A_QUERY_MASK != 0 {
        return Err(Rejection::NotImplemented(packet[2]));
    }

    let header = Header::parse(packet).map_err(|_| Rejection::TooShort(packet.len()))?;
    if header.qdcount != 1 || header.ancount != 0 || header.nscount != 0 {
        return Err(Rejection::FormatError(FormatIssue::SectionCounts));
    }

    let question =
        read_question(packet).map_err(|_| Rejection::FormatError(FormatIssue::Question))?;

    let edns = locate_opt(packet, &header).and_then(|range| parse_opt(&packet[range]));

    Ok(AdmittedQuery {
        id: header.id,
        flags: header.flags,
        question,
        edns,
    })
}

/// Error reply: the request header with QR set and the rcode octet
/// replaced, followed by the rest of the request, capped at `limit`.
pub fn error_reply(packet: &[u8], rcode: Rcode, limit: usize) -> Option<Vec<u8>> {
    if packet.len() < HEADER_LEN {
        return None;
    }
    let len = packet.len().min(limit.max(HEADER_LEN));
    let mut reply = packet[..len].to_vec();
    reply[2] |= 0x80;
    reply[3] = rcode.to_u8();
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reply_echoes_request() {
        let packet = [
            0xab, 0xcd, // id
            0x01, 0x30, // RD, AD, CD
            0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // qd=2
            0x01, b'a', 0x00, 0x00, 0x01, 0x00, 0x01,
        ];
        let reply = error_reply(&packet, Rcode::FormErr, 8940).unwrap();
        assert_eq!(&reply[..2], &[0xab, 0xcd]);
        assert_eq!(reply[2], 0x81);
        assert_eq!(reply[3], 0x01);
        assert_eq!(&reply[4..], &packet[4..]);

        let capped = error_reply(&packet, Rcode::FormErr, 14).unwrap();
        assert_eq!(capped.len(), 14);
    }

    #[test]
    fn question_with_forward_pointer_is_a_format_error() {
        let packet = [
            0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0xc0, 0x10, 0x00, 0x01, 0x00, 0x01,
        ];
        assert_eq!(
            inspect_query(&packet).map(|q| q.id),
            Err(Rejection::FormatError(FormatIssue::Question))
        );
    }

    #[test]
    fn opt_record_is_found_after_the_question() {
        let mut packet = vec![
            0x00, 0x02, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, //
            0x07, b'E', b'x', b'a', b'm', b'p', b'l', b'e', 0x00, 0x00, 0x01, 0x00, 0x01,
        ];
        packet.extend_from_slice(&[0x00, 0x00, 0x29, 0x04, 0xd0, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00]);

        let admitted = inspect_query(&packet).unwrap();
        assert_eq!(admitted.question.name.to_string(), "Example.");
        assert!(admitted.dnssec_ok());
        assert_eq!(admitted.edns.map(|e| e.udp_payload_size), Some(1232));
    }
}
