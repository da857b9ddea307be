use super::record_map::{codec, RecordMapper};
use super::{parse_opt, EdnsInfo, Header, WireError};
use ferrous_dnsproxy_domain::{DnsQuestion, ResourceRecord, HEADER_LEN};
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::{Record, RecordType as HickoryRecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder};
use std::ops::Range;

/// A fully decoded message, used when ingesting upstream responses.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub header: Header,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    /// Additional records other than the OPT pseudo-record.
    pub additionals: Vec<ResourceRecord>,
    pub edns: Option<EdnsInfo>,
}

impl ParsedMessage {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, WireError> {
        let header = Header::parse(buf)?;
        let message = Message::from_vec(buf).map_err(codec)?;

        Ok(Self {
            header,
            questions: message
                .queries()
                .iter()
                .map(RecordMapper::question_from_hickory)
                .collect::<Result<_, _>>()?,
            answers: map_records(message.answers())?,
            authorities: map_records(message.name_servers())?,
            additionals: map_records(message.additionals())?,
            edns: locate_opt(buf, &header).and_then(|range| parse_opt(&buf[range])),
        })
    }
}

fn map_records(records: &[Record]) -> Result<Vec<ResourceRecord>, WireError> {
    records
        .iter()
        .map(RecordMapper::record_from_hickory)
        .collect()
}

/// Decodes the first question of `packet` without touching later sections.
pub fn read_question(packet: &[u8]) -> Result<DnsQuestion, WireError> {
    let mut decoder = BinDecoder::new(packet);
    decoder.read_slice(HEADER_LEN).map_err(codec)?;
    let query = Query::read(&mut decoder).map_err(codec)?;
    RecordMapper::question_from_hickory(&query)
}

/// Byte range of the first OPT record in the additional section.
///
/// Returns `None` when there is no OPT record or any record before it
/// fails to decode.
pub fn locate_opt(packet: &[u8], header: &Header) -> Option<Range<usize>> {
    let mut decoder = BinDecoder::new(packet);
    decoder.read_slice(HEADER_LEN).ok()?;
    for _ in 0..header.qdcount {
        Query::read(&mut decoder).ok()?;
    }
    for _ in 0..u32::from(header.ancount) + u32::from(header.nscount) {
        Record::read(&mut decoder).ok()?;
    }
    for _ in 0..header.arcount {
        let start = decoder.index();
        let record = Record::read(&mut decoder).ok()?;
        if record.record_type() == HickoryRecordType::OPT {
            return Some(start..decoder.index());
        }
    }
    None
}
