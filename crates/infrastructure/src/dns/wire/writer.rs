use super::record_map::{codec, RecordMapper};
use super::WireError;
use ferrous_dnsproxy_domain::{DnsQuestion, MessageFlags, ResourceRecord};
use hickory_proto::op::Query;
use hickory_proto::rr::Record;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl Section {
    fn count_index(self) -> usize {
        match self {
            Section::Question => 0,
            Section::Answer => 1,
            Section::Authority => 2,
            Section::Additional => 3,
        }
    }
}

#[derive(Debug)]
enum Content {
    Question(Query),
    Record(Record),
    Raw(Vec<u8>),
}

#[derive(Debug)]
struct Entry {
    section: Section,
    content: Content,
    /// Size limit in force when the entry was added.
    limit: usize,
}

/// An encoded message and whether entries were left out to respect the limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

/// Collects a message and encodes it with hickory's `BinEncoder`.
///
/// Entries are emitted section by section in the order they were added.
/// The first entry that does not fit under the limit in force when it was
/// added ends the message: it and everything after it are dropped and the
/// message is reported as truncated.
#[derive(Debug)]
pub struct MessageWriter {
    id: u16,
    flags: MessageFlags,
    limit: usize,
    entries: Vec<Entry>,
    tc_on_truncation: bool,
}

impl MessageWriter {
    pub fn new(id: u16, flags: MessageFlags, limit: usize) -> Self {
        Self {
            id,
            flags,
            limit,
            entries: Vec::new(),
            tc_on_truncation: false,
        }
    }

    pub fn flags(&self) -> MessageFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: MessageFlags) {
        self.flags = flags;
    }

    /// Sets TC in the header when [`finish`](Self::finish) has to truncate.
    pub fn set_tc_on_truncation(&mut self, enabled: bool) {
        self.tc_on_truncation = enabled;
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Raises or lowers the limit for entries added from now on.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    pub fn count(&self, section: Section) -> usize {
        self.entries.iter().filter(|e| e.section == section).count()
    }

    pub fn add_question(&mut self, question: &DnsQuestion) -> Result<(), WireError> {
        let query = RecordMapper::question_to_hickory(question)?;
        self.push(Section::Question, Content::Question(query));
        Ok(())
    }

    /// Adds `record` with `ttl` in place of its stored TTL.
    pub fn add_record(
        &mut self,
        section: Section,
        record: &ResourceRecord,
        ttl: u32,
    ) -> Result<(), WireError> {
        let record = RecordMapper::record_to_hickory(record, ttl)?;
        self.push(section, Content::Record(record));
        Ok(())
    }

    /// Adds an already encoded additional record, such as an OPT.
    pub fn add_raw_additional(&mut self, raw: &[u8]) {
        self.push(Section::Additional, Content::Raw(raw.to_vec()));
    }

    fn push(&mut self, section: Section, content: Content) {
        self.entries.push(Entry {
            section,
            content,
            limit: self.limit,
        });
    }

    pub fn finish(mut self) -> Result<EncodedMessage, WireError> {
        self.entries.sort_by_key(|entry| entry.section.count_index());

        let mut bytes = Vec::with_capacity(self.limit.min(4096));
        let mut encoder = BinEncoder::new(&mut bytes);
        encoder.emit_u16(self.id).map_err(codec)?;
        let flags_at = encoder.place::<u16>().map_err(codec)?;
        let qd_at = encoder.place::<u16>().map_err(codec)?;
        let an_at = encoder.place::<u16>().map_err(codec)?;
        let ns_at = encoder.place::<u16>().map_err(codec)?;
        let ar_at = encoder.place::<u16>().map_err(codec)?;

        let mut counts = [0u16; 4];
        let mut truncated = false;
        for entry in &self.entries {
            encoder.set_max_size(max_size(entry.limit));
            let mark = encoder.offset();
            let emitted = match &entry.content {
                Content::Question(query) => query.emit(&mut encoder),
                Content::Record(record) => record.emit(&mut encoder),
                Content::Raw(raw) => encoder.emit_vec(raw),
            };
            if let Err(e) = emitted {
                debug!(section = ?entry.section, limit = entry.limit, error = %e, "message truncated");
                encoder.set_offset(mark);
                encoder.trim();
                truncated = true;
                break;
            }
            let slot = &mut counts[entry.section.count_index()];
            *slot = slot.saturating_add(1);
        }

        let flags = self
            .flags
            .with(MessageFlags::TC, self.flags.truncated() || (truncated && self.tc_on_truncation));
        encoder.set_max_size(u16::MAX);
        flags_at.replace(&mut encoder, flags.0).map_err(codec)?;
        qd_at.replace(&mut encoder, counts[0]).map_err(codec)?;
        an_at.replace(&mut encoder, counts[1]).map_err(codec)?;
        ns_at.replace(&mut encoder, counts[2]).map_err(codec)?;
        ar_at.replace(&mut encoder, counts[3]).map_err(codec)?;

        Ok(EncodedMessage { bytes, truncated })
    }
}

fn max_size(limit: usize) -> u16 {
    u16::try_from(limit).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_dnsproxy_domain::{DomainName, RData, RecordType};
    use std::net::Ipv4Addr;

    fn name(s: &str) -> DomainName {
        s.parse().unwrap()
    }

    #[test]
    fn owner_names_point_back_at_the_question() {
        let mut writer = MessageWriter::new(7, MessageFlags(0x8180), 512);
        writer
            .add_question(&DnsQuestion::new(name("www.example.com."), RecordType::A))
            .unwrap();
        let rr = ResourceRecord::new(
            name("www.example.com."),
            RecordType::A,
            60,
            RData::A(Ipv4Addr::new(192, 0, 2, 1)),
        );
        writer.add_record(Section::Answer, &rr, 30).unwrap();

        let msg = writer.finish().unwrap();
        assert!(!msg.truncated);
        let msg = msg.bytes;
        // header + question (17 + 4) + pointer record (2 + 10 + 4)
        assert_eq!(msg.len(), 12 + 21 + 16);
        assert_eq!(&msg[2..4], &[0x81, 0x80]);
        assert_eq!(&msg[33..35], &[0xC0, 0x0C]);
        assert_eq!(&msg[39..43], &30u32.to_be_bytes());
        assert_eq!(&msg[4..8], &[0, 1, 0, 1]);
    }

    #[test]
    fn overflow_drops_the_record_and_everything_after() {
        let mut writer = MessageWriter::new(1, MessageFlags(0), 40);
        writer
            .add_question(&DnsQuestion::new(name("a.example."), RecordType::CNAME))
            .unwrap();

        let rr = ResourceRecord::new(
            name("a.example."),
            RecordType::CNAME,
            60,
            RData::Cname(name("a-rather-long-target-label.elsewhere.test.")),
        );
        writer.add_record(Section::Answer, &rr, 60).unwrap();
        writer.add_raw_additional(&super::super::OPT_RECORD);
        writer.set_tc_on_truncation(true);

        let msg = writer.finish().unwrap();
        assert!(msg.truncated);
        // header + question (11 + 4)
        assert_eq!(msg.bytes.len(), 12 + 15);
        assert_eq!(&msg.bytes[4..12], &[0, 1, 0, 0, 0, 0, 0, 0]);
        assert_ne!(msg.bytes[2] & 0x02, 0);
    }

    #[test]
    fn sections_are_emitted_in_order() {
        let mut writer = MessageWriter::new(2, MessageFlags(0), 512);
        writer.add_raw_additional(&super::super::OPT_RECORD);
        writer
            .add_record(
                Section::Answer,
                &ResourceRecord::new(name("a."), RecordType::A, 60, RData::A(Ipv4Addr::LOCALHOST)),
                60,
            )
            .unwrap();
        writer
            .add_question(&DnsQuestion::new(name("a."), RecordType::A))
            .unwrap();

        let msg = writer.finish().unwrap().bytes;
        assert_eq!(&msg[4..12], &[0, 1, 0, 1, 0, 0, 0, 1]);
        assert!(msg.ends_with(&super::super::OPT_RECORD));
        assert_eq!(&msg[12..15], b"\x01a\x00");
    }
}
