//! Renders the reply for a proxied client from the resolver's cache.

use super::registry::ProxyClient;
use crate::dns::wire::{MessageWriter, Section, WireError, OPT_RECORD};
use ferrous_dnsproxy_application::UpstreamResolver;
use ferrous_dnsproxy_domain::{
    CachedRecord, DnsQuestion, DomainName, MessageFlags, Rcode, ResourceRecord,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum AssembleError {
    /// Nothing in the cache answers the question.
    NoSuchRecord,
    /// A cached record has no wire form.
    Unencodable(WireError),
}

/// Header flags for a reply built from a cached record: the record's
/// upstream flags with RD and CD as the client sent them.
pub fn reply_flags(request: MessageFlags, cached: MessageFlags) -> MessageFlags {
    cached
        .with(MessageFlags::RD, request.recursion_desired())
        .with(MessageFlags::CD, request.checking_disabled())
}

/// Walks the cache from the client's name, following CNAMEs, and writes
/// answers, then denial records and the SOA into the authority section.
///
/// Truncation happens when the writer is finished: the first record past
/// the client's limit ends the reply.
pub fn assemble<R>(
    client: &ProxyClient,
    resolver: &R,
    absolute_max: usize,
    max_cname_hops: usize,
) -> Result<MessageWriter, AssembleError>
where
    R: UpstreamResolver + ?Sized,
{
    let now = resolver.now();
    let limit = client.response_limit(absolute_max);
    let qtype = client.upstream.question.qtype;
    let qclass = client.upstream.question.qclass;
    let dnssec_ok = client.dnssec_ok;

    let mut writer: Option<MessageWriter> = None;
    let mut qname = client.qname.clone();
    let mut hops = 0;

    loop {
        let group = resolver.cache_group(&qname).ok_or_else(|| {
            debug!(name = %qname, "no cached records");
            AssembleError::NoSuchRecord
        })?;
        let question = DnsQuestion::with_class(qname.clone(), qtype, qclass);

        let mut chain: Option<&Arc<CachedRecord>> = None;
        let mut soa: Option<&ResourceRecord> = None;
        let mut cname: Option<DomainName> = None;

        for member in &group.members {
            if !member.answers(&question, dnssec_ok) {
                continue;
            }

            if writer.is_none() {
                let flags = reply_flags(client.request_flags, member.response_flags);
                let mut fresh = MessageWriter::new(client.id, flags, absolute_max);
                let echoed = DnsQuestion::with_class(client.qname.clone(), qtype, qclass);
                fresh
                    .add_question(&echoed)
                    .map_err(AssembleError::Unencodable)?;
                fresh.set_limit(limit);
                writer = Some(fresh);
            }
            let Some(out) = writer.as_mut() else { continue };

            if !member.is_negative() {
                let ttl = member.remaining_ttl(now);
                out.add_record(Section::Answer, &member.record, ttl)
                    .map_err(AssembleError::Unencodable)?;
            }
            if dnssec_ok && !member.nsec_chain().is_empty() {
                chain = Some(member);
            }
            if let Some(record) = member.soa() {
                soa = Some(record);
            }
            if member.record.rtype != qtype {
                if let Some(target) = member.record.cname_target() {
                    cname = Some(target.clone());
                }
            }
        }

        if let (Some(out), Some(owner)) = (writer.as_mut(), chain) {
            let elapsed = owner.elapsed_secs(now);
            for rr in owner.nsec_chain() {
                if !dnssec_ok && rr.rtype.is_dnssec() {
                    continue;
                }
                out.add_record(Section::Authority, rr, rr.remaining_ttl(elapsed))
                    .map_err(AssembleError::Unencodable)?;
            }
        }
        if let (Some(out), Some(record)) = (writer.as_mut(), soa) {
            out.add_record(Section::Authority, record, record.ttl)
                .map_err(AssembleError::Unencodable)?;
        }

        match cname {
            Some(target) if hops < max_cname_hops => {
                hops += 1;
                debug!(from = %qname, to = %target, "following CNAME");
                qname = target;
            }
            Some(target) => {
                warn!(name = %client.qname, target = %target, hops, "CNAME chain too long");
                break;
            }
            None => break,
        }
    }

    let mut out = writer.ok_or(AssembleError::NoSuchRecord)?;
    if client.rcv_buf_size != 0 {
        out.add_raw_additional(&OPT_RECORD);
    }
    Ok(out)
}

/// SERVFAIL, or the last upstream flags when there were any, with the
/// client's question echoed.
pub fn failure_reply(client: &ProxyClient, absolute_max: usize) -> Result<Vec<u8>, WireError> {
    let flags = if client.upstream.response_flags.is_zero() {
        MessageFlags(MessageFlags::QR).with_rcode(Rcode::ServFail)
    } else {
        client.upstream.response_flags
    };
    let mut writer = MessageWriter::new(client.id, flags, absolute_max);
    let question = DnsQuestion::with_class(
        client.qname.clone(),
        client.upstream.question.qtype,
        client.upstream.question.qclass,
    );
    writer.add_question(&question)?;
    Ok(writer.finish()?.bytes)
}
