//! The DNS proxy: admits client queries, runs them upstream through the
//! resolver and answers from its cache once validation settles.

mod admission;
mod engine;
mod registry;
mod response;

pub use admission::{error_reply, inspect_query, AdmittedQuery, FormatIssue, Rejection};
pub use engine::{
    AnswerEvent, DnsProxy, ForwardAttributes, InboundPacket, PacketOutcome, SharedDnsProxy,
};
pub use registry::{ClientKey, ClientRegistry, ProxyClient, UpstreamState, ValidationState};
pub use response::{assemble, failure_reply, reply_flags, AssembleError};
