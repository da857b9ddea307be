use super::proxy_transport::InterfaceId;
use ferrous_dnsproxy_domain::{CacheGroup, DnsQuestion, DomainError, DomainName, MessageFlags};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identifies one in-flight proxied client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientHandle(pub u64);

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// A recursive query the proxy asks the resolver core to run on its behalf.
#[derive(Debug, Clone)]
pub struct UpstreamQuery {
    pub handle: ClientHandle,
    pub question: DnsQuestion,
    /// Output interface the query is bound to.
    pub interface: InterfaceId,
    pub validation_required: bool,
    pub dnssec_ok: bool,
    /// The query gives up after this long and delivers whatever it has.
    pub timeout: Duration,
    /// Deliver negative and intermediate answers, not only the final one.
    pub return_intermediates: bool,
    pub request_flags: MessageFlags,
    pub edns0: Option<Arc<[u8]>>,
}

/// The resolver core: query scheduling, cache and time.
///
/// Answers are fed back through `DnsProxy::on_answer`; `stop_query` must be
/// safe to call for a query that already finished.
pub trait UpstreamResolver {
    fn start_query(&mut self, query: &UpstreamQuery) -> Result<(), DomainError>;

    fn stop_query(&mut self, handle: ClientHandle);

    fn cache_group(&self, name: &DomainName) -> Option<&CacheGroup>;

    fn now(&self) -> Instant;
}
