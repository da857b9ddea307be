#![allow(dead_code)]
use ferrous_dnsproxy_application::{
    ClientHandle, ConnectionContext, OutboundMessage, ProxyTransport, RrsetVerification,
    RrsetVerifier, UpstreamQuery, UpstreamResolver, VerificationPoll,
};
use ferrous_dnsproxy_domain::{CacheGroup, CachedRecord, DnssecStatus, DomainError, DomainName};
use ferrous_dnsproxy_infrastructure::MemoryRecordCache;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resolver double backed by an in-memory cache with a hand-driven clock.
pub struct MockResolver {
    pub cache: MemoryRecordCache,
    pub started: Vec<UpstreamQuery>,
    pub stopped: Vec<ClientHandle>,
    pub fail_start: bool,
    now: Instant,
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            cache: MemoryRecordCache::new(),
            started: Vec::new(),
            stopped: Vec::new(),
            fail_start: false,
            now: Instant::now(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new()
        }
    }

    pub fn clock(&self) -> Instant {
        self.now
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub fn insert(&mut self, record: CachedRecord) -> Arc<CachedRecord> {
        self.cache.insert(record)
    }
}

impl UpstreamResolver for MockResolver {
    fn start_query(&mut self, query: &UpstreamQuery) -> Result<(), DomainError> {
        if self.fail_start {
            return Err(DomainError::IoError("no route to upstream".to_string()));
        }
        self.started.push(query.clone());
        Ok(())
    }

    fn stop_query(&mut self, handle: ClientHandle) {
        self.stopped.push(handle);
    }

    fn cache_group(&self, name: &DomainName) -> Option<&CacheGroup> {
        self.cache.group(name)
    }

    fn now(&self) -> Instant {
        self.now
    }
}

/// Captures everything the proxy sends and every context it releases.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Vec<OutboundMessage>,
    pub disposed: Vec<ConnectionContext>,
    pub fail_send: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_payload(&self) -> &[u8] {
        &self.sent.last().unwrap().payload
    }
}

impl ProxyTransport for RecordingTransport {
    fn send_message(&mut self, message: OutboundMessage) -> Result<(), DomainError> {
        if self.fail_send {
            return Err(DomainError::IoError("socket closed".to_string()));
        }
        self.sent.push(message);
        Ok(())
    }

    fn dispose_context(&mut self, context: ConnectionContext) {
        self.disposed.push(context);
    }
}

/// Answers verification requests from a script. An exhausted script
/// answers Secure.
#[derive(Default)]
pub struct ScriptedVerifier {
    pub script: VecDeque<VerificationPoll>,
    pub requests: Vec<RrsetVerification>,
}

impl ScriptedVerifier {
    pub fn new(script: impl IntoIterator<Item = VerificationPoll>) -> Self {
        Self {
            script: script.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    pub fn always_secure() -> Self {
        Self::default()
    }

    pub fn last_ticket(&self) -> ferrous_dnsproxy_application::VerificationTicket {
        self.requests.last().unwrap().ticket
    }
}

impl RrsetVerifier for ScriptedVerifier {
    fn verify(&mut self, request: RrsetVerification) -> VerificationPoll {
        self.requests.push(request);
        self.script
            .pop_front()
            .unwrap_or(VerificationPoll::Ready(DnssecStatus::Secure))
    }
}
