use crate::dns::dnssec::ProofId;
use ferrous_dnsproxy_application::{
    ClientHandle, ConnectionContext, InterfaceId, SocketHandle, Transport,
};
use ferrous_dnsproxy_domain::{DnsQuestion, DnssecStatus, DomainName, MessageFlags, RecordType};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Where a client stands with respect to DNSSEC validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    NotRequired,
    /// Waiting for the resolver to deliver a status for a positive answer.
    Waiting,
    /// A local negative proof is running.
    AwaitingProof(ProofId),
    Done(DnssecStatus),
}

impl ValidationState {
    pub fn status(&self) -> DnssecStatus {
        match self {
            ValidationState::Done(status) => *status,
            _ => DnssecStatus::Indeterminate,
        }
    }
}

/// The query the proxy runs upstream on a client's behalf.
#[derive(Debug, Clone)]
pub struct UpstreamState {
    pub question: DnsQuestion,
    pub validation_required: bool,
    /// Flags of the last upstream response seen for this query.
    pub response_flags: MessageFlags,
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    pub handle: ClientHandle,
    pub source: SocketAddr,
    pub id: u16,
    pub interface: InterfaceId,
    pub transport: Transport,
    pub socket: SocketHandle,
    pub request_flags: MessageFlags,
    /// The client's OPT record, mirrored upstream.
    pub edns0: Option<Arc<[u8]>>,
    pub rcv_buf_size: u16,
    pub dnssec_ok: bool,
    /// Name as asked; echoed in the reply question.
    pub qname: DomainName,
    pub upstream: UpstreamState,
    pub validation: ValidationState,
    pub deadline: Instant,
    pub context: Option<ConnectionContext>,
}

impl ProxyClient {
    pub fn key(&self) -> ClientKey {
        ClientKey {
            source: self.source,
            id: self.id,
            qtype: self.upstream.question.qtype,
            qclass: self.upstream.question.qclass,
            qname: self.qname.clone(),
        }
    }

    /// Largest reply this client may receive.
    pub fn response_limit(&self, absolute_max: usize) -> usize {
        match self.transport {
            Transport::Tcp => absolute_max,
            Transport::Udp if self.rcv_buf_size == 0 => {
                ferrous_dnsproxy_domain::config::MIN_MESSAGE_SIZE
            }
            Transport::Udp => usize::from(self.rcv_buf_size).min(absolute_max),
        }
    }
}

/// Requests from the same source with the same id and question are the
/// same request. Name comparison ignores case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub source: SocketAddr,
    pub id: u16,
    pub qtype: RecordType,
    pub qclass: u16,
    pub qname: DomainName,
}

/// In-flight client requests in arrival order.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<ClientHandle, ProxyClient>,
    by_key: FxHashMap<ClientKey, ClientHandle>,
    next_handle: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_handle(&mut self) -> ClientHandle {
        self.next_handle += 1;
        ClientHandle(self.next_handle)
    }

    pub fn find_duplicate(&self, key: &ClientKey) -> Option<ClientHandle> {
        self.by_key.get(key).copied()
    }

    /// Stores `client` unless an entry with the same key exists, in which
    /// case the existing handle comes back as the error.
    pub fn insert(&mut self, client: ProxyClient) -> Result<ClientHandle, ClientHandle> {
        let key = client.key();
        if let Some(existing) = self.by_key.get(&key) {
            return Err(*existing);
        }
        let handle = client.handle;
        self.by_key.insert(key, handle);
        self.clients.insert(handle, client);
        Ok(handle)
    }

    pub fn get(&self, handle: ClientHandle) -> Option<&ProxyClient> {
        self.clients.get(&handle)
    }

    pub fn get_mut(&mut self, handle: ClientHandle) -> Option<&mut ProxyClient> {
        self.clients.get_mut(&handle)
    }

    pub fn remove(&mut self, handle: ClientHandle) -> Option<ProxyClient> {
        let client = self.clients.remove(&handle)?;
        self.by_key.remove(&client.key());
        Some(client)
    }

    /// Oldest request that arrived on `socket`.
    pub fn find_by_socket(&self, socket: SocketHandle) -> Option<ClientHandle> {
        self.clients
            .values()
            .find(|c| c.socket == socket)
            .map(|c| c.handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = ClientHandle> + '_ {
        self.clients.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
