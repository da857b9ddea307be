use ferrous_dnsproxy_domain::DomainError;
use std::net::SocketAddr;

/// Platform interface index. Zero means "no interface".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InterfaceId(pub u32);

/// Return socket a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketHandle(pub u64);

/// Opaque per-request platform state released once the request is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionContext(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Udp,
    Tcp,
}

impl Transport {
    pub fn is_tcp(&self) -> bool {
        matches!(self, Transport::Tcp)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Udp => "udp",
            Transport::Tcp => "tcp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub payload: Vec<u8>,
    pub destination: SocketAddr,
    pub interface: InterfaceId,
    pub transport: Transport,
    pub socket: SocketHandle,
}

pub trait ProxyTransport {
    fn send_message(&mut self, message: OutboundMessage) -> Result<(), DomainError>;

    fn dispose_context(&mut self, context: ConnectionContext);
}
