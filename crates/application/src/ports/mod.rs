mod nsec3_hasher;
mod proxy_transport;
mod rrset_verifier;
mod upstream_resolver;

pub use nsec3_hasher::Nsec3Hasher;
pub use proxy_transport::{
    ConnectionContext, InterfaceId, OutboundMessage, ProxyTransport, SocketHandle, Transport,
};
pub use rrset_verifier::{RrsetVerification, RrsetVerifier, VerificationPoll, VerificationTicket};
pub use upstream_resolver::{ClientHandle, UpstreamQuery, UpstreamResolver};

// Re-export for convenience
pub use ferrous_dnsproxy_domain::{DnsQuestion, DnssecStatus};
