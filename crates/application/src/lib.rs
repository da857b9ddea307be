//! Ferrous DNS Proxy Application Layer
//!
//! Ports for the collaborators the proxy and the DNSSEC proof engine are
//! driven by: the resolver core, the client transport, RRset signature
//! verification and NSEC3 hashing.
pub mod ports;

pub use ports::{
    ClientHandle, ConnectionContext, InterfaceId, Nsec3Hasher, OutboundMessage, ProxyTransport,
    RrsetVerification, RrsetVerifier, SocketHandle, Transport, UpstreamQuery, UpstreamResolver,
    VerificationPoll, VerificationTicket,
};
