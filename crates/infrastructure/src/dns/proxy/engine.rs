use super::admission::{error_reply, inspect_query, Rejection};
use super::registry::{ClientKey, ClientRegistry, ProxyClient, UpstreamState, ValidationState};
use super::response::{assemble, failure_reply, AssembleError};
use crate::dns::dnssec::{ProofCompletion, ProofId, ProofProgress, VerifierArena};
use crate::dns::wire::MessageWriter;
use ferrous_dnsproxy_application::{
    ClientHandle, ConnectionContext, InterfaceId, Nsec3Hasher, OutboundMessage, ProxyTransport,
    RrsetVerifier, SocketHandle, Transport, UpstreamQuery, UpstreamResolver, VerificationTicket,
};
use ferrous_dnsproxy_domain::config::{ProxyConfig, MAX_INPUT_INTERFACES};
use ferrous_dnsproxy_domain::{
    CachedRecord, DnsQuestion, DnssecStatus, DomainError, MessageFlags, RecordType,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the resolver reports about a record of a running query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerEvent {
    Added,
    Removed,
    /// Validation finished for the query's answer.
    Dnssec(DnssecStatus),
}

/// A client datagram or TCP message as handed over by the transport.
#[derive(Debug, Clone, Copy)]
pub struct InboundPacket<'a> {
    pub payload: &'a [u8],
    pub source: SocketAddr,
    pub interface: InterfaceId,
    pub transport: Transport,
    pub socket: SocketHandle,
    pub context: Option<ConnectionContext>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    Admitted(ClientHandle),
    Rejected(Rejection),
    /// The resolver refused the query; the client got SERVFAIL.
    UpstreamFailed(ClientHandle),
    /// A TCP connection went away, taking its client with it, if any.
    Closed(Option<ClientHandle>),
}

/// Request attributes mirrored on the upstream wire query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardAttributes {
    pub request_flags: MessageFlags,
    pub edns0: Option<Arc<[u8]>>,
}

#[derive(Debug, Clone, Copy)]
struct ProxySettings {
    absolute_max: usize,
    validation_timeout: Duration,
    max_cname_hops: usize,
}

impl From<&ProxyConfig> for ProxySettings {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            absolute_max: config.absolute_max_message_size,
            validation_timeout: Duration::from_secs(config.validation_timeout_secs),
            max_cname_hops: config.max_cname_hops,
        }
    }
}

/// Proxy state: the allow-listed interfaces, in-flight clients and the
/// negative proofs running for them.
pub struct DnsProxy<R, T, V, H> {
    settings: ProxySettings,
    inputs: SmallVec<[InterfaceId; MAX_INPUT_INTERFACES]>,
    output: InterfaceId,
    registry: ClientRegistry,
    arena: VerifierArena,
    proofs: FxHashMap<ProofId, ClientHandle>,
    resolver: R,
    transport: T,
    verifier: V,
    hasher: H,
}

impl<R, T, V, H> DnsProxy<R, T, V, H>
where
    R: UpstreamResolver,
    T: ProxyTransport,
    V: RrsetVerifier,
    H: Nsec3Hasher,
{
    pub fn new(
        config: &ProxyConfig,
        resolver: R,
        transport: T,
        verifier: V,
        hasher: H,
    ) -> Result<Self, DomainError> {
        let mut proxy = Self {
            settings: ProxySettings::from(config),
            inputs: SmallVec::new(),
            output: InterfaceId::default(),
            registry: ClientRegistry::new(),
            arena: VerifierArena::new(),
            proofs: FxHashMap::default(),
            resolver,
            transport,
            verifier,
            hasher,
        };
        if !config.input_interfaces.is_empty() {
            let inputs: Vec<InterfaceId> =
                config.input_interfaces.iter().copied().map(InterfaceId).collect();
            proxy.enable(&inputs, InterfaceId(config.output_interface))?;
        }
        Ok(proxy)
    }

    pub fn enable(&mut self, inputs: &[InterfaceId], output: InterfaceId) -> Result<(), DomainError> {
        if inputs.len() > MAX_INPUT_INTERFACES {
            return Err(DomainError::ConfigError(format!(
                "at most {} input interfaces, got {}",
                MAX_INPUT_INTERFACES,
                inputs.len()
            )));
        }
        self.inputs = inputs.iter().copied().collect();
        self.output = output;
        info!(inputs = ?self.inputs, output = output.0, "DNS proxy enabled");
        Ok(())
    }

    pub fn disable(&mut self) {
        self.inputs.clear();
        self.output = InterfaceId::default();
        info!("DNS proxy disabled");
    }

    pub fn is_enabled(&self) -> bool {
        !self.inputs.is_empty()
    }

    fn interface_allowed(&self, interface: InterfaceId) -> bool {
        interface.0 != 0 && self.inputs.contains(&interface)
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    pub fn client(&self, handle: ClientHandle) -> Option<&ProxyClient> {
        self.registry.get(handle)
    }

    pub fn live_verifiers(&self) -> usize {
        self.arena.live_verifiers()
    }

    pub fn completed_proofs(&self) -> u64 {
        self.arena.completed_count()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn verifier_mut(&mut self) -> &mut V {
        &mut self.verifier
    }

    pub fn handle_packet(&mut self, packet: InboundPacket<'_>) -> PacketOutcome {
        if !self.interface_allowed(packet.interface) {
            debug!(interface = packet.interface.0, source = %packet.source, "query on a non-input interface dropped");
            return PacketOutcome::Rejected(Rejection::InterfaceNotAllowed(packet.interface.0));
        }

        let query = match inspect_query(packet.payload) {
            Ok(query) => query,
            Err(rejection) => {
                warn!(source = %packet.source, reason = %rejection, "query rejected");
                self.reply_error(&packet, &rejection);
                return PacketOutcome::Rejected(rejection);
            }
        };

        let key = ClientKey {
            source: packet.source,
            id: query.id,
            qtype: query.question.qtype,
            qclass: query.question.qclass,
            qname: query.question.name.clone(),
        };
        if let Some(existing) = self.registry.find_duplicate(&key) {
            debug!(source = %packet.source, id = query.id, client = %existing, "duplicate query dropped");
            return PacketOutcome::Rejected(Rejection::Duplicate(existing));
        }

        let dnssec_ok = query.dnssec_ok();
        let qtype = query.question.qtype;
        let validation_required = dnssec_ok
            && !query.flags.checking_disabled()
            && !matches!(qtype, RecordType::RRSIG | RecordType::ANY);
        let edns0: Option<Arc<[u8]>> = query.edns.as_ref().map(|e| Arc::from(e.raw.as_slice()));
        let handle = self.registry.next_handle();

        let client = ProxyClient {
            handle,
            source: packet.source,
            id: query.id,
            interface: packet.interface,
            transport: packet.transport,
            socket: packet.socket,
            request_flags: query.flags,
            edns0: edns0.clone(),
            rcv_buf_size: query.edns.as_ref().map_or(0, |e| e.udp_payload_size),
            dnssec_ok,
            qname: query.question.name.clone(),
            upstream: UpstreamState {
                question: query.question.clone(),
                validation_required,
                response_flags: MessageFlags::default(),
            },
            validation: if validation_required {
                ValidationState::Waiting
            } else {
                ValidationState::NotRequired
            },
            deadline: self.resolver.now() + self.settings.validation_timeout,
            context: packet.context,
        };
        if let Err(existing) = self.registry.insert(client) {
            return PacketOutcome::Rejected(Rejection::Duplicate(existing));
        }

        let upstream = UpstreamQuery {
            handle,
            question: query.question,
            interface: self.output,
            validation_required,
            dnssec_ok,
            timeout: self.settings.validation_timeout,
            return_intermediates: true,
            request_flags: query.flags,
            edns0,
        };
        debug!(
            client = %handle,
            source = %packet.source,
            name = %upstream.question.name,
            qtype = %qtype,
            transport = packet.transport.as_str(),
            validation_required,
            "proxying query"
        );

        if let Err(e) = self.resolver.start_query(&upstream) {
            warn!(client = %handle, error = %e, "upstream query failed to start");
            if let Some(client) = self.registry.remove(handle) {
                if let Some(payload) = self.render_failure(&client) {
                    self.send(&client, payload);
                }
                if let Some(context) = client.context {
                    self.transport.dispose_context(context);
                }
            }
            return PacketOutcome::UpstreamFailed(handle);
        }
        PacketOutcome::Admitted(handle)
    }

    /// TCP input. An empty message or one on a non-input interface means
    /// the connection is gone.
    pub fn handle_tcp_packet(&mut self, packet: InboundPacket<'_>) -> PacketOutcome {
        if !packet.payload.is_empty() && self.interface_allowed(packet.interface) {
            return self.handle_packet(packet);
        }

        let found = self.registry.find_by_socket(packet.socket);
        let mut client_context = None;
        if let Some(handle) = found {
            if let Some(client) = self.registry.remove(handle) {
                debug!(client = %handle, "TCP client went away");
                self.abandon_proof(client.validation);
                client_context = client.context;
            }
            self.resolver.stop_query(handle);
        }
        if let Some(context) = packet.context.or(client_context) {
            self.transport.dispose_context(context);
        }
        PacketOutcome::Closed(found)
    }

    pub fn forward_attributes(&self, handle: ClientHandle) -> Option<ForwardAttributes> {
        let client = self.registry.get(handle)?;
        Some(ForwardAttributes {
            request_flags: client.request_flags,
            edns0: client.edns0.clone(),
        })
    }

    /// Copies the client's header flags onto an upstream query and appends
    /// its OPT record. The OPT is dropped when the query is finished if it
    /// does not fit.
    pub fn apply_forward_attributes(&self, handle: ClientHandle, writer: &mut MessageWriter) {
        let Some(client) = self.registry.get(handle) else {
            return;
        };
        writer.set_flags(client.request_flags);
        if let Some(opt) = &client.edns0 {
            writer.add_raw_additional(opt);
        }
    }

    pub fn on_answer(&mut self, handle: ClientHandle, record: &CachedRecord, event: AnswerEvent) {
        let now = self.resolver.now();
        let Some(client) = self.registry.get_mut(handle) else {
            debug!(client = %handle, "answer for unknown client");
            return;
        };

        match event {
            AnswerEvent::Removed => return,
            AnswerEvent::Added => client.upstream.response_flags = record.response_flags,
            AnswerEvent::Dnssec(status) => {
                if let ValidationState::AwaitingProof(proof) = client.validation {
                    self.proofs.remove(&proof);
                    self.arena.cancel(proof);
                }
                client.validation = ValidationState::Done(status);
            }
        }

        let settled = matches!(client.validation, ValidationState::Done(_));
        if client.upstream.validation_required && !settled {
            if now >= client.deadline {
                debug!(client = %handle, "gave up waiting for validation");
                if let ValidationState::AwaitingProof(proof) = client.validation {
                    self.proofs.remove(&proof);
                    self.arena.cancel(proof);
                }
                client.validation = ValidationState::Done(DnssecStatus::Indeterminate);
            } else if matches!(client.validation, ValidationState::AwaitingProof(_)) {
                return;
            } else if record.is_negative() && event == AnswerEvent::Added {
                let question = DnsQuestion::with_class(
                    record.record.name.clone(),
                    record.record.rtype,
                    record.record.class,
                );
                match self
                    .arena
                    .start_negative(question, record, &self.hasher, &mut self.verifier)
                {
                    ProofProgress::Complete(done) => {
                        client.validation = ValidationState::Done(done.status);
                    }
                    ProofProgress::Pending(proof) => {
                        client.validation = ValidationState::AwaitingProof(proof);
                        self.proofs.insert(proof, handle);
                        return;
                    }
                }
            } else {
                debug!(client = %handle, "waiting for DNSSEC status");
                return;
            }
        }

        if !record.is_negative() && record.record.rtype != client.upstream.question.qtype {
            return;
        }
        self.respond(handle);
    }

    pub fn on_verification_result(&mut self, ticket: VerificationTicket, status: DnssecStatus) {
        if let Some(done) = self.arena.resume(ticket, status, &mut self.verifier) {
            self.finish_proof(done);
        }
    }

    /// Answers every client whose validation deadline has passed, as
    /// Indeterminate. Returns how many were answered.
    pub fn expire_validations(&mut self) -> usize {
        let now = self.resolver.now();
        let overdue: Vec<ClientHandle> = self
            .registry
            .handles()
            .filter(|&h| {
                self.registry.get(h).is_some_and(|c| {
                    c.upstream.validation_required
                        && !matches!(c.validation, ValidationState::Done(_))
                        && now >= c.deadline
                })
            })
            .collect();

        for &handle in &overdue {
            if let Some(client) = self.registry.get_mut(handle) {
                let previous = client.validation;
                client.validation = ValidationState::Done(DnssecStatus::Indeterminate);
                self.abandon_proof(previous);
            }
            self.respond(handle);
        }
        overdue.len()
    }

    fn finish_proof(&mut self, done: ProofCompletion) {
        let Some(handle) = self.proofs.remove(&done.proof) else {
            return;
        };
        let Some(client) = self.registry.get_mut(handle) else {
            return;
        };
        debug!(client = %handle, name = %done.question.name, status = %done.status, "negative answer validated");
        client.validation = ValidationState::Done(done.status);
        self.respond(handle);
    }

    fn abandon_proof(&mut self, state: ValidationState) {
        if let ValidationState::AwaitingProof(proof) = state {
            self.proofs.remove(&proof);
            self.arena.cancel(proof);
        }
    }

    fn respond(&mut self, handle: ClientHandle) {
        let Some(client) = self.registry.remove(handle) else {
            return;
        };
        self.abandon_proof(client.validation);

        if let Some(payload) = self.render(&client) {
            self.send(&client, payload);
        }
        self.resolver.stop_query(handle);
        if let Some(context) = client.context {
            self.transport.dispose_context(context);
        }
    }

    fn render(&self, client: &ProxyClient) -> Option<Vec<u8>> {
        let mut writer = match assemble(
            client,
            &self.resolver,
            self.settings.absolute_max,
            self.settings.max_cname_hops,
        ) {
            Ok(writer) => writer,
            Err(AssembleError::NoSuchRecord) => return self.render_failure(client),
            Err(AssembleError::Unencodable(e)) => {
                warn!(client = %client.handle, error = %e, "cached record could not be encoded");
                return self.render_failure(client);
            }
        };

        let status = client.validation.status();
        let flags = writer
            .flags()
            .with(MessageFlags::TC, false)
            .with(MessageFlags::AD, status.is_secure());
        writer.set_flags(flags);
        writer.set_tc_on_truncation(client.transport == Transport::Udp);

        match writer.finish() {
            Ok(reply) => {
                debug!(
                    client = %client.handle,
                    len = reply.bytes.len(),
                    truncated = reply.truncated,
                    status = %status,
                    "reply assembled"
                );
                Some(reply.bytes)
            }
            Err(e) => {
                warn!(client = %client.handle, error = %e, "reply could not be encoded");
                self.render_failure(client)
            }
        }
    }

    fn render_failure(&self, client: &ProxyClient) -> Option<Vec<u8>> {
        match failure_reply(client, self.settings.absolute_max) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(client = %client.handle, error = %e, "failure reply could not be built");
                None
            }
        }
    }

    fn send(&mut self, client: &ProxyClient, payload: Vec<u8>) {
        let message = OutboundMessage {
            payload,
            destination: client.source,
            interface: client.interface,
            transport: client.transport,
            socket: client.socket,
        };
        if let Err(e) = self.transport.send_message(message) {
            warn!(client = %client.handle, destination = %client.source, error = %e, "reply not sent");
        }
    }

    fn reply_error(&mut self, packet: &InboundPacket<'_>, rejection: &Rejection) {
        let Some(rcode) = rejection.reply_rcode() else {
            return;
        };
        let Some(payload) = error_reply(packet.payload, rcode, self.settings.absolute_max) else {
            return;
        };
        let message = OutboundMessage {
            payload,
            destination: packet.source,
            interface: packet.interface,
            transport: packet.transport,
            socket: packet.socket,
        };
        if let Err(e) = self.transport.send_message(message) {
            warn!(destination = %packet.source, error = %e, "error reply not sent");
        }
    }
}

/// Serializes every entry point behind one lock.
pub struct SharedDnsProxy<R, T, V, H> {
    inner: Arc<Mutex<DnsProxy<R, T, V, H>>>,
}

impl<R, T, V, H> Clone for SharedDnsProxy<R, T, V, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, T, V, H> SharedDnsProxy<R, T, V, H>
where
    R: UpstreamResolver,
    T: ProxyTransport,
    V: RrsetVerifier,
    H: Nsec3Hasher,
{
    pub fn new(proxy: DnsProxy<R, T, V, H>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(proxy)),
        }
    }

    /// Runs `f` with the lock held.
    pub fn with<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&mut DnsProxy<R, T, V, H>) -> O,
    {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn handle_packet(&self, packet: InboundPacket<'_>) -> PacketOutcome {
        self.with(|proxy| proxy.handle_packet(packet))
    }

    pub fn handle_tcp_packet(&self, packet: InboundPacket<'_>) -> PacketOutcome {
        self.with(|proxy| proxy.handle_tcp_packet(packet))
    }

    pub fn on_answer(&self, handle: ClientHandle, record: &CachedRecord, event: AnswerEvent) {
        self.with(|proxy| proxy.on_answer(handle, record, event))
    }

    pub fn on_verification_result(&self, ticket: VerificationTicket, status: DnssecStatus) {
        self.with(|proxy| proxy.on_verification_result(ticket, status))
    }

    pub fn expire_validations(&self) -> usize {
        self.with(DnsProxy::expire_validations)
    }

    pub fn forward_attributes(&self, handle: ClientHandle) -> Option<ForwardAttributes> {
        self.with(|proxy| proxy.forward_attributes(handle))
    }

    pub fn client_count(&self) -> usize {
        self.with(|proxy| proxy.client_count())
    }
}
