use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::codec::Decoder;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, warn, Dispatch};

use crate::codec::DnsCodec;
use crate::errors::DnsError;
use crate::policy::{AllowAll, QueryPolicy};
use crate::protocol::{Protocol, RecordClass, RecordType, Response};
use crate::request_builder::{RequestBuilder, TransactionIdSource};
use crate::transport::{TcpTransport, Transport, UdpTransport, DEFAULT_TIMEOUT};

/// Collects the options for a [`DnsClient`]. Only the server is required.
pub struct DnsClientBuilder {
    server: Option<SocketAddr>,
    timeout: Duration,
    logger: Dispatch,
    policy: Arc<dyn QueryPolicy>,
    requests: RequestBuilder,
}

impl Default for DnsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsClientBuilder {
    pub fn new() -> Self {
        Self {
            server: None,
            timeout: DEFAULT_TIMEOUT,
            logger: Dispatch::none(),
            policy: Arc::new(AllowAll),
            requests: RequestBuilder::new(),
        }
    }

    pub fn with_dns_server(mut self, server: SocketAddr) -> Self {
        self.server = Some(server);
        self
    }

    /// Bounds each exchange with the server, connect included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Routes the client's events to `logger`. Without one they are
    /// discarded, whatever the global subscriber is.
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_policy(mut self, policy: impl QueryPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_id_source(mut self, ids: impl TransactionIdSource + 'static) -> Self {
        self.requests = self.requests.with_id_source(ids);
        self
    }

    pub fn with_recursion_desired(mut self, recursion_desired: bool) -> Self {
        self.requests = self.requests.with_recursion_desired(recursion_desired);
        self
    }

    pub fn build(self) -> Result<DnsClient, DnsError> {
        let udp = UdpTransport::new(self.timeout);
        let tcp = TcpTransport::new(self.timeout);
        self.build_with(udp, tcp)
    }

    /// Builds a client over caller supplied transports. The configured
    /// timeout is not applied to them.
    pub fn build_with<U, T>(self, udp: U, tcp: T) -> Result<DnsClient<U, T>, DnsError>
    where
        U: Transport,
        T: Transport,
    {
        let server = self.server.ok_or(DnsError::MissingServer)?;
        Ok(DnsClient {
            server,
            logger: self.logger,
            policy: self.policy,
            requests: self.requests,
            udp,
            tcp,
        })
    }
}

/// Issues queries against a single server. Cheap to share: every query
/// owns its buffers and nothing is mutated between calls.
pub struct DnsClient<U = UdpTransport, T = TcpTransport> {
    server: SocketAddr,
    logger: Dispatch,
    policy: Arc<dyn QueryPolicy>,
    requests: RequestBuilder,
    udp: U,
    tcp: T,
}

impl<U, T> fmt::Debug for DnsClient<U, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsClient")
            .field("server", &self.server)
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

impl DnsClient {
    pub fn builder() -> DnsClientBuilder {
        DnsClientBuilder::new()
    }
}

impl<U, T> DnsClient<U, T>
where
    U: Transport,
    T: Transport,
{
    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Resolves `host` and returns the fully decoded response.
    ///
    /// Fails with `PermissionDenied` before any I/O if the policy refuses
    /// the query.
    pub async fn query(
        &self,
        host: &str,
        qtype: RecordType,
        qclass: RecordClass,
        protocol: Protocol,
    ) -> Result<Response, DnsError> {
        self.exchange(host, qtype, qclass, protocol)
            .with_subscriber(self.logger.clone())
            .await
    }

    async fn exchange(
        &self,
        host: &str,
        qtype: RecordType,
        qclass: RecordClass,
        protocol: Protocol,
    ) -> Result<Response, DnsError> {
        if !self.policy.authorize(host, qtype, protocol) {
            warn!(host, %qtype, %protocol, "Query refused by policy");
            return Err(DnsError::PermissionDenied(format!(
                "query for {} {} over {} is not allowed",
                host, qtype, protocol
            )));
        }

        let (id, request) = self.requests.build(host, qtype, qclass, protocol)?;
        info!(
            id,
            server = %self.server,
            %protocol,
            "Querying {} {} {}",
            host,
            qclass,
            qtype
        );

        let mut reply = match protocol {
            Protocol::Udp => self.udp.resolve(&request, self.server).await?,
            Protocol::Tcp => self.tcp.resolve(&request, self.server).await?,
        };

        let response = DnsCodec::new(protocol)
            .decode(&mut reply)?
            .ok_or(DnsError::TruncatedMessage { offset: 0 })?;

        if response.header.id != id {
            warn!(
                expected = id,
                actual = response.header.id,
                "Response does not belong to this query"
            );
            return Err(DnsError::TransactionIdMismatch {
                expected: id,
                actual: response.header.id,
            });
        }

        if response.header.tc && protocol == Protocol::Udp {
            warn!(id, "Response truncated, the full answer needs TCP");
        }

        debug!(
            id,
            rcode = %response.response_code(),
            answers = response.answers.len(),
            authorities = response.authorities.len(),
            additionals = response.additionals.len(),
            "Query complete"
        );
        Ok(response)
    }
}
