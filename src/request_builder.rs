use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::DnsCodec;
use crate::errors::DnsError;
use crate::protocol::{DnsPacketHeader, DnsQuestion, Protocol, Query, RecordClass, RecordType};

/// Supplies the transaction id for each outgoing query.
pub trait TransactionIdSource: Send + Sync {
    fn next_id(&self) -> u16;
}

/// Uniformly random ids, a fresh one per query.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl TransactionIdSource for RandomIds {
    fn next_id(&self) -> u16 {
        fastrand::u16(..)
    }
}

/// Always the same id. Meant for tests and packet captures.
#[derive(Debug, Clone, Copy)]
pub struct FixedId(pub u16);

impl TransactionIdSource for FixedId {
    fn next_id(&self) -> u16 {
        self.0
    }
}

impl<F> TransactionIdSource for F
where
    F: Fn() -> u16 + Send + Sync,
{
    fn next_id(&self) -> u16 {
        self()
    }
}

/// Builds standard queries: opcode QUERY, one question, no records.
#[derive(Clone)]
pub struct RequestBuilder {
    ids: Arc<dyn TransactionIdSource>,
    recursion_desired: bool,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("recursion_desired", &self.recursion_desired)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            ids: Arc::new(RandomIds),
            recursion_desired: true,
        }
    }

    pub fn with_id_source(mut self, ids: impl TransactionIdSource + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn with_recursion_desired(mut self, recursion_desired: bool) -> Self {
        self.recursion_desired = recursion_desired;
        self
    }

    /// The query message for `host`, with a newly drawn transaction id.
    pub fn query(&self, host: &str, qtype: RecordType, qclass: RecordClass) -> Query {
        Query {
            header: DnsPacketHeader::query(self.ids.next_id(), self.recursion_desired),
            question: DnsQuestion {
                name: host.to_string(),
                qtype,
                qclass,
            },
        }
    }

    /// Serializes a query for `host`, framed for `protocol`. Returns the
    /// transaction id alongside the bytes so the reply can be matched.
    pub fn build(
        &self,
        host: &str,
        qtype: RecordType,
        qclass: RecordClass,
        protocol: Protocol,
    ) -> Result<(u16, BytesMut), DnsError> {
        let query = self.query(host, qtype, qclass);
        let id = query.header.id;

        let mut buf = BytesMut::new();
        DnsCodec::new(protocol).encode(query, &mut buf)?;

        trace!(id, %protocol, bytes = ?&buf[..], "Built query for {} {}", host, qtype);
        Ok((id, buf))
    }
}
