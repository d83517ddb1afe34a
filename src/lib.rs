//! A DNS stub resolver client.
//!
//! Builds standard queries, sends them over UDP or TCP and decodes the
//! complete response, including name compression and about twenty record
//! types. Unrecognised record types are kept as raw RDATA.
//!
//! ```no_run
//! use dns_client::{DnsClient, Protocol, RecordClass, RecordType};
//!
//! # async fn run() -> Result<(), dns_client::DnsError> {
//! let client = DnsClient::builder()
//!     .with_dns_server("8.8.8.8:53".parse().unwrap())
//!     .build()?;
//! let response = client
//!     .query("example.com", RecordType::A, RecordClass::IN, Protocol::Udp)
//!     .await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod errors;
pub mod parsers;
pub mod policy;
pub mod protocol;
pub mod rdata;
pub mod records;
pub mod request_builder;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{DnsClient, DnsClientBuilder};
pub use codec::DnsCodec;
pub use errors::DnsError;
pub use parsers::{parse_name, parse_response};
pub use policy::{AllowAll, DenyAll, QueryPolicy, SuffixAllowList};
pub use protocol::{
    DnsPacketHeader, DnsQuestion, Opcode, Protocol, Query, RecordClass, RecordHeader, RecordType,
    Response, ResponseCode,
};
pub use records::{Record, RecordData};
pub use request_builder::{FixedId, RandomIds, RequestBuilder, TransactionIdSource};
pub use transport::{TcpTransport, Transport, UdpTransport};
