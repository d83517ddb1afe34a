//! DNS message codec for tokio_util
//!
//! The encoder turns a [`Query`] into wire bytes, adding the two byte length
//! prefix when the query travels over TCP. The decoder turns one complete
//! response message into a [`Response`]; transports hand it the bare message,
//! never a length prefix.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use crate::errors::DnsError;
use crate::parsers::{parse_response, MAX_NAME_LEN};
use crate::protocol::{DnsPacketHeader, Protocol, Query, Response, HEADER_LEN};

const MAX_LABEL_LEN: usize = 63;

/// DNS message codec for use with tokio_util framed streams
#[derive(Debug, Default, Clone, Copy)]
pub struct DnsCodec {
    protocol: Protocol,
}

impl DnsCodec {
    /// Create a codec framing requests for the given transport
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol }
    }
}

impl Decoder for DnsCodec {
    type Item = Response;
    type Error = DnsError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        // Transports always deliver whole messages, so the buffer is one response
        let frame = src.split();
        let response = parse_response(&frame)?;

        debug!(
            packet_id = response.header.id,
            opcode = %response.header.opcode(),
            authoritative = response.header.aa,
            truncated = response.header.tc,
            recursion_desired = response.header.rd,
            recursion_available = response.header.ra,
            response_code = %response.header.response_code(),
            question_count = response.header.qdcount,
            answer_count = response.header.ancount,
            authority_count = response.header.nscount,
            additional_count = response.header.arcount,
            "DNS response header parsed successfully"
        );

        Ok(Some(response))
    }
}

impl Encoder<Query> for DnsCodec {
    type Error = DnsError;

    fn encode(&mut self, item: Query, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let start = dst.len();
        if self.protocol == Protocol::Tcp {
            // patched below once the message length is known
            dst.put_u16(0);
        }
        let body = dst.len();

        // Only ever one question; the header counts must say so
        let mut header = item.header;
        header.qdcount = 1;
        header.ancount = 0;
        header.nscount = 0;
        header.arcount = 0;

        encode_header(&header, dst);
        if let Err(e) = encode_domain_name(&item.question.name, dst) {
            dst.truncate(start);
            return Err(e);
        }
        dst.put_u16(u16::from(item.question.qtype));
        dst.put_u16(u16::from(item.question.qclass));

        if self.protocol == Protocol::Tcp {
            // header + one name of at most 255 octets + type + class
            let length = (dst.len() - body) as u16;
            dst[start..body].copy_from_slice(&length.to_be_bytes());
        }

        trace!(
            packet_id = header.id,
            protocol = %self.protocol,
            size = dst.len() - start,
            "Encoded DNS query"
        );
        Ok(())
    }
}

/// Writes the 12 byte header in network byte order.
pub fn encode_header(header: &DnsPacketHeader, dst: &mut BytesMut) {
    dst.reserve(HEADER_LEN);

    dst.put_u16(header.id);
    dst.put_u16(header.flags());
    dst.put_u16(header.qdcount);
    dst.put_u16(header.ancount);
    dst.put_u16(header.nscount);
    dst.put_u16(header.arcount);
}

/// Encode a DNS domain name using label format, uncompressed.
///
/// Each label is written as its length followed by its bytes, and the name
/// ends with a zero octet. A single trailing dot is accepted; `""` and `"."`
/// both encode the root. Nothing is written if the name is rejected.
pub fn encode_domain_name(domain_name: &str, dst: &mut BytesMut) -> Result<(), DnsError> {
    let labels = domain_labels(domain_name)?;

    let total: usize = labels.iter().map(|label| 1 + label.len()).sum::<usize>() + 1;
    if total > MAX_NAME_LEN {
        return Err(DnsError::InvalidDomainName(format!(
            "'{}' encodes to {} bytes, the limit is {}",
            domain_name, total, MAX_NAME_LEN
        )));
    }

    dst.reserve(total);
    for label in labels {
        dst.put_u8(label.len() as u8);
        dst.put_slice(label.as_bytes());
    }
    dst.put_u8(0);

    Ok(())
}

fn domain_labels(domain_name: &str) -> Result<Vec<&str>, DnsError> {
    if !domain_name.is_ascii() {
        return Err(DnsError::InvalidDomainName(format!(
            "'{}' contains non-ASCII characters",
            domain_name
        )));
    }

    let name = domain_name.strip_suffix('.').unwrap_or(domain_name);
    if name.is_empty() {
        return Ok(Vec::new());
    }

    name.split('.')
        .map(|label| {
            if label.is_empty() {
                Err(DnsError::InvalidDomainName(format!(
                    "'{}' contains an empty label",
                    domain_name
                )))
            } else if label.len() > MAX_LABEL_LEN {
                Err(DnsError::InvalidDomainName(format!(
                    "Label '{}' exceeds maximum length of {} bytes",
                    label, MAX_LABEL_LEN
                )))
            } else {
                Ok(label)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{DnsQuestion, RecordClass, RecordType};
    use bytes::BytesMut;

    fn query(id: u16, name: &str) -> Query {
        Query {
            header: DnsPacketHeader::query(id, true),
            question: DnsQuestion {
                name: name.to_string(),
                qtype: RecordType::A,
                qclass: RecordClass::IN,
            },
        }
    }

    #[test]
    fn test_dns_codec_empty_buffer() {
        let mut codec = DnsCodec::default();
        let mut buf = BytesMut::new();

        let result = codec.decode(&mut buf);
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_dns_codec_short_buffer_is_truncated() {
        let mut codec = DnsCodec::default();
        let mut buf = BytesMut::from(&b"short"[..]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, DnsError::TruncatedMessage { .. }));
    }

    #[test]
    fn test_encode_header() {
        let mut buf = BytesMut::new();

        let header = DnsPacketHeader {
            id: 0x1234,
            qr: true,  // Response
            opcode: 0, // QUERY
            aa: true,  // Authoritative
            tc: false, // Not truncated
            rd: true,  // Recursion desired
            ra: true,  // Recursion available
            z: 0,      // Reserved
            rcode: 0,  // NOERROR
            qdcount: 1,
            ancount: 1,
            nscount: 0,
            arcount: 2,
        };

        encode_header(&header, &mut buf);
        assert_eq!(buf.len(), 12);

        let bytes = buf.as_ref();
        assert_eq!(&bytes[0..2], &[0x12, 0x34]);
        // QR=1, AA=1, RD=1, RA=1 => 1000 0101 1000 0000
        assert_eq!(&bytes[2..4], &[0x85, 0x80]);
        assert_eq!(&bytes[4..12], &[0, 1, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_dns_codec_encode_udp_query() {
        let mut codec = DnsCodec::new(Protocol::Udp);
        let mut buf = BytesMut::new();

        codec.encode(query(0x1234, "google.com"), &mut buf).unwrap();
        let bytes = buf.as_ref();

        assert_eq!(bytes[0], 0x12); // ID high byte
        assert_eq!(bytes[1], 0x34); // ID low byte

        // RD=1, everything else clear
        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 0x00);

        // QDCOUNT=1, ANCOUNT=NSCOUNT=ARCOUNT=0
        assert_eq!(&bytes[4..12], &[0, 1, 0, 0, 0, 0, 0, 0]);

        // 6 "google" 3 "com" 0
        assert_eq!(bytes[12], 6);
        assert_eq!(&bytes[13..19], b"google");
        assert_eq!(bytes[19], 3);
        assert_eq!(&bytes[20..23], b"com");
        assert_eq!(bytes[23], 0);

        // QTYPE A, QCLASS IN
        assert_eq!(&bytes[24..28], &[0, 1, 0, 1]);

        // 12 (header) + 12 (question name) + 4 (qtype + qclass) = 28
        assert_eq!(bytes.len(), 28);
    }

    #[test]
    fn test_dns_codec_tcp_length_prefix() {
        let mut udp = BytesMut::new();
        DnsCodec::new(Protocol::Udp)
            .encode(query(7, "example.com"), &mut udp)
            .unwrap();

        let mut tcp = BytesMut::new();
        DnsCodec::new(Protocol::Tcp)
            .encode(query(7, "example.com"), &mut tcp)
            .unwrap();

        let length = u16::from_be_bytes([tcp[0], tcp[1]]) as usize;
        assert_eq!(length, tcp.len() - 2);
        assert_eq!(&tcp[2..], udp.as_ref());
    }

    #[test]
    fn test_dns_codec_encode_fixes_counts() {
        let mut item = query(1, "example.com");
        item.header.qdcount = 99;
        item.header.ancount = 3;

        let mut buf = BytesMut::new();
        DnsCodec::default().encode(item, &mut buf).unwrap();
        assert_eq!(&buf[4..12], &[0, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_dns_codec_encode_domain_name_edge_cases() {
        let mut buf = BytesMut::new();

        encode_domain_name("example.com", &mut buf).unwrap();
        let expected = vec![
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', // "example"
            3, b'c', b'o', b'm', // "com"
            0,    // null terminator
        ];
        assert_eq!(buf.as_ref(), &expected[..]);

        // a trailing dot encodes identically
        buf.clear();
        encode_domain_name("test.org.", &mut buf).unwrap();
        let expected = vec![4, b't', b'e', b's', b't', 3, b'o', b'r', b'g', 0];
        assert_eq!(buf.as_ref(), &expected[..]);

        buf.clear();
        encode_domain_name("", &mut buf).unwrap();
        encode_domain_name(".", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0, 0]);
    }

    #[test]
    fn test_encode_domain_name_rejects_invalid() {
        let long_label = "a".repeat(64);
        let long_name = ["a".repeat(63).as_str(); 4].join(".");

        for bad in [
            "example..com",
            ".example.com",
            "example.com..",
            "bücher.example",
            long_label.as_str(),
            long_name.as_str(),
        ] {
            let mut buf = BytesMut::new();
            let err = encode_domain_name(bad, &mut buf).unwrap_err();
            assert!(matches!(err, DnsError::InvalidDomainName(_)), "{bad}");
            assert!(buf.is_empty(), "{bad}");
        }

        // 63 + 63 + 63 + 61 labels: exactly 255 octets on the wire
        let max_name = [
            "a".repeat(63),
            "b".repeat(63),
            "c".repeat(63),
            "d".repeat(61),
        ]
        .join(".");
        let mut buf = BytesMut::new();
        encode_domain_name(&max_name, &mut buf).unwrap();
        assert_eq!(buf.len(), 255);
    }

    #[test]
    fn test_failed_encode_leaves_buffer_untouched() {
        let mut buf = BytesMut::from(&b"keep"[..]);
        let result = DnsCodec::new(Protocol::Tcp).encode(query(1, "a..b"), &mut buf);
        assert!(result.is_err());
        assert_eq!(buf.as_ref(), b"keep");
    }

    #[test]
    fn test_dns_codec_round_trip() {
        let mut codec = DnsCodec::default();

        let mut encoded = BytesMut::new();
        codec.encode(query(0x5678, "example.com"), &mut encoded).unwrap();

        let decoded = codec.decode(&mut encoded).unwrap().unwrap();
        assert!(encoded.is_empty());

        assert_eq!(decoded.header.id, 0x5678);
        assert!(!decoded.header.qr);
        assert!(decoded.header.rd);
        assert_eq!(decoded.header.qdcount, 1);
        assert_eq!(decoded.header.ancount, 0);
        assert_eq!(decoded.header.nscount, 0);
        assert_eq!(decoded.header.arcount, 0);

        let question = decoded.question().unwrap();
        assert_eq!(question.name, "example.com.");
        assert_eq!(question.qtype, RecordType::A);
        assert_eq!(question.qclass, RecordClass::IN);
    }

    #[test]
    fn test_dns_codec_decode_response() {
        let packet = crate::test_support::response_with(0x4242, &[(1, vec![1, 1, 1, 1])]);
        let mut buf = BytesMut::from(&packet[..]);

        let response = DnsCodec::default().decode(&mut buf).unwrap().unwrap();
        assert_eq!(response.transaction_id(), 0x4242);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].answer, "Address: 1.1.1.1");
    }
}
