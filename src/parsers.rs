use nom::{
    self,
    bytes::complete::take,
    number::complete::{be_i32, be_u16, be_u8},
};
use tracing::{debug, trace};

use crate::errors::{DnsError, ParseResult, WireError, WireErrorKind};
use crate::protocol::{
    DnsPacketHeader, DnsQuestion, RecordClass, RecordHeader, RecordType, Response,
};
use crate::rdata;
use crate::records::Record;

/// Compression pointers followed while decoding a single name. A legal name
/// has at most 127 labels, and a pointer always ends a label run.
pub const MAX_POINTER_HOPS: usize = 127;

/// Longest domain name in wire octets (RFC 1035 section 3.1)
pub const MAX_NAME_LEN: usize = 255;

// root owner name + TYPE + CLASS + TTL + RDLENGTH
const MIN_RECORD_LEN: usize = 11;
// root name + QTYPE + QCLASS
const MIN_QUESTION_LEN: usize = 5;

pub fn parse_dns_packet_header(input: &[u8]) -> ParseResult<'_, DnsPacketHeader> {
    let (input, id) = be_u16(input)?;
    // 1 bit qr, 4 bits opcode, aa, tc, rd, ra, 3 bits z, 4 bits rcode
    let (input, flags) = be_u16(input)?;
    let (input, qdcount) = be_u16(input)?;
    let (input, ancount) = be_u16(input)?;
    let (input, nscount) = be_u16(input)?;
    let (input, arcount) = be_u16(input)?;

    let header = DnsPacketHeader {
        id,
        qdcount,
        ancount,
        nscount,
        arcount,
        ..DnsPacketHeader::default()
    }
    .with_flags(flags);

    Ok((input, header))
}

/// Decodes a possibly compressed domain name starting at `input`.
///
/// `packet` is the whole message; compression pointers are absolute offsets
/// into it. Following a pointer decodes from a fresh slice of `packet`, the
/// returned remainder always continues right after the name as it appears
/// at `input` (after the first pointer, if any).
///
/// The result is the dot-joined label sequence with a trailing dot, or the
/// empty string for the root.
pub fn parse_domain_name<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, String> {
    let mut name = String::new();
    // the terminating root label
    let mut wire_len = 1;
    let rest = read_labels(packet, input, 0, &mut name, &mut wire_len)?;
    Ok((rest, name))
}

fn read_labels<'a>(
    packet: &'a [u8],
    mut input: &'a [u8],
    hops: usize,
    name: &mut String,
    wire_len: &mut usize,
) -> Result<&'a [u8], nom::Err<WireError<'a>>> {
    loop {
        let (rest, length) = be_u8(input)?;

        match length & 0xC0 {
            0xC0 => {
                let malformed = || WireError::failure(input, WireErrorKind::MalformedCompression);
                let (rest, low) = be_u8(rest)?;
                if hops >= MAX_POINTER_HOPS {
                    return Err(malformed());
                }

                let offset = u16::from_be_bytes([length & 0x3F, low]) as usize;
                let target = packet
                    .get(offset..)
                    .filter(|target| !target.is_empty())
                    .ok_or_else(malformed)?;

                trace!(offset, hops, "following compression pointer");
                read_labels(packet, target, hops + 1, name, wire_len)?;
                // a pointer always terminates the name
                return Ok(rest);
            }
            0x00 if length == 0 => return Ok(rest),
            0x00 => {
                *wire_len += 1 + length as usize;
                if *wire_len > MAX_NAME_LEN {
                    // only compression can grow a name without bound
                    let kind = if hops > 0 {
                        WireErrorKind::MalformedCompression
                    } else {
                        WireErrorKind::NameTooLong
                    };
                    return Err(WireError::failure(input, kind));
                }

                let (rest, label) = take(length as usize)(rest)?;
                push_label(name, label);
                name.push('.');
                input = rest;
            }
            // 01 and 10 prefixes are reserved
            _ => return Err(WireError::failure(input, WireErrorKind::MalformedCompression)),
        }
    }
}

// Printable ASCII is kept as is. `.` and `\` inside a label are
// backslash escaped, every other byte becomes `\DDD` (RFC 1035 section 5.1).
fn push_label(name: &mut String, label: &[u8]) {
    for &b in label {
        match b {
            b'.' | b'\\' => {
                name.push('\\');
                name.push(b as char);
            }
            0x21..=0x7E => name.push(b as char),
            _ => name.push_str(&format!("\\{b:03}")),
        }
    }
}

/// Decodes the name at `offset` in `packet`. Returns the name and the
/// offset of the first byte after it.
pub fn parse_name(packet: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    let input = packet.get(offset..).ok_or(DnsError::TruncatedMessage {
        offset: packet.len(),
    })?;
    let (rest, name) =
        parse_domain_name(packet, input).map_err(|e| DnsError::from_wire(packet, e))?;
    Ok((name, packet.len() - rest.len()))
}

/// Parse a complete DNS question section, requires the full packet for compression.
fn parse_dns_question<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, DnsQuestion> {
    let (input, name) = parse_domain_name(packet, input)?;
    let (input, qtype) = be_u16(input)?;
    let (input, qclass) = be_u16(input)?;

    Ok((
        input,
        DnsQuestion {
            name,
            qtype: RecordType::from(qtype),
            qclass: RecordClass::from(qclass),
        },
    ))
}

/// Decodes the common resource record prefix. The remainder starts exactly
/// at the RDATA.
pub fn parse_record_header<'a>(
    packet: &'a [u8],
    input: &'a [u8],
) -> ParseResult<'a, RecordHeader> {
    let (input, name) = parse_domain_name(packet, input)?;
    let (input, rtype) = be_u16(input)?;
    let (input, rclass) = be_u16(input)?;
    let (input, ttl) = be_i32(input)?;
    let (input, data_length) = be_u16(input)?;

    Ok((
        input,
        RecordHeader {
            name,
            rtype: RecordType::from(rtype),
            rclass: RecordClass::from(rclass),
            ttl,
            data_length,
        },
    ))
}

/// Decodes one resource record; the body parser only ever sees the
/// RDLENGTH bytes that belong to it.
pub fn parse_resource_record<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, Record> {
    let (input, header) = parse_record_header(packet, input)?;
    let (input, rdata) = take(header.data_length as usize)(input)?;
    let data = rdata::parse_rdata(packet, rdata, &header)?;

    Ok((input, Record::new(header, data)))
}

fn parse_section<'a>(
    packet: &'a [u8],
    mut input: &'a [u8],
    count: u16,
    section: &'static str,
) -> ParseResult<'a, Vec<Record>> {
    if input.len() < count as usize * MIN_RECORD_LEN {
        debug!(
            section,
            count,
            remaining = input.len(),
            "Record count exceeds the bytes left in the message"
        );
        return Err(WireError::failure(input, WireErrorKind::Truncated));
    }

    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (rest, record) = parse_resource_record(packet, input)?;
        trace!(section, record = %record, "Parsed resource record");
        records.push(record);
        input = rest;
    }

    Ok((input, records))
}

// Parse a complete DNS response
pub fn parse_dns_packet(input: &[u8]) -> ParseResult<'_, Response> {
    // Keep a reference to the start of the packet for handling compression offsets.
    let packet = input;

    let (mut remaining_input, header) = parse_dns_packet_header(packet)?;

    if remaining_input.len() < header.qdcount as usize * MIN_QUESTION_LEN {
        return Err(WireError::failure(remaining_input, WireErrorKind::Truncated));
    }

    let mut questions = Vec::with_capacity(header.qdcount as usize);
    for _ in 0..header.qdcount {
        let (i, question) = parse_dns_question(packet, remaining_input)?;
        questions.push(question);
        remaining_input = i;
    }

    let (remaining_input, answers) =
        parse_section(packet, remaining_input, header.ancount, "answer")?;
    let (remaining_input, authorities) =
        parse_section(packet, remaining_input, header.nscount, "authority")?;
    let (remaining_input, additionals) =
        parse_section(packet, remaining_input, header.arcount, "additional")?;

    let response = Response {
        header,
        questions,
        answers,
        authorities,
        additionals,
        bytes_received: packet.len(),
    };

    Ok((remaining_input, response))
}

/// Decodes a complete response buffer. There is no partial result: either
/// every section decodes or the whole call fails.
pub fn parse_response(packet: &[u8]) -> Result<Response, DnsError> {
    match parse_dns_packet(packet) {
        Ok((remaining, response)) => {
            if !remaining.is_empty() {
                debug!(
                    trailing = remaining.len(),
                    "Ignoring bytes after the additional section"
                );
            }
            Ok(response)
        }
        Err(e) => Err(DnsError::from_wire(packet, e)),
    }
}
