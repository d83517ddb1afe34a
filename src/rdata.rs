//! RDATA decoders, one per record type, and the type -> decoder registry.
//!
//! Every decoder is handed the full message (for compression pointers) and
//! exactly the RDLENGTH bytes of its record. Reading past that slice fails
//! as truncated; [`parse_rdata`] rejects anything left over.

use std::net::{Ipv4Addr, Ipv6Addr};

use nom::{
    bytes::complete::take,
    number::complete::{be_i32, be_u16, be_u32, be_u8},
};

use crate::errors::{ParseResult, WireError, WireErrorKind};
use crate::parsers::parse_domain_name;
use crate::protocol::{RecordHeader, RecordType};
use crate::records::{LocRecord, RecordData, SoaRecord, SrvRecord, WksRecord};

/// Decoder for one record type: `(full packet, rdata) -> RecordData`.
pub type RdataParser = for<'a> fn(&'a [u8], &'a [u8]) -> ParseResult<'a, RecordData>;

/// Picks the decoder for a record type. Types without a dedicated decoder,
/// including every unassigned code, fall back to [`parse_unknown`].
pub fn lookup(rtype: RecordType) -> RdataParser {
    match rtype {
        RecordType::A => parse_a,
        RecordType::AAAA => parse_aaaa,
        RecordType::NS => parse_ns,
        RecordType::CNAME => parse_cname,
        RecordType::PTR => parse_ptr,
        RecordType::MB => parse_mb,
        RecordType::MG => parse_mg,
        RecordType::MR => parse_mr,
        RecordType::MX => parse_mx,
        RecordType::RT => parse_rt,
        RecordType::AFSDB => parse_afsdb,
        RecordType::SOA => parse_soa,
        RecordType::SRV => parse_srv,
        RecordType::MINFO => parse_minfo,
        RecordType::RP => parse_rp,
        RecordType::HINFO => parse_hinfo,
        RecordType::TXT => parse_txt,
        RecordType::X25 => parse_x25,
        RecordType::ISDN => parse_isdn,
        RecordType::ATMA => parse_atma,
        RecordType::WKS => parse_wks,
        RecordType::LOC => parse_loc,
        RecordType::MD
        | RecordType::MF
        | RecordType::NULL
        | RecordType::NAPTR
        | RecordType::OPT
        | RecordType::AXFR
        | RecordType::MAILB
        | RecordType::MAILA
        | RecordType::ANY
        | RecordType::Unknown(_) => parse_unknown,
    }
}

/// Runs the registered decoder over `rdata` and checks that it consumed all
/// of it.
pub fn parse_rdata<'a>(
    packet: &'a [u8],
    rdata: &'a [u8],
    header: &RecordHeader,
) -> Result<RecordData, nom::Err<WireError<'a>>> {
    let (rest, data) = lookup(header.rtype)(packet, rdata)?;

    if !rest.is_empty() {
        return Err(WireError::failure(
            rest,
            WireErrorKind::LengthMismatch {
                rtype: u16::from(header.rtype),
                declared: header.data_length,
                consumed: rdata.len() - rest.len(),
            },
        ));
    }

    Ok(data)
}

/// <character-string>: one length octet followed by that many bytes
fn character_string(input: &[u8]) -> ParseResult<'_, String> {
    let (input, length) = be_u8(input)?;
    let (input, text) = take(length as usize)(input)?;
    Ok((input, escape_text(text)))
}

// Printable ASCII including space is kept; `"` and `\` are backslash
// escaped, every other byte becomes `\DDD` (RFC 1035 section 5.1).
fn escape_text(text: &[u8]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for &b in text {
        match b {
            b'"' | b'\\' => {
                escaped.push('\\');
                escaped.push(b as char);
            }
            0x20..=0x7E => escaped.push(b as char),
            _ => escaped.push_str(&format!("\\{b:03}")),
        }
    }
    escaped
}

fn parse_a<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, octets) = take(4usize)(input)?;
    let address = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    Ok((input, RecordData::A(address)))
}

fn parse_aaaa<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, octets) = take(16usize)(input)?;
    let mut address = [0u8; 16];
    address.copy_from_slice(octets);
    Ok((input, RecordData::AAAA(Ipv6Addr::from(address))))
}

fn parse_ns<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, host) = parse_domain_name(packet, input)?;
    Ok((input, RecordData::NS { host }))
}

fn parse_cname<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, canonical) = parse_domain_name(packet, input)?;
    Ok((input, RecordData::CNAME { canonical }))
}

fn parse_ptr<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, target) = parse_domain_name(packet, input)?;
    Ok((input, RecordData::PTR { target }))
}

fn parse_mb<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, mailbox_host) = parse_domain_name(packet, input)?;
    Ok((input, RecordData::MB { mailbox_host }))
}

fn parse_mg<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, member) = parse_domain_name(packet, input)?;
    Ok((input, RecordData::MG { member }))
}

fn parse_mr<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, new_name) = parse_domain_name(packet, input)?;
    Ok((input, RecordData::MR { new_name }))
}

fn parse_mx<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, preference) = be_u16(input)?;
    let (input, exchange) = parse_domain_name(packet, input)?;
    Ok((
        input,
        RecordData::MX {
            preference,
            exchange,
        },
    ))
}

fn parse_rt<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, preference) = be_u16(input)?;
    let (input, intermediate_host) = parse_domain_name(packet, input)?;
    Ok((
        input,
        RecordData::RT {
            preference,
            intermediate_host,
        },
    ))
}

fn parse_afsdb<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, subtype) = be_u16(input)?;
    let (input, hostname) = parse_domain_name(packet, input)?;
    Ok((input, RecordData::AFSDB { subtype, hostname }))
}

fn parse_soa<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, primary_name_server) = parse_domain_name(packet, input)?;
    let (input, responsible_person) = parse_domain_name(packet, input)?;
    let (input, serial) = be_u32(input)?;
    let (input, refresh_interval) = be_u32(input)?;
    let (input, retry_interval) = be_u32(input)?;
    let (input, expiration_limit) = be_u32(input)?;
    let (input, minimum_ttl) = be_i32(input)?;

    Ok((
        input,
        RecordData::SOA(SoaRecord {
            primary_name_server,
            responsible_person,
            serial,
            refresh_interval,
            retry_interval,
            expiration_limit,
            minimum_ttl,
        }),
    ))
}

fn parse_srv<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, priority) = be_u16(input)?;
    let (input, weight) = be_u16(input)?;
    let (input, port) = be_u16(input)?;
    let (input, target) = parse_domain_name(packet, input)?;
    Ok((
        input,
        RecordData::SRV(SrvRecord {
            priority,
            weight,
            port,
            target,
        }),
    ))
}

fn parse_minfo<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, responsible_mailbox) = parse_domain_name(packet, input)?;
    let (input, error_mailbox) = parse_domain_name(packet, input)?;
    Ok((
        input,
        RecordData::MINFO {
            responsible_mailbox,
            error_mailbox,
        },
    ))
}

fn parse_rp<'a>(packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, mailbox) = parse_domain_name(packet, input)?;
    let (input, txt_domain) = parse_domain_name(packet, input)?;
    Ok((
        input,
        RecordData::RP {
            mailbox,
            txt_domain,
        },
    ))
}

fn parse_hinfo<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, cpu) = character_string(input)?;
    let (input, os) = character_string(input)?;
    Ok((input, RecordData::HINFO { cpu, os }))
}

fn parse_txt<'a>(_packet: &'a [u8], mut input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let mut strings = Vec::new();
    while !input.is_empty() {
        let (rest, text) = character_string(input)?;
        strings.push(text);
        input = rest;
    }
    Ok((input, RecordData::TXT { strings }))
}

fn parse_x25<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, psdn_address) = character_string(input)?;
    Ok((input, RecordData::X25 { psdn_address }))
}

fn parse_isdn<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, address) = character_string(input)?;
    let (input, subaddress) = if input.is_empty() {
        (input, None)
    } else {
        let (input, sa) = character_string(input)?;
        (input, Some(sa))
    };
    Ok((
        input,
        RecordData::ISDN {
            address,
            subaddress,
        },
    ))
}

fn parse_atma<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, format) = be_u8(input)?;
    let (input, address) = take(input.len())(input)?;
    Ok((
        input,
        RecordData::ATMA {
            format,
            address: address.to_vec(),
        },
    ))
}

fn parse_wks<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, octets) = take(4usize)(input)?;
    let address = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let (input, protocol) = be_u8(input)?;
    let (input, bitmap) = take(input.len())(input)?;

    Ok((
        input,
        RecordData::WKS(WksRecord {
            address,
            protocol,
            ports: bitmap_ports(bitmap),
        }),
    ))
}

// bit i of byte n (MSB first) is port n * 8 + i + 1
fn bitmap_ports(bitmap: &[u8]) -> Vec<u16> {
    let mut ports = Vec::new();
    for (n, byte) in bitmap.iter().enumerate() {
        for i in 0..8 {
            if byte & (0x80 >> i) == 0 {
                continue;
            }
            match u16::try_from(n * 8 + i + 1) {
                Ok(port) => ports.push(port),
                // nothing past the port range can be named
                Err(_) => return ports,
            }
        }
    }
    ports
}

fn parse_loc<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, version) = be_u8(input)?;
    let (input, size) = be_u8(input)?;
    let (input, horizontal_precision) = be_u8(input)?;
    let (input, vertical_precision) = be_u8(input)?;
    // latitude and longitude are thousandths of an arc second, offset from 2^31
    let (input, latitude) = be_u32(input)?;
    let (input, longitude) = be_u32(input)?;
    let (input, altitude) = be_u32(input)?;

    Ok((
        input,
        RecordData::LOC(LocRecord {
            version,
            size,
            horizontal_precision,
            vertical_precision,
            latitude,
            longitude,
            altitude,
        }),
    ))
}

/// Keeps the RDATA verbatim; rendering turns it into printable text.
pub fn parse_unknown<'a>(_packet: &'a [u8], input: &'a [u8]) -> ParseResult<'a, RecordData> {
    let (input, data) = take(input.len())(input)?;
    Ok((
        input,
        RecordData::Unknown {
            data: data.to_vec(),
        },
    ))
}
