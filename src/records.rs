//! Decoded resource records.
//!
//! [`RecordData`] is a closed set over every record kind the decoder
//! understands, with [`RecordData::Unknown`] catching everything else. Each
//! variant renders a human readable summary through `Display`; the summary
//! is for presentation only, the typed fields carry the semantics.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::protocol::RecordHeader;

// IP protocol numbers that show up in WKS records
const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;

/// LOC latitude/longitude origin (equator / prime meridian)
pub const LOC_EQUATOR: u32 = 0x8000_0000;
/// LOC altitude origin: 100,000 m below the WGS 84 reference spheroid, in cm
pub const LOC_ALTITUDE_BASE: i64 = 10_000_000;

/// A resource record: the common header, the decoded RDATA and its
/// rendered summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub header: RecordHeader,
    pub data: RecordData,
    pub answer: String,
}

impl Record {
    pub fn new(header: RecordHeader, data: RecordData) -> Self {
        let answer = data.to_string();
        Self {
            header,
            data,
            answer,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.header.name, self.header.ttl, self.header.rclass, self.header.rtype, self.answer
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    MX {
        preference: u16,
        exchange: String,
    },
    /// Responsible person (RFC 1183)
    RP {
        mailbox: String,
        txt_domain: String,
    },
    MR {
        new_name: String,
    },
    MB {
        mailbox_host: String,
    },
    MG {
        member: String,
    },
    NS {
        host: String,
    },
    CNAME {
        canonical: String,
    },
    PTR {
        target: String,
    },
    HINFO {
        cpu: String,
        os: String,
    },
    MINFO {
        responsible_mailbox: String,
        error_mailbox: String,
    },
    X25 {
        psdn_address: String,
    },
    TXT {
        strings: Vec<String>,
    },
    LOC(LocRecord),
    SOA(SoaRecord),
    SRV(SrvRecord),
    AFSDB {
        subtype: u16,
        hostname: String,
    },
    ATMA {
        format: u8,
        address: Vec<u8>,
    },
    ISDN {
        address: String,
        subaddress: Option<String>,
    },
    RT {
        preference: u16,
        intermediate_host: String,
    },
    WKS(WksRecord),
    /// Anything without a dedicated parser; RDATA is kept verbatim.
    Unknown {
        data: Vec<u8>,
    },
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(address) => write!(f, "Address: {address}"),
            RecordData::AAAA(address) => write!(f, "Address: {address}"),
            RecordData::MX {
                preference,
                exchange,
            } => write!(
                f,
                "MX Preference: {preference}, Mail Exchanger: {exchange}"
            ),
            RecordData::RP {
                mailbox,
                txt_domain,
            } => write!(f, "Mailbox: {mailbox}, TXT Domain: {txt_domain}"),
            RecordData::MR { new_name } => write!(f, "Mail Rename: {new_name}"),
            RecordData::MB { mailbox_host } => write!(f, "Mailbox Host: {mailbox_host}"),
            RecordData::MG { member } => write!(f, "Mail Group Member: {member}"),
            RecordData::NS { host } => write!(f, "Name Server: {host}"),
            RecordData::CNAME { canonical } => write!(f, "Canonical Name: {canonical}"),
            RecordData::PTR { target } => write!(f, "Pointer: {target}"),
            RecordData::HINFO { cpu, os } => write!(f, "CPU: {cpu}, OS: {os}"),
            RecordData::MINFO {
                responsible_mailbox,
                error_mailbox,
            } => write!(
                f,
                "Responsible Mailbox: {responsible_mailbox}, Error Mailbox: {error_mailbox}"
            ),
            RecordData::X25 { psdn_address } => write!(f, "PSDN Address: {psdn_address}"),
            RecordData::TXT { strings } => {
                let quoted: Vec<String> = strings.iter().map(|s| format!("\"{s}\"")).collect();
                write!(f, "{}", quoted.join(" "))
            }
            RecordData::LOC(loc) => fmt::Display::fmt(loc, f),
            RecordData::SOA(soa) => fmt::Display::fmt(soa, f),
            RecordData::SRV(srv) => fmt::Display::fmt(srv, f),
            RecordData::AFSDB { subtype, hostname } => {
                write!(f, "Subtype: {subtype}, Hostname: {hostname}")
            }
            RecordData::ATMA { format, address } => match format {
                // E.164 addresses are ASCII digits
                1 => write!(f, "ATM Address (E.164): +{}", printable(address)),
                0 => write!(f, "ATM Address (AESA): {}", hex(address)),
                other => write!(f, "ATM Address (format {other}): {}", hex(address)),
            },
            RecordData::ISDN {
                address,
                subaddress,
            } => match subaddress {
                Some(sa) => write!(f, "ISDN Address: {address}, Subaddress: {sa}"),
                None => write!(f, "ISDN Address: {address}"),
            },
            RecordData::RT {
                preference,
                intermediate_host,
            } => write!(
                f,
                "Preference: {preference}, Intermediate Host: {intermediate_host}"
            ),
            RecordData::WKS(wks) => fmt::Display::fmt(wks, f),
            RecordData::Unknown { data } => write!(f, "{}", printable(data)),
        }
    }
}

/// Start of authority (RFC 1035 section 3.3.13)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SoaRecord {
    pub primary_name_server: String,
    pub responsible_person: String,
    pub serial: u32,
    pub refresh_interval: u32,
    pub retry_interval: u32,
    pub expiration_limit: u32,
    // only the positive range of a signed 32 bit number is meaningful
    pub minimum_ttl: i32,
}

impl fmt::Display for SoaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Primary NameServer: {}, Responsible Person: {}, Serial: {}, Refresh Interval: {}, Retry Interval: {}, Expire: {}, TTL: {}",
            self.primary_name_server,
            self.responsible_person,
            self.serial,
            self.refresh_interval,
            self.retry_interval,
            self.expiration_limit,
            self.minimum_ttl
        )
    }
}

/// Service location (RFC 2782)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

impl fmt::Display for SrvRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Service Location: Priority: {}, Weight: {}, Port: {}, HostName: {}",
            self.priority, self.weight, self.port, self.target
        )
    }
}

/// Well-known services (RFC 1035 section 3.4.2)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WksRecord {
    pub address: Ipv4Addr,
    pub protocol: u8,
    pub ports: Vec<u16>,
}

impl fmt::Display for WksRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<String> = self
            .ports
            .iter()
            .map(|&port| match (self.protocol, service_name(port)) {
                (IPPROTO_TCP | IPPROTO_UDP, Some(name)) => format!("{name}({port})"),
                _ => format!("({port})"),
            })
            .collect();

        match self.protocol {
            IPPROTO_TCP => write!(f, "TCP: {}", services.join(", ")),
            IPPROTO_UDP => write!(f, "UDP: {}", services.join(", ")),
            other => write!(f, "Protocol {other}: {}", services.join(", ")),
        }
    }
}

fn service_name(port: u16) -> Option<&'static str> {
    let name = match port {
        7 => "echo",
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "domain",
        80 => "http",
        110 => "pop3",
        123 => "ntp",
        143 => "imap",
        443 => "https",
        _ => return None,
    };
    Some(name)
}

/// Geographic location (RFC 1876). Raw wire values are kept as-is; the
/// methods decode them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocRecord {
    pub version: u8,
    pub size: u8,
    pub horizontal_precision: u8,
    pub vertical_precision: u8,
    pub latitude: u32,
    pub longitude: u32,
    pub altitude: u32,
}

impl LocRecord {
    pub fn size_meters(&self) -> f64 {
        precision_meters(self.size)
    }

    pub fn horizontal_precision_meters(&self) -> f64 {
        precision_meters(self.horizontal_precision)
    }

    pub fn vertical_precision_meters(&self) -> f64 {
        precision_meters(self.vertical_precision)
    }

    pub fn latitude_angle(&self) -> Angle {
        Angle::from_wire(self.latitude, 'N', 'S')
    }

    pub fn longitude_angle(&self) -> Angle {
        Angle::from_wire(self.longitude, 'E', 'W')
    }

    /// Altitude in meters relative to the reference spheroid
    pub fn altitude_meters(&self) -> f64 {
        (self.altitude as i64 - LOC_ALTITUDE_BASE) as f64 / 100.0
    }
}

impl fmt::Display for LocRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version: {}, Size: {} m, Horizontal Precision: {} m, Vertical Precision: {} m, Latitude: {}, Longitude: {}, Altitude: {} m",
            self.version,
            self.size_meters(),
            self.horizontal_precision_meters(),
            self.vertical_precision_meters(),
            self.latitude_angle(),
            self.longitude_angle(),
            self.altitude_meters()
        )
    }
}

/// Size and precision bytes: high nibble is the mantissa, low nibble a
/// power of ten, the product is in centimeters.
pub fn precision_meters(value: u8) -> f64 {
    let mantissa = (value >> 4) as f64;
    let exponent = (value & 0x0F) as i32;
    mantissa * 10f64.powi(exponent) / 100.0
}

/// A latitude or longitude split into degrees, minutes, seconds and
/// thousandths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Angle {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub thousandths: u32,
    pub hemisphere: char,
}

impl Angle {
    /// `positive` is the hemisphere at or above the origin (N or E).
    fn from_wire(raw: u32, positive: char, negative: char) -> Self {
        let (mut angle, hemisphere) = if raw < LOC_EQUATOR {
            (LOC_EQUATOR - raw, negative)
        } else {
            (raw - LOC_EQUATOR, positive)
        };

        let thousandths = angle % 1000;
        angle /= 1000;
        let seconds = angle % 60;
        angle /= 60;
        let minutes = angle % 60;
        let degrees = angle / 60;

        Self {
            degrees,
            minutes,
            seconds,
            thousandths,
            hemisphere,
        }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deg, {} min {}.{:03} sec {}",
            self.degrees, self.minutes, self.seconds, self.thousandths, self.hemisphere
        )
    }
}

/// Printable ASCII is kept, everything else becomes `.`
pub fn printable(data: &[u8]) -> String {
    data.iter()
        .map(|&b| if b > 0x20 && b < 0x7e { b as char } else { '.' })
        .collect()
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(latitude: u32, longitude: u32, altitude: u32) -> LocRecord {
        LocRecord {
            version: 0,
            size: 0x12,
            horizontal_precision: 0x16,
            vertical_precision: 0x13,
            latitude,
            longitude,
            altitude,
        }
    }

    #[test]
    fn test_loc_altitude() {
        assert_eq!(loc(LOC_EQUATOR, LOC_EQUATOR, 10_002_500).altitude_meters(), 25.0);
        assert_eq!(loc(LOC_EQUATOR, LOC_EQUATOR, 9_999_900).altitude_meters(), -1.0);
    }

    #[test]
    fn test_loc_precision() {
        // 1e2 cm, 1e6 cm, 1e3 cm
        let record = loc(LOC_EQUATOR, LOC_EQUATOR, 10_000_000);
        assert_eq!(record.size_meters(), 1.0);
        assert_eq!(record.horizontal_precision_meters(), 10_000.0);
        assert_eq!(record.vertical_precision_meters(), 10.0);
        assert_eq!(precision_meters(0x00), 0.0);
        assert_eq!(precision_meters(0x95), 9_000.0);
    }

    #[test]
    fn test_loc_angles() {
        // 42 deg 21 min 43.952 sec N
        let north = (((42 * 60) + 21) * 60 + 43) * 1000 + 952;
        // 71 deg 5 min 6.344 sec W
        let west = (((71 * 60) + 5) * 60 + 6) * 1000 + 344;
        let record = loc(LOC_EQUATOR + north, LOC_EQUATOR - west, 10_000_000);

        let lat = record.latitude_angle();
        assert_eq!((lat.degrees, lat.minutes, lat.seconds, lat.thousandths), (42, 21, 43, 952));
        assert_eq!(lat.hemisphere, 'N');
        assert_eq!(lat.to_string(), "42 deg, 21 min 43.952 sec N");

        let long = record.longitude_angle();
        assert_eq!(long.to_string(), "71 deg, 5 min 6.344 sec W");

        // exactly on the origin counts as north / east
        assert_eq!(loc(LOC_EQUATOR, LOC_EQUATOR, 0).latitude_angle().hemisphere, 'N');
    }

    #[test]
    fn test_wks_rendering() {
        let wks = WksRecord {
            address: Ipv4Addr::new(10, 0, 0, 1),
            protocol: 6,
            ports: vec![25, 53, 8080],
        };
        assert_eq!(wks.to_string(), "TCP: smtp(25), domain(53), (8080)");

        let other = WksRecord {
            address: Ipv4Addr::new(10, 0, 0, 1),
            protocol: 132,
            ports: vec![53],
        };
        assert_eq!(other.to_string(), "Protocol 132: (53)");
    }

    #[test]
    fn test_unknown_rendering_masks_unprintable() {
        let data = RecordData::Unknown {
            data: vec![b'a', 0x00, b'B', b' ', 0x7f, b'~', b'z'],
        };
        assert_eq!(data.to_string(), "a.B...z");
    }

    #[test]
    fn test_summaries() {
        let mx = RecordData::MX {
            preference: 10,
            exchange: "mail.example.com.".to_string(),
        };
        assert_eq!(
            mx.to_string(),
            "MX Preference: 10, Mail Exchanger: mail.example.com."
        );

        let txt = RecordData::TXT {
            strings: vec!["v=spf1 -all".to_string(), "hello".to_string()],
        };
        assert_eq!(txt.to_string(), "\"v=spf1 -all\" \"hello\"");

        let atma = RecordData::ATMA {
            format: 1,
            address: b"15555551234".to_vec(),
        };
        assert_eq!(atma.to_string(), "ATM Address (E.164): +15555551234");
    }
}
