// DNS message structures and the code tables used on the wire
// https://www.rfc-editor.org/rfc/rfc1035#section-4.1

use std::fmt;
use std::str::FromStr;

use crate::records::Record;

// Flag masks for the second 16-bit word of the header
pub const FLAG_QR: u16 = 0x8000;
pub const FLAG_OPCODE: u16 = 0x7800;
pub const FLAG_AA: u16 = 0x0400;
pub const FLAG_TC: u16 = 0x0200;
pub const FLAG_RD: u16 = 0x0100;
pub const FLAG_RA: u16 = 0x0080;
pub const FLAG_Z: u16 = 0x0070;
pub const FLAG_RCODE: u16 = 0x000F;

/// Size of the fixed message header in bytes
pub const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DnsPacketHeader {
    pub id: u16,      // Identifier, 16 bits
    pub qr: bool,     // Query or Response, 1 bit
    pub opcode: u8,   // Operation code, 4 bits
    pub aa: bool,     // Authoritative answer, 1 bit
    pub tc: bool,     // Truncated, 1 bit
    pub rd: bool,     // Recursion desired, 1 bit
    pub ra: bool,     // Recursion available, 1 bit
    pub z: u8,        // Reserved / EDNS zone bits, 3 bits
    pub rcode: u8,    // Response code, 4 bits
    pub qdcount: u16, // Number of questions, 16 bits
    pub ancount: u16, // Number of answers, 16 bits
    pub nscount: u16, // Number of authority records, 16 bits
    pub arcount: u16, // Number of additional records, 16 bits
}

impl DnsPacketHeader {
    /// Header for an outbound standard query: QR clear, opcode QUERY.
    pub fn query(id: u16, recursion_desired: bool) -> Self {
        Self {
            id,
            rd: recursion_desired,
            qdcount: 1,
            ..Self::default()
        }
    }

    /// Splits a raw flags word into the individual header fields.
    pub fn with_flags(mut self, flags: u16) -> Self {
        self.qr = (flags & FLAG_QR) != 0;
        self.opcode = ((flags & FLAG_OPCODE) >> 11) as u8;
        self.aa = (flags & FLAG_AA) != 0;
        self.tc = (flags & FLAG_TC) != 0;
        self.rd = (flags & FLAG_RD) != 0;
        self.ra = (flags & FLAG_RA) != 0;
        self.z = ((flags & FLAG_Z) >> 4) as u8;
        self.rcode = (flags & FLAG_RCODE) as u8;
        self
    }

    /// Composes the flags word; inverse of [`DnsPacketHeader::with_flags`].
    pub fn flags(&self) -> u16 {
        let mut flags: u16 = 0;

        if self.qr {
            flags |= FLAG_QR;
        }
        flags |= ((self.opcode as u16) & 0x0F) << 11;
        if self.aa {
            flags |= FLAG_AA;
        }
        if self.tc {
            flags |= FLAG_TC;
        }
        if self.rd {
            flags |= FLAG_RD;
        }
        if self.ra {
            flags |= FLAG_RA;
        }
        flags |= ((self.z as u16) & 0x07) << 4;
        flags |= (self.rcode as u16) & 0x0F;

        flags
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from(self.opcode)
    }

    pub fn response_code(&self) -> ResponseCode {
        ResponseCode::from(self.rcode)
    }
}

// Define the DNS question section structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub name: String,       // Domain name, represented as a sequence of "labels"
    pub qtype: RecordType,  // https://www.rfc-editor.org/rfc/rfc1035#section-3.2.2
    pub qclass: RecordClass, // https://www.rfc-editor.org/rfc/rfc1035#section-3.2.4
}

impl fmt::Display for DnsQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.qclass, self.qtype)
    }
}

/// An outbound query: the header and its single question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub header: DnsPacketHeader,
    pub question: DnsQuestion,
}

/// The fixed prefix shared by every resource record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHeader {
    /// Owner name of the record
    pub name: String,
    pub rtype: RecordType,
    pub rclass: RecordClass,
    /// Signed per RFC 1035; zero means the record must not be cached.
    pub ttl: i32,
    /// RDLENGTH, the exact number of RDATA bytes that follow
    pub data_length: u16,
}

/// Selects how a query travels to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Connectionless, one datagram each way
    #[default]
    Udp,
    /// Connection-oriented, requests carry a two byte length prefix
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Tcp => write!(f, "TCP"),
        }
    }
}

/// A fully decoded response message. Built once per buffer and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: DnsPacketHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
    /// Size of the buffer the response was decoded from
    pub bytes_received: usize,
}

impl Response {
    /// The question the server answered, i.e. the first (normally only)
    /// entry of the question section.
    pub fn question(&self) -> Option<&DnsQuestion> {
        self.questions.first()
    }

    pub fn transaction_id(&self) -> u16 {
        self.header.id
    }

    pub fn response_code(&self) -> ResponseCode {
        self.header.response_code()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        writeln!(
            f,
            ";; opcode: {}, status: {}, id: {}",
            h.opcode(),
            h.response_code(),
            h.id
        )?;

        let mut flags = Vec::new();
        let bits = [(h.qr, "qr"), (h.aa, "aa"), (h.tc, "tc"), (h.rd, "rd"), (h.ra, "ra")];
        for (set, name) in bits {
            if set {
                flags.push(name);
            }
        }
        writeln!(
            f,
            ";; flags: {}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            flags.join(" "),
            h.qdcount,
            h.ancount,
            h.nscount,
            h.arcount
        )?;

        writeln!(f, "\n;; QUESTION SECTION:")?;
        for question in &self.questions {
            writeln!(f, ";{question}")?;
        }

        for (title, records) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authorities),
            ("ADDITIONAL", &self.additionals),
        ] {
            if records.is_empty() {
                continue;
            }
            writeln!(f, "\n;; {title} SECTION:")?;
            for record in records {
                writeln!(f, "{record}")?;
            }
        }

        write!(f, "\n;; MSG SIZE rcvd: {}", self.bytes_received)
    }
}

/// Defines an integer-coded wire enum with an `Unknown` fallback plus the
/// `From`, `Display` and `FromStr` conversions.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($prefix:literal) : $repr:ty { $($variant:ident = $code:literal => $text:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown($repr),
        }

        impl From<$repr> for $name {
            fn from(code: $repr) -> Self {
                match code {
                    $($code => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $code,)+
                    $name::Unknown(other) => other,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($name::$variant => write!(f, $text),)+
                    $name::Unknown(code) => write!(f, concat!($prefix, "{}"), code),
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            /// Case-insensitive mnemonic, or the generic numeric form
            /// (e.g. `TYPE65`, `CLASS7`) for codes without a name.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.to_uppercase();
                $(if upper == $text {
                    return Ok($name::$variant);
                })+
                upper
                    .strip_prefix($prefix)
                    .and_then(|digits| digits.parse::<$repr>().ok())
                    .map($name::from)
                    .ok_or_else(|| format!("Unknown {}: {}", stringify!($name), s))
            }
        }
    };
}

code_enum! {
    /// Resource record TYPE / query QTYPE codes.
    /// `Unknown` renders and parses as `TYPE<n>`, after RFC 3597.
    RecordType("TYPE"): u16 {
        A = 1 => "A",
        NS = 2 => "NS",
        MD = 3 => "MD",
        MF = 4 => "MF",
        CNAME = 5 => "CNAME",
        SOA = 6 => "SOA",
        MB = 7 => "MB",
        MG = 8 => "MG",
        MR = 9 => "MR",
        NULL = 10 => "NULL",
        WKS = 11 => "WKS",
        PTR = 12 => "PTR",
        HINFO = 13 => "HINFO",
        MINFO = 14 => "MINFO",
        MX = 15 => "MX",
        TXT = 16 => "TXT",
        RP = 17 => "RP",
        AFSDB = 18 => "AFSDB",
        X25 = 19 => "X25",
        ISDN = 20 => "ISDN",
        RT = 21 => "RT",
        AAAA = 28 => "AAAA",
        LOC = 29 => "LOC",
        SRV = 33 => "SRV",
        ATMA = 34 => "ATMA",
        NAPTR = 35 => "NAPTR",
        OPT = 41 => "OPT",
        AXFR = 252 => "AXFR",
        MAILB = 253 => "MAILB",
        MAILA = 254 => "MAILA",
        ANY = 255 => "ANY",
    }
}

code_enum! {
    /// CLASS / QCLASS codes.
    RecordClass("CLASS"): u16 {
        IN = 1 => "IN",
        CS = 2 => "CS",
        CH = 3 => "CH",
        HS = 4 => "HS",
        NONE = 254 => "NONE",
        ANY = 255 => "ANY",
    }
}

code_enum! {
    /// Kind of query carried in the header's 4-bit OPCODE field.
    Opcode("OPCODE"): u8 {
        Query = 0 => "QUERY",
        IQuery = 1 => "IQUERY",
        Status = 2 => "STATUS",
        Notify = 4 => "NOTIFY",
        Update = 5 => "UPDATE",
    }
}

code_enum! {
    /// Response status carried in the header's 4-bit RCODE field.
    ResponseCode("RCODE"): u8 {
        NoError = 0 => "NOERROR",
        FormErr = 1 => "FORMERR",
        ServFail = 2 => "SERVFAIL",
        NXDomain = 3 => "NXDOMAIN",
        NotImp = 4 => "NOTIMP",
        Refused = 5 => "REFUSED",
        YXDomain = 6 => "YXDOMAIN",
        YXRRSet = 7 => "YXRRSET",
        NXRRSet = 8 => "NXRRSET",
        NotAuth = 9 => "NOTAUTH",
        NotZone = 10 => "NOTZONE",
    }
}
