use std::net::SocketAddr;

/// Errors that can occur while building, sending or decoding DNS messages
#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    #[error("Malformed name compression at offset {offset}")]
    MalformedCompression { offset: usize },

    #[error("Truncated message: ran out of bytes at offset {offset}")]
    TruncatedMessage { offset: usize },

    #[error("Domain name starting at offset {offset} exceeds 255 octets")]
    NameTooLong { offset: usize },

    #[error("RDATA length mismatch for type {rtype}: declared {declared} bytes, parser consumed {consumed}")]
    RdataLengthMismatch {
        rtype: u16,
        declared: u16,
        consumed: usize,
    },

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Transport failure talking to {server}: {source}")]
    TransportFailure {
        server: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transaction id mismatch: sent {expected}, received {actual}")]
    TransactionIdMismatch { expected: u16, actual: u16 },

    #[error("No DNS server endpoint configured")]
    MissingServer,

    /// Raised by framed streams driving [`crate::codec::DnsCodec`]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of every wire decoder in the crate.
pub type ParseResult<'a, T> = nom::IResult<&'a [u8], T, WireError<'a>>;

/// What went wrong inside a nom parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireErrorKind {
    Truncated,
    MalformedCompression,
    NameTooLong,
    LengthMismatch {
        rtype: u16,
        declared: u16,
        consumed: usize,
    },
}

/// Error type threaded through the nom decoders. `input` is the slice the
/// failing parser was looking at, so the position can be recovered against
/// the full message later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireError<'a> {
    pub input: &'a [u8],
    pub kind: WireErrorKind,
}

impl<'a> WireError<'a> {
    pub fn new(input: &'a [u8], kind: WireErrorKind) -> Self {
        Self { input, kind }
    }

    /// Unrecoverable: the message is malformed, not merely short.
    pub fn failure(input: &'a [u8], kind: WireErrorKind) -> nom::Err<Self> {
        nom::Err::Failure(Self::new(input, kind))
    }
}

impl<'a> nom::error::ParseError<&'a [u8]> for WireError<'a> {
    // The decoders only use nom for fixed-width reads and `take`, so any
    // error nom reports itself means the buffer ran out.
    fn from_error_kind(input: &'a [u8], _kind: nom::error::ErrorKind) -> Self {
        Self::new(input, WireErrorKind::Truncated)
    }

    fn append(_input: &'a [u8], _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl DnsError {
    /// Converts a decoder error into a `DnsError`, resolving the failing
    /// position against the full message buffer.
    pub fn from_wire(packet: &[u8], err: nom::Err<WireError<'_>>) -> Self {
        let err = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
            nom::Err::Incomplete(_) => {
                return DnsError::TruncatedMessage {
                    offset: packet.len(),
                }
            }
        };

        let offset = offset_in(packet, err.input);

        match err.kind {
            WireErrorKind::Truncated => DnsError::TruncatedMessage { offset },
            WireErrorKind::MalformedCompression => DnsError::MalformedCompression { offset },
            WireErrorKind::NameTooLong => DnsError::NameTooLong { offset },
            WireErrorKind::LengthMismatch {
                rtype,
                declared,
                consumed,
            } => DnsError::RdataLengthMismatch {
                rtype,
                declared,
                consumed,
            },
        }
    }
}

// Every slice a decoder sees is carved out of `packet`, so this is a plain
// pointer difference; anything else clamps to the end of the buffer.
fn offset_in(packet: &[u8], input: &[u8]) -> usize {
    let start = packet.as_ptr() as usize;
    let at = input.as_ptr() as usize;
    if at >= start && at <= start + packet.len() {
        at - start
    } else {
        packet.len()
    }
}
