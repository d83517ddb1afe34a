// Hand-assembled wire messages for the decoder and client tests

/// Pointer to the first name after the header (offset 12)
pub const PTR_QNAME: [u8; 2] = [0xC0, 0x0C];

pub fn header(id: u16, flags: u16, counts: [u16; 4]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&flags.to_be_bytes());
    for count in counts {
        buf.extend_from_slice(&count.to_be_bytes());
    }
    buf
}

/// Uncompressed label sequence for `name`, root terminated
pub fn name(name: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    for label in name.split('.').filter(|l| !l.is_empty()) {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    buf
}

pub fn question(buf: &mut Vec<u8>, owner: &[u8], qtype: u16, qclass: u16) {
    buf.extend_from_slice(owner);
    buf.extend_from_slice(&qtype.to_be_bytes());
    buf.extend_from_slice(&qclass.to_be_bytes());
}

/// Appends an IN-class resource record
pub fn record(buf: &mut Vec<u8>, owner: &[u8], rtype: u16, ttl: i32, rdata: &[u8]) {
    buf.extend_from_slice(owner);
    buf.extend_from_slice(&rtype.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&ttl.to_be_bytes());
    buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    buf.extend_from_slice(rdata);
}

/// Response to `example.com. IN A` with the given answers already encoded
pub fn response_with(id: u16, answers: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut buf = header(id, 0x8180, [1, answers.len() as u16, 0, 0]);
    question(&mut buf, &name("example.com"), 1, 1);
    for (rtype, rdata) in answers {
        record(&mut buf, &PTR_QNAME, *rtype, 300, rdata);
    }
    buf
}
