//! DNS wire-format codec
//!
//! Just enough of RFC 1035 for the interception path: parse the question
//! of a captured query, walk the answer records of a response to harvest
//! addresses, and synthesize pre-encoded answer records for forged replies.
//!
//! Offsets are relative to the start of the DNS message (the UDP payload).

use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// QTYPE for an A record
pub const QTYPE_A: u16 = 1;
/// QTYPE for an AAAA record
pub const QTYPE_AAAA: u16 = 28;

/// TTL stamped on every forged answer record (one hour)
const FORGED_RR_TTL: [u8; 4] = [0x00, 0x00, 0x0E, 0x10];

/// A parsed question section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Query name, labels joined with dots, as written on the wire
    pub name: String,
    /// Query type (1 = A, 28 = AAAA)
    pub qtype: u16,
    /// Offset of the first answer record in a response with this question
    pub answers_offset: usize,
}

/// Parse the single question of a DNS message.
///
/// Reads length-prefixed labels starting at offset 12 until the zero byte,
/// then QTYPE. `answers_offset` points just past QTYPE and QCLASS.
pub fn parse_question(msg: &[u8]) -> Result<Question> {
    if msg.len() < 13 {
        return Err(Error::MalformedQuery { offset: msg.len() });
    }

    let mut name = String::new();
    let mut off = 12;

    loop {
        if off >= msg.len() {
            return Err(Error::MalformedQuery { offset: off });
        }
        let len = msg[off] as usize;
        off += 1;
        if len == 0 {
            break;
        }
        let end = off + len;
        if end > msg.len() {
            return Err(Error::MalformedQuery { offset: off });
        }
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(&String::from_utf8_lossy(&msg[off..end]));
        off = end;
    }

    if name.is_empty() || off + 4 > msg.len() {
        return Err(Error::MalformedQuery { offset: off });
    }

    let qtype = u16::from_be_bytes([msg[off], msg[off + 1]]);

    Ok(Question {
        name,
        qtype,
        answers_offset: off + 4,
    })
}

/// Read ANCOUNT from a DNS message header
pub fn answer_count(msg: &[u8]) -> usize {
    if msg.len() < 8 {
        return 0;
    }
    u16::from_be_bytes([msg[6], msg[7]]) as usize
}

/// Walk `count` answer records and collect every A and AAAA address.
///
/// `records` starts at the first answer record (use
/// [`Question::answers_offset`] into the message). Owner names are skipped
/// label by label; a length byte with the top two bits set is a 2-byte
/// compression pointer. Unknown record types are skipped over by RDLENGTH.
pub fn parse_answers(records: &[u8], count: usize) -> Result<Vec<IpAddr>> {
    let mut ips = Vec::new();
    let mut off = 0;

    for _ in 0..count {
        // Skip the owner name
        loop {
            if off >= records.len() {
                return Err(Error::MalformedAnswer { offset: off });
            }
            let len = records[off] as usize;
            off += 1;
            if len == 0 {
                break;
            }
            if len >= 0xC0 {
                // Compression pointer: one more byte, then the name ends
                off += 1;
                break;
            }
            off += len;
        }

        if off + 10 > records.len() {
            return Err(Error::MalformedAnswer { offset: off });
        }
        let rtype = u16::from_be_bytes([records[off], records[off + 1]]);
        let rdlength = u16::from_be_bytes([records[off + 8], records[off + 9]]) as usize;
        off += 10;

        if off + rdlength > records.len() {
            return Err(Error::MalformedAnswer { offset: off });
        }

        match rtype {
            QTYPE_A if rdlength == 4 => {
                ips.push(IpAddr::V4(Ipv4Addr::new(
                    records[off],
                    records[off + 1],
                    records[off + 2],
                    records[off + 3],
                )));
            }
            QTYPE_AAAA if rdlength == 16 => {
                let mut addr = [0u8; 16];
                addr.copy_from_slice(&records[off..off + 16]);
                ips.push(IpAddr::V6(Ipv6Addr::from(addr)));
            }
            _ => {}
        }

        off += rdlength;
    }

    Ok(ips)
}

/// Encode answer records for the addresses matching `qtype`'s family.
///
/// Each record uses the compressed-name pointer 0xC00C back to the question,
/// class IN, and a one-hour TTL. Returns the record count and the encoded
/// bytes, ready to append to a forged reply.
pub fn pack_answers(ips: &[IpAddr], qtype: u16) -> (u16, Vec<u8>) {
    let mut count = 0u16;
    let mut answers = Vec::new();

    for ip in ips {
        match (ip, qtype) {
            (IpAddr::V4(v4), QTYPE_A) => {
                answers.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01]);
                answers.extend_from_slice(&FORGED_RR_TTL);
                answers.extend_from_slice(&[0x00, 0x04]);
                answers.extend_from_slice(&v4.octets());
                count += 1;
            }
            (IpAddr::V6(v6), QTYPE_AAAA) => {
                answers.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x1C, 0x00, 0x01]);
                answers.extend_from_slice(&FORGED_RR_TTL);
                answers.extend_from_slice(&[0x00, 0x10]);
                answers.extend_from_slice(&v6.octets());
                count += 1;
            }
            _ => {}
        }
    }

    (count, answers)
}
