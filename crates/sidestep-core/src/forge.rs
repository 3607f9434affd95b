//! Forged-packet synthesis
//!
//! Builds the packets the daemons inject in place of (or around) captured
//! traffic: forged DNS replies, decoy segments crafted to die before the
//! far end, and the two halves of a split TCP segment.
//!
//! Every function returns a freshly owned buffer; forged packets may be
//! sent from a worker that outlives the capture-loop iteration that
//! produced them.

use crate::packet::{set_ip_length, IpVersion, Packet, PacketBuilder};
use std::net::IpAddr;

/// DNS header flags stamped on forged replies: response, recursion available
pub const REPLY_FLAGS: [u8; 2] = [0x81, 0x80];

/// Filler written over the option space of a malformed decoy
const DECOY_JUNK: [u8; 20] = [19, 18, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// Forge a DNS reply to a captured query.
///
/// The reply swaps the query's L3 addresses and L4 ports, carries the
/// original DNS message with flags `0x8180` and `an_count`, and appends the
/// pre-encoded `answers`. An `an_count` of zero with empty `answers`
/// produces the empty (suppression) reply.
pub fn dns_reply(query: &Packet, an_count: u16, answers: &[u8]) -> Vec<u8> {
    let mut msg = query.payload().to_vec();
    msg[2..4].copy_from_slice(&REPLY_FLAGS);
    msg[6..8].copy_from_slice(&an_count.to_be_bytes());
    msg.extend_from_slice(answers);

    reply_builder(query).payload(&msg).build()
}

/// Forge an IPv4 DNS reply carrying a complete upstream response.
///
/// Used on the tunnel path: the upstream message already has its own flags
/// and counts, so it is wrapped as-is.
pub fn tunnel_reply(query: &Packet, response: &[u8]) -> Vec<u8> {
    reply_builder(query).payload(response).build()
}

fn reply_builder(query: &Packet) -> PacketBuilder {
    let builder = match (query.src_addr, query.dst_addr) {
        (IpAddr::V4(src), IpAddr::V4(dst)) => PacketBuilder::udp_v4()
            .src_ip_v4(dst.octets())
            .dst_ip_v4(src.octets()),
        (IpAddr::V6(src), IpAddr::V6(dst)) => PacketBuilder::udp_v6()
            .src_ip_v6(dst.octets())
            .dst_ip_v6(src.octets()),
        // Mixed families cannot come off the wire
        _ => PacketBuilder::udp_v4(),
    };

    builder
        .src_port(query.dst_port)
        .dst_port(query.src_port)
}

/// Forge a decoy from a captured TCP data segment.
///
/// With `ttl > 0` the decoy is a byte copy of the original whose TTL (hop
/// limit on IPv6) is lowered so it expires before reaching the endpoint
/// while still passing the on-path inspector. With `ttl == 0` the segment
/// keeps its TTL but is malformed instead: the TCP header is truncated to
/// 20 bytes, junk overwrites the next 20, and the data-offset nibble claims
/// a 40-byte header, so the far side discards it.
pub fn decoy(original: &Packet, ttl: u8) -> Vec<u8> {
    let raw = original.as_bytes();
    let ip_len = original.ip_header_len();

    if ttl > 0 {
        let mut buf = raw.to_vec();
        match original.ip_version {
            IpVersion::V4 => buf[8] = ttl,
            IpVersion::V6 => buf[7] = ttl,
        }
        buf
    } else {
        let mut buf = vec![0u8; raw.len()];
        let head = (ip_len + 20).min(raw.len());
        buf[..head].copy_from_slice(&raw[..head]);
        let junk_end = (ip_len + 40).min(buf.len());
        if junk_end > head {
            buf[head..junk_end].copy_from_slice(&DECOY_JUNK[..junk_end - head]);
        }
        buf[ip_len + 12] = 10 << 4;
        buf
    }
}

/// Split a captured TCP data segment at `cut` bytes into its payload.
///
/// Returns `(prefix, suffix)`: the prefix carries payload `[0, cut)` under
/// the original headers, the suffix carries payload `[cut, ..)` with its
/// sequence number advanced by `cut`. Both halves get corrected IP length
/// fields; together they carry exactly the original payload.
pub fn split_segment(original: &Packet, cut: usize) -> (Vec<u8>, Vec<u8>) {
    let raw = original.as_bytes();
    let header_len = original.ip_header_len() + original.transport_header_len();
    let cut_at = header_len + cut;

    let mut prefix = raw[..cut_at].to_vec();
    set_ip_length(&mut prefix, original.ip_version, cut_at);

    let mut suffix = Vec::with_capacity(raw.len() - cut);
    suffix.extend_from_slice(&raw[..header_len]);
    suffix.extend_from_slice(&raw[cut_at..]);
    set_ip_length(&mut suffix, original.ip_version, raw.len() - cut);

    let seq_off = original.ip_header_len() + 4;
    let seq = u32::from_be_bytes([
        suffix[seq_off],
        suffix[seq_off + 1],
        suffix[seq_off + 2],
        suffix[seq_off + 3],
    ]);
    suffix[seq_off..seq_off + 4].copy_from_slice(&seq.wrapping_add(cut as u32).to_be_bytes());

    (prefix, suffix)
}
