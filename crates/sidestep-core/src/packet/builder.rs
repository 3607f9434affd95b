//! Packet builder
//!
//! Constructs complete IPv4/IPv6 UDP and TCP packets with valid lengths and
//! checksums. The forge module uses it to synthesize DNS replies; tests use
//! it to fabricate captured traffic.

use super::checksum;
use super::types::{IpVersion, Protocol, TcpFlags};
use bytes::BytesMut;

/// Builder for constructing raw packets
pub struct PacketBuilder {
    ip_version: IpVersion,
    protocol: Protocol,
    src_ip: [u8; 16],
    dst_ip: [u8; 16],
    src_port: u16,
    dst_port: u16,
    ttl: u8,
    tcp_flags: TcpFlags,
    seq: u32,
    ack: u32,
    mss: Option<u16>,
    payload: Vec<u8>,
}

impl PacketBuilder {
    fn new(ip_version: IpVersion, protocol: Protocol) -> Self {
        Self {
            ip_version,
            protocol,
            src_ip: [0; 16],
            dst_ip: [0; 16],
            src_port: 0,
            dst_port: 0,
            ttl: 64,
            tcp_flags: TcpFlags::default(),
            seq: 0,
            ack: 0,
            mss: None,
            payload: Vec::new(),
        }
    }

    /// New IPv4 TCP packet builder
    pub fn tcp_v4() -> Self {
        Self::new(IpVersion::V4, Protocol::Tcp)
    }

    /// New IPv6 TCP packet builder
    pub fn tcp_v6() -> Self {
        Self::new(IpVersion::V6, Protocol::Tcp)
    }

    /// New IPv4 UDP packet builder
    pub fn udp_v4() -> Self {
        Self::new(IpVersion::V4, Protocol::Udp)
    }

    /// New IPv6 UDP packet builder
    pub fn udp_v6() -> Self {
        Self::new(IpVersion::V6, Protocol::Udp)
    }

    /// Set source IP (IPv4)
    pub fn src_ip_v4(mut self, ip: [u8; 4]) -> Self {
        self.src_ip[..4].copy_from_slice(&ip);
        self
    }

    /// Set destination IP (IPv4)
    pub fn dst_ip_v4(mut self, ip: [u8; 4]) -> Self {
        self.dst_ip[..4].copy_from_slice(&ip);
        self
    }

    /// Set source IP (IPv6)
    pub fn src_ip_v6(mut self, ip: [u8; 16]) -> Self {
        self.src_ip = ip;
        self
    }

    /// Set destination IP (IPv6)
    pub fn dst_ip_v6(mut self, ip: [u8; 16]) -> Self {
        self.dst_ip = ip;
        self
    }

    /// Set source port
    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    /// Set destination port
    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    /// Set TTL / hop limit
    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set TCP flags
    pub fn flags(mut self, flags: TcpFlags) -> Self {
        self.tcp_flags = flags;
        self
    }

    /// Set TCP sequence number
    pub fn seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    /// Set TCP acknowledgment number
    pub fn ack(mut self, ack: u32) -> Self {
        self.ack = ack;
        self
    }

    /// Add an MSS option (kind 2) as the first TCP option
    pub fn mss(mut self, mss: u16) -> Self {
        self.mss = Some(mss);
        self
    }

    /// Set payload
    pub fn payload(mut self, data: &[u8]) -> Self {
        self.payload = data.to_vec();
        self
    }

    /// Build the packet with computed lengths and checksums
    pub fn build(self) -> Vec<u8> {
        let transport = self.build_transport();

        let mut packet = match self.ip_version {
            IpVersion::V4 => self.build_ipv4(&transport),
            IpVersion::V6 => self.build_ipv6(&transport),
        };

        self.finish_checksums(&mut packet, transport.len());
        packet
    }

    fn build_transport(&self) -> Vec<u8> {
        match self.protocol {
            Protocol::Udp => {
                let udp_len = 8 + self.payload.len();
                let mut seg = Vec::with_capacity(udp_len);
                seg.extend_from_slice(&self.src_port.to_be_bytes());
                seg.extend_from_slice(&self.dst_port.to_be_bytes());
                seg.extend_from_slice(&(udp_len as u16).to_be_bytes());
                seg.extend_from_slice(&[0, 0]); // checksum placeholder
                seg.extend_from_slice(&self.payload);
                seg
            }
            _ => {
                // kind 2, length 4, value
                let mss_opt = self.mss.map(|m| {
                    let b = m.to_be_bytes();
                    [2, 4, b[0], b[1]]
                });
                let options: &[u8] = mss_opt.as_ref().map_or(&[], |o| o.as_slice());
                let header_len = 20 + options.len();
                let mut seg = Vec::with_capacity(header_len + self.payload.len());
                seg.extend_from_slice(&self.src_port.to_be_bytes());
                seg.extend_from_slice(&self.dst_port.to_be_bytes());
                seg.extend_from_slice(&self.seq.to_be_bytes());
                seg.extend_from_slice(&self.ack.to_be_bytes());
                seg.push(((header_len / 4) as u8) << 4);
                seg.push(self.tcp_flags.bits());
                seg.extend_from_slice(&[0xFF, 0xFF]); // window
                seg.extend_from_slice(&[0, 0]); // checksum placeholder
                seg.extend_from_slice(&[0, 0]); // urgent pointer
                seg.extend_from_slice(options);
                seg.extend_from_slice(&self.payload);
                seg
            }
        }
    }

    fn build_ipv4(&self, transport: &[u8]) -> Vec<u8> {
        let total_len = 20 + transport.len();
        let mut packet = BytesMut::with_capacity(total_len);

        packet.extend_from_slice(&[0x45, 0x00]);
        packet.extend_from_slice(&(total_len as u16).to_be_bytes());
        packet.extend_from_slice(&[0x00, 0x00, 0x40, 0x00]); // id, DF
        packet.extend_from_slice(&[self.ttl, self.protocol.to_u8(), 0x00, 0x00]);
        packet.extend_from_slice(&self.src_ip[..4]);
        packet.extend_from_slice(&self.dst_ip[..4]);
        packet.extend_from_slice(transport);

        packet.to_vec()
    }

    fn build_ipv6(&self, transport: &[u8]) -> Vec<u8> {
        let mut packet = BytesMut::with_capacity(40 + transport.len());

        packet.extend_from_slice(&[0x60, 0x00, 0x00, 0x00]);
        packet.extend_from_slice(&(transport.len() as u16).to_be_bytes());
        packet.extend_from_slice(&[self.protocol.to_u8(), self.ttl]);
        packet.extend_from_slice(&self.src_ip);
        packet.extend_from_slice(&self.dst_ip);
        packet.extend_from_slice(transport);

        packet.to_vec()
    }

    fn finish_checksums(&self, packet: &mut [u8], transport_len: usize) {
        let ip_header_len = match self.ip_version {
            IpVersion::V4 => 20,
            IpVersion::V6 => 40,
        };
        let csum_offset = match self.protocol {
            Protocol::Udp => 6,
            _ => 16,
        };

        let transport_csum = match self.ip_version {
            IpVersion::V4 => {
                let mut src = [0u8; 4];
                let mut dst = [0u8; 4];
                src.copy_from_slice(&self.src_ip[..4]);
                dst.copy_from_slice(&self.dst_ip[..4]);
                checksum::transport_checksum_v4(
                    &src,
                    &dst,
                    self.protocol.to_u8(),
                    &packet[ip_header_len..ip_header_len + transport_len],
                )
            }
            IpVersion::V6 => checksum::transport_checksum_v6(
                &self.src_ip,
                &self.dst_ip,
                self.protocol.to_u8(),
                &packet[ip_header_len..ip_header_len + transport_len],
            ),
        };
        let base = ip_header_len + csum_offset;
        packet[base..base + 2].copy_from_slice(&transport_csum.to_be_bytes());

        if matches!(self.ip_version, IpVersion::V4) {
            let csum = checksum::ipv4_header_checksum(&packet[..20]);
            packet[10..12].copy_from_slice(&csum.to_be_bytes());
        }
    }
}
