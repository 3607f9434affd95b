//! Packet type definitions

use bitflags::bitflags;

/// IP version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

/// Transport protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// TCP (protocol number 6)
    Tcp,
    /// UDP (protocol number 17)
    Udp,
    /// Anything else
    Other(u8),
}

impl Protocol {
    /// Create from protocol number
    pub fn from_u8(proto: u8) -> Self {
        match proto {
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            other => Protocol::Other(other),
        }
    }

    /// Get protocol number
    pub fn to_u8(self) -> u8 {
        match self {
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
            Protocol::Other(other) => other,
        }
    }
}

bitflags! {
    /// TCP header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TcpFlags: u8 {
        /// FIN flag
        const FIN = 0x01;
        /// SYN flag
        const SYN = 0x02;
        /// RST flag
        const RST = 0x04;
        /// PSH flag
        const PSH = 0x08;
        /// ACK flag
        const ACK = 0x10;
        /// URG flag
        const URG = 0x20;
        /// ECE flag
        const ECE = 0x40;
        /// CWR flag
        const CWR = 0x80;
    }
}

impl TcpFlags {
    /// True for a bare SYN (connection opening, no ACK yet)
    pub fn is_syn_only(self) -> bool {
        self.contains(TcpFlags::SYN) && !self.contains(TcpFlags::ACK)
    }
}

/// Well-known ports the daemons care about
pub mod ports {
    /// DNS
    pub const DNS: u16 = 53;
    /// HTTP
    pub const HTTP: u16 = 80;
    /// HTTPS
    pub const HTTPS: u16 = 443;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_flags_roundtrip() {
        let flags = TcpFlags::SYN | TcpFlags::ACK;
        let parsed = TcpFlags::from_bits_truncate(flags.bits());
        assert_eq!(flags, parsed);
        assert!(!flags.is_syn_only());
        assert!(TcpFlags::SYN.is_syn_only());
    }

    #[test]
    fn test_protocol_from_u8() {
        assert_eq!(Protocol::from_u8(6), Protocol::Tcp);
        assert_eq!(Protocol::from_u8(17), Protocol::Udp);
        assert_eq!(Protocol::from_u8(99), Protocol::Other(99));
        assert_eq!(Protocol::Other(99).to_u8(), 99);
    }
}
