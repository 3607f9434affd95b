//! Daemon tests over an in-memory capture layer
//!
//! Every daemon is generic over the capture traits, so these tests feed
//! fabricated packets through a mock network and assert on exactly what
//! gets injected, in what order.

use parking_lot::Mutex;
use sidestep_core::packet::{PacketBuilder, TcpFlags};
use sidestep_core::{config, dns, Packet};
use sidestep_engine::dns_query::DnsQueryDaemon;
use sidestep_engine::dns_response::DnsResponseDaemon;
use sidestep_engine::dot::{DotDaemon, DOT_CUT_OFFSET};
use sidestep_engine::http::HttpDaemon;
use sidestep_engine::tls::TlsInterceptor;
use sidestep_engine::Shared;
use sidestep_platform::{
    filters, CaptureOpen, CapturedPacket, PacketAddress, PacketCapture, PlatformError,
};
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

// ---- mock capture layer ----

type SendLog = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

struct MockCapture {
    filter: String,
    queue: Mutex<VecDeque<CapturedPacket>>,
    sent: SendLog,
}

impl MockCapture {
    fn new(filter: &str, packets: Vec<Vec<u8>>, sent: SendLog) -> Self {
        let queue = packets
            .into_iter()
            .map(|data| CapturedPacket {
                data,
                address: PacketAddress::outbound(),
            })
            .collect();
        Self {
            filter: filter.to_string(),
            queue: Mutex::new(queue),
            sent,
        }
    }
}

impl PacketCapture for MockCapture {
    fn recv(&self) -> sidestep_platform::Result<CapturedPacket> {
        self.queue
            .lock()
            .pop_front()
            .ok_or_else(|| PlatformError::CaptureFailed("queue drained".into()))
    }

    fn recv_timeout(
        &self,
        _timeout: Duration,
    ) -> sidestep_platform::Result<Option<CapturedPacket>> {
        Ok(self.queue.lock().pop_front())
    }

    fn send(&self, data: &[u8], _addr: &PacketAddress) -> sidestep_platform::Result<()> {
        self.sent.lock().push((self.filter.clone(), data.to_vec()));
        Ok(())
    }

    fn close(&self) -> sidestep_platform::Result<()> {
        Ok(())
    }

    fn filter(&self) -> &str {
        &self.filter
    }
}

/// A scriptable network: handles opened by filter pop their prepared traffic
#[derive(Default)]
struct MockNet {
    scripts: Mutex<HashMap<String, Vec<Vec<u8>>>>,
    sent: SendLog,
}

impl MockNet {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script(&self, filter: &str, packets: Vec<Vec<u8>>) {
        self.scripts.lock().insert(filter.to_string(), packets);
    }

    fn sent_on(&self, filter: &str) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .iter()
            .filter(|(f, _)| f == filter)
            .map(|(_, data)| data.clone())
            .collect()
    }
}

impl CaptureOpen for MockNet {
    type Handle = MockCapture;

    fn open(&self, filter: &str) -> sidestep_platform::Result<MockCapture> {
        let packets = self.scripts.lock().remove(filter).unwrap_or_default();
        Ok(MockCapture::new(filter, packets, Arc::clone(&self.sent)))
    }
}

// ---- fixtures ----

const CLIENT_IP: [u8; 4] = [192, 168, 1, 10];
const RESOLVER_IP: [u8; 4] = [8, 8, 8, 8];
const CLIENT_PORT: u16 = 54321;

fn dns_message(name: &str, qtype: u16) -> Vec<u8> {
    let mut msg = vec![0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    for label in name.split('.') {
        msg.push(label.len() as u8);
        msg.extend_from_slice(label.as_bytes());
    }
    msg.push(0);
    msg.extend_from_slice(&qtype.to_be_bytes());
    msg.extend_from_slice(&[0x00, 0x01]);
    msg
}

fn dns_query_packet(name: &str, qtype: u16) -> Vec<u8> {
    PacketBuilder::udp_v4()
        .src_ip_v4(CLIENT_IP)
        .dst_ip_v4(RESOLVER_IP)
        .src_port(CLIENT_PORT)
        .dst_port(53)
        .payload(&dns_message(name, qtype))
        .build()
}

/// A response message echoing the query's question plus A records
fn dns_response_message(name: &str, addrs: &[[u8; 4]]) -> Vec<u8> {
    let mut msg = dns_message(name, dns::QTYPE_A);
    msg[2..4].copy_from_slice(&[0x81, 0x80]);
    msg[6..8].copy_from_slice(&(addrs.len() as u16).to_be_bytes());
    for addr in addrs {
        msg.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10, 0x00, 0x04]);
        msg.extend_from_slice(addr);
    }
    msg
}

fn captured(data: Vec<u8>) -> CapturedPacket {
    CapturedPacket {
        data,
        address: PacketAddress::outbound(),
    }
}

/// A minimal ClientHello record with an SNI for `name`
fn client_hello_record(name: &str) -> Vec<u8> {
    let sni_len = name.len();
    let ext_len = sni_len + 5;
    let mut hello = Vec::new();

    hello.extend_from_slice(&[0x16, 0x03, 0x01]);
    let record_len_at = hello.len();
    hello.extend_from_slice(&[0x00, 0x00]);
    hello.push(0x01);
    hello.extend_from_slice(&[0x00, 0x00, 0x00]);
    hello.extend_from_slice(&[0x03, 0x03]);
    hello.extend_from_slice(&[0u8; 32]);
    hello.push(0x00);
    hello.extend_from_slice(&[0x00, 0x02, 0x13, 0x01]);
    hello.extend_from_slice(&[0x01, 0x00]);
    hello.extend_from_slice(&((ext_len + 4) as u16).to_be_bytes());
    hello.extend_from_slice(&[0x00, 0x00]);
    hello.extend_from_slice(&(ext_len as u16).to_be_bytes());
    hello.extend_from_slice(&((sni_len + 3) as u16).to_be_bytes());
    hello.push(0x00);
    hello.extend_from_slice(&(sni_len as u16).to_be_bytes());
    hello.extend_from_slice(name.as_bytes());

    let record_len = (hello.len() - 5) as u16;
    hello[record_len_at..record_len_at + 2].copy_from_slice(&record_len.to_be_bytes());
    hello
}

fn shared_from(rules_text: &str) -> Arc<Shared> {
    Arc::new(Shared::from_rules(config::parse(rules_text).unwrap()))
}

// ---- DNS query daemon ----

#[test]
fn query_for_configured_domain_is_answered_locally() {
    let shared = shared_from("#LEVEL1\nexample.com=1.2.3.4\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_QUERY, vec![], Arc::clone(&sent)));
    let daemon = DnsQueryDaemon::new(shared, handle);

    daemon.process(captured(dns_query_packet("example.com", dns::QTYPE_A)));

    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    let reply = Packet::from_bytes(&sent[0].1).unwrap();
    assert_eq!(reply.src_addr.to_string(), "8.8.8.8");
    assert_eq!(reply.dst_port, CLIENT_PORT);

    let msg = reply.payload();
    assert_eq!(&msg[2..4], &[0x81, 0x80]);
    assert_eq!(dns::answer_count(msg), 1);
    let question = dns::parse_question(msg).unwrap();
    let ips = dns::parse_answers(&msg[question.answers_offset..], 1).unwrap();
    assert_eq!(ips, vec!["1.2.3.4".parse::<std::net::IpAddr>().unwrap()]);
}

#[test]
fn aaaa_query_for_v4_only_domain_is_suppressed() {
    let shared = shared_from("ipv6\n#LEVEL1\nexample.com=1.2.3.4\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_QUERY, vec![], Arc::clone(&sent)));
    let daemon = DnsQueryDaemon::new(shared, handle);

    daemon.process(captured(dns_query_packet("example.com", dns::QTYPE_AAAA)));

    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    let reply = Packet::from_bytes(&sent[0].1).unwrap();
    let msg = reply.payload();
    assert_eq!(&msg[2..4], &[0x81, 0x80]);
    assert_eq!(dns::answer_count(msg), 0);
}

#[test]
fn aaaa_query_is_suppressed_when_ipv6_disabled() {
    // The domain has a AAAA answer configured, but ipv6 is off
    let shared = shared_from("#LEVEL1\nsix.test=2001:db8::1\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_QUERY, vec![], Arc::clone(&sent)));
    let daemon = DnsQueryDaemon::new(shared, handle);

    daemon.process(captured(dns_query_packet("six.test", dns::QTYPE_AAAA)));

    let sent = sent.lock();
    let reply = Packet::from_bytes(&sent[0].1).unwrap();
    assert_eq!(dns::answer_count(reply.payload()), 0);
}

#[test]
fn unconfigured_domain_passes_byte_for_byte() {
    let shared = shared_from("#LEVEL1\nexample.com=1.2.3.4\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_QUERY, vec![], Arc::clone(&sent)));
    let daemon = DnsQueryDaemon::new(shared, handle);

    let query = dns_query_packet("unrelated.org", dns::QTYPE_A);
    daemon.process(captured(query.clone()));

    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, query);
}

#[test]
fn subdomain_query_matches_parent_entry() {
    let shared = shared_from("#LEVEL1\nexample.com=1.2.3.4\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_QUERY, vec![], Arc::clone(&sent)));
    let daemon = DnsQueryDaemon::new(shared, handle);

    daemon.process(captured(dns_query_packet("www.example.com", dns::QTYPE_A)));

    let sent = sent.lock();
    let reply = Packet::from_bytes(&sent[0].1).unwrap();
    assert_eq!(dns::answer_count(reply.payload()), 1);
}

#[test]
fn malformed_query_is_dropped() {
    let shared = shared_from("#LEVEL1\nexample.com=1.2.3.4\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_QUERY, vec![], Arc::clone(&sent)));
    let daemon = DnsQueryDaemon::new(shared, handle);

    // UDP packet whose payload is nowhere near a DNS message
    let junk = PacketBuilder::udp_v4()
        .src_ip_v4(CLIENT_IP)
        .dst_ip_v4(RESOLVER_IP)
        .src_port(CLIENT_PORT)
        .dst_port(53)
        .payload(&[0xFF; 6])
        .build();
    daemon.process(captured(junk));

    assert!(sent.lock().is_empty());
}

#[test]
fn query_without_local_answers_is_tunneled_upstream() {
    // One-shot upstream echoing the question with a single A record
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut len = [0u8; 2];
        conn.read_exact(&mut len).unwrap();
        let mut query = vec![0u8; u16::from_be_bytes(len) as usize];
        conn.read_exact(&mut query).unwrap();

        let mut response = query;
        response[2..4].copy_from_slice(&[0x81, 0x80]);
        response[6..8].copy_from_slice(&[0x00, 0x01]);
        response.extend_from_slice(&[
            0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x0E, 0x10, 0x00, 0x04, 9, 9, 9, 9,
        ]);

        let mut framed = Vec::new();
        framed.extend_from_slice(&(response.len() as u16).to_be_bytes());
        framed.extend_from_slice(&response);
        conn.write_all(&framed).unwrap();
    });

    let shared = shared_from(&format!("server={addr}\n#LEVEL2\nremote.test\n"));
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_QUERY, vec![], Arc::clone(&sent)));
    let daemon = DnsQueryDaemon::new(Arc::clone(&shared), handle);

    let worker = daemon
        .process(captured(dns_query_packet("remote.test", dns::QTYPE_A)))
        .expect("tunnel worker");
    worker.join().unwrap();

    // The resolved address lands in the IP table at the domain's level
    assert_eq!(shared.ips.level_of(&"9.9.9.9".parse().unwrap()), Some(2));

    // The injected reply wraps the full upstream response
    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    let reply = Packet::from_bytes(&sent[0].1).unwrap();
    assert_eq!(reply.dst_port, CLIENT_PORT);
    assert_eq!(dns::answer_count(reply.payload()), 1);
}

// ---- DNS response daemon ----

#[test]
fn harvests_addresses_for_high_level_domains() {
    let shared = shared_from("local-dns\n#LEVEL2\nblocked.test\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_RESPONSE, vec![], Arc::clone(&sent)));
    let daemon = DnsResponseDaemon::new(Arc::clone(&shared), handle);

    let response = PacketBuilder::udp_v4()
        .src_ip_v4([127, 0, 0, 1])
        .dst_ip_v4(CLIENT_IP)
        .src_port(53)
        .dst_port(CLIENT_PORT)
        .payload(&dns_response_message("blocked.test", &[[93, 184, 216, 34]]))
        .build();
    daemon.process(captured(response.clone()));

    assert_eq!(
        shared.ips.level_of(&"93.184.216.34".parse().unwrap()),
        Some(2)
    );
    // Always re-injected unchanged
    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, response);
}

#[test]
fn level_one_responses_are_not_harvested() {
    let shared = shared_from("local-dns\n#LEVEL1\nlow.test\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DNS_RESPONSE, vec![], Arc::clone(&sent)));
    let daemon = DnsResponseDaemon::new(Arc::clone(&shared), handle);

    let response = PacketBuilder::udp_v4()
        .src_ip_v4([127, 0, 0, 1])
        .dst_ip_v4(CLIENT_IP)
        .src_port(53)
        .dst_port(CLIENT_PORT)
        .payload(&dns_response_message("low.test", &[[10, 1, 1, 1]]))
        .build();
    daemon.process(captured(response));

    assert_eq!(shared.ips.level_of(&"10.1.1.1".parse().unwrap()), None);
    assert_eq!(sent.lock().len(), 1);
}

// ---- DoT daemon ----

#[test]
fn dot_segment_is_replaced_by_ordered_burst() {
    let shared = shared_from("server=8.8.8.8:53\nttl=4\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DOT_PUSH, vec![], Arc::clone(&sent)));
    let daemon = DotDaemon::new(shared, handle);

    let payload: Vec<u8> = (0..60).collect();
    let segment = PacketBuilder::tcp_v4()
        .src_ip_v4(CLIENT_IP)
        .dst_ip_v4([1, 1, 1, 1])
        .src_port(50000)
        .dst_port(53)
        .seq(7000)
        .flags(TcpFlags::PSH | TcpFlags::ACK)
        .payload(&payload)
        .build();
    assert!(daemon.process(captured(segment)));

    let sent = sent.lock();
    assert_eq!(sent.len(), 4);
    let (decoy1, prefix, decoy2, suffix) = (&sent[0].1, &sent[1].1, &sent[2].1, &sent[3].1);

    assert_eq!(decoy1, decoy2);
    assert_eq!(decoy1[8], 4); // forged TTL

    let prefix = Packet::from_bytes(prefix).unwrap();
    let suffix = Packet::from_bytes(suffix).unwrap();
    assert_eq!(prefix.payload(), &payload[..DOT_CUT_OFFSET]);
    assert_eq!(suffix.payload(), &payload[DOT_CUT_OFFSET..]);
    assert_eq!(suffix.tcp_seq(), Some(7000 + DOT_CUT_OFFSET as u32));
}

#[test]
fn short_dot_segment_passes_unchanged() {
    let shared = shared_from("server=8.8.8.8:53\n");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::DOT_PUSH, vec![], Arc::clone(&sent)));
    let daemon = DotDaemon::new(shared, handle);

    let segment = PacketBuilder::tcp_v4()
        .dst_port(53)
        .flags(TcpFlags::PSH | TcpFlags::ACK)
        .payload(&[1, 2, 3])
        .build();
    assert!(daemon.process(captured(segment.clone())));

    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, segment);
}

// ---- HTTP daemon ----

#[test]
fn http_request_to_flagged_destination_gets_decoys() {
    let shared = shared_from("");
    shared.ips.record("93.184.216.34".parse().unwrap(), 2);
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::HTTP_PUSH, vec![], Arc::clone(&sent)));
    let daemon = HttpDaemon::new(shared, handle);

    let request = PacketBuilder::tcp_v4()
        .src_ip_v4(CLIENT_IP)
        .dst_ip_v4([93, 184, 216, 34])
        .src_port(50001)
        .dst_port(80)
        .flags(TcpFlags::PSH | TcpFlags::ACK)
        .payload(b"GET / HTTP/1.1\r\nHost: blocked.test\r\n\r\n")
        .build();
    daemon.process(captured(request.clone()));

    let sent = sent.lock();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].1, sent[1].1); // two identical decoys
    assert_eq!(sent[2].1, request); // then the real request
    // ttl=0 selects the malformed decoy: claimed 40-byte TCP header
    assert_eq!(sent[0].1[20 + 12] >> 4, 10);
}

#[test]
fn http_request_to_unflagged_destination_passes() {
    let shared = shared_from("");
    let sent: SendLog = Default::default();
    let handle = Arc::new(MockCapture::new(filters::HTTP_PUSH, vec![], Arc::clone(&sent)));
    let daemon = HttpDaemon::new(shared, handle);

    let request = PacketBuilder::tcp_v4()
        .dst_ip_v4([203, 0, 113, 7])
        .dst_port(80)
        .flags(TcpFlags::PSH | TcpFlags::ACK)
        .payload(b"GET / HTTP/1.1\r\n\r\n")
        .build();
    daemon.process(captured(request.clone()));

    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, request);
}

// ---- TLS orchestrator + ClientHello worker ----

fn syn_packet(dst: [u8; 4], src_port: u16, mss: u16) -> Vec<u8> {
    PacketBuilder::tcp_v4()
        .src_ip_v4(CLIENT_IP)
        .dst_ip_v4(dst)
        .src_port(src_port)
        .dst_port(443)
        .seq(100)
        .flags(TcpFlags::SYN)
        .mss(mss)
        .build()
}

fn hello_packet(dst: [u8; 4], src_port: u16, name: &str) -> Vec<u8> {
    PacketBuilder::tcp_v4()
        .src_ip_v4(CLIENT_IP)
        .dst_ip_v4(dst)
        .src_port(src_port)
        .dst_port(443)
        .seq(101)
        .flags(TcpFlags::PSH | TcpFlags::ACK)
        .payload(&client_hello_record(name))
        .build()
}

#[test]
fn level_two_syn_keeps_mss_and_fragments_inside_sni() {
    let dst = [93, 184, 216, 34];
    let src_port = 49152;
    let shared = shared_from("#LEVEL2\nblocked.test\n");
    shared.ips.record("93.184.216.34".parse().unwrap(), 2);

    let net = MockNet::new();
    net.script(
        &filters::client_hello(src_port),
        vec![hello_packet(dst, src_port, "blocked.test")],
    );

    let orchestrator = TlsInterceptor::new(shared, Arc::clone(&net));
    let syn_handle = Arc::new(net.open(filters::TLS_SYN).unwrap());
    let worker = orchestrator
        .process(&syn_handle, captured(syn_packet(dst, src_port, 1460)))
        .expect("hello worker");
    worker.join().unwrap();

    // The SYN went out with its MSS untouched (level 2 is below the override)
    let syns = net.sent_on(filters::TLS_SYN);
    assert_eq!(syns.len(), 1);
    assert_eq!(Packet::from_bytes(&syns[0]).unwrap().mss_option(), Some(1460));

    // Four packets replaced the ClientHello: decoy, prefix, decoy, suffix
    let burst = net.sent_on(&filters::client_hello(src_port));
    assert_eq!(burst.len(), 4);
    assert_eq!(burst[0], burst[2]);

    let original = client_hello_record("blocked.test");
    let prefix = Packet::from_bytes(&burst[1]).unwrap();
    let suffix = Packet::from_bytes(&burst[3]).unwrap();

    // The two real halves reassemble the ClientHello exactly
    let mut reassembled = prefix.payload().to_vec();
    reassembled.extend_from_slice(suffix.payload());
    assert_eq!(reassembled, original);

    // The cut falls strictly inside the SNI host name
    let (sni_off, sni_len) = sidestep_core::tls::locate_sni(&original).unwrap();
    let cut = prefix.payload_len();
    assert!(cut > sni_off && cut < sni_off + sni_len);

    // The suffix continues the stream where the prefix left off
    assert_eq!(suffix.tcp_seq(), Some(101 + cut as u32));
}

#[test]
fn level_three_syn_gets_mss_rewritten() {
    let dst = [5, 6, 7, 8];
    let src_port = 49200;
    let shared = shared_from("#LEVEL3\nblocked.test=5.6.7.8\n");

    let net = MockNet::new();
    // No ClientHello scripted: the worker times out against the empty queue

    let orchestrator = TlsInterceptor::new(shared, Arc::clone(&net));
    let syn_handle = Arc::new(net.open(filters::TLS_SYN).unwrap());
    let worker = orchestrator
        .process(&syn_handle, captured(syn_packet(dst, src_port, 1460)))
        .expect("hello worker");
    worker.join().unwrap();

    let syns = net.sent_on(filters::TLS_SYN);
    assert_eq!(syns.len(), 1);
    // Default forged MSS
    assert_eq!(Packet::from_bytes(&syns[0]).unwrap().mss_option(), Some(1024));
}

#[test]
fn unlisted_destination_syn_passes_untouched() {
    let src_port = 49300;
    let shared = shared_from("#LEVEL2\nblocked.test\n");

    let net = MockNet::new();
    let orchestrator = TlsInterceptor::new(shared, Arc::clone(&net));
    let syn_handle = Arc::new(net.open(filters::TLS_SYN).unwrap());

    let syn = syn_packet([203, 0, 113, 9], src_port, 1460);
    let worker = orchestrator.process(&syn_handle, captured(syn.clone()));
    assert!(worker.is_none());

    let syns = net.sent_on(filters::TLS_SYN);
    assert_eq!(syns, vec![syn]);
}

#[test]
fn hello_without_sni_is_reinjected_unchanged() {
    let dst = [93, 184, 216, 34];
    let src_port = 49400;
    let shared = shared_from("#LEVEL2\nblocked.test\n");
    shared.ips.record("93.184.216.34".parse().unwrap(), 2);

    let net = MockNet::new();
    let plain = PacketBuilder::tcp_v4()
        .src_ip_v4(CLIENT_IP)
        .dst_ip_v4(dst)
        .src_port(src_port)
        .dst_port(443)
        .flags(TcpFlags::PSH | TcpFlags::ACK)
        .payload(&[0u8; 64])
        .build();
    net.script(&filters::client_hello(src_port), vec![plain.clone()]);

    let orchestrator = TlsInterceptor::new(shared, Arc::clone(&net));
    let syn_handle = Arc::new(net.open(filters::TLS_SYN).unwrap());
    let worker = orchestrator
        .process(&syn_handle, captured(syn_packet(dst, src_port, 1460)))
        .expect("hello worker");
    worker.join().unwrap();

    let sent = net.sent_on(&filters::client_hello(src_port));
    assert_eq!(sent, vec![plain]);
}
