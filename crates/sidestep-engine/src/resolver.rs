//! Upstream DNS over TCP
//!
//! The only resolver primitive the engine uses: a length-prefixed DNS
//! exchange over a fresh TCP connection per query. No pooling; a query
//! daemon worker makes one call and injects whatever comes back.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

/// Dial, write, and read deadline for one exchange
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Initial receive buffer; grows to the declared response length
const RESPONSE_BUFFER_SIZE: usize = 4096;

/// Errors from an upstream exchange
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Could not reach or talk to the upstream server
    #[error("upstream DNS {server} unreachable: {source}")]
    Unreachable {
        /// Configured server endpoint
        server: String,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// The connection closed before the declared length arrived
    #[error("upstream DNS response truncated: got {got} of {expected} bytes")]
    Truncated {
        /// Bytes received
        got: usize,
        /// Bytes the length prefix promised
        expected: usize,
    },
}

/// Send a DNS query to `server` over TCP and return the response message.
///
/// The query is framed with a 2-byte big-endian length; the returned bytes
/// exclude the response's own length prefix.
pub fn tcp_lookup(query: &[u8], server: &str) -> Result<Vec<u8>, ResolveError> {
    let addr = resolve_endpoint(server)?;
    let mut stream =
        TcpStream::connect_timeout(&addr, UPSTREAM_TIMEOUT).map_err(|source| {
            ResolveError::Unreachable {
                server: server.to_string(),
                source,
            }
        })?;
    let _ = stream.set_read_timeout(Some(UPSTREAM_TIMEOUT));
    let _ = stream.set_write_timeout(Some(UPSTREAM_TIMEOUT));

    let mut framed = Vec::with_capacity(2 + query.len());
    framed.extend_from_slice(&(query.len() as u16).to_be_bytes());
    framed.extend_from_slice(query);
    stream
        .write_all(&framed)
        .map_err(|source| ResolveError::Unreachable {
            server: server.to_string(),
            source,
        })?;

    let mut buf = vec![0u8; RESPONSE_BUFFER_SIZE];
    let mut received = 0;
    let mut expected = None;

    loop {
        let n = stream
            .read(&mut buf[received..])
            .map_err(|source| ResolveError::Unreachable {
                server: server.to_string(),
                source,
            })?;
        if n == 0 {
            return Err(ResolveError::Truncated {
                got: received,
                expected: expected.unwrap_or(2),
            });
        }
        received += n;

        if expected.is_none() && received >= 2 {
            let declared = u16::from_be_bytes([buf[0], buf[1]]) as usize;
            let total = 2 + declared;
            if total > buf.len() {
                buf.resize(total, 0);
            }
            expected = Some(total);
        }

        if let Some(total) = expected {
            if received >= total {
                return Ok(buf[2..total].to_vec());
            }
        }
    }
}

fn resolve_endpoint(server: &str) -> Result<SocketAddr, ResolveError> {
    server
        .to_socket_addrs()
        .map_err(|source| ResolveError::Unreachable {
            server: server.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| ResolveError::Unreachable {
            server: server.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no address"),
        })
}
