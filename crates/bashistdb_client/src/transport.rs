//! Transports carrying one request and one reply.

use crate::error::{SessionError, SessionResult};
use bashistdb_protocol::{envelope, Message, SharedKey, DEFAULT_PORT};
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::Duration;
use tracing::debug;

/// Carries one request to a server and brings back its reply.
pub trait Transport {
    /// Sends `request` and waits for exactly one reply.
    fn exchange(&self, request: &Message) -> SessionResult<Message>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn exchange(&self, request: &Message) -> SessionResult<Message> {
        (**self).exchange(request)
    }
}

/// Appends the default port to `addr` unless it already names one.
pub fn with_default_port(addr: &str) -> String {
    if addr.parse::<SocketAddr>().is_ok() {
        return addr.to_string();
    }
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_PORT).to_string();
    }
    match addr.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => addr.to_string(),
        _ => format!("{addr}:{DEFAULT_PORT}"),
    }
}

/// Blocking TCP transport: one connection per exchange.
pub struct TcpTransport {
    addr: String,
    key: SharedKey,
    timeout: Option<Duration>,
}

impl TcpTransport {
    /// Creates a transport to `addr`, using the default port if none is
    /// given.
    ///
    /// Reads and writes block until the server answers or closes the
    /// connection. Use [`with_timeout`](Self::with_timeout) to bound them.
    pub fn new(addr: impl AsRef<str>, key: SharedKey) -> Self {
        Self {
            addr: with_default_port(addr.as_ref()),
            key,
            timeout: None,
        }
    }

    /// Sets the read and write timeout. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The read and write timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The server address, with port.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Transport for TcpTransport {
    fn exchange(&self, request: &Message) -> SessionResult<Message> {
        let mut stream =
            TcpStream::connect(&self.addr).map_err(|source| SessionError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        debug!(addr = %self.addr, "connected");

        envelope::write_message(&mut stream, request, &self.key)?;
        let reply = envelope::read_message(&mut stream, &self.key)?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_added() {
        assert_eq!(with_default_port("example.org"), "example.org:35628");
        assert_eq!(with_default_port("example.org:9000"), "example.org:9000");
        assert_eq!(with_default_port("10.0.0.1"), "10.0.0.1:35628");
        assert_eq!(with_default_port("10.0.0.1:1"), "10.0.0.1:1");
        assert_eq!(with_default_port("::1"), "[::1]:35628");
        assert_eq!(with_default_port("[::1]:7"), "[::1]:7");
    }

    #[test]
    fn waits_for_the_reply_by_default() {
        let key = SharedKey::from_passphrase("k").unwrap();
        let transport = TcpTransport::new("example.org", key);
        assert_eq!(transport.timeout(), None);

        let transport = transport.with_timeout(Some(Duration::from_secs(5)));
        assert_eq!(transport.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn connection_refused_is_connect_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let key = SharedKey::from_passphrase("k").unwrap();
        let transport = TcpTransport::new(addr.to_string(), key);
        let err = transport.exchange(&Message::stats("a", "b")).unwrap_err();
        assert!(matches!(err, SessionError::Connect { .. }), "{err}");
    }
}
