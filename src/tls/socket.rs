//! Sockets produced by socket factories
//!
//! A `TlsSocket` is a connected TCP stream paired with an OpenSSL session
//! that has not performed its handshake yet. Until [`TlsSocket::handshake`]
//! is called its enabled protocol versions can still be changed.

use super::session::TlsSession;
use super::version::is_contiguous;
use super::{TlsError, TlsVersion};
use openssl::ssl::Ssl;
use std::io;
use std::net::{SocketAddr, TcpStream};

/// A socket returned by a [`SecureSocketFactory`](super::SecureSocketFactory)
#[derive(Debug)]
pub enum Socket {
    /// Plain TCP socket
    Plain(TcpStream),
    /// TLS socket awaiting its handshake
    Tls(TlsSocket),
}

impl Socket {
    pub fn is_tls(&self) -> bool {
        matches!(self, Socket::Tls(_))
    }

    pub fn as_tls(&self) -> Option<&TlsSocket> {
        match self {
            Socket::Tls(tls) => Some(tls),
            Socket::Plain(_) => None,
        }
    }

    pub fn as_tls_mut(&mut self) -> Option<&mut TlsSocket> {
        match self {
            Socket::Tls(tls) => Some(tls),
            Socket::Plain(_) => None,
        }
    }

    /// Convert into the TLS socket, handing the socket back if it is plain
    pub fn into_tls(self) -> Result<TlsSocket, Socket> {
        match self {
            Socket::Tls(tls) => Ok(tls),
            plain => Err(plain),
        }
    }

    /// Underlying TCP stream
    pub fn tcp_stream(&self) -> &TcpStream {
        match self {
            Socket::Plain(stream) => stream,
            Socket::Tls(tls) => tls.tcp_stream(),
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp_stream().peer_addr()
    }
}

/// TLS client socket before the handshake
pub struct TlsSocket {
    ssl: Ssl,
    stream: TcpStream,
    host: Option<String>,
    auto_close: bool,
    enabled_protocols: Vec<TlsVersion>,
}

impl TlsSocket {
    /// Pair `ssl` with a connected stream, enabling `enabled_protocols`
    pub fn new(
        ssl: Ssl,
        stream: TcpStream,
        enabled_protocols: &[TlsVersion],
    ) -> Result<Self, TlsError> {
        let mut socket = TlsSocket {
            ssl,
            stream,
            host: None,
            auto_close: true,
            enabled_protocols: Vec::new(),
        };
        socket.set_enabled_protocols(enabled_protocols)?;
        Ok(socket)
    }

    /// Record the peer host name
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Whether closing the TLS session also shuts down the TCP stream
    pub fn with_auto_close(mut self, auto_close: bool) -> Self {
        self.auto_close = auto_close;
        self
    }

    /// Protocols the handshake may negotiate
    pub fn enabled_protocols(&self) -> &[TlsVersion] {
        &self.enabled_protocols
    }

    /// Replace the protocols the handshake may negotiate.
    ///
    /// OpenSSL enables a version range, so the list must be non-empty and
    /// contiguous. The list is kept in the order given.
    pub fn set_enabled_protocols(&mut self, protocols: &[TlsVersion]) -> Result<(), TlsError> {
        if !is_contiguous(protocols) {
            return Err(TlsError::InvalidConfig(format!(
                "Enabled protocols must be a non-empty contiguous range: {:?}",
                protocols
            )));
        }

        let min = protocols.iter().min().copied().unwrap_or(TlsVersion::Tls12);
        let max = protocols.iter().max().copied().unwrap_or(TlsVersion::Tls12);
        let previous_min = self.enabled_protocols.iter().min().copied();

        self.ssl.set_min_proto_version(Some(min.to_openssl_version()))?;
        if let Err(e) = self.ssl.set_max_proto_version(Some(max.to_openssl_version())) {
            // Keep the Ssl in step with `enabled_protocols`
            let _ = self
                .ssl
                .set_min_proto_version(previous_min.map(|v| v.to_openssl_version()));
            return Err(e.into());
        }

        self.enabled_protocols = protocols.to_vec();
        Ok(())
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    pub fn tcp_stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Perform the client handshake
    pub fn handshake(self) -> Result<TlsSession, TlsError> {
        let auto_close = self.auto_close;
        let stream = self
            .ssl
            .connect(self.stream)
            .map_err(|e| TlsError::HandshakeFailed(format!("Connection failed: {}", e)))?;

        Ok(TlsSession::new(stream, auto_close))
    }
}

impl std::fmt::Debug for TlsSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsSocket")
            .field("host", &self.host)
            .field("auto_close", &self.auto_close)
            .field("enabled_protocols", &self.enabled_protocols)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::ssl::{SslContext, SslMethod};
    use std::net::TcpListener;

    fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn new_ssl() -> Ssl {
        let ctx = SslContext::builder(SslMethod::tls_client()).unwrap().build();
        Ssl::new(&ctx).unwrap()
    }

    #[test]
    fn test_set_enabled_protocols() {
        let (client, _server) = connected_pair();
        let mut socket = TlsSocket::new(new_ssl(), client, &[TlsVersion::Tls10]).unwrap();
        assert_eq!(socket.enabled_protocols(), &[TlsVersion::Tls10]);

        socket
            .set_enabled_protocols(&[TlsVersion::Tls12, TlsVersion::Tls11])
            .unwrap();
        assert_eq!(
            socket.enabled_protocols(),
            &[TlsVersion::Tls12, TlsVersion::Tls11]
        );
    }

    #[test]
    fn test_rejects_gaps_and_empty_lists() {
        let (client, _server) = connected_pair();
        let mut socket = TlsSocket::new(new_ssl(), client, &[TlsVersion::Tls12]).unwrap();

        assert!(socket.set_enabled_protocols(&[]).is_err());
        assert!(socket
            .set_enabled_protocols(&[TlsVersion::Tls10, TlsVersion::Tls12])
            .is_err());
        assert_eq!(socket.enabled_protocols(), &[TlsVersion::Tls12]);
    }

    #[test]
    fn test_socket_accessors() {
        let (client, _server) = connected_pair();
        let tls = TlsSocket::new(new_ssl(), client, &[TlsVersion::Tls12])
            .unwrap()
            .with_host("localhost")
            .with_auto_close(false);
        assert_eq!(tls.host(), Some("localhost"));
        assert!(!tls.auto_close());

        let mut socket = Socket::Tls(tls);
        assert!(socket.is_tls());
        assert!(socket.as_tls_mut().is_some());
        assert!(socket.peer_addr().is_ok());
        assert!(socket.into_tls().is_ok());

        let (plain, _server) = connected_pair();
        let socket = Socket::Plain(plain);
        assert!(!socket.is_tls());
        assert!(socket.as_tls().is_none());
        assert!(matches!(socket.into_tls(), Err(Socket::Plain(_))));
    }
}
