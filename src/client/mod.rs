//! Client connection layer
//!
//! `ClientBuilder` collects the socket factory, trust manager and ordered
//! connection specs a client uses. `Client::connect` walks those specs to
//! open a plain or TLS `Connection`.
//!
//! # Examples
//!
//! ```no_run
//! use tls_compat::client::{legacy_client_builder, Scheme};
//!
//! let client = legacy_client_builder().build().unwrap();
//! let mut conn = client.connect(Scheme::Https, "example.com", 443).unwrap();
//! conn.write_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! ```

pub mod legacy;
pub mod spec;

pub use legacy::{configure_legacy_tls, legacy_client_builder, OpenSslPlatform, PlatformTls};
pub use spec::{ConnectionSpec, ConnectionSpecBuilder};

use crate::tls::{
    SecureSocketFactory, TlsContext, TlsError, TlsSession, TlsSocket, TlsVersion, TrustManager,
};
use crate::transport::{Interest, PlainTransport, Transport};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),

    #[error("No connection spec compatible with the socket")]
    NoCompatibleSpec,

    #[error("Cleartext communication not permitted")]
    CleartextNotPermitted,

    #[error("Socket factory returned a plain socket for a TLS connection")]
    NotSecure,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timeout")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,
}

/// Default read/write timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Client configuration builder
pub struct ClientBuilder {
    socket_factory: Option<Arc<dyn SecureSocketFactory>>,
    trust_manager: Option<TrustManager>,
    connection_specs: Vec<ConnectionSpec>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder {
            socket_factory: None,
            trust_manager: None,
            connection_specs: vec![ConnectionSpec::modern_tls(), ConnectionSpec::cleartext()],
            connect_timeout: None,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the factory used for TLS connections and the trust manager
    /// its sockets verify peers with
    pub fn socket_factory<F>(mut self, factory: F, trust_manager: TrustManager) -> Self
    where
        F: SecureSocketFactory + 'static,
    {
        self.socket_factory = Some(Arc::new(factory));
        self.trust_manager = Some(trust_manager);
        self
    }

    /// Ordered connection specs, tried first to last
    pub fn connection_specs(mut self, specs: Vec<ConnectionSpec>) -> Self {
        self.connection_specs = specs;
        self
    }

    /// Timeout for establishing the TCP connection, plain and TLS alike
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Timeout for reads and writes; `None` waits forever
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn has_socket_factory(&self) -> bool {
        self.socket_factory.is_some()
    }

    pub fn trust_manager_ref(&self) -> Option<&TrustManager> {
        self.trust_manager.as_ref()
    }

    pub fn connection_specs_ref(&self) -> &[ConnectionSpec] {
        &self.connection_specs
    }

    /// Build the client.
    ///
    /// Without an installed factory a TLS 1.2 context verifying peers
    /// against the configured (or platform) trust store is used.
    pub fn build(self) -> Result<Client> {
        if self.connection_specs.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one connection spec is required".to_string(),
            ));
        }

        let socket_factory = match self.socket_factory {
            Some(factory) => factory,
            None => {
                let trust = match self.trust_manager {
                    Some(trust) => trust,
                    None => TrustManager::system()?,
                };
                let context = TlsContext::builder(TlsVersion::Tls12)
                    .trust_manager(trust)
                    .build()?;
                Arc::new(context.socket_factory())
            }
        };

        Ok(Client {
            socket_factory,
            connection_specs: self.connection_specs,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
        })
    }
}

/// Connection-opening client
#[derive(Clone)]
pub struct Client {
    socket_factory: Arc<dyn SecureSocketFactory>,
    connection_specs: Vec<ConnectionSpec>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn connection_specs(&self) -> &[ConnectionSpec] {
        &self.connection_specs
    }

    pub fn socket_factory(&self) -> &dyn SecureSocketFactory {
        self.socket_factory.as_ref()
    }

    /// Open a connection to `host:port`
    pub fn connect(&self, scheme: Scheme, host: &str, port: u16) -> Result<Connection> {
        match scheme {
            Scheme::Http => self.connect_plain(host, port),
            Scheme::Https => self.connect_tls(host, port),
        }
    }

    /// Layer TLS over an already connected `stream`, such as a proxy tunnel.
    ///
    /// The socket is created with `auto_close` off, so [`Connection::close`]
    /// hands the stream back. Only the first TLS spec that fits the socket is
    /// tried since the stream cannot be reopened for a fallback.
    pub fn connect_layered(&self, stream: TcpStream, host: &str, port: u16) -> Result<Connection> {
        let supported = self.socket_factory.supported_cipher_suites();
        let mut socket = self
            .socket_factory
            .create_layered_socket(stream, host, port, false)?
            .into_tls()
            .map_err(|_| Error::NotSecure)?;

        let spec = self
            .connection_specs
            .iter()
            .filter(|s| s.is_tls())
            .find(|spec| prepare(spec, &mut socket, &supported))
            .ok_or(Error::NoCompatibleSpec)?;

        let session = socket.handshake()?;
        Ok(Connection::tls(session, spec, self.read_timeout))
    }

    fn open_stream(&self, host: &str, port: u16) -> std::io::Result<TcpStream> {
        match self.connect_timeout {
            Some(timeout) => connect_with_timeout(host, port, timeout),
            None => TcpStream::connect((host, port)),
        }
    }

    fn connect_plain(&self, host: &str, port: u16) -> Result<Connection> {
        let spec = self
            .connection_specs
            .iter()
            .find(|s| !s.is_tls())
            .ok_or(Error::CleartextNotPermitted)?;

        let stream = self.open_stream(host, port)?;
        Ok(Connection {
            transport: Box::new(PlainTransport::new(stream)),
            spec: spec.clone(),
            tls_version: None,
            timeout: self.read_timeout,
        })
    }

    fn connect_tls(&self, host: &str, port: u16) -> Result<Connection> {
        let supported = self.socket_factory.supported_cipher_suites();
        let mut last_err = None;

        // Every attempt gets a fresh TCP connection layered by the factory
        for spec in self.connection_specs.iter().filter(|s| s.is_tls()) {
            let stream = self.open_stream(host, port)?;
            let mut socket = self
                .socket_factory
                .create_layered_socket(stream, host, port, true)?
                .into_tls()
                .map_err(|_| Error::NotSecure)?;

            if !prepare(spec, &mut socket, &supported) {
                continue;
            }

            match socket.handshake() {
                Ok(session) => {
                    return Ok(Connection::tls(session, spec, self.read_timeout));
                }
                Err(e) => {
                    log::debug!(
                        "handshake with {}:{} failed using {:?}, trying next spec: {}",
                        host,
                        port,
                        spec.tls_versions(),
                        e
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.map(Error::Tls).unwrap_or(Error::NoCompatibleSpec))
    }
}

/// Check `spec` against `socket` and apply it; `false` skips it
fn prepare(spec: &ConnectionSpec, socket: &mut TlsSocket, supported: &[String]) -> bool {
    if !spec.is_compatible(socket, supported) {
        log::trace!(
            "skipping connection spec {:?}: no overlap with {:?}",
            spec.tls_versions(),
            socket.enabled_protocols()
        );
        return false;
    }

    match spec.apply(socket) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("skipping connection spec {:?}: {}", spec.tls_versions(), e);
            false
        }
    }
}

fn connect_with_timeout(host: &str, port: u16, timeout: Duration) -> std::io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("could not resolve to any address: {}", host),
        )
    }))
}

/// An open connection
pub struct Connection {
    transport: Box<dyn Transport>,
    spec: ConnectionSpec,
    tls_version: Option<String>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("spec", &self.spec)
            .field("tls_version", &self.tls_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Connection {
    fn tls(session: TlsSession, spec: &ConnectionSpec, timeout: Option<Duration>) -> Self {
        Connection {
            tls_version: Some(session.version().to_string()),
            transport: Box::new(session),
            spec: spec.clone(),
            timeout,
        }
    }

    /// Spec the connection was opened with
    pub fn spec(&self) -> &ConnectionSpec {
        &self.spec
    }

    /// Negotiated TLS version, `None` for cleartext
    pub fn tls_version(&self) -> Option<&str> {
        self.tls_version.as_deref()
    }

    /// Timeout for each read and write; `None` waits forever
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn wait(&self, interest: Interest) -> Result<()> {
        if self.transport.ready(interest, self.timeout)? {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.wait(Interest::Readable)?;
        Ok(self.transport.read(buf)?)
    }

    /// Read until `buf` is full
    pub fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.read(buf)?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            let rest = buf;
            buf = &mut rest[n..];
        }
        Ok(())
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.wait(Interest::Writable)?;
        Ok(self.transport.write(buf)?)
    }

    /// Write the whole buffer and flush it
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf)?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            buf = &buf[n..];
        }
        Ok(self.transport.flush()?)
    }

    /// Close the connection.
    ///
    /// Returns the TCP stream for connections opened with
    /// [`Client::connect_layered`], `None` otherwise.
    pub fn close(self) -> Result<Option<TcpStream>> {
        Ok(self.transport.shutdown()?)
    }
}
