//! Secure socket factories
//!
//! `SecureSocketFactory` is the seam between the client and the TLS
//! implementation. Every creation method returns `std::io::Result` so that
//! connection and name-resolution failures reach the caller untouched.

use super::{Socket, TlsError, TlsSocket, TlsVersion};
use openssl::ssl::{Ssl, SslContext};
use socket2::{Domain, Protocol, SockAddr, Type};
use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// Factory for client sockets
pub trait SecureSocketFactory: Send + Sync {
    /// Cipher suites enabled on new sockets
    fn default_cipher_suites(&self) -> Vec<String>;

    /// Cipher suites that could be enabled
    fn supported_cipher_suites(&self) -> Vec<String>;

    /// Layer TLS over an already connected stream
    fn create_layered_socket(
        &self,
        socket: TcpStream,
        host: &str,
        port: u16,
        auto_close: bool,
    ) -> io::Result<Socket>;

    /// Connect to `host:port`
    fn create_socket(&self, host: &str, port: u16) -> io::Result<Socket>;

    /// Connect to `host:port` from a local address
    fn create_bound_socket(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket>;

    /// Connect to a resolved address
    fn create_socket_to(&self, addr: IpAddr, port: u16) -> io::Result<Socket>;

    /// Connect to a resolved address from a local address
    fn create_bound_socket_to(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket>;
}

macro_rules! forward_factory {
    ($ty:ty) => {
        impl<F: SecureSocketFactory + ?Sized> SecureSocketFactory for $ty {
            fn default_cipher_suites(&self) -> Vec<String> {
                (**self).default_cipher_suites()
            }

            fn supported_cipher_suites(&self) -> Vec<String> {
                (**self).supported_cipher_suites()
            }

            fn create_layered_socket(
                &self,
                socket: TcpStream,
                host: &str,
                port: u16,
                auto_close: bool,
            ) -> io::Result<Socket> {
                (**self).create_layered_socket(socket, host, port, auto_close)
            }

            fn create_socket(&self, host: &str, port: u16) -> io::Result<Socket> {
                (**self).create_socket(host, port)
            }

            fn create_bound_socket(
                &self,
                host: &str,
                port: u16,
                local_addr: IpAddr,
                local_port: u16,
            ) -> io::Result<Socket> {
                (**self).create_bound_socket(host, port, local_addr, local_port)
            }

            fn create_socket_to(&self, addr: IpAddr, port: u16) -> io::Result<Socket> {
                (**self).create_socket_to(addr, port)
            }

            fn create_bound_socket_to(
                &self,
                addr: IpAddr,
                port: u16,
                local_addr: IpAddr,
                local_port: u16,
            ) -> io::Result<Socket> {
                (**self).create_bound_socket_to(addr, port, local_addr, local_port)
            }
        }
    };
}

forward_factory!(Arc<F>);
forward_factory!(Box<F>);
forward_factory!(&F);

pub(crate) fn tls_to_io(err: TlsError) -> io::Error {
    match err {
        TlsError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

/// Socket factory backed by an OpenSSL context
#[derive(Clone)]
pub struct OpenSslSocketFactory {
    ctx: SslContext,
    default_protocols: Vec<TlsVersion>,
    default_ciphers: Vec<String>,
    supported_ciphers: Vec<String>,
    verify_hostname: bool,
    connect_timeout: Option<Duration>,
}

impl OpenSslSocketFactory {
    pub(crate) fn new(
        ctx: SslContext,
        default_protocols: Vec<TlsVersion>,
        default_ciphers: Vec<String>,
        supported_ciphers: Vec<String>,
        verify_hostname: bool,
        connect_timeout: Option<Duration>,
    ) -> Self {
        OpenSslSocketFactory {
            ctx,
            default_protocols,
            default_ciphers,
            supported_ciphers,
            verify_hostname,
            connect_timeout,
        }
    }

    /// Protocols enabled on new sockets
    pub fn default_protocols(&self) -> &[TlsVersion] {
        &self.default_protocols
    }

    fn wrap(&self, stream: TcpStream, host: Option<&str>, auto_close: bool) -> io::Result<Socket> {
        let mut ssl = Ssl::new(&self.ctx).map_err(|e| tls_to_io(e.into()))?;

        if let Some(host) = host {
            // SNI and hostname checks only apply to DNS names
            if host.parse::<IpAddr>().is_err() {
                ssl.set_hostname(host).map_err(|e| tls_to_io(e.into()))?;
            }
            if self.verify_hostname {
                let param = ssl.param_mut();
                let armed = match host.parse::<IpAddr>() {
                    Ok(ip) => param.set_ip(ip),
                    Err(_) => param.set_host(host),
                };
                armed.map_err(|e| tls_to_io(e.into()))?;
            }
        }

        let mut socket = TlsSocket::new(ssl, stream, &self.default_protocols)
            .map_err(tls_to_io)?
            .with_auto_close(auto_close);
        if let Some(host) = host {
            socket = socket.with_host(host);
        }

        Ok(Socket::Tls(socket))
    }

    fn connect(&self, addr: SocketAddr, local: Option<SocketAddr>) -> io::Result<TcpStream> {
        let socket = socket2::Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        if let Some(local) = local {
            socket.bind(&SockAddr::from(local))?;
        }

        let target = SockAddr::from(addr);
        match self.connect_timeout {
            Some(timeout) => socket.connect_timeout(&target, timeout)?,
            None => socket.connect(&target)?,
        }

        Ok(socket.into())
    }

    fn connect_host(&self, host: &str, port: u16, local: Option<IpAddr>, local_port: u16) -> io::Result<TcpStream> {
        let mut last_err = None;

        for addr in (host, port).to_socket_addrs()? {
            let local = local.map(|ip| SocketAddr::new(ip, local_port));
            match self.connect(addr, local) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("could not resolve to any address: {}", host),
            )
        }))
    }
}

impl SecureSocketFactory for OpenSslSocketFactory {
    fn default_cipher_suites(&self) -> Vec<String> {
        self.default_ciphers.clone()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        self.supported_ciphers.clone()
    }

    fn create_layered_socket(
        &self,
        socket: TcpStream,
        host: &str,
        _port: u16,
        auto_close: bool,
    ) -> io::Result<Socket> {
        self.wrap(socket, Some(host), auto_close)
    }

    fn create_socket(&self, host: &str, port: u16) -> io::Result<Socket> {
        let stream = self.connect_host(host, port, None, 0)?;
        self.wrap(stream, Some(host), true)
    }

    fn create_bound_socket(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket> {
        let stream = self.connect_host(host, port, Some(local_addr), local_port)?;
        self.wrap(stream, Some(host), true)
    }

    fn create_socket_to(&self, addr: IpAddr, port: u16) -> io::Result<Socket> {
        let stream = self.connect(SocketAddr::new(addr, port), None)?;
        self.wrap(stream, None, true)
    }

    fn create_bound_socket_to(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket> {
        let stream = self.connect(
            SocketAddr::new(addr, port),
            Some(SocketAddr::new(local_addr, local_port)),
        )?;
        self.wrap(stream, None, true)
    }
}

impl std::fmt::Debug for OpenSslSocketFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSslSocketFactory")
            .field("default_protocols", &self.default_protocols)
            .field("verify_hostname", &self.verify_hostname)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
