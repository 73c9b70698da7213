//! Protocol-clamping socket factory
//!
//! Some platform TLS stacks ship with TLS 1.1 and TLS 1.2 implemented but
//! disabled on newly created sockets. `ProtocolClampingFactory` wraps such a
//! factory and overwrites the enabled protocols of every TLS socket it
//! produces with [`ALLOWED_TLS_VERSIONS`]. Everything else is forwarded to
//! the delegate unchanged.

use super::factory::{tls_to_io, SecureSocketFactory};
use super::{Socket, ALLOWED_TLS_VERSIONS};
use std::io;
use std::net::{IpAddr, TcpStream};

/// Socket factory forcing [`ALLOWED_TLS_VERSIONS`] onto produced TLS sockets
#[derive(Debug, Clone)]
pub struct ProtocolClampingFactory<F> {
    delegate: F,
}

impl<F: SecureSocketFactory> ProtocolClampingFactory<F> {
    pub fn new(delegate: F) -> Self {
        ProtocolClampingFactory { delegate }
    }

    /// The wrapped factory
    pub fn delegate(&self) -> &F {
        &self.delegate
    }

    fn patch(socket: Socket) -> io::Result<Socket> {
        match socket {
            Socket::Tls(mut tls) => {
                tls.set_enabled_protocols(&ALLOWED_TLS_VERSIONS)
                    .map_err(tls_to_io)?;
                Ok(Socket::Tls(tls))
            }
            plain => Ok(plain),
        }
    }
}

impl<F: SecureSocketFactory> SecureSocketFactory for ProtocolClampingFactory<F> {
    fn default_cipher_suites(&self) -> Vec<String> {
        self.delegate.default_cipher_suites()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        self.delegate.supported_cipher_suites()
    }

    fn create_layered_socket(
        &self,
        socket: TcpStream,
        host: &str,
        port: u16,
        auto_close: bool,
    ) -> io::Result<Socket> {
        Self::patch(self.delegate.create_layered_socket(socket, host, port, auto_close)?)
    }

    fn create_socket(&self, host: &str, port: u16) -> io::Result<Socket> {
        Self::patch(self.delegate.create_socket(host, port)?)
    }

    fn create_bound_socket(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket> {
        Self::patch(self.delegate.create_bound_socket(host, port, local_addr, local_port)?)
    }

    fn create_socket_to(&self, addr: IpAddr, port: u16) -> io::Result<Socket> {
        Self::patch(self.delegate.create_socket_to(addr, port)?)
    }

    fn create_bound_socket_to(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket> {
        Self::patch(self.delegate.create_bound_socket_to(addr, port, local_addr, local_port)?)
    }
}
