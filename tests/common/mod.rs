//! Shared fixtures for integration tests
#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{Ssl, SslAcceptor, SslContext, SslMethod, SslVersion};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tls_compat::tls::{SecureSocketFactory, Socket, TlsSocket, TlsVersion};

/// Self-signed certificate for `localhost` / `127.0.0.1`
pub fn self_signed() -> (X509, PKey<Private>) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "localhost").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .ip("127.0.0.1")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (builder.build(), key)
}

/// TLS echo server accepting `connections` connections.
///
/// Each accepted connection reports the negotiated version (or the
/// handshake error) on the returned channel, then echoes 5 bytes.
pub fn spawn_tls_server(
    cert: X509,
    key: PKey<Private>,
    min: SslVersion,
    max: SslVersion,
    connections: usize,
) -> (u16, Receiver<Result<String, String>>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server()).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_min_proto_version(Some(min)).unwrap();
    acceptor.set_max_proto_version(Some(max)).unwrap();
    let acceptor = acceptor.build();

    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        for _ in 0..connections {
            let (stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            match acceptor.accept(stream) {
                Ok(mut tls) => {
                    let _ = tx.send(Ok(tls.ssl().version_str().to_string()));
                    let mut buf = [0u8; 5];
                    if tls.read_exact(&mut buf).is_ok() {
                        let _ = tls.write_all(&buf);
                    }
                    let _ = tls.shutdown();
                }
                Err(e) => {
                    let _ = tx.send(Err(e.to_string()));
                }
            }
        }
    });

    (port, rx, handle)
}

/// Plain TCP listener whose accepted streams are kept open
pub fn spawn_sink() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => held.push(stream),
                Err(_) => break,
            }
        }
    });
    (addr, handle)
}

/// Delegate producing sockets connected to a fixed address, recording every
/// call it receives.
pub struct StubFactory {
    target: SocketAddr,
    secure: bool,
    initial: Vec<TlsVersion>,
    default_ciphers: Vec<String>,
    supported_ciphers: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubFactory {
    pub fn tls(target: SocketAddr, initial: &[TlsVersion]) -> Self {
        StubFactory {
            target,
            secure: true,
            initial: initial.to_vec(),
            default_ciphers: Vec::new(),
            supported_ciphers: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn plain(target: SocketAddr) -> Self {
        StubFactory {
            secure: false,
            ..StubFactory::tls(target, &[TlsVersion::Tls10])
        }
    }

    pub fn with_ciphers(mut self, default: &[&str], supported: &[&str]) -> Self {
        self.default_ciphers = default.iter().map(|s| s.to_string()).collect();
        self.supported_ciphers = supported.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn produce(&self, stream: TcpStream, call: String) -> io::Result<Socket> {
        self.calls.lock().unwrap().push(call);
        if !self.secure {
            return Ok(Socket::Plain(stream));
        }
        let ctx = SslContext::builder(SslMethod::tls_client()).unwrap().build();
        let ssl = Ssl::new(&ctx).unwrap();
        let socket = TlsSocket::new(ssl, stream, &self.initial)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(Socket::Tls(socket))
    }
}

impl SecureSocketFactory for StubFactory {
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
        port: u16,
        auto_close: bool,
    ) -> io::Result<Socket> {
        self.produce(socket, format!("layered {} {} {}", host, port, auto_close))
    }

    fn create_socket(&self, host: &str, port: u16) -> io::Result<Socket> {
        let stream = TcpStream::connect(self.target)?;
        self.produce(stream, format!("host {} {}", host, port))
    }

    fn create_bound_socket(
        &self,
        host: &str,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket> {
        let stream = TcpStream::connect(self.target)?;
        self.produce(
            stream,
            format!("bound host {} {} {} {}", host, port, local_addr, local_port),
        )
    }

    fn create_socket_to(&self, addr: IpAddr, port: u16) -> io::Result<Socket> {
        let stream = TcpStream::connect(self.target)?;
        self.produce(stream, format!("addr {} {}", addr, port))
    }

    fn create_bound_socket_to(
        &self,
        addr: IpAddr,
        port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) -> io::Result<Socket> {
        let stream = TcpStream::connect(self.target)?;
        self.produce(
            stream,
            format!("bound addr {} {} {} {}", addr, port, local_addr, local_port),
        )
    }
}

/// Delegate failing every creation call with the same error
pub struct FailingFactory {
    pub kind: io::ErrorKind,
    pub message: &'static str,
}

impl FailingFactory {
    fn fail(&self) -> io::Result<Socket> {
        Err(io::Error::new(self.kind, self.message))
    }
}

impl SecureSocketFactory for FailingFactory {
    fn default_cipher_suites(&self) -> Vec<String> {
        Vec::new()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        Vec::new()
    }

    fn create_layered_socket(&self, _: TcpStream, _: &str, _: u16, _: bool) -> io::Result<Socket> {
        self.fail()
    }

    fn create_socket(&self, _: &str, _: u16) -> io::Result<Socket> {
        self.fail()
    }

    fn create_bound_socket(&self, _: &str, _: u16, _: IpAddr, _: u16) -> io::Result<Socket> {
        self.fail()
    }

    fn create_socket_to(&self, _: IpAddr, _: u16) -> io::Result<Socket> {
        self.fail()
    }

    fn create_bound_socket_to(&self, _: IpAddr, _: u16, _: IpAddr, _: u16) -> io::Result<Socket> {
        self.fail()
    }
}
