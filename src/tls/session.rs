//! Handshaken TLS sessions

use crate::transport::{wait_fd, Interest, Transport};
use openssl::ssl::SslStream;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// TLS session over a TCP stream, produced by [`TlsSocket::handshake`].
///
/// [`TlsSocket::handshake`]: super::TlsSocket::handshake
pub struct TlsSession {
    stream: SslStream<TcpStream>,
    auto_close: bool,
    // No close_notify is sent after a failed read or write
    failed: bool,
}

impl TlsSession {
    pub(crate) fn new(stream: SslStream<TcpStream>, auto_close: bool) -> Self {
        TlsSession {
            stream,
            auto_close,
            failed: false,
        }
    }

    /// Negotiated protocol version (e.g. "TLSv1.2")
    pub fn version(&self) -> &'static str {
        self.stream.ssl().version_str()
    }

    /// Whether ending the session also shuts down the TCP stream
    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    fn track<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

impl Transport for TlsSession {
    fn ready(&self, interest: Interest, timeout: Option<Duration>) -> io::Result<bool> {
        if interest == Interest::Readable && self.stream.ssl().pending() > 0 {
            return Ok(true);
        }
        wait_fd(self.stream.get_ref().as_raw_fd(), interest, timeout)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.stream.read(buf);
        self.track(result)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.stream.write(buf);
        self.track(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.stream.flush();
        self.track(result)
    }

    fn shutdown(mut self: Box<Self>) -> io::Result<Option<TcpStream>> {
        if !self.failed {
            // close_notify only; the peer's reply is not awaited
            let _ = self.stream.shutdown();
        }

        let tcp = self.stream.get_ref();
        if self.auto_close {
            tcp.shutdown(Shutdown::Both)?;
            Ok(None)
        } else {
            tcp.try_clone().map(Some)
        }
    }
}

impl std::fmt::Debug for TlsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsSession")
            .field("version", &self.version())
            .field("auto_close", &self.auto_close)
            .field("failed", &self.failed)
            .finish()
    }
}
