//! Byte transports under a client `Connection`
//!
//! A connection talks to its peer through a [`Transport`]: either the plain
//! TCP stream or a handshaken TLS session. Readiness is checked with
//! `poll(2)` on the socket descriptor before each blocking call.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

/// What a caller waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Readable,
    Writable,
}

/// Bidirectional byte stream owned by a connection
pub trait Transport: Send {
    /// Wait until the transport is ready for `interest`.
    ///
    /// Returns `false` when `timeout` expires first. `None` waits forever.
    fn ready(&self, interest: Interest, timeout: Option<Duration>) -> io::Result<bool>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn flush(&mut self) -> io::Result<()>;

    /// End the session.
    ///
    /// Returns the TCP stream when the transport was created without
    /// ownership of it, `None` once the stream has been shut down.
    fn shutdown(self: Box<Self>) -> io::Result<Option<TcpStream>>;
}

/// Millisecond argument for `poll(2)`, saturating at `c_int::MAX`
pub(crate) fn poll_timeout_ms(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        Some(timeout) => libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX),
        None => -1,
    }
}

/// Block until `fd` is ready for `interest` or `timeout` expires
pub(crate) fn wait_fd(fd: RawFd, interest: Interest, timeout: Option<Duration>) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: match interest {
            Interest::Readable => libc::POLLIN,
            Interest::Writable => libc::POLLOUT,
        },
        revents: 0,
    };

    // SAFETY: one valid pollfd, borrowed for the duration of the call
    let ready = unsafe { libc::poll(&mut pfd, 1, poll_timeout_ms(timeout)) };
    if ready < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(ready > 0)
}

/// Cleartext transport over a TCP stream
#[derive(Debug)]
pub struct PlainTransport {
    stream: TcpStream,
}

impl PlainTransport {
    pub fn new(stream: TcpStream) -> Self {
        PlainTransport { stream }
    }
}

impl Transport for PlainTransport {
    fn ready(&self, interest: Interest, timeout: Option<Duration>) -> io::Result<bool> {
        wait_fd(self.stream.as_raw_fd(), interest, timeout)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }

    fn shutdown(self: Box<Self>) -> io::Result<Option<TcpStream>> {
        self.stream.shutdown(Shutdown::Both)?;
        Ok(None)
    }
}
