//! TLS socket layer
//!
//! This module wraps OpenSSL client sockets behind a socket-factory
//! abstraction so that the enabled protocol versions of every produced
//! socket can be adjusted before the handshake.
//!
//! # Architecture
//!
//! 1. `TlsContext` holds an OpenSSL context plus the protocol set new
//!    sockets start with
//! 2. `OpenSslSocketFactory` connects TCP streams and wraps them into
//!    not-yet-handshaken `TlsSocket`s
//! 3. `ProtocolClampingFactory` wraps any `SecureSocketFactory` and forces
//!    `ALLOWED_TLS_VERSIONS` onto every `TlsSocket` it hands out
//! 4. `TlsSocket::handshake` turns the socket into a `TlsSession`
//!
//! # Examples
//!
//! ```no_run
//! use tls_compat::tls::{
//!     ProtocolClampingFactory, SecureSocketFactory, TlsContext, TlsVersion,
//!     ALLOWED_TLS_VERSIONS,
//! };
//!
//! let context = TlsContext::builder(TlsVersion::Tls11).build().unwrap();
//! let factory = ProtocolClampingFactory::new(context.socket_factory());
//!
//! let socket = factory.create_socket("example.com", 443).unwrap();
//! let tls = socket.as_tls().unwrap();
//! assert_eq!(tls.enabled_protocols(), &ALLOWED_TLS_VERSIONS[..]);
//! ```

pub mod cipher;
pub mod clamp;
pub mod context;
pub mod factory;
pub mod session;
pub mod socket;
pub mod trust;
pub mod version;

pub use clamp::ProtocolClampingFactory;
pub use context::{TlsContext, TlsContextBuilder};
pub use factory::{OpenSslSocketFactory, SecureSocketFactory};
pub use session::TlsSession;
pub use socket::{Socket, TlsSocket};
pub use trust::TrustManager;
pub use version::{TlsVersion, ALLOWED_TLS_VERSIONS};

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TLS version: {0}")]
    InvalidVersion(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Protocol not available: {0}")]
    ProtocolUnavailable(TlsVersion),

    #[error("Trust store unavailable: {0}")]
    TrustStoreUnavailable(String),
}
