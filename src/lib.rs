//! tls-compat - TLS 1.1 / 1.2 enablement for legacy TLS stacks
//!
//! This crate wraps secure-socket factories so that every TLS socket they
//! produce negotiates only TLS 1.1 or TLS 1.2, and installs such a factory
//! into a client builder together with an ordered list of connection specs.

pub mod client;
pub mod tls;
pub mod transport;
