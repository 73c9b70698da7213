//! TLS contexts
//!
//! A `TlsContext` is created for a named protocol version. Sockets produced
//! from it start with every version from TLS 1.0 up to that protocol
//! enabled, the way legacy platform runtimes configure their defaults.

use super::cipher::{self, APPROVED_CIPHER_SUITES, LEGACY_CIPHER_SUITES};
use super::factory::OpenSslSocketFactory;
use super::{TlsError, TlsVersion, TrustManager};
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode};
use std::time::Duration;

/// TLS client context (immutable after building)
#[derive(Clone)]
pub struct TlsContext {
    pub(crate) ctx: SslContext,
    protocol: TlsVersion,
    default_protocols: Vec<TlsVersion>,
    cipher_suites: Vec<String>,
    verify_peer: bool,
    connect_timeout: Option<Duration>,
}

impl TlsContext {
    /// Create a context builder for the given protocol version
    pub fn builder(protocol: TlsVersion) -> TlsContextBuilder {
        TlsContextBuilder::new(protocol)
    }

    /// Protocol the context was requested for
    pub fn protocol(&self) -> TlsVersion {
        self.protocol
    }

    /// Protocols enabled on sockets created from this context
    pub fn default_protocols(&self) -> &[TlsVersion] {
        &self.default_protocols
    }

    /// Cipher suites enabled on sockets created from this context
    pub fn cipher_suites(&self) -> &[String] {
        &self.cipher_suites
    }

    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }

    /// Socket factory producing sockets configured by this context
    pub fn socket_factory(&self) -> OpenSslSocketFactory {
        let mut supported = self.cipher_suites.clone();
        for suite in LEGACY_CIPHER_SUITES {
            if !supported.iter().any(|s| s == suite) {
                supported.push(suite.to_string());
            }
        }

        OpenSslSocketFactory::new(
            self.ctx.clone(),
            self.default_protocols.clone(),
            self.cipher_suites.clone(),
            supported,
            self.verify_peer,
            self.connect_timeout,
        )
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("protocol", &self.protocol)
            .field("default_protocols", &self.default_protocols)
            .field("verify_peer", &self.verify_peer)
            .finish()
    }
}

/// Context builder
pub struct TlsContextBuilder {
    protocol: TlsVersion,
    trust_manager: Option<TrustManager>,
    verify_peer: bool,
    cipher_suites: Vec<String>,
    connect_timeout: Option<Duration>,
}

impl TlsContextBuilder {
    fn new(protocol: TlsVersion) -> Self {
        TlsContextBuilder {
            protocol,
            trust_manager: None,
            verify_peer: true,
            cipher_suites: APPROVED_CIPHER_SUITES.iter().map(|s| s.to_string()).collect(),
            connect_timeout: None,
        }
    }

    /// Trust anchors for peer verification (default: platform store)
    pub fn trust_manager(mut self, trust_manager: TrustManager) -> Self {
        self.trust_manager = Some(trust_manager);
        self
    }

    /// Enable/disable peer certificate verification
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    /// Replace the enabled cipher suites
    pub fn cipher_suites(mut self, suites: &[&str]) -> Self {
        self.cipher_suites = suites.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Timeout applied when sockets connect
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the context
    pub fn build(self) -> Result<TlsContext, TlsError> {
        if self.protocol < TlsVersion::Tls10 {
            return Err(TlsError::ProtocolUnavailable(self.protocol));
        }
        if self.cipher_suites.is_empty() {
            return Err(TlsError::InvalidConfig(
                "At least one cipher suite is required".to_string(),
            ));
        }

        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_client())?;

        let (tls13, tls12) = cipher::split_suites(&self.cipher_suites);
        if !tls12.is_empty() {
            ctx_builder.set_cipher_list(&tls12)?;
        }
        if !tls13.is_empty() {
            ctx_builder.set_ciphersuites(&tls13)?;
        }

        if self.verify_peer {
            ctx_builder.set_verify(SslVerifyMode::PEER);
            match &self.trust_manager {
                Some(trust) => trust.apply(&mut ctx_builder)?,
                None => ctx_builder.set_default_verify_paths()?,
            }
        } else {
            ctx_builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(TlsContext {
            ctx: ctx_builder.build(),
            protocol: self.protocol,
            default_protocols: self.protocol.enabled_by_default(),
            cipher_suites: self.cipher_suites,
            verify_peer: self.verify_peer,
            connect_timeout: self.connect_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::SecureSocketFactory;

    #[test]
    fn test_legacy_context_defaults() {
        let context = TlsContext::builder(TlsVersion::Tls11).build().unwrap();

        assert_eq!(context.protocol(), TlsVersion::Tls11);
        assert_eq!(
            context.default_protocols(),
            &[TlsVersion::Tls10, TlsVersion::Tls11]
        );
        assert!(context.verify_peer());
        assert_eq!(context.cipher_suites().len(), APPROVED_CIPHER_SUITES.len());
    }

    #[test]
    fn test_ssl3_is_unavailable() {
        let result = TlsContext::builder(TlsVersion::Ssl3).build();
        assert!(matches!(
            result,
            Err(TlsError::ProtocolUnavailable(TlsVersion::Ssl3))
        ));
    }

    #[test]
    fn test_empty_cipher_suites() {
        let result = TlsContext::builder(TlsVersion::Tls12).cipher_suites(&[]).build();
        assert!(matches!(result, Err(TlsError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_cipher_suite() {
        let result = TlsContext::builder(TlsVersion::Tls12)
            .cipher_suites(&["NOT-A-CIPHER"])
            .build();
        assert!(matches!(result, Err(TlsError::OpenSsl(_))));
    }

    #[test]
    fn test_factory_cipher_suites() {
        let context = TlsContext::builder(TlsVersion::Tls12)
            .cipher_suites(&["AES128-SHA", "ECDHE-ECDSA-AES128-SHA"])
            .verify_peer(false)
            .build()
            .unwrap();
        let factory = context.socket_factory();

        assert_eq!(
            factory.default_cipher_suites(),
            vec!["AES128-SHA".to_string(), "ECDHE-ECDSA-AES128-SHA".to_string()]
        );

        let supported = factory.supported_cipher_suites();
        assert_eq!(&supported[..2], &factory.default_cipher_suites()[..]);
        assert_eq!(supported.len(), 2 + LEGACY_CIPHER_SUITES.len() - 1);
    }
}
