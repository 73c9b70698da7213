//! Trust managers
//!
//! A `TrustManager` describes the certificates used to validate peers. It is
//! applied to an OpenSSL context when the context is built.

use super::TlsError;
use openssl::ssl::SslContextBuilder;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::X509;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Source of trust anchors for peer verification
#[derive(Clone)]
pub struct TrustManager {
    system: bool,
    anchors: Vec<X509>,
}

impl TrustManager {
    /// Trust manager backed by the platform's default certificate locations.
    ///
    /// Fails if OpenSSL cannot set up a store from its default paths.
    pub fn system() -> Result<Self, TlsError> {
        let mut store = X509StoreBuilder::new()
            .map_err(|e| TlsError::TrustStoreUnavailable(e.to_string()))?;
        store
            .set_default_paths()
            .map_err(|e| TlsError::TrustStoreUnavailable(e.to_string()))?;

        Ok(TrustManager {
            system: true,
            anchors: Vec::new(),
        })
    }

    /// Trust manager holding the certificates found in a PEM bundle
    pub fn from_pem(pem: &[u8]) -> Result<Self, TlsError> {
        let anchors = X509::stack_from_pem(pem)
            .map_err(|e| TlsError::Certificate(format!("Failed to load certificates: {}", e)))?;

        if anchors.is_empty() {
            return Err(TlsError::Certificate(
                "No certificates found in PEM data".to_string(),
            ));
        }

        Ok(TrustManager {
            system: false,
            anchors,
        })
    }

    /// Trust manager holding the certificates of a PEM file
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self, TlsError> {
        let mut pem = Vec::new();
        File::open(path.as_ref())?.read_to_end(&mut pem)?;
        Self::from_pem(&pem)
    }

    /// Whether the platform store is consulted
    pub fn is_system(&self) -> bool {
        self.system
    }

    /// Explicit trust anchors (empty for the platform store)
    pub fn anchors(&self) -> &[X509] {
        &self.anchors
    }

    pub(crate) fn apply(&self, builder: &mut SslContextBuilder) -> Result<(), TlsError> {
        if self.system {
            builder.set_default_verify_paths()?;
        }
        for anchor in &self.anchors {
            builder.cert_store_mut().add_cert(anchor.clone())?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TrustManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustManager")
            .field("system", &self.system)
            .field("anchors", &self.anchors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_trust_manager() {
        let trust = TrustManager::system().unwrap();
        assert!(trust.is_system());
        assert!(trust.anchors().is_empty());
    }

    #[test]
    fn test_pem_without_certificates() {
        let result = TrustManager::from_pem(b"not a certificate");
        assert!(matches!(result, Err(TlsError::Certificate(_))));
    }

    #[test]
    fn test_missing_pem_file() {
        let result = TrustManager::from_pem_file("/nonexistent/ca.pem");
        assert!(matches!(result, Err(TlsError::Io(_))));
    }
}
