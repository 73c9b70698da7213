//! Connection specifications
//!
//! A `ConnectionSpec` tells the client which transport policy a connection
//! attempt uses: the TLS versions and cipher suites it may offer, or plain
//! text. Clients try their specs in order.

use crate::tls::cipher::APPROVED_CIPHER_SUITES;
use crate::tls::{TlsError, TlsSocket, TlsVersion};

/// Transport policy for one connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    tls: bool,
    supports_tls_extensions: bool,
    tls_versions: Option<Vec<TlsVersion>>,
    cipher_suites: Option<Vec<String>>,
}

impl ConnectionSpec {
    /// Current TLS versions with the approved cipher suites
    pub fn modern_tls() -> Self {
        ConnectionSpec {
            tls: true,
            supports_tls_extensions: true,
            tls_versions: Some(vec![TlsVersion::Tls13, TlsVersion::Tls12]),
            cipher_suites: Some(approved_suites()),
        }
    }

    /// Like [`modern_tls`](Self::modern_tls) but also offering TLS 1.1 and 1.0
    pub fn compatible_tls() -> Self {
        ConnectionSpec {
            tls: true,
            supports_tls_extensions: true,
            tls_versions: Some(vec![
                TlsVersion::Tls13,
                TlsVersion::Tls12,
                TlsVersion::Tls11,
                TlsVersion::Tls10,
            ]),
            cipher_suites: Some(approved_suites()),
        }
    }

    /// Unencrypted connections
    pub fn cleartext() -> Self {
        ConnectionSpec {
            tls: false,
            supports_tls_extensions: false,
            tls_versions: None,
            cipher_suites: None,
        }
    }

    /// Start an empty spec
    pub fn builder(tls: bool) -> ConnectionSpecBuilder {
        ConnectionSpecBuilder {
            tls,
            supports_tls_extensions: false,
            tls_versions: None,
            cipher_suites: None,
        }
    }

    /// Start from a copy of this spec
    pub fn to_builder(&self) -> ConnectionSpecBuilder {
        ConnectionSpecBuilder {
            tls: self.tls,
            supports_tls_extensions: self.supports_tls_extensions,
            tls_versions: self.tls_versions.clone(),
            cipher_suites: self.cipher_suites.clone(),
        }
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    pub fn supports_tls_extensions(&self) -> bool {
        self.supports_tls_extensions
    }

    /// Versions offered, or `None` to keep whatever the socket enables
    pub fn tls_versions(&self) -> Option<&[TlsVersion]> {
        self.tls_versions.as_deref()
    }

    /// Suites offered, or `None` to keep whatever the socket enables
    pub fn cipher_suites(&self) -> Option<&[String]> {
        self.cipher_suites.as_deref()
    }

    /// Whether this spec can be used on `socket`.
    ///
    /// Cleartext specs never match a TLS socket. Otherwise this spec's
    /// versions must overlap the socket's enabled protocols and its suites
    /// must overlap `supported_suites`.
    pub fn is_compatible(&self, socket: &TlsSocket, supported_suites: &[String]) -> bool {
        if !self.tls {
            return false;
        }

        if let Some(versions) = &self.tls_versions {
            if !socket.enabled_protocols().iter().any(|v| versions.contains(v)) {
                return false;
            }
        }

        if let Some(suites) = &self.cipher_suites {
            if !suites.iter().any(|s| supported_suites.contains(s)) {
                return false;
            }
        }

        true
    }

    /// Versions `socket` keeps after this spec is applied, in socket order
    pub fn effective_versions(&self, enabled: &[TlsVersion]) -> Vec<TlsVersion> {
        match &self.tls_versions {
            Some(versions) => enabled
                .iter()
                .copied()
                .filter(|v| versions.contains(v))
                .collect(),
            None => enabled.to_vec(),
        }
    }

    /// Restrict the socket's enabled protocols to this spec
    pub fn apply(&self, socket: &mut TlsSocket) -> Result<(), TlsError> {
        let versions = self.effective_versions(socket.enabled_protocols());
        socket.set_enabled_protocols(&versions)
    }
}

fn approved_suites() -> Vec<String> {
    APPROVED_CIPHER_SUITES.iter().map(|s| s.to_string()).collect()
}

/// Builder for [`ConnectionSpec`]
#[derive(Debug, Clone)]
pub struct ConnectionSpecBuilder {
    tls: bool,
    supports_tls_extensions: bool,
    tls_versions: Option<Vec<TlsVersion>>,
    cipher_suites: Option<Vec<String>>,
}

impl ConnectionSpecBuilder {
    /// Offer exactly these versions
    pub fn tls_versions(mut self, versions: &[TlsVersion]) -> Result<Self, TlsError> {
        if !self.tls {
            return Err(TlsError::InvalidConfig(
                "No TLS versions for cleartext connections".to_string(),
            ));
        }
        if versions.is_empty() {
            return Err(TlsError::InvalidConfig(
                "At least one TLS version is required".to_string(),
            ));
        }
        self.tls_versions = Some(versions.to_vec());
        Ok(self)
    }

    /// Keep whatever versions the socket enables
    pub fn all_enabled_tls_versions(mut self) -> Self {
        self.tls_versions = None;
        self
    }

    /// Offer exactly these cipher suites
    pub fn cipher_suites(mut self, suites: &[&str]) -> Result<Self, TlsError> {
        if !self.tls {
            return Err(TlsError::InvalidConfig(
                "No cipher suites for cleartext connections".to_string(),
            ));
        }
        if suites.is_empty() {
            return Err(TlsError::InvalidConfig(
                "At least one cipher suite is required".to_string(),
            ));
        }
        self.cipher_suites = Some(suites.iter().map(|s| s.to_string()).collect());
        Ok(self)
    }

    /// Keep whatever suites the socket enables
    pub fn all_enabled_cipher_suites(mut self) -> Self {
        self.cipher_suites = None;
        self
    }

    pub fn supports_tls_extensions(mut self, supports: bool) -> Self {
        self.supports_tls_extensions = self.tls && supports;
        self
    }

    pub fn build(self) -> ConnectionSpec {
        ConnectionSpec {
            tls: self.tls,
            supports_tls_extensions: self.supports_tls_extensions,
            tls_versions: self.tls_versions,
            cipher_suites: self.cipher_suites,
        }
    }
}
