//! TLS protocol versions
//!
//! Versions are ordered oldest to newest so that ranges and intersections
//! can be computed with plain comparisons.

use super::TlsError;
use openssl::ssl::SslVersion;

/// TLS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// SSL 3.0 (deprecated, not offered by modern OpenSSL builds)
    Ssl3,
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

/// Protocol versions forced onto every TLS socket produced by
/// [`ProtocolClampingFactory`](super::ProtocolClampingFactory).
pub const ALLOWED_TLS_VERSIONS: [TlsVersion; 2] = [TlsVersion::Tls11, TlsVersion::Tls12];

impl TlsVersion {
    /// All versions, oldest first
    pub const ALL: [TlsVersion; 5] = [
        TlsVersion::Ssl3,
        TlsVersion::Tls10,
        TlsVersion::Tls11,
        TlsVersion::Tls12,
        TlsVersion::Tls13,
    ];

    /// Parse TLS version from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, TlsError> {
        match s.to_uppercase().as_str() {
            "SSLV3" | "SSL3" => Ok(TlsVersion::Ssl3),
            "TLSV1.0" | "TLS1.0" | "TLSV1" | "TLS1" => Ok(TlsVersion::Tls10),
            "TLSV1.1" | "TLS1.1" => Ok(TlsVersion::Tls11),
            "TLSV1.2" | "TLS1.2" => Ok(TlsVersion::Tls12),
            "TLSV1.3" | "TLS1.3" => Ok(TlsVersion::Tls13),
            _ => Err(TlsError::InvalidVersion(s.to_string())),
        }
    }

    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> SslVersion {
        match self {
            TlsVersion::Ssl3 => SslVersion::SSL3,
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// Platform name of the version, as reported by OpenSSL's `version_str`
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Ssl3 => "SSLv3",
            TlsVersion::Tls10 => "TLSv1",
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }

    /// Versions from TLS 1.0 up to and including `self`.
    ///
    /// This is the set a context created for `self` enables on new sockets.
    pub fn enabled_by_default(self) -> Vec<TlsVersion> {
        TlsVersion::ALL
            .iter()
            .copied()
            .filter(|v| *v >= TlsVersion::Tls10 && *v <= self)
            .collect()
    }
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when `versions` covers every version between its lowest and
/// highest member.
pub(crate) fn is_contiguous(versions: &[TlsVersion]) -> bool {
    let (min, max) = match (versions.iter().min(), versions.iter().max()) {
        (Some(min), Some(max)) => (*min, *max),
        _ => return false,
    };
    TlsVersion::ALL
        .iter()
        .filter(|v| **v >= min && **v <= max)
        .all(|v| versions.contains(v))
}
