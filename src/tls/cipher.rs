//! Cipher suite name tables
//!
//! Names use OpenSSL's spelling. TLS 1.3 suites keep their `TLS_` prefix and
//! are configured separately from the TLS 1.2 cipher list.

/// Suites offered by the modern and compatible connection specs
pub const APPROVED_CIPHER_SUITES: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
    "AES128-SHA",
    "AES256-SHA",
    "DES-CBC3-SHA",
];

/// Older suites a context can still negotiate but does not enable by default
pub const LEGACY_CIPHER_SUITES: &[&str] = &[
    "ECDHE-ECDSA-AES128-SHA",
    "ECDHE-ECDSA-AES256-SHA",
    "AES128-SHA256",
    "AES256-SHA256",
];

/// Returns true for TLS 1.3 suite names.
pub fn is_tls13_suite(name: &str) -> bool {
    name.starts_with("TLS_")
}

/// Split suites into the TLS 1.3 `ciphersuites` string and the TLS 1.2
/// `cipher_list` string. Either half may be empty.
pub fn split_suites<S: AsRef<str>>(suites: &[S]) -> (String, String) {
    let (tls13, tls12): (Vec<&str>, Vec<&str>) = suites
        .iter()
        .map(|s| s.as_ref())
        .partition(|s| is_tls13_suite(s));
    (tls13.join(":"), tls12.join(":"))
}
