//! TLS 1.1 / 1.2 enablement for legacy platforms
//!
//! Older platform TLS stacks implement TLS 1.1 and 1.2 but leave them
//! disabled on new sockets. [`configure_legacy_tls`] installs a
//! [`ProtocolClampingFactory`] over a TLS 1.1 context together with the
//! matching connection specs. It is best effort: when the platform cannot
//! provide a trust manager or a context the failure is logged and the
//! builder is returned untouched.

use super::{ClientBuilder, ConnectionSpec};
use crate::tls::{
    ProtocolClampingFactory, TlsContext, TlsError, TlsVersion, TrustManager,
    ALLOWED_TLS_VERSIONS,
};

/// Log target for TLS compatibility diagnostics
pub const LOG_TARGET: &str = "tls_compat";

/// Platform services the legacy setup depends on
pub trait PlatformTls {
    /// Trust manager for the platform's default trust store
    fn trust_manager(&self) -> Result<TrustManager, TlsError>;

    /// TLS context for `protocol`, verifying peers with `trust_manager`
    fn context(&self, protocol: TlsVersion, trust_manager: &TrustManager)
        -> Result<TlsContext, TlsError>;
}

/// Platform backed by the system OpenSSL installation
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSslPlatform;

impl PlatformTls for OpenSslPlatform {
    fn trust_manager(&self) -> Result<TrustManager, TlsError> {
        TrustManager::system()
    }

    fn context(
        &self,
        protocol: TlsVersion,
        trust_manager: &TrustManager,
    ) -> Result<TlsContext, TlsError> {
        TlsContext::builder(protocol)
            .trust_manager(trust_manager.clone())
            .build()
    }
}

/// Connection specs used with the clamped factory: modern TLS limited to
/// [`ALLOWED_TLS_VERSIONS`], then compatible TLS, then cleartext.
pub fn legacy_connection_specs() -> Result<Vec<ConnectionSpec>, TlsError> {
    let restricted = ConnectionSpec::modern_tls()
        .to_builder()
        .tls_versions(&ALLOWED_TLS_VERSIONS)?
        .build();

    Ok(vec![
        restricted,
        ConnectionSpec::compatible_tls(),
        ConnectionSpec::cleartext(),
    ])
}

/// Install the protocol-clamping factory and legacy connection specs.
///
/// The builder is only modified once every step has succeeded. Failures
/// are logged under [`LOG_TARGET`] and returned next to the builder.
pub fn configure_legacy_tls<P>(
    builder: ClientBuilder,
    platform: &P,
) -> (ClientBuilder, Result<(), TlsError>)
where
    P: PlatformTls + ?Sized,
{
    let prepared = platform.trust_manager().and_then(|trust| {
        let context = platform.context(TlsVersion::Tls11, &trust)?;
        let specs = legacy_connection_specs()?;
        Ok((trust, context, specs))
    });

    match prepared {
        Ok((trust, context, specs)) => {
            log::debug!(
                target: LOG_TARGET,
                "enabled {} and {} on legacy TLS context",
                ALLOWED_TLS_VERSIONS[0],
                ALLOWED_TLS_VERSIONS[1]
            );
            let factory = ProtocolClampingFactory::new(context.socket_factory());
            let builder = builder
                .socket_factory(factory, trust)
                .connection_specs(specs);
            (builder, Ok(()))
        }
        Err(e) => {
            log::error!(target: LOG_TARGET, "Error while setting TLS 1.1 and 1.2: {}", e);
            (builder, Err(e))
        }
    }
}

/// Client builder with TLS 1.1 and 1.2 forced on, when the platform allows
pub fn legacy_client_builder() -> ClientBuilder {
    ClientBuilder::new().legacy_tls()
}

impl ClientBuilder {
    /// Best-effort [`configure_legacy_tls`] against the OpenSSL platform
    pub fn legacy_tls(self) -> Self {
        configure_legacy_tls(self, &OpenSslPlatform).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTrustStore;

    impl PlatformTls for NoTrustStore {
        fn trust_manager(&self) -> Result<TrustManager, TlsError> {
            Err(TlsError::TrustStoreUnavailable("no default trust store".to_string()))
        }

        fn context(&self, _: TlsVersion, _: &TrustManager) -> Result<TlsContext, TlsError> {
            unreachable!("context requested without a trust manager")
        }
    }

    struct NoLegacyProtocol;

    impl PlatformTls for NoLegacyProtocol {
        fn trust_manager(&self) -> Result<TrustManager, TlsError> {
            TrustManager::system()
        }

        fn context(&self, protocol: TlsVersion, _: &TrustManager) -> Result<TlsContext, TlsError> {
            Err(TlsError::ProtocolUnavailable(protocol))
        }
    }

    #[test]
    fn test_legacy_specs_order() {
        let specs = legacy_connection_specs().unwrap();

        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].tls_versions(), Some(&ALLOWED_TLS_VERSIONS[..]));
        assert_eq!(specs[1], ConnectionSpec::compatible_tls());
        assert_eq!(specs[2], ConnectionSpec::cleartext());
    }

    #[test]
    fn test_success_installs_factory() {
        let (builder, outcome) = configure_legacy_tls(ClientBuilder::new(), &OpenSslPlatform);

        assert!(outcome.is_ok());
        assert!(builder.has_socket_factory());
        assert!(builder.trust_manager_ref().unwrap().is_system());
        assert_eq!(builder.connection_specs_ref(), &legacy_connection_specs().unwrap()[..]);
    }

    #[test]
    fn test_missing_trust_store_leaves_builder_untouched() {
        let (builder, outcome) = configure_legacy_tls(ClientBuilder::new(), &NoTrustStore);

        assert!(matches!(outcome, Err(TlsError::TrustStoreUnavailable(_))));
        assert!(!builder.has_socket_factory());
        assert!(builder.trust_manager_ref().is_none());
        assert_eq!(builder.connection_specs_ref().len(), 2);
    }

    #[test]
    fn test_missing_legacy_protocol_leaves_builder_untouched() {
        let (builder, outcome) = configure_legacy_tls(ClientBuilder::new(), &NoLegacyProtocol);

        assert!(matches!(
            outcome,
            Err(TlsError::ProtocolUnavailable(TlsVersion::Tls11))
        ));
        assert!(!builder.has_socket_factory());
        assert!(builder.build().is_ok());
    }
}
