//! Certificate material for the SDS secrets.
//!
//! Issuing certificates happens elsewhere. The cache reads the bytes
//! through [`CertificateProvider`] when TLS is enabled and again on
//! [`XdsCache::rotate_secrets`](crate::XdsCache::rotate_secrets), never
//! while building a snapshot.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use xds_core::{XdsError, XdsResult};

/// A certificate chain and its private key, PEM encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateKeyPair {
    /// Certificate chain.
    pub certificate_chain: Vec<u8>,
    /// Private key.
    pub private_key: Vec<u8>,
}

impl fmt::Debug for CertificateKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateKeyPair")
            .field("certificate_chain", &self.certificate_chain.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Source of TLS material for one leg of the proxy.
///
/// `Ok(None)` means the provider has no material configured and the leg
/// stays plaintext. Material that is configured but unreadable is an
/// error.
pub trait CertificateProvider: Send + Sync {
    /// Certificate presented to peers.
    fn certificate(&self) -> XdsResult<Option<CertificateKeyPair>>;

    /// CA bundle used to verify peers.
    fn validation_certificate(&self) -> XdsResult<Option<Vec<u8>>>;
}

/// Certificate material held in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticCertificates {
    certificate: Option<CertificateKeyPair>,
    ca: Option<Vec<u8>>,
}

impl StaticCertificates {
    /// Provider with a certificate and no CA.
    pub fn new(certificate_chain: impl Into<Vec<u8>>, private_key: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate: Some(CertificateKeyPair {
                certificate_chain: certificate_chain.into(),
                private_key: private_key.into(),
            }),
            ca: None,
        }
    }

    /// Add a CA bundle for peer verification.
    #[must_use]
    pub fn with_ca(mut self, ca: impl Into<Vec<u8>>) -> Self {
        self.ca = Some(ca.into());
        self
    }

    /// Provider with nothing to offer.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl CertificateProvider for StaticCertificates {
    fn certificate(&self) -> XdsResult<Option<CertificateKeyPair>> {
        Ok(self.certificate.clone())
    }

    fn validation_certificate(&self) -> XdsResult<Option<Vec<u8>>> {
        Ok(self.ca.clone())
    }
}

/// PEM files located through `{PREFIX}_TLS_CRT_PATH`, `{PREFIX}_TLS_KEY_PATH`
/// and `{PREFIX}_TLS_CA_PATH`.
///
/// The CA is read from the validation prefix, which names the peer whose
/// CA is trusted. Every call reads the files, so a missing or unreadable
/// file is reported as an error rather than as absent material.
#[derive(Clone, Debug)]
pub struct PemFileCertificates {
    certificate_path: PathBuf,
    key_path: PathBuf,
    ca_path: Option<PathBuf>,
}

impl PemFileCertificates {
    /// Provider reading the given files.
    pub fn new(
        certificate_path: impl Into<PathBuf>,
        key_path: impl Into<PathBuf>,
        ca_path: Option<PathBuf>,
    ) -> Self {
        Self {
            certificate_path: certificate_path.into(),
            key_path: key_path.into(),
            ca_path,
        }
    }

    /// Locate the files through environment variables.
    ///
    /// The certificate and key paths are required; the CA path is optional.
    pub fn from_env(prefix: &str, validation_prefix: &str) -> XdsResult<Self> {
        Self::from_lookup(prefix, validation_prefix, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        prefix: &str,
        validation_prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> XdsResult<Self> {
        let required = |key: String| {
            lookup(&key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| XdsError::Configuration(format!("{key} is not set")))
        };
        let certificate_path = required(format!("{prefix}_TLS_CRT_PATH"))?;
        let key_path = required(format!("{prefix}_TLS_KEY_PATH"))?;
        let ca_path = lookup(&format!("{validation_prefix}_TLS_CA_PATH"))
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        debug!(prefix, certificate = %certificate_path, "located TLS certificate");
        Ok(Self::new(certificate_path, key_path, ca_path))
    }

}

fn read(path: &Path) -> XdsResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        XdsError::Configuration(format!("failed to read {}: {e}", path.display()))
    })
}

impl CertificateProvider for PemFileCertificates {
    fn certificate(&self) -> XdsResult<Option<CertificateKeyPair>> {
        Ok(Some(CertificateKeyPair {
            certificate_chain: read(&self.certificate_path)?,
            private_key: read(&self.key_path)?,
        }))
    }

    fn validation_certificate(&self) -> XdsResult<Option<Vec<u8>>> {
        self.ca_path.as_deref().map(read).transpose()
    }
}
