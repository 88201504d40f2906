use std::{fmt, path::Path};

use async_trait::async_trait;
use openssl::{
    pkcs12::Pkcs12,
    pkcs7::{Pkcs7, Pkcs7Flags},
    pkey::{PKey, Private},
    stack::Stack,
    x509::X509,
};

use crate::error::{WalletError, WalletResult};

#[async_trait]
pub trait ManifestSigner: fmt::Debug {
    /// Sign `manifest.json`, returning the DER encoded detached PKCS#7 signature stored as the
    /// `signature` entry of the pass.
    async fn sign(&self, manifest: &[u8]) -> WalletResult<Vec<u8>>;
}

/// Signs with a Pass Type ID certificate loaded from a PKCS#12 bundle.
pub struct CertificateSigner {
    certificate: X509,
    key: PKey<Private>,
    chain: Vec<X509>,
}

impl CertificateSigner {
    /// Load the signing certificate, its key and any bundled CA certificates.
    pub fn from_pkcs12(der: &[u8], password: &str) -> WalletResult<Self> {
        let parsed = Pkcs12::from_der(der)
            .and_then(|p12| p12.parse2(password))
            .map_err(|e| WalletError::credentials(format!("unable to open certificate bundle: {e}")))?;

        let Some(certificate) = parsed.cert else {
            return Err(WalletError::credentials(
                "certificate bundle does not contain a certificate",
            ));
        };
        let Some(key) = parsed.pkey else {
            return Err(WalletError::credentials(
                "certificate bundle does not contain a private key",
            ));
        };

        Ok(Self {
            certificate,
            key,
            chain: parsed.ca.map(|ca| ca.into_iter().collect()).unwrap_or_default(),
        })
    }

    /// Read the bundle from disk, optionally appending the Apple WWDR intermediate certificate.
    pub fn from_files(
        bundle: &Path,
        password: &str,
        intermediate: Option<&Path>,
    ) -> WalletResult<Self> {
        let der = std::fs::read(bundle).map_err(|e| {
            WalletError::credentials(format!(
                "unable to read certificate bundle {}: {e}",
                bundle.display()
            ))
        })?;
        let signer = Self::from_pkcs12(&der, password)?;

        let Some(intermediate) = intermediate else {
            return Ok(signer);
        };
        let bytes = std::fs::read(intermediate).map_err(|e| {
            WalletError::credentials(format!(
                "unable to read intermediate certificate {}: {e}",
                intermediate.display()
            ))
        })?;
        Ok(signer.with_intermediate(parse_certificate(&bytes)?))
    }

    pub fn with_intermediate(mut self, certificate: X509) -> Self {
        self.chain.push(certificate);
        self
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }
}

/// Parse a PEM or DER certificate.
pub fn parse_certificate(bytes: &[u8]) -> WalletResult<X509> {
    let parsed = if bytes.starts_with(b"-----BEGIN") {
        X509::from_pem(bytes)
    } else {
        X509::from_der(bytes)
    };
    parsed.map_err(|e| WalletError::credentials(format!("invalid certificate: {e}")))
}

impl fmt::Debug for CertificateSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateSigner")
            .field("chain", &self.chain.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ManifestSigner for CertificateSigner {
    async fn sign(&self, manifest: &[u8]) -> WalletResult<Vec<u8>> {
        let mut chain = Stack::new().map_err(|e| WalletError::signing(e.to_string()))?;
        for certificate in &self.chain {
            chain
                .push(certificate.clone())
                .map_err(|e| WalletError::signing(e.to_string()))?;
        }

        Pkcs7::sign(
            &self.certificate,
            &self.key,
            &chain,
            manifest,
            Pkcs7Flags::BINARY | Pkcs7Flags::DETACHED,
        )
        .and_then(|signature| signature.to_der())
        .map_err(|e| WalletError::signing(format!("unable to sign manifest: {e}")))
    }
}
