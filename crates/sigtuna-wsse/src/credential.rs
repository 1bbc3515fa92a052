#![forbid(unsafe_code)]

//! Signing credential: an X.509 certificate paired with its RSA private key.

use der::{Decode, Encode};
use pkcs8::DecodePublicKey;
use sigtuna_core::{Error, Result};
use sigtuna_crypto::sign::{self, SigningKey};
use x509_cert::Certificate;

/// An X.509 certificate together with the matching RSA private key.
///
/// The DER certificate bytes become the BinarySecurityToken content; the
/// private key produces the signature. Private key material is never
/// logged or exposed; the `Debug` impl only shows certificate metadata.
pub struct SigningCredential {
    cert_der: Vec<u8>,
    key: SigningKey,
}

impl SigningCredential {
    /// Build a credential from a PEM certificate and a PEM private key.
    ///
    /// The key may be PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1
    /// (`BEGIN RSA PRIVATE KEY`).
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let (label, cert_der) = pem_rfc7468::decode_vec(cert_pem.as_bytes())
            .map_err(|e| Error::Credential(format!("invalid certificate PEM: {e}")))?;
        if label != "CERTIFICATE" {
            return Err(Error::Credential(format!(
                "expected a CERTIFICATE PEM block, found {label}"
            )));
        }

        let key = parse_rsa_private_pem(key_pem)?;
        Self::from_der(cert_der, key)
    }

    /// Build a credential from DER certificate bytes and a parsed key.
    ///
    /// The certificate is parsed to reject garbage early and the key is
    /// checked against the certificate's subject public key, so a
    /// mismatched pair fails here instead of producing signatures nobody
    /// can verify.
    pub fn from_der(cert_der: Vec<u8>, key: rsa::RsaPrivateKey) -> Result<Self> {
        let cert_public = certificate_public_key(&cert_der)?;
        if key.to_public_key() != cert_public {
            return Err(Error::Credential(
                "private key does not match the certificate's public key".into(),
            ));
        }
        Ok(Self {
            cert_der,
            key: SigningKey::Rsa(key),
        })
    }

    /// The raw DER bytes of the certificate.
    pub fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }

    /// Sign `data` with the private key using the given signature
    /// algorithm URI.
    pub fn sign(&self, algorithm_uri: &str, data: &[u8]) -> Result<Vec<u8>> {
        sign::from_uri(algorithm_uri)?.sign(&self.key, data)
    }

    /// The RSA public key from the certificate.
    pub fn public_key(&self) -> Result<rsa::RsaPublicKey> {
        certificate_public_key(&self.cert_der)
    }
}

impl std::fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredential")
            .field("cert_der_len", &self.cert_der.len())
            .finish_non_exhaustive()
    }
}

/// Extract the RSA subject public key from DER certificate bytes.
pub fn certificate_public_key(cert_der: &[u8]) -> Result<rsa::RsaPublicKey> {
    let cert = Certificate::from_der(cert_der)
        .map_err(|e| Error::Credential(format!("failed to parse certificate: {e}")))?;
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Credential(format!("failed to encode subject public key: {e}")))?;
    rsa::RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| Error::Credential(format!("certificate does not carry an RSA key: {e}")))
}

fn parse_rsa_private_pem(key_pem: &str) -> Result<rsa::RsaPrivateKey> {
    use pkcs8::DecodePrivateKey;
    if let Ok(key) = rsa::RsaPrivateKey::from_pkcs8_pem(key_pem) {
        return Ok(key);
    }
    use pkcs1::DecodeRsaPrivateKey;
    rsa::RsaPrivateKey::from_pkcs1_pem(key_pem)
        .map_err(|e| Error::Credential(format!("failed to parse RSA private key PEM: {e}")))
}
