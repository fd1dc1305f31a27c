//! Signing credentials: a private key with its certificate chain.

use std::fmt;

use der::Decode;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use x509_cert::Certificate;

use crate::infra::error::{CadesError, CadesResult};

/// Private key plus its certificate chain (leaf first, then intermediates).
#[derive(Clone)]
pub struct SigningCredential {
    key: PKey<Private>,
    chain: Vec<X509>,
}

impl SigningCredential {
    /// Pair a key with its chain. The leaf must certify `key`.
    pub fn new(key: PKey<Private>, chain: Vec<X509>) -> CadesResult<Self> {
        let leaf = chain.first().ok_or_else(|| {
            CadesError::InvalidInput("The signer certificate chain cannot be empty".to_string())
        })?;
        if !leaf.public_key()?.public_eq(&key) {
            return Err(CadesError::InvalidInput(
                "The private key does not match the signer certificate".to_string(),
            ));
        }
        Ok(Self { key, chain })
    }

    /// Load from a PKCS#12 (PFX) blob.
    pub fn from_pkcs12(der: &[u8], password: &str) -> CadesResult<Self> {
        let parsed = Pkcs12::from_der(der)?
            .parse2(password)
            .map_err(|e| CadesError::InvalidInput(format!("Could not open the PKCS#12 store: {e}")))?;
        let key = parsed.pkey.ok_or_else(|| {
            CadesError::InvalidInput("The PKCS#12 store holds no private key".to_string())
        })?;
        let leaf = parsed.cert.ok_or_else(|| {
            CadesError::InvalidInput("The PKCS#12 store holds no certificate".to_string())
        })?;
        let mut chain = vec![leaf];
        if let Some(ca) = parsed.ca {
            chain.extend(ca.into_iter());
        }
        log::debug!("Loaded PKCS#12 credential with {} certificate(s)", chain.len());
        Self::new(key, chain)
    }

    /// Load from a PEM private key and a PEM bundle of certificates (leaf first).
    pub fn from_pem(key_pem: &[u8], chain_pem: &[u8]) -> CadesResult<Self> {
        let key = PKey::private_key_from_pem(key_pem)?;
        let chain = X509::stack_from_pem(chain_pem)?;
        Self::new(key, chain)
    }

    #[must_use]
    pub fn private_key(&self) -> &PKey<Private> {
        &self.key
    }

    #[must_use]
    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    /// Signer (leaf) certificate.
    #[must_use]
    pub fn leaf(&self) -> &X509 {
        // Non-empty chain is checked in `new`.
        &self.chain[0]
    }

    /// Chain re-parsed as `x509-cert` structures for ASN.1 assembly.
    pub fn parsed_chain(&self) -> CadesResult<Vec<Certificate>> {
        self.chain.iter().map(parse_certificate).collect()
    }
}

/// Convert an openssl certificate into its `x509-cert` representation.
pub fn parse_certificate(cert: &X509) -> CadesResult<Certificate> {
    let der = cert.to_der()?;
    Ok(Certificate::from_der(&der)?)
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SigningCredential(key={:?}, chain_len={})",
            self.key.id(),
            self.chain.len()
        )
    }
}
