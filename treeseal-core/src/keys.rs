//! Key material for signing and verification
//!
//! Private keys are PKCS#8 PEM documents, optionally password-encrypted.
//! Public keys are SPKI PEM documents. Both are Ed25519.

use crate::error::SealError;
use crate::hasher::SealDigest;
use crate::signer::{DigestSigner, DigestVerifier};
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::path::Path;
use tracing::debug;

impl DigestSigner for SigningKey {
    fn sign_digest(&self, digest: &SealDigest) -> Vec<u8> {
        self.sign(digest).to_bytes().to_vec()
    }
}

impl DigestVerifier for VerifyingKey {
    fn verify_digest(&self, digest: &SealDigest, signature: &[u8]) -> bool {
        match Signature::from_slice(signature) {
            Ok(signature) => self.verify(digest, &signature).is_ok(),
            Err(_) => false,
        }
    }
}

fn read_pem(path: &Path) -> Result<String, SealError> {
    std::fs::read_to_string(path).map_err(|e| SealError::KeyLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load a private key, decrypting it when a non-empty password is given
pub fn load_private_key(path: &Path, password: Option<&str>) -> Result<SigningKey, SealError> {
    let pem = read_pem(path)?;
    let password = password.filter(|p| !p.is_empty());

    let key = match password {
        Some(password) => SigningKey::from_pkcs8_encrypted_pem(&pem, password),
        None => SigningKey::from_pkcs8_pem(&pem),
    }
    .map_err(|e| SealError::KeyLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!("Loaded private key from {}", path.display());
    Ok(key)
}

/// Load a public key
pub fn load_public_key(path: &Path) -> Result<VerifyingKey, SealError> {
    let pem = read_pem(path)?;
    let key = VerifyingKey::from_public_key_pem(&pem).map_err(|e| SealError::KeyLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!("Loaded public key from {}", path.display());
    Ok(key)
}

/// Fixed-seed key pair for tests
#[cfg(test)]
pub(crate) fn test_keys(seed: u8) -> (SigningKey, VerifyingKey) {
    let signing = SigningKey::from_bytes(&[seed; 32]);
    let verifying = signing.verifying_key();
    (signing, verifying)
}
