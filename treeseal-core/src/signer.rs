//! Per-file signing and signature checks
//!
//! The asymmetric primitive stays behind [`DigestSigner`] and
//! [`DigestVerifier`]; this module only decides *what* gets signed.

use crate::error::SealError;
use crate::hasher::{self, SealDigest};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;
use tracing::trace;

/// Produces a signature over a digest with a private key
pub trait DigestSigner {
    fn sign_digest(&self, digest: &SealDigest) -> Vec<u8>;
}

/// Checks a signature over a digest with a public key
pub trait DigestVerifier {
    fn verify_digest(&self, digest: &SealDigest, signature: &[u8]) -> bool;
}

impl<T: DigestSigner + ?Sized> DigestSigner for &T {
    fn sign_digest(&self, digest: &SealDigest) -> Vec<u8> {
        (**self).sign_digest(digest)
    }
}

impl<T: DigestVerifier + ?Sized> DigestVerifier for &T {
    fn verify_digest(&self, digest: &SealDigest, signature: &[u8]) -> bool {
        (**self).verify_digest(digest, signature)
    }
}

/// Sign a digest and encode the signature for the manifest
pub fn sign_encoded<S: DigestSigner + ?Sized>(signer: &S, digest: &SealDigest) -> String {
    BASE64.encode(signer.sign_digest(digest))
}

/// Check an encoded signature; undecodable text simply fails the check
pub fn verify_encoded<V: DigestVerifier + ?Sized>(
    verifier: &V,
    digest: &SealDigest,
    encoded: &str,
) -> bool {
    match BASE64.decode(encoded) {
        Ok(signature) => verifier.verify_digest(digest, &signature),
        Err(_) => false,
    }
}

/// Sign the file at `path` under its canonical `key`
pub fn sign_file<S: DigestSigner + ?Sized>(
    key: &str,
    path: &Path,
    signer: &S,
) -> Result<String, SealError> {
    let digest = hasher::file_digest(key, path)?;
    trace!("Signing {} ({})", key, hasher::digest_hex(&digest));
    Ok(sign_encoded(signer, &digest))
}

/// Check one file against the signature recorded for `key`
pub fn verify_file<V: DigestVerifier + ?Sized>(
    key: &str,
    path: &Path,
    signature: &str,
    verifier: &V,
) -> Result<(), SealError> {
    let digest = hasher::file_digest(key, path)?;
    if verify_encoded(verifier, &digest, signature) {
        trace!("Signature valid for {}", key);
        Ok(())
    } else {
        Err(SealError::SignatureInvalid {
            key: key.to_string(),
        })
    }
}
