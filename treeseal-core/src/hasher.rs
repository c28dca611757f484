//! Digest construction for the seal
//!
//! Uses SHA-256 both for per-file digests (bound to the file's canonical key)
//! and for the self-sign digest over the whole file map.

use crate::error::SealError;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// A SHA-256 digest, the unit every signature is computed over
pub type SealDigest = [u8; 32];

const FILE_DOMAIN: &[u8] = b"treeseal-file-v1\0";

fn file_hasher(key: &str) -> Sha256 {
    let mut hasher = Sha256::new();
    hasher.update(FILE_DOMAIN);
    hasher.update(key.as_bytes());
    // Keys never contain NUL, so this terminator keeps key and content apart
    hasher.update([0u8]);
    hasher
}

/// Digest a file's contents together with its canonical key
pub fn file_digest(key: &str, path: &Path) -> Result<SealDigest, SealError> {
    let mut file = std::fs::File::open(path).map_err(|e| SealError::file_read(path, e))?;

    let mut hasher = file_hasher(key);
    let mut buffer = [0; 8192]; // 8KB buffer for streaming

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| SealError::file_read(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().into())
}

/// Digest of the sorted `key ‖ signature` concatenation.
///
/// Pairs may arrive in any order; they are sorted by key (byte-wise,
/// ascending) and concatenated with no delimiter before hashing.
pub fn self_sign_digest<'a, I>(pairs: I) -> SealDigest
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = pairs.into_iter().collect();
    pairs.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let mut hasher = Sha256::new();
    for (key, signature) in pairs {
        hasher.update(key.as_bytes());
        hasher.update(signature.as_bytes());
    }
    hasher.finalize().into()
}

/// Hex rendering for logs
pub fn digest_hex(digest: &SealDigest) -> String {
    format!("sha256:{}", hex::encode(digest))
}
