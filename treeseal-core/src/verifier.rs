//! Manifest verification
//!
//! Order matters: the self-signature is checked before any entry of the
//! map is trusted, and the on-disk file set is compared with the map
//! before any per-file signature is checked.

use crate::canonical::SealRoot;
use crate::error::SealError;
use crate::hasher;
use crate::manifest::Manifest;
use crate::signer::{verify_encoded, verify_file, DigestVerifier};
use crate::walker::{walk_files, IgnoreSet, TreeFile};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

fn check_self_signature<V: DigestVerifier + ?Sized>(
    manifest: &Manifest,
    verifier: &V,
) -> Result<(), SealError> {
    let digest = manifest.self_sign_digest();
    debug!("Recomputed self-sign digest {}", hasher::digest_hex(&digest));
    if verify_encoded(verifier, &digest, manifest.self_signature()) {
        Ok(())
    } else {
        Err(SealError::SelfSignatureInvalid)
    }
}

fn on_disk(root: &Path, ignore: &IgnoreSet) -> Result<BTreeMap<String, TreeFile>, SealError> {
    let root = SealRoot::open(root)?;
    Ok(walk_files(&root, ignore)?
        .into_iter()
        .map(|file| (file.key.clone(), file))
        .collect())
}

/// Verify `root` against `manifest`, stopping at the first failure
pub fn verify<V: DigestVerifier + ?Sized>(
    root: &Path,
    ignore: &IgnoreSet,
    manifest: &Manifest,
    verifier: &V,
) -> Result<(), SealError> {
    let outcome = verify_steps(root, ignore, manifest, verifier);
    match &outcome {
        Ok(()) => info!("Verified folder '{}'", root.display()),
        Err(e) => {
            warn!("Verification of '{}' failed: {}", root.display(), e);
            e.log_if_security_critical();
        }
    }
    outcome
}

fn verify_steps<V: DigestVerifier + ?Sized>(
    root: &Path,
    ignore: &IgnoreSet,
    manifest: &Manifest,
    verifier: &V,
) -> Result<(), SealError> {
    check_self_signature(manifest, verifier)?;

    let files = on_disk(root, ignore)?;
    let signatures = manifest.signatures();

    if let Some(key) = files.keys().find(|key| !signatures.contains_key(*key)) {
        return Err(SealError::UnexpectedFile { key: key.clone() });
    }
    if let Some(key) = signatures.keys().find(|key| !files.contains_key(*key)) {
        return Err(SealError::MissingFile { key: key.clone() });
    }

    for (key, signature) in signatures {
        // Both key sets are equal at this point
        if let Some(file) = files.get(key) {
            verify_file(key, &file.path, signature, verifier)?;
        }
    }

    debug!("All {} signatures valid", signatures.len());
    Ok(())
}

/// Load `<root>/signature.json` and verify `root` against it
pub fn verify_folder<V: DigestVerifier + ?Sized>(
    root: &Path,
    ignore: &IgnoreSet,
    verifier: &V,
) -> Result<(), SealError> {
    let manifest = Manifest::load(root)?;
    verify(root, ignore, &manifest, verifier)
}

/// Every discrepancy between a tree and its manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Files on disk the manifest does not list
    pub unexpected: Vec<String>,
    /// Files the manifest lists that are not on disk
    pub missing: Vec<String>,
    /// Files whose content does not match their signature
    pub invalid: Vec<String>,
}

impl VerificationReport {
    pub fn is_trusted(&self) -> bool {
        self.unexpected.is_empty() && self.missing.is_empty() && self.invalid.is_empty()
    }

    /// The error [`verify`] would have reported for the same tree
    pub fn into_result(self) -> Result<(), SealError> {
        if let Some(key) = self.unexpected.into_iter().next() {
            return Err(SealError::UnexpectedFile { key });
        }
        if let Some(key) = self.missing.into_iter().next() {
            return Err(SealError::MissingFile { key });
        }
        if let Some(key) = self.invalid.into_iter().next() {
            return Err(SealError::SignatureInvalid { key });
        }
        Ok(())
    }
}

/// Collect every discrepancy instead of stopping at the first.
///
/// A bad self-signature still ends the audit immediately: without it no
/// entry of the map can be trusted, so there is nothing to compare against.
/// Unreadable files and symlink escapes are errors, as in [`verify`].
pub fn audit<V: DigestVerifier + ?Sized>(
    root: &Path,
    ignore: &IgnoreSet,
    manifest: &Manifest,
    verifier: &V,
) -> Result<VerificationReport, SealError> {
    check_self_signature(manifest, verifier)?;

    let files = on_disk(root, ignore)?;
    let signatures = manifest.signatures();
    let mut report = VerificationReport::default();

    for key in files.keys() {
        if !signatures.contains_key(key) {
            report.unexpected.push(key.clone());
        }
    }

    for (key, signature) in signatures {
        let Some(file) = files.get(key) else {
            report.missing.push(key.clone());
            continue;
        };
        match verify_file(key, &file.path, signature, verifier) {
            Ok(()) => {}
            Err(SealError::SignatureInvalid { key }) => report.invalid.push(key),
            Err(e) => return Err(e),
        }
    }

    if !report.is_trusted() {
        warn!(
            "Audit of '{}': {} unexpected, {} missing, {} invalid",
            root.display(),
            report.unexpected.len(),
            report.missing.len(),
            report.invalid.len()
        );
    }
    Ok(report)
}
