//! Manifest construction
//!
//! A build is all-or-nothing: the first file that cannot be canonicalized,
//! read or signed aborts it, and nothing is written unless the whole
//! manifest was produced.

use crate::canonical::SealRoot;
use crate::error::SealError;
use crate::hasher;
use crate::manifest::Manifest;
use crate::signer::{sign_encoded, sign_file, DigestSigner};
use crate::walker::{walk_files, IgnoreSet};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

fn finish<S: DigestSigner + ?Sized>(
    root: &SealRoot,
    signatures: BTreeMap<String, String>,
    signer: &S,
) -> Manifest {
    let digest = hasher::self_sign_digest(
        signatures
            .iter()
            .map(|(key, signature)| (key.as_str(), signature.as_str())),
    );
    debug!("Self-sign digest {}", hasher::digest_hex(&digest));
    let self_signature = sign_encoded(signer, &digest);

    info!(
        "Signed {} files under {}",
        signatures.len(),
        root.path().display()
    );
    Manifest::from_parts(signatures, self_signature)
}

/// Build a signed manifest for `root`
pub fn build<S: DigestSigner + ?Sized>(
    root: &Path,
    ignore: &IgnoreSet,
    signer: &S,
) -> Result<Manifest, SealError> {
    let root = SealRoot::open(root)?;
    let files = walk_files(&root, ignore)?;

    let mut signatures = BTreeMap::new();
    for file in files {
        let signature = sign_file(&file.key, &file.path, signer)?;
        debug!("Signed {}", file.key);
        signatures.insert(file.key, signature);
    }

    Ok(finish(&root, signatures, signer))
}

/// Build a signed manifest, hashing and signing files on the blocking pool.
///
/// Produces the same manifest as [`build`]. Every file is attempted; when
/// several fail, the error for the smallest key is returned, which is the
/// error [`build`] would stop at.
pub async fn build_concurrent<S>(
    root: &Path,
    ignore: &IgnoreSet,
    signer: Arc<S>,
) -> Result<Manifest, SealError>
where
    S: DigestSigner + Send + Sync + 'static,
{
    let (root, files) = {
        let root = root.to_path_buf();
        let ignore = ignore.clone();
        tokio::task::spawn_blocking(move || {
            let root = SealRoot::open(&root)?;
            let files = walk_files(&root, &ignore)?;
            Ok::<_, SealError>((root, files))
        })
        .await
        .map_err(join_failure)??
    };

    let mut tasks: JoinSet<(String, Result<String, SealError>)> = JoinSet::new();
    for file in files {
        let signer = Arc::clone(&signer);
        tasks.spawn_blocking(move || {
            let signature = sign_file(&file.key, &file.path, signer.as_ref());
            (file.key, signature)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.map_err(join_failure)?);
    }

    let signatures = collect_signatures(results)?;
    Ok(finish(&root, signatures, signer.as_ref()))
}

/// Gather per-file results in any order, failing with the smallest key's error
fn collect_signatures<I>(results: I) -> Result<BTreeMap<String, String>, SealError>
where
    I: IntoIterator<Item = (String, Result<String, SealError>)>,
{
    let mut signatures = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for (key, result) in results {
        match result {
            Ok(signature) => {
                debug!("Signed {}", key);
                signatures.insert(key, signature);
            }
            Err(e) => {
                failures.insert(key, e);
            }
        }
    }

    match failures.into_values().next() {
        Some(e) => Err(e),
        None => Ok(signatures),
    }
}

fn join_failure(e: tokio::task::JoinError) -> SealError {
    SealError::file_read(PathBuf::new(), std::io::Error::other(e.to_string()))
}

/// Build the manifest and write it to `<root>/signature.json`
pub fn sign_folder<S: DigestSigner + ?Sized>(
    root: &Path,
    ignore: &IgnoreSet,
    signer: &S,
) -> Result<PathBuf, SealError> {
    let manifest = build(root, ignore, signer)?;
    let written = manifest.save(root)?;
    info!("Signed folder '{}'", root.display());
    Ok(written)
}
