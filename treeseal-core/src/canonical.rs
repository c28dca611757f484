//! Canonical manifest keys
//!
//! A key is the nominal path of a file relative to the signed root, joined
//! with `/`. The *resolved* path (all symlinks followed) must still lie under
//! the resolved root, otherwise the file is rejected.

use crate::error::SealError;
use std::path::{Component, Path, PathBuf};

/// Separator used in every canonical key, on every platform
pub const KEY_SEPARATOR: &str = "/";

/// A signed folder root, resolved once up front
#[derive(Debug, Clone)]
pub struct SealRoot {
    nominal: PathBuf,
    resolved: PathBuf,
}

impl SealRoot {
    /// Resolve `root` and remember both its nominal and resolved forms
    pub fn open(root: &Path) -> Result<Self, SealError> {
        let resolved = root
            .canonicalize()
            .map_err(|e| SealError::file_read(root, e))?;
        if !resolved.is_dir() {
            return Err(SealError::file_read(
                root,
                std::io::Error::other("not a directory"),
            ));
        }
        Ok(SealRoot {
            nominal: root.to_path_buf(),
            resolved,
        })
    }

    /// The root as given by the caller
    pub fn path(&self) -> &Path {
        &self.nominal
    }

    /// Map a file under this root to its canonical key.
    ///
    /// `path` is expected in the form the walker produces: the nominal root
    /// joined with the relative path.
    pub fn canonical_key(&self, path: &Path) -> Result<String, SealError> {
        let resolved = path
            .canonicalize()
            .map_err(|e| SealError::file_read(path, e))?;
        if !resolved.starts_with(&self.resolved) {
            return Err(SealError::PathOutsideRoot {
                path: path.to_path_buf(),
            });
        }

        let relative = path
            .strip_prefix(&self.nominal)
            .map_err(|_| SealError::PathOutsideRoot {
                path: path.to_path_buf(),
            })?;
        relative_key(relative).map_err(|e| match e {
            KeyError::Escapes => SealError::PathOutsideRoot {
                path: path.to_path_buf(),
            },
            KeyError::NotUtf8 => SealError::UnrepresentablePath {
                path: path.to_path_buf(),
            },
        })
    }
}

enum KeyError {
    Escapes,
    NotUtf8,
}

fn relative_key(relative: &Path) -> Result<String, KeyError> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                segments.push(segment.to_str().ok_or(KeyError::NotUtf8)?);
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(KeyError::Escapes);
            }
        }
    }
    if segments.is_empty() {
        return Err(KeyError::Escapes);
    }
    Ok(segments.join(KEY_SEPARATOR))
}

/// Validate a key read back from a persisted manifest.
///
/// Keys are stored exactly as produced by [`SealRoot::canonical_key`], so
/// anything else is refused rather than rewritten.
pub fn normalize_key(key: &str) -> Result<&str, SealError> {
    if key.is_empty() {
        return Err(SealError::malformed("empty file key"));
    }
    if key.contains('\\') || key.contains('\0') {
        return Err(SealError::malformed(format!(
            "file key contains a forbidden character: {key:?}"
        )));
    }
    let first = key.split(KEY_SEPARATOR).next().unwrap_or_default();
    if key.starts_with(KEY_SEPARATOR) || first.ends_with(':') {
        return Err(SealError::malformed(format!(
            "file key is not relative: {key:?}"
        )));
    }
    for segment in key.split(KEY_SEPARATOR) {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(SealError::malformed(format!(
                "file key is not canonical: {key:?}"
            )));
        }
    }
    Ok(key)
}
