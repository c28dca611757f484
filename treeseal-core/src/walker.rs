//! Tree enumeration shared by the builder and the verifier
//!
//! Both sides must see exactly the same set of files, so there is only one
//! walk: symlinks followed, ignored directory subtrees pruned, the root-level
//! manifest skipped.

use crate::canonical::SealRoot;
use crate::error::SealError;
use crate::manifest::MANIFEST_FILENAME;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Directory basenames excluded from signing and verification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
}

impl IgnoreSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IgnoreSet {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        IgnoreSet::new(iter)
    }
}

/// A file found under the root, with its canonical key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub key: String,
    pub path: PathBuf,
}

/// Enumerate every file that belongs in the manifest, sorted by key
pub fn walk_files(root: &SealRoot, ignore: &IgnoreSet) -> Result<Vec<TreeFile>, SealError> {
    let walker = WalkDir::new(root.path())
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let pruned = entry.depth() > 0
                && entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| ignore.contains(name));
            if pruned {
                debug!("Skipping ignored folder {}", entry.path().display());
            }
            !pruned
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            return Err(SealError::file_read(
                entry.path(),
                std::io::Error::other("unsupported file type"),
            ));
        }
        if entry.depth() == 1 && entry.file_name() == MANIFEST_FILENAME {
            trace!("Skipping manifest file {}", entry.path().display());
            continue;
        }

        let key = root.canonical_key(entry.path())?;
        files.push(TreeFile {
            key,
            path: entry.into_path(),
        });
    }

    files.sort_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
    debug!(
        "Found {} files under {}",
        files.len(),
        root.path().display()
    );
    Ok(files)
}
