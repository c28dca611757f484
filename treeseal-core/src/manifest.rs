//! The persisted manifest
//!
//! A manifest is the per-file signature map plus one self-signature over
//! that map. It is written as `signature.json` at the root of the signed
//! folder:
//!
//! ```json
//! {
//!   "root_manifest_signature": "<base64>",
//!   "root_signatures": {
//!     "a.txt": "<base64>",
//!     "sub/b.txt": "<base64>"
//!   }
//! }
//! ```
//!
//! Field order inside the document carries no meaning.

use crate::canonical::normalize_key;
use crate::error::SealError;
use crate::hasher::{self, SealDigest};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the manifest, always directly under the signed root
pub const MANIFEST_FILENAME: &str = "signature.json";

/// Field holding the per-file signatures
pub const ROOT_SIGNATURES_FIELD: &str = "root_signatures";

/// Field holding the self-signature
pub const ROOT_MANIFEST_SIGNATURE_FIELD: &str = "root_manifest_signature";

/// Signed map of canonical keys to base64 signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Signature over the sorted key/signature concatenation (never a map member)
    root_manifest_signature: String,

    /// Per-file signatures keyed by canonical path
    #[serde(deserialize_with = "deserialize_unique_signatures")]
    root_signatures: BTreeMap<String, String>,
}

/// Reads the signature map, rejecting a key that appears twice.
///
/// JSON parsers disagree on which duplicate wins, so a repeated key is
/// treated as a malformed manifest rather than resolved either way.
fn deserialize_unique_signatures<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueKeyVisitor;

    impl<'de> Visitor<'de> for UniqueKeyVisitor {
        type Value = BTreeMap<String, String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of file keys to signatures with no repeated key")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut signatures = BTreeMap::new();
            while let Some((key, signature)) = map.next_entry::<String, String>()? {
                match signatures.entry(key) {
                    Entry::Occupied(entry) => {
                        return Err(de::Error::custom(format!(
                            "duplicate key '{}' in {}",
                            entry.key(),
                            ROOT_SIGNATURES_FIELD
                        )));
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(signature);
                    }
                }
            }
            Ok(signatures)
        }
    }

    deserializer.deserialize_map(UniqueKeyVisitor)
}

impl Manifest {
    pub(crate) fn from_parts(
        root_signatures: BTreeMap<String, String>,
        root_manifest_signature: String,
    ) -> Self {
        Manifest {
            root_manifest_signature,
            root_signatures,
        }
    }

    /// Where the manifest for `root` lives
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILENAME)
    }

    /// The self-signature, base64 encoded
    pub fn self_signature(&self) -> &str {
        &self.root_manifest_signature
    }

    /// Per-file signatures in key order
    pub fn signatures(&self) -> &BTreeMap<String, String> {
        &self.root_signatures
    }

    /// Signature recorded for one key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.root_signatures.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.root_signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_signatures.is_empty()
    }

    /// The digest the self-signature covers
    pub fn self_sign_digest(&self) -> SealDigest {
        hasher::self_sign_digest(
            self.root_signatures
                .iter()
                .map(|(key, signature)| (key.as_str(), signature.as_str())),
        )
    }

    /// Serialize to the persisted JSON form
    pub fn to_json(&self) -> Result<String, SealError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SealError::malformed(format!("failed to serialize manifest: {e}")))
    }

    /// Parse the persisted JSON form, rejecting missing or misshaped fields
    pub fn from_json(content: &str) -> Result<Self, SealError> {
        let manifest: Manifest =
            serde_json::from_str(content).map_err(|e| SealError::malformed(e.to_string()))?;
        for key in manifest.root_signatures.keys() {
            normalize_key(key)?;
        }
        Ok(manifest)
    }

    /// Load `signature.json` from the root of a signed folder
    pub fn load(root: &Path) -> Result<Self, SealError> {
        let manifest_path = Self::path_in(root);
        let content =
            std::fs::read_to_string(&manifest_path).map_err(|e| SealError::ManifestRead {
                path: manifest_path.clone(),
                source: e,
            })?;

        let manifest = Self::from_json(&content)?;
        debug!(
            "Loaded manifest from {} ({} entries)",
            manifest_path.display(),
            manifest.len()
        );
        Ok(manifest)
    }

    /// Write `signature.json` at the root of the signed folder
    pub fn save(&self, root: &Path) -> Result<PathBuf, SealError> {
        let manifest_path = Self::path_in(root);
        let json_content = self.to_json()?;

        std::fs::write(&manifest_path, json_content).map_err(|e| SealError::ManifestWrite {
            path: manifest_path.clone(),
            source: e,
        })?;

        debug!("Wrote manifest to {}", manifest_path.display());
        Ok(manifest_path)
    }
}
