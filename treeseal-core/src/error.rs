//! Seal error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

/// Every failure a signing or verification run can report.
///
/// A folder either fully verifies or is untrusted: none of these are
/// downgraded to warnings by the library.
#[derive(Error, Debug)]
pub enum SealError {
    /// A private or public key could not be loaded
    #[error("Failed to load key from {path}: {reason}")]
    KeyLoad { path: PathBuf, reason: String },

    /// A file resolves (through symlinks) to a location outside the signed root
    #[error("Path escapes the signed folder: {path}\n\nSymlinks inside a signed folder must resolve to files inside that folder.")]
    PathOutsideRoot { path: PathBuf },

    /// A file or directory vanished or could not be read during the walk
    #[error("Failed to read {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path cannot be expressed as a canonical UTF-8 key
    #[error("Path cannot be represented as a manifest key: {path}")]
    UnrepresentablePath { path: PathBuf },

    /// The persisted manifest is missing a field or has the wrong shape
    #[error("Malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    /// The manifest file could not be read
    #[error("Failed to read manifest from {path}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest file could not be written
    #[error("Failed to write manifest to {path}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest's self-signature does not cover its own file map
    #[error("SECURITY ALERT: manifest self-signature is invalid!\n\nThe list of signed files has been altered or was signed with a different key.")]
    SelfSignatureInvalid,

    /// A file exists on disk that the manifest does not list
    #[error("Unexpected file not covered by the manifest: {key}")]
    UnexpectedFile { key: String },

    /// The manifest lists a file that is not on disk
    #[error("File listed in the manifest is missing: {key}")]
    MissingFile { key: String },

    /// A file's content does not match its signature
    #[error("Signature mismatch for {key}\n\nThis file has been modified since the folder was signed.")]
    SignatureInvalid { key: String },

    /// The configuration file could not be loaded
    #[error("Invalid configuration at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl SealError {
    pub(crate) fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SealError::FileRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        SealError::MalformedManifest {
            reason: reason.into(),
        }
    }

    /// True for failures that mean the tree or manifest was tampered with
    pub fn is_tamper(&self) -> bool {
        matches!(
            self,
            SealError::SelfSignatureInvalid
                | SealError::UnexpectedFile { .. }
                | SealError::MissingFile { .. }
                | SealError::SignatureInvalid { .. }
                | SealError::PathOutsideRoot { .. }
        )
    }

    /// Log security-critical errors on the `security` target
    pub fn log_if_security_critical(&self) {
        if self.is_tamper() {
            tracing::error!(target: "security", "INTEGRITY VIOLATION: {}", self);
        }
    }
}

impl From<walkdir::Error> for SealError {
    fn from(err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let source = match err.into_io_error() {
            Some(io) => io,
            // Only loop detection lands here
            None => std::io::Error::other("symlink loop detected"),
        };
        SealError::FileRead { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tamper_classification() {
        assert!(SealError::SelfSignatureInvalid.is_tamper());
        assert!(SealError::MissingFile { key: "a".into() }.is_tamper());
        assert!(!SealError::malformed("x").is_tamper());
        assert!(!SealError::KeyLoad {
            path: PathBuf::from("k.pem"),
            reason: "bad".into()
        }
        .is_tamper());
    }

    #[test]
    fn test_messages_name_the_key() {
        let err = SealError::SignatureInvalid {
            key: "sub/b.txt".into(),
        };
        assert!(err.to_string().contains("sub/b.txt"));
    }
}
