//! treeseal - signed, tamper-evident manifests for directory trees
//!
//! A folder is sealed by signing every file (bound to its relative path),
//! collecting the signatures into `signature.json` at the folder root and
//! signing the sorted key/signature concatenation as well. Verification
//! repeats the same walk and rejects any modified, added or removed file.
//!
//! Design Principles:
//! - All-or-nothing - a failed build never leaves a manifest behind
//! - Symmetric - signer and verifier share one walk and one digest rule
//! - Pluggable crypto - the primitive sits behind `DigestSigner` / `DigestVerifier`

pub mod builder;
pub mod canonical;
pub mod config;
pub mod error;
pub mod hasher;
pub mod keys;
pub mod manifest;
pub mod signer;
pub mod verifier;
pub mod walker;

pub use builder::{build, build_concurrent, sign_folder};
pub use canonical::SealRoot;
pub use config::SealConfig;
pub use error::SealError;
pub use manifest::{Manifest, MANIFEST_FILENAME};
pub use signer::{DigestSigner, DigestVerifier};
pub use verifier::{audit, verify, verify_folder, VerificationReport};
pub use walker::IgnoreSet;
