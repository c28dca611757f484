//! Test helper functions for integration tests
//!
//! Shared across the test files in this directory using the tests/common/
//! pattern.

#![allow(dead_code)]

use anyhow::Result;
use ed25519_dalek::{SigningKey, VerifyingKey};
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Deterministic key pair derived from a one-byte seed
pub fn key_pair(seed: u8) -> (SigningKey, VerifyingKey) {
    let signing = SigningKey::from_bytes(&[seed; 32]);
    let verifying = signing.verifying_key();
    (signing, verifying)
}

/// Write `files` (relative path, contents) under `root`
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (relative, contents) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }
    Ok(())
}

/// A small plugin-like folder: `a.txt`, `sub/b.txt`, and a cache folder
pub fn plugin_tree() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    write_tree(
        temp_dir.path(),
        &[
            ("a.txt", "x"),
            ("sub/b.txt", "y"),
            ("plugin.json", r#"{"name": "TestPlugin", "version": "1.0.0"}"#),
            ("src/__init__.py", "from . import TestPlugin\n"),
            ("src/__pycache__/TestPlugin.cpython-312.pyc", "\u{0}cache"),
        ],
    )?;
    Ok(temp_dir)
}
