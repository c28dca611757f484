//! Seal CLI commands
//!
//! Provides the user interface for sealing folders: sign, verify, inspect

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use treeseal_core::{
    audit, build, build_concurrent, keys, verify, IgnoreSet, Manifest, SealConfig,
};

#[derive(Parser, Debug)]
pub enum SealCommand {
    /// Sign every file in a folder and write signature.json at its root
    Sign {
        /// Path to the PKCS#8 PEM private key (default: ../private_key.pem)
        #[clap(short = 'k', long = "private")]
        private_key: Option<PathBuf>,

        /// Folder to sign
        #[clap(short = 'f', long, default_value = ".")]
        folder: PathBuf,

        /// Sub-folder names to skip, e.g. caches deleted on restart (default: __pycache__)
        #[clap(short = 'i', long, num_args = 1..)]
        ignore: Vec<String>,

        /// Password of the private key, if it has one
        #[clap(short = 'w', long, default_value = "")]
        password: String,

        /// Hash and sign files in parallel
        #[clap(long)]
        parallel: bool,
    },

    /// Check a folder against its signature.json
    Verify {
        /// Path to the SPKI PEM public key (default: ../public_key.pem)
        #[clap(short = 'p', long = "public")]
        public_key: Option<PathBuf>,

        /// Folder to verify
        #[clap(short = 'f', long, default_value = ".")]
        folder: PathBuf,

        /// Sub-folder names to skip (default: __pycache__)
        #[clap(short = 'i', long, num_args = 1..)]
        ignore: Vec<String>,

        /// Report every discrepancy instead of stopping at the first
        #[clap(long)]
        all: bool,
    },

    /// List the entries of a folder's signature.json
    Inspect {
        /// Folder containing signature.json
        #[clap(short = 'f', long, default_value = ".")]
        folder: PathBuf,

        /// Show signatures next to the file names
        #[clap(long)]
        signatures: bool,
    },
}

impl SealCommand {
    /// Execute the seal command
    pub async fn execute(&self, config: &SealConfig) -> Result<()> {
        match self {
            SealCommand::Sign {
                private_key,
                folder,
                ignore,
                password,
                parallel,
            } => {
                let key_path = config.private_key_path(private_key.as_deref());
                let ignore = config.ignore_set(ignore);
                sign_command(&key_path, folder, &ignore, password, *parallel).await
            }
            SealCommand::Verify {
                public_key,
                folder,
                ignore,
                all,
            } => {
                let key_path = config.public_key_path(public_key.as_deref());
                let ignore = config.ignore_set(ignore);
                verify_command(&key_path, folder, &ignore, *all)
            }
            SealCommand::Inspect { folder, signatures } => inspect_command(folder, *signatures),
        }
    }
}

/// Sign a folder
async fn sign_command(
    key_path: &Path,
    folder: &Path,
    ignore: &IgnoreSet,
    password: &str,
    parallel: bool,
) -> Result<()> {
    let signing_key = keys::load_private_key(key_path, Some(password))
        .context("Cannot sign without a private key")?;

    let manifest = if parallel {
        build_concurrent(folder, ignore, Arc::new(signing_key)).await
    } else {
        build(folder, ignore, &signing_key)
    }
    .inspect_err(|e| e.log_if_security_critical())
    .with_context(|| format!("Couldn't sign folder '{}'", folder.display()))?;

    let written = manifest
        .save(folder)
        .with_context(|| format!("Couldn't sign folder '{}'", folder.display()))?;

    info!("Signed folder '{}'", folder.display());
    println!(
        "✅ Signed {} files, manifest written to {}",
        manifest.len(),
        written.display()
    );
    Ok(())
}

/// Verify a folder
fn verify_command(key_path: &Path, folder: &Path, ignore: &IgnoreSet, all: bool) -> Result<()> {
    let verifying_key = keys::load_public_key(key_path)
        .context("Cannot verify without a public key")?;
    let manifest = Manifest::load(folder)?;

    if !all {
        verify(folder, ignore, &manifest, &verifying_key)
            .with_context(|| format!("Folder '{}' is NOT trusted", folder.display()))?;
        println!("✅ Folder '{}' verified ({} files)", folder.display(), manifest.len());
        return Ok(());
    }

    let report = audit(folder, ignore, &manifest, &verifying_key)
        .with_context(|| format!("Folder '{}' is NOT trusted", folder.display()))?;

    if report.is_trusted() {
        println!("✅ Folder '{}' verified ({} files)", folder.display(), manifest.len());
        return Ok(());
    }

    for key in &report.unexpected {
        println!("  + {key} (not in manifest)");
    }
    for key in &report.missing {
        println!("  - {key} (missing)");
    }
    for key in &report.invalid {
        println!("  ! {key} (modified)");
    }
    error!(
        "Folder '{}' failed verification: {} unexpected, {} missing, {} modified",
        folder.display(),
        report.unexpected.len(),
        report.missing.len(),
        report.invalid.len()
    );
    bail!("❌ Folder '{}' is NOT trusted", folder.display())
}

/// Show a folder's manifest without verifying it
fn inspect_command(folder: &Path, signatures: bool) -> Result<()> {
    let manifest = Manifest::load(folder)?;

    println!("📄 {}", Manifest::path_in(folder).display());
    println!("   {} entries (not verified)", manifest.len());
    for (key, signature) in manifest.signatures() {
        if signatures {
            println!("   {key}  {signature}");
        } else {
            println!("   {key}");
        }
    }
    if signatures {
        println!("   self-signature: {}", manifest.self_signature());
    }
    Ok(())
}
