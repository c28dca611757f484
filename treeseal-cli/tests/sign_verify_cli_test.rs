//! Integration tests for the `treeseal` binary
//!
//! Each test runs the real binary against a temporary folder with keys
//! written next to it, mirroring the default `../private_key.pem` layout.

use anyhow::{anyhow, Result};
use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::SigningKey;
use pkcs8::pkcs5::pbes2;
use pkcs8::{LineEnding, PrivateKeyInfo};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
    folder: PathBuf,
    config: PathBuf,
}

/// `<tmp>/private_key.pem`, `<tmp>/public_key.pem`, `<tmp>/plugin/...`
fn workspace() -> Result<Workspace> {
    let dir = TempDir::new()?;
    let root = dir.path().to_path_buf();
    let folder = root.join("plugin");
    fs::create_dir_all(folder.join("sub"))?;
    fs::create_dir_all(folder.join("__pycache__"))?;
    fs::write(folder.join("a.txt"), "x")?;
    fs::write(folder.join("sub/b.txt"), "y")?;
    fs::write(folder.join("__pycache__/a.pyc"), "cache")?;

    let signing = SigningKey::from_bytes(&[42; 32]);
    fs::write(
        root.join("private_key.pem"),
        signing.to_pkcs8_pem(LineEnding::LF)?.as_bytes(),
    )?;
    fs::write(
        root.join("public_key.pem"),
        signing.verifying_key().to_public_key_pem(LineEnding::LF)?,
    )?;

    // Keep any user-level configuration out of the tests
    let config = root.join("config.yml");
    fs::write(&config, "")?;

    Ok(Workspace {
        _dir: dir,
        root,
        folder,
        config,
    })
}

fn treeseal(cwd: &Path, config: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_treeseal"))
        .arg("--config")
        .arg(config)
        .args(args)
        .current_dir(cwd)
        .output()?;
    Ok(output)
}

#[test]
fn test_sign_with_defaults_then_verify() -> Result<()> {
    let ws = workspace()?;

    // Defaults: key at ../private_key.pem, folder ".", ignore __pycache__
    let output = treeseal(&ws.folder, &ws.config, &["sign"])?;
    assert!(
        output.status.success(),
        "sign failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(ws.folder.join("signature.json").exists());

    let output = treeseal(&ws.folder, &ws.config, &["verify"])?;
    assert!(
        output.status.success(),
        "verify failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(())
}

#[test]
fn test_verify_fails_after_tamper() -> Result<()> {
    let ws = workspace()?;
    let folder = ws.folder.to_string_lossy().to_string();
    let private = ws.root.join("private_key.pem").to_string_lossy().to_string();
    let public = ws.root.join("public_key.pem").to_string_lossy().to_string();

    let output = treeseal(&ws.root, &ws.config, &["sign", "-k", &private, "-f", &folder])?;
    assert!(output.status.success());

    fs::write(ws.folder.join("a.txt"), "xx")?;
    let output = treeseal(&ws.root, &ws.config, &["verify", "-p", &public, "-f", &folder])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("a.txt"), "stderr did not name the file: {stderr}");
    Ok(())
}

#[test]
fn test_verify_all_lists_every_problem() -> Result<()> {
    let ws = workspace()?;
    let output = treeseal(&ws.folder, &ws.config, &["sign", "--parallel"])?;
    assert!(output.status.success());

    fs::write(ws.folder.join("extra.txt"), "e")?;
    fs::remove_file(ws.folder.join("sub/b.txt"))?;
    let output = treeseal(&ws.folder, &ws.config, &["verify", "--all"])?;
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("extra.txt"));
    assert!(stdout.contains("sub/b.txt"));
    Ok(())
}

#[test]
fn test_sign_fails_without_key() -> Result<()> {
    let ws = workspace()?;
    let output = treeseal(
        &ws.folder,
        &ws.config,
        &["sign", "-k", "/no/such/private_key.pem"],
    )?;
    assert!(!output.status.success());
    assert!(!ws.folder.join("signature.json").exists());
    Ok(())
}

#[test]
fn test_ignore_flag_overrides_default() -> Result<()> {
    let ws = workspace()?;
    fs::create_dir_all(ws.folder.join("build"))?;
    fs::write(ws.folder.join("build/out.bin"), "o")?;

    let output = treeseal(&ws.folder, &ws.config, &["sign", "-i", "build", "__pycache__"])?;
    assert!(output.status.success());
    fs::write(ws.folder.join("build/other.bin"), "changed")?;

    let output = treeseal(&ws.folder, &ws.config, &["verify", "-i", "build", "__pycache__"])?;
    assert!(output.status.success());

    // With only the default ignore set, build/ counts again
    let output = treeseal(&ws.folder, &ws.config, &["verify"])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_inspect_lists_keys() -> Result<()> {
    let ws = workspace()?;
    let output = treeseal(&ws.folder, &ws.config, &["sign"])?;
    assert!(output.status.success());

    let output = treeseal(&ws.folder, &ws.config, &["inspect"])?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a.txt"));
    assert!(stdout.contains("sub/b.txt"));
    assert!(!stdout.contains("a.pyc"));
    Ok(())
}

#[test]
fn test_sign_with_password_protected_key() -> Result<()> {
    let ws = workspace()?;
    let signing = SigningKey::from_bytes(&[42; 32]);
    let der = signing.to_pkcs8_der()?;
    let info = PrivateKeyInfo::try_from(der.as_bytes())?;
    let iv = [3u8; 16];
    let params = pbes2::Parameters::pbkdf2_sha256_aes256cbc(2048, b"treeseal-cli", &iv)
        .map_err(|e| anyhow!("pbes2 parameters: {e}"))?;
    let encrypted = info.encrypt_with_params(params, "s3cret")?;
    let locked = ws.root.join("locked_key.pem");
    fs::write(
        &locked,
        encrypted.to_pem("ENCRYPTED PRIVATE KEY", LineEnding::LF)?.as_bytes(),
    )?;
    let locked = locked.to_string_lossy().to_string();

    // Without the password the key cannot be decrypted
    let output = treeseal(&ws.folder, &ws.config, &["sign", "-k", &locked])?;
    assert!(!output.status.success());
    assert!(!ws.folder.join("signature.json").exists());

    let output = treeseal(&ws.folder, &ws.config, &["sign", "-k", &locked, "-w", "wrong"])?;
    assert!(!output.status.success());

    let output = treeseal(&ws.folder, &ws.config, &["sign", "-k", &locked, "-w", "s3cret"])?;
    assert!(
        output.status.success(),
        "sign failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // Same key pair as the plain PEM, so the default public key verifies it
    let output = treeseal(&ws.folder, &ws.config, &["verify"])?;
    assert!(output.status.success());
    Ok(())
}
