//! Environment readiness check.

use crate::config::{PASSWORD_VAR, USER_ID_VAR};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Check Chromium, secrets, the data directory, and the formatter toolchain.
pub async fn run(data_dir: Option<&Path>) -> Result<()> {
    println!("LMS Scraper Doctor");
    println!("==================");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let chromium_path = find_chromium(None);
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!("[!!] Chromium NOT found. Install Chrome or set LMS_CHROMIUM_PATH."),
    }

    let mut secrets_ok = true;
    for name in [USER_ID_VAR, PASSWORD_VAR] {
        if secret_present(name) {
            println!("[OK] {name} is set");
        } else {
            secrets_ok = false;
            println!("[!!] {name} is NOT set (export it or add it to .env)");
        }
    }

    let data_dir = data_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("LMS_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(crate::config::DEFAULT_DATA_DIR));
    match writable_dir(&data_dir) {
        Some(dir) => println!("[OK] Output directory {} is writable", dir.display()),
        None => println!("[!!] Output directory {} is not writable", data_dir.display()),
    }

    match which::which("yarn") {
        Ok(path) => println!("[OK] yarn found: {}", path.display()),
        Err(_) => println!("[??] yarn not found; formatting will be skipped"),
    }

    println!();
    if chromium_path.is_some() && secrets_ok {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}

fn secret_present(name: &str) -> bool {
    std::env::var(name)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}

/// The directory itself if it exists and is writable, or the nearest
/// existing ancestor that would let it be created.
fn writable_dir(dir: &Path) -> Option<PathBuf> {
    let existing = dir.ancestors().find(|p| p.exists())?;
    let metadata = std::fs::metadata(existing).ok()?;
    if metadata.is_dir() && !metadata.permissions().readonly() {
        Some(existing.to_path_buf())
    } else {
        None
    }
}
