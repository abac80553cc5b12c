use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$MIET_HOME`, or `~/.miet`.
pub fn miet_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MIET_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".miet"))
}

pub fn ensure_miet_home() -> Result<PathBuf> {
    let dir = miet_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(miet_home()?.join("config.toml"))
}
