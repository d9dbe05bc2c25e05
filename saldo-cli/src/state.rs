use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$SALDO_HOME`, else `~/.saldo`
pub fn saldo_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("SALDO_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".saldo"))
}

pub fn ensure_saldo_home() -> Result<PathBuf> {
    let dir = saldo_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_ledger_path() -> Result<PathBuf> {
    Ok(ensure_saldo_home()?.join("ledger.json"))
}
