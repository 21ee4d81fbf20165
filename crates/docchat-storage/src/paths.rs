//! Path utilities for the DocChat state directory.

use anyhow::Result;
use std::path::PathBuf;

const DOCCHAT_DIR: &str = ".docchat";
const STATE_DB_FILE: &str = "state.db";
const LOG_DIR: &str = "logs";

/// Environment variable to override the DocChat directory.
pub const DOCCHAT_DIR_ENV: &str = "DOCCHAT_DIR";

/// Resolve the DocChat state directory.
/// Priority: DOCCHAT_DIR env var > ~/.docchat/
pub fn resolve_docchat_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DOCCHAT_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(DOCCHAT_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the DocChat directory exists and return its path.
pub fn ensure_docchat_dir() -> Result<PathBuf> {
    let dir = resolve_docchat_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the state database path: ~/.docchat/state.db
pub fn state_db_path() -> Result<PathBuf> {
    Ok(ensure_docchat_dir()?.join(STATE_DB_FILE))
}

/// Get the log directory: ~/.docchat/logs
pub fn log_dir() -> Result<PathBuf> {
    let dir = ensure_docchat_dir()?.join(LOG_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
