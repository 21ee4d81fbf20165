//! DocChat Storage - local client state
//!
//! Uses redb as an embedded database at `~/.docchat/state.db` (or under
//! `DOCCHAT_DIR`).
//!
//! # Tables
//!
//! - `session_state` - Conversation session id

pub mod paths;
pub mod session_state;
mod simple_storage;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use session_state::{SESSION_ID_KEY, SessionStateStorage};
pub use simple_storage::SimpleStorage;

/// Opens the state database and its tables.
pub struct Storage {
    pub session_state: SessionStateStorage,
}

impl Storage {
    /// Create or open the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Arc::new(Database::create(path)?);
        tracing::debug!(path = %path.display(), "Opened state database");

        Ok(Self {
            session_state: SessionStateStorage::new(db)?,
        })
    }

    /// Open the database at the default location.
    pub fn open_default() -> Result<Self> {
        Self::new(paths::state_db_path()?)
    }
}
