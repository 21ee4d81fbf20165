//! Persistence for the conversation session id.
//!
//! The backend issues the id in its `meta_info` event; storing it here lets a
//! later `docchat` invocation continue the same conversation.

use crate::{SimpleStorage, define_simple_storage};
use anyhow::Result;
use docchat_core::SessionPersistence;

/// Key under which the current session id is kept.
pub const SESSION_ID_KEY: &str = "rag_session_id";

define_simple_storage! {
    /// Small key-value table for client session state.
    pub struct SessionStateStorage { table: "session_state" }
}

impl SessionStateStorage {
    /// Read a UTF-8 value. Malformed or empty values read as absent.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get_raw(key)?
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|value| !value.is_empty()))
    }

    pub fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.put_raw(key, value.as_bytes())
    }
}

impl SessionPersistence for SessionStateStorage {
    fn load(&self) -> Result<Option<String>> {
        self.get_string(SESSION_ID_KEY)
    }

    fn store(&self, session_id: &str) -> Result<()> {
        self.set_string(SESSION_ID_KEY, session_id)
    }

    fn clear(&self) -> Result<()> {
        self.delete(SESSION_ID_KEY)?;
        Ok(())
    }
}
