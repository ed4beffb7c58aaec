//! Token storage abstraction.
//!
//! The session is a single opaque bearer token. Every backend stores it under
//! the same fixed key so switching backends never leaves two live sessions.

use std::sync::RwLock;

use anyhow::Result;

/// Fixed storage key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Durable home of the current bearer token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token. Never fails: storage errors read as `None`.
    fn get(&self) -> Option<String>;

    /// Persist a token, replacing any previous one.
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the persisted token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;

    fn has_token(&self) -> bool {
        self.get().is_some()
    }
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
