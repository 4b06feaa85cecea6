//! Persisted session slot.
//!
//! At most one bearer token is held per client instance, in a single-slot
//! store that survives process restart (the cookie equivalent of the web
//! client). `load` lazily invalidates: an undecodable or expired token is
//! cleared on read and never served.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The persisted artifact: the raw token plus the cookie-style expiry
/// mirroring the token's own `exp` claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookieSlot {
    expires_at: DateTime<Utc>,
    token: String,
}

/// Injectable single-slot token store.
///
/// Writes only happen from the auth state machine; reads are idempotent with
/// self-healing invalidation, so a stale read degrades to "logged out".
pub trait SessionStore: Send + Sync {
    /// Persist the token with an explicit expiry.
    fn save(&self, raw_token: &str, expires_at: DateTime<Utc>) -> Result<(), SessionError>;

    /// Read the persisted token, clearing the slot if it no longer decodes
    /// to an unexpired set of claims.
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Remove the persisted token unconditionally.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Decide whether a persisted slot is still servable. `None` means the
/// caller must clear the slot.
fn validate_slot(slot: &CookieSlot, now: DateTime<Utc>) -> Option<String> {
    match token::decode(&slot.token) {
        Ok(claims) if !claims.is_expired(now) => Some(slot.token.clone()),
        Ok(_) => {
            tracing::debug!("Persisted token expired");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "Persisted token failed to decode");
            None
        }
    }
}

/// File-backed store: one JSON document at a fixed path.
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    /// Place the cookie file inside the given data directory.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, SessionError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        Ok(Self {
            path: data_dir.as_ref().join("auth_token.json"),
        })
    }
}

impl SessionStore for CookieFile {
    fn save(&self, raw_token: &str, expires_at: DateTime<Utc>) -> Result<(), SessionError> {
        let slot = CookieSlot {
            expires_at,
            token: raw_token.to_string(),
        };
        std::fs::write(&self.path, serde_json::to_vec(&slot)?)?;
        tracing::debug!(expires_at = %expires_at, "Saved session token");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, SessionError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // A slot we cannot parse is treated the same as an invalid token.
        let valid = serde_json::from_slice::<CookieSlot>(&bytes)
            .ok()
            .and_then(|slot| validate_slot(&slot, Utc::now()));

        match valid {
            Some(token) => Ok(Some(token)),
            None => {
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Cleared session token");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<CookieSlot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, raw_token: &str, expires_at: DateTime<Utc>) -> Result<(), SessionError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(CookieSlot {
            expires_at,
            token: raw_token.to_string(),
        });
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, SessionError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        let valid = slot
            .as_ref()
            .and_then(|s| validate_slot(s, Utc::now()));
        if valid.is_none() {
            *slot = None;
        }
        Ok(valid)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mint_token;
    use tempfile::TempDir;

    fn setup_store() -> (CookieFile, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CookieFile::open(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_save_and_load() {
        let (store, _temp) = setup_store();
        let exp = Utc::now().timestamp() + 3600;
        let token = mint_token("a@b.com", exp);

        store
            .save(&token, DateTime::from_timestamp(exp, 0).unwrap())
            .unwrap();

        assert_eq!(store.load().unwrap(), Some(token));
    }

    #[test]
    fn test_load_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let exp = Utc::now().timestamp() + 3600;
        let token = mint_token("a@b.com", exp);

        {
            let store = CookieFile::open(temp_dir.path()).unwrap();
            store
                .save(&token, DateTime::from_timestamp(exp, 0).unwrap())
                .unwrap();
        }

        let store = CookieFile::open(temp_dir.path()).unwrap();
        assert_eq!(store.load().unwrap(), Some(token));
    }

    #[test]
    fn test_expired_token_self_clears() {
        let (store, temp) = setup_store();
        let exp = Utc::now().timestamp() - 10;
        let token = mint_token("a@b.com", exp);

        store
            .save(&token, DateTime::from_timestamp(exp, 0).unwrap())
            .unwrap();

        assert_eq!(store.load().unwrap(), None);
        // No persisted artifact remains
        assert!(!temp.path().join("auth_token.json").exists());
    }

    #[test]
    fn test_undecodable_token_self_clears() {
        let (store, temp) = setup_store();
        store
            .save("not-a-token", Utc::now() + chrono::Duration::hours(1))
            .unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(!temp.path().join("auth_token.json").exists());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, _temp) = setup_store();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store_lazy_invalidation() {
        let store = MemoryStore::new();
        let exp = Utc::now().timestamp() - 10;
        let token = mint_token("a@b.com", exp);

        store
            .save(&token, DateTime::from_timestamp(exp, 0).unwrap())
            .unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
