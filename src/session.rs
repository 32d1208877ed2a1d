//! Auth Session - explicit, injected session state
//!
//! A `Session` is created on successful login, handed read-only to the API
//! client, and destroyed on logout. `SessionStore` keeps it on disk so the
//! CLI survives process restarts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// An authenticated session with the challenge backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Bearer token issued by the auth service
    pub token: String,
    /// Who logged in
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_email: user_email.into(),
            created_at: Utc::now(),
        }
    }
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the session to disk
    pub async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)
            .context("Failed to serialize session")?;

        fs::write(&self.path, json).await
            .context("Failed to write session file")?;

        Ok(())
    }

    /// Load the session, if one was saved
    pub async fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path).await
            .context("Failed to read session file")?;

        let session = serde_json::from_str(&json)
            .context("Failed to deserialize session")?;

        Ok(Some(session))
    }

    /// Destroy the persisted session (logout or expiry)
    pub async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_session_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));

        let session = Session::new("jwt-token", "runner@example.com");
        store.save(&session).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_load_without_file() {
        let temp_dir = tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("missing.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_clear() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        store.save(&Session::new("t", "u@example.com")).await.unwrap();
        assert!(path.exists());

        store.clear().await.unwrap();
        assert!(!path.exists());
        assert!(store.load().await.unwrap().is_none());
    }
}
