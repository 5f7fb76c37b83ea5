//! Durable storage for the access/refresh credential pair.
//!
//! Both tokens are persisted together in a single JSON file so readers can
//! never observe one half of a pair. Each entry carries its own absolute
//! expiration; an entry past its expiration reads as absent.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Credential file name in the store directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Default storage lifetime for the access token (1 day)
pub const ACCESS_TTL_DAYS: i64 = 1;

/// Default storage lifetime for the refresh token (7 days)
pub const REFRESH_TTL_DAYS: i64 = 7;

/// The two bearer secrets, as returned by the provider's token endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredEntry {
    fn live_value(&self) -> Option<&str> {
        (Utc::now() <= self.expires_at).then_some(self.value.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPair {
    access: StoredEntry,
    refresh: StoredEntry,
}

/// File-backed store for the credential pair.
///
/// Only the session controller writes here; everything else reads.
pub struct CredentialStore {
    store_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(store_dir: PathBuf) -> Self {
        Self { store_dir }
    }

    /// Read the stored pair. Returns `None` when the file is missing,
    /// unreadable, or either entry has passed its expiration.
    pub fn get(&self) -> Option<CredentialPair> {
        let contents = std::fs::read_to_string(self.credentials_path()).ok()?;
        let stored: StoredPair = match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Credential file is corrupt, ignoring");
                return None;
            }
        };

        let access = stored.access.live_value()?;
        let refresh = stored.refresh.live_value()?;
        Some(CredentialPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        })
    }

    /// The live access token alone, ignoring the refresh entry's state.
    pub fn access_token(&self) -> Option<String> {
        let contents = std::fs::read_to_string(self.credentials_path()).ok()?;
        let stored: StoredPair = serde_json::from_str(&contents).ok()?;
        stored.access.live_value().map(str::to_string)
    }

    /// The refresh token alone, for renewal after the access entry lapsed.
    pub fn refresh_token(&self) -> Option<String> {
        let contents = std::fs::read_to_string(self.credentials_path()).ok()?;
        let stored: StoredPair = serde_json::from_str(&contents).ok()?;
        stored.refresh.live_value().map(str::to_string)
    }

    /// Persist both credentials with independent expirations.
    pub fn set(&self, pair: &CredentialPair, access_ttl: Duration, refresh_ttl: Duration) -> Result<()> {
        let now = Utc::now();
        let stored = StoredPair {
            access: StoredEntry {
                value: pair.access.clone(),
                expires_at: now + access_ttl,
            },
            refresh: StoredEntry {
                value: pair.refresh.clone(),
                expires_at: now + refresh_ttl,
            },
        };

        let path = self.credentials_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create credential store directory")?;
        }
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&path, contents).context("Failed to write credential file")?;

        // Bearer secrets: owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict credential file permissions")?;
        }

        Ok(())
    }

    /// Remove both credentials. Idempotent.
    pub fn clear(&self) -> Result<()> {
        let path = self.credentials_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove credential file")?;
        }
        Ok(())
    }

    fn credentials_path(&self) -> PathBuf {
        self.store_dir.join(CREDENTIALS_FILE)
    }
}

// ============================================================================
// Tests
// ============================================================================
