//! Login credentials and the on-disk session cache
//!
//! A successful certificate login yields a session token that stays valid
//! for several hours. The token is cached under the session directory so
//! repeated `track` runs do not log in every time.

use super::ExchangeError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";

/// Contents of the login file
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Optional CA bundle for the identity endpoint
    #[serde(default, rename = "rootcapath")]
    pub root_ca_path: Option<PathBuf>,
    /// Client certificate registered with the account (PEM)
    #[serde(rename = "certpath")]
    pub cert_path: PathBuf,
    /// Private key for the client certificate (PKCS#8 PEM)
    #[serde(rename = "keypath")]
    pub key_path: PathBuf,
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from a JSON login file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExchangeError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A session token and the time it stops being accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(rename = "sessionkey")]
    pub key: String,
    #[serde(rename = "expiresat")]
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Token issued at `now`, valid for `lifetime`
    pub fn issued(key: impl Into<String>, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            key: key.into(),
            expires_at: now + lifetime,
        }
    }

    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Session token cache kept in a directory on disk
#[derive(Debug, Clone)]
pub struct SessionCache {
    dir: PathBuf,
    lifetime: Duration,
}

impl SessionCache {
    /// Create a cache in `dir` for tokens living `lifetime`
    pub fn new(dir: impl Into<PathBuf>, lifetime: Duration) -> Self {
        Self {
            dir: dir.into(),
            lifetime,
        }
    }

    /// `~/.betfair`, or `./.betfair` when no home directory is known
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".betfair")
    }

    /// Path of the cached session file
    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Lifetime given to newly issued tokens
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Return the cached token if one exists and is still valid at `now`
    pub fn read_valid(&self, now: DateTime<Utc>) -> Option<SessionToken> {
        let content = std::fs::read_to_string(self.path()).ok()?;
        let token: SessionToken = match serde_json::from_str(&content) {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable session cache");
                return None;
            }
        };

        if token.is_valid_at(now) {
            Some(token)
        } else {
            tracing::debug!(expires_at = %token.expires_at, "Cached session expired");
            None
        }
    }

    /// Cache a freshly issued token.
    ///
    /// Failures only cost another login on the next run, so they are logged
    /// and otherwise ignored.
    pub fn store(&self, token: &SessionToken) {
        if let Err(e) = self.try_store(token) {
            tracing::warn!(error = %e, path = ?self.path(), "Failed to cache session token");
        }
    }

    fn try_store(&self, token: &SessionToken) -> Result<(), ExchangeError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(token)?;
        std::fs::write(self.path(), json)?;
        Ok(())
    }
}
