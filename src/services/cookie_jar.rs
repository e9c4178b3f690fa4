use std::path::PathBuf;
use tracing::{debug, warn};

use crate::models::{AppResult, AuthState};

/// Vendor auth state persisted between logins.
pub struct CookieJar {
    path: PathBuf,
}

impl CookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `None` when nothing usable is on disk. A corrupt file is logged, not fatal.
    pub async fn load(&self) -> AppResult<Option<AuthState>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<AuthState>(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable auth state");
                Ok(None)
            }
        }
    }

    pub async fn save(&self, state: &AuthState) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, json).await?;
        debug!(path = %self.path.display(), cookies = state.cookies.len(), "auth state saved");
        Ok(())
    }

    pub async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
