use std::path::PathBuf;
use tracing::{info, warn};

use crate::models::{AppResult, VisitorCache};

/// The flat JSON file written by sync and served by the local endpoint.
pub struct VisitorCacheService {
    path: PathBuf,
}

impl VisitorCacheService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn write(&self, cache: &VisitorCache) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(cache)?;
        tokio::fs::write(&self.path, json).await?;
        info!(
            path = %self.path.display(),
            today = cache.today.count,
            future = cache.future.count,
            pending = cache.pending.count,
            "visitor cache written"
        );
        Ok(())
    }

    /// The cached data, or the all-empty structure if the file is absent or unreadable.
    pub async fn read(&self) -> VisitorCache {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "visitor cache unreadable");
                }
                return VisitorCache::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "visitor cache corrupt");
            VisitorCache::default()
        })
    }
}
