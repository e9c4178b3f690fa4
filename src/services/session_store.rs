use chrono::Duration;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::RetryPolicy;
use crate::models::{AppError, AppResult, SessionHandle, SessionInfo};
use crate::services::{Authenticator, BrowserProvider, Clock};

/// Outcome of the most recent creation attempt, guarded by the creation lock.
#[derive(Default)]
struct Creation {
    generation: u64,
    last_failure: Option<AppError>,
}

/// Holds the one authenticated vendor session this process works with.
///
/// Creation is single-flight: callers arriving while a session is being created
/// wait on `creating` and then pick up the session the first caller cached, or
/// the error it failed with.
pub struct SessionStore {
    provider: Arc<dyn BrowserProvider>,
    authenticator: Arc<Authenticator>,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<SessionHandle>>,
    creating: Mutex<Creation>,
    /// Mirrors `Creation::generation` so callers can note it before queueing.
    generation: AtomicU64,
    ttl: Duration,
    buffer: Duration,
    retry: RetryPolicy,
}

impl SessionStore {
    pub fn new(
        provider: Arc<dyn BrowserProvider>,
        authenticator: Arc<Authenticator>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        buffer: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            authenticator,
            clock,
            cache: RwLock::new(None),
            creating: Mutex::new(Creation::default()),
            generation: AtomicU64::new(0),
            ttl,
            buffer,
            retry,
        }
    }

    async fn cached_valid(&self) -> Option<SessionHandle> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|handle| handle.authenticated && handle.is_fresh(self.clock.now(), self.buffer))
            .cloned()
    }

    pub async fn get_session(&self) -> AppResult<SessionHandle> {
        if let Some(handle) = self.cached_valid().await {
            return Ok(handle);
        }

        let seen = self.generation.load(Ordering::Acquire);
        let mut creation = self.creating.lock().await;
        if let Some(handle) = self.cached_valid().await {
            debug!(session = %handle.id, "reusing session created while waiting");
            return Ok(handle);
        }
        if creation.generation != seen {
            if let Some(failure) = &creation.last_failure {
                debug!(error = %failure, "session creation failed while waiting");
                return Err(failure.replay());
            }
        }

        let result = self.create().await;
        creation.generation += 1;
        creation.last_failure = result.as_ref().err().map(AppError::replay);
        self.generation.store(creation.generation, Ordering::Release);
        result
    }

    /// Replaces the cached session with a freshly allocated, authenticated one.
    /// Callers hold the creation lock.
    async fn create(&self) -> AppResult<SessionHandle> {
        let stale = self.cache.write().await.take();
        if let Some(stale) = stale {
            info!(session = %stale.id, "replacing expiring vendor session");
            self.release(&stale).await;
        }

        let handle = self.allocate().await?;
        *self.cache.write().await = Some(handle.clone());

        match self.authenticator.authenticate(&handle).await {
            Ok(()) => {
                let mut cache = self.cache.write().await;
                let mut authenticated = handle;
                authenticated.authenticated = true;
                *cache = Some(authenticated.clone());
                info!(session = %authenticated.id, "vendor session ready");
                Ok(authenticated)
            }
            Err(e) => {
                error!(session = %handle.id, error = %e, "vendor authentication failed");
                self.cache.write().await.take();
                self.release(&handle).await;
                Err(e)
            }
        }
    }

    /// Allocates an unauthenticated remote session, backing off while the provider throttles.
    pub async fn allocate(&self) -> AppResult<SessionHandle> {
        let mut attempt = 0;
        loop {
            match self.provider.create_session().await {
                Ok(remote) => {
                    return Ok(SessionHandle::new(remote, self.clock.now(), self.ttl));
                }
                Err(AppError::RateLimited) if attempt + 1 < self.retry.max_attempts => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        "session allocation attempt {} rate limited, retrying in {}ms",
                        attempt + 1,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts = attempt + 1, error = %e, "session allocation failed");
                    return Err(e);
                }
            }
        }
    }

    /// Installs a session that was authenticated outside `get_session` (OTP login).
    pub async fn adopt(&self, mut handle: SessionHandle) {
        let _creating = self.creating.lock().await;
        handle.authenticated = true;
        let previous = self.cache.write().await.replace(handle);
        if let Some(previous) = previous {
            self.release(&previous).await;
        }
    }

    pub async fn close_session(&self) -> AppResult<()> {
        let _creating = self.creating.lock().await;
        let handle = self.cache.write().await.take();
        match handle {
            Some(handle) => {
                self.provider.close_session(&handle).await?;
                info!(session = %handle.id, "vendor session closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Drops the cached session if it is still `session_id`, e.g. after the vendor logged it out.
    pub async fn invalidate(&self, session_id: &str) {
        let handle = {
            let mut cache = self.cache.write().await;
            match cache.as_ref() {
                Some(handle) if handle.id == session_id => cache.take(),
                _ => None,
            }
        };
        if let Some(handle) = handle {
            warn!(session = %handle.id, "invalidating vendor session");
            self.release(&handle).await;
        }
    }

    pub async fn session_info(&self) -> SessionInfo {
        let cache = self.cache.read().await;
        let Some(handle) = cache.as_ref() else {
            return SessionInfo::absent();
        };
        let now = self.clock.now();
        SessionInfo {
            exists: true,
            valid: handle.is_fresh(now, self.buffer),
            authenticated: handle.authenticated,
            id: Some(handle.id.clone()),
            created_at: Some(handle.created_at),
            expires_at: Some(handle.expires_at),
            remaining_ms: handle.remaining(now).num_milliseconds(),
        }
    }

    pub async fn release(&self, handle: &SessionHandle) {
        if let Err(e) = self.provider.close_session(handle).await {
            warn!(session = %handle.id, error = %e, "failed to release remote session");
        }
    }
}
