use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{AppError, AppResult, SessionHandle};
use crate::services::Clock;

struct PendingLogin {
    session: SessionHandle,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Logins paused on the vendor's OTP screen, keyed by an id handed to the caller.
///
/// Entries live in this process only: a restart, or a second instance behind a
/// load balancer, will not find them and the caller has to start the login over.
pub struct PendingAuthStore {
    entries: Mutex<HashMap<String, PendingLogin>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PendingAuthStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    pub async fn insert(&self, session: SessionHandle) -> String {
        let id = Uuid::new_v4().to_string();
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        entries.insert(
            id.clone(),
            PendingLogin {
                session,
                created_at: now,
                expires_at: now + self.ttl,
            },
        );
        id
    }

    pub async fn take(&self, id: &str) -> AppResult<SessionHandle> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match entries.remove(id) {
            Some(pending) if now < pending.expires_at => Ok(pending.session),
            Some(pending) => {
                // Expired; hand it back so the caller can still close it.
                entries.insert(id.to_string(), pending);
                Err(AppError::AuthError(
                    "OTP login expired, start the login again".to_string(),
                ))
            }
            None => Err(AppError::AuthError(format!("No pending OTP login with id {}", id))),
        }
    }

    /// The most recently started login that has not expired.
    pub async fn take_latest(&self) -> AppResult<(String, SessionHandle)> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let latest = entries
            .iter()
            .filter(|(_, pending)| now < pending.expires_at)
            .max_by_key(|(_, pending)| pending.created_at)
            .map(|(id, _)| id.clone());

        match latest.and_then(|id| entries.remove(&id).map(|pending| (id, pending.session))) {
            Some(found) => Ok(found),
            None => Err(AppError::AuthError(
                "No pending OTP login, start the login again".to_string(),
            )),
        }
    }

    /// Removes expired entries and returns their sessions for teardown.
    pub async fn purge_expired(&self) -> Vec<SessionHandle> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, pending)| now >= pending.expires_at)
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| entries.remove(&id).map(|pending| pending.session))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
