use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A browser session as allocated by the remote provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    pub id: String,
    /// Endpoint accepting further browser commands for this session.
    pub connect_url: String,
    /// Endpoint that tears the session down.
    pub stop_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub id: String,
    pub connect_url: String,
    pub stop_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub authenticated: bool,
}

impl SessionHandle {
    pub fn new(remote: RemoteSession, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: remote.id,
            connect_url: remote.connect_url,
            stop_url: remote.stop_url,
            created_at,
            expires_at: created_at + ttl,
            authenticated: false,
        }
    }

    /// Usable until `buffer` before the provider would reap it.
    pub fn is_fresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now < self.expires_at - buffer
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub exists: bool,
    pub valid: bool,
    pub authenticated: bool,
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub remaining_ms: i64,
}

impl SessionInfo {
    pub fn absent() -> Self {
        Self {
            exists: false,
            valid: false,
            authenticated: false,
            id: None,
            created_at: None,
            expires_at: None,
            remaining_ms: 0,
        }
    }
}
