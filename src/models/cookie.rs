use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn session_expiry() -> f64 {
    -1.0
}

/// A vendor cookie as read from, or injected into, the remote browser.
/// `expires` is seconds since the epoch; `-1` marks a session cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

impl StoredCookie {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires <= 0.0 || self.expires > now.timestamp() as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub cookies: Vec<StoredCookie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl AuthState {
    pub fn new(cookies: Vec<StoredCookie>, saved_at: DateTime<Utc>) -> Self {
        Self {
            cookies,
            saved_at: Some(saved_at),
        }
    }

    /// Worth restoring if any single cookie is still alive.
    pub fn has_live_cookie(&self, now: DateTime<Utc>) -> bool {
        self.cookies.iter().any(|cookie| cookie.is_live(now))
    }

    pub fn cookie_header(&self) -> String {
        cookie_header(&self.cookies)
    }
}

pub fn cookie_header(cookies: &[StoredCookie]) -> String {
    cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name, cookie.value))
        .collect::<Vec<_>>()
        .join("; ")
}
