use std::path::PathBuf;
use std::time::Duration;

use crate::models::{AppError, AppResult};

pub const DEFAULT_BROWSERLESS_URL: &str = "https://production-sfo.browserless.io";
pub const DEFAULT_NUVEQ_BASE_URL: &str = "https://app.nuveq.cloud";

/// Per-call waits for browser commands. Nothing is cancelled early; a wait
/// that runs out fails the call.
#[derive(Debug, Clone)]
pub struct Timeouts {
    pub navigation: Duration,
    pub table: Duration,
    pub element: Duration,
    pub login: Duration,
    /// How long to look for optional controls (pagination, confirm dialogs, no-data markers).
    pub glance: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            table: Duration::from_secs(15),
            element: Duration::from_secs(10),
            login: Duration::from_secs(20),
            glance: Duration::from_secs(2),
        }
    }
}

impl Timeouts {
    /// HTTP deadline for one provider call: the longest browser-side wait plus
    /// headroom for the round trip.
    pub fn provider_request(&self) -> Duration {
        let longest = [self.navigation, self.table, self.element, self.login, self.glance]
            .into_iter()
            .max()
            .unwrap_or(self.navigation);
        longest + Duration::from_secs(10)
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.pow(attempt)
    }
}

pub fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(duration.as_millis().min(i64::MAX as u128) as i64)
}

#[derive(Debug, Clone)]
pub struct VendorCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub nuveq_base_url: String,
    pub nuveq_username: Option<String>,
    pub nuveq_password: Option<String>,
    pub cookie_file: PathBuf,
    pub visitor_cache_file: PathBuf,
    pub session_ttl: Duration,
    pub session_buffer: Duration,
    pub pending_otp_ttl: Duration,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            browserless_url: DEFAULT_BROWSERLESS_URL.to_string(),
            browserless_token: None,
            nuveq_base_url: DEFAULT_NUVEQ_BASE_URL.to_string(),
            nuveq_username: None,
            nuveq_password: None,
            cookie_file: PathBuf::from("data/nuveq-auth.json"),
            visitor_cache_file: PathBuf::from("data/visitors.json"),
            session_ttl: Duration::from_secs(300),
            session_buffer: Duration::from_secs(30),
            pending_otp_ttl: Duration::from_secs(300),
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let secs = |key: &str, default: Duration| -> AppResult<Duration> {
            match get(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| {
                        AppError::ConfigError(format!("{} must be a whole number of seconds", key))
                    }),
                None => Ok(default),
            }
        };

        let defaults = Self::default();
        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            browserless_url: get("BROWSERLESS_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.browserless_url),
            browserless_token: get("BROWSERLESS_API_TOKEN"),
            nuveq_base_url: get("NUVEQ_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.nuveq_base_url),
            nuveq_username: get("NUVEQ_USERNAME"),
            nuveq_password: get("NUVEQ_PASSWORD"),
            cookie_file: get("NUVEQ_COOKIE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cookie_file),
            visitor_cache_file: get("VISITOR_CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.visitor_cache_file),
            session_ttl: secs("SESSION_TTL_SECS", defaults.session_ttl)?,
            session_buffer: secs("SESSION_BUFFER_SECS", defaults.session_buffer)?,
            pending_otp_ttl: secs("OTP_PENDING_TTL_SECS", defaults.pending_otp_ttl)?,
            timeouts: defaults.timeouts,
            retry: defaults.retry,
        })
    }

    /// Vendor credentials, or a configuration error naming every missing variable.
    pub fn require_vendor(&self) -> AppResult<VendorCredentials> {
        let mut missing = Vec::new();
        if self.browserless_token.is_none() {
            missing.push("BROWSERLESS_API_TOKEN");
        }
        if self.nuveq_username.is_none() {
            missing.push("NUVEQ_USERNAME");
        }
        if self.nuveq_password.is_none() {
            missing.push("NUVEQ_PASSWORD");
        }
        match (&self.nuveq_username, &self.nuveq_password) {
            (Some(username), Some(password)) if missing.is_empty() => Ok(VendorCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(AppError::ConfigError(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            ))),
        }
    }
}
