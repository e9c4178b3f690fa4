use async_trait::async_trait;
use std::time::Duration;

use crate::models::{AppResult, RemoteSession, SessionHandle, StoredCookie, TableRow};

/// Where a navigation ended up after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub url: String,
    pub status: Option<u16>,
}

/// A hosted headless browser driven over the network.
///
/// Allocation failures caused by provider throttling must surface as
/// `AppError::RateLimited` so the session store can back off and retry.
#[async_trait]
pub trait BrowserProvider: Send + Sync {
    async fn create_session(&self) -> AppResult<RemoteSession>;

    async fn close_session(&self, session: &SessionHandle) -> AppResult<()>;

    async fn goto(&self, session: &SessionHandle, url: &str, timeout: Duration) -> AppResult<Navigation>;

    /// `Ok(false)` when the selector did not show up within `timeout`.
    async fn wait_for_selector(
        &self,
        session: &SessionHandle,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<bool>;

    async fn type_text(&self, session: &SessionHandle, selector: &str, text: &str) -> AppResult<()>;

    /// `Ok(false)` when there was nothing to click within `timeout`.
    async fn click(&self, session: &SessionHandle, selector: &str, timeout: Duration) -> AppResult<bool>;

    async fn select_option(&self, session: &SessionHandle, selector: &str, value: &str) -> AppResult<()>;

    async fn table_rows(&self, session: &SessionHandle, row_selector: &str) -> AppResult<Vec<TableRow>>;

    async fn cookies(&self, session: &SessionHandle) -> AppResult<Vec<StoredCookie>>;

    async fn set_cookies(&self, session: &SessionHandle, cookies: &[StoredCookie]) -> AppResult<()>;
}
