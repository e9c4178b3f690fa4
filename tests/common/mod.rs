#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use nuveq_portal_api::config::{AppConfig, RetryPolicy, Timeouts};
use nuveq_portal_api::handlers::{AppState, AppStateInner};
use nuveq_portal_api::models::{
    AppError, AppResult, AuthState, RemoteSession, SessionHandle, StoredCookie, TableRow,
    VisitorCategory,
};
use nuveq_portal_api::services::{nuveq, BrowserProvider, ManualClock, Navigation};

pub const BASE_URL: &str = "https://vendor.test";
pub const USERNAME: &str = "frontdesk@cowork.test";
pub const PASSWORD: &str = "correct horse";
pub const VALID_OTP: &str = "123456";
/// Rows shown per page until the page size is switched to "All".
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Default)]
struct PageState {
    path: String,
    logged_in: bool,
    otp_visible: bool,
    show_all: bool,
    confirm_pending: Option<(String, usize)>,
    typed: HashMap<String, String>,
    injected: Vec<StoredCookie>,
}

#[derive(Debug)]
pub struct VendorSettings {
    pub require_otp: bool,
    pub accept_saved_cookies: bool,
    pub rate_limited_allocations: usize,
    pub pagination_control: bool,
    pub no_data_marker: bool,
    pub confirm_dialog: bool,
    pub missing_action_controls: bool,
    pub redirect_listings_to_login: bool,
    pub allocation_delay: Duration,
}

impl Default for VendorSettings {
    fn default() -> Self {
        Self {
            require_otp: false,
            accept_saved_cookies: true,
            rate_limited_allocations: 0,
            pagination_control: true,
            no_data_marker: true,
            confirm_dialog: true,
            missing_action_controls: false,
            redirect_listings_to_login: false,
            allocation_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct VendorState {
    settings: VendorSettings,
    listings: HashMap<String, Vec<TableRow>>,
    sessions: HashMap<String, PageState>,
    closed: Vec<String>,
    clicks: Vec<String>,
    selections: Vec<(String, String)>,
}

/// Browserless and the Nuveq site rolled into one in-memory stand-in.
#[derive(Debug, Default)]
pub struct FakeVendor {
    state: Mutex<VendorState>,
    create_calls: AtomicUsize,
    login_submits: AtomicUsize,
}

impl FakeVendor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn configure(&self, f: impl FnOnce(&mut VendorSettings)) {
        f(&mut self.state.lock().unwrap().settings);
    }

    pub fn set_listing(&self, category: VisitorCategory, rows: Vec<TableRow>) {
        self.state
            .lock()
            .unwrap()
            .listings
            .insert(nuveq::category_path(category).to_string(), rows);
    }

    pub fn listing(&self, category: VisitorCategory) -> Vec<TableRow> {
        self.state
            .lock()
            .unwrap()
            .listings
            .get(nuveq::category_path(category))
            .cloned()
            .unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn login_submits(&self) -> usize {
        self.login_submits.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> Vec<String> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn open_sessions(&self) -> Vec<String> {
        self.state.lock().unwrap().sessions.keys().cloned().collect()
    }

    /// Clicks on listing rows or confirmation dialogs, i.e. visitor mutations.
    pub fn action_clicks(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .clicks
            .iter()
            .filter(|sel| sel.starts_with(nuveq::VISITOR_ROWS) || *sel == nuveq::CONFIRM_BUTTON)
            .cloned()
            .collect()
    }

    pub fn selections(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().selections.clone()
    }
}

fn path_of(url: &str) -> String {
    let path = url.strip_prefix(BASE_URL).unwrap_or(url);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn is_listing(path: &str) -> bool {
    path.starts_with("/visitors/")
}

fn page<'a>(state: &'a mut VendorState, session: &SessionHandle) -> AppResult<&'a mut PageState> {
    state
        .sessions
        .get_mut(&session.id)
        .ok_or_else(|| AppError::BrowserQuery(format!("session {} is closed", session.id)))
}

fn has(state: &VendorState, page: &PageState, selector: &str) -> bool {
    selector.split(", ").any(|single| has_single(state, page, single))
}

fn has_single(state: &VendorState, page: &PageState, selector: &str) -> bool {
    let settings = &state.settings;
    let rows_empty = state
        .listings
        .get(&page.path)
        .map(|rows| rows.is_empty())
        .unwrap_or(true);

    match selector {
        nuveq::USERNAME_INPUT | nuveq::PASSWORD_INPUT | nuveq::LOGIN_SUBMIT => {
            page.path == nuveq::LOGIN_PATH && !page.otp_visible
        }
        nuveq::OTP_INPUT | nuveq::OTP_SUBMIT => page.otp_visible,
        nuveq::DASHBOARD_MARKER => page.logged_in && page.path == nuveq::DASHBOARD_PATH,
        nuveq::VISITOR_TABLE => page.logged_in && is_listing(&page.path),
        nuveq::NO_DATA_MARKER => is_listing(&page.path) && settings.no_data_marker && rows_empty,
        nuveq::PAGE_SIZE_SELECT => is_listing(&page.path) && settings.pagination_control,
        nuveq::CONFIRM_BUTTON => page.confirm_pending.is_some(),
        _ => false,
    }
}

fn row_index(selector: &str) -> Option<(usize, &str)> {
    let prefix = format!("{}:nth-child(", nuveq::VISITOR_ROWS);
    let rest = selector.strip_prefix(&prefix)?;
    let end = rest.find(')')?;
    let index: usize = rest[..end].parse().ok()?;
    Some((index.checked_sub(1)?, rest[end + 1..].trim()))
}

#[async_trait]
impl BrowserProvider for FakeVendor {
    async fn create_session(&self) -> AppResult<RemoteSession> {
        let delay = self.state.lock().unwrap().settings.allocation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.lock().unwrap();
        if state.settings.rate_limited_allocations > 0 {
            state.settings.rate_limited_allocations -= 1;
            return Err(AppError::RateLimited);
        }

        let id = format!("fake-{}", n);
        state.sessions.insert(
            id.clone(),
            PageState {
                path: "about:blank".to_string(),
                ..Default::default()
            },
        );
        Ok(RemoteSession {
            connect_url: format!("https://browser.test/{}/bql", id),
            stop_url: format!("https://browser.test/{}/stop", id),
            id,
        })
    }

    async fn close_session(&self, session: &SessionHandle) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.sessions.remove(&session.id);
        state.closed.push(session.id.clone());
        Ok(())
    }

    async fn goto(&self, session: &SessionHandle, url: &str, _timeout: Duration) -> AppResult<Navigation> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let accept_saved = state.settings.accept_saved_cookies;
        let redirect_listings = state.settings.redirect_listings_to_login;
        let page = page(state, session)?;

        if !page.logged_in && accept_saved && !page.injected.is_empty() {
            page.logged_in = true;
        }

        let path = path_of(url);
        page.otp_visible = false;
        page.show_all = false;
        page.confirm_pending = None;
        page.path = if path == nuveq::LOGIN_PATH {
            if page.logged_in {
                nuveq::DASHBOARD_PATH.to_string()
            } else {
                path
            }
        } else if !page.logged_in || (redirect_listings && is_listing(&path)) {
            nuveq::LOGIN_PATH.to_string()
        } else {
            path
        };

        Ok(Navigation {
            url: format!("{}{}", BASE_URL, page.path),
            status: Some(200),
        })
    }

    async fn wait_for_selector(
        &self,
        session: &SessionHandle,
        selector: &str,
        _timeout: Duration,
    ) -> AppResult<bool> {
        let mut guard = self.state.lock().unwrap();
        let page = page(&mut guard, session)?.clone();
        Ok(has(&guard, &page, selector))
    }

    async fn type_text(&self, session: &SessionHandle, selector: &str, text: &str) -> AppResult<()> {
        let mut guard = self.state.lock().unwrap();
        page(&mut guard, session)?
            .typed
            .insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn click(&self, session: &SessionHandle, selector: &str, _timeout: Duration) -> AppResult<bool> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let snapshot = page(state, session)?.clone();
        if !selector.starts_with(nuveq::VISITOR_ROWS) && !has(state, &snapshot, selector) {
            return Ok(false);
        }
        state.clicks.push(selector.to_string());

        let require_otp = state.settings.require_otp;
        let confirm_dialog = state.settings.confirm_dialog;
        let missing_controls = state.settings.missing_action_controls;

        match selector {
            nuveq::LOGIN_SUBMIT => {
                self.login_submits.fetch_add(1, Ordering::SeqCst);
                let page = page(state, session)?;
                let user_ok = page.typed.get(nuveq::USERNAME_INPUT).map(String::as_str) == Some(USERNAME);
                let pass_ok = page.typed.get(nuveq::PASSWORD_INPUT).map(String::as_str) == Some(PASSWORD);
                if user_ok && pass_ok {
                    if require_otp {
                        page.otp_visible = true;
                    } else {
                        page.logged_in = true;
                        page.path = nuveq::DASHBOARD_PATH.to_string();
                    }
                }
                Ok(true)
            }
            nuveq::OTP_SUBMIT => {
                let page = page(state, session)?;
                let code: String = (0..VALID_OTP.len())
                    .filter_map(|i| page.typed.get(&nuveq::otp_digit_input(i)).cloned())
                    .collect();
                if code == VALID_OTP {
                    page.otp_visible = false;
                    page.logged_in = true;
                    page.path = nuveq::DASHBOARD_PATH.to_string();
                }
                Ok(true)
            }
            nuveq::CONFIRM_BUTTON => {
                let pending = page(state, session)?.confirm_pending.take();
                if let Some((path, index)) = pending {
                    if let Some(rows) = state.listings.get_mut(&path) {
                        rows.remove(index);
                    }
                }
                Ok(true)
            }
            _ => {
                let Some((index, _control)) = row_index(selector) else {
                    return Ok(false);
                };
                if missing_controls {
                    return Ok(false);
                }
                let path = snapshot.path.clone();
                let exists = state
                    .listings
                    .get(&path)
                    .is_some_and(|rows| index < rows.len());
                if !exists {
                    return Ok(false);
                }
                if confirm_dialog {
                    page(state, session)?.confirm_pending = Some((path, index));
                } else if let Some(rows) = state.listings.get_mut(&path) {
                    rows.remove(index);
                }
                Ok(true)
            }
        }
    }

    async fn select_option(&self, session: &SessionHandle, selector: &str, value: &str) -> AppResult<()> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.selections.push((selector.to_string(), value.to_string()));
        let page = page(state, session)?;
        if selector == nuveq::PAGE_SIZE_SELECT && value == nuveq::SHOW_ALL_VALUE {
            page.show_all = true;
        }
        Ok(())
    }

    async fn table_rows(&self, session: &SessionHandle, _row_selector: &str) -> AppResult<Vec<TableRow>> {
        let mut guard = self.state.lock().unwrap();
        let page = page(&mut guard, session)?.clone();
        let mut rows = guard.listings.get(&page.path).cloned().unwrap_or_default();

        if rows.is_empty() && !guard.settings.no_data_marker {
            return Ok(vec![TableRow::from_texts([nuveq::NO_DATA_TEXT])]);
        }
        if guard.settings.pagination_control && !page.show_all {
            rows.truncate(PAGE_SIZE);
        }
        Ok(rows)
    }

    async fn cookies(&self, session: &SessionHandle) -> AppResult<Vec<StoredCookie>> {
        let mut guard = self.state.lock().unwrap();
        let page = page(&mut guard, session)?;
        if !page.logged_in {
            return Ok(Vec::new());
        }
        Ok(vec![session_cookie(
            &format!("sess-{}", session.id),
            (Utc::now() + ChronoDuration::hours(12)).timestamp() as f64,
        )])
    }

    async fn set_cookies(&self, session: &SessionHandle, cookies: &[StoredCookie]) -> AppResult<()> {
        let mut guard = self.state.lock().unwrap();
        page(&mut guard, session)?.injected = cookies.to_vec();
        Ok(())
    }
}

pub fn session_cookie(value: &str, expires: f64) -> StoredCookie {
    StoredCookie {
        name: "nuveq_session".to_string(),
        value: value.to_string(),
        domain: "vendor.test".to_string(),
        path: "/".to_string(),
        expires,
        http_only: true,
        secure: true,
        same_site: None,
    }
}

pub fn visitor_row(name: &str, credential: &str) -> TableRow {
    TableRow::from_texts([
        "",
        name,
        "Acme Ltd",
        "Level 2",
        "2026-10-19 09:00",
        "2026-10-19 18:00",
        "Guest",
        credential,
        "Community Manager",
        "",
        "Meeting",
        "Front Desk",
        "",
    ])
}

/// Removed from disk when the guard drops, so keep it alive for the whole test.
pub fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        browserless_url: "https://browser.test".to_string(),
        browserless_token: Some("test-token".to_string()),
        nuveq_base_url: BASE_URL.to_string(),
        nuveq_username: Some(USERNAME.to_string()),
        nuveq_password: Some(PASSWORD.to_string()),
        cookie_file: dir.join("auth.json"),
        visitor_cache_file: dir.join("visitors.json"),
        timeouts: Timeouts {
            navigation: Duration::from_millis(50),
            table: Duration::from_millis(50),
            element: Duration::from_millis(50),
            login: Duration::from_millis(50),
            glance: Duration::from_millis(10),
        },
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        },
        ..AppConfig::default()
    }
}

pub fn build_state(config: AppConfig, vendor: &Arc<FakeVendor>, clock: &Arc<ManualClock>) -> AppState {
    Arc::new(AppStateInner::new(config, vendor.clone(), clock.clone()))
}

pub fn write_saved_cookies(path: &Path, cookies: Vec<StoredCookie>) {
    let state = AuthState::new(cookies, Utc::now());
    std::fs::write(path, serde_json::to_string_pretty(&state).unwrap()).unwrap();
}
