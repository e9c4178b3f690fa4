use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::models::{AppError, AppResult, RemoteSession, SessionHandle, StoredCookie, TableCell, TableRow};
use crate::services::{BrowserProvider, Navigation};

const GOTO: &str = r#"mutation Goto($url: String!, $timeout: Float) {
  goto(url: $url, waitUntil: networkIdle, timeout: $timeout) { status url }
}"#;

const WAIT_FOR_SELECTOR: &str = r#"mutation WaitForSelector($selector: String!, $timeout: Float) {
  waitForSelector(selector: $selector, timeout: $timeout) { time }
}"#;

const TYPE: &str = r#"mutation Type($selector: String!, $text: String!) {
  type(selector: $selector, text: $text) { time }
}"#;

const CLICK: &str = r#"mutation Click($selector: String!, $timeout: Float) {
  click(selector: $selector, timeout: $timeout) { time }
}"#;

const SELECT: &str = r#"mutation Select($selector: String!, $value: StringOrArray!) {
  select(selector: $selector, value: $value) { time }
}"#;

const TABLE_ROWS: &str = r#"mutation TableRows($selector: String!) {
  rows: mapSelector(selector: $selector) {
    cells: mapSelector(selector: "td") {
      text: innerText
      images: mapSelector(selector: "img") { src: attribute(name: "src") { value } }
    }
  }
}"#;

const GET_COOKIES: &str = r#"mutation GetCookies {
  cookies { cookies { name value domain path expires httpOnly secure sameSite } }
}"#;

const SET_COOKIES: &str = r#"mutation SetCookies($cookies: [CookieInput]!) {
  cookies(cookies: $cookies) { cookies { name } }
}"#;

#[derive(Debug, Deserialize)]
struct AllocatedSession {
    id: String,
    stop: String,
    #[serde(rename = "browserQL")]
    browser_ql: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GotoData {
    goto: Option<GotoResult>,
}

#[derive(Debug, Deserialize)]
struct GotoResult {
    status: Option<u16>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RowsData {
    rows: Option<Vec<RowNode>>,
}

#[derive(Debug, Deserialize)]
struct RowNode {
    cells: Option<Vec<CellNode>>,
}

#[derive(Debug, Deserialize)]
struct CellNode {
    text: Option<String>,
    images: Option<Vec<ImageNode>>,
}

#[derive(Debug, Deserialize)]
struct ImageNode {
    src: Option<AttributeValue>,
}

#[derive(Debug, Deserialize)]
struct AttributeValue {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CookiesData {
    cookies: CookieList,
}

#[derive(Debug, Deserialize)]
struct CookieList {
    cookies: Vec<StoredCookie>,
}

/// Drives Browserless sessions: REST for allocation and teardown, BrowserQL
/// mutations for everything that happens on the page.
pub struct BrowserlessClient {
    client: Client,
    base_url: String,
    token: String,
    session_ttl: Duration,
}

impl BrowserlessClient {
    /// `request_timeout` bounds every HTTP call to the provider, so it must exceed
    /// the longest browser-side wait a command carries.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        session_ttl: Duration,
        request_timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            session_ttl,
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        session: &SessionHandle,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> AppResult<T> {
        let response = self
            .client
            .post(&session.connect_url)
            .query(&[("token", &self.token)])
            .json(&json!({
                "operationName": operation,
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(
                session = %session.id,
                operation,
                status = status.as_u16(),
                "BrowserQL request rejected"
            );
            return Err(AppError::ProviderError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GraphQlResponse<T> = response.json().await?;
        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::BrowserQuery(format!("{}: {}", operation, message)));
        }

        body.data
            .ok_or_else(|| AppError::BrowserQuery(format!("{} returned no data", operation)))
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_millis() as f64
}

/// Whether a BrowserQL error means the element never showed up, as opposed to a
/// dead session or a bad selector.
fn is_absence(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    [
        "timed out",
        "timeout",
        "no element",
        "no node",
        "element not found",
        "selector not found",
        "failed to find",
        "could not find",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

#[async_trait]
impl BrowserProvider for BrowserlessClient {
    async fn create_session(&self) -> AppResult<RemoteSession> {
        let url = format!("{}/session", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("token", &self.token)])
            .json(&json!({
                "ttl": self.session_ttl.as_millis() as u64,
                "stealth": true,
                "headless": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(%url, "Browserless refused session allocation with 429");
            return Err(AppError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%url, status = status.as_u16(), "Browserless session allocation failed");
            return Err(AppError::ProviderError {
                status: status.as_u16(),
                message,
            });
        }

        let allocated: AllocatedSession = response.json().await?;
        debug!(session = %allocated.id, "Browserless session allocated");
        Ok(RemoteSession {
            id: allocated.id,
            connect_url: allocated.browser_ql,
            stop_url: allocated.stop,
        })
    }

    async fn close_session(&self, session: &SessionHandle) -> AppResult<()> {
        let response = self
            .client
            .delete(&session.stop_url)
            .query(&[("token", &self.token)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!(session = %session.id, "Browserless session released");
            return Ok(());
        }

        Err(AppError::ProviderError {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }

    async fn goto(&self, session: &SessionHandle, url: &str, timeout: Duration) -> AppResult<Navigation> {
        let data: GotoData = self
            .query(session, "Goto", GOTO, json!({ "url": url, "timeout": millis(timeout) }))
            .await?;

        let result = data
            .goto
            .ok_or_else(|| AppError::BrowserQuery(format!("navigation to {} returned nothing", url)))?;
        Ok(Navigation {
            url: result.url.unwrap_or_else(|| url.to_string()),
            status: result.status,
        })
    }

    async fn wait_for_selector(
        &self,
        session: &SessionHandle,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<bool> {
        let result: AppResult<Value> = self
            .query(
                session,
                "WaitForSelector",
                WAIT_FOR_SELECTOR,
                json!({ "selector": selector, "timeout": millis(timeout) }),
            )
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(AppError::BrowserQuery(message)) if is_absence(&message) => {
                debug!(selector, %message, "selector not present");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn type_text(&self, session: &SessionHandle, selector: &str, text: &str) -> AppResult<()> {
        let _: Value = self
            .query(session, "Type", TYPE, json!({ "selector": selector, "text": text }))
            .await?;
        Ok(())
    }

    async fn click(&self, session: &SessionHandle, selector: &str, timeout: Duration) -> AppResult<bool> {
        let result: AppResult<Value> = self
            .query(
                session,
                "Click",
                CLICK,
                json!({ "selector": selector, "timeout": millis(timeout) }),
            )
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(AppError::BrowserQuery(message)) if is_absence(&message) => {
                debug!(selector, %message, "nothing to click");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn select_option(&self, session: &SessionHandle, selector: &str, value: &str) -> AppResult<()> {
        let _: Value = self
            .query(session, "Select", SELECT, json!({ "selector": selector, "value": value }))
            .await?;
        Ok(())
    }

    async fn table_rows(&self, session: &SessionHandle, row_selector: &str) -> AppResult<Vec<TableRow>> {
        let data: RowsData = self
            .query(session, "TableRows", TABLE_ROWS, json!({ "selector": row_selector }))
            .await?;

        let rows = data
            .rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| TableRow {
                cells: row
                    .cells
                    .unwrap_or_default()
                    .into_iter()
                    .map(|cell| TableCell {
                        text: cell.text.unwrap_or_default(),
                        image: cell
                            .images
                            .unwrap_or_default()
                            .into_iter()
                            .find_map(|img| img.src.and_then(|src| src.value)),
                    })
                    .collect(),
            })
            .collect();

        Ok(rows)
    }

    async fn cookies(&self, session: &SessionHandle) -> AppResult<Vec<StoredCookie>> {
        let data: CookiesData = self
            .query(session, "GetCookies", GET_COOKIES, json!({}))
            .await?;
        Ok(data.cookies.cookies)
    }

    async fn set_cookies(&self, session: &SessionHandle, cookies: &[StoredCookie]) -> AppResult<()> {
        let _: Value = self
            .query(session, "SetCookies", SET_COOKIES, json!({ "cookies": cookies }))
            .await?;
        Ok(())
    }
}
