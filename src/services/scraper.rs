use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Timeouts;
use crate::models::{
    AppError, AppResult, ListingTarget, SessionHandle, TableRow, Visitor, VisitorAction,
    VisitorActionRequest,
};
use crate::services::{nuveq, BrowserProvider};
use crate::utils::validate_url;

/// Reads and acts on the vendor's visitor listings through an authenticated session.
pub struct VisitorScraper {
    provider: Arc<dyn BrowserProvider>,
    base_url: String,
    timeouts: Timeouts,
}

impl VisitorScraper {
    pub fn new(provider: Arc<dyn BrowserProvider>, base_url: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            provider,
            base_url: base_url.into(),
            timeouts,
        }
    }

    pub fn target_url(&self, target: &ListingTarget) -> String {
        match target {
            ListingTarget::Category(category) => nuveq::category_url(&self.base_url, *category),
            ListingTarget::Url(url) => url.clone(),
        }
    }

    pub async fn list(&self, session: &SessionHandle, target: &ListingTarget) -> AppResult<Vec<Visitor>> {
        if let ListingTarget::Url(url) = target {
            validate_url(url)?;
        }
        let url = self.target_url(target);
        let rows = self.load_rows(session, &url).await?;
        let visitors: Vec<Visitor> = rows.iter().filter_map(nuveq::row_to_visitor).collect();
        info!(%url, count = visitors.len(), "scraped visitor listing");
        Ok(visitors)
    }

    /// Approves, rejects or deletes the visitor whose credential (or name) matches.
    pub async fn act(
        &self,
        session: &SessionHandle,
        action: VisitorAction,
        request: &VisitorActionRequest,
    ) -> AppResult<String> {
        let category = request.visitor_type.unwrap_or_else(|| action.default_category());
        let url = self.target_url(&ListingTarget::Category(category));
        let rows = self.load_rows(session, &url).await?;

        let index = find_visitor_row(&rows, &request.credential, request.name.as_deref())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Visitor with credential {} not found",
                    request.credential
                ))
            })?;

        let control = nuveq::row_action_selector(index, action);
        if !self
            .provider
            .click(session, &control, self.timeouts.element)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "{} button not found for visitor {}",
                action.label(),
                request.credential
            )));
        }

        let confirm = self
            .provider
            .wait_for_selector(session, nuveq::CONFIRM_BUTTON, self.timeouts.glance)
            .await?;
        if confirm {
            debug!("confirming {} dialog", action.label());
            if !self
                .provider
                .click(session, nuveq::CONFIRM_BUTTON, self.timeouts.element)
                .await?
            {
                error!(%url, credential = %request.credential, "confirmation dialog could not be accepted");
                return Err(AppError::ScrapeError {
                    url,
                    message: format!("{} confirmation could not be clicked", action.label()),
                });
            }
        }

        let subject = request
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(request.credential.as_str());
        info!(credential = %request.credential, "visitor {}", action.past_tense());
        Ok(format!("Visitor {} {} successfully", subject, action.past_tense()))
    }

    async fn load_rows(&self, session: &SessionHandle, url: &str) -> AppResult<Vec<TableRow>> {
        let navigation = self
            .provider
            .goto(session, url, self.timeouts.navigation)
            .await
            .map_err(|e| {
                error!(%url, error = %e, "vendor navigation failed");
                AppError::ScrapeError {
                    url: url.to_string(),
                    message: format!("navigation failed: {}", e),
                }
            })?;

        if nuveq::is_login_url(&navigation.url) && !nuveq::is_login_url(url) {
            error!(%url, status = ?navigation.status, "vendor redirected to login while scraping");
            return Err(AppError::LoginRedirect { url: url.to_string() });
        }

        let table = self
            .provider
            .wait_for_selector(session, nuveq::VISITOR_TABLE, self.timeouts.table)
            .await?;
        if !table {
            error!(%url, status = ?navigation.status, "visitor table did not render");
            return Err(AppError::ScrapeError {
                url: url.to_string(),
                message: "visitor table did not render".to_string(),
            });
        }

        if self
            .provider
            .wait_for_selector(session, nuveq::NO_DATA_MARKER, self.timeouts.glance)
            .await?
        {
            debug!(%url, "listing reports no data");
            return Ok(Vec::new());
        }

        self.show_all_rows(session, url).await;

        self.provider
            .table_rows(session, nuveq::VISITOR_ROWS)
            .await
            .map_err(|e| {
                error!(%url, error = %e, "row extraction failed");
                AppError::ScrapeError {
                    url: url.to_string(),
                    message: format!("row extraction failed: {}", e),
                }
            })
    }

    /// Best effort: default pagination is used when the page-size control is missing or fails.
    async fn show_all_rows(&self, session: &SessionHandle, url: &str) {
        match self
            .provider
            .wait_for_selector(session, nuveq::PAGE_SIZE_SELECT, self.timeouts.glance)
            .await
        {
            Ok(true) => {
                if let Err(e) = self
                    .provider
                    .select_option(session, nuveq::PAGE_SIZE_SELECT, nuveq::SHOW_ALL_VALUE)
                    .await
                {
                    warn!(%url, error = %e, "could not switch listing to show all rows");
                }
            }
            Ok(false) => debug!(%url, "no page-size control"),
            Err(e) => warn!(%url, error = %e, "page-size check failed"),
        }
    }
}

/// Index of the row whose credential matches, else the first whose name matches.
pub fn find_visitor_row(rows: &[TableRow], credential: &str, name: Option<&str>) -> Option<usize> {
    let visitors: Vec<Option<Visitor>> = rows.iter().map(nuveq::row_to_visitor).collect();
    let credential = credential.trim();

    let by_credential = (!credential.is_empty())
        .then(|| {
            visitors.iter().position(|visitor| {
                visitor
                    .as_ref()
                    .is_some_and(|v| v.credential.eq_ignore_ascii_case(credential))
            })
        })
        .flatten();

    by_credential.or_else(|| {
        let name = name.map(str::trim).filter(|name| !name.is_empty())?;
        visitors.iter().position(|visitor| {
            visitor
                .as_ref()
                .is_some_and(|v| v.name.eq_ignore_ascii_case(name))
        })
    })
}
