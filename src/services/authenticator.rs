use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::{Timeouts, VendorCredentials};
use crate::models::{AppError, AppResult, AuthState, SessionHandle, StoredCookie};
use crate::services::{nuveq, BrowserProvider, Clock, CookieJar};

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(Vec<StoredCookie>),
    /// The vendor is showing its OTP screen; the page is left there for `submit_otp`.
    OtpRequired,
}

/// Logs a remote browser session into Nuveq.
pub struct Authenticator {
    provider: Arc<dyn BrowserProvider>,
    jar: Arc<CookieJar>,
    clock: Arc<dyn Clock>,
    base_url: String,
    credentials: Option<VendorCredentials>,
    timeouts: Timeouts,
}

impl Authenticator {
    pub fn new(
        provider: Arc<dyn BrowserProvider>,
        jar: Arc<CookieJar>,
        clock: Arc<dyn Clock>,
        base_url: impl Into<String>,
        credentials: Option<VendorCredentials>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            provider,
            jar,
            clock,
            base_url: base_url.into(),
            credentials,
            timeouts,
        }
    }

    /// Saved cookies if they still work, otherwise a full credential login.
    /// An OTP challenge cannot be answered here and is reported as `OtpRequired`.
    pub async fn authenticate(&self, session: &SessionHandle) -> AppResult<()> {
        if self.restore_saved_cookies(session).await? {
            return Ok(());
        }

        match self.login(session, None).await? {
            LoginOutcome::Authenticated(_) => Ok(()),
            LoginOutcome::OtpRequired => Err(AppError::OtpRequired),
        }
    }

    pub async fn saved_state(&self) -> AppResult<Option<AuthState>> {
        self.jar.load().await
    }

    pub async fn restore_saved_cookies(&self, session: &SessionHandle) -> AppResult<bool> {
        let Some(state) = self.jar.load().await? else {
            debug!("no saved auth state");
            return Ok(false);
        };
        if !state.has_live_cookie(self.clock.now()) {
            info!("saved vendor cookies have all expired");
            return Ok(false);
        }

        self.provider.set_cookies(session, &state.cookies).await?;

        let url = nuveq::dashboard_url(&self.base_url);
        let navigation = self
            .provider
            .goto(session, &url, self.timeouts.navigation)
            .await?;
        if nuveq::is_login_url(&navigation.url) {
            info!(%url, "saved vendor cookies were rejected, discarding them");
            self.jar.clear().await?;
            return Ok(false);
        }

        let ready = self
            .provider
            .wait_for_selector(session, nuveq::DASHBOARD_MARKER, self.timeouts.element)
            .await?;
        if ready {
            info!(session = %session.id, "restored vendor login from saved cookies");
        }
        Ok(ready)
    }

    pub async fn login(&self, session: &SessionHandle, otp: Option<&str>) -> AppResult<LoginOutcome> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AppError::ConfigError("NUVEQ_USERNAME and NUVEQ_PASSWORD must be set".to_string())
        })?;

        let url = nuveq::login_url(&self.base_url);
        let navigation = self
            .provider
            .goto(session, &url, self.timeouts.navigation)
            .await
            .map_err(|e| {
                error!(%url, error = %e, "could not open vendor login page");
                AppError::AuthError(format!("could not open {}: {}", url, e))
            })?;

        if !nuveq::is_login_url(&navigation.url) {
            info!(landed = %navigation.url, "vendor session already authenticated");
            return self.finish(session).await.map(LoginOutcome::Authenticated);
        }

        let form_ready = self
            .provider
            .wait_for_selector(session, nuveq::USERNAME_INPUT, self.timeouts.element)
            .await?;
        if !form_ready {
            error!(%url, status = ?navigation.status, "vendor login form not found");
            return Err(AppError::AuthError("login form not found".to_string()));
        }

        self.provider
            .type_text(session, nuveq::USERNAME_INPUT, &credentials.username)
            .await?;
        self.provider
            .type_text(session, nuveq::PASSWORD_INPUT, &credentials.password)
            .await?;
        if !self
            .provider
            .click(session, nuveq::LOGIN_SUBMIT, self.timeouts.element)
            .await?
        {
            return Err(AppError::AuthError("login button not found".to_string()));
        }
        info!(session = %session.id, "submitted vendor credentials");

        let either = format!("{}, {}", nuveq::DASHBOARD_MARKER, nuveq::OTP_INPUT);
        if !self
            .provider
            .wait_for_selector(session, &either, self.timeouts.login)
            .await?
        {
            error!(%url, "vendor login was not confirmed");
            return Err(AppError::AuthError(
                "timed out waiting for the vendor dashboard after login".to_string(),
            ));
        }

        let otp_challenge = self
            .provider
            .wait_for_selector(session, nuveq::OTP_INPUT, self.timeouts.glance)
            .await?;
        if !otp_challenge {
            return self.finish(session).await.map(LoginOutcome::Authenticated);
        }

        match otp {
            Some(code) => self.submit_otp(session, code).await.map(LoginOutcome::Authenticated),
            None => {
                info!(session = %session.id, "vendor requested an OTP");
                Ok(LoginOutcome::OtpRequired)
            }
        }
    }

    /// Fills the OTP digit fields on a page left at the OTP screen and waits for the dashboard.
    pub async fn submit_otp(&self, session: &SessionHandle, code: &str) -> AppResult<Vec<StoredCookie>> {
        crate::utils::validate_otp(code)?;

        for (index, digit) in code.chars().enumerate() {
            self.provider
                .type_text(session, &nuveq::otp_digit_input(index), &digit.to_string())
                .await?;
        }
        if !self
            .provider
            .click(session, nuveq::OTP_SUBMIT, self.timeouts.element)
            .await?
        {
            return Err(AppError::AuthError("OTP submit button not found".to_string()));
        }

        if !self
            .provider
            .wait_for_selector(session, nuveq::DASHBOARD_MARKER, self.timeouts.login)
            .await?
        {
            warn!(session = %session.id, "vendor did not accept the OTP in time");
            return Err(AppError::AuthError(
                "timed out waiting for the vendor dashboard after OTP".to_string(),
            ));
        }

        info!(session = %session.id, "vendor OTP accepted");
        self.finish(session).await
    }

    async fn finish(&self, session: &SessionHandle) -> AppResult<Vec<StoredCookie>> {
        let cookies = self.provider.cookies(session).await?;
        if cookies.is_empty() {
            warn!(session = %session.id, "vendor returned no cookies after login");
        } else {
            self.jar
                .save(&AuthState::new(cookies.clone(), self.clock.now()))
                .await?;
        }
        Ok(cookies)
    }
}
