use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{cookie_header, AppError, AppResult, AuthRequest, AuthResponse, SessionHandle};
use crate::utils::validate_otp;
use crate::services::{Authenticator, LoginOutcome, PendingAuthStore, SessionStore};

pub const OTP_ENDPOINT: &str = "/api/auth";

/// The interactive login behind `POST /api/auth`, including the two-request OTP flow.
pub struct AuthService {
    session_store: Arc<SessionStore>,
    authenticator: Arc<Authenticator>,
    pending: Arc<PendingAuthStore>,
}

impl AuthService {
    pub fn new(
        session_store: Arc<SessionStore>,
        authenticator: Arc<Authenticator>,
        pending: Arc<PendingAuthStore>,
    ) -> Self {
        Self {
            session_store,
            authenticator,
            pending,
        }
    }

    pub async fn authenticate(&self, request: &AuthRequest) -> AppResult<AuthResponse> {
        for expired in self.pending.purge_expired().await {
            info!(session = %expired.id, "closing abandoned OTP login");
            self.session_store.release(&expired).await;
        }

        let otp = request
            .otp
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());

        if let Some(code) = otp {
            validate_otp(code)?;
            if let Some(session) = self.resume_pending(request.pending_id.as_deref()).await? {
                return self.complete_otp(session, code).await;
            }
        }

        let session = self.session_store.allocate().await?;
        match self.login(&session, otp).await {
            Ok(Some(cookie)) => {
                self.session_store.adopt(session).await;
                Ok(AuthResponse::authenticated(cookie, "Authenticated with Nuveq"))
            }
            Ok(None) => {
                let pending_id = self.pending.insert(session).await;
                info!(%pending_id, "vendor login paused for OTP");
                Ok(AuthResponse::otp_required(pending_id, OTP_ENDPOINT))
            }
            Err(e) => {
                self.session_store.release(&session).await;
                Err(e)
            }
        }
    }

    /// `Some(cookie header)` once logged in, `None` while waiting on an OTP.
    async fn login(&self, session: &SessionHandle, otp: Option<&str>) -> AppResult<Option<String>> {
        if self.authenticator.restore_saved_cookies(session).await? {
            return Ok(Some(self.current_cookie(session).await?));
        }

        match self.authenticator.login(session, otp).await? {
            LoginOutcome::Authenticated(cookies) => Ok(Some(cookie_header(&cookies))),
            LoginOutcome::OtpRequired => Ok(None),
        }
    }

    async fn resume_pending(&self, pending_id: Option<&str>) -> AppResult<Option<SessionHandle>> {
        match pending_id {
            Some(id) => self.pending.take(id).await.map(Some),
            None => match self.pending.take_latest().await {
                Ok((_, session)) => Ok(Some(session)),
                Err(_) => Ok(None),
            },
        }
    }

    async fn complete_otp(&self, session: SessionHandle, code: &str) -> AppResult<AuthResponse> {
        match self.authenticator.submit_otp(&session, code).await {
            Ok(cookies) => {
                let cookie = cookie_header(&cookies);
                self.session_store.adopt(session).await;
                Ok(AuthResponse::authenticated(cookie, "OTP accepted, authenticated with Nuveq"))
            }
            Err(e) => {
                warn!(session = %session.id, error = %e, "OTP submission failed");
                self.session_store.release(&session).await;
                Err(match e {
                    AppError::AuthError(_) => e,
                    other => AppError::AuthError(other.to_string()),
                })
            }
        }
    }

    async fn current_cookie(&self, session: &SessionHandle) -> AppResult<String> {
        let state = self.authenticator.saved_state().await?;
        match state {
            Some(state) if !state.cookies.is_empty() => Ok(state.cookie_header()),
            _ => Err(AppError::AuthError(format!(
                "session {} has no vendor cookies",
                session.id
            ))),
        }
    }
}
