use axum::{body::Bytes, extract::State, Json};

use crate::handlers::AppState;
use crate::models::{AppError, AppResult, AuthRequest, AuthResponse, LogoutResponse, SessionInfo};

/// An empty body starts a fresh login; anything else must be a valid `AuthRequest`.
fn parse_auth_request(body: &[u8]) -> AppResult<AuthRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AuthRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::ValidationError(format!("Invalid auth request body: {}", e)))
}

/// Log in to Nuveq, or finish a login the vendor challenged with an OTP
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Authenticated, or OTP required (success=false, requiresOTP=true)", body = AuthResponse),
        (status = 400, description = "Malformed body or OTP"),
        (status = 401, description = "Authentication failed"),
        (status = 500, description = "Configuration or provider error")
    ),
    tag = "Authentication"
)]
pub async fn authenticate(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<AuthResponse>> {
    state.config.require_vendor()?;
    let request = parse_auth_request(&body)?;
    let response = state.auth_service.authenticate(&request).await?;
    Ok(Json(response))
}

/// Report on the cached vendor session without touching it
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Cached session state", body = SessionInfo)
    ),
    tag = "Authentication"
)]
pub async fn session_info(State(state): State<AppState>) -> Json<SessionInfo> {
    Json(state.session_store.session_info().await)
}

/// Close the cached vendor session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session released", body = LogoutResponse),
        (status = 500, description = "Configuration or provider error")
    ),
    tag = "Authentication"
)]
pub async fn logout(State(state): State<AppState>) -> AppResult<Json<LogoutResponse>> {
    state.config.require_vendor()?;
    state.session_store.close_session().await?;
    Ok(Json(LogoutResponse {
        success: true,
        message: "Vendor session closed".to_string(),
    }))
}
