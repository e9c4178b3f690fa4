use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("OTP required to complete vendor login")]
    OtpRequired,

    #[error("Scrape failed for {url}: {message}")]
    ScrapeError { url: String, message: String },

    #[error("Redirected to the vendor login page while loading {url}")]
    LoginRedirect { url: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Remote browser provider is rate limiting session creation")]
    RateLimited,

    #[error("Remote browser provider returned {status}: {message}")]
    ProviderError { status: u16, message: String },

    #[error("Browser command failed: {0}")]
    BrowserQuery(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("File error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthError(_) | AppError::OtpRequired => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The vendor URL the failing operation was working on, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            AppError::ScrapeError { url, .. } | AppError::LoginRedirect { url } => Some(url),
            _ => None,
        }
    }

    pub fn is_session_lost(&self) -> bool {
        matches!(self, AppError::LoginRedirect { .. })
    }

    /// A copy to hand to every caller that shared one failed operation.
    /// Wrapped library errors keep their message but become `InternalError`.
    pub fn replay(&self) -> AppError {
        match self {
            AppError::ConfigError(m) => AppError::ConfigError(m.clone()),
            AppError::AuthError(m) => AppError::AuthError(m.clone()),
            AppError::OtpRequired => AppError::OtpRequired,
            AppError::ScrapeError { url, message } => AppError::ScrapeError {
                url: url.clone(),
                message: message.clone(),
            },
            AppError::LoginRedirect { url } => AppError::LoginRedirect { url: url.clone() },
            AppError::NotFound(m) => AppError::NotFound(m.clone()),
            AppError::RateLimited => AppError::RateLimited,
            AppError::ProviderError { status, message } => AppError::ProviderError {
                status: *status,
                message: message.clone(),
            },
            AppError::BrowserQuery(m) => AppError::BrowserQuery(m.clone()),
            AppError::ValidationError(m) => AppError::ValidationError(m.clone()),
            AppError::InternalError(m) => AppError::InternalError(m.clone()),
            AppError::HttpError(_) | AppError::IoError(_) | AppError::SerdeError(_) => {
                AppError::InternalError(self.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "message": self.to_string(),
            "status": status.as_u16()
        });
        if let Some(url) = self.url() {
            body["url"] = json!(url);
        }

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::ConfigError("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::AuthError("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::OtpRequired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RateLimited.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::ValidationError("x".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_envelope_carries_url() {
        let error = AppError::ScrapeError {
            url: "https://vendor.test/visitors/today".to_string(),
            message: "visitor table did not render".to_string(),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["url"], "https://vendor.test/visitors/today");
        assert_eq!(json["status"], 500);
    }

    #[test]
    fn test_not_found_message_is_verbatim() {
        let error = AppError::NotFound("Visitor with credential C-1 not found".to_string());
        assert_eq!(error.to_string(), "Visitor with credential C-1 not found");
    }

    #[test]
    fn test_replay_keeps_status_and_message() {
        let auth = AppError::AuthError("login form not found".to_string());
        let copy = auth.replay();
        assert_eq!(copy.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(copy.to_string(), auth.to_string());

        let io = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let copy = io.replay();
        assert!(matches!(copy, AppError::InternalError(_)));
        assert!(copy.to_string().contains("disk full"));
    }
}
