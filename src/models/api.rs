use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{SessionInfo, Visitor, VisitorCategory};

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// One-time passcode, when completing a login the vendor challenged.
    pub otp: Option<String>,
    /// Id returned by the challenged login; the most recent one is used if omitted.
    pub pending_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    pub message: String,
    #[serde(rename = "requiresOTP", skip_serializing_if = "Option::is_none")]
    pub requires_otp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_id: Option<String>,
}

impl AuthResponse {
    pub fn authenticated(cookie: String, message: impl Into<String>) -> Self {
        Self {
            success: true,
            cookie: Some(cookie),
            message: message.into(),
            requires_otp: None,
            otp_endpoint: None,
            pending_id: None,
        }
    }

    pub fn otp_required(pending_id: String, otp_endpoint: impl Into<String>) -> Self {
        Self {
            success: false,
            cookie: None,
            message: "OTP required. Submit the code to complete login.".to_string(),
            requires_otp: Some(true),
            otp_endpoint: Some(otp_endpoint.into()),
            pending_id: Some(pending_id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VisitorListResponse {
    pub success: bool,
    pub category: VisitorCategory,
    pub count: usize,
    pub visitors: Vec<Visitor>,
    pub session: SessionInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorActionRequest {
    pub credential: String,
    pub name: Option<String>,
    pub visitor_type: Option<VisitorCategory>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySnapshot {
    pub visitors: Vec<Visitor>,
    pub timestamp: Option<DateTime<Utc>>,
    pub count: usize,
}

impl CategorySnapshot {
    pub fn new(visitors: Vec<Visitor>, timestamp: DateTime<Utc>) -> Self {
        Self {
            count: visitors.len(),
            visitors,
            timestamp: Some(timestamp),
        }
    }
}

/// Shape of the sync cache file; also the body of the sync and local endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorCache {
    pub today: CategorySnapshot,
    pub future: CategorySnapshot,
    pub pending: CategorySnapshot,
    pub last_sync: Option<DateTime<Utc>>,
}

impl VisitorCache {
    pub fn snapshot_mut(&mut self, category: VisitorCategory) -> &mut CategorySnapshot {
        match category {
            VisitorCategory::Today => &mut self.today,
            VisitorCategory::Future => &mut self.future,
            VisitorCategory::Pending => &mut self.pending,
        }
    }
}
