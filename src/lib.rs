//! HTTP API over the Nuveq visitor-management site.
//!
//! Nuveq has no public API, so every operation drives a remote headless browser
//! (Browserless): one cached, authenticated session is shared by all requests,
//! visitor listings are scraped from the vendor's tables, and approve, reject
//! and delete are performed by clicking the row controls.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use handlers::{auth_handlers, visitor_handlers, AppState};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth_handlers::authenticate,
        auth_handlers::session_info,
        auth_handlers::logout,
        visitor_handlers::list_visitors,
        visitor_handlers::approve_visitor,
        visitor_handlers::reject_visitor,
        visitor_handlers::delete_visitor,
        visitor_handlers::sync_visitors,
        visitor_handlers::local_visitors,
    ),
    components(schemas(
        models::AuthRequest,
        models::AuthResponse,
        models::LogoutResponse,
        models::SessionInfo,
        models::Visitor,
        models::VisitorCategory,
        models::VisitorAction,
        models::VisitorListResponse,
        models::VisitorActionRequest,
        models::ActionResponse,
        models::CategorySnapshot,
        models::VisitorCache,
    )),
    tags(
        (name = "Authentication", description = "Vendor login and session lifecycle"),
        (name = "Visitors", description = "Visitor listings and actions")
    )
)]
pub struct ApiDoc;

/// Request bodies are tiny JSON documents (credentials, OTPs, visitor ids).
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/auth", post(auth_handlers::authenticate))
        .route("/api/auth/session", get(auth_handlers::session_info))
        .route("/api/auth/logout", post(auth_handlers::logout))
        .route("/api/visitors/list/:category", get(visitor_handlers::list_visitors))
        .route("/api/visitors/approve", post(visitor_handlers::approve_visitor))
        .route("/api/visitors/reject", post(visitor_handlers::reject_visitor))
        .route("/api/visitors/delete", post(visitor_handlers::delete_visitor))
        .route("/api/visitors/sync", post(visitor_handlers::sync_visitors))
        .route("/api/visitors/local", get(visitor_handlers::local_visitors))
        .route("/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
