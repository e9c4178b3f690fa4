use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::handlers::AppState;
use crate::models::{
    ActionResponse, AppResult, CategorySnapshot, ListingTarget, SessionHandle, VisitorAction,
    VisitorActionRequest, VisitorCache, VisitorCategory, VisitorListResponse,
};
use crate::utils::validate_action_request;

/// Drops the cached session when the vendor has logged it out under us.
async fn check_session<T>(state: &AppState, session: &SessionHandle, result: AppResult<T>) -> AppResult<T> {
    if let Err(e) = &result {
        if e.is_session_lost() {
            state.session_store.invalidate(&session.id).await;
        }
    }
    result
}

/// List visitors in one vendor category
#[utoipa::path(
    get,
    path = "/api/visitors/list/{category}",
    params(
        ("category" = String, Path, description = "today, future or pending")
    ),
    responses(
        (status = 200, description = "Visitors scraped from the vendor", body = VisitorListResponse),
        (status = 400, description = "Unknown category"),
        (status = 401, description = "Vendor authentication failed"),
        (status = 500, description = "Configuration, provider or scrape error")
    ),
    tag = "Visitors"
)]
pub async fn list_visitors(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<VisitorListResponse>> {
    let category: VisitorCategory = category.parse()?;
    state.config.require_vendor()?;

    let session = state.session_store.get_session().await?;
    let result = state
        .scraper
        .list(&session, &ListingTarget::Category(category))
        .await;
    let visitors = check_session(&state, &session, result).await?;

    Ok(Json(VisitorListResponse {
        success: true,
        category,
        count: visitors.len(),
        visitors,
        session: state.session_store.session_info().await,
    }))
}

async fn run_action(
    state: AppState,
    action: VisitorAction,
    request: VisitorActionRequest,
) -> AppResult<Json<ActionResponse>> {
    state.config.require_vendor()?;
    validate_action_request(&request)?;

    let session = state.session_store.get_session().await?;
    let result = state.scraper.act(&session, action, &request).await;
    let message = check_session(&state, &session, result).await?;

    Ok(Json(ActionResponse {
        success: true,
        message,
    }))
}

/// Approve a pending visitor
#[utoipa::path(
    post,
    path = "/api/visitors/approve",
    request_body = VisitorActionRequest,
    responses(
        (status = 200, description = "Visitor approved", body = ActionResponse),
        (status = 404, description = "Visitor or approve control not found"),
        (status = 500, description = "Configuration, provider or scrape error")
    ),
    tag = "Visitors"
)]
pub async fn approve_visitor(
    State(state): State<AppState>,
    Json(request): Json<VisitorActionRequest>,
) -> AppResult<Json<ActionResponse>> {
    run_action(state, VisitorAction::Approve, request).await
}

/// Reject a pending visitor
#[utoipa::path(
    post,
    path = "/api/visitors/reject",
    request_body = VisitorActionRequest,
    responses(
        (status = 200, description = "Visitor rejected", body = ActionResponse),
        (status = 404, description = "Visitor or reject control not found"),
        (status = 500, description = "Configuration, provider or scrape error")
    ),
    tag = "Visitors"
)]
pub async fn reject_visitor(
    State(state): State<AppState>,
    Json(request): Json<VisitorActionRequest>,
) -> AppResult<Json<ActionResponse>> {
    run_action(state, VisitorAction::Reject, request).await
}

/// Delete a visitor
#[utoipa::path(
    post,
    path = "/api/visitors/delete",
    request_body = VisitorActionRequest,
    responses(
        (status = 200, description = "Visitor deleted", body = ActionResponse),
        (status = 404, description = "Visitor or delete control not found"),
        (status = 500, description = "Configuration, provider or scrape error")
    ),
    tag = "Visitors"
)]
pub async fn delete_visitor(
    State(state): State<AppState>,
    Json(request): Json<VisitorActionRequest>,
) -> AppResult<Json<ActionResponse>> {
    run_action(state, VisitorAction::Delete, request).await
}

/// Scrape every category and rewrite the local visitor cache
#[utoipa::path(
    post,
    path = "/api/visitors/sync",
    responses(
        (status = 200, description = "Fresh cache contents", body = VisitorCache),
        (status = 401, description = "Vendor authentication failed"),
        (status = 500, description = "Configuration, provider or scrape error")
    ),
    tag = "Visitors"
)]
pub async fn sync_visitors(State(state): State<AppState>) -> AppResult<Json<VisitorCache>> {
    state.config.require_vendor()?;

    let session = state.session_store.get_session().await?;
    let mut cache = VisitorCache::default();
    for category in VisitorCategory::ALL {
        let result = state
            .scraper
            .list(&session, &ListingTarget::Category(category))
            .await;
        let visitors = check_session(&state, &session, result).await?;
        *cache.snapshot_mut(category) = CategorySnapshot::new(visitors, state.clock.now());
    }
    cache.last_sync = Some(state.clock.now());

    state.visitor_cache.write(&cache).await?;
    info!(
        today = cache.today.count,
        future = cache.future.count,
        pending = cache.pending.count,
        "visitor sync complete"
    );
    Ok(Json(cache))
}

/// Serve the last synced visitor data
#[utoipa::path(
    get,
    path = "/api/visitors/local",
    responses(
        (status = 200, description = "Cached visitors, empty when never synced", body = VisitorCache)
    ),
    tag = "Visitors"
)]
pub async fn local_visitors(State(state): State<AppState>) -> Json<VisitorCache> {
    Json(state.visitor_cache.read().await)
}
