//! Admin handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use pickntrust_models::ContentId;
use pickntrust_store::{Pagination, StoreStats};

use crate::auth::AdminAccess;
use crate::error::Result;
use crate::handlers::content::{authorize, create, delete, update};
use crate::state::AppState;
use crate::types::{
    products, ChannelPostResponse, ContentRequest, CreatedResponse, LimitQuery, PasswordBody,
    PasswordQuery, ProductResponse, SearchQuery, SuccessResponse,
};

/// Source recorded for rows created from the admin panel.
pub const ADMIN_PANEL_SOURCE: &str = "admin_panel";

/// POST /api/admin/auth - Verify the admin password.
pub async fn admin_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    body: Option<Json<PasswordBody>>,
) -> Result<Json<SuccessResponse>> {
    let body_password = body.as_ref().and_then(|Json(b)| b.password.as_deref());
    authorize(&state, &headers, body_password, &query, AdminAccess::Required)?;
    Ok(Json(SuccessResponse::new("authenticated")))
}

/// GET /api/admin/products - Every row, hidden ones included.
pub async fn admin_list_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(password): Query<PasswordQuery>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    authorize(&state, &headers, None, &password, AdminAccess::Required)?;
    let pagination = Pagination::admin(query.limit, query.offset);
    let items = state
        .db
        .search(query.category.as_deref(), query.search.as_deref(), pagination)?;
    Ok(Json(products(&items)))
}

/// POST /api/admin/products - Create a row.
pub async fn admin_create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    Json(req): Json<ContentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    authorize(&state, &headers, req.password.as_deref(), &query, AdminAccess::Required)?;
    create(&state, req, ADMIN_PANEL_SOURCE)
}

/// PUT /api/admin/products/:id - Update a row.
pub async fn admin_update_product(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    Json(req): Json<ContentRequest>,
) -> Result<Json<ProductResponse>> {
    authorize(&state, &headers, req.password.as_deref(), &query, AdminAccess::Required)?;
    update(&state, id, req)
}

/// DELETE /api/admin/products/:id - Delete a row.
pub async fn admin_delete_product(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    body: Option<Json<PasswordBody>>,
) -> Result<Json<SuccessResponse>> {
    let body_password = body.as_ref().and_then(|Json(b)| b.password.as_deref());
    authorize(&state, &headers, body_password, &query, AdminAccess::RequiredInProduction)?;
    delete(&state, id)
}

/// GET /api/admin/stats - Dashboard counters.
pub async fn admin_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
) -> Result<Json<StoreStats>> {
    authorize(&state, &headers, None, &query, AdminAccess::Required)?;
    Ok(Json(state.db.stats()?))
}

/// GET /api/admin/channel-posts - Latest ingested channel posts.
pub async fn admin_channel_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(password): Query<PasswordQuery>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ChannelPostResponse>>> {
    authorize(&state, &headers, None, &password, AdminAccess::Required)?;
    let limit = Pagination::admin(query.limit, None).limit;
    let posts = state.db.recent_channel_posts(limit)?;
    Ok(Json(posts.iter().map(ChannelPostResponse::from).collect()))
}
