//! Unified content handlers.
//!
//! Reads are public; writes need the admin password.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use pickntrust_core::{categorize, should_auto_categorize};
use pickntrust_models::{ContentId, NewContent, SourceType};
use pickntrust_store::Pagination;
use tracing::info;

use crate::auth::{supplied_password, verify_admin, AdminAccess};
use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{
    products, ContentListQuery, ContentRequest, CreatedResponse, FlagRequest, PasswordBody,
    PasswordQuery, ProductResponse, SuccessResponse,
};

pub(crate) fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    body: Option<&str>,
    query: &PasswordQuery,
    access: AdminAccess,
) -> Result<()> {
    let supplied = supplied_password(headers, body, query.password.as_deref());
    verify_admin(&state.settings, supplied, access)
}

/// Fills flags, category and display pages of an uncategorized row.
fn auto_categorize(content: &mut NewContent) {
    let cat = categorize(
        &content.title,
        content.description.as_deref().unwrap_or(""),
        content.page_type.as_deref().unwrap_or(""),
        content.affiliate_platform.as_deref().unwrap_or(""),
    );
    content.is_featured |= cat.is_featured;
    content.is_service |= cat.is_service;
    content.is_ai_app |= cat.is_ai_app;
    content.category = Some(cat.category);
    for page in cat.display_pages.as_slice() {
        content.display_pages.push(page);
    }
}

pub(crate) fn create(
    state: &AppState,
    req: ContentRequest,
    source_type: &str,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let uncategorized = req.category.as_deref().map_or(true, |c| c.trim().is_empty());
    let mut content = req.into_new_content(source_type)?;
    if uncategorized && should_auto_categorize(source_type) {
        auto_categorize(&mut content);
    }
    let id = state.db.insert_content(&content)?;
    let item = state
        .db
        .get_content(id)?
        .ok_or_else(|| ApiError::Internal(format!("content {} vanished after insert", id)))?;
    info!(id, source = source_type, "Created content");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            message: "content created".to_string(),
            product: ProductResponse::from(&item),
        }),
    ))
}

pub(crate) fn update(state: &AppState, id: ContentId, req: ContentRequest) -> Result<Json<ProductResponse>> {
    let patch = req.into_patch()?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }
    let item = state.db.update_content(id, patch)?;
    Ok(Json(ProductResponse::from(&item)))
}

pub(crate) fn delete(state: &AppState, id: ContentId) -> Result<Json<SuccessResponse>> {
    if !state.db.delete_content(id)? {
        return Err(ApiError::NotFound(format!("content {}", id)));
    }
    Ok(Json(SuccessResponse::new("content deleted")))
}

/// GET /api/content/:page_type - Visible rows of a page type.
pub async fn list_content(
    State(state): State<AppState>,
    Path(page_type): Path<String>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let pagination = Pagination::public(query.limit, query.offset);
    let items = state.db.list_by_page_type(
        &page_type,
        query.category.as_deref(),
        query.featured,
        pagination,
    )?;
    Ok(Json(products(&items)))
}

/// GET /api/content/:page_type/categories - Categories of a page type.
pub async fn list_content_categories(
    State(state): State<AppState>,
    Path(page_type): Path<String>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.db.page_type_categories(&page_type)?))
}

/// GET /api/content/item/:id - A single row, hidden or not.
pub async fn get_content_item(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
) -> Result<Json<ProductResponse>> {
    let item = state
        .db
        .get_content(id)?
        .ok_or_else(|| ApiError::NotFound(format!("content {}", id)))?;
    Ok(Json(ProductResponse::from(&item)))
}

/// POST /api/content - Create a row.
pub async fn create_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    Json(req): Json<ContentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    authorize(&state, &headers, req.password.as_deref(), &query, AdminAccess::Required)?;
    let source_type = req
        .source_type
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| SourceType::Manual.as_str().to_string());
    create(&state, req, &source_type)
}

/// PUT /api/content/:id - Update a row.
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    Json(req): Json<ContentRequest>,
) -> Result<Json<ProductResponse>> {
    authorize(&state, &headers, req.password.as_deref(), &query, AdminAccess::Required)?;
    update(&state, id, req)
}

/// DELETE /api/content/:id - Delete a row.
pub async fn delete_content(
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

/// PATCH /api/content/:id/featured - Toggle the featured flag.
pub async fn set_content_featured(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    Json(req): Json<FlagRequest>,
) -> Result<Json<ProductResponse>> {
    authorize(&state, &headers, req.password.as_deref(), &query, AdminAccess::Required)?;
    let item = state.db.set_featured(id, req.enabled)?;
    Ok(Json(ProductResponse::from(&item)))
}

/// PATCH /api/content/:id/active - Toggle the active flag.
pub async fn set_content_active(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
    headers: HeaderMap,
    Query(query): Query<PasswordQuery>,
    Json(req): Json<FlagRequest>,
) -> Result<Json<ProductResponse>> {
    authorize(&state, &headers, req.password.as_deref(), &query, AdminAccess::Required)?;
    let item = state.db.set_active(id, req.enabled)?;
    Ok(Json(ProductResponse::from(&item)))
}
