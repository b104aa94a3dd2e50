//! Public listing handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use pickntrust_models::pages::HOME;
use pickntrust_store::Pagination;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{products, CategoryQuery, LimitQuery, PageQuery, ProductResponse, SearchQuery};

fn require_page(page: &str) -> Result<&str> {
    let page = page.trim();
    if page.is_empty() {
        return Err(ApiError::BadRequest("page parameter is required".to_string()));
    }
    Ok(page)
}

/// GET /api/products/page/:page - Visible rows of a site page.
pub async fn list_page_products(
    State(state): State<AppState>,
    Path(page): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let page = require_page(&page)?;
    let pagination = Pagination::public(query.limit, query.offset);
    let items = state
        .db
        .list_page(page, query.category.as_deref(), pagination)?;
    debug!(page, count = items.len(), "Listed page products");
    Ok(Json(products(&items)))
}

/// GET /api/categories/page/:page - Categories present on a page.
pub async fn list_page_categories(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<Vec<String>>> {
    let page = require_page(&page)?;
    Ok(Json(state.db.page_categories(page)?))
}

/// GET /api/products/category/:category - Visible rows of a category.
pub async fn list_category_products(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let page = query.page.as_deref().unwrap_or(HOME);
    let pagination = Pagination::public(query.limit, query.offset);
    let items = state.db.list_by_category(&category, page, pagination)?;
    Ok(Json(products(&items)))
}

/// GET /api/products/featured - Featured rows.
pub async fn list_featured(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    Ok(Json(products(&state.db.list_featured(query.limit)?)))
}

/// GET /api/products - Search over visible rows.
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let pagination = Pagination::clamped(query.limit, query.offset, 100, Pagination::ADMIN_MAX_LIMIT);
    let items = state.db.search_visible(
        query.category.as_deref(),
        query.search.as_deref(),
        pagination,
    )?;
    Ok(Json(products(&items)))
}

/// GET /api/services - Visible services.
pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    Ok(Json(products(&state.db.list_services()?)))
}

/// GET /api/products/apps - Visible apps.
pub async fn list_apps(State(state): State<AppState>) -> Result<Json<Vec<ProductResponse>>> {
    Ok(Json(products(&state.db.list_apps()?)))
}
