//! Catalog read handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{PathRejection, QueryRejection}},
    routing::get,
};
use serde::Deserialize;

use stern_core::ProductId;

use crate::db::CatalogRepository;
use crate::error::AppError;
use crate::models::product::{CatalogProduct, Category, ProductView, SearchHit};
use crate::state::AppState;

/// Page size when the client sends no `limit`.
const DEFAULT_LIST_LIMIT: i64 = 50;

/// Shortest search term that hits the database.
const MIN_SEARCH_LEN: usize = 2;

/// Build the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list))
        .route("/api/products/featured", get(featured))
        .route("/api/products/{id}", get(show))
        .route("/api/categories", get(categories))
        .route("/api/search/products", get(search))
}

/// Query string of `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
}

/// Query string of `GET /api/search/products`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

fn views<'a>(
    products: impl IntoIterator<Item = &'a CatalogProduct>,
    state: &AppState,
) -> Vec<ProductView> {
    let base = &state.config().image_base_path;
    products
        .into_iter()
        .map(|p| ProductView::new(p, base))
        .collect()
}

/// Active products, newest first.
///
/// # Errors
///
/// Returns 400 for a malformed query string.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let Query(query) = query?;
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let products = CatalogRepository::new(state.pool())
        .list_products(category, query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(views(&products, &state)))
}

/// The featured shelf, served from cache.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>, AppError> {
    let products = state.catalog().featured(state.pool()).await?;
    Ok(Json(views(products.iter(), &state)))
}

/// Product detail.
///
/// # Errors
///
/// Returns 404 if the product is missing or inactive.
pub async fn show(
    State(state): State<AppState>,
    path: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<ProductView>, AppError> {
    let Path(id) = path?;
    let product = CatalogRepository::new(state.pool()).get_product(id).await?;
    Ok(Json(ProductView::new(
        &product,
        &state.config().image_base_path,
    )))
}

/// All categories, served from cache.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.catalog().categories(state.pool()).await?;
    Ok(Json(categories.as_ref().clone()))
}

/// Quick search over product names and categories.
///
/// # Errors
///
/// Returns 400 for a malformed query string.
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    let Query(query) = query?;
    let term = query.q.trim();
    if term.chars().count() < MIN_SEARCH_LEN {
        return Ok(Json(Vec::new()));
    }

    let base = &state.config().image_base_path;
    let hits = CatalogRepository::new(state.pool())
        .search(term)
        .await?
        .iter()
        .map(|p| SearchHit::new(p, base))
        .collect();
    Ok(Json(hits))
}
