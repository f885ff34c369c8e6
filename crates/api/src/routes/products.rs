//! Product route handlers.
//!
//! Reads go through the catalog cache. Every write clears it, so a seller
//! sees their change on the next listing request.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use craftly_core::{ProductFilter, ProductId, ProductSort, ProductSummary};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::models::{CurrentUser, NewProduct, ProductDetail, ProductUpdate};
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/categories", get(categories))
        .route("/{id}", get(show).put(update).delete(destroy))
}

/// Listing query string.
///
/// Kept flat rather than flattening [`ProductFilter`], since urlencoded
/// values only deserialize into typed fields at the top level.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub sort: Option<ProductSort>,
}

impl ListQuery {
    fn into_parts(self) -> (ProductFilter, ProductSort) {
        let filter = ProductFilter {
            query: self.q,
            category: self.category,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock_only: self.in_stock.unwrap_or(false),
        };
        (filter, self.sort.unwrap_or_default())
    }
}

/// List products.
///
/// GET /api/products?q=&category=&min_price=&max_price=&in_stock=&sort=
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductSummary>>> {
    let (filter, sort) = query.into_parts();
    let products = state.catalog().list(state.pool(), &filter, sort).await?;
    Ok(Json(products.as_ref().clone()))
}

/// Product detail.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetail>> {
    let detail = state
        .catalog()
        .product(state.pool(), ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(detail.as_ref().clone()))
}

/// Distinct product categories.
///
/// GET /api/products/categories
#[instrument(skip(state))]
async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let categories = state.catalog().categories(state.pool()).await?;
    Ok(Json(categories.as_ref().clone()))
}

/// List a new product for the logged-in seller.
///
/// POST /api/products
#[instrument(skip(state, user, product), fields(seller_id = %user.id))]
async fn create(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Json(product): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductSummary>)> {
    product.validate()?;

    let created = ProductRepository::new(state.pool())
        .create(user.id, &product)
        .await?;
    state.catalog().invalidate_all().await;

    tracing::info!(product_id = %created.id, "Product listed");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a product. Only its seller or an admin may.
///
/// PUT /api/products/{id}
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
async fn update(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<i32>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<ProductSummary>> {
    let id = ProductId::new(id);
    let products = ProductRepository::new(state.pool());

    ensure_owner(&products, &user, id).await?;
    update.validate()?;

    let updated = products.update(id, &update).await?;
    state.catalog().invalidate_all().await;

    Ok(Json(updated))
}

/// Delete a product. Only its seller or an admin may.
///
/// DELETE /api/products/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn destroy(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let id = ProductId::new(id);
    let products = ProductRepository::new(state.pool());

    ensure_owner(&products, &user, id).await?;

    if !products.delete(id).await? {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    state.catalog().invalidate_all().await;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Reject unless `user` sells product `id` or is an admin.
async fn ensure_owner(
    products: &ProductRepository<'_>,
    user: &CurrentUser,
    id: ProductId,
) -> Result<()> {
    let detail = products
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    if detail.product.seller_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "only the seller can change this product".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let (filter, sort) = ListQuery::default().into_parts();
        assert!(filter.is_empty());
        assert_eq!(sort, ProductSort::Newest);
    }

    #[test]
    fn test_list_query_maps_to_filter() {
        let query = ListQuery {
            q: Some("mug".to_string()),
            in_stock: Some(true),
            min_price: Some(Decimal::new(500, 2)),
            sort: Some(ProductSort::PriceAsc),
            ..ListQuery::default()
        };
        let (filter, sort) = query.into_parts();
        assert_eq!(filter.query.as_deref(), Some("mug"));
        assert!(filter.in_stock_only);
        assert_eq!(filter.min_price, Some(Decimal::new(500, 2)));
        assert_eq!(sort, ProductSort::PriceAsc);
    }
}
