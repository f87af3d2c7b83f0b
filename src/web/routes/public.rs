use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::invoice_calc::{self, Dimensions, Quote};
use crate::models::{Category, Product};
use crate::web::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/categories/:id/products", get(category_products))
        .route("/products/:id", get(product_detail))
        .route("/products/:id/quote", get(product_quote))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Serialize, Debug)]
pub struct HomePage {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

pub async fn home(State(state): State<AppState>) -> Result<Json<HomePage>> {
    let categories = state.db.list_categories().await?;
    let products = state.db.list_products().await?;
    Ok(Json(HomePage {
        categories,
        products,
    }))
}

#[derive(Serialize, Debug)]
pub struct CategoryProducts {
    pub category: Category,
    pub products: Vec<Product>,
}

pub async fn category_products(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryProducts>> {
    let category = state
        .db
        .get_category(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("category {id}")))?;
    let products = state.db.list_products_in_category(id).await?;
    Ok(Json(CategoryProducts { category, products }))
}

#[derive(Serialize, Debug)]
pub struct ProductDetail {
    pub product: Product,
    pub labor_rate_per_sqft: f64,
}

pub async fn product_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetail>> {
    let product = find_product(&state, id).await?;
    let labor_rate_per_sqft = state.db.labor_rate().await?;
    Ok(Json(ProductDetail {
        product,
        labor_rate_per_sqft,
    }))
}

pub async fn product_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(dims): Query<Dimensions>,
) -> Result<Json<Quote>> {
    let product = find_product(&state, id).await?;
    let labor_rate = state.db.labor_rate().await?;
    Ok(Json(invoice_calc::quote(&product, labor_rate, dims)?))
}

async fn find_product(state: &AppState, id: i64) -> Result<Product> {
    state
        .db
        .get_product(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("product {id}")))
}
