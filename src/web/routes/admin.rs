use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{self, AdminContext, Credentials, SessionToken};
use crate::error::Result;
use crate::models::{Category, Invoice, LaborCost, NewProduct, Product, ProductChanges};
use crate::web::middleware::BearerToken;
use crate::web::AppState;

/// Session-protected admin routes (login is mounted separately).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/logout", post(logout))
        .route("/categories", post(create_category))
        .route("/categories/:id", put(rename_category))
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product))
        .route("/labor", put(update_labor))
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionToken>> {
    let session = auth::login(&state.db, &credentials, state.config.session_ttl()).await?;
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<StatusCode> {
    auth::logout(&state.db, &token).await?;
    tracing::info!(admin_id = admin.admin_id(), "admin logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize, Debug)]
pub struct Dashboard {
    pub admin: String,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub labor_cost: Option<LaborCost>,
    pub invoices: Vec<Invoice>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
) -> Result<Json<Dashboard>> {
    Ok(Json(Dashboard {
        admin: admin.username().to_string(),
        categories: state.db.list_categories().await?,
        products: state.db.list_products().await?,
        labor_cost: state.db.labor_cost().await?,
        invoices: state.db.list_invoices().await?,
    }))
}

#[derive(Deserialize, Debug)]
pub struct CategoryRequest {
    pub name: String,
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = state.db.create_category(&body.name).await?;
    tracing::info!(category_id = category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn rename_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    Ok(Json(state.db.rename_category(id, &body.name).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.db.create_product(&body).await?;
    tracing::info!(product_id = product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ProductChanges>,
) -> Result<Json<Product>> {
    let product = state.db.update_product(id, body).await?;
    tracing::info!(product_id = id, price = product.price_per_sqft, "product updated");
    Ok(Json(product))
}

#[derive(Deserialize, Debug)]
pub struct LaborRequest {
    pub rate: f64,
}

pub async fn update_labor(
    State(state): State<AppState>,
    Json(body): Json<LaborRequest>,
) -> Result<Json<serde_json::Value>> {
    let labor = state.db.set_labor_rate(body.rate).await?;
    tracing::info!(rate = labor.rate_per_sqft, "labor rate updated");
    Ok(Json(json!({ "rate_per_sqft": labor.rate_per_sqft })))
}
