use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;

use crate::auth::AdminContext;
use crate::error::{Error, Result};
use crate::invoice_calc::{self, InvoiceRequest, InvoiceStore};
use crate::models::Invoice;
use crate::web::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create_invoice).get(list_invoices))
        .route("/invoices/:id", get(get_invoice))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Json(body): Json<InvoiceRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let id = invoice_calc::create_invoice(&state.db, &state.db, &body)
        .await
        .inspect_err(|e| {
            tracing::warn!(admin_id = admin.admin_id(), product_id = body.product_id, error = %e, "invoice not created");
        })?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn list_invoices(State(state): State<AppState>) -> Result<Json<Vec<Invoice>>> {
    Ok(Json(InvoiceStore::list_invoices(&state.db).await?))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Invoice>> {
    InvoiceStore::get_invoice(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("invoice {id}")))
}
