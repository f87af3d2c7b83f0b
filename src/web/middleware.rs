use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::auth::{self, AdminContext};
use crate::web::errors::json_error;
use crate::web::AppState;

/// Bearer token presented on an admin request.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Resolve the bearer token and attach an [`AdminContext`] to the request.
pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_bearer(req.headers()).map(str::to_string) else {
        return unauthorized();
    };

    let ctx: AdminContext = match auth::resolve_session(&state.db, &token, Utc::now()).await {
        Ok(Some(ctx)) => ctx,
        Ok(None) => return unauthorized(),
        Err(e) => return e.into_response(),
    };

    req.extensions_mut().insert(ctx);
    req.extensions_mut().insert(BearerToken(token));

    next.run(req).await
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn unauthorized() -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", "admin login required")
}
