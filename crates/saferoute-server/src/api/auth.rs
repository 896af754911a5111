//! Authentication middleware for moderator endpoints.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// Admin token from config. `None` disables moderator endpoints.
#[derive(Clone)]
pub struct AdminToken(pub Option<Arc<String>>);

impl AdminToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.map(Arc::new))
    }
}

/// Middleware that requires a valid admin token in the Authorization header.
///
/// Expected header format: `Authorization: Bearer <admin_token>`
pub async fn require_admin(
    State(admin_token): State<AdminToken>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = admin_token.0.as_deref() else {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "Moderation is disabled",
                "hint": "Set SAFEROUTE_ADMIN_TOKEN to enable hazard verification"
            })),
        )
            .into_response();
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match auth_header.and_then(|auth| auth.strip_prefix("Bearer ")) {
        Some(token) if token.trim() == expected.as_str() => next.run(request).await,
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "Invalid admin token"
            })),
        )
            .into_response(),
        None if auth_header.is_some() => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Invalid Authorization header format",
                "expected": "Bearer <token>"
            })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Authorization required",
                "hint": "Add header: Authorization: Bearer <admin_token>"
            })),
        )
            .into_response(),
    }
}
