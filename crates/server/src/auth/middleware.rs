//! # Authentication Middleware
//!
//! Provides the `ApiAccess` extractor guarding the file routes. When the
//! server has an `api_token` configured, requests must carry it as
//! `Authorization: Bearer <token>`; otherwise every request is let through.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::state::AppState;

/// Proof that the request passed the bearer-token check.
#[derive(Debug, Clone, Copy)]
pub struct ApiAccess;

/// A custom rejection type for authentication failures.
pub struct AuthError(StatusCode, String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl FromRequestParts<AppState> for ApiAccess {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.api_token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(ApiAccess);
        };

        let bearer_header =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    warn!("Unexpected error during header extraction: {}", e);
                    AuthError(
                        StatusCode::BAD_REQUEST,
                        "Invalid Authorization header format.".to_string(),
                    )
                })?;

        match bearer_header {
            Some(TypedHeader(Authorization(bearer))) if bearer.token() == expected => {
                debug!("API token accepted.");
                Ok(ApiAccess)
            }
            Some(_) => {
                warn!("Rejected request with an invalid API token.");
                Err(AuthError(
                    StatusCode::UNAUTHORIZED,
                    "Invalid API token.".to_string(),
                ))
            }
            None => Err(AuthError(
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header.".to_string(),
            )),
        }
    }
}
