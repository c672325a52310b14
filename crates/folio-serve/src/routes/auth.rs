//! Token issuance.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;

use crate::auth::issue_token;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    token: String,
}

/// `POST /auth`
///
/// Exchanges Basic credentials for a bearer token.
pub async fn create_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = issue_token(&state.config, &headers)?;
    tracing::info!("token issued");
    Ok(Json(TokenResponse { token }))
}
