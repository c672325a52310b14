//! Asset hash list endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::models::HashList;
use crate::state::AppState;

/// `GET /hashes`
pub async fn get_hashes(State(state): State<AppState>) -> Result<Json<HashList>, ApiError> {
    Ok(Json(state.store.get_hashes().await?))
}

/// `POST /hashes`
pub async fn put_hashes(
    State(state): State<AppState>,
    ValidatedJson(list): ValidatedJson<HashList>,
) -> Result<(StatusCode, Json<HashList>), ApiError> {
    let stored = state.store.put_hashes(list).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
