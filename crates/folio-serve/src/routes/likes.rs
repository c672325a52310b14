//! Like endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::models::{Created, LikeList, LikePayload};
use crate::state::AppState;

/// `GET /likes`
pub async fn list_likes(State(state): State<AppState>) -> Result<Json<LikeList>, ApiError> {
    let likes = state.store.list_likes().await?;
    Ok(Json(LikeList { likes }))
}

/// `POST /likes`
pub async fn create_like(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LikePayload>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let id = state.store.insert_like(payload).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// `DELETE /likes/{id}`
pub async fn delete_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_like(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
