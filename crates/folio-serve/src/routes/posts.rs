//! Post endpoints.
//!
//! Writes render the content first and reject markup that fails with `400`,
//! so only renderable posts reach the store. Reads attach rendered HTML to
//! each post. A stored post that still fails to render is an internal error.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::models::{Created, Post, PostList, PostPayload, RenderedPost};
use crate::state::AppState;

fn render_post(state: &AppState, post: Post) -> Result<RenderedPost, ApiError> {
    let rendered = state.renderer.render(&post.content).map_err(|e| {
        ApiError::Internal(anyhow::anyhow!("stored post {} failed to render: {e}", post.id))
    })?;
    Ok(RenderedPost::new(post, rendered))
}

/// `GET /posts`
///
/// Newest first. With `?published`, drafts are left out.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PostList>, ApiError> {
    let published_only = params.contains_key("published");

    let posts = state
        .store
        .list_posts()
        .await?
        .into_iter()
        .filter(|post| !(published_only && post.draft))
        .map(|post| render_post(&state, post))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(PostList { posts }))
}

/// `GET /posts/{id}`
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RenderedPost>, ApiError> {
    let post = state
        .store
        .get_post(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("post {id}")))?;

    Ok(Json(render_post(&state, post)?))
}

/// `POST /posts`
pub async fn create_post(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PostPayload>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    state.renderer.render(&payload.content)?;
    let id = state.store.insert_post(payload).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// `PUT /posts/{id}`
pub async fn put_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<PostPayload>,
) -> Result<Json<Created>, ApiError> {
    state.renderer.render(&payload.content)?;
    state.store.put_post(&id, payload).await?;
    Ok(Json(Created { id }))
}

/// `DELETE /posts/{id}`
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_post(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
