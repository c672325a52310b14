//! Markup preview rendering.

use axum::Json;
use axum::extract::State;
use folio_content::Rendered;

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::models::ContentRequest;
use crate::state::AppState;

/// `POST /content`
///
/// Renders `{content}` to `{html, htmlPreview}`. Markup that fails to parse
/// or validate is a `400`.
pub async fn render_content(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ContentRequest>,
) -> Result<Json<Rendered>, ApiError> {
    Ok(Json(state.renderer.render(&request.content)?))
}
