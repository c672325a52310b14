//! Site build endpoint.

use axum::Json;
use axum::extract::State;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /builds`
///
/// Forwards to the build service and relays its JSON response.
pub async fn start_build(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(builds) = &state.builds else {
        return Err(ApiError::ServiceUnavailable(
            "no build service configured".to_string(),
        ));
    };

    Ok(Json(builds.trigger().await?))
}
