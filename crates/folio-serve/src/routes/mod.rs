//! API route definitions.

mod auth;
mod builds;
mod content;
mod hashes;
mod health;
mod likes;
mod posts;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::require_token;
use crate::rate_limit::{intense_rate_limit, rate_limit};
use crate::state::AppState;

/// Build the complete API router.
///
/// # Route Structure
///
/// ## Public (no auth)
/// - `GET /` - Greeting
/// - `GET /health` - Health check
/// - `POST /auth` - Exchange Basic credentials for a token (10 points)
///
/// ## Protected (token required, 1 point per request)
///
/// ### Likes
/// - `GET /likes` - All likes, newest first
/// - `POST /likes` - Add a like
/// - `DELETE /likes/{id}` - Remove a like
///
/// ### Posts
/// - `GET /posts` - All posts with rendered HTML (`?published` drops drafts)
/// - `GET /posts/{id}` - One post with rendered HTML
/// - `POST /posts` - Create a post
/// - `PUT /posts/{id}` - Replace a post
/// - `DELETE /posts/{id}` - Remove a post
///
/// ### Site
/// - `POST /builds` - Start a site build
/// - `GET /hashes` - Current asset hash list
/// - `POST /hashes` - Replace the asset hash list
///
/// ## Protected, not rate limited
/// - `POST /content` - Render markup to HTML
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check));

    let credentials = Router::new()
        .route("/auth", post(auth::create_token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            intense_rate_limit,
        ));

    let editor = Router::new()
        .route("/content", post(content::render_content))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    let protected = Router::new()
        .route("/likes", get(likes::list_likes).post(likes::create_like))
        .route("/likes/{id}", delete(likes::delete_like))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::put_post)
                .delete(posts::delete_post),
        )
        .route("/builds", post(builds::start_build))
        .route("/hashes", get(hashes::get_hashes).post(hashes::put_hashes))
        // Token check runs after the rate limit
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let cors = cors_layer(&state.config.allowed_origin);

    Router::new()
        .merge(public)
        .merge(credentials)
        .merge(editor)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            tracing::error!(origin = %origin, error = %e, "invalid allowed origin; cross-origin requests disabled");
            AllowOrigin::list([])
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::POST,
            Method::PUT,
            Method::GET,
            Method::OPTIONS,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}
