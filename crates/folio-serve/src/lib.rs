//! Folio Serve - HTTP API for a personal site's content
//!
//! This crate provides the authoring API behind a statically built site:
//! posts, likes and asset hashes are stored through a [`DocumentStore`], post
//! markup is rendered with [`folio_content`], and site rebuilds are forwarded
//! to an external build service.
//!
//! # Authentication
//!
//! `POST /auth` exchanges Basic credentials for a short-lived bearer token.
//! Every other endpoint except `/` and `/health` requires that token.
//!
//! # Architecture
//!
//! - **AppState**: Shared application state (store, renderer, rate limiter)
//! - **Auth**: Token issuance and bearer token middleware
//! - **Rate limiting**: Per-client point budget backed by moka
//! - **Routes**: Endpoint handlers grouped by resource

mod auth;
pub mod build_hook;
pub mod config;
mod error;
mod extract;
pub mod models;
pub mod rate_limit;
mod routes;
mod state;
pub mod store;

pub use self::auth::{Claims, require_token};
pub use self::build_hook::{BuildTrigger, HttpBuildTrigger};
pub use self::config::Config;
pub use self::error::ApiError;
pub use self::rate_limit::RateLimiter;
pub use self::routes::router;
pub use self::state::AppState;
pub use self::store::{DocumentStore, MemoryStore};
