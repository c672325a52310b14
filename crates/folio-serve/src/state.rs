//! Shared application state.

use std::sync::Arc;

use folio_content::{ContentRenderer, RenderOptions};

use crate::build_hook::{BuildTrigger, HttpBuildTrigger};
use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::store::{DocumentStore, MemoryStore};

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Likes, posts and hashes.
    pub store: Arc<dyn DocumentStore>,

    /// Site build trigger (absent when no build service is configured).
    pub builds: Option<Arc<dyn BuildTrigger>>,

    /// Markup renderer for post content.
    pub renderer: ContentRenderer,

    /// Per-client request budget.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Create application state backed by an in-memory store.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let builds = match &config.build_service_url {
            Some(url) => {
                let trigger = HttpBuildTrigger::new(url.clone(), config.build_service_token.clone())?;
                Some(Arc::new(trigger) as Arc<dyn BuildTrigger>)
            }
            None => {
                tracing::warn!("no build service configured; POST /builds will return 503");
                None
            }
        };

        Ok(Self::with_parts(config, Arc::new(MemoryStore::new()), builds))
    }

    /// Assemble state from explicit collaborators.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        builds: Option<Arc<dyn BuildTrigger>>,
    ) -> Self {
        let renderer = ContentRenderer::new(RenderOptions {
            asset_prefix: config.asset_prefix.clone(),
        });
        let rate_limiter = RateLimiter::new(config.rate_limit_points, config.rate_limit_window);

        Self {
            config: Arc::new(config),
            store,
            builds,
            renderer,
            rate_limiter,
        }
    }
}
