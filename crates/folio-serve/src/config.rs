//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:9000").
    pub bind_addr: String,

    /// Value of `Access-Control-Allow-Origin` (the site's own origin).
    pub allowed_origin: String,

    /// Username accepted by `POST /auth`.
    pub api_username: String,

    /// Password accepted by `POST /auth`.
    pub api_password: String,

    /// HMAC secret used to sign and verify bearer tokens.
    pub token_secret: String,

    /// Lifetime of issued tokens.
    pub token_ttl: Duration,

    /// Points each client may spend per rate-limit window.
    pub rate_limit_points: u32,

    /// Length of the rate-limit window.
    pub rate_limit_window: Duration,

    /// Prefix for image sources in rendered content.
    pub asset_prefix: String,

    /// Endpoint that starts a site build (optional).
    pub build_service_url: Option<String>,

    /// Bearer token sent to the build service (optional).
    pub build_service_token: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("allowed_origin", &self.allowed_origin)
            .field("api_username", &self.api_username)
            .field("token_ttl", &self.token_ttl)
            .field("rate_limit_points", &self.rate_limit_points)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("asset_prefix", &self.asset_prefix)
            .field("build_service_url", &self.build_service_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `FOLIO_API_USERNAME`, `FOLIO_API_PASSWORD`: credentials for `POST /auth`
    /// - `FOLIO_TOKEN_SECRET`: token signing secret
    ///
    /// Optional:
    /// - `FOLIO_BIND_ADDR`: Server bind address (default: "0.0.0.0:9000")
    /// - `FOLIO_ALLOWED_ORIGIN`: CORS origin (default: "http://localhost:8080")
    /// - `FOLIO_TOKEN_TTL_SECS`: Token lifetime (default: 7200)
    /// - `FOLIO_RATE_LIMIT_POINTS`: Budget per window (default: 100)
    /// - `FOLIO_RATE_LIMIT_WINDOW_SECS`: Window length (default: 60)
    /// - `FOLIO_ASSET_PREFIX`: Image path prefix (default: "/assets")
    /// - `FOLIO_BUILD_SERVICE_URL`: Build trigger endpoint
    /// - `FOLIO_BUILD_SERVICE_TOKEN`: Bearer token for the build endpoint
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("FOLIO_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());

        let allowed_origin = std::env::var("FOLIO_ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let api_username = required("FOLIO_API_USERNAME")?;
        let api_password = required("FOLIO_API_PASSWORD")?;
        let token_secret = required("FOLIO_TOKEN_SECRET")?;

        let token_ttl = Duration::from_secs(parse_or("FOLIO_TOKEN_TTL_SECS", 7200)?);
        let rate_limit_points = parse_or("FOLIO_RATE_LIMIT_POINTS", 100)?;
        let rate_limit_window = Duration::from_secs(parse_or("FOLIO_RATE_LIMIT_WINDOW_SECS", 60)?);

        if rate_limit_window.is_zero() {
            anyhow::bail!("FOLIO_RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        let asset_prefix = std::env::var("FOLIO_ASSET_PREFIX")
            .unwrap_or_else(|_| folio_content::DEFAULT_ASSET_PREFIX.to_string())
            .trim_end_matches('/')
            .to_string();

        let build_service_url = optional("FOLIO_BUILD_SERVICE_URL");
        let build_service_token = optional("FOLIO_BUILD_SERVICE_TOKEN");

        tracing::info!(
            bind_addr = %bind_addr,
            allowed_origin = %allowed_origin,
            token_ttl_secs = token_ttl.as_secs(),
            rate_limit_points,
            rate_limit_window_secs = rate_limit_window.as_secs(),
            asset_prefix = %asset_prefix,
            build_service = build_service_url.as_deref().unwrap_or("<none>"),
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            allowed_origin,
            api_username,
            api_password,
            token_secret,
            token_ttl,
            rate_limit_points,
            rate_limit_window,
            asset_prefix,
            build_service_url,
            build_service_token,
        })
    }
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for unit and router tests.
    pub(crate) fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            allowed_origin: "http://localhost:8080".to_string(),
            api_username: "george".to_string(),
            api_password: "hunter2".to_string(),
            token_secret: "secret".to_string(),
            token_ttl: Duration::from_secs(60),
            rate_limit_points: 100,
            rate_limit_window: Duration::from_secs(60),
            asset_prefix: folio_content::DEFAULT_ASSET_PREFIX.to_string(),
            build_service_url: None,
            build_service_token: None,
        }
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} value '{raw}': {e}")),
        None => Ok(default),
    }
}
