//! Credential exchange and bearer token middleware.
//!
//! Clients trade HTTP Basic credentials for a short-lived HS256 token at
//! `POST /auth`, then send it on every protected request:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_SUBJECT: &str = "folio-admin";

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Decode `Authorization: Basic base64(user:pass)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Check Basic credentials against the configured pair and sign a token.
pub fn issue_token(config: &Config, headers: &HeaderMap) -> Result<String, ApiError> {
    let Some((user, pass)) = basic_credentials(headers) else {
        tracing::debug!("missing or malformed basic authorization header");
        return Err(ApiError::Unauthorized);
    };

    if user != config.api_username || pass != config.api_password {
        tracing::info!(user = %user, "rejected credentials");
        return Err(ApiError::Unauthorized);
    }

    sign_token(config)
}

/// Sign a token valid for the configured TTL.
pub fn sign_token(config: &Config) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let ttl = i64::try_from(config.token_ttl.as_secs()).unwrap_or(i64::MAX);
    let claims = Claims {
        sub: TOKEN_SUBJECT.to_string(),
        iat: now,
        exp: now.saturating_add(ttl),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
}

/// Verify signature and expiry.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "invalid token");
        ApiError::Unauthorized
    })
}

/// Middleware that requires a valid bearer token.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!("missing or malformed authorization header");
        return Err(ApiError::Unauthorized);
    };

    verify_token(&state.config.token_secret, token)?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> Config {
        Config::for_tests()
    }

    fn basic(user_pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("Basic {}", STANDARD.encode(user_pass));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        headers
    }

    #[test]
    fn basic_credentials_decodes_pair() {
        let headers = basic("george:pa:ss");
        assert_eq!(
            basic_credentials(&headers),
            Some(("george".to_string(), "pa:ss".to_string()))
        );
    }

    #[test]
    fn basic_credentials_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
        assert!(basic_credentials(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(basic_credentials(&headers).is_none());

        assert!(basic_credentials(&HeaderMap::new()).is_none());
    }

    #[test]
    fn issued_token_verifies() {
        let config = config();
        let token = issue_token(&config, &basic("george:hunter2")).unwrap();
        let claims = verify_token(&config.token_secret, &token).unwrap();
        assert_eq!(claims.sub, TOKEN_SUBJECT);
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let result = issue_token(&config(), &basic("george:wrong"));
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = sign_token(&config()).unwrap();
        assert!(matches!(
            verify_token("other", &token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: TOKEN_SUBJECT.to_string(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(matches!(
            verify_token("secret", &token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
