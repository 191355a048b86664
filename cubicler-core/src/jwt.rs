//! JWT helper: produces a bearer token for REST
//! provider calls, either a static configured token or an OAuth2
//! client-credentials token cached per server until near-expiry. The cache
//! is owned by each `JwtTokenCache` instance, not shared process-wide.

use dashmap::DashMap;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config_doc::JwtAuthConfig;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("token endpoint returned status {0}")]
    UpstreamStatus(u16),
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Per-instance OAuth2 token cache, keyed by caller-supplied cache key
/// (typically the REST server identifier).
#[derive(Default)]
pub struct JwtTokenCache {
    tokens: DashMap<String, CachedToken>,
}

impl JwtTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a bearer token for `cache_key` per the configured auth scheme.
    pub async fn bearer_token(
        &self,
        cache_key: &str,
        auth: &JwtAuthConfig,
    ) -> Result<String, JwtError> {
        match auth {
            JwtAuthConfig::Static { token } => Ok(token.clone()),
            JwtAuthConfig::Oauth2ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scope,
                refresh_threshold,
            } => {
                if let Some(cached) = self.tokens.get(cache_key) {
                    if cached.expires_at > Instant::now() {
                        return Ok(cached.token.clone());
                    }
                }

                let client = reqwest::Client::new();
                let mut form = vec![
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                ];
                if let Some(scope) = scope {
                    form.push(("scope", scope.as_str()));
                }

                let resp = client.post(token_url).form(&form).send().await?;
                if !resp.status().is_success() {
                    return Err(JwtError::UpstreamStatus(resp.status().as_u16()));
                }
                let body: TokenResponse = resp.json().await?;
                let ttl = body.expires_in.unwrap_or(3600);
                let usable_ttl = ttl.saturating_sub(*refresh_threshold);

                self.tokens.insert(
                    cache_key.to_string(),
                    CachedToken {
                        token: body.access_token.clone(),
                        expires_at: Instant::now() + Duration::from_secs(usable_ttl),
                    },
                );

                Ok(body.access_token)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_returns_verbatim() {
        let cache = JwtTokenCache::new();
        let auth = JwtAuthConfig::Static {
            token: "abc123".to_string(),
        };
        let token = cache.bearer_token("test-static", &auth).await.unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn separate_instances_do_not_share_cached_tokens() {
        let a = JwtTokenCache::new();
        let b = JwtTokenCache::new();
        a.tokens.insert(
            "shared-key".to_string(),
            CachedToken {
                token: "from-a".to_string(),
                expires_at: Instant::now() + Duration::from_secs(60),
            },
        );
        assert!(b.tokens.get("shared-key").is_none());
    }
}
