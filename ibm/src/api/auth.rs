//! IAM authentication
//!
//! An API key is exchanged for a bearer token at the IAM token endpoint and
//! the token is cached until shortly before it expires. A pre-issued IAM
//! token can be used instead, in which case it is sent unchanged.

use super::error::ApiError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com";

const GRANT_TYPE_APIKEY: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Refresh tokens this long before IAM says they expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// How the provider authenticates, as configured
#[derive(Clone)]
pub enum AuthMethod {
    ApiKey {
        api_key: String,
        iam_endpoint: Option<String>,
    },
    Token(String),
}

#[derive(Clone)]
pub struct Authenticator {
    credentials: Credentials,
}

#[derive(Clone)]
enum Credentials {
    Token(String),
    ApiKey {
        api_key: String,
        token_url: String,
        http_client: reqwest::Client,
        cache: Arc<RwLock<Option<CachedToken>>>,
    },
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    /// Unix seconds
    expiration: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IamErrorResponse {
    error_code: Option<String>,
    error_message: Option<String>,
}

impl Authenticator {
    pub fn new(method: &AuthMethod, http_client: reqwest::Client) -> Self {
        match method {
            AuthMethod::ApiKey {
                api_key,
                iam_endpoint,
            } => Self::from_api_key(api_key, iam_endpoint.as_deref(), http_client),
            AuthMethod::Token(token) => Self::from_token(token),
        }
    }

    /// Uses a pre-issued IAM access token, with or without the `Bearer ` prefix
    pub fn from_token(token: &str) -> Self {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        Self {
            credentials: Credentials::Token(token.to_string()),
        }
    }

    pub fn from_api_key(
        api_key: &str,
        iam_endpoint: Option<&str>,
        http_client: reqwest::Client,
    ) -> Self {
        let endpoint = iam_endpoint
            .unwrap_or(DEFAULT_IAM_ENDPOINT)
            .trim_end_matches('/');
        Self {
            credentials: Credentials::ApiKey {
                api_key: api_key.to_string(),
                token_url: format!("{}/identity/token", endpoint),
                http_client,
                cache: Arc::new(RwLock::new(None)),
            },
        }
    }

    /// Value for the Authorization header
    pub async fn authorization(&self) -> Result<String, ApiError> {
        Ok(format!("Bearer {}", self.token().await?))
    }

    pub async fn token(&self) -> Result<String, ApiError> {
        match &self.credentials {
            Credentials::Token(token) => Ok(token.clone()),
            Credentials::ApiKey {
                api_key,
                token_url,
                http_client,
                cache,
            } => {
                {
                    let cached = cache.read().await;
                    if let Some(cached) = cached.as_ref().filter(|c| c.is_valid()) {
                        return Ok(cached.token.clone());
                    }
                }

                let mut cached = cache.write().await;
                // another caller may have refreshed while we waited for the lock
                if let Some(fresh) = cached.as_ref().filter(|c| c.is_valid()) {
                    return Ok(fresh.token.clone());
                }

                let token = request_token(http_client, token_url, api_key).await?;
                let token_str = token.access_token.clone();
                *cached = Some(CachedToken {
                    token: token.access_token,
                    expires_at: expiry_instant(token.expiration, token.expires_in),
                });
                Ok(token_str)
            }
        }
    }

    /// Drops the cached token so that the next call goes back to IAM
    pub async fn invalidate(&self) {
        if let Credentials::ApiKey { cache, .. } = &self.credentials {
            *cache.write().await = None;
        }
    }
}

async fn request_token(
    http_client: &reqwest::Client,
    token_url: &str,
    api_key: &str,
) -> Result<TokenResponse, ApiError> {
    tracing::debug!("requesting IAM token from {}", token_url);

    let body = format!(
        "grant_type={}&apikey={}",
        urlencoding::encode(GRANT_TYPE_APIKEY),
        urlencoding::encode(api_key)
    );
    let response = http_client
        .post(token_url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| ApiError::Auth(format!("IAM token request failed: {}", e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Auth(format!("failed to read IAM response: {}", e)))?;

    if !status.is_success() {
        let message = serde_json::from_str::<IamErrorResponse>(&text)
            .ok()
            .and_then(|e| match (e.error_code, e.error_message) {
                (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
                (None, Some(message)) => Some(message),
                _ => None,
            })
            .unwrap_or(text);
        return Err(ApiError::Auth(format!(
            "IAM returned HTTP {}: {}",
            status.as_u16(),
            message
        )));
    }

    serde_json::from_str::<TokenResponse>(&text).map_err(|e| {
        tracing::error!("unparsable IAM token response: {}", e);
        ApiError::Auth(format!("invalid IAM token response: {}", e))
    })
}

fn expiry_instant(expiration: Option<i64>, expires_in: Option<u64>) -> Instant {
    let remaining = match (expiration, expires_in) {
        (Some(at), _) => {
            let now = chrono::Utc::now().timestamp();
            Duration::from_secs(u64::try_from(at - now).unwrap_or(0))
        }
        (None, Some(secs)) => Duration::from_secs(secs),
        (None, None) => Duration::ZERO,
    };
    Instant::now() + remaining.saturating_sub(TOKEN_EXPIRY_BUFFER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_strips_bearer_prefix() {
        let auth = Authenticator::from_token("Bearer abc.def");
        assert_eq!(auth.token().await.unwrap(), "abc.def");
        assert_eq!(auth.authorization().await.unwrap(), "Bearer abc.def");
    }

    #[test]
    fn expiry_applies_buffer() {
        let now = chrono::Utc::now().timestamp();
        let soon = expiry_instant(Some(now + 30), None);
        assert!(soon <= Instant::now());

        let later = expiry_instant(Some(now + 3600), None);
        assert!(later > Instant::now() + Duration::from_secs(3000));

        let relative = expiry_instant(None, Some(3600));
        assert!(relative > Instant::now() + Duration::from_secs(3000));
    }
}
