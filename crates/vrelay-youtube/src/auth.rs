//! OAuth access token handling.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight refresh so concurrent uploads do not stampede the token endpoint
//! - Graceful fallback to an existing valid token on refresh failure

use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{PlatformError, PlatformResult};
use crate::types::{TokenErrorResponse, TokenResponse};

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when the endpoint omits `expires_in` (50 minutes).
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// Platform credentials.
#[derive(Clone)]
pub enum Credentials {
    /// Pre-issued access token, used as-is.
    Static { access_token: String },
    /// OAuth client credentials with a long-lived refresh token.
    Refresh {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

impl Credentials {
    /// Load credentials from `CLIENT_ID`/`CLIENT_SECRET`/`REFRESH_TOKEN`,
    /// falling back to `YOUTUBE_ACCESS_TOKEN`.
    pub fn from_env() -> PlatformResult<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        match (var("CLIENT_ID"), var("CLIENT_SECRET"), var("REFRESH_TOKEN")) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Ok(Credentials::Refresh {
                    client_id,
                    client_secret,
                    refresh_token,
                })
            }
            _ => var("YOUTUBE_ACCESS_TOKEN")
                .map(|access_token| Credentials::Static { access_token })
                .ok_or_else(|| {
                    PlatformError::MissingCredentials(
                        "set CLIENT_ID, CLIENT_SECRET and REFRESH_TOKEN, or YOUTUBE_ACCESS_TOKEN"
                            .to_string(),
                    )
                }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Static { .. } => "static",
            Credentials::Refresh { .. } => "refresh_token",
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Check if token is still valid with refresh margin.
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Check if token is technically still usable (even if refresh is needed).
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe access token cache.
pub struct TokenCache {
    http: Client,
    token_url: String,
    credentials: Credentials,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a new token cache.
    pub fn new(http: Client, token_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
            cache: RwLock::new(None),
        }
    }

    /// Invalidate the cached token (e.g. after a 401).
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> PlatformResult<String> {
        let (client_id, client_secret, refresh_token) = match &self.credentials {
            Credentials::Static { access_token } => return Ok(access_token.clone()),
            Credentials::Refresh {
                client_id,
                client_secret,
                refresh_token,
            } => (client_id, client_secret, refresh_token),
        };

        // Fast path: check read lock first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Double-check: another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        match self.refresh(client_id, client_secret, refresh_token).await {
            Ok(token) => {
                let ttl = token
                    .expires_in
                    .map(Duration::from_secs)
                    .unwrap_or(TOKEN_DEFAULT_TTL);

                *cache = Some(CachedToken {
                    access_token: token.access_token.clone(),
                    expires_at: Instant::now() + ttl,
                });

                debug!("Refreshed platform access token, valid for {:?}", ttl);
                Ok(token.access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }
                Err(e)
            }
        }
    }

    async fn refresh(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> PlatformResult<TokenResponse> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {}", e.error, desc),
                    None => e.error,
                })
                .unwrap_or_else(|_| format!("token endpoint returned HTTP {}", status.as_u16()));
            return Err(PlatformError::Auth(detail));
        }

        Ok(serde_json::from_str(&body)?)
    }
}
