//! Service-account credentials and OAuth2 access tokens.

use std::{fmt, path::Path};

use chrono::{DateTime, Duration, Utc};
use http::{header::CONTENT_TYPE, StatusCode};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    core::util::{base_request, AsyncHttpClient},
    error::{WalletError, WalletResult},
};

/// OAuth2 scope granting access to the issuer's wallet objects.
pub const WALLET_OBJECT_ISSUER_SCOPE: &str = "https://www.googleapis.com/auth/wallet_object.issuer";

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The JSON key file of a Google Cloud service account.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> WalletResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            WalletError::credentials(format!(
                "unable to read service account key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> WalletResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| WalletError::credentials(format!("invalid service account key: {e}")))
    }

    /// The RS256 key for the JWTs signed on behalf of the account.
    pub fn encoding_key(&self) -> WalletResult<EncodingKey> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|e| {
            WalletError::credentials(format!("invalid service account private key: {e}"))
        })
    }

    /// RS256 JWT header carrying the key id when the key file has one.
    pub fn jwt_header(&self) -> Header {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        header
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Access tokens for one service account and scope, exchanged through the JWT-bearer grant.
///
/// Tokens are reused until shortly before they expire.
pub struct TokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    cached_token: RwLock<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>) -> WalletResult<Self> {
        Ok(Self {
            encoding_key: key.encoding_key()?,
            key,
            scope: scope.into(),
            cached_token: RwLock::new(None),
        })
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// A valid access token, exchanging a new one if the cached token is about to expire.
    pub async fn token(
        &self,
        http_client: &(dyn AsyncHttpClient + Send + Sync),
    ) -> WalletResult<String> {
        {
            let cache = self.cached_token.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) {
                    debug!("using cached access token");
                    return Ok(cached.token.clone());
                }
            }
        }

        debug!(token_uri = %self.key.token_uri, "exchanging service account assertion");
        let response = self.exchange(http_client).await?;

        let expires_at = Duration::try_seconds(response.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| WalletError::Unauthorized {
                message: format!(
                    "token endpoint returned an invalid lifetime of {}s",
                    response.expires_in
                ),
            })?;

        let token = response.access_token;
        let mut cache = self.cached_token.write().await;
        *cache = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }

    fn assertion(&self) -> WalletResult<String> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(
            &self.key.jwt_header(),
            &claims,
            &self.encoding_key,
        )?)
    }

    async fn exchange(
        &self,
        http_client: &(dyn AsyncHttpClient + Send + Sync),
    ) -> WalletResult<TokenResponse> {
        let assertion = self.assertion()?;
        let body = serde_urlencoded::to_string([
            ("grant_type", JWT_BEARER_GRANT_TYPE),
            ("assertion", assertion.as_str()),
        ])
        .map_err(|e| WalletError::Unauthorized {
            message: format!("unable to encode token request: {e}"),
        })?;

        let request = base_request()
            .method("POST")
            .uri(&self.key.token_uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.into_bytes())
            .map_err(|e| WalletError::Unauthorized {
                message: format!("unable to build token request: {e}"),
            })?;

        let response = http_client
            .execute(request)
            .await
            .map_err(|e| WalletError::Unauthorized {
                message: format!("token request failed: {e:#}"),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WalletError::Unauthorized {
                message: format!(
                    "token exchange was refused (status: {status}): {}",
                    String::from_utf8_lossy(response.body())
                ),
            });
        }

        serde_json::from_slice(response.body()).map_err(|e| WalletError::Unauthorized {
            message: format!("unable to parse token response: {e}"),
        })
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
