use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::credentials::ServiceAccountKey;
use crate::error::{OAuthError, Result};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime accepted by Google (one hour maximum)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before their reported expiry
const REFRESH_MARGIN_SECS: i64 = 60;

/// Source of bearer tokens for outgoing API calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a currently valid access token
    async fn access_token(&self) -> Result<String>;
}

/// JWT claim set for the service-account assertion
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, scopes: &[String], issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            iss: key.client_email.clone(),
            scope: scopes.join(" "),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Exchanges signed service-account assertions for access tokens
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, scopes: &[&str]) -> Self {
        Self::with_client(key, scopes, reqwest::Client::new())
    }

    pub fn with_client(key: ServiceAccountKey, scopes: &[&str], http: reqwest::Client) -> Self {
        Self {
            key,
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Build and sign the RS256 assertion
    pub fn signed_assertion(&self, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = AssertionClaims::new(&self.key, &self.scopes, issued_at);
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;

        debug!(client_email = %self.key.client_email, "Requesting service-account access token");
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key() -> ServiceAccountKey {
        ServiceAccountKey::from_json(
            r#"{"client_email": "chart@vet.iam.gserviceaccount.com", "private_key": "not-a-pem"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_assertion_claims() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let scopes = vec!["a".to_string(), "b".to_string()];
        let claims = AssertionClaims::new(&key(), &scopes, issued);
        assert_eq!(claims.iss, "chart@vet.iam.gserviceaccount.com");
        assert_eq!(claims.scope, "a b");
        assert_eq!(claims.aud, crate::DEFAULT_TOKEN_URI);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_invalid_pem_is_a_jwt_error() {
        let source = ServiceAccountTokenSource::new(key(), &[crate::SPREADSHEETS_SCOPE]);
        let err = source.signed_assertion(Utc::now()).unwrap_err();
        assert!(matches!(err, OAuthError::JwtError(_)));
    }

    #[test]
    fn test_cached_token_freshness() {
        let now = Utc::now();
        let token = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(!token.is_fresh(now));

        let token = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(600),
        };
        assert!(token.is_fresh(now));
    }
}
