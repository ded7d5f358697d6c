use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::path::Path;

use crate::error::{OAuthError, Result};

/// Default Google OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Where the key material was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    InlineBase64,
    File,
}

impl CredentialSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialSource::InlineBase64 => "inline_base64",
            CredentialSource::File => "file",
        }
    }
}

/// Subset of a Google service-account JSON key
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse the raw JSON key file contents
    pub fn from_json(json: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(json)?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(OAuthError::InvalidCredentials(
                "client_email and private_key are required".to_string(),
            ));
        }
        Ok(key)
    }

    /// Decode an inline base64-encoded JSON key
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| OAuthError::InvalidCredentials(format!("base64 decode failed: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| OAuthError::InvalidCredentials(format!("key is not UTF-8: {}", e)))?;
        Self::from_json(&json)
    }

    /// Read a JSON key file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `GOOGLE_SERVICE_ACCOUNT_B64`, falling back to the file named by
    /// `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_source().map(|(key, _)| key)
    }

    /// Same as [`ServiceAccountKey::from_env`] but also reports which variable was used
    pub fn from_env_with_source() -> Result<(Self, CredentialSource)> {
        if let Ok(encoded) = std::env::var("GOOGLE_SERVICE_ACCOUNT_B64") {
            if !encoded.trim().is_empty() {
                return Ok((Self::from_base64(&encoded)?, CredentialSource::InlineBase64));
            }
        }
        if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            if !path.trim().is_empty() {
                return Ok((Self::from_file(path.trim())?, CredentialSource::File));
            }
        }
        Err(OAuthError::MissingCredentials(
            "set GOOGLE_SERVICE_ACCOUNT_B64 or GOOGLE_APPLICATION_CREDENTIALS".to_string(),
        ))
    }
}
