use thiserror::Error;

#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("Credentials not configured: {0}")]
    MissingCredentials(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token endpoint rejected the assertion ({status}): {body}")]
    TokenRejected { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl OAuthError {
    /// True when retrying with the same key material cannot succeed
    pub fn is_credential_problem(&self) -> bool {
        matches!(
            self,
            OAuthError::MissingCredentials(_)
                | OAuthError::InvalidCredentials(_)
                | OAuthError::TokenRejected { .. }
                | OAuthError::JwtError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OAuthError>;
