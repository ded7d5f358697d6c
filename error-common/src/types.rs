use thiserror::Error;

/// Process-level error enum
#[derive(Error, Debug)]
pub enum ChartError {
    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server startup and serving errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Unknown entity identifiers
    #[error("Not found: {0}")]
    NotFound(String),

    /// External service errors
    #[error("External service error: {0}")]
    ExternalError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChartError {
    /// Stable error code for this error
    pub fn code(&self) -> &'static str {
        use crate::codes;
        match self {
            ChartError::NetworkError(_) => codes::upstream::UNREACHABLE,
            ChartError::ServerError(_) | ChartError::InternalError(_) | ChartError::Other(_) => {
                codes::system::INTERNAL
            }
            ChartError::ValidationError(_) => codes::validation::INVALID_INPUT,
            ChartError::NotFound(_) => codes::lookup::NOT_FOUND,
            ChartError::ExternalError(_) => codes::upstream::FAILED,
            ChartError::ConfigError(_) => codes::system::CONFIGURATION,
        }
    }
}

/// Result type alias for VetChart operations
pub type Result<T> = std::result::Result<T, ChartError>;

/// Log an error with the context it was raised in
pub fn log_error(context: &str, error: &ChartError) {
    tracing::error!(
        context = context,
        error_code = error.code(),
        error = %error,
        "VetChart error occurred"
    );
}
