use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use database_layer::DatabaseError;
use error_common::{truncate_chars, DataSanitizer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;
use voice_recognition_service::VoiceError;

const MAX_DETAIL_CHARS: usize = 500;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type/code
    pub error_type: String,
    /// Human-readable error message
    pub detail: String,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Resource not found: {resource_type}")]
    NotFound { resource_type: String },

    #[error("Resource conflict: {message}")]
    Conflict { message: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// A collaborator that was not configured at startup
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Database(db_err) => match db_err {
                DatabaseError::AnimalNotFound(_)
                | DatabaseError::RecordNotFound(_)
                | DatabaseError::RowNotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::DuplicateAnimal(_) | DatabaseError::DuplicateRecord(_) => {
                    StatusCode::CONFLICT
                }
                DatabaseError::Tabular(_) => StatusCode::BAD_GATEWAY,
                DatabaseError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Voice(voice_err) => match voice_err {
                err if err.is_client_error() => StatusCode::BAD_REQUEST,
                VoiceError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Database(db_err) => db_err.code(),
            ApiError::Voice(voice_err) => voice_err.code(),
            ApiError::ServiceUnavailable { .. } => "service_unavailable",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Message shown to the client; remote error text is cut short and scrubbed of secrets
    pub fn detail(&self) -> String {
        let message = match self {
            ApiError::NotFound { resource_type } => format!("{} not found", resource_type),
            ApiError::Database(DatabaseError::Tabular(inner)) => {
                format!("Remote store request failed: {}", inner)
            }
            ApiError::Validation { message }
            | ApiError::BadRequest { message }
            | ApiError::Conflict { message }
            | ApiError::ServiceUnavailable { message }
            | ApiError::Internal { message } => message.clone(),
            other => other.to_string(),
        };
        let sanitized = DataSanitizer::new().sanitize_for_logging(&message);
        truncate_chars(&sanitized, MAX_DETAIL_CHARS).to_string()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();
        let detail = self.detail();

        // Client mistakes are routine; only server-side failures are errors
        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %detail,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %detail,
                "Request rejected"
            );
        }

        let body = ApiErrorResponse {
            error_id,
            error_type: self.error_type().to_string(),
            detail,
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::bad_request(format!("Malformed multipart body: {}", err.body_text()))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal(format!("File storage error: {}", err))
    }
}

/// Convenience type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
