use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation API error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Generation API rejected the key: {0}")]
    Authentication(String),

    #[error("Response blocked by safety filter: {0}")]
    Blocked(String),

    #[error("Generation returned no text")]
    EmptyResponse,

    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Config(_) => "generation_config",
            GenerationError::Provider { .. } => "generation_api",
            GenerationError::Authentication(_) => "generation_authentication",
            GenerationError::Blocked(_) => "generation_blocked",
            GenerationError::EmptyResponse => "generation_empty",
            GenerationError::ResponseShape(_) => "generation_shape",
            GenerationError::Network(_) => "generation_unreachable",
            GenerationError::Serialization(_) => "generation_decode",
        }
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
