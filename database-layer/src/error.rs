use thiserror::Error;

/// Failures talking to the remote tabular store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabularError {
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),

    #[error("Remote store rejected credentials: {0}")]
    Authentication(String),

    #[error("Remote store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response from remote store: {0}")]
    Decode(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

impl TabularError {
    pub fn code(&self) -> &'static str {
        match self {
            TabularError::Unreachable(_) => "remote_unreachable",
            TabularError::Authentication(_) => "remote_authentication",
            TabularError::Api { .. } => "remote_api",
            TabularError::Decode(_) => "remote_decode",
            TabularError::InvalidRange(_) => "invalid_range",
        }
    }
}

/// Repository-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error(transparent)]
    Tabular(#[from] TabularError),

    #[error("Animal with ID {0} not found")]
    AnimalNotFound(String),

    #[error("Record {0} not found")]
    RecordNotFound(String),

    #[error("Record {0} not found in remote store")]
    RowNotFound(String),

    #[error("Animal with ID {0} already exists")]
    DuplicateAnimal(String),

    #[error("Record {0} already exists")]
    DuplicateRecord(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    pub fn code(&self) -> &'static str {
        match self {
            DatabaseError::Tabular(inner) => inner.code(),
            DatabaseError::AnimalNotFound(_) => "animal_not_found",
            DatabaseError::RecordNotFound(_) => "record_not_found",
            DatabaseError::RowNotFound(_) => "row_not_found",
            DatabaseError::DuplicateAnimal(_) => "duplicate_animal",
            DatabaseError::DuplicateRecord(_) => "duplicate_record",
            DatabaseError::Configuration(_) => "configuration",
        }
    }
}

pub type TabularResult<T> = Result<T, TabularError>;
pub type DatabaseResult<T> = Result<T, DatabaseError>;
