use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Request failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Metadata could not be retrieved: {0}")]
    Metadata(String),

    #[error("Record not found in database: {0}")]
    NotFound(String),

    #[error("Record is not a feature layer: {0}")]
    TypeMismatch(String),

    #[error("{}", crate::constants::REQUEST_NOT_CACHED)]
    StaleRecord,

    #[error("{0}")]
    InvalidAgeFilter(String),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        RegistryError::Storage {
            message: err.to_string(),
        }
    }
}

impl RegistryError {
    /// Messages reported to the caller in an `{"errors": [...]}` body.
    pub fn messages(&self) -> Vec<String> {
        match self {
            RegistryError::Validation(errors) => errors.clone(),
            RegistryError::Metadata(msg) => vec![msg.clone()],
            RegistryError::NotFound(_) => vec!["Record not found in database".to_string()],
            RegistryError::TypeMismatch(_) => vec!["Record is not a feature layer".to_string()],
            other => vec![other.to_string()],
        }
    }

    /// True for failures caused by the caller's input rather than the service.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            RegistryError::Validation(_)
                | RegistryError::Metadata(_)
                | RegistryError::NotFound(_)
                | RegistryError::TypeMismatch(_)
                | RegistryError::StaleRecord
                | RegistryError::InvalidAgeFilter(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
