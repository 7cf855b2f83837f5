use thiserror::Error;

/// Failure taxonomy of the service layer. Each variant carries the message
/// shown to clients; [`ServiceError::status`] is the HTTP status tag the web
/// layer renders it with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Missing or schema-invalid input.
    #[error("{0}")]
    Validation(String),
    /// An identifier that is present but cannot be parsed.
    #[error("{0}")]
    InvalidId(String),
    #[error("{0}")]
    NotFound(String),
    /// The aggregate is in a state that forbids the operation.
    #[error("{0}")]
    BusinessRule(String),
    #[error("{0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// HTTP status code for the upstream web layer.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidId(_) | ServiceError::BusinessRule(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Db(_) => 500,
        }
    }

    /// Stable machine-readable kind for logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::InvalidId(_) => "invalid_id",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::BusinessRule(_) => "business_rule",
            ServiceError::Db(_) => "persistence",
        }
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => ServiceError::Validation(msg),
            models::errors::ModelError::Db(msg) => ServiceError::Db(msg),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self { ServiceError::Db(e.to_string()) }
}
