use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: &'static str, id: String },

    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("Resource {resource} is claimed by vehicle {holder}")]
    ResourceConflict { resource: String, holder: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
}

impl DomainError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DomainError::EntityNotFound { kind, id: id.into() }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        DomainError::InvalidCommand { reason: reason.into() }
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Event store error: {0}")]
    EventStore(String),

    #[error("Kernel executor unavailable: {0}")]
    ExecutorUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
