use thiserror::Error;

/// Error de validación del dominio CRM.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    ValidationError(String),
}
