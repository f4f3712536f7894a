use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("delegate failure: {0}")]
    Dependency(String),
    #[error("storage failure: {0}")]
    Storage(String),
}
