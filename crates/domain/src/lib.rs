pub mod auth;
pub mod error;
pub mod ports;
pub mod request;
pub mod triage;
pub mod util;
pub mod wire;

pub type DomainResult<T> = Result<T, error::DomainError>;
