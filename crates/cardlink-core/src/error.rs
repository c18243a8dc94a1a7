use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field {field} has type {actual}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Expected a map payload, got {0}")]
    NotAMap(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
