use repos::error::RepoError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReleaseError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for ReleaseError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::UniqueViolation(table, _) => {
                ReleaseError::Conflict(format!("{table} already exists"))
            }
            RepoError::InvalidColumn(column) => {
                ReleaseError::InvalidFormat(format!("unknown column {column}"))
            }
            other => ReleaseError::Internal(other.to_string()),
        }
    }
}
