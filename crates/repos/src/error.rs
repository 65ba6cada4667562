use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("database failure: {0}")]
    DatabaseError(String),

    #[error("database invalid column: {0}")]
    InvalidColumn(String),

    #[error("not found")]
    NotFound(),

    #[error("database uniqueness violation on {0} ({1})")]
    UniqueViolation(String, String),

    #[error("database foreign key violation on {0} ({1})")]
    ForeignKeyViolation(String, String),

    #[error("database integrity check on {0} ({1})")]
    CheckViolation(String, String),

    #[error("database transaction error")]
    TransactionError(),

    #[error("database error")]
    Other(),
}

impl RepoError {
    pub fn is_unique_violation_of(&self, name: &str) -> bool {
        matches!(self, RepoError::UniqueViolation(_, constraint) if constraint == name)
    }
}

pub fn handle_sql_error(err: sqlx::Error) -> RepoError {
    use sqlx::Error as E;

    match err {
        E::RowNotFound => RepoError::NotFound(),
        E::Database(ref e) => {
            let constraint = e.constraint().unwrap_or_default().to_string();
            let table = e.table().unwrap_or_default().to_string();

            if e.is_unique_violation() {
                // expected under concurrent pushes, callers decide how loud to be
                tracing::debug!("Unique violation on {table} ({constraint})");
                return RepoError::UniqueViolation(table, constraint);
            }

            error!("SQL error: {}", err);

            if e.is_foreign_key_violation() {
                return RepoError::ForeignKeyViolation(table, constraint);
            }

            if e.is_check_violation() {
                return RepoError::CheckViolation(table, constraint);
            }

            RepoError::DatabaseError(e.message().to_string())
        }
        _ => {
            error!("SQL error: {}", err);
            RepoError::Other()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            handle_sql_error(sqlx::Error::RowNotFound),
            RepoError::NotFound()
        ));
    }

    #[test]
    fn test_unique_violation_matching() {
        let err = RepoError::UniqueViolation("bundles".into(), "bundles_sequence_key".into());
        assert!(err.is_unique_violation_of("bundles_sequence_key"));
        assert!(!err.is_unique_violation_of("bundles_version_hash_key"));
        assert!(!RepoError::Other().is_unique_violation_of("bundles_sequence_key"));
    }
}
