//! Catalog error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Catalog error types
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Invalid data: {0}")]
    Invalid(String),
}

impl CatalogError {
    /// Map a unique-constraint violation to `Duplicate`, anything else to `Database`
    pub(crate) fn from_insert(err: sqlx::Error, what: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate(what.into()),
            _ => Self::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::NotFound {
            entity: "file",
            id: 7,
        };
        assert_eq!(err.to_string(), "file 7 not found");

        let err = CatalogError::Duplicate("machine name 'node-a'".into());
        assert_eq!(err.to_string(), "Duplicate entry: machine name 'node-a'");
    }
}
