//! Error types for transaction-history reads.

use thiserror::Error;

/// Errors reading the transaction-history database.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Could not open the connection pool
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// A query failed
    #[error("Query '{query}' failed: {reason}")]
    QueryFailed {
        /// Short name of the query
        query: &'static str,
        /// Error reported by sqlx
        reason: String,
    },

    /// A row never appeared within the polling budget
    #[error("{what} not recorded after {attempts} reads")]
    NotRecorded {
        /// What was waited for
        what: String,
        /// Reads performed
        attempts: usize,
    },
}

impl DatabaseError {
    pub(crate) fn query(query: &'static str, error: &sqlx::Error) -> Self {
        Self::QueryFailed {
            query,
            reason: error.to_string(),
        }
    }
}

/// Result alias for database reads.
pub type Result<T> = std::result::Result<T, DatabaseError>;
