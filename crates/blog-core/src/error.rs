//! Errors raised by blog rules and by the storage behind them.

use thiserror::Error;
use uuid::Uuid;

/// A request broke a blog rule.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity_type} {id} does not exist")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("only the author may change {entity_type} {id}")]
    NotAuthor { entity_type: &'static str, id: Uuid },
}

/// Storage failures, shared by the SQL and in-memory repositories.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("no matching row")]
    NotFound,

    /// A taken username, or a post/comment pointing at a missing row.
    #[error("constraint violated: {0}")]
    Constraint(String),
}
