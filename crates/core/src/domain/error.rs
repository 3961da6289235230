// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid badge id: {0}")]
    InvalidBadgeId(String),

    #[error("Invalid copy count: {0}")]
    InvalidCopies(u32),
}

pub type Result<T> = std::result::Result<T, DomainError>;
