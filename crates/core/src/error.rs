// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] crate::port::FetchFailure),

    #[error("Print failed: {0}")]
    Print(#[from] crate::port::PrintFailure),

    #[error("Introspection error: {0}")]
    Introspection(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Short, caller-safe description of the error class.
    ///
    /// Never includes paths, commands or upstream URLs; the full `Display`
    /// output is meant for the log sink only.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::Domain(_) => "Invalid request.",
            AppError::Fetch(_) => "Failed to download the document.",
            AppError::Print(_) => "Printing failed.",
            AppError::Introspection(_) => "Failed to read the print queue.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PrintFailure;

    #[test]
    fn test_public_message_hides_cause() {
        let err = AppError::Print(PrintFailure::NonZeroExit {
            code: Some(1),
            stderr: "lp: /var/spool/kiosk/badge_1.pdf not found".to_string(),
        });

        assert!(err.to_string().contains("/var/spool"));
        assert_eq!(err.public_message(), "Printing failed.");
    }

    #[test]
    fn test_introspection_message() {
        let err = AppError::Introspection("permission denied: /srv/files".to_string());
        assert!(!err.public_message().contains("/srv"));
    }
}
