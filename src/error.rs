//! Error types for pattern compilation, rendering and synchronization
//!
//! Unmatched pathnames, unmatched query keys and reverse mappings that return `None` are not
//! errors: the engine treats them as no-ops and never reports them here.

use std::error::Error;
use std::fmt;

// ============================================================================
// Pattern Errors
// ============================================================================

/// Errors produced while compiling or rendering a route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// An optional group was opened and never closed, or closed without being opened
    UnbalancedParens { template: String },

    /// A `:` was not followed by a parameter name
    EmptyParamName { template: String, position: usize },

    /// The same parameter name appears twice in one template
    DuplicateParam { template: String, name: String },

    /// An optional group `()` contains nothing
    EmptyGroup { template: String, position: usize },

    /// Rendering needed a required parameter that was not supplied
    MissingParam { template: String, name: String },

    /// The compiled expression was rejected
    InvalidTemplate { template: String, message: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::UnbalancedParens { template } => {
                write!(f, "Unbalanced parentheses in route template '{}'", template)
            }
            PatternError::EmptyParamName { template, position } => {
                write!(
                    f,
                    "Empty parameter name at byte {} of route template '{}'",
                    position, template
                )
            }
            PatternError::DuplicateParam { template, name } => {
                write!(
                    f,
                    "Parameter '{}' appears more than once in route template '{}'",
                    name, template
                )
            }
            PatternError::EmptyGroup { template, position } => {
                write!(
                    f,
                    "Empty optional group at byte {} of route template '{}'",
                    position, template
                )
            }
            PatternError::MissingParam { template, name } => {
                write!(
                    f,
                    "Missing parameter '{}' while rendering route template '{}'",
                    name, template
                )
            }
            PatternError::InvalidTemplate { template, message } => {
                write!(f, "Invalid route template '{}': {}", template, message)
            }
        }
    }
}

impl Error for PatternError {}

// ============================================================================
// Sync Errors
// ============================================================================

/// Errors surfaced by the synchronization engine
#[derive(Debug)]
pub enum SyncError {
    /// A template passed to a registration did not compile
    Pattern(PatternError),

    /// The store rejected an action
    ///
    /// Returned to the caller of whichever operation triggered the dispatch. The engine has
    /// already cleared its reentrancy flag by the time this is observed.
    Dispatch(Box<dyn Error + 'static>),
}

impl SyncError {
    /// Wrap a store error
    pub fn dispatch<E>(error: E) -> Self
    where
        E: Error + 'static,
    {
        SyncError::Dispatch(Box::new(error))
    }

    /// Check if this is a dispatch failure
    pub fn is_dispatch(&self) -> bool {
        matches!(self, SyncError::Dispatch(_))
    }

    /// Check if this is a template failure
    pub fn is_pattern(&self) -> bool {
        matches!(self, SyncError::Pattern(_))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Pattern(error) => write!(f, "{}", error),
            SyncError::Dispatch(error) => write!(f, "Dispatch failed: {}", error),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncError::Pattern(error) => Some(error),
            SyncError::Dispatch(error) => Some(error.as_ref()),
        }
    }
}

impl From<PatternError> for SyncError {
    fn from(error: PatternError) -> Self {
        SyncError::Pattern(error)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Rejected;

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "rejected")
        }
    }

    impl Error for Rejected {}

    #[test]
    fn test_pattern_error_display() {
        let error = PatternError::MissingParam {
            template: "/users/:id".to_string(),
            name: "id".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing parameter 'id' while rendering route template '/users/:id'"
        );
    }

    #[test]
    fn test_sync_error_from_pattern() {
        let error: SyncError = PatternError::UnbalancedParens {
            template: "/a(".to_string(),
        }
        .into();
        assert!(error.is_pattern());
        assert!(!error.is_dispatch());
        assert!(error.source().is_some());
    }

    #[test]
    fn test_dispatch_error_keeps_source() {
        let error = SyncError::dispatch(Rejected);
        assert!(error.is_dispatch());
        assert_eq!(error.to_string(), "Dispatch failed: rejected");
        assert_eq!(error.source().map(|e| e.to_string()), Some("rejected".into()));
    }
}
