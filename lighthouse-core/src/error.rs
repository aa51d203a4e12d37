//! Error types for Lighthouse core operations

use thiserror::Error;

/// Per-message failures reported by a source.
///
/// An empty queue is not an error; sources return `Ok(None)` for that.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Malformed message on queue {queue}: {reason}")]
    Malformed { queue: String, reason: String },

    #[error("Message on queue {queue} is not a JSON object")]
    NotAnObject { queue: String },

    #[error("I/O error on queue {queue}: {reason}")]
    Io { queue: String, reason: String },
}

/// Master error type for core operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Record fed to topic {topic} is missing grouping key '{group_key}'")]
    MissingGroupKey { topic: String, group_key: String },

    #[error("Lock poisoned for topic {topic}")]
    LockPoisoned { topic: String },

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Action not found: {name}")]
    ActionNotFound { name: String },

    #[error("Action already registered: {name}")]
    DuplicateAction { name: String },

    #[error("Route already registered: {route}")]
    DuplicateRoute { route: String },
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_group_key_display() {
        let err = CoreError::MissingGroupKey {
            topic: "node_status".to_string(),
            group_key: "node".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("node_status"));
        assert!(msg.contains("'node'"));
    }

    #[test]
    fn test_source_error_converts_into_core_error() {
        let err = CoreError::from(SourceError::NotAnObject {
            queue: "/cpu".to_string(),
        });
        assert!(matches!(err, CoreError::Source(_)));
        assert!(format!("{}", err).contains("/cpu"));
    }

    #[test]
    fn test_duplicate_route_display() {
        let err = CoreError::DuplicateRoute {
            route: "/power_on/:node".to_string(),
        };
        assert!(format!("{}", err).contains("/power_on/:node"));
    }
}
