//! Error types shared by every flowdeck crate

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout flowdeck
pub type FlowdeckResult<T> = Result<T, FlowdeckError>;

/// Coarse classification of a [`FlowdeckError`]
///
/// Callers match on this when they only need to know *what kind* of failure
/// happened (e.g. to show "not found" differently from an I/O fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    Malformed,
    DuplicateNodeId,
    Io,
    Serialization,
    Config,
    Watch,
}

#[derive(Debug, Error)]
pub enum FlowdeckError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed document {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Node id '{node_id}' appears {count} times in flow '{flow}'")]
    DuplicateNodeId {
        flow: String,
        node_id: String,
        count: usize,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Watch error: {0}")]
    Watch(String),
}

impl FlowdeckError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn malformed(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn watch(msg: impl Into<String>) -> Self {
        Self::Watch(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::DuplicateNodeId { .. } => ErrorKind::DuplicateNodeId,
            Self::Io { .. } => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Config(_) => ErrorKind::Config,
            Self::Watch(_) => ErrorKind::Watch,
        }
    }

    /// True for errors caused by a missing flow, document or node
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<toml::ser::Error> for FlowdeckError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for FlowdeckError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(FlowdeckError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(
            FlowdeckError::malformed("/tmp/flow.toml", "bad").kind(),
            ErrorKind::Malformed
        );
        let io = FlowdeckError::io(
            "/tmp/flow.toml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(!io.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = FlowdeckError::DuplicateNodeId {
            flow: "Flow 1".into(),
            node_id: "n1".into(),
            count: 2,
        };
        assert_eq!(err.to_string(), "Node id 'n1' appears 2 times in flow 'Flow 1'");
    }
}
