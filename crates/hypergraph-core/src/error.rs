//! Error types for the hypergraph store

use thiserror::Error;

/// Result type alias using the hypergraph Error
pub type Result<T> = std::result::Result<T, Error>;

/// Hypergraph error types with stable codes and suggestions
///
/// Missing records on read and organization mismatches are not errors;
/// those surface as `None` or an empty list.
#[derive(Error, Debug)]
pub enum Error {
    // Record errors (E001-E099)
    #[error("Entity '{0}' not found. Run `hypergraph entity list` to see all entities.")]
    EntityNotFound(String),

    #[error("Relation '{0}' not found. Run `hypergraph relation list` to see all relations.")]
    RelationNotFound(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed content: {0}")]
    MalformedContent(#[from] serde_json::Error),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntityNotFound(_) => "E001",
            Self::RelationNotFound(_) => "E002",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::MalformedContent(_) => "E801",
            Self::Serialization(_) => "E802",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::EntityNotFound(_) => Some("hypergraph entity list".to_string()),
            Self::RelationNotFound(_) => Some("hypergraph relation list".to_string()),
            Self::ConfigError(_) => Some("hypergraph config show".to_string()),
            _ => None,
        }
    }

    /// Whether this error signals a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound(_) | Self::RelationNotFound(_))
    }
}
