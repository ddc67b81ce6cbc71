use crate::codec::CodecError;
use crate::value::Kind;

/// Error types for sqlx-named-mapper
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error while compiling the template scanner
    #[error("Failed to parse SQL template: {0}")]
    Parse(#[from] regex::Error),

    /// Error from SQLx database operations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Placeholder appears in the template but no value was ever bound to it
    #[error("Placeholder ':{0}' was never bound")]
    UnboundPlaceholder(String),

    /// Mapping field could not be encoded or decoded
    #[error("Mapping codec error: {0}")]
    Codec(#[from] CodecError),

    /// A field setter received a value of the wrong kind
    #[error("Field '{field}' expects {expected:?}, got {found:?}")]
    KindMismatch {
        field: &'static str,
        expected: Kind,
        found: Kind,
    },

    /// Target type could not produce a fresh instance for a row
    #[error("Failed to instantiate {0}")]
    Instantiate(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for sqlx-named-mapper operations
pub type Result<T> = std::result::Result<T, Error>;
