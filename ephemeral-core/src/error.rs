//! Error types for Ephemeral operations

/// Result type for Ephemeral operations
pub type Result<T> = std::result::Result<T, EphemeralError>;

/// Error types for the retention sweep
#[derive(Debug, thiserror::Error)]
pub enum EphemeralError {
    /// Missing or unparsable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The timeline could not be fetched or decoded
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A single post could not be deleted
    #[error("Failed to delete post {id}: {message}")]
    Delete {
        /// Identifier of the post that survived
        id: u64,
        /// Reason reported by the API
        message: String,
    },

    /// A post payload could not be turned into a [`Post`](crate::post::Post)
    #[error("Invalid post: {0}")]
    InvalidPost(String),

    /// OAuth signature could not be computed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Transport-level HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
