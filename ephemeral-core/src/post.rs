//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EphemeralError, Result};

/// Timestamp layout used by the v1.1 API, e.g. `Wed Jan 10 06:00:00 +0000 2024`.
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A post fetched from the user's timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique post identifier
    pub id: u64,

    /// Post text
    pub text: String,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post
    pub fn new(id: u64, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            created_at,
        }
    }

    /// Build a post from the API's string timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`EphemeralError::InvalidPost`] if `created_at` does not match
    /// [`CREATED_AT_FORMAT`].
    pub fn from_api(id: u64, text: impl Into<String>, created_at: &str) -> Result<Self> {
        let created_at = parse_created_at(created_at)
            .map_err(|e| EphemeralError::InvalidPost(format!("post {}: {}", id, e)))?;
        Ok(Self::new(id, text, created_at))
    }
}

/// Parse an API timestamp into UTC
pub fn parse_created_at(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT).map(|dt| dt.with_timezone(&Utc))
}
