//! # Ephemeral - delete old posts, keep the ones that matter
//!
//! Ephemeral fetches a user's most recent posts and deletes the ones that have
//! outlived a retention window, while never touching anything created before
//! a fixed epoch date.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ephemeral_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = EphemeralConfig::load()?;
//!     let client = TwitterClient::new(config.credentials.clone(), &config.api)?;
//!
//!     let report = Sweeper::new(Arc::new(client), config.policy.clone())
//!         .dry_run(true)
//!         .run()
//!         .await?;
//!
//!     println!("{} posts would be deleted", report.stale());
//!     Ok(())
//! }
//! ```
//!
//! ## Rules
//!
//! For every fetched post, in timeline order:
//! - created before the epoch: skipped
//! - older than `max_age`: deleted (unless dry-run)
//! - otherwise: kept

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod post;
pub mod retention;
pub mod sweep;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{TimelineApi, TimelineRequest, TwitterClient};
    pub use crate::config::{ApiConfig, Credentials, EphemeralConfig};
    pub use crate::error::{EphemeralError, Result};
    pub use crate::oauth::OAuthSigner;
    pub use crate::post::Post;
    pub use crate::retention::{Decision, RetentionPolicy};
    pub use crate::sweep::{DeleteStatus, PostOutcome, SweepReport, Sweeper};
}
