//! Timeline API client
//!
//! [`TimelineApi`] is the seam between the sweep loop and the remote service.
//! [`TwitterClient`] implements it against the v1.1 REST API with OAuth 1.0a
//! signed requests.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;

use crate::config::{ApiConfig, Credentials};
use crate::error::{EphemeralError, Result};
use crate::oauth::OAuthSigner;
use crate::post::Post;

/// Parameters for fetching recent posts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineRequest {
    /// Number of posts, most recent first
    pub count: u32,

    /// Include reposts
    pub include_reposts: bool,
}

impl Default for TimelineRequest {
    fn default() -> Self {
        Self {
            count: crate::config::MAX_PAGE_SIZE,
            include_reposts: true,
        }
    }
}

/// Remote capability used by a sweep
#[async_trait]
pub trait TimelineApi: Send + Sync {
    /// Fetch the most recent posts, newest first
    async fn fetch_recent_posts(&self, request: &TimelineRequest) -> Result<Vec<Post>>;

    /// Delete a single post
    async fn delete_post(&self, id: u64) -> Result<()>;
}

/// Wire format of a post in timeline responses
#[derive(Debug, Deserialize)]
struct TweetPayload {
    id: u64,
    text: String,
    created_at: String,
}

/// v1.1 REST API client
pub struct TwitterClient {
    client: Client,
    base_url: String,
    signer: OAuthSigner,
}

impl TwitterClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(credentials: Credentials, api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(api.timeout)
            .user_agent(concat!("ephemeral/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                EphemeralError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            signer: OAuthSigner::new(credentials),
        })
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a signed request and return the response body of a 2xx reply.
    async fn send_signed(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<String> {
        let auth = self.signer.authorization_header(method.as_str(), url, params)?;

        tracing::debug!(method = %method, url = %url, "Sending API request");

        let response = self
            .client
            .request(method.clone(), url)
            .query(params)
            .header(AUTHORIZATION, auth)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(method = %method, url = %url, status = %status, "API response");

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        Ok(body)
    }
}

fn api_error(status: StatusCode, body: &str) -> EphemeralError {
    let body = if body.is_empty() { "Unknown error" } else { body };
    EphemeralError::Fetch(format!("API error ({}): {}", status, body))
}

#[async_trait]
impl TimelineApi for TwitterClient {
    async fn fetch_recent_posts(&self, request: &TimelineRequest) -> Result<Vec<Post>> {
        let url = format!("{}/1.1/statuses/user_timeline.json", self.base_url);
        let params = [
            ("count", request.count.to_string()),
            ("include_rts", request.include_reposts.to_string()),
        ];

        let body = self
            .send_signed(Method::GET, &url, &params)
            .await
            .map_err(|e| match e {
                EphemeralError::Fetch(_) => e,
                other => EphemeralError::Fetch(format!("Could not get timeline: {}", other)),
            })?;

        let payloads: Vec<TweetPayload> = serde_json::from_str(&body)
            .map_err(|e| EphemeralError::Fetch(format!("Could not decode timeline: {}", e)))?;

        payloads
            .into_iter()
            .map(|p| Post::from_api(p.id, p.text, &p.created_at))
            .collect()
    }

    async fn delete_post(&self, id: u64) -> Result<()> {
        let url = format!("{}/1.1/statuses/destroy/{}.json", self.base_url, id);
        let params = [("trim_user", "true".to_string())];

        self.send_signed(Method::POST, &url, &params)
            .await
            .map(|_| ())
            .map_err(|e| EphemeralError::Delete {
                id,
                message: match e {
                    EphemeralError::Fetch(msg) => msg,
                    other => other.to_string(),
                },
            })
    }
}
