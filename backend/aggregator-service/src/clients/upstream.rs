//! HTTP client for the upstream users/posts/comments API
//!
//! Every call carries the configured bearer token and is bounded by the
//! configured timeout. Non-2xx answers surface as [`UpstreamError::Status`]
//! so the status can be passed back to our own caller.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use resilience::TimeoutConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::{decode_list, decode_users, Comment, Post, User};

/// The three upstream reads the aggregator depends on.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// `GET {base}/users`, in upstream enumeration order
    async fn fetch_users(&self) -> Result<Vec<User>, UpstreamError>;

    /// `GET {base}/users/{id}/posts`
    async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>, UpstreamError>;

    /// `GET {base}/posts/{id}/comments`, counted
    async fn fetch_comment_count(&self, post_id: i64) -> Result<usize, UpstreamError>;
}

pub struct HttpUpstreamClient {
    client: Client,
    base_url: String,
    timeout: TimeoutConfig,
}

impl HttpUpstreamClient {
    pub fn new(
        base_url: &str,
        access_token: &str,
        timeout: TimeoutConfig,
    ) -> Result<Self, UpstreamError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| UpstreamError::Client(format!("Invalid access token: {}", e)))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(
            &config.base_url,
            &config.access_token,
            config.upstream_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> TimeoutConfig {
        self.timeout
    }

    async fn get_json(&self, path: &str) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Calling upstream");

        let call = async {
            let response = self.client.get(&url).send().await?;

            let status = response.status();
            if !status.is_success() {
                warn!(url = %url, status = status.as_u16(), "Upstream returned error status");
                return Err(UpstreamError::Status {
                    status: status.as_u16(),
                });
            }

            Ok::<Value, UpstreamError>(response.json::<Value>().await?)
        };

        self.timeout.run(call).await.map_err(|_| {
            warn!(url = %url, timeout = ?self.timeout.duration, "Upstream call timed out");
            UpstreamError::Timeout(self.timeout.duration)
        })?
    }
}

#[async_trait]
impl UpstreamApi for HttpUpstreamClient {
    async fn fetch_users(&self) -> Result<Vec<User>, UpstreamError> {
        let payload = self.get_json("/users").await?;
        Ok(decode_users(payload)?)
    }

    async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>, UpstreamError> {
        let path = format!("/users/{}/posts", urlencoding::encode(user_id));
        let payload = self.get_json(&path).await?;
        Ok(decode_list(payload, "posts")?)
    }

    async fn fetch_comment_count(&self, post_id: i64) -> Result<usize, UpstreamError> {
        let path = format!("/posts/{}/comments", post_id);
        let payload = self.get_json(&path).await?;
        let comments: Vec<Comment> = decode_list(payload, "comments")?;
        Ok(comments.len())
    }
}
