//! Medium REST API: identity lookup and draft creation.
//!
//! Only two endpoints are used:
//!
//! ```text
//! GET  {base}/me                 → { "data": { "id": "<user id>" } }
//! POST {base}/users/{id}/posts   → opaque JSON
//! ```
//!
//! Both carry `Authorization: Bearer <token>` and have their own timeout.
//! Every failure (connection, timeout, non-2xx, malformed identity payload)
//! is returned as a fatal [`PublishError`]; there is no retry.
//!
//! [`MediumApi`] is the seam the orchestrator talks to. [`MediumClient`] is
//! the reqwest implementation; tests substitute their own.

use crate::error::PublishError;
use crate::output::PublishRequest;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_CHARSET, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Identifier of the authenticated Medium user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two platform operations the publisher needs.
#[async_trait]
pub trait MediumApi: Send + Sync {
    /// Look up the user the token belongs to.
    async fn current_user(&self) -> Result<UserId, PublishError>;

    /// Create a post for `user`. Returns the platform's response payload.
    async fn create_post(
        &self,
        user: &UserId,
        request: &PublishRequest,
    ) -> Result<serde_json::Value, PublishError>;
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    data: MeData,
}

#[derive(Debug, Deserialize)]
struct MeData {
    id: String,
}

/// reqwest-backed [`MediumApi`].
#[derive(Debug, Clone)]
pub struct MediumClient {
    http: reqwest::Client,
    base_url: String,
    identity_timeout: Duration,
    post_timeout: Duration,
}

impl MediumClient {
    /// Build a client authenticated with `token`.
    pub fn new(
        base_url: impl Into<String>,
        token: &str,
        identity_timeout_secs: u64,
        post_timeout_secs: u64,
    ) -> Result<Self, PublishError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| PublishError::InvalidConfig("Token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("medium-publish/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity_timeout: Duration::from_secs(identity_timeout_secs),
            post_timeout: Duration::from_secs(post_timeout_secs),
        })
    }

    fn me_url(&self) -> String {
        format!("{}/me", self.base_url)
    }

    fn posts_url(&self, user: &UserId) -> String {
        format!("{}/users/{}/posts", self.base_url, user)
    }
}

#[async_trait]
impl MediumApi for MediumClient {
    async fn current_user(&self) -> Result<UserId, PublishError> {
        let url = self.me_url();
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .timeout(self.identity_timeout)
            .send()
            .await
            .map_err(|e| send_error(&url, self.identity_timeout, e))?;
        let response = ensure_success(&url, response).await?;

        let me: MeResponse = response
            .json()
            .await
            .map_err(|e| PublishError::UnexpectedResponse {
                url: url.clone(),
                detail: e.to_string(),
            })?;
        if me.data.id.is_empty() {
            return Err(PublishError::UnexpectedResponse {
                url,
                detail: "empty user id".into(),
            });
        }
        info!("Authenticated as Medium user {}", me.data.id);
        Ok(UserId(me.data.id))
    }

    async fn create_post(
        &self,
        user: &UserId,
        request: &PublishRequest,
    ) -> Result<serde_json::Value, PublishError> {
        let url = self.posts_url(user);
        debug!("POST {} ({} chars)", url, request.content.chars().count());
        let response = self
            .http
            .post(&url)
            .timeout(self.post_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| send_error(&url, self.post_timeout, e))?;
        let response = ensure_success(&url, response).await?;

        response
            .json()
            .await
            .map_err(|e| PublishError::UnexpectedResponse {
                url,
                detail: e.to_string(),
            })
    }
}

fn send_error(url: &str, timeout: Duration, e: reqwest::Error) -> PublishError {
    if e.is_timeout() {
        PublishError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        PublishError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Turn a non-2xx response into [`PublishError::ApiStatus`], keeping a
/// bounded excerpt of the body for the message.
async fn ensure_success(
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = if body.chars().count() > 300 {
        format!("{}\u{2026}", body.chars().take(299).collect::<String>())
    } else {
        body
    };
    Err(PublishError::ApiStatus {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_base() {
        let client = MediumClient::new("https://api.medium.com/v1/", "tok", 30, 60).unwrap();
        assert_eq!(client.me_url(), "https://api.medium.com/v1/me");
        assert_eq!(
            client.posts_url(&UserId("u42".into())),
            "https://api.medium.com/v1/users/u42/posts"
        );
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let err = MediumClient::new("https://api.medium.com/v1", "bad\ntoken", 30, 60).unwrap_err();
        assert!(matches!(err, PublishError::InvalidConfig(_)));
    }

    #[test]
    fn me_response_shape() {
        let me: MeResponse =
            serde_json::from_str(r#"{"data":{"id":"5303d74c64f66366f00cb9b2a94f3251bf5","username":"majelbstoat"}}"#)
                .unwrap();
        assert_eq!(me.data.id, "5303d74c64f66366f00cb9b2a94f3251bf5");
    }
}
