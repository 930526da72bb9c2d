// Reddit OAuth client: application-only auth plus the three read endpoints
// comment collection needs.
//
// Auth uses the client-credentials grant: no user login, just the script
// app's id and secret. The resulting bearer token is held for the lifetime
// of the client (one run).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::forest::{CommentForest, Node, Placeholder};
use super::listing::{split_comments_page, Listing, MoreChildrenResponse};
use super::traits::{AccessCredentials, Thread, ThreadCoordinates, ThreadSource};

/// Default OAuth API host. All authenticated reads go here.
pub const DEFAULT_API_URL: &str = "https://oauth.reddit.com";

/// Default host for the token endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com";

/// Maximum number of ids `/api/morechildren` accepts per call.
pub const MORECHILDREN_BATCH: usize = 100;

/// Where to send requests. Overridable for alternate hosts.
#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub api_url: String,
    pub auth_url: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
        }
    }
}

/// Authenticated Reddit API session.
pub struct RedditClient {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
}

impl RedditClient {
    /// Establish a session: build the HTTP client and exchange the app
    /// credentials for a bearer token.
    pub async fn connect(creds: &AccessCredentials, endpoints: &RedditEndpoints) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(creds.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        let url = format!(
            "{}/api/v1/access_token",
            endpoints.auth_url.trim_end_matches('/')
        );

        let response = client
            .post(&url)
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Failed to request Reddit access token")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit token endpoint returned {status}: {body}");
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Reddit token response")?;

        let access_token = match (token.access_token, token.error) {
            (Some(t), _) if !t.is_empty() => t,
            (_, Some(err)) => anyhow::bail!("Reddit rejected the credentials: {err}"),
            _ => anyhow::bail!("Reddit token response contained no access token"),
        };

        debug!("Authenticated with Reddit API");

        Ok(Self {
            client,
            api_url: endpoints.api_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Authenticated GET against the API host, deserializing the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);

        debug!(path = path, "Reddit GET request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Reddit request failed: {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit {path} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {path} response"))
    }

    /// Resolve a "load more comments" marker via `/api/morechildren`.
    async fn more_children(
        &self,
        coords: &ThreadCoordinates,
        placeholder: &Placeholder,
    ) -> Result<Vec<Node>> {
        let link_id = coords.link_id();
        let mut nodes = Vec::new();

        for chunk in placeholder.children.chunks(MORECHILDREN_BATCH) {
            let children = chunk.join(",");
            let resp: MoreChildrenResponse = self
                .get_json(
                    "/api/morechildren",
                    &[
                        ("api_type", "json"),
                        ("link_id", link_id.as_str()),
                        ("children", children.as_str()),
                        ("raw_json", "1"),
                    ],
                )
                .await?;
            nodes.extend(resp.into_nodes()?);
        }

        debug!(
            placeholder = %placeholder.id,
            requested = placeholder.children.len(),
            returned = nodes.len(),
            "Expanded more-comments placeholder"
        );

        Ok(nodes)
    }

    /// Resolve a "continue this thread" link by loading the parent comment's
    /// own page and taking its replies.
    async fn continue_thread(
        &self,
        coords: &ThreadCoordinates,
        placeholder: &Placeholder,
    ) -> Result<Vec<Node>> {
        let parent_id = placeholder.parent_id.trim_start_matches("t1_");
        let path = format!(
            "/r/{}/comments/{}/_/{}",
            coords.subreddit, coords.submission_id, parent_id
        );
        let page: Vec<Listing> = self.get_json(&path, &[("raw_json", "1")]).await?;
        let (_, comments) = split_comments_page(page)?;

        let replies = comments
            .into_nodes()?
            .into_iter()
            .find_map(|node| match node {
                Node::Comment(c) if c.name == placeholder.parent_id => Some(c.replies),
                _ => None,
            })
            .unwrap_or_default();

        debug!(
            parent = %placeholder.parent_id,
            returned = replies.len(),
            "Expanded continue-thread placeholder"
        );

        Ok(replies)
    }
}

#[async_trait]
impl ThreadSource for RedditClient {
    async fn resolve(&self, coords: &ThreadCoordinates) -> Result<Thread> {
        let path = format!("/r/{}/comments/{}", coords.subreddit, coords.submission_id);
        let page: Vec<Listing> = self
            .get_json(&path, &[("raw_json", "1"), ("limit", "500")])
            .await
            .with_context(|| {
                format!(
                    "Failed to fetch submission {} in r/{}",
                    coords.submission_id, coords.subreddit
                )
            })?;

        let (submission, comments) = split_comments_page(page)?;
        let roots = comments.into_nodes()?;

        debug!(
            submission = %submission.name,
            top_level = roots.len(),
            num_comments = submission.num_comments,
            "Resolved submission"
        );

        Ok(Thread {
            title: submission.title,
            num_comments: submission.num_comments,
            comments: CommentForest::new(roots),
        })
    }

    async fn expand(
        &self,
        coords: &ThreadCoordinates,
        placeholder: &Placeholder,
    ) -> Result<Vec<Node>> {
        if placeholder.is_continuation() {
            self.continue_thread(coords, placeholder).await
        } else {
            self.more_children(coords, placeholder).await
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = RedditEndpoints::default();
        assert_eq!(endpoints.api_url, "https://oauth.reddit.com");
        assert_eq!(endpoints.auth_url, "https://www.reddit.com");
    }

    #[test]
    fn test_token_response_error_shape() {
        let token: TokenResponse = serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(token.access_token.is_none());
        assert_eq!(token.error.as_deref(), Some("invalid_grant"));
    }
}
