// Thread source trait: the seam between comment collection and the API.
//
// RedditClient implements it over HTTP. Tests implement it in memory so the
// expansion and flattening logic runs without a network.

use anyhow::Result;
use async_trait::async_trait;

use super::forest::{CommentForest, Node, Placeholder};

/// Identifies exactly one discussion thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadCoordinates {
    /// Subreddit name without the `r/` prefix.
    pub subreddit: String,
    /// Base36 submission id, e.g. `1j5e3f7`.
    pub submission_id: String,
}

impl ThreadCoordinates {
    pub fn new(subreddit: impl Into<String>, submission_id: impl Into<String>) -> Self {
        Self {
            subreddit: subreddit.into(),
            submission_id: submission_id.into(),
        }
    }

    /// The submission's fullname (`t3_<id>`), used as `link_id` by the API.
    pub fn link_id(&self) -> String {
        format!("t3_{}", self.submission_id)
    }
}

/// Reddit script-app credentials. Passed through to the API unchecked.
#[derive(Clone)]
pub struct AccessCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for AccessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// A resolved submission and its initial (partial) comment tree.
#[derive(Debug, Clone)]
pub struct Thread {
    pub title: String,
    /// Comment count as reported by the submission (may include removed ones).
    pub num_comments: u64,
    pub comments: CommentForest,
}

/// Anything that can resolve a thread and materialize its placeholders.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    /// Fetch the submission and its initial comment tree.
    async fn resolve(&self, coords: &ThreadCoordinates) -> Result<Thread>;

    /// Load the comments hidden behind one placeholder. Returned nodes carry
    /// their parent fullnames and may themselves contain placeholders.
    async fn expand(&self, coords: &ThreadCoordinates, placeholder: &Placeholder)
        -> Result<Vec<Node>>;
}
