// Comment collection: every comment body in a thread, as a flat list.
//
// Resolves the submission, expands every placeholder until none remain,
// then flattens the tree breadth-first. Any failure along the way collapses
// into CollectOutcome::Failed; nothing propagates to the caller.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use super::client::{RedditClient, RedditEndpoints};
use super::forest::{CommentForest, SeenPlaceholders, ThreadNode};
use super::traits::{AccessCredentials, ThreadCoordinates, ThreadSource};

/// Comment bodies in traversal order. Duplicates are kept.
pub type CommentBatch = Vec<String>;

/// Why collection produced nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionFailure {
    /// Rendered error chain of the underlying cause.
    pub cause: String,
}

/// Result of a collection run.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectOutcome {
    Collected(CommentBatch),
    Failed(CollectionFailure),
}

impl CollectOutcome {
    /// The collected comments; empty when collection failed.
    ///
    /// An empty batch therefore means either "no comments" or "fetch failed".
    /// Match on the outcome itself to tell them apart.
    pub fn into_batch(self) -> CommentBatch {
        match self {
            CollectOutcome::Collected(batch) => batch,
            CollectOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CollectOutcome::Failed(_))
    }
}

/// Connect to Reddit with the given credentials and collect every comment
/// body in the thread. Session failures are treated like fetch failures.
pub async fn collect_comments(
    coords: &ThreadCoordinates,
    creds: &AccessCredentials,
    endpoints: &RedditEndpoints,
) -> CollectOutcome {
    announce(coords);
    let result = async {
        let client = RedditClient::connect(creds, endpoints).await?;
        gather(&client, coords).await
    }
    .await;
    settle(result)
}

/// Collect every comment body using an already-established source.
pub async fn collect_from(source: &dyn ThreadSource, coords: &ThreadCoordinates) -> CollectOutcome {
    announce(coords);
    settle(gather(source, coords).await)
}

/// Expand placeholders until the forest contains none.
///
/// Placeholders returned again after being expanded once are dropped so a
/// misbehaving API can't keep us looping.
pub async fn expand_all(
    forest: &mut CommentForest,
    source: &dyn ThreadSource,
    coords: &ThreadCoordinates,
) -> Result<usize> {
    let mut seen = SeenPlaceholders::default();
    let mut expanded = 0;

    loop {
        let pending = forest.take_placeholders();
        if pending.is_empty() {
            break;
        }

        debug!(pending = pending.len(), "Expanding placeholder round");

        for placeholder in pending {
            if !seen.insert(&placeholder) {
                warn!(
                    placeholder = %placeholder.id,
                    parent_id = %placeholder.parent_id,
                    "Placeholder returned again after expansion, dropping it"
                );
                continue;
            }
            let nodes = source.expand(coords, &placeholder).await?;
            forest.graft(nodes);
            expanded += 1;
        }
    }

    Ok(expanded)
}

async fn gather(source: &dyn ThreadSource, coords: &ThreadCoordinates) -> Result<CommentBatch> {
    let mut thread = source.resolve(coords).await?;
    let expanded = expand_all(&mut thread.comments, source, coords).await?;

    let texts: CommentBatch = thread
        .comments
        .flatten()
        .into_iter()
        .filter_map(|node| match node {
            ThreadNode::Comment(text) => Some(text),
            ThreadNode::Other => None,
        })
        .collect();

    debug!(
        title = %thread.title,
        reported = thread.num_comments,
        placeholders_expanded = expanded,
        "Flattened comment forest"
    );

    Ok(texts)
}

fn announce(coords: &ThreadCoordinates) {
    info!(
        "Collecting ALL comment texts from submission {} in r/{}",
        coords.submission_id, coords.subreddit
    );
}

fn settle(result: Result<CommentBatch>) -> CollectOutcome {
    match result {
        Ok(texts) => {
            info!(count = texts.len(), "Collected {} comment texts", texts.len());
            CollectOutcome::Collected(texts)
        }
        Err(e) => {
            error!("Error collecting Reddit comment texts: {e:#}");
            CollectOutcome::Failed(CollectionFailure {
                cause: format!("{e:#}"),
            })
        }
    }
}
