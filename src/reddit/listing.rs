// Serde types for Reddit listing responses and conversion into forest nodes.
//
// Reddit wraps everything in `{kind, data}` "things". Comments are `t1`,
// placeholders are `more`, and a comment's `replies` field is either a nested
// listing or the empty string when there are none.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::forest::{Comment, Node, Placeholder};

/// A `Listing` thing.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A generic `{kind, data}` wrapper. `data` stays untyped until we know the kind.
#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    pub data: Value,
}

/// Fields of a `t1` comment that we care about.
#[derive(Debug, Deserialize)]
pub struct CommentData {
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub body: String,
    /// Either `""` or a `Listing`.
    #[serde(default)]
    pub replies: Value,
}

/// Fields of a `more` placeholder.
#[derive(Debug, Deserialize)]
pub struct MoreData {
    pub id: String,
    pub parent_id: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub count: u64,
}

/// Fields of the `t3` submission at the head of a comments page.
#[derive(Debug, Deserialize)]
pub struct SubmissionData {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub num_comments: u64,
}

/// Response envelope of `/api/morechildren?api_type=json`.
#[derive(Debug, Deserialize)]
pub struct MoreChildrenResponse {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
pub struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<Value>,
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
pub struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<Thing>,
}

impl Thing {
    /// Convert this thing (and any nested replies) into a forest node.
    pub fn into_node(self) -> Result<Node> {
        match self.kind.as_str() {
            "t1" => {
                let data: CommentData =
                    serde_json::from_value(self.data).context("Malformed t1 comment")?;
                let replies = replies_to_nodes(data.replies)?;
                Ok(Node::Comment(Comment {
                    name: data.name,
                    parent_id: data.parent_id,
                    body: data.body,
                    replies,
                }))
            }
            "more" => {
                let data: MoreData =
                    serde_json::from_value(self.data).context("Malformed more placeholder")?;
                Ok(Node::Placeholder(Placeholder {
                    id: data.id,
                    parent_id: data.parent_id,
                    children: data.children,
                    count: data.count,
                }))
            }
            other => {
                debug!(kind = other, "Non-comment thing in comment listing");
                Ok(Node::Other {
                    kind: other.to_string(),
                })
            }
        }
    }
}

impl Listing {
    /// Convert every child of this listing into forest nodes, in order.
    pub fn into_nodes(self) -> Result<Vec<Node>> {
        self.data
            .children
            .into_iter()
            .map(Thing::into_node)
            .collect()
    }
}

fn replies_to_nodes(replies: Value) -> Result<Vec<Node>> {
    match replies {
        Value::Object(_) => {
            let listing: Listing =
                serde_json::from_value(replies).context("Malformed replies listing")?;
            listing.into_nodes()
        }
        // "" (no replies) or null
        _ => Ok(Vec::new()),
    }
}

/// Split a comments page (`[submission listing, comment listing]`) into the
/// submission's data and its comment listing.
pub fn split_comments_page(page: Vec<Listing>) -> Result<(SubmissionData, Listing)> {
    let mut iter = page.into_iter();
    let submission_listing = iter
        .next()
        .ok_or_else(|| anyhow::anyhow!("Comments page is missing the submission listing"))?;
    let comments = iter
        .next()
        .ok_or_else(|| anyhow::anyhow!("Comments page is missing the comment listing"))?;

    let submission = submission_listing
        .data
        .children
        .into_iter()
        .find(|t| t.kind == "t3")
        .ok_or_else(|| anyhow::anyhow!("Submission not found in comments page"))?;
    let submission: SubmissionData =
        serde_json::from_value(submission.data).context("Malformed t3 submission")?;

    Ok((submission, comments))
}

impl MoreChildrenResponse {
    /// The flat list of materialized things, or an error if Reddit reported one.
    pub fn into_nodes(self) -> Result<Vec<Node>> {
        if !self.json.errors.is_empty() {
            anyhow::bail!("morechildren returned errors: {:?}", self.json.errors);
        }
        self.json
            .data
            .map(|d| d.things)
            .unwrap_or_default()
            .into_iter()
            .map(Thing::into_node)
            .collect()
    }
}
