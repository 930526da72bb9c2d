// Comment forest: the in-memory reply tree of one submission.
//
// Reddit hands back a partial tree: real comments plus "more" placeholders
// standing in for branches it didn't load. The forest supports pulling every
// placeholder out, grafting the materialized comments back in by parent
// fullname, and flattening the result breadth-first.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

/// A single comment with its (possibly partial) replies.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Fullname, e.g. `t1_abc123`.
    pub name: String,
    /// Fullname of the parent: a comment (`t1_`) or the submission (`t3_`).
    pub parent_id: String,
    pub body: String,
    pub replies: Vec<Node>,
}

/// A stand-in for comments the API didn't return in this response.
///
/// With a non-empty `children` list this is a "load more comments" marker;
/// with an empty list it is a "continue this thread" link to a deep branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub id: String,
    pub parent_id: String,
    /// Base36 ids (no `t1_` prefix) of the hidden comments.
    pub children: Vec<String>,
    /// How many comments the placeholder claims to hide.
    pub count: u64,
}

impl Placeholder {
    /// True for "continue this thread" links, which carry no child ids and
    /// must be resolved by loading the parent comment's own page.
    pub fn is_continuation(&self) -> bool {
        self.children.is_empty()
    }

    /// Identity used to detect a placeholder being handed back twice.
    fn key(&self) -> (String, String) {
        (self.parent_id.clone(), self.id.clone())
    }
}

/// One node of the comment tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Comment(Comment),
    Placeholder(Placeholder),
    /// Anything the API returns that is neither a comment nor a placeholder.
    Other { kind: String },
}

impl Node {
    fn parent_id(&self) -> Option<&str> {
        match self {
            Node::Comment(c) => Some(c.parent_id.as_str()),
            Node::Placeholder(p) => Some(p.parent_id.as_str()),
            Node::Other { .. } => None,
        }
    }
}

/// A flattened traversal entry. Only comments carry text.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadNode {
    Comment(String),
    Other,
}

/// The top-level comments of a submission and everything beneath them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentForest {
    roots: Vec<Node>,
}

impl CommentForest {
    pub fn new(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Count of placeholders still in the tree.
    pub fn placeholder_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|n| match n {
                    Node::Placeholder(_) => 1,
                    Node::Comment(c) => count(&c.replies),
                    Node::Other { .. } => 0,
                })
                .sum()
        }
        count(&self.roots)
    }

    /// Remove every placeholder from the tree and return them in
    /// breadth-first order.
    pub fn take_placeholders(&mut self) -> Vec<Placeholder> {
        let mut taken = Vec::new();
        let mut level: Vec<&mut Vec<Node>> = vec![&mut self.roots];

        while !level.is_empty() {
            let mut next = Vec::new();
            for nodes in level {
                let (kept, removed): (Vec<Node>, Vec<Node>) = std::mem::take(nodes)
                    .into_iter()
                    .partition(|n| !matches!(n, Node::Placeholder(_)));
                *nodes = kept;
                taken.extend(removed.into_iter().filter_map(|n| match n {
                    Node::Placeholder(p) => Some(p),
                    _ => None,
                }));
                for node in nodes.iter_mut() {
                    if let Node::Comment(c) = node {
                        next.push(&mut c.replies);
                    }
                }
            }
            level = next;
        }

        taken
    }

    /// Insert materialized nodes under their parents.
    ///
    /// Nodes are attached in the order given, so a parent returned earlier in
    /// the same batch can receive children later in it. Parents are looked up
    /// through an index of comment positions built once per call.
    pub fn graft(&mut self, nodes: Vec<Node>) {
        let mut index = CommentIndex::new();
        index.add_all(&self.roots, &mut Vec::new());

        for node in nodes {
            let parent_path = match node.parent_id() {
                Some(parent) if !parent.starts_with("t3_") => {
                    let path = index.get(parent).cloned();
                    if path.is_none() {
                        warn!(parent_id = %parent, "Parent comment not found, keeping node at top level");
                    }
                    path
                }
                _ => None,
            };

            let path = match parent_path {
                Some(mut path) => match comment_at_mut(&mut self.roots, &path) {
                    Some(parent) => {
                        parent.replies.push(node);
                        path.push(parent.replies.len() - 1);
                        path
                    }
                    None => {
                        self.roots.push(node);
                        vec![self.roots.len() - 1]
                    }
                },
                None => {
                    self.roots.push(node);
                    vec![self.roots.len() - 1]
                }
            };

            if let Some(Node::Comment(c)) = node_at(&self.roots, &path) {
                index.add(c, path);
            }
        }
    }

    /// Breadth-first walk over the whole tree.
    pub fn flatten(&self) -> Vec<ThreadNode> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&Node> = self.roots.iter().collect();

        while let Some(node) = queue.pop_front() {
            match node {
                Node::Comment(c) => {
                    out.push(ThreadNode::Comment(c.body.clone()));
                    queue.extend(c.replies.iter());
                }
                Node::Placeholder(_) | Node::Other { .. } => out.push(ThreadNode::Other),
            }
        }

        out
    }
}

/// Position of a node as child indices from the roots down.
type NodePath = Vec<usize>;

/// Comment fullname to tree position. Grafting only appends, so recorded
/// paths stay valid for the lifetime of one `graft` call.
struct CommentIndex(HashMap<String, NodePath>);

impl CommentIndex {
    fn new() -> Self {
        Self(HashMap::new())
    }

    fn get(&self, name: &str) -> Option<&NodePath> {
        self.0.get(name)
    }

    /// Record a comment and everything beneath it. The first position seen
    /// for a name wins.
    fn add(&mut self, comment: &Comment, path: NodePath) {
        let mut prefix = path.clone();
        self.0.entry(comment.name.clone()).or_insert(path);
        self.add_all(&comment.replies, &mut prefix);
    }

    fn add_all(&mut self, nodes: &[Node], prefix: &mut NodePath) {
        for (i, node) in nodes.iter().enumerate() {
            if let Node::Comment(c) = node {
                prefix.push(i);
                self.0.entry(c.name.clone()).or_insert_with(|| prefix.clone());
                self.add_all(&c.replies, prefix);
                prefix.pop();
            }
        }
    }
}

fn node_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get(*first)?;
    if rest.is_empty() {
        return Some(node);
    }
    match node {
        Node::Comment(c) => node_at(&c.replies, rest),
        _ => None,
    }
}

fn comment_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Comment> {
    let (first, rest) = path.split_first()?;
    match nodes.get_mut(*first)? {
        Node::Comment(c) => {
            if rest.is_empty() {
                Some(c)
            } else {
                comment_at_mut(&mut c.replies, rest)
            }
        }
        _ => None,
    }
}

/// Tracks placeholders already expanded so a misbehaving API can't loop us.
#[derive(Debug, Default)]
pub(crate) struct SeenPlaceholders(HashSet<(String, String)>);

impl SeenPlaceholders {
    /// Returns false if this placeholder was already expanded once.
    pub(crate) fn insert(&mut self, placeholder: &Placeholder) -> bool {
        self.0.insert(placeholder.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(name: &str, parent: &str, replies: Vec<Node>) -> Node {
        Node::Comment(Comment {
            name: name.to_string(),
            parent_id: parent.to_string(),
            body: format!("body of {name}"),
            replies,
        })
    }

    fn more(id: &str, parent: &str, children: &[&str]) -> Node {
        Node::Placeholder(Placeholder {
            id: id.to_string(),
            parent_id: parent.to_string(),
            children: children.iter().map(|c| c.to_string()).collect(),
            count: children.len() as u64,
        })
    }

    #[test]
    fn test_flatten_is_breadth_first() {
        let forest = CommentForest::new(vec![
            comment("t1_a", "t3_s", vec![comment("t1_a1", "t1_a", vec![])]),
            comment("t1_b", "t3_s", vec![comment("t1_b1", "t1_b", vec![])]),
        ]);

        let bodies: Vec<_> = forest
            .flatten()
            .into_iter()
            .map(|n| match n {
                ThreadNode::Comment(t) => t,
                ThreadNode::Other => "other".to_string(),
            })
            .collect();

        assert_eq!(
            bodies,
            vec!["body of t1_a", "body of t1_b", "body of t1_a1", "body of t1_b1"]
        );
    }

    #[test]
    fn test_take_placeholders_removes_nested_markers() {
        let mut forest = CommentForest::new(vec![
            comment("t1_a", "t3_s", vec![more("m2", "t1_a", &["x"])]),
            more("m1", "t3_s", &["y", "z"]),
        ]);
        assert_eq!(forest.placeholder_count(), 2);

        let taken = forest.take_placeholders();

        assert_eq!(taken.len(), 2);
        // Top level first
        assert_eq!(taken[0].id, "m1");
        assert_eq!(taken[1].id, "m2");
        assert_eq!(forest.placeholder_count(), 0);
        assert_eq!(forest.flatten().len(), 1);
    }

    #[test]
    fn test_graft_attaches_under_parent_and_chains() {
        let mut forest = CommentForest::new(vec![comment("t1_a", "t3_s", vec![])]);

        forest.graft(vec![
            comment("t1_b", "t1_a", vec![]),
            // Parent arrives earlier in the same batch
            comment("t1_c", "t1_b", vec![]),
            comment("t1_d", "t3_s", vec![]),
        ]);

        assert_eq!(forest.roots().len(), 2);
        let Node::Comment(a) = &forest.roots()[0] else {
            panic!("expected comment");
        };
        assert_eq!(a.replies.len(), 1);
        let Node::Comment(b) = &a.replies[0] else {
            panic!("expected comment");
        };
        assert_eq!(b.replies.len(), 1);
        assert_eq!(forest.flatten().len(), 4);
    }

    #[test]
    fn test_graft_keeps_orphans() {
        let mut forest = CommentForest::default();
        forest.graft(vec![comment("t1_x", "t1_missing", vec![])]);
        assert_eq!(forest.roots().len(), 1);
    }

    #[test]
    fn test_graft_indexes_nested_replies_of_grafted_nodes() {
        let mut forest = CommentForest::new(vec![comment("t1_a", "t3_s", vec![])]);

        forest.graft(vec![
            comment("t1_b", "t1_a", vec![comment("t1_c", "t1_b", vec![])]),
            // Parent is a reply carried inside an earlier node of this batch
            comment("t1_d", "t1_c", vec![]),
        ]);

        assert_eq!(forest.roots().len(), 1);
        let Some(Node::Comment(c)) = node_at(forest.roots(), &[0, 0, 0]) else {
            panic!("expected comment at a/b/c");
        };
        assert_eq!(c.name, "t1_c");
        assert_eq!(c.replies.len(), 1);
    }

    #[test]
    fn test_graft_long_reply_chain() {
        let mut forest = CommentForest::new(vec![comment("t1_0", "t3_s", vec![])]);
        let chain: Vec<Node> = (1..2000)
            .map(|i| comment(&format!("t1_{i}"), &format!("t1_{}", i - 1), vec![]))
            .collect();

        forest.graft(chain);

        assert_eq!(forest.roots().len(), 1);
        let deepest: Vec<usize> = vec![0; 2000];
        let Some(Node::Comment(last)) = node_at(forest.roots(), &deepest) else {
            panic!("expected comment at the end of the chain");
        };
        assert_eq!(last.name, "t1_1999");
        assert_eq!(forest.flatten().len(), 2000);
    }

    #[test]
    fn test_other_nodes_flatten_to_other() {
        let forest = CommentForest::new(vec![Node::Other {
            kind: "t5".to_string(),
        }]);
        assert_eq!(forest.flatten(), vec![ThreadNode::Other]);
    }

    #[test]
    fn test_seen_placeholders_rejects_repeat() {
        let p = Placeholder {
            id: "_".to_string(),
            parent_id: "t1_a".to_string(),
            children: vec![],
            count: 0,
        };
        let mut seen = SeenPlaceholders::default();
        assert!(p.is_continuation());
        assert!(seen.insert(&p));
        assert!(!seen.insert(&p));
    }
}
