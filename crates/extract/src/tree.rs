//! Schema-less document tree and the traversal that pulls values out of it.
//!
//! The tree has the same shape regardless of what vocabulary the document
//! uses: elements become mappings keyed by child element name, every child
//! key holds a sequence, attributes hide under [`ATTRIBUTES_KEY`] and text
//! content under [`TEXT_KEY`]. Nothing is validated against a schema; a
//! traversal path that doesn't exist simply yields nothing.

use std::collections::BTreeMap;

/// Key under which an element's attributes are stored.
pub const ATTRIBUTES_KEY: &str = "$";
/// Key under which an element's text content is stored (when the element
/// also has attributes or children, otherwise it collapses to a scalar).
pub const TEXT_KEY: &str = "_";

/// A node in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(String),
    Sequence(Vec<Node>),
    Mapping(BTreeMap<String, Node>),
}

impl Node {
    /// Child under `step`, if this node is a mapping that has one.
    pub fn get(&self, step: &str) -> Option<&Node> {
        match self {
            Node::Mapping(map) => map.get(step),
            Node::Scalar(_) | Node::Sequence(_) => None,
        }
    }

    /// Text content of the node.
    ///
    /// A scalar is its own text; a mapping may carry text under [`TEXT_KEY`]
    /// when the element also had attributes (`<a b="c">text</a>`).
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Scalar(text) => Some(text),
            Node::Mapping(map) => match map.get(TEXT_KEY) {
                Some(Node::Scalar(text)) => Some(text),
                _ => None,
            },
            Node::Sequence(_) => None,
        }
    }

    /// Collects every node reachable by following `path`, one step at a time.
    ///
    /// Each step descends into the child named by that step on every node in
    /// the current working set. A child that is a sequence gets spliced in
    /// element by element (exactly one level of flattening); any other child
    /// is added as-is. Nodes without the step contribute nothing, and once
    /// the working set is empty the traversal stops early.
    ///
    /// Results keep traversal order: parents in working-set order, each
    /// parent's children in their original order. An empty result is the
    /// normal answer for "not present", never an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgrdf_extract::Node;
    ///
    /// let root: Node = r#"<r><a><b>1</b><b>2</b></a><a><b>3</b></a></r>"#.parse().unwrap();
    /// let found: Vec<_> = root.aggregate(&["r", "a", "b"]).into_iter().filter_map(Node::text).collect();
    /// assert_eq!(found, vec!["1", "2", "3"]);
    /// assert!(root.aggregate(&["r", "missing", "b"]).is_empty());
    /// ```
    pub fn aggregate<S: AsRef<str>>(&self, path: &[S]) -> Vec<&Node> {
        let mut working: Vec<&Node> = vec![self];
        for step in path {
            let step = step.as_ref();
            let mut next = Vec::new();
            for node in working {
                match node.get(step) {
                    Some(Node::Sequence(children)) => next.extend(children.iter()),
                    Some(child) => next.push(child),
                    None => {},
                }
            }
            working = next;
            if working.is_empty() {
                break;
            }
        }
        working
    }

    /// Text of the first node reachable by `path`.
    pub fn first_text<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.aggregate(path).into_iter().next().and_then(Node::text)
    }

    /// Text of every node reachable by `path`, skipping nodes without text.
    pub fn all_text<S: AsRef<str>>(&self, path: &[S]) -> Vec<&str> {
        self.aggregate(path).into_iter().filter_map(Node::text).collect()
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(value.to_string())
    }
}
impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(value)
    }
}
impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::Sequence(value)
    }
}
impl<K: Into<String>> FromIterator<(K, Node)> for Node {
    fn from_iter<T: IntoIterator<Item = (K, Node)>>(iter: T) -> Self {
        Node::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
