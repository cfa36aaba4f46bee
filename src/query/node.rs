//! Predicate tree
//!
//! Intersections join children with a space, unions with ` | `. Nested nodes
//! of the same kind flatten and blank children drop out, so a tree never
//! renders empty parentheses.

use std::fmt;

/// Parenthesization mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenMode {
    /// Never wrap this node
    Never,
    /// Wrap leaves, and compound nodes with more than one child
    Default,
    /// Always wrap
    Always,
}

/// A boolean query expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// Raw clause text
    Leaf(String),
    /// All children must match
    Intersect(Vec<QueryNode>),
    /// Any child may match
    Union(Vec<QueryNode>),
}

impl Default for QueryNode {
    fn default() -> Self {
        QueryNode::empty()
    }
}

impl QueryNode {
    /// The blank tree; serializes to `*`
    pub fn empty() -> Self {
        QueryNode::Intersect(Vec::new())
    }

    /// A clause leaf
    pub fn leaf(text: impl Into<String>) -> Self {
        QueryNode::Leaf(text.into())
    }

    /// Intersection of `nodes`
    pub fn intersect<I: IntoIterator<Item = QueryNode>>(nodes: I) -> Self {
        let mut children = Vec::new();
        for node in nodes {
            match node {
                QueryNode::Intersect(inner) => children.extend(inner),
                other if other.is_blank() => {}
                other => children.push(other),
            }
        }
        QueryNode::Intersect(children)
    }

    /// Union of `nodes`
    pub fn union<I: IntoIterator<Item = QueryNode>>(nodes: I) -> Self {
        let mut children = Vec::new();
        for node in nodes {
            match node {
                QueryNode::Union(inner) => children.extend(inner),
                other if other.is_blank() => {}
                other => children.push(other),
            }
        }
        QueryNode::Union(children)
    }

    /// `self AND other`
    pub fn and(self, other: QueryNode) -> Self {
        QueryNode::intersect([self, other])
    }

    /// `self OR other`
    pub fn or(self, other: QueryNode) -> Self {
        QueryNode::union([self, other])
    }

    /// Compose a free-text clause onto this tree
    ///
    /// A blank tree becomes the free-text leaf itself.
    pub fn with_free_text(self, text: impl Into<String>) -> Self {
        let leaf = QueryNode::leaf(text);
        if self.is_blank() {
            leaf
        } else {
            self.and(leaf)
        }
    }

    /// True if the node renders to nothing
    pub fn is_blank(&self) -> bool {
        match self {
            QueryNode::Leaf(text) => text.trim().is_empty(),
            QueryNode::Intersect(children) | QueryNode::Union(children) => {
                children.iter().all(QueryNode::is_blank)
            }
        }
    }

    /// Render with the given parenthesization
    ///
    /// Children of a multi-child node render in `Default` mode (or `Always`
    /// when the parent is `Always`). A single child renders in place of its
    /// parent.
    pub fn render(&self, mode: ParenMode) -> String {
        match self {
            QueryNode::Leaf(text) => match mode {
                ParenMode::Never => text.clone(),
                ParenMode::Default | ParenMode::Always => format!("({})", text),
            },
            QueryNode::Intersect(children) => Self::render_children(children, " ", mode),
            QueryNode::Union(children) => Self::render_children(children, " | ", mode),
        }
    }

    fn render_children(children: &[QueryNode], separator: &str, mode: ParenMode) -> String {
        let visible: Vec<&QueryNode> = children.iter().filter(|c| !c.is_blank()).collect();
        match visible.len() {
            0 => String::new(),
            1 => visible[0].render(mode),
            _ => {
                let child_mode = match mode {
                    ParenMode::Always => ParenMode::Always,
                    _ => ParenMode::Default,
                };
                let joined = visible
                    .iter()
                    .map(|c| c.render(child_mode))
                    .collect::<Vec<_>>()
                    .join(separator);
                match mode {
                    ParenMode::Never => joined,
                    ParenMode::Default | ParenMode::Always => format!("({})", joined),
                }
            }
        }
    }

    /// Query string for the whole tree; blank trees become `*`
    pub fn to_query_string(&self) -> String {
        serialize(self)
    }
}

/// Serialize a whole query: outer wrap omitted, blank tree is `*`
pub fn serialize(node: &QueryNode) -> String {
    let rendered = node.render(ParenMode::Never);
    if rendered.trim().is_empty() {
        "*".to_string()
    } else {
        rendered
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serialize(self))
    }
}
