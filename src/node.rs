//! Immutable output tree produced by template resolution
//!
//! Nodes are cheap to clone: child lists are shared `Arc<[Node]>` slices, so a
//! subtree returned by one component can be spliced into many parents.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::renderer::{self, Chunks, SerializeError};

/// Tags that never have children and self-close.
///
/// See <https://developer.mozilla.org/en-US/docs/Glossary/Void_element>
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Tags whose body is one opaque block, escaped in bulk
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Tags whose body holds text only (no nested markup) but is escaped as text
pub const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Ordered attribute mapping; `None` marks a bare attribute (`<input disabled>`)
pub type Attrs = IndexMap<String, Option<String>>;

/// Errors raised while constructing a node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("element tag cannot be empty")]
    EmptyTag,

    #[error("void element <{tag}> cannot have children")]
    VoidWithChildren { tag: String },
}

/// A concrete, fully resolved output node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(Text),
    Comment(String),
    DocumentType(String),
    Fragment(Fragment),
    Element(Element),
}

impl Node {
    /// Plain text, escaped at serialization
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(Text::new(content))
    }

    /// Pre-escaped markup emitted verbatim
    pub fn markup(content: impl Into<String>) -> Self {
        Node::Text(Text::markup(content))
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Node::Comment(content.into())
    }

    pub fn doctype(content: impl Into<String>) -> Self {
        Node::DocumentType(content.into())
    }

    pub fn fragment(children: Vec<Node>) -> Self {
        Node::Fragment(Fragment::new(children))
    }

    /// The empty fragment, used for `false` and absent values
    pub fn empty() -> Self {
        Node::Fragment(Fragment::default())
    }

    pub fn element(tag: impl Into<String>, attrs: Attrs, children: Vec<Node>) -> Result<Self, NodeError> {
        Element::new(tag, attrs, children).map(Node::Element)
    }

    pub fn is_empty_fragment(&self) -> bool {
        matches!(self, Node::Fragment(f) if f.children.is_empty())
    }

    /// Serialize this node to a string
    pub fn serialize(&self) -> Result<String, SerializeError> {
        renderer::serialize(self)
    }

    /// Lazily serialize this node as a sequence of chunks
    pub fn chunks(&self) -> Chunks {
        Chunks::new(self.clone())
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Fragment> for Node {
    fn from(fragment: Fragment) -> Self {
        Node::Fragment(fragment)
    }
}

/// A text node; `safe` text has already been escaped by its producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    content: String,
    safe: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            safe: false,
        }
    }

    pub fn markup(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            safe: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_safe(&self) -> bool {
        self.safe
    }
}

/// An ordered group of siblings with no wrapping tag
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    children: Arc<[Node]>,
}

impl Fragment {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children: children.into(),
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn shared_children(&self) -> Arc<[Node]> {
        Arc::clone(&self.children)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attrs: Attrs,
    children: Arc<[Node]>,
}

impl Element {
    /// Build an element, enforcing the void-element invariant
    pub fn new(tag: impl Into<String>, attrs: Attrs, children: Vec<Node>) -> Result<Self, NodeError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(NodeError::EmptyTag);
        }
        if is_void(&tag) && !children.is_empty() {
            return Err(NodeError::VoidWithChildren { tag });
        }
        Ok(Self {
            tag,
            attrs,
            children: children.into(),
        })
    }

    /// Start building an element with chained attribute and child calls
    pub fn builder(tag: impl Into<String>) -> ElementBuilder {
        ElementBuilder {
            tag: tag.into(),
            attrs: Attrs::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.tag)
    }

    pub fn is_raw_text(&self) -> bool {
        is_raw_text(&self.tag)
    }

    pub(crate) fn shared_children(&self) -> Arc<[Node]> {
        Arc::clone(&self.children)
    }
}

/// Builder returned by [`Element::builder`]
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    attrs: Attrs,
    children: Vec<Node>,
}

impl ElementBuilder {
    /// Add an attribute with a value
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), Some(value.into()));
        self
    }

    /// Add a bare attribute
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), None);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn build(self) -> Result<Element, NodeError> {
        Element::new(self.tag, self.attrs, self.children)
    }
}

/// Splice fragments into their parent list, transitively, preserving order
pub fn flatten(nodes: Vec<Node>) -> Vec<Node> {
    let mut flat = Vec::with_capacity(nodes.len());
    for node in nodes {
        push_flat(node, &mut flat);
    }
    flat
}

fn push_flat(node: Node, out: &mut Vec<Node>) {
    match node {
        Node::Fragment(fragment) => {
            for child in fragment.children.iter() {
                push_flat(child.clone(), out);
            }
        }
        other => out.push(other),
    }
}
