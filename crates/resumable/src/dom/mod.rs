//! Arena-backed node tree
//!
//! The tree is the physical layer that virtual grouping nodes overlay. It
//! models just enough of a document for marker-based grouping to work:
//! elements with ordered attributes, text, comments (used as markers) and
//! fragments (used as off-tree holding areas).
//!
//! Nodes are addressed by [`NodeId`], an index into the document's arena.
//! Nodes are never freed; removing a node detaches it from its parent and
//! leaves it available for re-insertion, mirroring how a browser DOM keeps
//! detached nodes alive while something references them.

mod position;
mod selector;

pub use position::DocumentPosition;
pub use selector::{AttributeMatch, Selector};

use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::config::ResumeConfig;
use crate::error::DomError;
use crate::virtual_element::VirtualData;

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root
    Document,

    /// An element with a tag and ordered attributes
    Element {
        /// Tag name
        tag: String,
        /// Attributes in insertion order
        attributes: IndexMap<String, String>,
    },

    /// A text node
    Text(String),

    /// A comment node; virtual grouping markers are comments
    Comment(String),

    /// A parentless container whose children are moved, not the fragment
    /// itself, when it is inserted
    Fragment,
}

impl NodeKind {
    fn can_have_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Element { .. } | NodeKind::Fragment
        )
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A node tree plus the side table of virtual grouping nodes built over it.
///
/// # Panics
///
/// A [`NodeId`] is only meaningful for the document that created it. Every
/// method taking a `NodeId` panics when handed an id from another document
/// that lies outside this one's arena.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    /// Virtual nodes keyed by their open marker. Entries hold ids only, so
    /// the table never owns tree structure.
    pub(crate) virtuals: HashMap<NodeId, VirtualData>,
    config: ResumeConfig,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with default configuration.
    pub fn new() -> Self {
        Self::with_config(ResumeConfig::default())
    }

    /// Create an empty document with the given configuration.
    pub fn with_config(config: ResumeConfig) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            virtuals: HashMap::new(),
            config,
        }
    }

    /// Configuration this document was created with
    pub fn config(&self) -> &ResumeConfig {
        &self.config
    }

    /// The document root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever created in this document
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A document always holds its root
    pub fn is_empty(&self) -> bool {
        false
    }

    // ═══════════════════════════════════════════════════════════════════
    // Node Creation
    // ═══════════════════════════════════════════════════════════════════

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.into(),
            attributes: IndexMap::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(data.into()))
    }

    /// Create an empty fragment.
    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeKind::Fragment)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Node Inspection
    // ═══════════════════════════════════════════════════════════════════

    fn node(&self, id: NodeId) -> &NodeData {
        match self.nodes.get(id.0) {
            Some(node) => node,
            None => foreign_node(id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        match self.nodes.get_mut(id.0) {
            Some(node) => node,
            None => foreign_node(id),
        }
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Check if a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    /// Check if a node is a comment
    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Comment(_))
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Payload of a comment node
    pub fn comment_data(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Comment(data) => Some(data),
            _ => None,
        }
    }

    /// Replace the payload of a comment node.
    pub fn set_comment_data(&mut self, id: NodeId, data: impl Into<String>) -> Result<(), DomError> {
        match &mut self.node_mut(id).kind {
            NodeKind::Comment(current) => {
                *current = data.into();
                Ok(())
            }
            _ => Err(DomError::WrongKind {
                node: id,
                expected: "a comment",
            }),
        }
    }

    /// Attribute of an element
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Check if an element carries an attribute
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Set an element attribute.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.into(), value.into());
                Ok(())
            }
            _ => Err(DomError::WrongKind {
                node: id,
                expected: "an element",
            }),
        }
    }

    /// Remove an element attribute, returning its old value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element { attributes, .. } => attributes.shift_remove(name),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Parent of a node, only when that parent is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// Children of a node in order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// First child of a node
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Next sibling of a node
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Previous sibling of a node
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Check whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Check whether a node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Descendants of `root` in document order, excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // ═══════════════════════════════════════════════════════════════════
    // Structural Mutation
    // ═══════════════════════════════════════════════════════════════════

    /// Insert `node` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. The node is first detached from wherever it
    /// was. Inserting a fragment moves the fragment's children instead.
    ///
    /// # Errors
    ///
    /// - `NotAChild` if `reference` is not a child of `parent`
    /// - `HierarchyRequest` if `parent` cannot hold children or the
    ///   insertion would make a node its own ancestor
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        if !self.kind(parent).can_have_children()
            || matches!(self.kind(node), NodeKind::Document)
            || self.contains(node, parent)
        {
            return Err(DomError::HierarchyRequest { parent, node });
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }

        if matches!(self.kind(node), NodeKind::Fragment) {
            let moved: Vec<NodeId> = self.children(node).to_vec();
            for child in moved {
                self.insert_before(parent, child, reference)?;
            }
            return Ok(node);
        }

        // Inserting a node before itself keeps it in place.
        let reference = match reference {
            Some(r) if r == node => self.next_sibling(node),
            other => other,
        };

        self.detach(node);
        let index = match reference {
            Some(r) => self
                .children(parent)
                .iter()
                .position(|&c| c == r)
                .ok_or(DomError::NotAChild { parent, child: r })?,
            None => self.children(parent).len(),
        };
        self.node_mut(parent).children.insert(index, node);
        self.node_mut(node).parent = Some(parent);
        Ok(node)
    }

    /// Append `node` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId, DomError> {
        self.insert_before(parent, node, None)
    }

    /// Remove `child` from `parent`.
    ///
    /// # Errors
    ///
    /// Returns `NotAChild` if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(child)
    }

    /// Detach a node from its parent, if it has one.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.node_mut(node).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != node);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// Check whether a node is an element matching `selector`.
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        match self.kind(id) {
            NodeKind::Element { tag, attributes } => selector
                .matches_with(tag, |name| attributes.get(name).map(String::as_str)),
            _ => false,
        }
    }

    /// Nearest inclusive ancestor element matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.matches(node, selector) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// First descendant of `root` matching `selector`.
    pub fn query_selector(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.matches(id, selector))
    }

    /// All descendants of `root` matching `selector`, in document order.
    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.matches(id, selector))
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Rendering
    // ═══════════════════════════════════════════════════════════════════

    /// Render a node and its subtree as markup. Documents and fragments
    /// render their children only.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document | NodeKind::Fragment => {
                for &child in self.children(id) {
                    self.render_into(child, out);
                }
            }
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    if value.is_empty() {
                        let _ = write!(out, " {}", name);
                    } else {
                        let _ = write!(out, " {}=\"{}\"", name, escape_markup(value, true));
                    }
                }
                out.push('>');
                for &child in self.children(id) {
                    self.render_into(child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
            NodeKind::Text(text) => out.push_str(&escape_markup(text, false)),
            NodeKind::Comment(data) => {
                let _ = write!(out, "<!--{}-->", data);
            }
        }
    }
}

#[cold]
fn foreign_node(id: NodeId) -> ! {
    panic!("{:?} does not belong to this document", id)
}

fn escape_markup(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let a = doc.create_element("a");
        let b = doc.create_text("b");
        doc.append_child(doc.root(), body).unwrap();
        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();
        (doc, body, a, b)
    }

    #[test]
    fn test_append_and_siblings() {
        let (doc, body, a, b) = sample();
        assert_eq!(doc.children(body), &[a, b]);
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.previous_sibling(b), Some(a));
        assert_eq!(doc.previous_sibling(a), None);
        assert!(doc.is_connected(b));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let (mut doc, body, a, b) = sample();
        doc.insert_before(body, b, Some(a)).unwrap();
        assert_eq!(doc.children(body), &[b, a]);
    }

    #[test]
    fn test_insert_before_self_is_noop() {
        let (mut doc, body, a, b) = sample();
        doc.insert_before(body, a, Some(a)).unwrap();
        assert_eq!(doc.children(body), &[a, b]);
    }

    #[test]
    fn test_insert_rejects_cycles_and_leaves() {
        let (mut doc, body, a, b) = sample();
        assert!(matches!(
            doc.append_child(a, body),
            Err(DomError::HierarchyRequest { .. })
        ));
        let c = doc.create_element("c");
        assert!(matches!(
            doc.append_child(b, c),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn test_fragment_insertion_moves_children() {
        let (mut doc, body, a, _) = sample();
        let frag = doc.create_fragment();
        let x = doc.create_text("x");
        let y = doc.create_text("y");
        doc.append_child(frag, x).unwrap();
        doc.append_child(frag, y).unwrap();
        doc.insert_before(body, frag, Some(a)).unwrap();
        assert_eq!(doc.children(frag), &[] as &[NodeId]);
        assert_eq!(&doc.children(body)[..2], &[x, y]);
    }

    #[test]
    fn test_remove_child_requires_parent() {
        let (mut doc, body, a, _) = sample();
        let root = doc.root();
        assert!(doc.remove_child(root, a).is_err());
        doc.remove_child(body, a).unwrap();
        assert!(!doc.is_connected(a));
        assert_eq!(doc.parent(a), None);
    }

    #[test]
    fn test_render() {
        let (mut doc, body, a, _) = sample();
        doc.set_attribute(a, "href", "/x?a&b").unwrap();
        let c = doc.create_comment("qv ");
        doc.append_child(body, c).unwrap();
        assert_eq!(
            doc.render(body),
            "<body><a href=\"/x?a&amp;b\"></a>b<!--qv --></body>"
        );
    }

    #[test]
    #[should_panic(expected = "does not belong to this document")]
    fn test_foreign_node_id_panics_with_message() {
        let mut big = Document::new();
        let mut far = big.create_element("x");
        for _ in 0..4 {
            far = big.create_element("x");
        }
        let small = Document::new();
        small.parent(far);
    }
}
