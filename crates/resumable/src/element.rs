//! Uniform handle over real elements and virtual grouping nodes

use crate::dom::{Document, DocumentPosition, NodeId, Selector};
use crate::error::VirtualError;
use crate::virtual_element::{VirtualElement, VIRTUAL};

/// Either a real node or a virtual grouping node.
///
/// Code that only needs to insert children, read attributes or query
/// descendants can take an `ElementRef` and stay agnostic of which kind of
/// node it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    /// A node of the real tree
    Node(NodeId),
    /// A virtual grouping node
    Virtual(VirtualElement),
}

impl From<NodeId> for ElementRef {
    fn from(node: NodeId) -> Self {
        ElementRef::Node(node)
    }
}

impl From<VirtualElement> for ElementRef {
    fn from(v: VirtualElement) -> Self {
        ElementRef::Virtual(v)
    }
}

impl ElementRef {
    /// Check if this is a virtual grouping node
    pub fn is_virtual(&self) -> bool {
        matches!(self, ElementRef::Virtual(_))
    }

    /// The virtual element, if this is one
    pub fn as_virtual(&self) -> Option<VirtualElement> {
        match self {
            ElementRef::Virtual(v) => Some(*v),
            ElementRef::Node(_) => None,
        }
    }

    /// Tag name, or `:virtual`
    pub fn local_name<'d>(&self, doc: &'d Document) -> &'d str {
        match self {
            ElementRef::Node(node) => doc.tag_name(*node).unwrap_or(""),
            ElementRef::Virtual(_) => VIRTUAL,
        }
    }

    /// Insert `node` before `reference` (or at the end).
    pub fn insert_before(
        &self,
        doc: &mut Document,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, VirtualError> {
        match self {
            ElementRef::Node(parent) => Ok(doc.insert_before(*parent, node, reference)?),
            ElementRef::Virtual(v) => v.insert_before(doc, node, reference),
        }
    }

    /// Append `node` at the end.
    pub fn append_child(&self, doc: &mut Document, node: NodeId) -> Result<NodeId, VirtualError> {
        self.insert_before(doc, node, None)
    }

    /// Remove a child.
    pub fn remove_child(&self, doc: &mut Document, node: NodeId) -> Result<NodeId, VirtualError> {
        match self {
            ElementRef::Node(parent) => Ok(doc.remove_child(*parent, node)?),
            ElementRef::Virtual(v) => v.remove_child(doc, node),
        }
    }

    /// Attribute value, if present
    pub fn get_attribute<'d>(&self, doc: &'d Document, key: &str) -> Option<&'d str> {
        match self {
            ElementRef::Node(node) => doc.get_attribute(*node, key),
            ElementRef::Virtual(v) => v.get_attribute(doc, key),
        }
    }

    /// Set an attribute.
    pub fn set_attribute(
        &self,
        doc: &mut Document,
        key: &str,
        value: &str,
    ) -> Result<(), VirtualError> {
        match self {
            ElementRef::Node(node) => Ok(doc.set_attribute(*node, key, value)?),
            ElementRef::Virtual(v) => v.set_attribute(doc, key, value),
        }
    }

    /// Parent element
    pub fn parent_element(&self, doc: &Document) -> Option<NodeId> {
        match self {
            ElementRef::Node(node) => doc.parent_element(*node),
            ElementRef::Virtual(v) => v.parent_element(doc),
        }
    }

    /// Check if this element matches `selector`; virtual elements never do.
    pub fn matches(&self, doc: &Document, selector: &Selector) -> bool {
        match self {
            ElementRef::Node(node) => doc.matches(*node, selector),
            ElementRef::Virtual(v) => v.matches(selector),
        }
    }

    /// Nearest matching ancestor element.
    pub fn closest(&self, doc: &Document, selector: &Selector) -> Option<NodeId> {
        match self {
            ElementRef::Node(node) => doc.closest(*node, selector),
            ElementRef::Virtual(v) => v.closest(doc, selector),
        }
    }

    /// First matching descendant element.
    pub fn query_selector(&self, doc: &Document, selector: &Selector) -> Option<NodeId> {
        match self {
            ElementRef::Node(node) => doc.query_selector(*node, selector),
            ElementRef::Virtual(v) => v.query_selector(doc, selector),
        }
    }

    /// Every matching descendant element.
    pub fn query_selector_all(&self, doc: &Document, selector: &Selector) -> Vec<NodeId> {
        match self {
            ElementRef::Node(node) => doc.query_selector_all(*node, selector),
            ElementRef::Virtual(v) => v.query_selector_all(doc, selector),
        }
    }

    /// Position of `other` relative to this element.
    pub fn compare_document_position(&self, doc: &Document, other: NodeId) -> DocumentPosition {
        match self {
            ElementRef::Node(node) => doc.compare_document_position(*node, other),
            ElementRef::Virtual(v) => v.compare_document_position(doc, other),
        }
    }
}
