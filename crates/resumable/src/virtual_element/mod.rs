//! Virtual grouping nodes
//!
//! A virtual element groups a run of sibling nodes without adding a node of
//! its own to the tree. It is anchored by two comment markers:
//!
//! ```text
//! <div>
//!   <!--qv q:key=a+b-->   open marker, payload holds the attributes
//!   <span>…</span>        children: every sibling between the markers
//!   <!--/qv-->            close marker
//! </div>
//! ```
//!
//! While the element is not attached anywhere, its children live in a
//! private fragment (the detached store), so they can be built up before
//! the group is inserted.
//!
//! [`VirtualElement`] is a copyable handle keyed by the open marker. Its
//! state lives in the owning [`Document`]'s side table; every operation
//! takes the document explicitly.

mod attributes;
mod markers;

pub use attributes::{escape, parse_virtual_attributes, serialize_virtual_attributes, unescape};
pub use markers::{
    find_close, get_root_node, get_virtual_element, is_virtual_close, is_virtual_open,
    process_virtual_nodes, query_all_virtual_by_attribute, query_virtual_by_attribute,
    VIRTUAL, VIRTUAL_CLOSE, VIRTUAL_OPEN_PREFIX,
};

use indexmap::IndexMap;

use crate::dom::{Document, DocumentPosition, NodeId, Selector};
use crate::element::ElementRef;
use crate::error::VirtualError;

/// Side-table entry for one virtual element.
#[derive(Debug, Clone)]
pub(crate) struct VirtualData {
    close: NodeId,
    store: NodeId,
    attributes: IndexMap<String, String>,
}

/// Handle to a virtual grouping node.
///
/// Two handles are equal exactly when they share the same open marker, so
/// reconstructing a virtual element from the same marker always yields the
/// same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualElement {
    open: NodeId,
    close: NodeId,
}

impl VirtualElement {
    /// Create a fresh, unattached virtual element with no attributes.
    pub fn create(doc: &mut Document) -> Self {
        let open = doc.create_comment(VIRTUAL_OPEN_PREFIX);
        let close = doc.create_comment(VIRTUAL_CLOSE);
        Self::register(doc, open, close, IndexMap::new())
    }

    /// Build a virtual element over an existing marker pair.
    ///
    /// The attributes are parsed from the open marker's payload. If the open
    /// marker is already registered, the existing element is returned.
    ///
    /// # Errors
    ///
    /// Returns `NotAVirtualMarker` if `open` is not a comment starting with
    /// the `qv ` prefix.
    pub fn new(doc: &mut Document, open: NodeId, close: NodeId) -> Result<Self, VirtualError> {
        if let Some(existing) = doc.virtuals.get(&open) {
            return Ok(Self {
                open,
                close: existing.close,
            });
        }
        let payload = doc
            .comment_data(open)
            .and_then(|data| data.strip_prefix(VIRTUAL_OPEN_PREFIX))
            .ok_or(VirtualError::NotAVirtualMarker { node: open })?;
        let attributes = parse_virtual_attributes(payload);
        Ok(Self::register(doc, open, close, attributes))
    }

    fn register(
        doc: &mut Document,
        open: NodeId,
        close: NodeId,
        attributes: IndexMap<String, String>,
    ) -> Self {
        let store = doc.create_fragment();
        doc.virtuals.insert(
            open,
            VirtualData {
                close,
                store,
                attributes,
            },
        );
        Self { open, close }
    }

    /// The open marker
    pub fn open(&self) -> NodeId {
        self.open
    }

    /// The close marker
    pub fn close(&self) -> NodeId {
        self.close
    }

    /// Always `:virtual`
    pub fn local_name(&self) -> &'static str {
        VIRTUAL
    }

    fn data<'d>(&self, doc: &'d Document) -> Option<&'d VirtualData> {
        doc.virtuals.get(&self.open)
    }

    fn store(&self, doc: &Document) -> Option<NodeId> {
        self.data(doc).map(|d| d.store)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Attributes
    // ═══════════════════════════════════════════════════════════════════

    /// Attribute value, if present
    pub fn get_attribute<'d>(&self, doc: &'d Document, key: &str) -> Option<&'d str> {
        self.data(doc)?.attributes.get(key).map(String::as_str)
    }

    /// Check if an attribute is present
    pub fn has_attribute(&self, doc: &Document, key: &str) -> bool {
        self.data(doc)
            .is_some_and(|d| d.attributes.contains_key(key))
    }

    /// All attributes in order
    pub fn attributes<'d>(&self, doc: &'d Document) -> impl Iterator<Item = (&'d str, &'d str)> {
        self.data(doc)
            .into_iter()
            .flat_map(|d| d.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Set an attribute and rewrite the open marker payload.
    ///
    /// # Errors
    ///
    /// `NotAVirtualMarker` if this handle does not belong to `doc`.
    pub fn set_attribute(
        &self,
        doc: &mut Document,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), VirtualError> {
        self.data_mut(doc)?.attributes.insert(key.into(), value.into());
        self.update_comment(doc)
    }

    /// Remove an attribute and rewrite the open marker payload.
    pub fn remove_attribute(&self, doc: &mut Document, key: &str) -> Result<(), VirtualError> {
        self.data_mut(doc)?.attributes.shift_remove(key);
        self.update_comment(doc)
    }

    fn data_mut<'d>(&self, doc: &'d mut Document) -> Result<&'d mut VirtualData, VirtualError> {
        doc.virtuals
            .get_mut(&self.open)
            .ok_or(VirtualError::NotAVirtualMarker { node: self.open })
    }

    fn update_comment(&self, doc: &mut Document) -> Result<(), VirtualError> {
        let payload = self
            .data(doc)
            .map(|d| serialize_virtual_attributes(&d.attributes))
            .ok_or(VirtualError::NotAVirtualMarker { node: self.open })?;
        doc.set_comment_data(self.open, format!("{}{}", VIRTUAL_OPEN_PREFIX, payload))?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Structure
    // ═══════════════════════════════════════════════════════════════════

    /// Node holding the markers, or `None` while unattached.
    ///
    /// This is usually an element, but may also be another virtual
    /// element's detached store.
    pub fn parent(&self, doc: &Document) -> Option<NodeId> {
        doc.parent(self.open)
    }

    /// Element holding the markers
    pub fn parent_element(&self, doc: &Document) -> Option<NodeId> {
        doc.parent_element(self.open)
    }

    /// Check whether the markers sit inside a parent node.
    pub fn is_attached(&self, doc: &Document) -> bool {
        self.parent(doc).is_some()
    }

    /// Check whether the open marker is reachable from the document root.
    pub fn is_connected(&self, doc: &Document) -> bool {
        doc.is_connected(self.open)
    }

    /// Insert `node` before `reference`, or at the end of the group when
    /// `reference` is `None`.
    pub fn insert_before(
        &self,
        doc: &mut Document,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, VirtualError> {
        match self.parent(doc) {
            Some(parent) => {
                doc.insert_before(parent, node, Some(reference.unwrap_or(self.close)))?;
            }
            None => {
                let store = self.store(doc).ok_or(VirtualError::NotAVirtualMarker {
                    node: self.open,
                })?;
                doc.insert_before(store, node, reference)?;
            }
        }
        Ok(node)
    }

    /// Append `node` at the end of the group.
    pub fn append_child(&self, doc: &mut Document, node: NodeId) -> Result<NodeId, VirtualError> {
        self.insert_before(doc, node, None)
    }

    /// Remove a child of the group.
    pub fn remove_child(&self, doc: &mut Document, node: NodeId) -> Result<NodeId, VirtualError> {
        let holder = match self.parent(doc) {
            Some(parent) => parent,
            None => self.store(doc).ok_or(VirtualError::NotAVirtualMarker {
                node: self.open,
            })?,
        };
        Ok(doc.remove_child(holder, node)?)
    }

    /// Detach the group: children move into the detached store and both
    /// markers leave the parent. Does nothing while unattached.
    ///
    /// # Panics
    ///
    /// With development checks enabled, panics if the detached store is not
    /// empty beforehand.
    pub fn remove(&self, doc: &mut Document) -> Result<(), VirtualError> {
        let Some(parent) = self.parent(doc) else {
            return Ok(());
        };
        let store = self.store(doc).ok_or(VirtualError::NotAVirtualMarker {
            node: self.open,
        })?;
        let children = self.child_nodes(doc);
        if doc.config().dev_checks {
            assert!(
                doc.children(store).is_empty(),
                "detached store of virtual element {:?} should be empty",
                self.open
            );
        }
        doc.remove_child(parent, self.open)?;
        for child in children {
            doc.append_child(store, child)?;
        }
        doc.remove_child(parent, self.close)?;
        Ok(())
    }

    /// Attach the group into `new_parent` before `reference`: the open
    /// marker, then every child in order, then the close marker.
    ///
    /// Attaching an element that is already attached moves it, after
    /// logging a warning.
    ///
    /// # Panics
    ///
    /// With development checks enabled, panics if the detached store is not
    /// empty afterwards.
    pub fn insert_before_to(
        &self,
        doc: &mut Document,
        new_parent: ElementRef,
        reference: Option<NodeId>,
    ) -> Result<(), VirtualError> {
        let children = self.child_nodes(doc);
        if self.is_attached(doc) && doc.config().warn_on_reattach {
            tracing::warn!(open = ?self.open, "virtual element is already attached");
        }
        new_parent.insert_before(doc, self.open, reference)?;
        for child in children {
            new_parent.insert_before(doc, child, reference)?;
        }
        new_parent.insert_before(doc, self.close, reference)?;
        if doc.config().dev_checks {
            let remaining = self.store(doc).map_or(0, |s| doc.children(s).len());
            assert_eq!(
                remaining, 0,
                "detached store of virtual element {:?} should be empty",
                self.open
            );
        }
        Ok(())
    }

    /// Attach the group at the end of `new_parent`.
    pub fn append_to(&self, doc: &mut Document, new_parent: ElementRef) -> Result<(), VirtualError> {
        self.insert_before_to(doc, new_parent, None)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Traversal
    // ═══════════════════════════════════════════════════════════════════

    /// First node of the group
    pub fn first_child(&self, doc: &Document) -> Option<NodeId> {
        if self.is_attached(doc) {
            doc.next_sibling(self.open).filter(|&n| n != self.close)
        } else {
            self.store(doc).and_then(|s| doc.first_child(s))
        }
    }

    /// Node after the close marker
    pub fn next_sibling(&self, doc: &Document) -> Option<NodeId> {
        doc.next_sibling(self.close)
    }

    /// Node before the open marker
    pub fn previous_sibling(&self, doc: &Document) -> Option<NodeId> {
        doc.previous_sibling(self.open)
    }

    /// Every node strictly between the markers, or the detached store's
    /// contents while unattached.
    pub fn child_nodes(&self, doc: &Document) -> Vec<NodeId> {
        if !self.is_attached(doc) {
            return self
                .store(doc)
                .map(|s| doc.children(s).to_vec())
                .unwrap_or_default();
        }
        let mut nodes = Vec::new();
        let mut current = doc.next_sibling(self.open);
        while let Some(node) = current {
            if node == self.close {
                break;
            }
            nodes.push(node);
            current = doc.next_sibling(node);
        }
        nodes
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// Virtual elements never match a selector.
    pub fn matches(&self, _selector: &Selector) -> bool {
        false
    }

    /// Nearest ancestor element matching `selector`.
    pub fn closest(&self, doc: &Document, selector: &Selector) -> Option<NodeId> {
        self.parent(doc).and_then(|p| doc.closest(p, selector))
    }

    /// First element inside the group matching `selector`.
    pub fn query_selector(&self, doc: &Document, selector: &Selector) -> Option<NodeId> {
        for child in self.child_nodes(doc) {
            if doc.is_element(child) {
                if doc.matches(child, selector) {
                    return Some(child);
                }
                if let Some(found) = doc.query_selector(child, selector) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Every element inside the group matching `selector`, in document order.
    pub fn query_selector_all(&self, doc: &Document, selector: &Selector) -> Vec<NodeId> {
        let mut result = Vec::new();
        for child in self.child_nodes(doc) {
            if doc.is_element(child) {
                if doc.matches(child, selector) {
                    result.push(child);
                }
                result.extend(doc.query_selector_all(child, selector));
            }
        }
        result
    }

    /// Position of `other` relative to the open marker.
    pub fn compare_document_position(&self, doc: &Document, other: NodeId) -> DocumentPosition {
        doc.compare_document_position(self.open, other)
    }
}
