//! Locating and pairing virtual markers in a live tree

use super::VirtualElement;
use crate::dom::{Document, NodeId};
use crate::element::ElementRef;
use crate::error::VirtualError;

/// Payload prefix of an open marker
pub const VIRTUAL_OPEN_PREFIX: &str = "qv ";

/// Payload of a close marker
pub const VIRTUAL_CLOSE: &str = "/qv";

/// Local name reported by virtual elements
pub const VIRTUAL: &str = ":virtual";

/// Check whether a node is an open marker.
pub fn is_virtual_open(doc: &Document, node: NodeId) -> bool {
    doc.comment_data(node)
        .is_some_and(|data| data.starts_with(VIRTUAL_OPEN_PREFIX))
}

/// Check whether a node is a close marker.
pub fn is_virtual_close(doc: &Document, node: NodeId) -> bool {
    doc.comment_data(node) == Some(VIRTUAL_CLOSE)
}

/// Find the close marker paired with `open`.
///
/// Scans the siblings that follow `open`, counting nested open markers up
/// and close markers down; the pair closes where the count returns to zero.
/// A marker pair always shares a parent, so nodes inside intervening
/// elements are not inspected.
///
/// # Errors
///
/// Returns `UnbalancedMarkers` if the siblings run out first.
pub fn find_close(doc: &Document, open: NodeId) -> Result<NodeId, VirtualError> {
    let mut depth = 1usize;
    let mut current = doc.next_sibling(open);
    while let Some(node) = current {
        if is_virtual_open(doc, node) {
            depth += 1;
        } else if is_virtual_close(doc, node) {
            depth -= 1;
            if depth == 0 {
                tracing::trace!(?open, close = ?node, "matched virtual markers");
                return Ok(node);
            }
        }
        current = doc.next_sibling(node);
    }
    Err(VirtualError::UnbalancedMarkers { open })
}

/// Get the virtual element anchored at `open`, reconstructing it from the
/// tree on first use.
///
/// Returns `Ok(None)` if `open` is not an open marker. Repeated calls for
/// the same marker return the same element.
pub fn get_virtual_element(
    doc: &mut Document,
    open: NodeId,
) -> Result<Option<VirtualElement>, VirtualError> {
    if let Some(data) = doc.virtuals.get(&open) {
        return Ok(Some(VirtualElement {
            open,
            close: data.close,
        }));
    }
    if !is_virtual_open(doc, open) {
        return Ok(None);
    }
    let close = find_close(doc, open)?;
    tracing::debug!(?open, ?close, "reconstructing virtual element from markers");
    VirtualElement::new(doc, open, close).map(Some)
}

/// Map a node to a virtual element when it is an open marker, or to itself
/// otherwise.
pub fn process_virtual_nodes(
    doc: &mut Document,
    node: Option<NodeId>,
) -> Result<Option<ElementRef>, VirtualError> {
    let Some(node) = node else {
        return Ok(None);
    };
    if doc.is_comment(node) {
        if let Some(virtual_element) = get_virtual_element(doc, node)? {
            return Ok(Some(ElementRef::Virtual(virtual_element)));
        }
    }
    Ok(Some(ElementRef::Node(node)))
}

/// Physical node that anchors an element reference.
pub fn get_root_node(element: ElementRef) -> NodeId {
    match element {
        ElementRef::Node(node) => node,
        ElementRef::Virtual(v) => v.open(),
    }
}

/// Every virtual element under `root` whose `key` attribute equals
/// `value`, in document order. Open markers are paired as they are found.
fn walk_virtual_by_attribute(
    doc: &mut Document,
    root: NodeId,
    key: &str,
    value: &str,
    first_only: bool,
) -> Result<Vec<VirtualElement>, VirtualError> {
    let mut found = Vec::new();
    let comments: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .filter(|&n| doc.is_comment(n))
        .collect();
    for node in comments {
        if let Some(v) = get_virtual_element(doc, node)? {
            if v.get_attribute(doc, key) == Some(value) {
                found.push(v);
                if first_only {
                    break;
                }
            }
        }
    }
    Ok(found)
}

/// First virtual element under `root` with `key` equal to `value`.
pub fn query_virtual_by_attribute(
    doc: &mut Document,
    root: NodeId,
    key: &str,
    value: &str,
) -> Result<Option<VirtualElement>, VirtualError> {
    Ok(walk_virtual_by_attribute(doc, root, key, value, true)?
        .into_iter()
        .next())
}

/// Every virtual element under `root` with `key` equal to `value`.
pub fn query_all_virtual_by_attribute(
    doc: &mut Document,
    root: NodeId,
    key: &str,
    value: &str,
) -> Result<Vec<VirtualElement>, VirtualError> {
    walk_virtual_by_attribute(doc, root, key, value, false)
}
