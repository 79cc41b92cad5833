//! Relative document position of two nodes

use super::{Document, NodeId};

bitflags::bitflags! {
    /// Bit set describing where one node sits relative to another, with the
    /// same bit values as the DOM `compareDocumentPosition` result.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DocumentPosition: u16 {
        /// The nodes are in different trees
        const DISCONNECTED = 0x01;
        /// The other node precedes the reference node
        const PRECEDING = 0x02;
        /// The other node follows the reference node
        const FOLLOWING = 0x04;
        /// The other node is an ancestor of the reference node
        const CONTAINS = 0x08;
        /// The other node is a descendant of the reference node
        const CONTAINED_BY = 0x10;
        /// Ordering between disconnected nodes is arbitrary but stable
        const IMPLEMENTATION_SPECIFIC = 0x20;
    }
}

impl Document {
    /// Inclusive ancestor chain from the top of the tree down to `id`.
    fn path_from_top(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Position of `other` relative to `reference`.
    pub fn compare_document_position(&self, reference: NodeId, other: NodeId) -> DocumentPosition {
        if reference == other {
            return DocumentPosition::empty();
        }

        let a = self.path_from_top(reference);
        let b = self.path_from_top(other);
        if a[0] != b[0] {
            let order = if other < reference {
                DocumentPosition::PRECEDING
            } else {
                DocumentPosition::FOLLOWING
            };
            return DocumentPosition::DISCONNECTED
                | DocumentPosition::IMPLEMENTATION_SPECIFIC
                | order;
        }

        let shared = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
        if shared == a.len() {
            return DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING;
        }
        if shared == b.len() {
            return DocumentPosition::CONTAINS | DocumentPosition::PRECEDING;
        }

        let parent = a[shared - 1];
        let siblings = self.children(parent);
        let ia = siblings.iter().position(|&c| c == a[shared]);
        let ib = siblings.iter().position(|&c| c == b[shared]);
        if ib < ia {
            DocumentPosition::PRECEDING
        } else {
            DocumentPosition::FOLLOWING
        }
    }
}
