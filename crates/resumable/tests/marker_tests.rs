//! Marker discovery and attribute query tests

use pretty_assertions::assert_eq;
use resumable::*;

fn comment(doc: &mut Document, parent: NodeId, data: &str) -> NodeId {
    let node = doc.create_comment(data);
    doc.append_child(parent, node).unwrap();
    node
}

fn element(doc: &mut Document, parent: NodeId, tag: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.append_child(parent, node).unwrap();
    node
}

// ═══════════════════════════════════════════════════════════════════════
// Marker Pairing
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_outer_open_skips_nested_pair() {
    let mut doc = Document::new();
    let root = doc.root();
    let div = element(&mut doc, root, "div");
    let outer_open = comment(&mut doc, div, "qv a=1");
    element(&mut doc, div, "x");
    let inner_open = comment(&mut doc, div, "qv b=2");
    element(&mut doc, div, "y");
    let inner_close = comment(&mut doc, div, "/qv");
    element(&mut doc, div, "z");
    let outer_close = comment(&mut doc, div, "/qv");

    assert_eq!(find_close(&doc, outer_open), Ok(outer_close));
    assert_eq!(find_close(&doc, inner_open), Ok(inner_close));
}

#[test]
fn test_missing_close_is_unbalanced() {
    let mut doc = Document::new();
    let root = doc.root();
    let div = element(&mut doc, root, "div");
    let open = comment(&mut doc, div, "qv ");
    comment(&mut doc, div, "qv ");
    comment(&mut doc, div, "/qv");

    assert_eq!(
        find_close(&doc, open),
        Err(VirtualError::UnbalancedMarkers { open })
    );
    assert_eq!(
        get_virtual_element(&mut doc, open),
        Err(VirtualError::UnbalancedMarkers { open })
    );
}

#[test]
fn test_close_inside_child_element_is_ignored() {
    let mut doc = Document::new();
    let root = doc.root();
    let div = element(&mut doc, root, "div");
    let open = comment(&mut doc, div, "qv ");
    let span = element(&mut doc, div, "span");
    comment(&mut doc, span, "/qv");
    let close = comment(&mut doc, div, "/qv");

    assert_eq!(find_close(&doc, open), Ok(close));
}

#[test]
fn test_marker_predicates() {
    let mut doc = Document::new();
    let open = doc.create_comment("qv q:key=1");
    let bare = doc.create_comment("qv");
    let close = doc.create_comment("/qv");
    let el = doc.create_element("qv");

    assert!(is_virtual_open(&doc, open));
    assert!(!is_virtual_open(&doc, bare));
    assert!(is_virtual_close(&doc, close));
    assert!(!is_virtual_close(&doc, open));
    assert!(!is_virtual_open(&doc, el));
}

// ═══════════════════════════════════════════════════════════════════════
// Identity Cache
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_reconstruction_is_idempotent() {
    let mut doc = Document::new();
    let root = doc.root();
    let div = element(&mut doc, root, "div");
    let open = comment(&mut doc, div, "qv k=v");
    comment(&mut doc, div, "/qv");

    let first = get_virtual_element(&mut doc, open).unwrap().unwrap();
    first.set_attribute(&mut doc, "k", "changed").unwrap();
    let second = get_virtual_element(&mut doc, open).unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(second.get_attribute(&doc, "k"), Some("changed"));
}

#[test]
fn test_non_marker_is_not_virtual() {
    let mut doc = Document::new();
    let root = doc.root();
    let note = comment(&mut doc, root, "just a note");
    assert_eq!(get_virtual_element(&mut doc, note), Ok(None));
}

#[test]
fn test_process_virtual_nodes() {
    let mut doc = Document::new();
    let root = doc.root();
    let div = element(&mut doc, root, "div");
    let open = comment(&mut doc, div, "qv ");
    let close = comment(&mut doc, div, "/qv");
    let note = comment(&mut doc, div, "note");

    assert_eq!(process_virtual_nodes(&mut doc, None), Ok(None));
    assert_eq!(
        process_virtual_nodes(&mut doc, Some(div)),
        Ok(Some(ElementRef::Node(div)))
    );
    assert_eq!(
        process_virtual_nodes(&mut doc, Some(note)),
        Ok(Some(ElementRef::Node(note)))
    );

    let processed = process_virtual_nodes(&mut doc, Some(open)).unwrap().unwrap();
    let v = processed.as_virtual().unwrap();
    assert_eq!(v.close(), close);
    assert_eq!(get_root_node(processed), open);
}

// ═══════════════════════════════════════════════════════════════════════
// Attribute Queries
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_query_by_attribute_in_document_order() {
    let mut doc = Document::new();
    let root = doc.root();
    let body = element(&mut doc, root, "body");
    let first = comment(&mut doc, body, "qv q:s=a");
    comment(&mut doc, body, "/qv");
    let section = element(&mut doc, body, "section");
    comment(&mut doc, section, "qv q:s=b");
    comment(&mut doc, section, "/qv");
    let third = comment(&mut doc, section, "qv q:s=a");
    comment(&mut doc, section, "/qv");

    let found = query_virtual_by_attribute(&mut doc, body, "q:s", "a").unwrap();
    assert_eq!(found.map(|v| v.open()), Some(first));

    let all: Vec<NodeId> = query_all_virtual_by_attribute(&mut doc, body, "q:s", "a")
        .unwrap()
        .into_iter()
        .map(|v| v.open())
        .collect();
    assert_eq!(all, vec![first, third]);

    assert_eq!(
        query_virtual_by_attribute(&mut doc, body, "q:s", "missing"),
        Ok(None)
    );
}

#[test]
fn test_query_by_attribute_skips_plain_comments() {
    let mut doc = Document::new();
    let root = doc.root();
    let body = element(&mut doc, root, "body");
    comment(&mut doc, body, "q:s=a");
    let open = comment(&mut doc, body, "qv q:s=a+b");
    comment(&mut doc, body, "/qv");

    let all = query_all_virtual_by_attribute(&mut doc, body, "q:s", "a b").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].open(), open);
}
