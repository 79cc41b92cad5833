//! Virtual grouping node tests

use pretty_assertions::assert_eq;
use resumable::*;

/// `<body><div/></body>` attached to the document root.
fn page() -> (Document, NodeId) {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    let div = doc.create_element("div");
    let root = doc.root();
    doc.append_child(root, body).unwrap();
    doc.append_child(body, div).unwrap();
    (doc, div)
}

/// Insert `<!--qv payload-->` … `<!--/qv-->` around fresh children of `parent`.
fn markers(doc: &mut Document, parent: NodeId, payload: &str, children: &[&str]) -> (NodeId, NodeId) {
    let open = doc.create_comment(format!("qv {}", payload));
    doc.append_child(parent, open).unwrap();
    for tag in children {
        let el = doc.create_element(*tag);
        doc.append_child(parent, el).unwrap();
    }
    let close = doc.create_comment("/qv");
    doc.append_child(parent, close).unwrap();
    (open, close)
}

fn tags(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&n| doc.tag_name(n).unwrap_or("#").to_string())
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Attributes
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_attributes_parsed_from_payload() {
    let (mut doc, div) = page();
    let (open, close) = markers(&mut doc, div, "x=a+b flag", &[]);
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    assert_eq!(v.get_attribute(&doc, "x"), Some("a b"));
    assert_eq!(v.get_attribute(&doc, "flag"), Some(""));
    assert!(v.has_attribute(&doc, "flag"));
    assert_eq!(v.get_attribute(&doc, "missing"), None);
}

#[test]
fn test_set_attribute_rewrites_payload() {
    let (mut doc, div) = page();
    let (open, close) = markers(&mut doc, div, "x=a+b", &[]);
    let v = VirtualElement::new(&mut doc, open, close).unwrap();
    assert_eq!(v.get_attribute(&doc, "x"), Some("a b"));

    v.set_attribute(&mut doc, "x", "c d").unwrap();
    assert_eq!(doc.comment_data(open), Some("qv x=c+d"));
    assert_eq!(v.get_attribute(&doc, "x"), Some("c d"));
}

#[test]
fn test_remove_attribute_rewrites_payload() {
    let (mut doc, div) = page();
    let (open, close) = markers(&mut doc, div, "a=1 b=2", &[]);
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    v.remove_attribute(&mut doc, "a").unwrap();
    assert_eq!(doc.comment_data(open), Some("qv b=2"));
    let attrs: Vec<(&str, &str)> = v.attributes(&doc).collect();
    assert_eq!(attrs, vec![("b", "2")]);
}

#[test]
fn test_attribute_change_on_foreign_document_is_rejected() {
    let mut doc_a = Document::new();
    let v = VirtualElement::create(&mut doc_a);

    let mut doc_b = Document::new();
    let keep = doc_b.create_comment("qv keep=1");
    assert_eq!(keep, v.open());

    assert_eq!(
        v.set_attribute(&mut doc_b, "x", "y"),
        Err(VirtualError::NotAVirtualMarker { node: keep })
    );
    assert_eq!(
        v.remove_attribute(&mut doc_b, "keep"),
        Err(VirtualError::NotAVirtualMarker { node: keep })
    );
    assert_eq!(doc_b.comment_data(keep), Some("qv keep=1"));
}

#[test]
fn test_new_rejects_non_marker() {
    let (mut doc, div) = page();
    let plain = doc.create_comment("hello");
    doc.append_child(div, plain).unwrap();
    let close = doc.create_comment("/qv");

    let err = VirtualElement::new(&mut doc, plain, close).unwrap_err();
    assert_eq!(err, VirtualError::NotAVirtualMarker { node: plain });
}

// ═══════════════════════════════════════════════════════════════════════
// Children
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_child_nodes_between_markers() {
    let (mut doc, div) = page();
    let (open, close) = markers(&mut doc, div, "", &["a", "b"]);
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    assert!(v.is_attached(&doc));
    assert!(v.is_connected(&doc));
    assert_eq!(tags(&doc, &v.child_nodes(&doc)), vec!["a", "b"]);
    assert_eq!(v.parent_element(&doc), Some(div));
}

#[test]
fn test_insert_while_attached_lands_before_close() {
    let (mut doc, div) = page();
    let (open, close) = markers(&mut doc, div, "", &["a"]);
    let tail = doc.create_element("tail");
    doc.append_child(div, tail).unwrap();
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    let b = doc.create_element("b");
    v.append_child(&mut doc, b).unwrap();
    assert_eq!(
        doc.render(div),
        "<div><!--qv --><a></a><b></b><!--/qv--><tail></tail></div>"
    );

    let first = v.first_child(&doc).unwrap();
    let c = doc.create_element("c");
    v.insert_before(&mut doc, c, Some(first)).unwrap();
    assert_eq!(tags(&doc, &v.child_nodes(&doc)), vec!["c", "a", "b"]);
}

#[test]
fn test_detached_children_live_in_store() {
    let mut doc = Document::new();
    let v = VirtualElement::create(&mut doc);
    assert!(!v.is_attached(&doc));
    assert!(v.first_child(&doc).is_none());

    let a = doc.create_element("a");
    let b = doc.create_element("b");
    v.append_child(&mut doc, a).unwrap();
    v.append_child(&mut doc, b).unwrap();
    assert_eq!(v.child_nodes(&doc), vec![a, b]);
    assert_eq!(v.first_child(&doc), Some(a));

    v.remove_child(&mut doc, a).unwrap();
    assert_eq!(v.child_nodes(&doc), vec![b]);
    assert_eq!(doc.parent(a), None);
}

#[test]
fn test_siblings_are_outside_markers() {
    let (mut doc, div) = page();
    let before = doc.create_element("before");
    doc.append_child(div, before).unwrap();
    let (open, close) = markers(&mut doc, div, "", &["inner"]);
    let after = doc.create_element("after");
    doc.append_child(div, after).unwrap();
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    assert_eq!(v.previous_sibling(&doc), Some(before));
    assert_eq!(v.next_sibling(&doc), Some(after));
}

// ═══════════════════════════════════════════════════════════════════════
// Attach / Detach
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_append_to_then_remove_round_trip() {
    let (mut doc, div) = page();
    let v = VirtualElement::create(&mut doc);
    v.set_attribute(&mut doc, "q:key", "k").unwrap();
    for tag in ["a", "b", "c"] {
        let el = doc.create_element(tag);
        v.append_child(&mut doc, el).unwrap();
    }
    let before = v.child_nodes(&doc);

    v.append_to(&mut doc, div.into()).unwrap();
    assert!(v.is_attached(&doc));
    assert_eq!(
        doc.render(div),
        "<div><!--qv q:key=k--><a></a><b></b><c></c><!--/qv--></div>"
    );
    assert_eq!(v.child_nodes(&doc), before);

    v.remove(&mut doc).unwrap();
    assert!(!v.is_attached(&doc));
    assert_eq!(doc.render(div), "<div></div>");
    assert_eq!(v.child_nodes(&doc), before);
}

#[test]
fn test_insert_before_to_respects_reference() {
    let (mut doc, div) = page();
    let x = doc.create_element("x");
    doc.append_child(div, x).unwrap();
    let v = VirtualElement::create(&mut doc);
    let a = doc.create_element("a");
    v.append_child(&mut doc, a).unwrap();

    v.insert_before_to(&mut doc, div.into(), Some(x)).unwrap();
    assert_eq!(doc.render(div), "<div><!--qv --><a></a><!--/qv--><x></x></div>");
}

#[test]
fn test_remove_while_detached_is_noop() {
    let mut doc = Document::new();
    let v = VirtualElement::create(&mut doc);
    let a = doc.create_element("a");
    v.append_child(&mut doc, a).unwrap();
    v.remove(&mut doc).unwrap();
    assert_eq!(v.child_nodes(&doc), vec![a]);
}

#[test]
fn test_reattach_moves_group() {
    let (mut doc, div) = page();
    let other = doc.create_element("section");
    let body = doc.parent(div).unwrap();
    doc.append_child(body, other).unwrap();

    let v = VirtualElement::create(&mut doc);
    let a = doc.create_element("a");
    v.append_child(&mut doc, a).unwrap();
    v.append_to(&mut doc, div.into()).unwrap();
    v.append_to(&mut doc, other.into()).unwrap();

    assert_eq!(doc.render(div), "<div></div>");
    assert_eq!(doc.render(other), "<section><!--qv --><a></a><!--/qv--></section>");
}

#[test]
fn test_nested_group_inside_detached_group() {
    let (mut doc, div) = page();
    let outer = VirtualElement::create(&mut doc);
    let inner = VirtualElement::create(&mut doc);
    let span = doc.create_element("span");
    inner.append_child(&mut doc, span).unwrap();

    inner.append_to(&mut doc, outer.into()).unwrap();
    assert!(inner.is_attached(&doc));
    assert_eq!(inner.parent_element(&doc), None);

    outer.append_to(&mut doc, div.into()).unwrap();
    assert_eq!(
        doc.render(div),
        "<div><!--qv --><!--qv --><span></span><!--/qv--><!--/qv--></div>"
    );
    assert_eq!(inner.parent_element(&doc), Some(div));
}

#[test]
#[should_panic(expected = "detached store")]
fn test_remove_with_dirty_store_panics_in_dev_mode() {
    let mut doc = Document::with_config(ResumeConfig::development());
    let root = doc.root();
    let div = doc.create_element("div");
    doc.append_child(root, div).unwrap();
    let v = VirtualElement::create(&mut doc);
    let a = doc.create_element("a");
    v.append_child(&mut doc, a).unwrap();

    // Markers placed by hand leave the store populated.
    doc.append_child(div, v.open()).unwrap();
    doc.append_child(div, v.close()).unwrap();
    v.remove(&mut doc).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════
// Queries
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_query_selector_inside_group() {
    let (mut doc, div) = page();
    let outside = doc.create_element("p");
    doc.append_child(div, outside).unwrap();
    let (open, close) = markers(&mut doc, div, "", &["p", "span"]);
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    let p: Selector = "p".parse().unwrap();
    let found = v.query_selector(&doc, &p).unwrap();
    assert_ne!(found, outside);
    assert_eq!(v.query_selector_all(&doc, &p), vec![found]);
}

#[test]
fn test_matches_never_and_closest_delegates() {
    let (mut doc, div) = page();
    let (open, close) = markers(&mut doc, div, "", &[]);
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    let any_div: Selector = "div".parse().unwrap();
    assert!(!v.matches(&any_div));
    assert_eq!(v.closest(&doc, &any_div), Some(div));
    assert_eq!(v.local_name(), ":virtual");
}

#[test]
fn test_compare_position_uses_open_marker() {
    let (mut doc, div) = page();
    let (open, close) = markers(&mut doc, div, "", &[]);
    let v = VirtualElement::new(&mut doc, open, close).unwrap();

    let pos = v.compare_document_position(&doc, close);
    assert!(pos.contains(DocumentPosition::FOLLOWING));
}

// ═══════════════════════════════════════════════════════════════════════
// Element References
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_element_ref_is_agnostic() {
    let (mut doc, div) = page();
    let v = VirtualElement::create(&mut doc);
    let targets = [ElementRef::Node(div), ElementRef::Virtual(v)];

    for target in targets {
        let child = doc.create_element("li");
        target.append_child(&mut doc, child).unwrap();
        target.set_attribute(&mut doc, "role", "list").unwrap();
        assert_eq!(target.get_attribute(&doc, "role"), Some("list"));
    }
    assert_eq!(ElementRef::Virtual(v).local_name(&doc), ":virtual");
    assert_eq!(ElementRef::Node(div).local_name(&doc), "div");
    assert_eq!(get_root_node(v.into()), v.open());
}
