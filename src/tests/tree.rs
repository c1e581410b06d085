use crate::nodes::{AstNode, NodeValue};
use crate::{parse_document, Arena, Options};

const KITCHEN_SINK: &str = "---\nt: 1\n---\n\n# H *em*\n\n> quote\n\n- [x] task\n- plain\n\n\
| a | b |\n| --- | --- |\n| 1 | 2 |\n\n```rs\ncode\n```\n\n$$\nm\n$$\n\n\
para ~~s~~ ==m== `c` $i$ :heart: [l](http://x) ![i](/p) text[^f]\n\n[^f]: note\n";

fn parse_sink<'a>(arena: &'a Arena<'a>) -> &'a AstNode<'a> {
    parse_document(arena, KITCHEN_SINK, &Options::editor())
}

#[test]
fn sibling_links_are_consistent() {
    let arena = Arena::new();
    let root = parse_sink(&arena);

    for node in root.descendants() {
        let mut count = 0;
        let mut prev: Option<&AstNode> = None;
        for child in node.children() {
            assert!(child.parent().unwrap().same_node(node));
            match prev {
                None => assert!(child.previous_sibling().is_none()),
                Some(p) => {
                    assert!(child.previous_sibling().unwrap().same_node(p));
                    assert!(p.next_sibling().unwrap().same_node(child));
                }
            }
            prev = Some(child);
            count += 1;
        }
        match prev {
            None => assert!(node.first_child().is_none() && node.last_child().is_none()),
            Some(p) => {
                assert!(node.last_child().unwrap().same_node(p));
                assert!(p.next_sibling().is_none());
            }
        }
        if count > 0 {
            assert!(node.first_child().is_some());
        }
    }
}

#[test]
fn leaves_have_children_xor_content() {
    let arena = Arena::new();
    let root = parse_sink(&arena);

    for node in root.descendants() {
        let ast = node.data.borrow();
        if ast.value.contains_inlines() {
            assert!(
                ast.content.is_empty(),
                "leaf still carries unparsed content: {:?}",
                ast.value
            );
        }
    }
}

#[test]
fn emphasis_family_is_marker_framed() {
    let arena = Arena::new();
    let root = parse_sink(&arena);

    let mut seen = 0;
    for node in root.descendants() {
        let framed = matches!(
            node.data.borrow().value,
            NodeValue::Emph | NodeValue::Strong | NodeValue::Strikethrough | NodeValue::Highlight
        );
        if !framed {
            continue;
        }
        seen += 1;

        let first = node.first_child().expect("framed node without children");
        let last = node.last_child().unwrap();
        assert!(!first.same_node(last), "marker pair missing content frame");
        assert!(matches!(first.data.borrow().value, NodeValue::Marker(..)));
        assert!(matches!(last.data.borrow().value, NodeValue::Marker(..)));
    }
    assert!(seen >= 3);
}

#[test]
fn block_ids_are_unique_and_dense() {
    let arena = Arena::new();
    let root = parse_sink(&arena);

    let mut ids = vec![];
    for node in root.descendants() {
        let ast = node.data.borrow();
        if ast.value.block() && !matches!(ast.value, NodeValue::Document) {
            ids.push(ast.node_id);
        }
    }
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
    assert_eq!(*sorted.first().unwrap(), 1);
    assert_eq!(*sorted.last().unwrap() as usize, ids.len());
}

#[test]
fn reference_map_records_first_definition() {
    let arena = Arena::new();
    let options = Options::default();
    let (_, refmap) = crate::parse_document_with_refmap(
        &arena,
        "[b]: http://first\n\n[b]: http://second \"t\"\n",
        &options,
    );
    let reference = refmap.map.get("b").unwrap();
    assert_eq!(reference.url, "http://first");
    assert_eq!(reference.title, "");
}
