/// Property-based tests over randomly generated documents.
///
/// Strategies build arbitrary value trees (up to 4 levels deep) with node
/// names and attribute keys drawn from selector-safe alphabets, then check
/// the invariants that hold for any document:
/// - printing and re-parsing yields the same tree (both parsers)
/// - the `*` selector visits every element exactly once, with no duplicates
/// - every reported match path resolves back to the matched element
/// - `+` matches are a subset of `*` matches for the same name
/// - kind conditions partition the document
use proptest::prelude::*;
use sdf_core::{find, parse, print, Node, Number, StreamingParser, Value, ValueKind};

// ============================================================================
// Strategies
// ============================================================================

/// Node names and attribute keys: plain words without selector markers.
fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,6}").unwrap()
}

fn arb_string_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 .,:-]{0,12}",
        Just("".to_string()),
        Just("say \"hi\"".to_string()),
        Just("line1\nline2".to_string()),
        Just("col1\tcol2".to_string()),
        Just("back\\slash".to_string()),
        // keyword lookalikes must stay strings
        Just("true".to_string()),
        Just("null".to_string()),
        Just("42".to_string()),
    ]
}

fn arb_literal() -> impl Strategy<Value = Value> {
    prop_oneof![
        arb_string_value().prop_map(Value::String),
        (any::<i32>(), 0..10_000i64)
            .prop_map(|(integer, fraction)| Value::Number(Number::new(integer as i64, fraction))),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

fn arb_value(depth: u32) -> BoxedStrategy<Value> {
    if depth == 0 {
        return arb_literal().boxed();
    }
    prop_oneof![
        3 => arb_literal(),
        2 => (
            arb_name(),
            prop::collection::btree_map(arb_name(), arb_value(depth - 1), 0..4),
            prop::collection::vec(arb_value(depth - 1), 0..5),
        )
            .prop_map(|(name, attributes, children)| {
                let mut node = Node::new(name);
                for (key, value) in attributes {
                    node.insert_attribute(key, value);
                }
                node.children = children;
                Value::Node(node)
            }),
    ]
    .boxed()
}

fn arb_document() -> impl Strategy<Value = Value> {
    arb_value(4)
}

/// Total number of elements (the root, every child, every attribute value).
fn element_count(value: &Value) -> usize {
    match value {
        Value::Node(n) => {
            1 + n.children.iter().map(element_count).sum::<usize>()
                + n
                    .attributes()
                    .iter()
                    .map(|(_, v)| element_count(v))
                    .sum::<usize>()
        }
        _ => 1,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Printing and re-parsing any tree gives the tree back.
    #[test]
    fn print_parse_roundtrip(document in arb_document()) {
        let text = print(&document);
        let reparsed = parse(&text).unwrap();
        prop_assert_eq!(&reparsed, &document, "printed form: {:?}", text);
    }

    /// The streaming parser agrees with the tree parser on printed documents.
    #[test]
    fn streaming_agrees_with_tree_parser(document in arb_document()) {
        let text = print(&document);
        let streamed = StreamingParser::parse(&text).unwrap();
        prop_assert_eq!(&streamed, &document, "printed form: {:?}", text);
    }

    /// `*` visits every element of the document exactly once, root first.
    #[test]
    fn star_selector_visits_everything_once(document in arb_document()) {
        let matches = find(&document, "*").unwrap();
        prop_assert_eq!(matches.len(), element_count(&document));
        prop_assert_eq!(matches.get(0).unwrap().value(), &document);

        let mut paths = matches.paths();
        let total = paths.len();
        paths.sort_unstable();
        paths.dedup();
        prop_assert_eq!(paths.len(), total, "duplicate paths reported");
    }

    /// Every reported path leads back to the element it was reported for.
    #[test]
    fn match_paths_resolve_to_their_elements(document in arb_document()) {
        let matches = find(&document, "*").unwrap();
        for m in matches.iter() {
            let resolved = find(&document, m.path()).unwrap();
            let hit = resolved.iter().find(|r| r.path() == m.path());
            prop_assert!(hit.is_some(), "path {:?} did not resolve to itself", m.path());
            prop_assert_eq!(hit.unwrap().value(), m.value());
        }
    }

    /// `/+/name` never matches anything `/*/name` does not.
    #[test]
    fn plus_matches_are_a_subset_of_star_matches(
        document in arb_document(),
        name in arb_name(),
    ) {
        let plus = find(&document, &format!("/+/{name}")).unwrap();
        let star = find(&document, &format!("/*/{name}")).unwrap();
        let star_paths = star.paths();
        for path in plus.paths() {
            prop_assert!(star_paths.contains(&path), "path {:?} only in + results", path);
        }
        // they may differ in the root only
        prop_assert!(plus.len() <= star.len() && star.len() - plus.len() <= 1);
    }

    /// The five kind conditions partition the document.
    #[test]
    fn kind_conditions_partition_the_document(document in arb_document()) {
        let kinds = ["node", "string", "number", "bool", "null"];
        let mut total = 0;
        for kind in kinds {
            total += find(&document, &format!("^{kind}")).unwrap().len();
        }
        prop_assert_eq!(total, element_count(&document));
    }

    /// Kind condition hits actually have that kind.
    #[test]
    fn kind_conditions_filter_by_kind(document in arb_document()) {
        for (kind, name) in [
            (ValueKind::Node, "node"),
            (ValueKind::String, "string"),
            (ValueKind::Number, "number"),
            (ValueKind::Bool, "bool"),
            (ValueKind::Null, "null"),
        ] {
            let matches = find(&document, &format!("^{name}")).unwrap();
            for m in matches.iter() {
                prop_assert_eq!(m.value().kind(), kind);
            }
        }
    }

    /// JSON export never panics and maps literals kind-for-kind.
    #[test]
    fn json_export_is_total(document in arb_document()) {
        let json = sdf_core::to_json(&document);
        match &document {
            Value::Node(_) => prop_assert!(json.is_object()),
            Value::String(_) => prop_assert!(json.is_string()),
            Value::Number(_) => prop_assert!(json.is_number()),
            Value::Bool(_) => prop_assert!(json.is_boolean()),
            Value::Null => prop_assert!(json.is_null()),
        }
    }
}
