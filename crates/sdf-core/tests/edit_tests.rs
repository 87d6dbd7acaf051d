use sdf_core::{find, parse, Node, Number, Value};

fn doc(source: &str) -> Value {
    parse(source).unwrap()
}

fn number(integer: i64) -> Value {
    Value::Number(Number::new(integer, 0))
}

// ============================================================================
// Replace
// ============================================================================

#[test]
fn replace_matching_elements() {
    let d = doc("(node {attr (node) attr2 -2} [(node) -1 (node)])");
    assert_eq!(find(&d, "/+/node").unwrap().len(), 3);

    let d = d.replace("/+/node", &number(0)).unwrap();
    let n = d.as_node().unwrap();
    assert_eq!(n.attribute("attr").unwrap(), &number(0));
    assert_eq!(n.attribute("attr2").unwrap(), &number(-2));
    assert_eq!(n.children[0], number(0));
    assert_eq!(n.children[1], number(-1));
    assert_eq!(n.children[2], number(0));
}

#[test]
fn replace_by_value_condition() {
    let d = doc("(node {attr 0 attr2 -2} [0 -1 0])");
    let d = d.replace("^number[<=0]", &Value::Null).unwrap();
    let n = d.as_node().unwrap();
    assert_eq!(n.attribute("attr").unwrap(), &Value::Null);
    assert_eq!(n.attribute("attr2").unwrap(), &Value::Null);
    assert!(n.children.iter().all(|c| *c == Value::Null));
}

#[test]
fn replace_root_returns_new_value() {
    let d = doc("(node [(a) (b)])");
    let d = d.replace("*", &number(1337)).unwrap();
    assert_eq!(d, number(1337));
}

#[test]
fn replace_only_topmost_matches() {
    let d = doc("(a [(x (x 1)) (x 2)])");
    let d = d.replace("x", &Value::Null).unwrap();
    let n = d.as_node().unwrap();
    // the inner x went away together with its enclosing x
    assert_eq!(n.children, vec![Value::Null, Value::Null]);
}

// ============================================================================
// Remove
// ============================================================================

#[test]
fn remove_children_and_attributes() {
    let d = doc("(n {a (av {ava 2} [(avc 3)])})");
    assert_eq!(find(&d, "[attr_has_child(@a, avc)]").unwrap().len(), 1);

    let d = d.remove("avc@0").unwrap().unwrap();
    assert_eq!(find(&d, "[attr_has_child(@a, avc)]").unwrap().len(), 0);
    assert_eq!(find(&d, "[attr_has_attr(@a, ava)]").unwrap().len(), 1);

    let d = d.remove("[=2]").unwrap().unwrap();
    assert_eq!(find(&d, "[attr_has_attr(@a, ava)]").unwrap().len(), 0);
}

#[test]
fn remove_root_yields_none() {
    let d = doc("(n 1)");
    assert_eq!(d.remove("*").unwrap(), None);
}

#[test]
fn remove_keeps_sibling_order() {
    let d = doc(r#"(n [1 "x" 2 "y" 3 "z"])"#);
    let d = d.remove("^string").unwrap().unwrap();
    let n = d.as_node().unwrap();
    assert_eq!(n.children, vec![number(1), number(2), number(3)]);
}

// ============================================================================
// Insertions
// ============================================================================

#[test]
fn insert_before_and_after_and_at() {
    let d = doc("(node [1 50 2 60 3 70])");
    let mut d = d;
    assert_eq!(d.as_node().unwrap().children.len(), 6);

    d.insert_after("[>=10]", &Value::String("lemons".into())).unwrap();
    assert_eq!(d.as_node().unwrap().children.len(), 9);
    assert_eq!(d.as_node().unwrap().children[2], Value::String("lemons".into()));

    d.insert_before("[<10]", &Value::String("stage".into())).unwrap();
    assert_eq!(d.as_node().unwrap().children.len(), 12);
    assert_eq!(d.as_node().unwrap().children[0], Value::String("stage".into()));

    d.insert_at("/", 4, &Value::String(",".into())).unwrap();
    d.insert_at("/", 9, &Value::String(",".into())).unwrap();
    assert_eq!(d.as_node().unwrap().children.len(), 14);

    let d = d.remove(r#"[~="e"]"#).unwrap().unwrap();
    assert_eq!(d.as_node().unwrap().children.len(), 8);

    let d = d.remove("^string").unwrap().unwrap();
    assert_eq!(d.as_node().unwrap().children.len(), 6);
}

#[test]
fn add_child_and_attribute() {
    let mut n = Value::Node(Node::new("node"));
    assert!(find(&n, "/[has_child(subnode)]").unwrap().is_empty());

    n.add_child("/", &Value::Node(Node::new("subnode"))).unwrap();
    assert_eq!(find(&n, "/[has_child(subnode)]").unwrap().len(), 1);

    assert!(find(&n, "/[has_attr(attr)]").unwrap().is_empty());
    n.add_attribute("/", "attr", &Value::Bool(true)).unwrap();
    assert_eq!(find(&n, "/[has_attr(attr)]").unwrap().len(), 1);
    assert_eq!(find(&n, "[@attr=true]").unwrap().len(), 1);
}

#[test]
fn inserted_values_are_independent_copies() {
    let mut d = doc("(n [(a) (a)])");
    let extra = doc("(e 1)");
    d.add_child("a", &extra).unwrap();

    let mut d = d;
    d.add_child("a/e", &number(9)).unwrap();
    let n = d.as_node().unwrap();
    // both copies changed independently of the original
    assert_eq!(extra.as_node().unwrap().children.len(), 1);
    for child in &n.children {
        let e = child.as_node().unwrap().children[0].as_node().unwrap();
        assert_eq!(e.children.len(), 2);
    }
}

// ============================================================================
// Edit errors
// ============================================================================

#[test]
fn edit_error_messages() {
    let mut d = doc("(node {a 0} [1 2])");

    let err = d.add_attribute("^number", "a", &Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Edit error: Cannot add an attribute to something but a node."
    );

    let err = d.add_attribute("/", "a", &Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Edit error: Cannot add an attribute, because attribute with such name already exists."
    );

    let err = d.add_child("^number", &Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Edit error: Cannot add a child to something but a node."
    );

    let err = d.insert_at("^number", 0, &Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Edit error: Cannot insert a child into something but a node."
    );

    let err = d.insert_after("/", &Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Edit error: Cannot add something next to root element."
    );

    let err = d.insert_before("/", &Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Edit error: Cannot add something next to root element."
    );

    let err = d.insert_at("/", 99, &Value::Null).unwrap_err();
    assert_eq!(err.to_string(), "Edit error: Insert position is out of bounds.");

    let err = d.insert_after("@a", &Value::Null).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Edit error: Cannot insert next to an attribute value."
    );
}
