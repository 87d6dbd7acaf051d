//! JSON export.
//!
//! Nodes become objects with `name`, `attributes` and `children` keys;
//! attribute order is preserved. A number exports as a JSON integer when it
//! has no fractional digits and as a float otherwise.

use serde_json::{json, Map};

use crate::value::Value;

/// Convert a document into its JSON representation.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Node(node) => {
            let mut attributes = Map::new();
            for (name, attr_value) in node.attributes() {
                attributes.insert(name.clone(), to_json(attr_value));
            }
            let children: Vec<serde_json::Value> = node.children.iter().map(to_json).collect();
            json!({
                "name": node.name,
                "attributes": attributes,
                "children": children,
            })
        }
        Value::String(s) => json!(s),
        Value::Number(n) => {
            if n.fraction == 0 {
                json!(n.integer)
            } else {
                json!(n.to_f64())
            }
        }
        Value::Bool(b) => json!(b),
        Value::Null => serde_json::Value::Null,
    }
}
