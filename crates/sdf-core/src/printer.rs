//! Pretty-printer: [`Value`] → SDF text.
//!
//! Output is tab-indented. Literals hang on the same line as their parent
//! when they are an only child or an attribute value; nodes always get their
//! own line. Strings are re-escaped so that printing and re-parsing gives
//! back the same tree.

use crate::value::{Node, Value};

/// Render a value as pretty-printed SDF text (no trailing newline).
pub fn print(value: &Value) -> String {
    let mut out = String::new();
    print_value(&mut out, value, 0, false);
    out
}

fn print_value(out: &mut String, value: &Value, offset: usize, newline: bool) {
    match value {
        Value::Node(n) => print_node(out, n, offset),
        literal => print_literal(out, literal, offset),
    }
    if newline {
        out.push('\n');
    }
}

fn print_offset(out: &mut String, offset: usize) {
    for _ in 0..offset {
        out.push('\t');
    }
}

fn print_literal(out: &mut String, literal: &Value, offset: usize) {
    print_offset(out, offset);
    match literal {
        Value::String(s) => {
            out.push('"');
            out.push_str(&escape_string(s));
            out.push('"');
        }
        Value::Number(n) => {
            out.push_str(&n.integer.to_string());
            if n.fraction > 0 {
                let width = n.fraction_digits() as usize;
                out.push_str(&format!(".{:0>width$}", n.fraction));
            }
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => out.push_str("null"),
        Value::Node(_) => unreachable!("print_literal is only called for literals"),
    }
}

/// Print a value that may share a line with what came before it. Nodes break
/// onto their own line; literals stay inline after a single space. Returns
/// whether the value was a literal.
fn print_inline_if_literal(out: &mut String, value: &Value, offset: usize, newline: bool) -> bool {
    if value.is_node() {
        out.push('\n');
        print_value(out, value, offset, true);
        return false;
    }

    out.push(' ');
    print_value(out, value, 0, newline);
    true
}

fn print_node(out: &mut String, node: &Node, offset: usize) {
    print_offset(out, offset);
    out.push('(');
    out.push_str(&node.name);

    if !node.attributes().is_empty() {
        out.push('\n');
        print_offset(out, offset + 1);
        out.push_str("{\n");

        for (key, value) in node.attributes() {
            print_offset(out, offset + 2);
            out.push_str(key);
            print_inline_if_literal(out, value, offset + 3, true);
        }

        print_offset(out, offset + 1);
        out.push('}');
    }

    if node.children.len() == 1 {
        let is_literal = print_inline_if_literal(out, &node.children[0], offset + 1, false);
        if !is_literal {
            // closing ) goes back to this node's own indent
            print_offset(out, offset);
        }
    }

    if node.children.len() > 1 {
        out.push('\n');
        print_offset(out, offset + 1);
        out.push_str("[\n");

        for child in &node.children {
            print_value(out, child, offset + 2, true);
        }

        print_offset(out, offset + 1);
        out.push(']');
    }

    out.push(')');
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0B}' => out.push_str("\\v"),
            '\u{0C}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out
}
