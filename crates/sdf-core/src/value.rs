//! The SDF value tree.
//!
//! A document is a single [`Value`]: either a named [`Node`] carrying
//! attributes and children, or one of four literal kinds. Ownership is
//! strictly hierarchical (a node owns its attribute values and children), so
//! a `Value` is always a finite tree.

use std::fmt;

/// One SDF element. The variant set is closed: everything in this crate
/// dispatches on it with exhaustive `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Named node with attributes and ordered children.
    Node(Node),
    /// String literal.
    String(String),
    /// Decimal number literal, kept as two integers.
    Number(Number),
    /// Boolean literal.
    Bool(bool),
    /// Null literal.
    Null,
}

/// Runtime kind tag of a [`Value`], as used by `^kind` selector conditions
/// and by schema builtin types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Node,
    String,
    Number,
    Bool,
    Null,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Node => "node",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Bool => "bool",
            ValueKind::Null => "null",
        };
        f.write_str(name)
    }
}

impl Value {
    /// The runtime kind of this element.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Node(_) => ValueKind::Node,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Null => ValueKind::Null,
        }
    }

    /// Borrow the inner node, if this is a node.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Mutably borrow the inner node, if this is a node.
    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Value::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }
}

/// A named SDF node.
///
/// Attribute keys are unique within a node; insertion order is preserved but
/// carries no meaning. Children are an ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    attributes: Vec<(String, Value)>,
    pub children: Vec<Value>,
}

impl Node {
    /// Create an empty node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by key.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.attributes
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// All attributes in insertion order.
    pub fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    /// Insert a new attribute. Returns `false` (and leaves the node
    /// untouched) if the key already exists.
    pub fn insert_attribute(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if self.attribute(&name).is_some() {
            return false;
        }
        self.attributes.push((name, value));
        true
    }

    /// Replace an attribute value in place by position.
    pub(crate) fn set_attribute_at(&mut self, index: usize, value: Value) {
        self.attributes[index].1 = value;
    }

    pub(crate) fn remove_attribute_at(&mut self, index: usize) {
        self.attributes.remove(index);
    }

    pub(crate) fn attribute_value_mut_at(&mut self, index: usize) -> &mut Value {
        &mut self.attributes[index].1
    }
}

/// A decimal number kept as integer and fraction digits rather than a float,
/// preserving exactly what the source text said. `3.7` is
/// `Number { integer: 3, fraction: 7 }` with one fraction digit; the width is
/// stored alongside so `3.07` keeps its leading zero. The sign lives on the
/// integer part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Number {
    pub integer: i64,
    pub fraction: i64,
    fraction_digits: u32,
}

impl Number {
    /// Number whose fraction carries no leading zeros (`Number::new(3, 7)`
    /// is `3.7`, `Number::new(3, 70)` is `3.70`).
    pub fn new(integer: i64, fraction: i64) -> Self {
        Number {
            integer,
            fraction,
            fraction_digits: decimal_width(fraction),
        }
    }

    /// Number with an explicit fraction width, for fractions written with
    /// leading zeros (`3.07` is `with_fraction_digits(3, 7, 2)`).
    pub fn with_fraction_digits(integer: i64, fraction: i64, fraction_digits: u32) -> Self {
        Number {
            integer,
            fraction,
            fraction_digits,
        }
    }

    /// How many digits the fraction was written with.
    pub fn fraction_digits(&self) -> u32 {
        self.fraction_digits
    }

    /// Derived floating value, used only for ordering comparisons.
    pub fn to_f64(&self) -> f64 {
        if self.fraction == 0 {
            return self.integer as f64;
        }
        let width = self.fraction_digits as usize;
        format!("{}.{:0>width$}", self.integer, self.fraction.unsigned_abs())
            .parse()
            .unwrap_or(self.integer as f64)
    }

    /// Exact equality on the stored digits, with trailing zeros of the
    /// fraction stripped so that `.5` and `.50` compare equal while `.5` and
    /// `.05` stay apart. Used as the fallback for inclusive ordering
    /// comparisons and for `=`/`!=`.
    pub fn eq_exact(&self, other: &Number) -> bool {
        self.integer == other.integer && self.normalized() == other.normalized()
    }

    fn normalized(&self) -> (i64, u32) {
        if self.fraction == 0 {
            return (0, 0);
        }
        let mut fraction = self.fraction;
        let mut digits = self.fraction_digits;
        while fraction % 10 == 0 {
            fraction /= 10;
            digits -= 1;
        }
        (fraction, digits)
    }
}

impl From<i64> for Number {
    fn from(integer: i64) -> Self {
        Number::new(integer, 0)
    }
}

fn decimal_width(fraction: i64) -> u32 {
    if fraction == 0 {
        0
    } else {
        fraction.unsigned_abs().ilog10() + 1
    }
}

/// Parse `integer[.fraction]` source digits into a [`Number`], keeping the
/// fraction's written width.
pub(crate) fn parse_decimal(text: &str) -> Option<Number> {
    match text.split_once('.') {
        None => Some(Number::new(text.parse().ok()?, 0)),
        Some((integer, fraction)) => {
            if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let width = fraction.len() as u32;
            Some(Number::with_fraction_digits(
                integer.parse().ok()?,
                fraction.parse().ok()?,
                width,
            ))
        }
    }
}
