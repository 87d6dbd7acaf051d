//! The condition mini-language shared by selectors and schemas.
//!
//! One selector level is a conjunction of conditions, parsed left-to-right by
//! character class:
//!
//! | marker | condition |
//! |---|---|
//! | bare text | node name |
//! | `@name` (nothing buffered before it) | reached through attribute `name` |
//! | `name@n` | n-th same-named sibling (occurrence) |
//! | `#n` | n-th child of the parent (document index) |
//! | `^kind` | runtime kind |
//! | `[expr]` | value condition |
//! | `*` / `+` | hierarchy wildcard, zero-or-more / one-or-more |
//!
//! The `[expr]` sub-grammar is an optional `@attr` target prefix followed by
//! either a predicate call (`has_child(x)`, `has_attr(x)`,
//! `attr_has_child(@a,x)`, `attr_has_attr(@a,x)`) or a comparison operator
//! and a literal. Schemas reuse the same sub-grammar for their attached
//! `condition` strings.

use crate::error::{Result, SdfError};
use crate::value::{Value, ValueKind};

/// One atomic test within a selector level.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    /// Element is a node with this exact name.
    NodeName(String),
    /// Element was reached through this attribute key.
    AttributeName(String),
    /// Arbitrary-depth wildcard; `at_least_one` distinguishes `+` from `*`.
    Hierarchy { at_least_one: bool },
    /// Element is exactly the n-th child in the parent's child list.
    DocumentIndex(usize),
    /// Element is the n-th sibling sharing its own name.
    Occurrence(usize),
    /// Element's runtime kind.
    Kind(ValueKind),
    /// Test on the element's (or one of its attributes') value.
    Value(ValueCondition),
}

impl Condition {
    /// Evaluate this condition against an element, given its surroundings:
    /// the enclosing parent value, the attribute key it was reached through
    /// (if any), and its position in the parent's child list (if a child).
    pub(crate) fn matches(
        &self,
        value: &Value,
        parent: Option<&Value>,
        attribute_name: Option<&str>,
        child_index: Option<usize>,
    ) -> bool {
        match self {
            Condition::NodeName(name) => value.as_node().is_some_and(|n| n.name == *name),
            Condition::AttributeName(name) => attribute_name == Some(name.as_str()),
            // handled structurally by the matcher
            Condition::Hierarchy { .. } => true,
            Condition::DocumentIndex(index) => {
                if attribute_name.is_some() {
                    return false;
                }
                match parent {
                    None => *index == 0,
                    Some(_) => child_index == Some(*index),
                }
            }
            Condition::Occurrence(number) => {
                if attribute_name.is_some() {
                    return false;
                }
                let parent = match parent {
                    None => return *number == 0,
                    Some(p) => p,
                };
                let (name, index) = match (value.as_node(), child_index) {
                    (Some(n), Some(i)) => (&n.name, i),
                    _ => return false,
                };
                let Some(parent) = parent.as_node() else {
                    return false;
                };
                let occurrence = parent.children[..index]
                    .iter()
                    .filter(|c| c.as_node().is_some_and(|cn| cn.name == *name))
                    .count();
                occurrence == *number
            }
            Condition::Kind(kind) => value.kind() == *kind,
            Condition::Value(vc) => vc.matches(value),
        }
    }
}

/// A `[expr]` condition: an optional attribute target plus one test.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCondition {
    /// When set, the test applies to this attribute's value instead of the
    /// element itself; a missing attribute never matches.
    attribute: Option<String>,
    test: ValueTest,
}

#[derive(Debug, Clone, PartialEq)]
enum ValueTest {
    HasChild(String),
    HasAttribute(String),
    AttributeHasChild { attribute: String, child: String },
    AttributeHasAttribute { attribute: String, name: String },
    Compare { op: CompareOp, literal: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    NotContains,
    NotStartsWith,
    NotEndsWith,
}

impl ValueCondition {
    /// Parse the text between `[` and `]` (also used verbatim by schema
    /// `condition` strings).
    pub(crate) fn parse(expr: &str) -> Result<ValueCondition> {
        let expr = expr.trim();
        let (attribute, rest) = match expr.strip_prefix('@') {
            Some(rest) => {
                let split = rest
                    .find(|c: char| "=!<>~^$(".contains(c) || c.is_whitespace())
                    .unwrap_or(rest.len());
                let (name, tail) = rest.split_at(split);
                if name.is_empty() {
                    return Err(SdfError::Selector(
                        "Empty attribute name in value condition.".into(),
                    ));
                }
                (Some(name.to_string()), tail.trim_start())
            }
            None => (None, expr),
        };

        let test = if rest
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            parse_predicate(rest)?
        } else {
            parse_comparison(rest)?
        };

        Ok(ValueCondition { attribute, test })
    }

    /// Evaluate against an element's value. Targeting resolution happens
    /// first: a missing target attribute fails the condition outright.
    pub(crate) fn matches(&self, value: &Value) -> bool {
        let target = match &self.attribute {
            None => value,
            Some(name) => match value.as_node().and_then(|n| n.attribute(name)) {
                Some(attr_value) => attr_value,
                None => return false,
            },
        };
        self.test.matches(target)
    }
}

fn parse_predicate(text: &str) -> Result<ValueTest> {
    let open = text.find('(').ok_or_else(|| {
        SdfError::Selector(format!("Unknown operator in value condition '{text}'."))
    })?;
    let name = &text[..open];
    let rest = &text[open + 1..];
    let close = rest.find(')').ok_or_else(|| {
        SdfError::Selector(format!("Unterminated parentheses in predicate '{name}'."))
    })?;
    if !rest[close + 1..].trim().is_empty() {
        return Err(SdfError::Selector(format!(
            "Unexpected text after predicate '{name}'."
        )));
    }

    let args: Vec<&str> = rest[..close].split(',').map(str::trim).collect();
    for arg in &args {
        let word = arg.strip_prefix('@').unwrap_or(arg);
        let valid = !word.is_empty()
            && !word.chars().next().is_some_and(|c| c.is_ascii_digit())
            && word
                .chars()
                .all(|c| !c.is_whitespace() && !"(){}[]\"@".contains(c));
        if !valid {
            return Err(SdfError::Selector(format!(
                "Predicate '{name}' arguments must be plain names."
            )));
        }
    }

    let expect_args = |count: usize| {
        if args.len() == count {
            Ok(())
        } else {
            Err(SdfError::Selector(format!(
                "Predicate '{name}' expects {count} argument(s), got {}.",
                args.len()
            )))
        }
    };

    match name {
        "has_child" => {
            expect_args(1)?;
            Ok(ValueTest::HasChild(args[0].to_string()))
        }
        "has_attr" => {
            expect_args(1)?;
            Ok(ValueTest::HasAttribute(args[0].to_string()))
        }
        "attr_has_child" => {
            expect_args(2)?;
            Ok(ValueTest::AttributeHasChild {
                attribute: attr_argument(args[0])?,
                child: args[1].to_string(),
            })
        }
        "attr_has_attr" => {
            expect_args(2)?;
            Ok(ValueTest::AttributeHasAttribute {
                attribute: attr_argument(args[0])?,
                name: args[1].to_string(),
            })
        }
        other => Err(SdfError::Selector(format!(
            "Unknown predicate '{other}' in value condition."
        ))),
    }
}

fn attr_argument(arg: &str) -> Result<String> {
    arg.strip_prefix('@').map(str::to_string).ok_or_else(|| {
        SdfError::Selector(
            "Invalid attribute name given (does not start with an @).".into(),
        )
    })
}

fn parse_comparison(text: &str) -> Result<ValueTest> {
    // longest operators first
    const OPERATORS: [(&str, CompareOp); 12] = [
        ("!~=", CompareOp::NotContains),
        ("!^=", CompareOp::NotStartsWith),
        ("!$=", CompareOp::NotEndsWith),
        ("!=", CompareOp::Ne),
        ("~=", CompareOp::Contains),
        ("^=", CompareOp::StartsWith),
        ("$=", CompareOp::EndsWith),
        (">=", CompareOp::Ge),
        ("<=", CompareOp::Le),
        ("=", CompareOp::Eq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
    ];

    for (symbol, op) in OPERATORS {
        if let Some(rest) = text.strip_prefix(symbol) {
            let literal = parse_condition_literal(rest.trim())?;
            // ordered and substring operators bind to one literal kind
            match op {
                CompareOp::Gt | CompareOp::Lt | CompareOp::Ge | CompareOp::Le => {
                    if !matches!(literal, Value::Number(_)) {
                        return Err(SdfError::Selector(
                            "Cannot apply a number operator in value condition \
                             to something but a number literal."
                                .into(),
                        ));
                    }
                }
                CompareOp::Contains
                | CompareOp::StartsWith
                | CompareOp::EndsWith
                | CompareOp::NotContains
                | CompareOp::NotStartsWith
                | CompareOp::NotEndsWith => {
                    if !matches!(literal, Value::String(_)) {
                        return Err(SdfError::Selector(
                            "Cannot apply a string operator in value condition \
                             to something but a string literal."
                                .into(),
                        ));
                    }
                }
                CompareOp::Eq | CompareOp::Ne => {}
            }
            return Ok(ValueTest::Compare { op, literal });
        }
    }

    Err(SdfError::Selector(format!(
        "Unknown operator in value condition '{text}'."
    )))
}

/// Literal operand of a comparison: a quoted string, `true`/`false`/`null`,
/// or a number. Nodes are not literals.
fn parse_condition_literal(text: &str) -> Result<Value> {
    if let Some(inner) = text.strip_prefix('"') {
        let inner = inner.strip_suffix('"').ok_or_else(|| {
            SdfError::Selector(format!("Unterminated string literal in condition '{text}'."))
        })?;
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                out.push(crate::parser::unescape(chars.next()).map_err(|_| {
                    SdfError::Selector(format!("Bad escape in condition literal '{text}'."))
                })?);
            } else {
                out.push(c);
            }
        }
        return Ok(Value::String(out));
    }

    match text {
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    crate::value::parse_decimal(text)
        .map(Value::Number)
        .ok_or_else(|| SdfError::Selector(format!("Invalid literal '{text}' in value condition.")))
}

impl ValueTest {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ValueTest::HasChild(name) => has_child(value, name),
            ValueTest::HasAttribute(name) => {
                value.as_node().is_some_and(|n| n.attribute(name).is_some())
            }
            ValueTest::AttributeHasChild { attribute, child } => value
                .as_node()
                .and_then(|n| n.attribute(attribute))
                .is_some_and(|attr_value| has_child(attr_value, child)),
            ValueTest::AttributeHasAttribute { attribute, name } => value
                .as_node()
                .and_then(|n| n.attribute(attribute))
                .and_then(Value::as_node)
                .is_some_and(|n| n.attribute(name).is_some()),
            ValueTest::Compare { op, literal } => compare(*op, value, literal),
        }
    }
}

fn has_child(value: &Value, name: &str) -> bool {
    value.as_node().is_some_and(|n| {
        n.children
            .iter()
            .any(|c| c.as_node().is_some_and(|cn| cn.name == name))
    })
}

fn compare(op: CompareOp, value: &Value, literal: &Value) -> bool {
    use CompareOp::*;
    match op {
        Eq => literal_eq(value, literal),
        // same-kind is required, so `!=3` never matches strings or nodes
        Ne => {
            value.kind() == literal.kind()
                && value.kind() != ValueKind::Node
                && !literal_eq(value, literal)
        }
        Gt | Lt | Ge | Le => {
            let (Value::Number(a), Value::Number(b)) = (value, literal) else {
                return false;
            };
            let (x, y) = (a.to_f64(), b.to_f64());
            match op {
                Gt => x > y,
                Lt => x < y,
                // exact digit fallback counters floating rounding
                Ge => x >= y || a.eq_exact(b),
                Le => x <= y || a.eq_exact(b),
                _ => unreachable!(),
            }
        }
        Contains | StartsWith | EndsWith | NotContains | NotStartsWith | NotEndsWith => {
            let (Value::String(s), Value::String(sub)) = (value, literal) else {
                return false;
            };
            match op {
                Contains => s.contains(sub.as_str()),
                StartsWith => s.starts_with(sub.as_str()),
                EndsWith => s.ends_with(sub.as_str()),
                NotContains => !s.contains(sub.as_str()),
                NotStartsWith => !s.starts_with(sub.as_str()),
                NotEndsWith => !s.ends_with(sub.as_str()),
                _ => unreachable!(),
            }
        }
    }
}

fn literal_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x.eq_exact(y),
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// State of the per-level condition scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parsing {
    NodeName,
    AttributeName,
    DocumentIndex,
    Occurrence,
    Kind,
    ValueCondition,
}

/// Parse one selector level (the text between two `/`) into its conditions.
pub(crate) fn parse_level(level: &str) -> Result<Vec<Condition>> {
    let mut conditions = Vec::new();
    let mut buffer = String::new();
    let mut parsing = Parsing::NodeName;

    for c in level.chars() {
        if parsing == Parsing::ValueCondition {
            if c == ']' {
                flush(&mut conditions, &mut buffer, &mut parsing)?;
            } else {
                buffer.push(c);
            }
            continue;
        }

        match c {
            '@' => {
                let buffer_was_empty = buffer.is_empty();
                flush(&mut conditions, &mut buffer, &mut parsing)?;
                parsing = if buffer_was_empty {
                    Parsing::AttributeName
                } else {
                    Parsing::Occurrence
                };
            }
            '[' => {
                flush(&mut conditions, &mut buffer, &mut parsing)?;
                parsing = Parsing::ValueCondition;
            }
            '#' => {
                flush(&mut conditions, &mut buffer, &mut parsing)?;
                parsing = Parsing::DocumentIndex;
            }
            '^' => {
                flush(&mut conditions, &mut buffer, &mut parsing)?;
                parsing = Parsing::Kind;
            }
            '*' | '+' => {
                flush(&mut conditions, &mut buffer, &mut parsing)?;
                conditions.push(Condition::Hierarchy {
                    at_least_one: c == '+',
                });
            }
            other => buffer.push(other),
        }
    }

    if parsing == Parsing::ValueCondition {
        return Err(SdfError::Selector(format!(
            "Unterminated value condition (missing ']') in '{level}'."
        )));
    }
    flush(&mut conditions, &mut buffer, &mut parsing)?;

    Ok(conditions)
}

fn flush(conditions: &mut Vec<Condition>, buffer: &mut String, parsing: &mut Parsing) -> Result<()> {
    if !buffer.is_empty() {
        let condition = match *parsing {
            Parsing::NodeName => Condition::NodeName(buffer.clone()),
            Parsing::AttributeName => Condition::AttributeName(buffer.clone()),
            Parsing::DocumentIndex => Condition::DocumentIndex(parse_index(buffer)?),
            Parsing::Occurrence => Condition::Occurrence(parse_index(buffer)?),
            Parsing::Kind => Condition::Kind(parse_kind(buffer)?),
            Parsing::ValueCondition => Condition::Value(ValueCondition::parse(buffer)?),
        };
        conditions.push(condition);
    }

    buffer.clear();
    *parsing = Parsing::NodeName;
    Ok(())
}

fn parse_index(text: &str) -> Result<usize> {
    text.parse::<usize>()
        .map_err(|_| SdfError::Selector(format!("Invalid index '{text}' in selector.")))
}

fn parse_kind(text: &str) -> Result<ValueKind> {
    match text {
        "node" => Ok(ValueKind::Node),
        "null" => Ok(ValueKind::Null),
        "number" => Ok(ValueKind::Number),
        "string" => Ok(ValueKind::String),
        "bool" | "boolean" => Ok(ValueKind::Bool),
        other => Err(SdfError::Selector(format!(
            "Unknown type '{other}' passed in type condition."
        ))),
    }
}
