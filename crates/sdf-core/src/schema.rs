//! Schema model and validation.
//!
//! A schema is itself a document: a `(schema ...)` node whose `top-element`
//! attribute describes the root and whose children declare user-defined
//! types. [`Schema::from_value`] builds the model and verifies every type
//! reference up front, so validation never encounters a dangling name.
//!
//! Validation comes in two strengths. [`Schema::validate`] checks a complete
//! document. [`Schema::validate_partial`] checks a prefix of a document still
//! being read: underfull lists, missing required attributes and empty slots
//! are fine (later input may still supply them), but anything already
//! overfull or of the wrong shape fails. Type conditions are skipped in
//! partial mode since a condition that fails now may hold once the element
//! finishes.
//!
//! Every failure is a [`ValidationError`] describing the first problem found,
//! with nested alternatives indented one tab per level.

use std::collections::HashMap;

use crate::condition::{self, Condition, ValueCondition};
use crate::error::{Result, SdfError, ValidationError};
use crate::value::{Node, Value, ValueKind};
use crate::view::{MatchId, MatchView, ROOT};

type Checked = std::result::Result<(), ValidationError>;

/// A compiled schema, ready to validate documents.
#[derive(Debug)]
pub struct Schema {
    types: HashMap<String, SchemaType>,
    top_element: SchemaElement,
}

/// What a position in the document may hold.
#[derive(Debug, Clone)]
enum SchemaElement {
    /// A node with this exact name, of the referenced node type.
    Node { name: String, type_ref: String },
    /// A literal of the referenced literal type.
    Literal { type_ref: String },
    /// Exactly these elements, in order.
    Sequence(Vec<SchemaElement>),
    /// Any one of these elements.
    OneOf(Vec<SchemaElement>),
    /// Between `min` and `max` (unbounded when `None`) repetitions.
    List {
        element: Box<SchemaElement>,
        min: i64,
        max: Option<i64>,
    },
}

#[derive(Debug)]
enum SchemaType {
    /// The builtin `node` type: any node, no further constraints.
    AnyNode,
    /// A builtin literal kind.
    Builtin(ValueKind),
    Node(NodeType),
    Literal(LiteralType),
}

#[derive(Debug)]
struct NodeType {
    children: Option<SchemaElement>,
    attributes: Vec<AttributeSpec>,
    conditions: Option<TypeCondition>,
}

#[derive(Debug)]
struct LiteralType {
    base: ValueKind,
    conditions: Option<TypeCondition>,
}

#[derive(Debug)]
struct AttributeSpec {
    name: String,
    required: bool,
    element: SchemaElement,
}

#[derive(Debug)]
enum TypeCondition {
    Single {
        raw: String,
        condition: ValueCondition,
    },
    OneOf(Vec<TypeCondition>),
    AllOf(Vec<TypeCondition>),
}

fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "node" | "string" | "bool" | "boolean" | "number" | "null"
    )
}

impl Schema {
    /// Parse schema text and build a [`Schema`] from it.
    pub fn parse(text: &str) -> Result<Schema> {
        Schema::from_value(&crate::parser::parse(text)?)
    }

    /// Build a schema from its document representation.
    pub fn from_value(schema: &Value) -> Result<Schema> {
        let node = schema
            .as_node()
            .filter(|n| n.name == "schema")
            .ok_or_else(|| SdfError::Schema("Schema must be a (schema) node.".into()))?;

        let mut types = HashMap::new();
        types.insert("node".to_string(), SchemaType::AnyNode);
        types.insert("string".to_string(), SchemaType::Builtin(ValueKind::String));
        types.insert("bool".to_string(), SchemaType::Builtin(ValueKind::Bool));
        types.insert(
            "boolean".to_string(),
            SchemaType::Builtin(ValueKind::Bool),
        );
        types.insert("number".to_string(), SchemaType::Builtin(ValueKind::Number));
        types.insert("null".to_string(), SchemaType::Builtin(ValueKind::Null));

        let top = node.attribute("top-element").ok_or_else(|| {
            SdfError::Schema("Attribute 'top-element' expected, but not found.".into())
        })?;
        let top_element = make_element(top)?;

        for type_value in &node.children {
            let (name, schema_type) = make_type(type_value)?;
            types.insert(name, schema_type);
        }

        let schema = Schema { types, top_element };

        schema.verify_element(&schema.top_element)?;
        for schema_type in schema.types.values() {
            if let SchemaType::Node(nt) = schema_type {
                if let Some(children) = &nt.children {
                    schema.verify_element(children)?;
                }
                for attribute in &nt.attributes {
                    schema.verify_element(&attribute.element)?;
                }
            }
        }

        Ok(schema)
    }

    /// Every type reference must name a declared type of the right shape.
    fn verify_element(&self, element: &SchemaElement) -> Result<()> {
        match element {
            SchemaElement::List { element, .. } => self.verify_element(element),
            SchemaElement::OneOf(options) => {
                options.iter().try_for_each(|o| self.verify_element(o))
            }
            SchemaElement::Sequence(sequence) => {
                sequence.iter().try_for_each(|e| self.verify_element(e))
            }
            SchemaElement::Literal { type_ref } => match self.types.get(type_ref) {
                None => Err(SdfError::Schema(format!(
                    "Literal element references an undeclared type '{type_ref}'."
                ))),
                Some(SchemaType::Builtin(_)) | Some(SchemaType::Literal(_)) => Ok(()),
                Some(_) => Err(SdfError::Schema(
                    "Literal element references a non-literal type.".into(),
                )),
            },
            SchemaElement::Node { type_ref, .. } => match self.types.get(type_ref) {
                None => Err(SdfError::Schema(format!(
                    "Node element references an undeclared type '{type_ref}'."
                ))),
                Some(SchemaType::AnyNode) | Some(SchemaType::Node(_)) => Ok(()),
                Some(_) => Err(SdfError::Schema(
                    "Node element references a non-node type.".into(),
                )),
            },
        }
    }

    /// Validate a complete document. The first problem found is returned.
    pub fn validate(&self, document: &Value) -> Checked {
        let view = MatchView::build(document);
        self.element(&self.top_element, &view, ROOT)
    }

    /// Validate a document prefix: succeeds when further input could still
    /// complete the document into a valid one.
    pub fn validate_partial(&self, document: &Value) -> Checked {
        let view = MatchView::build(document);
        self.element_partial(&self.top_element, &view, ROOT)
    }

    // full validation

    fn element(&self, element: &SchemaElement, view: &MatchView, id: MatchId) -> Checked {
        match element {
            SchemaElement::Node { name, type_ref } => {
                self.node_element(name, type_ref, view, id)
            }
            SchemaElement::Literal { type_ref } => self.literal_element(type_ref, view, id),
            SchemaElement::List { .. } => self.list_element(element, view, &[id]),
            SchemaElement::Sequence(sequence) => {
                if sequence.len() != 1 {
                    return Err(ValidationError::new(format!(
                        "A sequence of {} elements expected, one element found.",
                        sequence.len()
                    )));
                }
                self.element(&sequence[0], view, id)
            }
            SchemaElement::OneOf(options) => {
                let mut full = String::new();
                for option in options {
                    match self.element(option, view, id) {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            full.push_str(&e.indented());
                            full.push('\n');
                        }
                    }
                }
                Err(ValidationError::new(format!(
                    "Element '{}' does not match any of the allowed options:\n{full}",
                    view.path(id)
                )))
            }
        }
    }

    /// Validate a node's whole child list against one element description.
    fn list_dispatch(&self, element: &SchemaElement, view: &MatchView, ids: &[MatchId]) -> Checked {
        match element {
            SchemaElement::Node { name, type_ref } => {
                if ids.len() != 1 {
                    return Err(ValidationError::new(
                        "One node expected, multiple (or none) found.",
                    ));
                }
                self.node_element(name, type_ref, view, ids[0])
            }
            SchemaElement::Literal { type_ref } => {
                if ids.len() != 1 {
                    return Err(ValidationError::new(
                        "One literal expected, multiple (or none) found.",
                    ));
                }
                self.literal_element(type_ref, view, ids[0])
            }
            SchemaElement::List { .. } => self.list_element(element, view, ids),
            SchemaElement::Sequence(sequence) => {
                if ids.len() != sequence.len() {
                    return Err(ValidationError::new(format!(
                        "A sequence of {} elements expected, {} element(s) found.",
                        sequence.len(),
                        ids.len()
                    )));
                }
                for (element, id) in sequence.iter().zip(ids) {
                    self.element(element, view, *id)?;
                }
                Ok(())
            }
            SchemaElement::OneOf(options) => {
                for option in options {
                    if self.list_dispatch(option, view, ids).is_ok() {
                        return Ok(());
                    }
                }
                Err(ValidationError::new(
                    "Element does not match any of the allowed options.",
                ))
            }
        }
    }

    fn list_element(&self, element: &SchemaElement, view: &MatchView, ids: &[MatchId]) -> Checked {
        let SchemaElement::List { element, min, max } = element else {
            return Err(ValidationError::new("Unknown element type in schema."));
        };
        let count = ids.len() as i64;
        if count < *min {
            return Err(ValidationError::new(format!(
                "Fewer than the minimum ({min}) number of elements in a list."
            )));
        }
        if let Some(max) = max {
            if count > *max {
                return Err(ValidationError::new(format!(
                    "More than the maximum ({max}) number of elements in a list."
                )));
            }
        }
        for id in ids {
            self.element(element, view, *id)?;
        }
        Ok(())
    }

    fn node_element(&self, name: &str, type_ref: &str, view: &MatchView, id: MatchId) -> Checked {
        let value = view.value(id);
        let matches_name = value.as_node().is_some_and(|n| n.name == name);
        if !matches_name {
            return Err(ValidationError::new(format!(
                "Element '{}' must be a ({name}) node.",
                view.path(id)
            )));
        }

        let node_type = match self.types.get(type_ref) {
            Some(SchemaType::AnyNode) => return Ok(()),
            Some(SchemaType::Node(nt)) => nt,
            _ => return Err(ValidationError::new("Bad type in schema.")),
        };

        if let Some(children) = &node_type.children {
            self.list_dispatch(children, view, view.children(id))?;
        }

        self.conditions(node_type.conditions.as_ref(), view, id)?;

        for attribute in &node_type.attributes {
            match view.attribute(id, &attribute.name) {
                None if !attribute.required => {}
                None => {
                    return Err(ValidationError::new(format!(
                        "Required attribute '{}' is missing on element '{}'.",
                        attribute.name,
                        view.path(id)
                    )));
                }
                Some(attr_id) => self.element(&attribute.element, view, attr_id)?,
            }
        }

        Ok(())
    }

    fn literal_element(&self, type_ref: &str, view: &MatchView, id: MatchId) -> Checked {
        let value = view.value(id);
        if value.is_node() {
            return Err(ValidationError::new(format!(
                "Element '{}' must be a literal.",
                view.path(id)
            )));
        }

        match self.types.get(type_ref) {
            Some(SchemaType::Builtin(kind)) => check_kind(*kind, value),
            Some(SchemaType::Literal(lt)) => {
                check_kind(lt.base, value)?;
                self.conditions(lt.conditions.as_ref(), view, id)
            }
            _ => Err(ValidationError::new("Bad type in schema.")),
        }
    }

    fn conditions(
        &self,
        conditions: Option<&TypeCondition>,
        view: &MatchView,
        id: MatchId,
    ) -> Checked {
        let Some(conditions) = conditions else {
            return Ok(());
        };
        match conditions {
            TypeCondition::AllOf(all) => {
                for condition in all {
                    if let Err(e) = self.conditions(Some(condition), view, id) {
                        return Err(ValidationError::new(format!(
                            "One of the conditions is not met:\n{}",
                            e.indented()
                        )));
                    }
                }
                Ok(())
            }
            TypeCondition::OneOf(any) => {
                let mut full = String::new();
                for condition in any {
                    match self.conditions(Some(condition), view, id) {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            full.push_str(&e.indented());
                            full.push('\n');
                        }
                    }
                }
                Err(ValidationError::new(format!(
                    "None of the conditions is met:\n{full}"
                )))
            }
            TypeCondition::Single { raw, condition } => {
                if condition.matches(view.value(id)) {
                    Ok(())
                } else {
                    Err(ValidationError::new(format!(
                        "Element '{}' does not match the '{raw}' condition.",
                        view.path(id)
                    )))
                }
            }
        }
    }

    // partial validation

    fn element_partial(&self, element: &SchemaElement, view: &MatchView, id: MatchId) -> Checked {
        match element {
            SchemaElement::Node { name, type_ref } => {
                self.node_element_partial(name, type_ref, view, id)
            }
            // a literal is never partial, it either matches or it does not
            SchemaElement::Literal { type_ref } => self.literal_element(type_ref, view, id),
            SchemaElement::List { .. } => self.list_element_partial(element, view, &[id]),
            SchemaElement::Sequence(sequence) => match sequence.first() {
                Some(first) => self.element_partial(first, view, id),
                None => Err(ValidationError::new(
                    "A sequence of 0 elements expected, more (1) elements found.",
                )),
            },
            SchemaElement::OneOf(options) => {
                let mut full = String::new();
                for option in options {
                    match self.element_partial(option, view, id) {
                        Ok(()) => return Ok(()),
                        Err(e) => {
                            full.push_str(&e.indented());
                            full.push('\n');
                        }
                    }
                }
                Err(ValidationError::new(format!(
                    "Element '{}' does not match any of the allowed options even partially:\n{full}",
                    view.path(id)
                )))
            }
        }
    }

    fn list_dispatch_partial(
        &self,
        element: &SchemaElement,
        view: &MatchView,
        ids: &[MatchId],
    ) -> Checked {
        match element {
            SchemaElement::Node { name, type_ref } => {
                if ids.len() > 1 {
                    return Err(ValidationError::new("One node expected, multiple found."));
                }
                match ids.first() {
                    // the slot may still get filled
                    None => Ok(()),
                    Some(id) => self.node_element_partial(name, type_ref, view, *id),
                }
            }
            SchemaElement::Literal { type_ref } => {
                if ids.len() > 1 {
                    return Err(ValidationError::new(
                        "One literal expected, multiple found.",
                    ));
                }
                match ids.first() {
                    None => Ok(()),
                    Some(id) => self.literal_element(type_ref, view, *id),
                }
            }
            SchemaElement::List { .. } => self.list_element_partial(element, view, ids),
            SchemaElement::Sequence(sequence) => {
                if ids.len() > sequence.len() {
                    return Err(ValidationError::new(format!(
                        "A sequence of {} elements expected, more ({}) elements found.",
                        sequence.len(),
                        ids.len()
                    )));
                }
                for (element, id) in sequence.iter().zip(ids) {
                    self.element_partial(element, view, *id)?;
                }
                Ok(())
            }
            SchemaElement::OneOf(options) => {
                for option in options {
                    if self.list_dispatch_partial(option, view, ids).is_ok() {
                        return Ok(());
                    }
                }
                Err(ValidationError::new(
                    "Element does not match any of the allowed options even partially.",
                ))
            }
        }
    }

    fn list_element_partial(
        &self,
        element: &SchemaElement,
        view: &MatchView,
        ids: &[MatchId],
    ) -> Checked {
        let SchemaElement::List { element, max, .. } = element else {
            return Err(ValidationError::new("Unknown element type in schema."));
        };
        // an underfull list may still grow, only overfull is fatal
        if let Some(max) = max {
            if ids.len() as i64 > *max {
                return Err(ValidationError::new(format!(
                    "More than the maximum ({max}) number of elements in a list."
                )));
            }
        }
        for id in ids {
            self.element_partial(element, view, *id)?;
        }
        Ok(())
    }

    fn node_element_partial(
        &self,
        name: &str,
        type_ref: &str,
        view: &MatchView,
        id: MatchId,
    ) -> Checked {
        let value = view.value(id);
        let matches_name = value.as_node().is_some_and(|n| n.name == name);
        if !matches_name {
            return Err(ValidationError::new(format!(
                "Element '{}' must be a ({name}) node.",
                view.path(id)
            )));
        }

        let node_type = match self.types.get(type_ref) {
            Some(SchemaType::AnyNode) => return Ok(()),
            Some(SchemaType::Node(nt)) => nt,
            _ => return Err(ValidationError::new("Bad type in schema.")),
        };

        if let Some(children) = &node_type.children {
            self.list_dispatch_partial(children, view, view.children(id))?;
        }

        // conditions are skipped: a failing condition may start holding once
        // the element gains more children or attributes

        for attribute in &node_type.attributes {
            // missing attributes (even required ones) may still arrive
            if let Some(attr_id) = view.attribute(id, &attribute.name) {
                self.element_partial(&attribute.element, view, attr_id)?;
            }
        }

        Ok(())
    }
}

fn check_kind(kind: ValueKind, value: &Value) -> Checked {
    if value.kind() == kind {
        return Ok(());
    }
    Err(ValidationError::new(match kind {
        ValueKind::String => "String expected.",
        ValueKind::Number => "Number expected.",
        ValueKind::Bool => "Boolean value expected.",
        ValueKind::Null => "Null expected.",
        ValueKind::Node => "Node expected.",
    }))
}

// building the model from schema documents

fn make_element(value: &Value) -> Result<SchemaElement> {
    let node = value
        .as_node()
        .ok_or_else(|| SdfError::Schema("Schema element description must be a node.".into()))?;

    match node.name.as_str() {
        "node-element" => {
            let name = string_attr(node, "name")?;
            let type_ref = match opt_string_attr(node, "type")? {
                Some(t) => format!("ud:{t}"),
                None => "node".to_string(),
            };
            Ok(SchemaElement::Node { name, type_ref })
        }
        "literal-element" => {
            let t = string_attr(node, "type")?;
            let type_ref = if is_builtin(&t) { t } else { format!("ud:{t}") };
            Ok(SchemaElement::Literal { type_ref })
        }
        "sequence" | "one-of" => {
            let elements: Vec<SchemaElement> = node
                .children
                .iter()
                .map(make_element)
                .collect::<Result<_>>()?;
            if node.name == "sequence" {
                Ok(SchemaElement::Sequence(elements))
            } else {
                Ok(SchemaElement::OneOf(elements))
            }
        }
        "list" => {
            if node.children.len() != 1 {
                return Err(SdfError::Schema(
                    "Schema list description must have exactly one element description.".into(),
                ));
            }
            Ok(SchemaElement::List {
                element: Box::new(make_element(&node.children[0])?),
                min: opt_integer_attr(node, "min")?.unwrap_or(0),
                max: opt_integer_attr(node, "max")?,
            })
        }
        _ => Err(SdfError::Schema(
            "Invalid schema element description.".into(),
        )),
    }
}

fn make_type(value: &Value) -> Result<(String, SchemaType)> {
    let node = value
        .as_node()
        .ok_or_else(|| SdfError::Schema("Schema type description must be a node.".into()))?;

    let conditions = make_conditions_for(node)?;

    match node.name.as_str() {
        "node-type" => {
            let name = format!("ud:{}", string_attr(node, "name")?);
            let children = match node.attribute("children") {
                Some(c) => Some(make_element(c)?),
                None => None,
            };
            let attributes = node
                .children
                .iter()
                .map(make_attribute)
                .collect::<Result<_>>()?;
            Ok((
                name,
                SchemaType::Node(NodeType {
                    children,
                    attributes,
                    conditions,
                }),
            ))
        }
        "literal-type" => {
            let name = format!("ud:{}", string_attr(node, "name")?);
            let base_name = string_attr(node, "base-type")?;
            let base = match base_name.as_str() {
                "string" => ValueKind::String,
                "bool" | "boolean" => ValueKind::Bool,
                "number" => ValueKind::Number,
                "null" => ValueKind::Null,
                _ => {
                    return Err(SdfError::Schema(format!(
                        "Unknown built-in type '{base_name}' used in literal-type description."
                    )));
                }
            };
            Ok((name, SchemaType::Literal(LiteralType { base, conditions })))
        }
        _ => Err(SdfError::Schema("Invalid schema type description.".into())),
    }
}

fn make_conditions_for(node: &Node) -> Result<Option<TypeCondition>> {
    let Some(conditions) = node.attribute("conditions") else {
        return Ok(None);
    };
    let conditions = conditions
        .as_node()
        .ok_or_else(|| SdfError::Schema("Schema condition description must be a node.".into()))?;
    Ok(Some(make_condition(conditions)?))
}

fn make_condition(node: &Node) -> Result<TypeCondition> {
    match node.name.as_str() {
        "condition" => {
            if node.children.len() != 1 {
                return Err(SdfError::Schema(
                    "Schema condition description must have exactly one value.".into(),
                ));
            }
            let Value::String(raw) = &node.children[0] else {
                return Err(SdfError::Schema(
                    "Schema condition description must be a string.".into(),
                ));
            };
            Ok(TypeCondition::Single {
                raw: raw.clone(),
                condition: parse_single_condition(raw)?,
            })
        }
        "one-of-conditions" | "all-of-conditions" => {
            if node.children.is_empty() {
                return Err(SdfError::Schema(format!(
                    "Schema {} description must have at least one value.",
                    node.name
                )));
            }
            let mut conditions = Vec::with_capacity(node.children.len());
            for child in &node.children {
                let nd = child.as_node().ok_or_else(|| {
                    SdfError::Schema(format!(
                        "All of schema {} description values must be nodes.",
                        node.name
                    ))
                })?;
                conditions.push(make_condition(nd)?);
            }
            if node.name == "one-of-conditions" {
                Ok(TypeCondition::OneOf(conditions))
            } else {
                Ok(TypeCondition::AllOf(conditions))
            }
        }
        _ => Err(SdfError::Schema(
            "Invalid schema condition description.".into(),
        )),
    }
}

/// A schema condition string is the inside of a selector `[...]` block.
fn parse_single_condition(raw: &str) -> Result<ValueCondition> {
    let mut parsed = condition::parse_level(&format!("[{raw}]"))?;
    match (parsed.pop(), parsed.is_empty()) {
        (Some(Condition::Value(condition)), true) => Ok(condition),
        _ => Err(SdfError::Schema(format!("Invalid condition '{raw}'."))),
    }
}

fn make_attribute(value: &Value) -> Result<AttributeSpec> {
    let node = value.as_node().filter(|n| n.name == "attribute").ok_or_else(|| {
        SdfError::Schema("Schema attribute description must be an (attribute) node.".into())
    })?;
    if node.children.len() != 1 {
        return Err(SdfError::Schema(
            "Schema attribute description must have exactly one element description.".into(),
        ));
    }
    Ok(AttributeSpec {
        name: string_attr(node, "name")?,
        required: bool_attr(node, "required")?,
        element: make_element(&node.children[0])?,
    })
}

// typed attribute readers for schema documents

fn string_attr(node: &Node, name: &str) -> Result<String> {
    match node.attribute(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(SdfError::Schema(format!(
            "Attribute '{name}' expected to be a string."
        ))),
        None => Err(SdfError::Schema(format!(
            "Attribute '{name}' expected, but not found."
        ))),
    }
}

fn opt_string_attr(node: &Node, name: &str) -> Result<Option<String>> {
    match node.attribute(name) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SdfError::Schema(format!(
            "Attribute '{name}' expected to be a string."
        ))),
        None => Ok(None),
    }
}

fn bool_attr(node: &Node, name: &str) -> Result<bool> {
    match node.attribute(name) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(SdfError::Schema(format!(
            "Attribute '{name}' expected to be a boolean value."
        ))),
        None => Err(SdfError::Schema(format!(
            "Attribute '{name}' expected, but not found."
        ))),
    }
}

fn opt_integer_attr(node: &Node, name: &str) -> Result<Option<i64>> {
    match node.attribute(name) {
        Some(Value::Number(n)) => {
            if n.fraction != 0 {
                return Err(SdfError::Schema(format!(
                    "Attribute '{name}' expected to be an integer."
                )));
            }
            Ok(Some(n.integer))
        }
        Some(_) => Err(SdfError::Schema(format!(
            "Attribute '{name}' expected to be a number."
        ))),
        None => Ok(None),
    }
}
