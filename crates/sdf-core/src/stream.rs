//! Streaming, non-recursive parser.
//!
//! [`StreamingParser`] consumes input one token at a time and reports an
//! [`Event`] per call to [`StreamingParser::read_next`]. The document under
//! construction is available through [`StreamingParser::document`] after
//! every event, with each parsed piece already attached to its parent, so a
//! caller can inspect (or validate) the prefix read so far.
//!
//! [`parse_validated`] couples the parser with a [`Schema`]: after every
//! completed node the prefix is checked with [`Schema::validate_partial`]
//! and parsing stops at the first prefix no further input could repair; the
//! finished document then gets a full [`Schema::validate`] pass.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Result, SdfError, ValidationError};
use crate::parser::unescape;
use crate::schema::Schema;
use crate::value::{Node, Value};
use crate::view::Step;

/// What the parser just read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Reported once before the first element.
    DocumentStart,
    /// A node opened; it is already attached to the document.
    NodeStart(String),
    /// `{` of an attribute list.
    AttributeListStart,
    /// An attribute's value is about to be read.
    AttributeStart(String),
    /// The attribute's value finished.
    AttributeEnd,
    /// `}` of an attribute list.
    AttributeListEnd,
    /// A node's child list opened.
    ChildrenListStart,
    /// A node's child list closed.
    ChildrenListEnd,
    /// A literal was read and attached.
    Literal,
    /// `)` of a node.
    NodeEnd,
    /// Reported once after the only element; reading further is an error.
    DocumentEnd,
}

/// Pending grammar obligations, innermost last.
#[derive(Debug)]
enum Token {
    DocumentStart,
    NodeStart(String),
    AfterAttributes,
    AttributeListStart,
    AttributeStart(String),
    AttributeEnd,
    AfterAttribute,
    AttributeListEnd,
    ChildrenListStart,
    AfterChild { multiple: bool },
    ChildrenListEnd,
    NodeEnd,
    Literal,
    DocumentEnd,
}

/// Where the next value read should be attached.
enum Attach {
    Root,
    Child,
    Attribute(String),
}

pub struct StreamingParser<'s> {
    chars: Peekable<Chars<'s>>,
    tokens: Vec<Token>,
    document: Option<Value>,
    /// Steps from the root to the currently open node.
    cursor: Vec<Step>,
    finished: bool,
}

impl<'s> StreamingParser<'s> {
    pub fn new(text: &'s str) -> StreamingParser<'s> {
        StreamingParser {
            chars: text.chars().peekable(),
            tokens: vec![Token::DocumentEnd, Token::DocumentStart],
            document: None,
            cursor: Vec::new(),
            finished: false,
        }
    }

    /// Parse a whole document in one go.
    pub fn parse(text: &str) -> Result<Value> {
        let mut parser = StreamingParser::new(text);
        while parser.read_next()? != Event::DocumentEnd {}
        parser
            .document
            .ok_or_else(|| SdfError::Parse("Empty document.".into()))
    }

    /// The document prefix built so far.
    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_document(self) -> Option<Value> {
        self.document
    }

    /// Advance to the next event. After an error or [`Event::DocumentEnd`]
    /// the parser must not be used again.
    pub fn read_next(&mut self) -> Result<Event> {
        if self.finished {
            return Err(SdfError::Parse("Document already ended.".into()));
        }
        match self.step() {
            Ok(event) => {
                if event == Event::DocumentEnd {
                    self.finished = true;
                }
                Ok(event)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn step(&mut self) -> Result<Event> {
        loop {
            let Some(token) = self.tokens.pop() else {
                return Err(SdfError::Parse("Document already ended.".into()));
            };
            self.skip_whitespace();

            // internal bookkeeping tokens loop without reporting an event
            match token {
                Token::DocumentStart => {
                    self.read_value(Attach::Root)?;
                    return Ok(Event::DocumentStart);
                }

                Token::NodeStart(name) => {
                    match self.chars.peek() {
                        // next obligation on the stack is NodeEnd
                        Some(')') => {}
                        Some('{') => {
                            self.chars.next();
                            self.tokens.push(Token::AfterAttributes);
                            self.tokens.push(Token::AttributeListEnd);
                            self.tokens.push(Token::AttributeListStart);
                        }
                        _ => {
                            self.tokens.push(Token::ChildrenListEnd);
                            self.tokens.push(Token::ChildrenListStart);
                        }
                    }
                    return Ok(Event::NodeStart(name));
                }

                Token::AfterAttributes => match self.chars.peek() {
                    Some(')') => {}
                    Some('{') => {
                        return Err(SdfError::Parse(
                            "Node cannot have two attribute lists.".into(),
                        ));
                    }
                    _ => {
                        self.tokens.push(Token::ChildrenListEnd);
                        self.tokens.push(Token::ChildrenListStart);
                    }
                },

                Token::AttributeListStart => {
                    if self.chars.peek() != Some(&'}') {
                        self.push_attribute_read()?;
                    }
                    return Ok(Event::AttributeListStart);
                }

                Token::AttributeStart(name) => {
                    self.read_value(Attach::Attribute(name.clone()))?;
                    return Ok(Event::AttributeStart(name));
                }

                Token::AttributeEnd => return Ok(Event::AttributeEnd),

                Token::AfterAttribute => {
                    if self.chars.peek() == Some(&'}') {
                        self.chars.next();
                        // the AttributeListEnd obligation is already satisfied
                        self.tokens.pop();
                        return Ok(Event::AttributeListEnd);
                    }
                    self.push_attribute_read()?;
                }

                Token::AttributeListEnd => {
                    if self.chars.next() != Some('}') {
                        return Err(SdfError::Parse(
                            "Expected attribute list to end.".into(),
                        ));
                    }
                    return Ok(Event::AttributeListEnd);
                }

                Token::ChildrenListStart => {
                    let mut multiple = false;
                    if self.chars.peek() == Some(&'[') {
                        self.chars.next();
                        self.skip_whitespace();
                        multiple = true;
                    }
                    if self.chars.peek() != Some(&']') {
                        self.tokens.push(Token::AfterChild { multiple });
                        self.read_value(Attach::Child)?;
                    }
                    return Ok(Event::ChildrenListStart);
                }

                Token::AfterChild { multiple } => {
                    if !multiple {
                        continue;
                    }
                    if self.chars.peek() == Some(&']') {
                        self.chars.next();
                        self.tokens.pop();
                        return Ok(Event::ChildrenListEnd);
                    }
                    self.tokens.push(Token::AfterChild { multiple });
                    self.read_value(Attach::Child)?;
                }

                Token::ChildrenListEnd => {
                    // only an empty bracketed list still carries its `]`
                    if self.chars.peek() == Some(&']') {
                        self.chars.next();
                    }
                    return Ok(Event::ChildrenListEnd);
                }

                Token::NodeEnd => {
                    if self.chars.next() != Some(')') {
                        return Err(SdfError::Parse("Expected node to end.".into()));
                    }
                    self.cursor.pop();
                    return Ok(Event::NodeEnd);
                }

                Token::Literal => return Ok(Event::Literal),

                Token::DocumentEnd => return Ok(Event::DocumentEnd),
            }
        }
    }

    fn push_attribute_read(&mut self) -> Result<()> {
        let name = self.read_while(|c| !c.is_whitespace());
        if name.is_empty() {
            return Err(SdfError::Parse("Attribute must have a name.".into()));
        }
        self.tokens.push(Token::AfterAttribute);
        self.tokens.push(Token::AttributeEnd);
        self.tokens.push(Token::AttributeStart(name));
        Ok(())
    }

    /// Read the start of a node or a whole literal and attach it.
    fn read_value(&mut self, attach: Attach) -> Result<()> {
        self.skip_whitespace();
        if self.chars.peek() == Some(&'(') {
            self.chars.next();
            self.skip_whitespace();
            let name =
                self.read_while(|c| !c.is_whitespace() && !"(){}[]\"".contains(c));
            if name.is_empty() {
                return Err(SdfError::Parse("Node must have a name.".into()));
            }
            self.tokens.push(Token::NodeEnd);
            self.tokens.push(Token::NodeStart(name.clone()));
            self.attach(Value::Node(Node::new(name)), attach, true)?;
            return Ok(());
        }

        let literal = self.read_literal()?;
        self.tokens.push(Token::Literal);
        self.attach(literal, attach, false)
    }

    /// Attach a value to the open node; a node value also becomes the new
    /// open node.
    fn attach(&mut self, value: Value, attach: Attach, descend: bool) -> Result<()> {
        let step = match attach {
            Attach::Root => {
                self.document = Some(value);
                return Ok(());
            }
            Attach::Child => {
                let parent = self.open_node_mut()?;
                parent.children.push(value);
                Step::Child(parent.children.len() - 1)
            }
            Attach::Attribute(name) => {
                let parent = self.open_node_mut()?;
                if !parent.insert_attribute(name.clone(), value) {
                    return Err(SdfError::Parse(format!("Duplicate attribute '{name}'.")));
                }
                Step::Attribute(parent.attributes().len() - 1)
            }
        };
        if descend {
            self.cursor.push(step);
        }
        Ok(())
    }

    fn open_node_mut(&mut self) -> Result<&mut Node> {
        let root = self
            .document
            .as_mut()
            .ok_or_else(|| SdfError::Parse("No open node.".into()))?;
        crate::edit::resolve_mut(root, &self.cursor)
            .and_then(Value::as_node_mut)
            .ok_or_else(|| SdfError::Parse("No open node.".into()))
    }

    fn read_literal(&mut self) -> Result<Value> {
        match self.chars.peek() {
            Some('"') => {
                self.chars.next();
                Ok(Value::String(self.read_string()?))
            }
            Some(c) if *c == '-' || c.is_ascii_digit() => {
                let text = self.read_while(|c| c == '-' || c == '.' || c.is_ascii_digit());
                crate::value::parse_decimal(&text)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        SdfError::Parse(format!("Invalid number literal '{text}'."))
                    })
            }
            Some(c) if c.is_alphabetic() => {
                let word = self.read_while(|c| c.is_alphabetic());
                match word.to_lowercase().as_str() {
                    "null" => Ok(Value::Null),
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(SdfError::Parse(
                        "Neither node nor any of supported literals found.".into(),
                    )),
                }
            }
            _ => Err(SdfError::Parse(
                "Neither node nor any of supported literals found.".into(),
            )),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        let mut result = String::new();
        loop {
            match self.chars.next() {
                None => {
                    return Err(SdfError::Parse(
                        "Unexpected end of input while parsing string expression.".into(),
                    ));
                }
                Some('"') => return Ok(result),
                Some('\\') => result.push(unescape(self.chars.next())?),
                Some(c) => result.push(c),
            }
        }
    }

    fn read_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut result = String::new();
        while let Some(c) = self.chars.peek() {
            if !keep(*c) {
                break;
            }
            result.push(*c);
            self.chars.next();
        }
        result
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }
}

/// Parse a document while validating it against `schema`.
///
/// Each time a node completes, the prefix read so far is checked with
/// [`Schema::validate_partial`] and parsing aborts as soon as the document
/// can no longer match. The complete document is then fully validated.
pub fn parse_validated(text: &str, schema: &Schema) -> Result<Value> {
    let mut parser = StreamingParser::new(text);
    loop {
        let event = parser.read_next()?;
        if event == Event::DocumentEnd {
            break;
        }
        if event != Event::NodeEnd {
            continue;
        }
        if let Some(document) = parser.document() {
            if let Err(e) = schema.validate_partial(document) {
                return Err(SdfError::Validation(ValidationError::new(format!(
                    "Document already does not match the schema:\n{}",
                    e.message()
                ))));
            }
        }
    }

    let document = parser
        .into_document()
        .ok_or_else(|| SdfError::Parse("Empty document.".into()))?;
    if let Err(e) = schema.validate(&document) {
        return Err(SdfError::Validation(ValidationError::new(format!(
            "File is read completely, but document does not match the schema:\n{}",
            e.message()
        ))));
    }
    Ok(document)
}
