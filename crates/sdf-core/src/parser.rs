//! Text → [`Value`] parser for the SDF surface syntax.
//!
//! ```text
//! sdf        = node | literal
//! node       = ( name [attributes] [children] )
//! attributes = { (name sdf)* }
//! children   = [ sdf* ] | sdf
//! literal    = "string" | true | false | null | -?digits(.digits)?
//! ```
//!
//! A single child does not need the `[]` wrapper. Attribute keys must be
//! unique; a duplicate key is a parse error. Only the first expression in the
//! input is consumed, trailing text is ignored.

use crate::error::{Result, SdfError};
use crate::value::{Node, Value};

/// Parse one SDF document from text.
pub fn parse(input: &str) -> Result<Value> {
    let mut parser = Parser::new(input);
    parser.parse_value()
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            chars: input.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(SdfError::Parse(format!(
                "Expected '{expected}', found '{c}'."
            ))),
            None => Err(SdfError::Parse(format!(
                "Expected '{expected}', found end of input."
            ))),
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.chars.peek() {
            Some('(') => self.parse_node().map(Value::Node),
            Some(_) => self.parse_literal(),
            None => Err(SdfError::Parse(
                "Unexpected end of input while parsing value.".into(),
            )),
        }
    }

    fn parse_node(&mut self) -> Result<Node> {
        self.expect('(')?;
        self.skip_whitespace();

        let name = self.read_keyword();
        if name.is_empty() {
            return Err(SdfError::Parse("Node name must be a keyword.".into()));
        }
        let mut node = Node::new(name);

        self.skip_whitespace();
        if self.chars.peek() == Some(&'{') {
            self.parse_attributes(&mut node)?;
            self.skip_whitespace();
        }

        if self.chars.peek() != Some(&')') {
            self.parse_children(&mut node)?;
            self.skip_whitespace();
        }

        self.expect(')')?;
        Ok(node)
    }

    fn parse_attributes(&mut self, node: &mut Node) -> Result<()> {
        self.expect('{')?;
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some('}') => {
                    self.chars.next();
                    return Ok(());
                }
                Some('"') => {
                    return Err(SdfError::Parse(
                        "Attribute name must be a keyword, not a string.".into(),
                    ));
                }
                Some(_) => {
                    let key = self.read_keyword();
                    if key.is_empty() {
                        return Err(SdfError::Parse("Attribute name must be a keyword.".into()));
                    }
                    let value = self.parse_value()?;
                    if !node.insert_attribute(key.clone(), value) {
                        return Err(SdfError::Parse(format!(
                            "Duplicate attribute '{key}' on node '{}'.",
                            node.name
                        )));
                    }
                }
                None => {
                    return Err(SdfError::Parse(
                        "Unexpected end of input while parsing attributes.".into(),
                    ));
                }
            }
        }
    }

    fn parse_children(&mut self, node: &mut Node) -> Result<()> {
        match self.chars.peek() {
            Some('[') => {
                self.chars.next();
                loop {
                    self.skip_whitespace();
                    match self.chars.peek() {
                        Some(']') => {
                            self.chars.next();
                            return Ok(());
                        }
                        Some(_) => node.children.push(self.parse_value()?),
                        None => {
                            return Err(SdfError::Parse(
                                "Unexpected end of input while parsing children.".into(),
                            ));
                        }
                    }
                }
            }
            Some('{') => Err(SdfError::Parse(
                "A node cannot have two attribute lists.".into(),
            )),
            // one unbracketed child
            _ => {
                node.children.push(self.parse_value()?);
                Ok(())
            }
        }
    }

    fn parse_literal(&mut self) -> Result<Value> {
        if self.chars.peek() == Some(&'"') {
            self.chars.next();
            return self.parse_string().map(Value::String);
        }

        let keyword = self.read_keyword();
        if keyword.is_empty() {
            let found = self.chars.peek().copied().unwrap_or(' ');
            return Err(SdfError::Parse(format!(
                "Expected a value, found '{found}'."
            )));
        }
        keyword_to_literal(&keyword)
    }

    fn parse_string(&mut self) -> Result<String> {
        let mut result = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(result),
                Some('\\') => result.push(unescape(self.chars.next())?),
                Some(c) => result.push(c),
                None => {
                    return Err(SdfError::Parse(
                        "Unterminated string literal.".into(),
                    ));
                }
            }
        }
    }

    fn read_keyword(&mut self) -> String {
        let mut result = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || "()[]{}".contains(c) {
                break;
            }
            result.push(c);
            self.chars.next();
        }
        result
    }
}

/// Interpret an unquoted keyword as null, boolean or number.
fn keyword_to_literal(keyword: &str) -> Result<Value> {
    let lowercased = keyword.to_lowercase();
    match lowercased.as_str() {
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    crate::value::parse_decimal(&lowercased)
        .map(Value::Number)
        .ok_or_else(|| SdfError::Parse(format!("Invalid literal '{keyword}'.")))
}

/// Decode one escape sequence after a backslash.
pub(crate) fn unescape(c: Option<char>) -> Result<char> {
    match c {
        Some('\\') => Ok('\\'),
        Some('\'') => Ok('\''),
        Some('"') => Ok('"'),
        Some('?') => Ok('?'),
        Some('a') => Ok('\u{07}'),
        Some('b') => Ok('\u{08}'),
        Some('f') => Ok('\u{0C}'),
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),
        Some('v') => Ok('\u{0B}'),
        Some(other) => Err(SdfError::Parse(format!(
            "Unknown escape sequence within string: \\{other}"
        ))),
        None => Err(SdfError::Parse(
            "Unterminated escape sequence at end of input.".into(),
        )),
    }
}
