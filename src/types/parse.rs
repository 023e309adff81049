//! Parser for type descriptor names
//!
//! Accepts exactly the notation printed by [`TypeDesc::name`], with any
//! amount of whitespace between tokens:
//!
//! ```text
//! type   := prim | "vec" "[" type "]" | "{" [type ("," type)*] "}"
//! prim   := "bool" | "i8" | "i32" | "i64" | "f32" | "f64" | "pointer"
//! ```

use super::{PrimitiveKind, StructType, TypeDesc, VecType};
use crate::errors::{MarshalError, Result};

/// Deepest accepted nesting of struct and vector types
pub const MAX_NESTING: usize = 128;

/// Parse a type descriptor from its name, e.g. `{i32, vec[i64]}`
pub fn parse(input: &str) -> Result<TypeDesc> {
    let mut parser = TypeParser::new(input);
    let ty = parser.parse_type()?;
    parser.skip_whitespace();
    if !parser.is_at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(ty)
}

/// Parse a struct descriptor; fails if the text names any other kind of type
pub fn parse_struct(input: &str) -> Result<StructType> {
    match parse(input)? {
        TypeDesc::Struct(st) => Ok(st),
        other => Err(MarshalError::invalid_type(format!(
            "expected a struct type, got {}",
            other
        ))),
    }
}

struct TypeParser<'a> {
    input: &'a str,
    position: usize,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn new(input: &'a str) -> Self {
        TypeParser {
            input,
            position: 0,
            depth: 0,
        }
    }

    fn parse_type(&mut self) -> Result<TypeDesc> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => {
                self.position += 1;
                self.nested(|p| p.parse_struct_fields().map(TypeDesc::Struct))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.position;
                let ident = self.ident();
                match ident {
                    "vec" => {
                        self.expect(b'[')?;
                        let element = self.nested(|p| p.parse_type())?;
                        self.expect(b']')?;
                        Ok(VecType::new(element).into())
                    }
                    _ => primitive(ident).map(TypeDesc::Primitive).ok_or_else(|| {
                        self.position = start;
                        self.error(&format!("unknown type '{}'", ident))
                    }),
                }
            }
            Some(_) => Err(self.error("expected a type")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    // Called after the opening brace
    fn parse_struct_fields(&mut self) -> Result<StructType> {
        let mut fields = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.position += 1;
            return Ok(StructType::new(fields));
        }
        loop {
            fields.push(self.parse_type()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.position += 1,
                Some(b'}') => {
                    self.position += 1;
                    return Ok(StructType::new(fields));
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth == MAX_NESTING {
            return Err(self.error("type nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn ident(&mut self) -> &'a str {
        let start = self.position;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.position += 1;
        }
        &self.input[start..self.position]
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.position += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected as char)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn error(&self, message: &str) -> MarshalError {
        MarshalError::invalid_type(format!(
            "{} at position {} in '{}'",
            message, self.position, self.input
        ))
    }
}

fn primitive(ident: &str) -> Option<PrimitiveKind> {
    PrimitiveKind::ALL
        .into_iter()
        .find(|kind| kind.name() == ident)
}
