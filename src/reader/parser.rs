use std::fmt;

use tracing::trace;

use crate::interpreter::ast_walk::Value;
use crate::reader::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken,
    UnclosedList,
    UnexpectedClose,
    Unsupported,
    InvalidLiteral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "ParseError: {} at offset {}", self.message, self.offset) }
}

impl std::error::Error for ParseError {}

macro_rules! parse_error {
    ($kind:expr, $token:expr, $($arg:tt)*) => (
        return Err(ParseError { kind: $kind, message: format!($($arg)*), offset: $token.offset })
    )
}

/// One token of lookahead, never backtracks.
pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    position: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self { Parser { tokens, position: 0 } }

    fn peek(&self) -> Token<'a> {
        match self.tokens.get(self.position) {
            Some(token) => *token,
            None => Token {
                kind: TokenKind::EndOfFile,
                text: "",
                offset: self.tokens.last().map_or(0, |t| t.offset + t.text.len()),
            },
        }
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        self.position += 1;
        token
    }

    pub fn at_end(&self) -> bool { self.peek().kind == TokenKind::EndOfFile }

    pub fn parse_expr(&mut self) -> Result<Value, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::ParenOpen => {
                let list = self.parse_list()?;
                let close = self.advance();
                match close.kind {
                    TokenKind::ParenClose => Ok(list),
                    TokenKind::EndOfFile => parse_error!(ParseErrorKind::UnclosedList, token, "Unclosed list"),
                    _ => parse_error!(ParseErrorKind::UnexpectedToken, close, "Expected close paren, got {}", close),
                }
            }
            TokenKind::EmptyList => Ok(Value::Empty),
            TokenKind::True => Ok(Value::Boolean(true)),
            TokenKind::False => Ok(Value::Boolean(false)),
            TokenKind::Number => match token.text.parse::<i64>() {
                Ok(n) => Ok(Value::Integer(n)),
                Err(_) => parse_error!(ParseErrorKind::InvalidLiteral, token, "Integer literal out of range: {}", token.text),
            },
            TokenKind::String => Ok(Value::text(&unescape(token.text))),
            TokenKind::Identifier => Ok(Value::symbol(token.text)),
            TokenKind::Quote => self.parse_marker("quote"),
            TokenKind::Quasiquote => self.parse_marker("quasiquote"),
            TokenKind::Unquote => self.parse_marker("unquote"),
            TokenKind::UnquoteSplice => self.parse_marker("unquote-splicing"),
            TokenKind::VectorOpen => parse_error!(ParseErrorKind::Unsupported, token, "Vectors are not supported"),
            TokenKind::ParenClose => parse_error!(ParseErrorKind::UnexpectedClose, token, "Unexpected close paren"),
            TokenKind::ConsDot | TokenKind::EndOfFile | TokenKind::Whitespace | TokenKind::Comment => {
                parse_error!(ParseErrorKind::UnexpectedToken, token, "Unexpected {}", token.kind.name())
            }
        }
    }

    // 'x => (quote x)
    fn parse_marker(&mut self, keyword: &str) -> Result<Value, ParseError> {
        let inner = self.parse_expr()?;
        Ok(Value::from_vec(vec![Value::symbol(keyword), inner]))
    }

    /// The body of a list up to, but not including, its close paren or end of
    /// input. `a . b` makes the final pair improper.
    pub fn parse_list(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::ParenClose | TokenKind::EndOfFile => return Ok(Value::from_vec(items)),
                TokenKind::ConsDot if items.is_empty() => {
                    parse_error!(ParseErrorKind::UnexpectedToken, token, "Nothing before cons dot")
                }
                TokenKind::ConsDot => {
                    self.advance();
                    let tail = self.parse_expr()?;
                    return Ok(Value::from_vec_with_tail(items, tail));
                }
                _ => items.push(self.parse_expr()?),
            }
        }
    }
}

// strip the quotes, resolve \" and \\
fn unescape(literal: &str) -> Vec<u8> {
    let inner = &literal.as_bytes()[1..literal.len() - 1];
    let mut out = Vec::with_capacity(inner.len());
    let mut bytes = inner.iter();
    while let Some(&b) = bytes.next() {
        match b {
            b'\\' => out.extend(bytes.next()),
            _ => out.push(b),
        }
    }
    out
}

/// Parse a whole token stream up to `EndOfFile`. The forms are wrapped as
/// `(begin form...)` so a program runs as one expression.
pub fn parse(tokens: &[Token]) -> Result<Value, ParseError> {
    let mut parser = Parser::new(tokens);
    let mut forms = vec![Value::symbol("begin")];
    while !parser.at_end() {
        forms.push(parser.parse_expr()?);
    }
    trace!(forms = forms.len() - 1, "parsed program");
    Ok(Value::from_vec(forms))
}
