use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Comment,
    EmptyList,
    True,
    False,
    Number,
    String,
    VectorOpen,
    ParenOpen,
    ParenClose,
    Quote,
    Quasiquote,
    UnquoteSplice,
    Unquote,
    ConsDot,
    Identifier,
    EndOfFile,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "line comment",
            TokenKind::EmptyList => "empty list",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::VectorOpen => "vector open",
            TokenKind::ParenOpen => "open paren",
            TokenKind::ParenClose => "close paren",
            TokenKind::Quote => "quote",
            TokenKind::Quasiquote => "backquote",
            TokenKind::UnquoteSplice => "list unquote",
            TokenKind::Unquote => "normal unquote",
            TokenKind::ConsDot => "cons dot",
            TokenKind::Identifier => "identifier",
            TokenKind::EndOfFile => "EOF",
        }
    }

    // consumed, never emitted
    fn is_skipped(self) -> bool { matches!(self, TokenKind::Whitespace | TokenKind::Comment) }
}

/// A token borrows its text from the source it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}: {}", self.kind.name(), self.text) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub offset: usize,
    pub rest: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LexError: no token matched at offset {}, remaining: {:?}", self.offset, self.rest)
    }
}

impl std::error::Error for LexError {}

enum Matcher {
    Literal(&'static str),
    Scan(fn(&str) -> Option<usize>),
}

impl Matcher {
    /// Length in bytes of the match anchored at the start of `rest`.
    fn matches(&self, rest: &str) -> Option<usize> {
        match *self {
            Matcher::Literal(lit) => rest.starts_with(lit).then_some(lit.len()),
            Matcher::Scan(scan) => scan(rest).filter(|len| *len > 0),
        }
    }
}

struct Rule {
    kind: TokenKind,
    matcher: Matcher,
}

// Priority order matters: `'()` before `'`, `,@` before `,`, `#(` before `(`.
static RULES: &[Rule] = &[
    Rule { kind: TokenKind::Whitespace, matcher: Matcher::Scan(scan_whitespace) },
    Rule { kind: TokenKind::Comment, matcher: Matcher::Scan(scan_comment) },
    Rule { kind: TokenKind::EmptyList, matcher: Matcher::Literal("'()") },
    Rule { kind: TokenKind::True, matcher: Matcher::Literal("#t") },
    Rule { kind: TokenKind::False, matcher: Matcher::Literal("#f") },
    Rule { kind: TokenKind::Number, matcher: Matcher::Scan(scan_number) },
    Rule { kind: TokenKind::String, matcher: Matcher::Scan(scan_string) },
    Rule { kind: TokenKind::VectorOpen, matcher: Matcher::Literal("#(") },
    Rule { kind: TokenKind::ParenOpen, matcher: Matcher::Literal("(") },
    Rule { kind: TokenKind::ParenClose, matcher: Matcher::Literal(")") },
    Rule { kind: TokenKind::Quote, matcher: Matcher::Literal("'") },
    Rule { kind: TokenKind::Quasiquote, matcher: Matcher::Literal("`") },
    Rule { kind: TokenKind::UnquoteSplice, matcher: Matcher::Literal(",@") },
    Rule { kind: TokenKind::Unquote, matcher: Matcher::Literal(",") },
    Rule { kind: TokenKind::ConsDot, matcher: Matcher::Scan(scan_cons_dot) },
    Rule { kind: TokenKind::Identifier, matcher: Matcher::Scan(scan_identifier) },
];

fn is_whitespace(b: u8) -> bool { matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c') }

fn is_initial(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'!' | b'$' | b'%' | b'&' | b'*' | b'/' | b':' | b'<' | b'=' | b'>' | b'?' | b'~' | b'_' | b'^' | b'+' | b'-')
}

fn is_subsequent(b: u8) -> bool { is_initial(b) || b.is_ascii_digit() || b == b'.' }

fn scan_whitespace(rest: &str) -> Option<usize> { Some(rest.bytes().take_while(|b| is_whitespace(*b)).count()) }

fn scan_comment(rest: &str) -> Option<usize> { rest.starts_with(';').then(|| rest.find('\n').unwrap_or(rest.len())) }

fn scan_number(rest: &str) -> Option<usize> { Some(rest.bytes().take_while(u8::is_ascii_digit).count()) }

/// `"` followed by any run of non-quote, non-backslash bytes or the escapes
/// `\"` and `\\`, closed by `"`.
fn scan_string(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    loop {
        match *bytes.get(i)? {
            b'"' => return Some(i + 1),
            b'\\' => match *bytes.get(i + 1)? {
                b'"' | b'\\' => i += 2,
                _ => return None,
            },
            _ => i += 1,
        }
    }
}

fn scan_cons_dot(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    match bytes {
        [b'.', next, ..] if is_whitespace(*next) => Some(2),
        _ => None,
    }
}

fn scan_identifier(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    if !is_initial(*bytes.first()?) {
        return None;
    }
    Some(1 + bytes[1..].iter().take_while(|b| is_subsequent(**b)).count())
}

/// Split `src` into tokens. The stream always ends with a single `EndOfFile`.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    'scan: while offset < src.len() {
        let rest = &src[offset..];
        for rule in RULES {
            if let Some(len) = rule.matcher.matches(rest) {
                if !rule.kind.is_skipped() {
                    tokens.push(Token {
                        kind: rule.kind,
                        text: &rest[..len],
                        offset,
                    });
                }
                offset += len;
                // restart from the highest-priority rule
                continue 'scan;
            }
        }
        return Err(LexError {
            offset,
            rest: rest.chars().take(24).collect(),
        });
    }

    tokens.push(Token {
        kind: TokenKind::EndOfFile,
        text: "",
        offset: src.len(),
    });
    trace!(count = tokens.len(), "tokenized input");
    Ok(tokens)
}
