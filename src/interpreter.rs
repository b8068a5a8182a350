pub mod ast_walk;

use std::fmt;

use tracing::debug;

use crate::interpreter::ast_walk::{RuntimeError, Value};
use crate::reader::lexer::{self, LexError};
use crate::reader::parser::{self, ParseError};

static PRELUDE: &str = include_str!("interpreter/prelude.scm");

/// Whatever stopped a piece of source from producing a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lex(LexError),
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lex(e) => write!(f, "{}", e),
            Error::Parse(e) => write!(f, "{}", e),
            Error::Runtime(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self { Error::Lex(e) }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self { Error::Parse(e) }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self { Error::Runtime(e) }
}

pub fn parse_code(src: &str) -> Result<Value, Error> {
    let tokens = lexer::tokenize(src)?;
    let program = parser::parse(&tokens)?;
    Ok(program)
}

pub fn new() -> Interpreter { Interpreter::new() }

#[derive(Clone, Default)]
pub struct Interpreter {
    inner: ast_walk::Interpreter,
}

impl Interpreter {
    /// A fresh root environment holding only the primitives.
    pub fn new() -> Interpreter {
        Interpreter {
            inner: ast_walk::Interpreter::new(),
        }
    }

    /// `new()` plus the Scheme-level prelude (`map`, `filter`, `cadr`, ...).
    pub fn with_prelude() -> Result<Interpreter, Error> {
        let interpreter = Interpreter::new();
        for form in parse_code(PRELUDE)?.cdr()?.iter() {
            debug!("prelude: {}", form);
            interpreter.run(form)?;
        }
        Ok(interpreter)
    }

    pub fn root(&self) -> &std::rc::Rc<std::cell::RefCell<ast_walk::Env>> { self.inner.root() }

    pub fn run(&self, program: &Value) -> Result<Value, Error> { Ok(self.inner.run(program)?) }

    pub fn execute(&self, input: &str) -> Result<Value, Error> {
        let program = parse_code(input)?;
        debug!("evaluating {}", program);
        self.run(&program)
    }
}
