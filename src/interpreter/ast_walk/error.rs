use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UnboundSymbol,
    NotProcedure,
    ArityMismatch { expected: usize, actual: usize },
    MalformedArguments,
    WrongType,
    Overflow,
    BadSyntax,
    Io,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> RuntimeError {
        RuntimeError {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "RuntimeError: {}", self.message) }
}

impl std::error::Error for RuntimeError {}

#[macro_export]
macro_rules! runtime_error {
    ($kind:expr, $($arg:tt)*) => (
        return Err($crate::interpreter::ast_walk::RuntimeError { kind: $kind, message: format!($($arg)*) })
    )
}
