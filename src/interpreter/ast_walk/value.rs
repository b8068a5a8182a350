use std::fmt;
use std::rc::Rc;

use crate::interpreter::ast_walk::{Closure, Pair, Primitive, RuntimeError, RuntimeErrorKind as Kind};
use crate::runtime_error;

/// The single recursive type shared by source code and run-time data.
///
/// `Empty`, `Boolean(true)` and `Boolean(false)` carry no payload, so each has
/// exactly one representation and costs no allocation.
#[derive(Clone)]
pub enum Value {
    Pair(Rc<Pair>),
    Integer(i64),
    Text(Rc<[u8]>),
    Symbol(Rc<str>),
    Boolean(bool),
    Empty,

    Closure(Rc<Closure>),
    Primitive(Primitive),
}

impl Value {
    pub fn cons(first: Value, rest: Value) -> Value { Value::Pair(Rc::new(Pair { first, rest })) }

    pub fn symbol(name: &str) -> Value { Value::Symbol(Rc::from(name)) }

    pub fn text(bytes: &[u8]) -> Value { Value::Text(Rc::from(bytes)) }

    /// Only `#f` is logically false; `'()` counts as true.
    pub fn is_truthy(&self) -> bool { !matches!(self, Value::Boolean(false)) }

    pub fn is_procedure(&self) -> bool { matches!(self, Value::Closure(_) | Value::Primitive(_)) }

    pub fn as_symbol(&self) -> Result<&Rc<str>, RuntimeError> {
        match self {
            Value::Symbol(s) => Ok(s),
            _ => runtime_error!(Kind::WrongType, "Expected a symbol value: {:?}", self),
        }
    }

    pub fn as_integer(&self) -> Result<i64, RuntimeError> {
        match *self {
            Value::Integer(i) => Ok(i),
            _ => runtime_error!(Kind::WrongType, "Expected an integer value: {:?}", self),
        }
    }

    /// `(keyword X)` => `Some(X)`
    pub fn form_argument(&self, keyword: &str) -> Option<&Value> {
        match self {
            Value::Pair(pair) => match (&pair.first, &pair.rest) {
                (Value::Symbol(s), Value::Pair(rest)) if &**s == keyword && matches!(rest.rest, Value::Empty) => Some(&rest.first),
                _ => None,
            },
            _ => None,
        }
    }

    fn write_to(&self, f: &mut fmt::Formatter, debug: bool) -> fmt::Result {
        match self {
            Value::Pair(_) => {
                write!(f, "(")?;
                let mut cur = self;
                let mut first = true;
                loop {
                    match cur {
                        Value::Pair(pair) => {
                            if !first {
                                write!(f, " ")?;
                            }
                            pair.first.write_to(f, debug)?;
                            first = false;
                            cur = &pair.rest;
                        }
                        Value::Empty => break,
                        tail => {
                            write!(f, " . ")?;
                            tail.write_to(f, debug)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Integer(val) => write!(f, "{}", val),
            Value::Text(bytes) if debug => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Value::Text(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Value::Symbol(name) => write!(f, "{}", name),
            Value::Boolean(val) => write!(f, "#{}", if *val { "t" } else { "f" }),
            Value::Empty => write!(f, "()"),
            Value::Closure(_) => write!(f, "#<procedure>"),
            Value::Primitive(p) => write!(f, "#<procedure:{}>", p.name),
        }
    }
}

/// Structural equality, as used by `equal?`: procedures compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Pair(_), Value::Pair(_)) => {
                // iterative along the spine, recursive only into elements
                let (mut a, mut b) = (self, other);
                loop {
                    match (a, b) {
                        (Value::Pair(x), Value::Pair(y)) => {
                            if Rc::ptr_eq(x, y) {
                                return true;
                            }
                            if x.first != y.first {
                                return false;
                            }
                            a = &x.rest;
                            b = &y.rest;
                        }
                        _ => return a == b,
                    }
                }
            }
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Empty, Value::Empty) => true,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { self.write_to(f, false) }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { self.write_to(f, true) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value { Value::Integer(i) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value { Value::Boolean(b) }
}
