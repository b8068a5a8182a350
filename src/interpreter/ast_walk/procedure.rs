use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::interpreter::ast_walk::env::Env;
use crate::interpreter::ast_walk::value::Value;
use crate::interpreter::ast_walk::{RuntimeError, RuntimeErrorKind as Kind};

use crate::runtime_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => n == count,
            Arity::Variadic => true,
        }
    }
}

/// Primitives receive their argument list (evaluated, or raw for special
/// forms) and the environment of the call site.
pub type PrimitiveFn = fn(&Value, &Rc<RefCell<Env>>) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
pub struct Primitive {
    pub name: &'static str,
    pub arity: Arity,
    pub special: bool,
    pub func: PrimitiveFn,
}

// identity of the callable; `=` and `equal?` share one function and compare equal
impl PartialEq for Primitive {
    fn eq(&self, other: &Primitive) -> bool { self.func as usize == other.func as usize }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "#<procedure:{}>", self.name) }
}

pub struct Closure {
    pub params: Vec<Rc<str>>,
    pub variadic: bool,
    pub body: Value,
    pub env: Rc<RefCell<Env>>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "#<procedure ({})>", self.params.join(" ")) }
}

impl Closure {
    /// `arglist` is either a proper list of symbols, or one symbol that
    /// collects every argument.
    pub fn new(arglist: &Value, body: Value, env: Rc<RefCell<Env>>) -> Result<Closure, RuntimeError> {
        let (params, variadic) = match arglist {
            Value::Symbol(name) => (vec![name.clone()], true),
            _ => {
                if !arglist.is_list() {
                    runtime_error!(Kind::BadSyntax, "Lambda arglist must be a proper list or a symbol: {:?}", arglist);
                }
                let params = arglist
                    .iter()
                    .map(|v| match v {
                        Value::Symbol(name) => Ok(name.clone()),
                        _ => Err(RuntimeError::new(Kind::BadSyntax, format!("Lambda arguments must be symbols: {:?}", v))),
                    })
                    .collect::<Result<Vec<Rc<str>>, RuntimeError>>()?;
                (params, false)
            }
        };
        Ok(Closure { params, variadic, body, env })
    }

    pub fn arity(&self) -> Arity {
        match self.variadic {
            true => Arity::Variadic,
            false => Arity::Exactly(self.params.len()),
        }
    }
}
