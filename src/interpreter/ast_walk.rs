use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

mod builtins;
mod env;
mod error;
pub mod json;
mod list;
mod match_list;
mod procedure;
mod special;
mod value;

#[cfg(test)]
mod tests;

pub use builtins::PRIMITIVES;
pub use env::{Env, Output};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use list::{ListIter, Pair};
pub use procedure::{Arity, Closure, Primitive, PrimitiveFn};
pub use value::Value;

use crate::runtime_error;
use error::RuntimeErrorKind as Kind;

/// Owns the root environment. Everything evaluated through one interpreter
/// shares its top-level bindings.
#[derive(Clone)]
pub struct Interpreter {
    root: Rc<RefCell<Env>>,
}

impl Default for Interpreter {
    fn default() -> Self { Interpreter::new() }
}

impl Interpreter {
    pub fn new() -> Interpreter { Interpreter { root: Env::new_root() } }

    /// `write` goes to `output` instead of stdout.
    pub fn with_output(output: Output) -> Interpreter { Interpreter { root: Env::new_root_with_output(output) } }

    pub fn root(&self) -> &Rc<RefCell<Env>> { &self.root }

    pub fn run(&self, program: &Value) -> Result<Value, RuntimeError> { eval(program, &self.root) }
}

// Top-level recursive functions capture the root they are bound in.
impl Drop for Interpreter {
    fn drop(&mut self) { Env::release(&self.root); }
}

pub fn eval(expr: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    match expr {
        Value::Symbol(name) => env.borrow().lookup(name, true),
        Value::Pair(pair) => eval_application(&pair.first, &pair.rest, env),
        _ => Ok(expr.clone()),
    }
}

/// Each element evaluated left to right into a fresh list. An improper tail
/// is evaluated too and kept, so the caller can reject the shape.
pub fn eval_args(list: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    let mut iter = list.iter();
    let items = iter.by_ref().map(|expr| eval(expr, env)).collect::<Result<Vec<Value>, RuntimeError>>()?;
    let tail = match iter.tail() {
        Value::Empty => Value::Empty,
        tail => eval(tail, env)?,
    };
    Ok(Value::from_vec_with_tail(items, tail))
}

fn eval_application(operator: &Value, operands: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    let callable = eval(operator, env)?;
    let special = match &callable {
        Value::Primitive(p) => p.special,
        Value::Closure(_) => false,
        _ => runtime_error!(Kind::NotProcedure, "Can't apply a non-procedure: {:?}", callable),
    };

    let args = match special {
        true => operands.clone(),
        false => eval_args(operands, env)?,
    };
    if !args.is_list() {
        runtime_error!(Kind::MalformedArguments, "Malformed argument list: {:?}", args);
    }

    trace!("apply {} to {:?}", operator, args);
    apply(&callable, &args, env)
}

/// `args` must be a proper list.
pub fn apply(callable: &Value, args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    let actual = args.list_len().unwrap_or(0);
    let arity = match callable {
        Value::Primitive(p) => p.arity,
        Value::Closure(c) => c.arity(),
        _ => runtime_error!(Kind::NotProcedure, "Can't apply a non-procedure: {:?}", callable),
    };
    match arity {
        Arity::Exactly(expected) if !arity.accepts(actual) => runtime_error!(
            Kind::ArityMismatch { expected, actual },
            "Arity mismatch calling {}: expected {}, got {}",
            callable,
            expected,
            actual
        ),
        _ => {}
    }

    match callable {
        Value::Primitive(p) => (p.func)(args, env),
        Value::Closure(closure) => {
            let frame = Env::new_child(closure.env.clone());
            {
                let mut frame = frame.borrow_mut();
                match closure.variadic {
                    true => {
                        for name in &closure.params {
                            frame.define(name.clone(), args.clone());
                        }
                    }
                    false => {
                        for (name, arg) in closure.params.iter().zip(args.iter()) {
                            frame.define(name.clone(), arg.clone());
                        }
                    }
                }
            }
            let result = eval(&closure.body, &frame);
            if Env::release(&frame) {
                trace!("released call frame of {}", callable);
            }
            result
        }
        _ => runtime_error!(Kind::NotProcedure, "Can't apply a non-procedure: {:?}", callable),
    }
}
