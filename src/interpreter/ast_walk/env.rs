use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use crate::interpreter::ast_walk::value::Value;
use crate::interpreter::ast_walk::{RuntimeError, RuntimeErrorKind as Kind, PRIMITIVES};
use crate::runtime_error;

/// Where `write` sends its text. Every frame of a chain shares the root's.
pub type Output = Rc<RefCell<dyn Write>>;

/// One frame of the scope chain. Frames are shared through `Rc<RefCell<_>>`
/// and never copied; a closure keeps the frame it was created in alive.
pub struct Env {
    pub parent: Option<Rc<RefCell<Env>>>,
    pub values: HashMap<Rc<str>, Value>,
    pub output: Output,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.parent {
            Some(ref parent) => write!(f, "<Env {} {:?}>", self.values.len(), parent.borrow()),
            None => write!(f, "<Env {}>", self.values.len()),
        }
    }
}

impl Env {
    /// The distinguished root frame, holding every primitive and special form.
    pub fn new_root() -> Rc<RefCell<Env>> { Env::new_root_with_output(Rc::new(RefCell::new(io::stdout()))) }

    pub fn new_root_with_output(output: Output) -> Rc<RefCell<Env>> {
        let mut env = Env {
            parent: None,
            values: HashMap::new(),
            output,
        };

        for (name, primitive) in PRIMITIVES.entries() {
            env.define(Rc::from(*name), Value::Primitive(*primitive));
        }
        Rc::new(RefCell::new(env))
    }

    pub fn new_child(parent: Rc<RefCell<Env>>) -> Rc<RefCell<Env>> {
        let output = parent.borrow().output.clone();
        let env = Env {
            parent: Some(parent),
            values: HashMap::new(),
            output,
        };
        Rc::new(RefCell::new(env))
    }

    /// Empties `frame` when nothing but the caller's handle and closures bound
    /// in the frame itself still point at it. Those closures capture the frame
    /// they are stored in, so without this the pair keeps itself alive after
    /// the call that made it has returned.
    ///
    /// Only closures owned solely by this frame are counted. Any other holder
    /// (a returned closure, a list, a child frame) leaves the frame alone.
    pub fn release(frame: &Rc<RefCell<Env>>) -> bool {
        let self_owned = frame
            .borrow()
            .values
            .values()
            .filter(|val| matches!(val, Value::Closure(c) if Rc::ptr_eq(&c.env, frame) && Rc::strong_count(c) == 1))
            .count();
        if self_owned == 0 || Rc::strong_count(frame) != 1 + self_owned {
            return false;
        }
        let values = std::mem::take(&mut frame.borrow_mut().values);
        drop(values);
        true
    }

    // Insert or replace at the current level only; ancestors are never touched.
    pub fn define(&mut self, key: Rc<str>, value: Value) { self.values.insert(key, value); }

    pub fn lookup(&self, key: &str, traverse: bool) -> Result<Value, RuntimeError> {
        match self.values.get(key) {
            Some(val) => Ok(val.clone()),
            None => match self.parent {
                Some(ref parent) if traverse => parent.borrow().lookup(key, true),
                _ => runtime_error!(Kind::UnboundSymbol, "Unbound symbol: {}", key),
            },
        }
    }

    pub fn remove(&mut self, key: &str) { self.values.remove(key); }
}
