use std::mem;
use std::rc::Rc;

use crate::interpreter::ast_walk::value::Value;
use crate::interpreter::ast_walk::{RuntimeError, RuntimeErrorKind as Kind};

use crate::runtime_error;

/// A cons cell. A proper list is a right spine of pairs ending in `Value::Empty`.
#[derive(Clone, PartialEq, Debug)]
pub struct Pair {
    pub first: Value,
    pub rest: Value,
}

// Unlinks the spine one cell at a time; the derived drop would recurse once
// per element and overflow the stack on long lists.
impl Drop for Pair {
    fn drop(&mut self) {
        let mut rest = mem::replace(&mut self.rest, Value::Empty);
        while let Value::Pair(cell) = rest {
            rest = match Rc::try_unwrap(cell) {
                Ok(mut pair) => mem::replace(&mut pair.rest, Value::Empty),
                Err(_) => break,
            };
        }
    }
}

impl Value {
    pub fn from_vec(src: Vec<Value>) -> Value { Value::from_vec_with_tail(src, Value::Empty) }

    /// (a b c) . tail
    pub fn from_vec_with_tail(src: Vec<Value>, tail: Value) -> Value { src.into_iter().rfold(tail, |acc, val| Value::cons(val, acc)) }

    pub fn is_empty(&self) -> bool { matches!(self, Value::Empty) }

    /// Proper-list length, `None` for anything that is not `Empty`-terminated.
    pub fn list_len(&self) -> Option<usize> {
        let mut iter = self.iter();
        let len = iter.by_ref().count();
        iter.tail().is_empty().then_some(len)
    }

    pub fn is_list(&self) -> bool { self.list_len().is_some() }

    pub fn car(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Pair(pair) => Ok(pair.first.clone()),
            _ => runtime_error!(Kind::WrongType, "Can't run car on a non-pair: {:?}", self),
        }
    }

    pub fn cdr(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Pair(pair) => Ok(pair.rest.clone()),
            _ => runtime_error!(Kind::WrongType, "Can't run cdr on a non-pair: {:?}", self),
        }
    }

    /// Elements of a proper list; improper lists are rejected.
    pub fn to_vec(&self) -> Result<Vec<Value>, RuntimeError> {
        let mut iter = self.iter();
        let items: Vec<Value> = iter.by_ref().cloned().collect();
        if !iter.tail().is_empty() {
            runtime_error!(Kind::MalformedArguments, "Expected a proper list: {:?}", self)
        }
        Ok(items)
    }

    pub fn iter(&self) -> ListIter<'_> { ListIter(self) }
}

/// Walks the `first` slots of a pair chain. Stops at the first non-pair,
/// which is then available from `tail()`.
pub struct ListIter<'a>(&'a Value);

impl<'a> ListIter<'a> {
    pub fn tail(&self) -> &'a Value { self.0 }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self.0 {
            Value::Pair(pair) => {
                self.0 = &pair.rest;
                Some(&pair.first)
            }
            _ => None,
        }
    }
}
