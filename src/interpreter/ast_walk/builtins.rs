use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use phf::phf_map;

use crate::interpreter::ast_walk::special;
use crate::interpreter::ast_walk::{Arity, Env, Primitive, RuntimeError, RuntimeErrorKind as Kind, Value};
use crate::{match_list, runtime_error};

macro_rules! primitive {
    ($name:expr, $arity:expr, $func:expr) => {
        Primitive { name: $name, arity: $arity, special: false, func: $func }
    };
    ($name:expr, $arity:expr, $func:expr, special) => {
        Primitive { name: $name, arity: $arity, special: true, func: $func }
    };
}

/// Everything installed into the root environment.
pub static PRIMITIVES: phf::Map<&'static str, Primitive> = phf_map! {
    "quote" => primitive!("quote", Arity::Exactly(1), special::quote, special),
    "if" => primitive!("if", Arity::Exactly(3), special::if_, special),
    "define" => primitive!("define", Arity::Variadic, special::define, special),
    "set!" => primitive!("set!", Arity::Variadic, special::define, special),
    "lambda" => primitive!("lambda", Arity::Variadic, special::lambda, special),
    "and" => primitive!("and", Arity::Variadic, special::and, special),
    "or" => primitive!("or", Arity::Variadic, special::or, special),
    "cond" => primitive!("cond", Arity::Variadic, special::cond, special),
    "quasiquote" => primitive!("quasiquote", Arity::Exactly(1), special::quasiquote, special),

    "begin" => primitive!("begin", Arity::Variadic, begin),
    "write" => primitive!("write", Arity::Exactly(1), write),
    "eval" => primitive!("eval", Arity::Exactly(1), eval),
    "apply" => primitive!("apply", Arity::Exactly(2), apply),
    "cons" => primitive!("cons", Arity::Exactly(2), cons),
    "car" => primitive!("car", Arity::Exactly(1), car),
    "cdr" => primitive!("cdr", Arity::Exactly(1), cdr),
    "length" => primitive!("length", Arity::Exactly(1), length),
    "list" => primitive!("list", Arity::Variadic, list),
    "null?" => primitive!("null?", Arity::Exactly(1), is_null),
    "list?" => primitive!("list?", Arity::Exactly(1), is_list),
    "number?" => primitive!("number?", Arity::Exactly(1), is_number),
    "procedure?" => primitive!("procedure?", Arity::Exactly(1), is_procedure),
    "function?" => primitive!("function?", Arity::Exactly(1), is_procedure),
    "equal?" => primitive!("equal?", Arity::Exactly(2), equal),
    "=" => primitive!("=", Arity::Exactly(2), equal),
    "not" => primitive!("not", Arity::Exactly(1), not),
    "+" => primitive!("+", Arity::Variadic, add),
    "-" => primitive!("-", Arity::Variadic, sub),
    "*" => primitive!("*", Arity::Variadic, mul),
};

type Args<'a> = &'a Value;
type Scope<'a> = &'a Rc<RefCell<Env>>;

// Arguments were already evaluated left to right, so the last one is the result.
fn begin(args: Args, _env: Scope) -> Result<Value, RuntimeError> { Ok(args.iter().last().cloned().unwrap_or(Value::Empty)) }

fn write(args: Args, env: Scope) -> Result<Value, RuntimeError> {
    let val = match_list!(args, [val] => val.clone())?;
    let output = env.borrow().output.clone();
    if let Err(e) = writeln!(output.borrow_mut(), "{}", val) {
        runtime_error!(Kind::Io, "write failed: {}", e);
    }
    Ok(Value::Empty)
}

fn eval(args: Args, env: Scope) -> Result<Value, RuntimeError> {
    let expr = match_list!(args, [expr] => expr.clone())?;
    super::eval(&expr, env)
}

fn apply(args: Args, env: Scope) -> Result<Value, RuntimeError> {
    let (callable, arguments) = match_list!(args, [f, a] => (f.clone(), a.clone()))?;
    if !arguments.is_list() {
        runtime_error!(Kind::MalformedArguments, "apply needs a proper argument list: {:?}", arguments);
    }
    if !callable.is_procedure() {
        runtime_error!(Kind::NotProcedure, "Can't apply {:?}", callable);
    }
    super::apply(&callable, &arguments, env)
}

fn cons(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [a, b] => Value::cons(a.clone(), b.clone())) }

fn car(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [pair] => pair.car()?) }

fn cdr(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [pair] => pair.cdr()?) }

fn length(args: Args, _env: Scope) -> Result<Value, RuntimeError> {
    match_list!(args, [list] => match list.list_len() {
        Some(len) => Value::Integer(len as i64),
        None => runtime_error!(Kind::WrongType, "length of an improper list: {:?}", list),
    })
}

fn list(args: Args, _env: Scope) -> Result<Value, RuntimeError> { Ok(args.clone()) }

fn is_null(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [val] => Value::from(val.is_empty())) }

fn is_list(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [val] => Value::from(val.is_list())) }

fn is_number(args: Args, _env: Scope) -> Result<Value, RuntimeError> {
    match_list!(args, [val] => Value::from(matches!(val, Value::Integer(_))))
}

fn is_procedure(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [val] => Value::from(val.is_procedure())) }

fn equal(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [a, b] => Value::from(a == b)) }

fn not(args: Args, _env: Scope) -> Result<Value, RuntimeError> { match_list!(args, [val] => Value::from(!val.is_truthy())) }

fn overflow(op: &str) -> RuntimeError { RuntimeError::new(Kind::Overflow, format!("Integer overflow in {}", op)) }

fn add(args: Args, _env: Scope) -> Result<Value, RuntimeError> {
    let sum = args.iter().try_fold(0i64, |acc, val| acc.checked_add(val.as_integer()?).ok_or_else(|| overflow("+")))?;
    Ok(Value::from(sum))
}

fn sub(args: Args, _env: Scope) -> Result<Value, RuntimeError> {
    let mut iter = args.iter();
    let first = match iter.next() {
        Some(val) => val.as_integer()?,
        None => runtime_error!(Kind::ArityMismatch { expected: 1, actual: 0 }, "- needs at least one argument"),
    };
    if args.list_len() == Some(1) {
        return first.checked_neg().map(Value::Integer).ok_or_else(|| overflow("-"));
    }
    let diff = iter.try_fold(first, |acc, val| acc.checked_sub(val.as_integer()?).ok_or_else(|| overflow("-")))?;
    Ok(Value::Integer(diff))
}

fn mul(args: Args, _env: Scope) -> Result<Value, RuntimeError> {
    let product = args.iter().try_fold(1i64, |acc, val| acc.checked_mul(val.as_integer()?).ok_or_else(|| overflow("*")))?;
    Ok(Value::Integer(product))
}
