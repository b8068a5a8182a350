use std::cell::RefCell;
use std::rc::Rc;

use crate::interpreter::ast_walk::{eval, Closure, Env, RuntimeError, RuntimeErrorKind as Kind, Value};
use crate::{match_list, runtime_error};

// Special forms receive their operands unevaluated.

pub fn quote(args: &Value, _env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> { match_list!(args, [expr] => expr.clone()) }

pub fn if_(args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    let (cond, then, otherwise) = match_list!(args, [c, t, o] => (c.clone(), t.clone(), o.clone()))?;
    match eval(&cond, env)?.is_truthy() {
        true => eval(&then, env),
        false => eval(&otherwise, env),
    }
}

/// Several body forms run as `(begin body...)`.
fn body_of(forms: &Value) -> Result<Value, RuntimeError> {
    match forms.list_len() {
        Some(1) => forms.car(),
        Some(0) => runtime_error!(Kind::BadSyntax, "Missing body"),
        Some(_) => Ok(Value::cons(Value::symbol("begin"), forms.clone())),
        None => runtime_error!(Kind::BadSyntax, "Body must be a proper list: {:?}", forms),
    }
}

/// `(define name expr)` or `(define (name . arglist) body...)`. Binds in the
/// current frame only and yields `()`.
pub fn define(args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    let (target, rest) = match_list!(args, head: target, tail: rest => (target.clone(), rest.clone()))?;
    match target {
        Value::Symbol(name) => {
            let expr = match_list!(&rest, [expr] => expr.clone())?;
            let value = eval(&expr, env)?;
            env.borrow_mut().define(name, value);
        }
        Value::Pair(signature) => {
            let name = signature.first.as_symbol()?.clone();
            let closure = Closure::new(&signature.rest, body_of(&rest)?, env.clone())?;
            env.borrow_mut().define(name, Value::Closure(Rc::new(closure)));
        }
        _ => runtime_error!(Kind::BadSyntax, "Can't define {:?}", target),
    }
    Ok(Value::Empty)
}

pub fn lambda(args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    let (arglist, body) = match_list!(args, head: arglist, tail: body => (arglist.clone(), body_of(body)?))?;
    Ok(Value::Closure(Rc::new(Closure::new(&arglist, body, env.clone())?)))
}

pub fn and(args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    for expr in args.iter() {
        if !eval(expr, env)?.is_truthy() {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

pub fn or(args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    for expr in args.iter() {
        if eval(expr, env)?.is_truthy() {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

pub fn cond(args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    for clause in args.iter() {
        let (test, body) = match clause {
            Value::Pair(pair) => (&pair.first, &pair.rest),
            _ => runtime_error!(Kind::BadSyntax, "Bad cond clause: {:?}", clause),
        };
        let matched = match test {
            Value::Symbol(s) if &**s == "else" => true,
            _ => eval(test, env)?.is_truthy(),
        };
        if matched {
            return eval(&Value::cons(Value::symbol("begin"), body.clone()), env);
        }
    }
    Ok(Value::Empty)
}

pub fn quasiquote(args: &Value, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    let template = match_list!(args, [template] => template.clone())?;
    expand(&template, 0, env)
}

fn wrap(keyword: &str, val: Value) -> Value { Value::from_vec(vec![Value::symbol(keyword), val]) }

// At depth 0, (unquote x) is evaluated and (unquote-splicing x) is spliced
// into the enclosing list. A nested quasiquote raises the depth and an
// unquote inside it lowers it again; forms above depth 0 are copied.
fn expand(template: &Value, depth: usize, env: &Rc<RefCell<Env>>) -> Result<Value, RuntimeError> {
    if let Some(expr) = template.form_argument("unquote") {
        return match depth {
            0 => eval(expr, env),
            _ => Ok(wrap("unquote", expand(expr, depth - 1, env)?)),
        };
    }
    if let Some(expr) = template.form_argument("unquote-splicing") {
        if depth == 0 {
            runtime_error!(Kind::BadSyntax, "unquote-splicing outside of a list: {:?}", template);
        }
        return Ok(wrap("unquote-splicing", expand(expr, depth - 1, env)?));
    }
    if let Some(expr) = template.form_argument("quasiquote") {
        return Ok(wrap("quasiquote", expand(expr, depth + 1, env)?));
    }
    let Value::Pair(_) = template else {
        return Ok(template.clone());
    };

    let mut items = Vec::new();
    let mut cur = template;
    let tail = loop {
        match cur {
            // `(a . ,b)` reads as (a unquote b)
            Value::Pair(_) if cur.form_argument("unquote").is_some() || cur.form_argument("quasiquote").is_some() => {
                break expand(cur, depth, env)?
            }
            Value::Pair(pair) => {
                match pair.first.form_argument("unquote-splicing") {
                    Some(expr) if depth == 0 => items.extend(eval(expr, env)?.to_vec()?),
                    _ => items.push(expand(&pair.first, depth, env)?),
                }
                cur = &pair.rest;
            }
            other => break expand(other, depth, env)?,
        }
    };
    Ok(Value::from_vec_with_tail(items, tail))
}
