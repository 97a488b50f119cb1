use std::cmp::Ordering;

use crate::{EvalError, EvalResult, Number, Span, Value};

// Checks the argument count against a primitive's fixed arity and hands the
// arguments back as an array so callers can destructure them.
fn expect_args<const N: usize>(name: &str, args: Vec<Value>, span: Span) -> EvalResult<[Value; N]> {
    let got = args.len();
    <[Value; N]>::try_from(args).map_err(|_| EvalError::ArityMismatch {
        procedure: name.to_string(),
        expected: N,
        got,
        span,
    })
}

fn type_mismatch(name: &str, value: Value, span: Span) -> EvalError {
    EvalError::TypeMismatch {
        operation: name.to_string(),
        value,
        span,
    }
}

// Extracts a number from a Value or returns TypeMismatch error
fn expect_number(name: &str, value: Value, span: Span) -> EvalResult<Number> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(type_mismatch(name, other, span)),
    }
}

// cons cells are two-element lists
fn expect_pair(name: &str, value: Value, span: Span) -> EvalResult<[Value; 2]> {
    match value {
        Value::List(items) => {
            <[Value; 2]>::try_from(items).map_err(|items| type_mismatch(name, Value::List(items), span))
        }
        other => Err(type_mismatch(name, other, span)),
    }
}

fn binary_numbers(name: &str, args: Vec<Value>, span: Span) -> EvalResult<(Number, Number)> {
    let [left, right] = expect_args(name, args, span)?;
    Ok((
        expect_number(name, left, span)?,
        expect_number(name, right, span)?,
    ))
}

fn arithmetic(
    name: &str,
    args: Vec<Value>,
    span: Span,
    op: fn(Number, Number) -> Number,
) -> EvalResult {
    let (left, right) = binary_numbers(name, args, span)?;
    Ok(op(left, right).into())
}

// NaN compares as neither less, equal nor greater, so every test is false.
fn comparison(name: &str, args: Vec<Value>, span: Span, test: fn(Ordering) -> bool) -> EvalResult {
    let (left, right) = binary_numbers(name, args, span)?;
    Ok(left.compare(right).is_some_and(test).into())
}

// --- Arithmetic ---

pub fn prim_add(args: Vec<Value>, span: Span) -> EvalResult {
    arithmetic("+", args, span, Number::add)
}

pub fn prim_sub(args: Vec<Value>, span: Span) -> EvalResult {
    arithmetic("-", args, span, Number::sub)
}

pub fn prim_mul(args: Vec<Value>, span: Span) -> EvalResult {
    arithmetic("*", args, span, Number::mul)
}

pub fn prim_div(args: Vec<Value>, span: Span) -> EvalResult {
    let (left, right) = binary_numbers("/", args, span)?;
    left.div(right)
        .map(Value::from)
        .ok_or(EvalError::DivisionByZero(span))
}

// --- Comparison ---

pub fn prim_greater_than(args: Vec<Value>, span: Span) -> EvalResult {
    comparison(">", args, span, Ordering::is_gt)
}

pub fn prim_less_than(args: Vec<Value>, span: Span) -> EvalResult {
    comparison("<", args, span, Ordering::is_lt)
}

pub fn prim_greater_than_or_equals(args: Vec<Value>, span: Span) -> EvalResult {
    comparison(">=", args, span, Ordering::is_ge)
}

pub fn prim_less_than_or_equals(args: Vec<Value>, span: Span) -> EvalResult {
    comparison("<=", args, span, Ordering::is_le)
}

pub fn prim_eq(args: Vec<Value>, span: Span) -> EvalResult {
    let [left, right] = expect_args("eq", args, span)?;
    Ok(left.equals(&right).into())
}

// --- Pair Primitives ---

pub fn prim_cons(args: Vec<Value>, span: Span) -> EvalResult {
    // (cons a b) -> (a b)
    let [car, cdr] = expect_args("cons", args, span)?;
    Ok(Value::List(vec![car, cdr]))
}

pub fn prim_car(args: Vec<Value>, span: Span) -> EvalResult {
    let [pair] = expect_args("car", args, span)?;
    let [car, _] = expect_pair("car", pair, span)?;
    Ok(car)
}

pub fn prim_cdr(args: Vec<Value>, span: Span) -> EvalResult {
    let [pair] = expect_args("cdr", args, span)?;
    let [_, cdr] = expect_pair("cdr", pair, span)?;
    Ok(cdr)
}

// --- Type Predicates ---

pub fn prim_is_atom(args: Vec<Value>, span: Span) -> EvalResult {
    let [value] = expect_args("atom", args, span)?;
    Ok(Value::Boolean(matches!(
        value,
        Value::Number(_) | Value::Symbol(_) | Value::Boolean(_)
    )))
}
