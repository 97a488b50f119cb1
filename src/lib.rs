//! A small interpreter for a symbolic-expression language.
//!
//! Text flows through [`tokenize`], the [`Parser`], [`evaluate`] and back out
//! through [`render`]:
//!
//! ```
//! let mut env = lispy::new_root_environment();
//! let term = lispy::parse("(* 2 (+ 1 2))").unwrap();
//! let value = lispy::evaluate(&term, &mut env).unwrap();
//! assert_eq!(lispy::render(&value), "6");
//! ```
//!
//! An [`Environment`] is single-threaded: it is neither `Send` nor `Sync` and
//! offers no internal locking, so each thread needs its own interpreter.

// Declare modules publicly so they are part of the library interface
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod number;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod types;

pub use environment::{EnvError, Environment};
pub use evaluator::{EvalError, EvalResult, evaluate, special_form_identifiers};
pub use lexer::{Token, TokenKind, tokenize};
pub use number::Number;
pub use parser::{MAX_NESTING_DEPTH, ParseError, Parser, parse_all, parse_str};
pub use source::Span;
pub use types::{Procedure, Sexpr, Term, Value};

/// Any failure from running text end to end.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Parses exactly one expression from `text`.
pub fn parse(text: &str) -> Result<Term, ParseError> {
    parse_str(text)
}

/// Renders a value in the language's own notation.
pub fn render(value: &Value) -> String {
    value.to_string()
}

/// The root environment, holding every primitive.
pub fn new_root_environment() -> Environment {
    Environment::new_global_populated()
}

/// Parses and evaluates one expression against `env`.
pub fn eval_str(text: &str, env: &mut Environment) -> Result<Value, Error> {
    let term = parse(text)?;
    Ok(evaluate(&term, env)?)
}
