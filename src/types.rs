use crate::evaluator::EvalResult;
use crate::number::Number;
use crate::source::Span;
use std::fmt; // For custom display formatting

/// One parsed expression together with the source span it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub kind: Sexpr, // The actual S-expression data
    pub span: Span,  // The source span it covers
}

impl Term {
    pub fn new(kind: Sexpr, span: Span) -> Self {
        Term { kind, span }
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Term::new(Sexpr::Symbol(name.into()), span)
    }

    pub fn new_number(number: Number, span: Span) -> Self {
        Term::new(Sexpr::Number(number), span)
    }

    pub fn new_list(elements: Vec<Term>, span: Span) -> Self {
        Term::new(Sexpr::List(elements), span)
    }

    /// The symbol name, if this term is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            Sexpr::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to Sexpr's Display implementation
        write!(f, "{}", self.kind)
    }
}

/// The shape of a parsed expression. Lists carry both data and call syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Symbol(String),  // e.g., +, variable-name, quote
    Number(Number),  // 42 or 4.2
    List(Vec<Term>), // e.g., (+ 1 2), (define x 10), ()
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::Number(n) => write!(f, "{}", n),
            Sexpr::List(list) => write_list(f, list),
        }
    }
}

/// The result of evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Number),
    Symbol(String), // Only reachable through quote
    Boolean(bool),  // Produced by comparisons and predicates
    List(Vec<Value>),
    Procedure(Procedure),
    Void, // Result of define; never printed by the loops
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(Number::Integer(_)) => "integer",
            Value::Number(Number::Float(_)) => "float",
            Value::Symbol(_) => "symbol",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Procedure(_) => "procedure",
            Value::Void => "void",
        }
    }

    /// Only boolean false is falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Structural equality used by `eq`: numbers compare by value, so an
    /// integer equals a float of the same magnitude.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.numeric_eq(*b),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
            }
            (a, b) => a == b,
        }
    }
}

// Quoting turns a term into data without evaluating any of it.
impl From<&Term> for Value {
    fn from(term: &Term) -> Self {
        match &term.kind {
            Sexpr::Symbol(s) => Value::Symbol(s.clone()),
            Sexpr::Number(n) => Value::Number(*n),
            Sexpr::List(elements) => Value::List(elements.iter().map(Value::from).collect()),
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        Value::Number(number)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// The printer: the inverse of parsing for symbols, numbers and lists.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::List(list) => write_list(f, list),
            Value::Procedure(procedure) => write!(f, "{}", procedure),
            Value::Void => write!(f, "#<void>"),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "(")?;
    let mut first = true;
    for item in items {
        if !first {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
        first = false;
    }
    write!(f, ")")
}

/// Primitives receive their evaluated arguments and the span of the call.
pub type PrimitiveFunc = fn(Vec<Value>, Span) -> EvalResult;

#[derive(Clone)] // Need Clone for Value::Procedure
pub enum Procedure {
    Primitive(PrimitiveFunc, &'static str), // The function pointer and its name (for display/debug)
}

impl Procedure {
    pub fn name(&self) -> &str {
        match self {
            Procedure::Primitive(_, name) => name,
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Primitive(_, name) => write!(f, "Primitive({})", name),
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Primitive(_, name) => write!(f, "#<primitive:{}>", name),
        }
    }
}

// Function pointers don't compare reliably, so primitives are equal by name.
impl PartialEq for Procedure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Procedure::Primitive(_, n1), Procedure::Primitive(_, n2)) => n1 == n2,
        }
    }
}
