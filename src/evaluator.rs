use log::trace;

use crate::environment::{EnvError, Environment};
use crate::source::Span;
use crate::types::{Procedure, Sexpr, Term, Value};
use std::collections::HashSet;

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    EnvError(#[from] EnvError), // Errors from environment lookup
    #[error("Evaluation Error: Division by zero")]
    DivisionByZero(Span),
    #[error("Evaluation Error: '{procedure}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        procedure: String,
        expected: usize,
        got: usize,
        span: Span,
    },
    #[error("Evaluation Error: '{operation}' cannot be applied to {kind} {value}", kind = .value.type_name())]
    TypeMismatch {
        operation: String,
        value: Value,
        span: Span,
    },
    #[error("Evaluation Error: Malformed expression - {message}")]
    MalformedExpression { message: String, span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::EnvError(EnvError::UnboundSymbol(_, span))
            | EvalError::DivisionByZero(span)
            | EvalError::ArityMismatch { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::MalformedExpression { span, .. } => *span,
        }
    }

    fn malformed(message: impl Into<String>, span: Span) -> Self {
        EvalError::MalformedExpression {
            message: message.into(),
            span,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Handler for a special form: the unevaluated operands, the environment and
/// the span of the whole form.
type SpecialForm = fn(&[Term], &mut Environment, Span) -> EvalResult;

const SPECIAL_FORMS: &[(&str, SpecialForm)] = &[
    ("quote", evaluate_quote as SpecialForm),
    ("if", evaluate_if as SpecialForm),
    ("define", evaluate_define as SpecialForm),
];

fn special_form(name: &str) -> Option<SpecialForm> {
    SPECIAL_FORMS
        .iter()
        .find(|(form, _)| *form == name)
        .map(|(_, handler)| *handler)
}

/// Names reserved for special forms.
pub fn special_form_identifiers() -> HashSet<String> {
    SPECIAL_FORMS
        .iter()
        .map(|(name, _)| name.to_string())
        .collect()
}

// --- Evaluate Function ---

/// Evaluates a term within the specified environment.
pub fn evaluate(term: &Term, env: &mut Environment) -> EvalResult {
    trace!("evaluate {}", term);
    match &term.kind {
        // Symbols: Look up in the environment
        Sexpr::Symbol(name) => Ok(env.get(name, term.span)?),

        // Numbers are self-evaluating
        Sexpr::Number(n) => Ok(Value::Number(*n)),

        // Lists: special forms or procedure calls
        Sexpr::List(elements) => match elements.split_first() {
            Some((first, rest)) => match first.as_symbol().and_then(special_form) {
                Some(handler) => handler(rest, env, term.span),
                None => evaluate_procedure(first, rest, env, term.span),
            },
            None => Err(EvalError::malformed(
                "the empty list is not an expression",
                term.span,
            )),
        },
    }
}

fn evaluate_procedure(
    operator: &Term,
    operands: &[Term],
    env: &mut Environment,
    span: Span,
) -> EvalResult {
    // 1. Evaluate the operator and check it is a procedure
    let procedure = match evaluate(operator, env)? {
        Value::Procedure(procedure) => procedure,
        other => {
            return Err(EvalError::TypeMismatch {
                operation: "apply".to_string(),
                value: other,
                span: operator.span,
            });
        }
    };

    // 2. Evaluate the operands left to right, stopping at the first failure
    let args = operands
        .iter()
        .map(|operand| evaluate(operand, env))
        .collect::<EvalResult<Vec<Value>>>()?;

    // 3. Apply the procedure
    apply(&procedure, args, span)
}

/// Applies a procedure to already evaluated arguments.
pub fn apply(procedure: &Procedure, args: Vec<Value>, span: Span) -> EvalResult {
    match procedure {
        Procedure::Primitive(func, name) => {
            trace!("apply {} to {} argument(s)", name, args.len());
            func(args, span)
        }
    }
}

fn evaluate_quote(operands: &[Term], _env: &mut Environment, span: Span) -> EvalResult {
    if let [term] = operands {
        // The operand is returned as data, unevaluated.
        Ok(Value::from(term))
    } else {
        Err(EvalError::malformed(
            "quote expects exactly one operand",
            span, // Use the span of the whole (quote ...) form
        ))
    }
}

fn evaluate_if(operands: &[Term], env: &mut Environment, span: Span) -> EvalResult {
    if let [condition, consequent, alternative] = operands {
        // Only the selected branch is evaluated.
        if evaluate(condition, env)?.is_truthy() {
            evaluate(consequent, env)
        } else {
            evaluate(alternative, env)
        }
    } else {
        Err(EvalError::malformed(
            "if expects a condition, a consequent and an alternative",
            span, // Span of the whole (if ...) form
        ))
    }
}

fn evaluate_define(operands: &[Term], env: &mut Environment, span: Span) -> EvalResult {
    match operands {
        [target, expr] => match target.as_symbol() {
            Some(name) => {
                let value = evaluate(expr, env)?;
                env.define(name.to_string(), value);
                Ok(Value::Void)
            }
            None => Err(EvalError::malformed(
                format!("define expects a symbol to bind, got {}", target),
                target.span,
            )),
        },
        _ => Err(EvalError::malformed(
            "define expects a symbol and an expression",
            span,
        )),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;
    use crate::parser::parse_str; // Use parser to create terms easily

    fn int(i: i64) -> Value {
        Value::Number(Number::Integer(i))
    }

    fn sym(s: &str) -> Value {
        Value::Symbol(s.to_string())
    }

    fn eval_in(input: &str, env: &mut Environment) -> EvalResult {
        match parse_str(input) {
            Ok(term) => evaluate(&term, env),
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    // Helper to evaluate input string and check the resulting value
    fn assert_eval(input: &str, expected: Value, env: Option<&mut Environment>) {
        let mut fresh = Environment::new_global_populated();
        let env = env.unwrap_or(&mut fresh); // Use provided env or a new global one
        match eval_in(input, env) {
            Ok(result) => assert_eq!(result, expected, "Input: '{}'", input),
            Err(e) => panic!("Evaluation failed for input '{}': {}", input, e),
        }
    }

    // Helper to assert evaluation errors by variant
    fn assert_eval_error(input: &str, expected_error_variant: &EvalError, env: Option<&mut Environment>) {
        let mut fresh = Environment::new_global_populated();
        let env = env.unwrap_or(&mut fresh);
        match eval_in(input, env) {
            Ok(result) => panic!(
                "Expected evaluation to fail for input '{}', but got: {:?}",
                input, result
            ),
            Err(e) => assert_eq!(
                std::mem::discriminant(&e),
                std::mem::discriminant(expected_error_variant),
                "Input: '{}', Expected error variant like {:?}, got: {:?}",
                input,
                expected_error_variant,
                e
            ),
        }
    }

    fn malformed() -> EvalError {
        EvalError::malformed("", Span::default()) // Dummy for discriminant comparison
    }

    fn unbound() -> EvalError {
        EvalError::EnvError(EnvError::UnboundSymbol("".into(), Span::default()))
    }

    fn type_mismatch() -> EvalError {
        EvalError::TypeMismatch {
            operation: "".into(),
            value: Value::Void,
            span: Span::default(),
        }
    }

    #[test]
    fn test_eval_self_evaluating() {
        assert_eval("123", int(123), None);
        assert_eval("-4.5", Value::Number(Number::Float(-4.5)), None);
    }

    #[test]
    fn test_eval_symbol_lookup_ok() {
        let mut env = Environment::new();
        env.define("x".to_string(), int(100));
        assert_eval("x", int(100), Some(&mut env));
    }

    #[test]
    fn test_eval_symbol_lookup_unbound() {
        let mut env = Environment::new(); // Empty env
        assert_eval_error("y", &unbound(), Some(&mut env));
    }

    #[test]
    fn test_eval_quote() {
        assert_eval("(quote 1)", int(1), None);
        assert_eval("(quote a)", sym("a"), None);
        assert_eval("(quote ())", Value::List(vec![]), None);
        assert_eval(
            "(quote (1 (b c)))",
            Value::List(vec![int(1), Value::List(vec![sym("b"), sym("c")])]),
            None,
        );
        // Nested calls stay unevaluated
        assert_eval(
            "(quote (+ 1 2))",
            Value::List(vec![sym("+"), int(1), int(2)]),
            None,
        );
        assert_eval(
            "(quote (define x 1))",
            Value::List(vec![sym("define"), sym("x"), int(1)]),
            None,
        );

        assert_eval_error("(quote a b)", &malformed(), None);
        assert_eval_error("(quote)", &malformed(), None);
    }

    #[test]
    fn test_eval_if() {
        assert_eval("(if (> 3 2) 1 2)", int(1), None);
        assert_eval("(if (< 3 2) 1 2)", int(2), None);
        assert_eval("(if (eq 1 2) 1 2)", int(2), None);
    }

    #[test]
    fn test_eval_if_truthiness() {
        // Only boolean false selects the alternative.
        assert_eval("(if 0 1 2)", int(1), None);
        assert_eval("(if (quote ()) 1 2)", int(1), None);
        assert_eval("(if (quote x) 1 2)", int(1), None);
        assert_eval("(if (atom 1) 1 2)", int(1), None);
        assert_eval("(if (atom (quote ())) 1 2)", int(2), None);
    }

    #[test]
    fn test_eval_if_nested() {
        assert_eval("(if (> 1 2) 1 (if (> 2 1) 2 3))", int(2), None);
    }

    #[test]
    fn test_eval_if_does_not_evaluate_unused_branch() {
        let mut env = Environment::new_global_populated();
        assert_eval("(if (> 3 2) 1 (define y 2))", int(1), Some(&mut env));
        assert_eval_error("y", &unbound(), Some(&mut env));

        assert_eval("(if (< 3 2) (define z 1) 2)", int(2), Some(&mut env));
        assert_eval_error("z", &unbound(), Some(&mut env));

        // Unbound symbols in the other branch are never looked up either.
        assert_eval("(if (> 3 2) (quote good) unbound-symbol)", sym("good"), Some(&mut env));
    }

    #[test]
    fn test_eval_if_error_arity() {
        assert_eval_error("(if)", &malformed(), None);
        assert_eval_error("(if (> 1 0))", &malformed(), None);
        assert_eval_error("(if (> 1 0) 1)", &malformed(), None);
        assert_eval_error("(if (> 1 0) 1 2 3)", &malformed(), None);
    }

    #[test]
    fn test_eval_if_error_in_condition() {
        assert_eval_error("(if unbound 1 2)", &unbound(), None);
    }

    #[test]
    fn test_eval_define() {
        let mut env = Environment::new_global_populated();
        assert_eval("(define x 5)", Value::Void, Some(&mut env));
        assert_eval("(+ x 1)", int(6), Some(&mut env));
        assert_eval("(define x (* x 2))", Value::Void, Some(&mut env));
        assert_eval("x", int(10), Some(&mut env));
        assert_eval("(define pair (cons 1 2))", Value::Void, Some(&mut env));
        assert_eval("(cdr pair)", int(2), Some(&mut env));
    }

    #[test]
    fn test_eval_define_can_alias_primitives() {
        let mut env = Environment::new_global_populated();
        assert_eval("(define plus +)", Value::Void, Some(&mut env));
        assert_eval("(plus 2 3)", int(5), Some(&mut env));
    }

    #[test]
    fn test_eval_define_errors() {
        let mut env = Environment::new_global_populated();
        assert_eval_error("(define)", &malformed(), Some(&mut env));
        assert_eval_error("(define x)", &malformed(), Some(&mut env));
        assert_eval_error("(define x 1 2)", &malformed(), Some(&mut env));
        assert_eval_error("(define 1 2)", &malformed(), Some(&mut env));
        assert_eval_error("(define (f) 2)", &malformed(), Some(&mut env));
        // A failing value expression binds nothing
        assert_eval_error("(define w (/ 1 0))", &EvalError::DivisionByZero(Span::default()), Some(&mut env));
        assert_eval_error("w", &unbound(), Some(&mut env));
    }

    #[test]
    fn test_eval_empty_list_is_malformed() {
        assert_eval_error("()", &malformed(), None);
        assert_eval_error("(+ 1 ())", &malformed(), None);
    }

    #[test]
    fn test_eval_procedure_calls() {
        assert_eval("(+ 1 2)", int(3), None);
        assert_eval("(* 2 (+ 1 2))", int(6), None);
        assert_eval("(- (+ 5 5) (* 2 3))", int(4), None);
        assert_eval("(car (cons 1 2))", int(1), None);
        assert_eval("(cdr (cons 1 2))", int(2), None);
    }

    #[test]
    fn test_eval_unbound_operator() {
        assert_eval_error("(foo 1)", &unbound(), None);
    }

    #[test]
    fn test_eval_operator_failure_skips_operands() {
        let mut env = Environment::new_global_populated();
        assert_eval_error("(foo (define q 1))", &unbound(), Some(&mut env));
        assert_eval_error("q", &unbound(), Some(&mut env));
        assert_eval_error("(1 (define r 2))", &type_mismatch(), Some(&mut env));
        assert_eval_error("r", &unbound(), Some(&mut env));
    }

    #[test]
    fn test_eval_not_procedure_error() {
        assert_eval_error("(1 2 3)", &type_mismatch(), None);
        assert_eval_error("((quote x) 1)", &type_mismatch(), None);
        assert_eval_error("((cons 1 2) 3)", &type_mismatch(), None);
    }

    #[test]
    fn test_eval_operand_failure_stops_evaluation() {
        let mut env = Environment::new_global_populated();
        assert_eval_error("(+ (/ 1 0) (define late 1))", &EvalError::DivisionByZero(Span::default()), Some(&mut env));
        assert_eval_error("late", &unbound(), Some(&mut env));
    }

    #[test]
    fn test_eval_operands_left_to_right() {
        let mut env = Environment::new_global_populated();
        assert_eval("(cons (define a 1) a)", Value::List(vec![Value::Void, int(1)]), Some(&mut env));
    }

    #[test]
    fn test_special_forms_take_precedence_over_bindings() {
        let mut env = Environment::new_global_populated();
        assert_eval("(define quote 5)", Value::Void, Some(&mut env));
        assert_eval("(quote x)", sym("x"), Some(&mut env));
        assert_eval("quote", int(5), Some(&mut env));
    }

    #[test]
    fn test_error_spans_point_at_source() {
        let mut env = Environment::new_global_populated();
        let err = eval_in("(+ 1 nope)", &mut env).expect_err("nope is unbound");
        assert_eq!(err.span(), Span::new(5, 9));

        let err = eval_in("(car 5)", &mut env).expect_err("car of a number");
        assert_eq!(err.span(), Span::new(0, 7));

        let err = eval_in("(7 1)", &mut env).expect_err("7 is not a procedure");
        assert_eq!(err.span(), Span::new(1, 2));
    }

    #[test]
    fn test_special_form_identifiers() {
        let ids = special_form_identifiers();
        assert!(ids.contains("quote"));
        assert!(ids.contains("if"));
        assert!(ids.contains("define"));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_error_messages() {
        let mut env = Environment::new_global_populated();
        let err = eval_in("(car 5)", &mut env).expect_err("car of a number");
        assert_eq!(
            err.to_string(),
            "Evaluation Error: 'car' cannot be applied to integer 5"
        );
        let err = eval_in("(cons 1)", &mut env).expect_err("missing argument");
        assert_eq!(
            err.to_string(),
            "Evaluation Error: 'cons' expects 2 argument(s), got 1"
        );
        let err = eval_in("missing", &mut env).expect_err("unbound");
        assert_eq!(err.to_string(), "Unbound symbol: 'missing'");
    }
}
