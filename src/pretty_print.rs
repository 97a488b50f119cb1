use crate::{EnvError, Error, EvalError, MAX_NESTING_DEPTH, ParseError, Span};
use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use std::io;
use std::ops::Range;

type SourceSpan<'a> = (&'a str, Range<usize>);

// Builds an error report labelled at `span` within the source called `name`.
// Spans are byte offsets, so ariadne must not count characters.
fn report<'a>(name: &'a str, span: Span, message: String, label: String) -> Report<'a, SourceSpan<'a>> {
    Report::build(ReportKind::Error, (name, span.to_range()))
        .with_config(Config::default().with_index_type(IndexType::Byte))
        .with_message(message)
        .with_label(Label::new((name, span.to_range())).with_message(label))
        .finish()
}

impl EvalError {
    fn report<'a>(&self, name: &'a str) -> Report<'a, SourceSpan<'a>> {
        let span = self.span();
        match self {
            EvalError::EnvError(EnvError::UnboundSymbol(symbol, _)) => report(
                name,
                span,
                format!("Unbound symbol `{}`", symbol),
                "This symbol is not defined in the current scope".to_string(),
            ),
            EvalError::DivisionByZero(_) => report(
                name,
                span,
                "Division by zero".to_string(),
                "The divisor of this division is zero".to_string(),
            ),
            EvalError::ArityMismatch {
                procedure,
                expected,
                got,
                ..
            } => report(
                name,
                span,
                format!("Wrong number of arguments to `{}`", procedure),
                format!("Expected {} argument(s), got {}", expected, got),
            ),
            EvalError::TypeMismatch {
                operation, value, ..
            } => report(
                name,
                span,
                format!("Type mismatch in `{}`", operation),
                format!("Cannot use {} {} here", value.type_name(), value),
            ),
            EvalError::MalformedExpression { message, .. } => report(
                name,
                span,
                "Malformed expression".to_string(),
                message.clone(),
            ),
        }
    }

    /// Writes a diagnostic for this error, annotated against `input`, to stderr.
    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        self.report(name).eprint((name, Source::from(input)))
    }
}

impl ParseError {
    fn report<'a>(&self, name: &'a str) -> Report<'a, SourceSpan<'a>> {
        let span = self.span();
        match self {
            ParseError::UnexpectedEof(_) => report(
                name,
                span,
                "Unexpected EOF".to_string(),
                "Expected an expression or ')'".to_string(),
            ),
            ParseError::UnexpectedCloseParen(_) => report(
                name,
                span,
                "Unexpected token: )".to_string(),
                "This ')' has no matching '('".to_string(),
            ),
            ParseError::TrailingInput(_) => report(
                name,
                span,
                "Trailing input".to_string(),
                "Expected end of input after a complete expression".to_string(),
            ),
            ParseError::NestingTooDeep(_) => report(
                name,
                span,
                "Nesting too deep".to_string(),
                format!("This list opens more than {} levels deep", MAX_NESTING_DEPTH),
            ),
        }
    }

    /// Writes a diagnostic for this error, annotated against `input`, to stderr.
    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        self.report(name).eprint((name, Source::from(input)))
    }
}

impl Error {
    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        match self {
            Error::Parse(e) => e.pretty_print(name, input),
            Error::Eval(e) => e.pretty_print(name, input),
        }
    }
}
