use crate::lexer::{Token, TokenKind};
use crate::number::Number;
use crate::source::Span;
use crate::types::{Sexpr, Term};
use std::iter::Peekable;
use std::vec::IntoIter; // To iterate over Vec<Token>

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Parse Error: Unexpected end of input, expected an expression or ')'")]
    UnexpectedEof(Span),
    #[error("Parse Error [at {0}]: Unexpected ')' with no matching '('")]
    UnexpectedCloseParen(Span),
    #[error("Parse Error [at {0}]: Unexpected input after a complete expression")]
    TrailingInput(Span),
    #[error("Parse Error [at {0}]: Lists nested more than {max} deep", max = MAX_NESTING_DEPTH)]
    NestingTooDeep(Span),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedEof(span)
            | ParseError::UnexpectedCloseParen(span)
            | ParseError::TrailingInput(span)
            | ParseError::NestingTooDeep(span) => *span,
        }
    }
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

/// Deepest list nesting the reader accepts. Evaluation, printing and dropping
/// a term all recurse per level, so this also bounds their stack use.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Recursive-descent reader. Tokens are consumed destructively from the front;
/// a list is only handed out once its closing paren has been read.
pub struct Parser {
    // We iterate over owned Tokens, consuming them.
    tokens: Peekable<IntoIter<Token>>,
    // Where an unexpected end of input is reported.
    eof: Span,
    // Number of lists currently open.
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map_or(0, |t| t.span.end);
        Parser {
            tokens: tokens.into_iter().peekable(),
            eof: Span::new(end, end),
            depth: 0,
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    // Peeks at the next token without consuming.
    fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    /// True once every token has been consumed.
    pub fn is_exhausted(&mut self) -> bool {
        self.peek_token().is_none()
    }

    /// Reads a single term from the token stream.
    pub fn parse_expr(&mut self) -> ParseResult<Term> {
        let token = self.next_token().ok_or(ParseError::UnexpectedEof(self.eof))?;
        match token.kind {
            TokenKind::LParen if self.depth == MAX_NESTING_DEPTH => {
                Err(ParseError::NestingTooDeep(token.span))
            }
            TokenKind::LParen => {
                self.depth += 1;
                let list = self.parse_list(token.span);
                self.depth -= 1;
                list
            }
            TokenKind::RParen => Err(ParseError::UnexpectedCloseParen(token.span)),
            TokenKind::Atom(text) => Ok(classify(&text, token.span)),
        }
    }

    /// Reads list elements up to the matching `)`. The head is checked before
    /// every element so running out of tokens surfaces as `UnexpectedEof`.
    fn parse_list(&mut self, open: Span) -> ParseResult<Term> {
        let mut elements = Vec::new();
        loop {
            match self.peek_token() {
                None => return Err(ParseError::UnexpectedEof(self.eof)),
                Some(Token {
                    kind: TokenKind::RParen,
                    span,
                }) => {
                    let span = open.merge(*span);
                    self.next_token(); // pop off the closing )
                    return Ok(Term::new_list(elements, span));
                }
                Some(_) => elements.push(self.parse_expr()?),
            }
        }
    }

    /// Reads exactly one top-level term; leftover tokens are rejected.
    pub fn parse(mut self) -> ParseResult<Term> {
        let expr = self.parse_expr()?;
        match self.next_token() {
            Some(found) => Err(ParseError::TrailingInput(found.span)),
            None => Ok(expr),
        }
    }

    /// Reads every top-level term until the tokens run out.
    pub fn parse_all(mut self) -> ParseResult<Vec<Term>> {
        let mut terms = Vec::new();
        while !self.is_exhausted() {
            terms.push(self.parse_expr()?);
        }
        Ok(terms)
    }
}

/// Classifies an atom token: exact integer, then float, then symbol.
pub fn classify(token: &str, span: Span) -> Term {
    match Number::parse(token) {
        Some(number) => Term::new(Sexpr::Number(number), span),
        None => Term::new(Sexpr::Symbol(token.to_string()), span),
    }
}

// Helper function to lex and parse a string directly (useful for tests and REPL)
pub fn parse_str(input: &str) -> ParseResult<Term> {
    Parser::new(crate::lexer::tokenize(input)).parse()
}

/// Lexes and parses every top-level expression in `input`.
pub fn parse_all(input: &str) -> ParseResult<Vec<Term>> {
    Parser::new(crate::lexer::tokenize(input)).parse_all()
}
