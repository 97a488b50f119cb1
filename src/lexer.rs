use logos::Logos;
use std::fmt;

use crate::source::Span;

/// Lexical tokens. Parentheses delimit themselves; every other run of
/// non-whitespace characters is a single atom, left for the reader to classify.
/// There are no strings, comments or quote shorthands: `"`, `;` and `'` are
/// ordinary atom characters.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"\s+")] // Skip whitespace
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[^\s()]+", |lex| lex.slice().to_string())]
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Atom(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Splits `input` into tokens, left to right.
///
/// Tokenizing cannot fail. The patterns above cover every character, but should
/// logos ever report an unmatched slice it is kept as atom text rather than dropped.
pub fn tokenize(input: &str) -> Vec<Token> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| Token {
            kind: result.unwrap_or_else(|()| TokenKind::Atom(input[range.clone()].to_string())),
            span: range.into(),
        })
        .collect()
}
