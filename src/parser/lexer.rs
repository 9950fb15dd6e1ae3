//! Lexers for brace templates using logos
//!
//! Templates are lexed in two passes: [`Piece`] splits the template into
//! literal text, escaped braces and raw replacement fields, then
//! [`FieldToken`] lexes the name part of each field.

use std::fmt;

use logos::Logos;

use crate::error::Span;

/// Top-level template pieces
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece {
    #[token("{{")]
    EscapedOpen,
    #[token("}}")]
    EscapedClose,

    /// `{...}` including the braces
    #[regex(r"\{[^{}]*\}")]
    Field,

    #[regex(r"[^{}]+")]
    Text,
}

/// Tokens of a field name such as `user.emails[0]`
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum FieldToken {
    #[token(".")]
    Dot,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Integer(usize),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl fmt::Display for FieldToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldToken::Dot => write!(f, "'.'"),
            FieldToken::BracketOpen => write!(f, "'['"),
            FieldToken::BracketClose => write!(f, "']'"),
            FieldToken::Integer(n) => write!(f, "integer {}", n),
            FieldToken::Ident(s) => write!(f, "identifier '{}'", s),
        }
    }
}

/// Lex a template into pieces with spans; unmatched braces come back as `Err`
pub fn lex_template(input: &str) -> impl Iterator<Item = (Result<Piece, ()>, Span)> + '_ {
    Piece::lexer(input).spanned()
}

/// Lex a field name; characters outside the field grammar come back as `Err`
pub fn lex_field(input: &str) -> impl Iterator<Item = (Result<FieldToken, ()>, Span)> + '_ {
    FieldToken::lexer(input).spanned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(input: &str) -> Vec<(Result<Piece, ()>, &str)> {
        lex_template(input)
            .map(|(piece, span)| (piece, &input[span]))
            .collect()
    }

    #[test]
    fn test_text_and_fields() {
        assert_eq!(
            pieces("Hello {name}!"),
            vec![
                (Ok(Piece::Text), "Hello "),
                (Ok(Piece::Field), "{name}"),
                (Ok(Piece::Text), "!"),
            ]
        );
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(
            pieces("{{x}}"),
            vec![
                (Ok(Piece::EscapedOpen), "{{"),
                (Ok(Piece::Text), "x"),
                (Ok(Piece::EscapedClose), "}}"),
            ]
        );
    }

    #[test]
    fn test_field_followed_by_escaped_close() {
        assert_eq!(
            pieces("{a}}}"),
            vec![(Ok(Piece::Field), "{a}"), (Ok(Piece::EscapedClose), "}}")]
        );
    }

    #[test]
    fn test_empty_field() {
        assert_eq!(pieces("{}"), vec![(Ok(Piece::Field), "{}")]);
    }

    #[test]
    fn test_lone_close_brace_is_error() {
        let result = pieces("a } b");
        assert!(result.iter().any(|(piece, _)| piece.is_err()));
    }

    #[test]
    fn test_field_tokens() {
        let tokens: Vec<_> = lex_field("user.emails[0]")
            .map(|(t, _)| t.expect("valid token"))
            .collect();
        assert_eq!(
            tokens,
            vec![
                FieldToken::Ident("user".to_string()),
                FieldToken::Dot,
                FieldToken::Ident("emails".to_string()),
                FieldToken::BracketOpen,
                FieldToken::Integer(0),
                FieldToken::BracketClose,
            ]
        );
    }

    #[test]
    fn test_field_invalid_character() {
        let tokens: Vec<_> = lex_field("a-b").map(|(t, _)| t).collect();
        assert!(tokens.contains(&Err(())));
    }
}
