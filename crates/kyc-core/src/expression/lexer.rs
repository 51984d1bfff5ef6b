use std::fmt;

use super::parser::{ParseError, ParseErrorKind};
use crate::models::names::is_identifier_char;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident(String),
    Literal(String),
    Dot,
    At,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier {name}"),
            Self::Literal(value) => write!(f, "literal `{value}`"),
            Self::Dot => f.write_str("'.'"),
            Self::At => f.write_str("'@'"),
            Self::AndAnd => f.write_str("'&&'"),
            Self::OrOr => f.write_str("'||'"),
            Self::Bang => f.write_str("'!'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token's first character.
    pub position: usize,
}

/// Splits the input into tokens, skipping whitespace between them.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            '.' => TokenKind::Dot,
            '@' => TokenKind::At,
            '!' => TokenKind::Bang,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(ParseError::new(position, ParseErrorKind::UnexpectedChar(c)));
                }
                if c == '&' {
                    TokenKind::AndAnd
                } else {
                    TokenKind::OrOr
                }
            }
            '`' => {
                let start = position + c.len_utf8();
                let end = loop {
                    match chars.next() {
                        Some((end, '`')) => break end,
                        Some(_) => {}
                        None => {
                            return Err(ParseError::new(
                                position,
                                ParseErrorKind::UnterminatedLiteral,
                            ));
                        }
                    }
                };
                TokenKind::Literal(input[start..end].to_owned())
            }
            c if is_identifier_char(c) => {
                let mut end = position + c.len_utf8();
                while let Some((next_pos, next)) = chars.next_if(|&(_, next)| is_identifier_char(next))
                {
                    end = next_pos + next.len_utf8();
                }
                TokenKind::Ident(input[position..end].to_owned())
            }
            other => {
                return Err(ParseError::new(position, ParseErrorKind::UnexpectedChar(other)));
            }
        };

        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_an_assertion() {
        assert_eq!(
            kinds("acme.kyc1@`passed`"),
            vec![
                TokenKind::Ident("acme".into()),
                TokenKind::Dot,
                TokenKind::Ident("kyc1".into()),
                TokenKind::At,
                TokenKind::Literal("passed".into()),
            ]
        );
    }

    #[test]
    fn literals_keep_spaces_and_symbols() {
        assert_eq!(
            kinds("`a && b (c)`"),
            vec![TokenKind::Literal("a && b (c)".into())]
        );
    }

    #[test]
    fn records_byte_positions() {
        let tokens = tokenize("  ( a").unwrap();
        assert_eq!(tokens[0].position, 2);
        assert_eq!(tokens[1].position, 4);
    }

    #[test]
    fn single_ampersand_is_rejected() {
        let err = tokenize("a & b").unwrap_err();
        assert_eq!(err.position, 2);
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChar('&'));
    }

    #[test]
    fn unterminated_literal_points_at_opening_backtick() {
        let err = tokenize("acme.kyc1@`passed").unwrap_err();
        assert_eq!(err.position, 10);
        assert_eq!(err.kind, ParseErrorKind::UnterminatedLiteral);
    }
}
