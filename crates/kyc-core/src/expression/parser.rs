use thiserror::Error;

use super::ast::{Assertion, Expr};
use super::lexer::{Token, TokenKind, tokenize};

/// Deepest nesting of `(` and `!` accepted by the parser.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("unterminated backtick literal")]
    UnterminatedLiteral,

    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unbalanced parenthesis")]
    UnbalancedParen,

    #[error("nesting deeper than {MAX_NESTING_DEPTH} levels")]
    TooDeep,
}

/// A malformed expression, with the byte offset where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {position}")]
pub struct ParseError {
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

/// Parse an assertion expression into its syntax tree.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::new(0, ParseErrorKind::Empty));
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        end: input.len(),
    };
    let expr = parser.parse_or()?;

    match parser.next() {
        None => Ok(expr),
        Some(Token {
            kind: TokenKind::RParen,
            position,
        }) => Err(ParseError::new(position, ParseErrorKind::UnbalancedParen)),
        Some(token) => Err(ParseError::new(
            token.position,
            ParseErrorKind::UnexpectedToken {
                expected: "'&&' or '||'",
                found: token.kind.to_string(),
            },
        )),
    }
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
    /// Position reported when input runs out.
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.cursor).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self, position: usize) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::new(position, ParseErrorKind::TooDeep));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_and()?;
        let mut operands = vec![first];
        while self.eat(&TokenKind::OrOr) {
            operands.push(self.parse_and()?);
        }
        Ok(chain(operands, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_primary()?;
        let mut operands = vec![first];
        while self.eat(&TokenKind::AndAnd) {
            operands.push(self.parse_primary()?);
        }
        Ok(chain(operands, Expr::And))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.next() else {
            return Err(ParseError::new(self.end, ParseErrorKind::UnexpectedEnd));
        };

        match token.kind {
            TokenKind::Bang => {
                self.descend(token.position)?;
                let inner = self.parse_primary()?;
                self.depth -= 1;
                Ok(Expr::not(inner))
            }
            TokenKind::LParen => {
                self.descend(token.position)?;
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => {}
                    None => {
                        return Err(ParseError::new(
                            token.position,
                            ParseErrorKind::UnbalancedParen,
                        ));
                    }
                    Some(other) => {
                        return Err(ParseError::new(
                            other.position,
                            ParseErrorKind::UnexpectedToken {
                                expected: "')'",
                                found: other.kind.to_string(),
                            },
                        ));
                    }
                }
                self.depth -= 1;
                Ok(inner)
            }
            TokenKind::Ident(org) => self.parse_assertion(org),
            other => Err(ParseError::new(
                token.position,
                ParseErrorKind::UnexpectedToken {
                    expected: "assertion, '(' or '!'",
                    found: other.to_string(),
                },
            )),
        }
    }

    fn parse_assertion(&mut self, org: String) -> Result<Expr, ParseError> {
        self.expect(TokenKind::Dot, "'.'")?;
        let tag = match self.next_or_end()? {
            Token {
                kind: TokenKind::Ident(tag),
                ..
            } => tag,
            other => return Err(unexpected(other, "tag name")),
        };
        self.expect(TokenKind::At, "'@'")?;
        let value = match self.next_or_end()? {
            Token {
                kind: TokenKind::Literal(value),
                ..
            } => value,
            other => return Err(unexpected(other, "backtick literal")),
        };

        Ok(Expr::Assert(Assertion { org, tag, value }))
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        let token = self.next_or_end()?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(token, expected))
        }
    }

    fn next_or_end(&mut self) -> Result<Token, ParseError> {
        self.next()
            .ok_or_else(|| ParseError::new(self.end, ParseErrorKind::UnexpectedEnd))
    }
}

/// A single operand stands alone; two or more form one chain node.
fn chain(mut operands: Vec<Expr>, node: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.swap_remove(0)
    } else {
        node(operands)
    }
}

fn unexpected(token: Token, expected: &'static str) -> ParseError {
    ParseError::new(
        token.position,
        ParseErrorKind::UnexpectedToken {
            expected,
            found: token.kind.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(org: &str) -> Expr {
        Expr::assert(org, "t", "v")
    }

    #[test]
    fn parses_a_single_assertion() {
        assert_eq!(
            parse("acme.kyc1@`passed`").unwrap(),
            Expr::assert("acme", "kyc1", "passed")
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a.t@`v` || b.t@`v` && c.t@`v`").unwrap();
        assert_eq!(expr, Expr::or(a("a"), Expr::and(a("b"), a("c"))));
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse("(a.t@`v` || b.t@`v`) && c.t@`v`").unwrap();
        assert_eq!(expr, Expr::and(Expr::or(a("a"), a("b")), a("c")));
    }

    #[test]
    fn operators_are_left_associative() {
        let expr = parse("a.t@`v` || b.t@`v` || c.t@`v`").unwrap();
        assert_eq!(expr, Expr::or(Expr::or(a("a"), a("b")), a("c")));

        let expr = parse("a.t@`v` && b.t@`v` && c.t@`v`").unwrap();
        assert_eq!(expr, Expr::and(Expr::and(a("a"), a("b")), a("c")));
    }

    #[test]
    fn parenthesised_chain_stays_a_separate_node() {
        let expr = parse("(a.t@`v` || b.t@`v`) || c.t@`v`").unwrap();
        assert_eq!(
            expr,
            Expr::Or(vec![Expr::Or(vec![a("a"), a("b")]), a("c")])
        );
        assert_eq!(parse(&expr.to_string()).unwrap(), expr);
    }

    #[test]
    fn long_chains_build_a_flat_node() {
        let source = vec!["a.t@`v`"; 10_000].join(" && ");
        match parse(&source).unwrap() {
            Expr::And(operands) => assert_eq!(operands.len(), 10_000),
            other => panic!("expected an And chain, got {other:?}"),
        }
    }

    #[test]
    fn negation_binds_tighter_than_and() {
        let expr = parse("!a.t@`v` && b.t@`v`").unwrap();
        assert_eq!(expr, Expr::and(Expr::not(a("a")), a("b")));
    }

    #[test]
    fn whitespace_between_tokens_is_ignored() {
        let expr = parse(" acme . kyc1 @ `passed` ").unwrap();
        assert_eq!(expr, Expr::assert("acme", "kyc1", "passed"));
    }

    #[test]
    fn empty_literal_is_allowed() {
        assert_eq!(parse("a.t@``").unwrap(), Expr::assert("a", "t", ""));
    }

    #[test]
    fn display_round_trips() {
        let source = "!(a.t@`x y` || b.t@`v`) && c.t@`v` || !!d.t@`v`";
        let expr = parse(source).unwrap();
        assert_eq!(parse(&expr.to_string()).unwrap(), expr);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse("").unwrap_err().kind, ParseErrorKind::Empty);
        assert_eq!(parse("   ").unwrap_err().kind, ParseErrorKind::Empty);
    }

    #[test]
    fn unclosed_parenthesis_points_at_opening() {
        let err = parse("x.t@`v` && (a.t@`v` || b.t@`v`").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParen);
        assert_eq!(err.position, 11);
    }

    #[test]
    fn stray_closing_parenthesis_is_rejected() {
        let err = parse("a.t@`v`)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParen);
        assert_eq!(err.position, 7);
    }

    #[test]
    fn missing_operator_is_rejected() {
        let err = parse("a.t@`v` b.t@`v`").unwrap_err();
        assert_eq!(err.position, 8);
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: "'&&' or '||'",
                ..
            }
        ));
    }

    #[test]
    fn dangling_operator_is_rejected() {
        let err = parse("a.t@`v` &&").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
        assert_eq!(err.position, 10);
    }

    #[test]
    fn incomplete_assertion_is_rejected() {
        assert!(parse("acme.kyc1").is_err());
        assert!(parse("acme@`v`").is_err());
        assert!(parse("acme.kyc1@passed").is_err());
        assert!(parse("acme.kyc1@`passed").is_err());
    }

    #[test]
    fn excessive_nesting_is_rejected() {
        let source = format!("{}a.t@`v`{}", "(".repeat(65), ")".repeat(65));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep);
        assert_eq!(err.position, 64);

        let ok = format!("{}a.t@`v`{}", "(".repeat(64), ")".repeat(64));
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn errors_render_with_position() {
        let err = parse("a.t@`v` & b.t@`v`").unwrap_err();
        assert_eq!(err.to_string(), "unexpected character '&' at position 8");
    }
}
