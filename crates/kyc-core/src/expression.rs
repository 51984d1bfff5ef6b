//! Boolean tag-assertion expressions.
//!
//! ```text
//! Expression := OrExpr
//! OrExpr     := AndExpr ( '||' AndExpr )*
//! AndExpr    := Primary ( '&&' Primary )*
//! Primary    := '!' Primary | '(' Expression ')' | Assertion
//! Assertion  := OrgName '.' TagName '@' '`' Value '`'
//! ```
//!
//! `&&` binds tighter than `||`, both are left-associative. An expression
//! is parsed once into an [`Expr`] and then evaluated against a
//! [`TagLookup`] snapshot for one user.

mod ast;
mod evaluator;
mod lexer;
mod parser;

pub use ast::{Assertion, Expr};
pub use evaluator::{TagLookup, TagSnapshot, evaluate};
pub use parser::{MAX_NESTING_DEPTH, ParseError, ParseErrorKind, parse};
