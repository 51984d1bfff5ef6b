//! KYC Core: domain models, error taxonomy, Tag Store repository traits
//! and the boolean tag-assertion expression language.
//!
//! Nothing in this crate performs I/O. Storage lives behind the traits in
//! [`repository`]; the directory service in `kyc-directory` drives them.

pub mod error;
pub mod expression;
pub mod models;
pub mod repository;

pub use error::{KycError, KycResult, SUCCESS_CODE};
pub use expression::{Expr, ParseError, ParseErrorKind, TagLookup, evaluate, parse};
