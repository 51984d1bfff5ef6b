use std::collections::BTreeSet;
use std::fmt;

/// `org.tag@`value``: the user holds `value` under `tag` as asserted by `org`.
///
/// Names are kept as written; a name that could never be registered simply
/// never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub org: String,
    pub tag: String,
    pub value: String,
}

/// Syntax tree of an assertion expression.
///
/// A chain `a || b || c` is one `Or` node with its operands in source
/// order, so tree depth only grows with `(` and `!` nesting, which the
/// parser caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Assert(Assertion),
}

impl Expr {
    /// `left || right`, extending `left` when it is already an `Or` chain.
    pub fn or(left: Expr, right: Expr) -> Self {
        match left {
            Self::Or(mut operands) => {
                operands.push(right);
                Self::Or(operands)
            }
            left => Self::Or(vec![left, right]),
        }
    }

    /// `left && right`, extending `left` when it is already an `And` chain.
    pub fn and(left: Expr, right: Expr) -> Self {
        match left {
            Self::And(mut operands) => {
                operands.push(right);
                Self::And(operands)
            }
            left => Self::And(vec![left, right]),
        }
    }

    pub fn not(inner: Expr) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn assert(
        org: impl Into<String>,
        tag: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Assert(Assertion {
            org: org.into(),
            tag: tag.into(),
            value: value.into(),
        })
    }

    /// Every organization referenced anywhere in the tree.
    pub fn org_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_org_names(&mut names);
        names
    }

    fn collect_org_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::Or(operands) | Self::And(operands) => {
                for operand in operands {
                    operand.collect_org_names(names);
                }
            }
            Self::Not(inner) => inner.collect_org_names(names),
            Self::Assert(assertion) => {
                names.insert(assertion.org.as_str());
            }
        }
    }
}

/// Fully parenthesised form; parses back to the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or(operands) => write_chain(f, operands, " || "),
            Self::And(operands) => write_chain(f, operands, " && "),
            Self::Not(inner) => write!(f, "!{inner}"),
            Self::Assert(a) => write!(f, "{}.{}@`{}`", a.org, a.tag, a.value),
        }
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, operands: &[Expr], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{operand}")?;
    }
    f.write_str(")")
}
