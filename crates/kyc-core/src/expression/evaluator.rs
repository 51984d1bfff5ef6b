use std::collections::HashMap;

use super::ast::{Assertion, Expr};
use crate::models::names::OrgName;
use crate::models::organization::Organization;
use crate::models::user_tags::UserTags;

/// Read access to the registry state for a single user.
pub trait TagLookup {
    fn organization(&self, org: &str) -> Option<&Organization>;
    /// The user's tag record under `org`, if any.
    fn user_tags(&self, org: &str) -> Option<&UserTags>;
}

/// Evaluate `expr` for the user behind `lookup`.
///
/// Total over well-formed trees: anything missing makes the assertion
/// false. `||` and `&&` short-circuit.
pub fn evaluate<L: TagLookup + ?Sized>(expr: &Expr, lookup: &L) -> bool {
    match expr {
        Expr::Or(operands) => operands.iter().any(|operand| evaluate(operand, lookup)),
        Expr::And(operands) => operands.iter().all(|operand| evaluate(operand, lookup)),
        Expr::Not(inner) => !evaluate(inner, lookup),
        Expr::Assert(assertion) => holds(assertion, lookup),
    }
}

fn holds<L: TagLookup + ?Sized>(assertion: &Assertion, lookup: &L) -> bool {
    let Some(org) = lookup.organization(&assertion.org) else {
        return false;
    };

    // Schema at evaluation time; values stored under a removed tag stay
    // unreachable.
    if !org.approved || !org.supports(&assertion.tag) {
        return false;
    }

    lookup
        .user_tags(&assertion.org)
        .is_some_and(|tags| tags.contains_value(&assertion.tag, &assertion.value))
}

/// Materialised registry state for one user, loaded before evaluation.
#[derive(Debug, Clone, Default)]
pub struct TagSnapshot {
    orgs: HashMap<OrgName, Organization>,
    user_tags: HashMap<OrgName, UserTags>,
}

impl TagSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_org(&mut self, org: Organization) {
        self.orgs.insert(org.name.clone(), org);
    }

    pub fn insert_user_tags(&mut self, org_name: OrgName, tags: UserTags) {
        self.user_tags.insert(org_name, tags);
    }
}

impl TagLookup for TagSnapshot {
    fn organization(&self, org: &str) -> Option<&Organization> {
        self.orgs.get(org)
    }

    fn user_tags(&self, org: &str) -> Option<&UserTags> {
        self.user_tags.get(org)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::Utc;

    use super::*;
    use crate::expression::parse;

    fn org(name: &str, tags: &[&str], approved: bool) -> Organization {
        Organization {
            name: name.parse().unwrap(),
            description: String::new(),
            admin: "0xcff1002107105460941f797828f468667aa1a2db".parse().unwrap(),
            supported_tags: tags.iter().map(|t| t.parse().unwrap()).collect(),
            approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tags(entries: &[(&str, &[&str])]) -> UserTags {
        entries
            .iter()
            .map(|(tag, values)| {
                (
                    tag.parse().unwrap(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    /// `acme` approved with kyc1..kyc3; the user holds `kyc1 = passed`.
    fn acme_user() -> TagSnapshot {
        let mut snapshot = TagSnapshot::new();
        snapshot.insert_org(org("acme", &["kyc1", "kyc2", "kyc3"], true));
        snapshot.insert_user_tags("acme".parse().unwrap(), tags(&[("kyc1", &["passed"])]));
        snapshot
    }

    fn eval(source: &str, snapshot: &TagSnapshot) -> bool {
        evaluate(&parse(source).unwrap(), snapshot)
    }

    #[test]
    fn matching_assertion_is_true() {
        assert!(eval("acme.kyc1@`passed`", &acme_user()));
    }

    #[test]
    fn other_value_is_false() {
        assert!(!eval("acme.kyc1@`failed`", &acme_user()));
    }

    #[test]
    fn user_without_record_is_false() {
        let mut snapshot = TagSnapshot::new();
        snapshot.insert_org(org("acme", &["kyc1", "kyc2", "kyc3"], true));
        assert!(!eval("acme.kyc1@`passed`", &snapshot));
    }

    #[test]
    fn unknown_org_or_tag_is_false() {
        let snapshot = acme_user();
        assert!(!eval("nobody.kyc1@`passed`", &snapshot));
        assert!(!eval("acme.kyc9@`passed`", &snapshot));
        assert!(!eval("acme.kyc2@`passed`", &snapshot));
    }

    #[test]
    fn unapproved_org_is_false() {
        let mut snapshot = TagSnapshot::new();
        snapshot.insert_org(org("acme", &["kyc1"], false));
        snapshot.insert_user_tags("acme".parse().unwrap(), tags(&[("kyc1", &["passed"])]));
        assert!(!eval("acme.kyc1@`passed`", &snapshot));
    }

    #[test]
    fn orphaned_values_are_unreachable() {
        let mut snapshot = TagSnapshot::new();
        snapshot.insert_org(org("acme", &["kyc2"], true));
        snapshot.insert_user_tags("acme".parse().unwrap(), tags(&[("kyc1", &["passed"])]));
        assert!(!eval("acme.kyc1@`passed`", &snapshot));
    }

    #[test]
    fn precedence_follows_the_grammar() {
        let mut snapshot = acme_user();
        snapshot.insert_user_tags(
            "acme".parse().unwrap(),
            tags(&[("kyc1", &["a"]), ("kyc3", &["c"])]),
        );
        // A = kyc1@a (true), B = kyc2@b (false), C = kyc3@c (true)
        assert!(eval(
            "(acme.kyc1@`a` || acme.kyc2@`b`) && acme.kyc3@`c`",
            &snapshot
        ));
        // C false: B && C is false, A alone carries the result.
        assert!(eval(
            "acme.kyc1@`a` || acme.kyc2@`b` && acme.kyc3@`x`",
            &snapshot
        ));
        assert!(!eval(
            "(acme.kyc1@`a` || acme.kyc2@`b`) && acme.kyc3@`x`",
            &snapshot
        ));
    }

    #[test]
    fn negation_inverts() {
        let snapshot = acme_user();
        assert!(eval("!acme.kyc1@`failed`", &snapshot));
        assert!(!eval("!acme.kyc1@`passed`", &snapshot));
        assert!(eval("!nobody.kyc1@`passed`", &snapshot));
    }

    #[test]
    fn long_operator_chains_evaluate_without_deep_recursion() {
        let snapshot = acme_user();

        let misses = vec!["acme.kyc1@`failed`"; 200_000].join(" || ");
        let expr = parse(&misses).unwrap();
        assert!(!evaluate(&expr, &TagSnapshot::new()));
        assert!(!evaluate(&expr, &snapshot));
        assert_eq!(expr.org_names().len(), 1);

        let hits = vec!["acme.kyc1@`passed`"; 200_000].join(" && ");
        assert!(eval(&hits, &snapshot));
    }

    struct CountingLookup {
        inner: TagSnapshot,
        lookups: Cell<usize>,
    }

    impl TagLookup for CountingLookup {
        fn organization(&self, org: &str) -> Option<&Organization> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.organization(org)
        }

        fn user_tags(&self, org: &str) -> Option<&UserTags> {
            self.inner.user_tags(org)
        }
    }

    #[test]
    fn or_and_short_circuit() {
        let lookup = CountingLookup {
            inner: acme_user(),
            lookups: Cell::new(0),
        };

        assert!(evaluate(
            &parse("acme.kyc1@`passed` || acme.kyc2@`x`").unwrap(),
            &lookup
        ));
        assert_eq!(lookup.lookups.get(), 1);

        lookup.lookups.set(0);
        assert!(!evaluate(
            &parse("acme.kyc1@`failed` && acme.kyc2@`x`").unwrap(),
            &lookup
        ));
        assert_eq!(lookup.lookups.get(), 1);
    }
}
