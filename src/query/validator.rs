// Statement validation
// A deny-list, not a parser: blocks a few destructive statement categories
// before anything reaches the engine. Rules look at the trimmed, lower-cased
// text and the first rule that objects decides the verdict.

use serde::Serialize;
use std::fmt;

/// Keywords that reject a statement wherever they appear, checked in this order.
/// Matching is by substring, so an identifier like `alter_ego` is rejected too.
pub const FORBIDDEN_KEYWORDS: [&str; 3] = ["drop", "truncate", "alter"];

/// Why a statement was blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    EmptyQuery,
    ForbiddenOperation { keyword: &'static str },
    UnqualifiedDelete,
    UnqualifiedUpdate,
}

impl Rejection {
    /// Stable reason code for callers
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::EmptyQuery => "empty_query",
            Rejection::ForbiddenOperation { .. } => "forbidden_operation",
            Rejection::UnqualifiedDelete => "unqualified_delete",
            Rejection::UnqualifiedUpdate => "unqualified_update",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::EmptyQuery => write!(f, "SQL query is empty"),
            Rejection::ForbiddenOperation { keyword } => {
                write!(f, "forbidden SQL operation: {}", keyword.to_uppercase())
            }
            Rejection::UnqualifiedDelete => write!(f, "DELETE without WHERE is not allowed"),
            Rejection::UnqualifiedUpdate => write!(f, "UPDATE without WHERE is not allowed"),
        }
    }
}

/// Outcome of validating one statement
pub type Verdict = Result<(), Rejection>;

/// A named check over the normalized statement text
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    check: fn(&str) -> Option<Rejection>,
}

impl Rule {
    pub fn new(name: &'static str, check: fn(&str) -> Option<Rejection>) -> Self {
        Self { name, check }
    }

    pub fn check(&self, normalized: &str) -> Option<Rejection> {
        (self.check)(normalized)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

fn empty_query(s: &str) -> Option<Rejection> {
    s.is_empty().then_some(Rejection::EmptyQuery)
}

fn forbidden_keyword(s: &str) -> Option<Rejection> {
    FORBIDDEN_KEYWORDS
        .iter()
        .find(|keyword| s.contains(**keyword))
        .map(|keyword| Rejection::ForbiddenOperation { keyword: *keyword })
}

fn unqualified_delete(s: &str) -> Option<Rejection> {
    (s.starts_with("delete") && !s.contains("where")).then_some(Rejection::UnqualifiedDelete)
}

fn unqualified_update(s: &str) -> Option<Rejection> {
    (s.starts_with("update") && !s.contains("where")).then_some(Rejection::UnqualifiedUpdate)
}

/// An ordered list of rules
#[derive(Debug, Clone)]
pub struct StatementPolicy {
    rules: Vec<Rule>,
}

impl StatementPolicy {
    /// Empty statements, forbidden keywords and DELETE without WHERE
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Rule::new("empty_query", empty_query),
                Rule::new("forbidden_keyword", forbidden_keyword),
                Rule::new("unqualified_delete", unqualified_delete),
            ],
        }
    }

    /// The standard rules plus UPDATE without WHERE
    pub fn strict() -> Self {
        Self::standard().with_rule(Rule::new("unqualified_update", unqualified_update))
    }

    /// Append a rule; it runs after the existing ones
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn validate(&self, statement: &str) -> Verdict {
        let normalized = statement.trim().to_lowercase();
        match self.rules.iter().find_map(|rule| rule.check(&normalized)) {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }
}

impl Default for StatementPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_blank_statements() {
        let policy = StatementPolicy::standard();
        assert_eq!(policy.validate(""), Err(Rejection::EmptyQuery));
        assert_eq!(policy.validate("  \n\t "), Err(Rejection::EmptyQuery));
    }

    #[test]
    fn test_forbidden_keywords_anywhere() {
        let policy = StatementPolicy::standard();
        for sql in [
            "DROP TABLE t",
            "select * from t; drop table t",
            "TRUNCATE t",
            "ALTER TABLE t ADD c INT",
            "SELECT alter_ego FROM heroes",
            "select * from backdrop",
        ] {
            assert!(
                matches!(policy.validate(sql), Err(Rejection::ForbiddenOperation { .. })),
                "{sql} should be rejected"
            );
        }
    }

    #[test]
    fn test_first_forbidden_keyword_in_list_order_is_reported() {
        let policy = StatementPolicy::standard();
        assert_eq!(
            policy.validate("alter then drop"),
            Err(Rejection::ForbiddenOperation { keyword: "drop" })
        );
    }

    #[test]
    fn test_delete_requires_where() {
        let policy = StatementPolicy::standard();
        assert_eq!(policy.validate("DELETE FROM t"), Err(Rejection::UnqualifiedDelete));
        assert_eq!(policy.validate("  delete from t  "), Err(Rejection::UnqualifiedDelete));
        assert_eq!(policy.validate("DELETE FROM t WHERE id=1"), Ok(()));
    }

    #[test]
    fn test_forbidden_keyword_wins_over_unqualified_delete() {
        let policy = StatementPolicy::standard();
        assert_eq!(
            policy.validate("DELETE FROM dropped"),
            Err(Rejection::ForbiddenOperation { keyword: "drop" })
        );
    }

    #[test]
    fn test_update_without_where_only_rejected_when_strict() {
        assert_eq!(StatementPolicy::standard().validate("UPDATE t SET a = 1"), Ok(()));
        assert_eq!(
            StatementPolicy::strict().validate("UPDATE t SET a = 1"),
            Err(Rejection::UnqualifiedUpdate)
        );
        assert_eq!(
            StatementPolicy::strict().validate("UPDATE t SET a = 1 WHERE b = 2"),
            Ok(())
        );
    }

    #[test]
    fn test_ordinary_statements_pass() {
        let policy = StatementPolicy::standard();
        assert_eq!(policy.validate("SELECT * FROM t"), Ok(()));
        assert_eq!(policy.validate("INSERT INTO t VALUES (1)"), Ok(()));
    }

    #[test]
    fn test_rules_are_enumerable() {
        let names: Vec<&str> = StatementPolicy::strict().rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["empty_query", "forbidden_keyword", "unqualified_delete", "unqualified_update"]
        );
        assert_eq!(Rejection::UnqualifiedDelete.code(), "unqualified_delete");
    }
}
