use serde::Deserialize;

use crate::token::Token;

/// What a matched rule means to the AST builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Select,
    Dml,
    From,
    Join,
    On,
    Where,
    Having,
    GroupBy,
    OrderBy,
    PartitionBy,
    Direction,
    Limit,
    With,
    Column,
    Function,
    String,
    Number,
    Keyword,
    Comparison,
    Operator,
    Group,
    Case,
    When,
    Then,
    Else,
    Over,
    Alias,
    Subquery,
}

impl RuleKind {
    /// Rules whose match ends on `SELECT` inside an opening parenthesis; the
    /// matcher pulls in everything up to the balancing `)`.
    pub fn is_subquery(self) -> bool {
        matches!(self, RuleKind::Subquery | RuleKind::With)
    }
}

fn default_standalone() -> bool {
    true
}

/// A grammar production: the scopes a run of significant tokens must carry,
/// position by position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub scopes: Vec<String>,
    /// Positions up to this index are checked ahead of the current token
    /// before the rule is allowed to survive.
    #[serde(default)]
    pub lookahead: usize,
    /// Scopes that reject the rule when carried by the first token after the
    /// lookahead window.
    #[serde(default)]
    pub negative_lookahead: Option<Vec<String>>,
    /// A nested match follows, running until one of `end` or a closing group.
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub end: Option<Vec<String>>,
    /// Rules tried, one construct at a time, right after this one matches.
    #[serde(default)]
    pub children: Option<Vec<String>>,
    /// An optional alias clause may follow.
    #[serde(default)]
    pub alias: bool,
    /// Part of the default working set. Rules that only make sense after
    /// another construct (alias clauses, window clauses) set this to false.
    #[serde(default = "default_standalone")]
    pub standalone: bool,
}

impl Rule {
    pub const WILDCARD: &'static str = "*";

    /// Does `token` satisfy the scope expected at `position`?
    pub fn expects(&self, position: usize, token: &Token) -> bool {
        self.scopes
            .get(position)
            .is_some_and(|scope| scope == Self::WILDCARD || token.has_scope(scope))
    }

    pub fn has_lookahead(&self) -> bool {
        self.lookahead > 0 || self.negative_lookahead.is_some()
    }

    pub fn end_scopes(&self) -> &[String] {
        self.end.as_deref().unwrap_or_default()
    }
}
