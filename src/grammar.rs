use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ScopeError};
use crate::rule::{Rule, RuleKind};
use crate::token::Token;

const BUILTIN: &str = include_str!("../grammar/sql.toml");

/// Scope sets that steer the matcher independently of any rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeSets {
    /// Connective tokens (`,` `.` `;`) kept in a match without advancing it.
    pub punctuation: Vec<String>,
    /// Scopes, or scope roots, of tokens the matcher never sees.
    pub skip: Vec<String>,
    pub recursive_group_begin: Vec<String>,
    pub recursive_group_end: Vec<String>,
}

/// The declarative rule table plus its scope sets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Grammar {
    pub sets: ScopeSets,
    pub rules: Vec<Rule>,
}

impl Grammar {
    /// The bundled table for the built-in scanner.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let grammar: Grammar =
            toml::from_str(source).map_err(|e| ScopeError::Grammar(e.to_string()))?;
        grammar.validate()?;
        debug!(rules = grammar.rules.len(), "loaded grammar");
        Ok(grammar)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let grammar: Grammar = toml::from_str(&source)
            .map_err(|e| ScopeError::Grammar(format!("{}: {}", path.display(), e)))?;
        grammar.validate()?;
        debug!(path = %path.display(), rules = grammar.rules.len(), "loaded grammar");
        Ok(grammar)
    }

    fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            if rule.scopes.is_empty() {
                return Err(ScopeError::Grammar(format!(
                    "rule '{}' has no scopes",
                    rule.name
                )));
            }
            for child in rule.children.iter().flatten() {
                if self.rule(child).is_none() {
                    return Err(ScopeError::Grammar(format!(
                        "rule '{}' names unknown child rule '{}'",
                        rule.name, child
                    )));
                }
            }
        }

        let wants_alias = self.rules.iter().any(|r| r.alias);
        if wants_alias && self.alias_rules().next().is_none() {
            return Err(ScopeError::Grammar(
                "rules allow an alias but the table has no alias rules".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// The default working set.
    pub fn standalone_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.standalone)
    }

    pub fn alias_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.kind == RuleKind::Alias)
    }

    /// Rules named in `names`, in table order.
    pub fn rules_named<'a>(&'a self, names: &'a [String]) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |r| names.contains(&r.name))
    }

    /// A token is ignorable if any of its scopes is in the skip set, or if
    /// every scope's root segment is. Bare whitespace carries only a root
    /// like `source.sql`, or no scope at all.
    pub fn is_ignorable(&self, token: &Token) -> bool {
        token.has_any_scope(&self.sets.skip)
            || token.scopes.iter().all(|scope| self.is_root_scope(scope))
    }

    pub fn is_punctuation(&self, token: &Token) -> bool {
        token.has_any_scope(&self.sets.punctuation)
    }

    /// Tokens that never bound a node: ignorable ones and connectives.
    pub fn is_trivia(&self, token: &Token) -> bool {
        self.is_ignorable(token) || self.is_punctuation(token)
    }

    /// `source.sql` style roots that every token of a tokenizer may carry.
    pub fn is_root_scope(&self, scope: &str) -> bool {
        let root = scope.split('.').next().unwrap_or_default();
        self.sets.skip.iter().any(|s| s == root)
    }

    pub fn is_group_begin(&self, token: &Token) -> bool {
        token.has_any_scope(&self.sets.recursive_group_begin)
    }

    pub fn is_group_end(&self, token: &Token) -> bool {
        token.has_any_scope(&self.sets.recursive_group_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope;
    use crate::token::Scopes;
    use compact_str::CompactString;

    fn token(scopes: &[&str]) -> Token {
        let scopes: Scopes = scopes.iter().map(|s| CompactString::from(*s)).collect();
        Token::new(scopes, 0, 1, 0, "x")
    }

    const MINIMAL: &str = r#"
        [sets]
        punctuation = ["punctuation.separator.comma.sql"]
        skip = ["source"]
        recursive_group_begin = ["punctuation.definition.group.begin.sql"]
        recursive_group_end = ["punctuation.definition.group.end.sql"]

        [[rules]]
        name = "column"
        kind = "column"
        scopes = ["entity.other.column.sql"]
    "#;

    #[test]
    fn test_builtin_loads() {
        let grammar = Grammar::builtin().unwrap();
        assert!(grammar.rule("select").is_some());
        assert_eq!(grammar.rule("function").unwrap().kind, RuleKind::Function);
        assert!(grammar.alias_rules().count() >= 2);
        assert!(grammar.standalone_rules().all(|r| r.kind != RuleKind::Alias));
    }

    #[test]
    fn test_minimal_table() {
        let grammar = Grammar::from_toml_str(MINIMAL).unwrap();
        assert_eq!(grammar.rules.len(), 1);
    }

    #[test]
    fn test_unknown_child_rejected() {
        let source = format!(
            "{MINIMAL}\n[[rules]]\nname = \"f\"\nkind = \"function\"\nscopes = [\"a\"]\nchildren = [\"missing\"]\n"
        );
        let err = Grammar::from_toml_str(&source).unwrap_err();
        assert!(matches!(err, ScopeError::Grammar(msg) if msg.contains("missing")));
    }

    #[test]
    fn test_empty_scopes_rejected() {
        let source = format!("{MINIMAL}\n[[rules]]\nname = \"e\"\nkind = \"keyword\"\nscopes = []\n");
        assert!(Grammar::from_toml_str(&source).is_err());
    }

    #[test]
    fn test_alias_without_alias_rules_rejected() {
        let source = MINIMAL.replace(
            "scopes = [\"entity.other.column.sql\"]",
            "scopes = [\"entity.other.column.sql\"]\nalias = true",
        );
        assert!(Grammar::from_toml_str(&source).is_err());
    }

    #[test]
    fn test_ignorable_tokens() {
        let grammar = Grammar::builtin().unwrap();
        assert!(grammar.is_ignorable(&token(&[scope::ROOT])));
        assert!(grammar.is_ignorable(&token(&[scope::ROOT, scope::COMMENT_LINE])));
        assert!(grammar.is_ignorable(&token(&[])));
        assert!(!grammar.is_ignorable(&token(&[scope::ROOT, scope::COLUMN])));
    }

    #[test]
    fn test_scope_set_membership() {
        let grammar = Grammar::builtin().unwrap();
        assert!(grammar.is_punctuation(&token(&[scope::ROOT, scope::COMMA])));
        assert!(grammar.is_group_begin(&token(&[scope::ROOT, scope::GROUP_BEGIN])));
        assert!(grammar.is_group_begin(&token(&[scope::ROOT, scope::KEYWORD_CASE])));
        assert!(grammar.is_group_end(&token(&[scope::ROOT, scope::KEYWORD_END])));
        assert!(!grammar.is_group_end(&token(&[scope::ROOT, scope::GROUP_BEGIN])));
    }
}
