use super::{impl_ast, unquote, AstSpan, Column, ComparisonGroupAST, OrderDirection};
use crate::scope;
use crate::token::{join_token_values, Token};

/// A column reference, optionally qualified (`t.col`, `ds.t.col`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAST {
    /// The qualifier closest to the column name.
    pub source: Option<String>,
    pub column: String,
    pub alias: Option<String>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl ColumnAST {
    /// Build from the tokens of a column match. `own` are the tokens of the
    /// reference itself, `tokens` everything the node spans.
    pub fn new(own: &[Token], alias: Option<String>, tokens: Vec<Token>) -> Self {
        let position = own.iter().rposition(|t| t.has_scope(scope::COLUMN));
        let column = position
            .map(|i| unquote(&own[i].value).to_string())
            .unwrap_or_default();
        let source = own[..position.unwrap_or(own.len())]
            .iter()
            .rev()
            .find(|t| t.has_scope(scope::ALIAS))
            .map(|t| unquote(&t.value).to_string());
        Self {
            source,
            column,
            alias,
            tokens,
            span: None,
        }
    }

    /// `a AS a` and `t.a AS a`.
    pub fn redundant_alias(&self) -> bool {
        self.alias
            .as_deref()
            .is_some_and(|alias| alias.eq_ignore_ascii_case(&self.column))
    }

    pub fn is_star(&self) -> bool {
        self.column == "*"
    }
}

/// A function call with its arguments, window clause and alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnFunctionAST {
    pub function: String,
    pub parameters: Vec<Column>,
    pub over: Option<WindowAST>,
    pub alias: Option<String>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringAST {
    /// Contents without the surrounding quotes.
    pub value: String,
    pub alias: Option<String>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl StringAST {
    pub fn new(own: &[Token], alias: Option<String>, tokens: Vec<Token>) -> Self {
        let raw = join_token_values(
            &own.iter()
                .filter(|t| !t.has_scope(scope::COMMA))
                .cloned()
                .collect::<Vec<_>>(),
            "",
        );
        Self {
            value: unquote(&raw).to_string(),
            alias,
            tokens,
            span: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberAST {
    pub raw: String,
    /// `None` when the literal does not fit an `f64` parse.
    pub value: Option<f64>,
    pub alias: Option<String>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl NumberAST {
    pub fn new(own: &[Token], alias: Option<String>, tokens: Vec<Token>) -> Self {
        let raw = own
            .iter()
            .find(|t| t.has_scope(scope::CONSTANT_NUMERIC))
            .map(|t| t.value.to_string())
            .unwrap_or_default();
        Self {
            value: parse_number(&raw),
            raw,
            alias,
            tokens,
            span: None,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok().map(|n| n as f64),
        None => raw.parse().ok(),
    }
}

/// Keyword-like leaves: `NULL`, `TRUE`, query parameters, operators in
/// argument lists, and the type of a `CAST(x AS type)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordAST {
    pub value: String,
    pub alias: Option<String>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl KeywordAST {
    pub fn new(own: &[Token], alias: Option<String>, tokens: Vec<Token>) -> Self {
        let value = match own.iter().find(|t| t.has_scope(scope::TYPE)) {
            Some(ty) => ty.value.to_string(),
            None => own
                .iter()
                .filter(|t| !t.has_scope(scope::COMMA))
                .map(|t| t.value.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        };
        Self {
            value,
            alias,
            tokens,
            span: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseWhenAST {
    pub when: ComparisonGroupAST,
    pub then: Option<Box<Column>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseStatementAST {
    /// The operand of a simple `CASE x WHEN ...` form.
    pub subject: Option<Box<Column>>,
    pub whens: Vec<CaseWhenAST>,
    pub else_: Option<Box<Column>>,
    pub alias: Option<String>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

/// `OVER (PARTITION BY ... ORDER BY ...)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowAST {
    pub partition: Vec<Column>,
    pub order: Vec<OrderAST>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAST {
    pub column: Column,
    pub direction: OrderDirection,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl OrderAST {
    pub fn new(column: Column) -> Self {
        let tokens = super::Ast::tokens(&column).to_vec();
        Self {
            column,
            direction: OrderDirection::default(),
            tokens,
            span: None,
        }
    }

    /// Apply an `ASC`/`DESC` keyword that follows the column.
    pub fn set_direction(&mut self, token: &Token) {
        if let Some(direction) = OrderDirection::from_keyword(&token.value) {
            self.direction = direction;
            self.tokens.push(token.clone());
        }
    }
}

/// A parenthesised value list on the right of `IN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayAST {
    pub values: Vec<Column>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl_ast!(
    ColumnAST,
    ColumnFunctionAST,
    StringAST,
    NumberAST,
    KeywordAST,
    CaseStatementAST,
    WindowAST,
    OrderAST,
    ArrayAST,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Scopes;
    use compact_str::CompactString;
    use pretty_assertions::assert_eq;

    fn token(scopes: &[&str], start: usize, value: &str) -> Token {
        let scopes: Scopes = std::iter::once(scope::ROOT)
            .chain(scopes.iter().copied())
            .map(CompactString::from)
            .collect();
        Token::new(scopes, start, start + value.len(), 0, value)
    }

    #[test]
    fn test_qualified_column() {
        let own = vec![
            token(&[scope::ALIAS], 0, "ds"),
            token(&[scope::PERIOD], 2, "."),
            token(&[scope::ALIAS], 3, "t"),
            token(&[scope::PERIOD], 4, "."),
            token(&[scope::COLUMN], 5, "col"),
        ];
        let column = ColumnAST::new(&own, None, own.clone());
        assert_eq!(column.source.as_deref(), Some("t"));
        assert_eq!(column.column, "col");
    }

    #[test]
    fn test_redundant_alias() {
        let own = vec![token(&[scope::COLUMN], 0, "Amount")];
        let column = ColumnAST::new(&own, Some("amount".into()), own.clone());
        assert!(column.redundant_alias());
        let column = ColumnAST::new(&own, Some("total".into()), own.clone());
        assert!(!column.redundant_alias());
        assert!(!ColumnAST::new(&own, None, own.clone()).redundant_alias());
    }

    #[test]
    fn test_literals() {
        let string = StringAST::new(&[token(&[scope::STRING_SINGLE], 0, "'abc'")], None, vec![]);
        assert_eq!(string.value, "abc");
        let number = NumberAST::new(&[token(&[scope::CONSTANT_NUMERIC], 0, "2.5")], None, vec![]);
        assert_eq!(number.value, Some(2.5));
        let hex = NumberAST::new(&[token(&[scope::CONSTANT_NUMERIC], 0, "0xFF")], None, vec![]);
        assert_eq!(hex.value, Some(255.0));
    }

    #[test]
    fn test_keyword_prefers_type() {
        let own = vec![
            token(&[scope::KEYWORD_AS], 0, "as"),
            token(&[scope::TYPE], 3, "INT64"),
        ];
        assert_eq!(KeywordAST::new(&own, None, vec![]).value, "INT64");
        let own = vec![token(&[scope::CONSTANT_LANGUAGE], 0, "NULL")];
        assert_eq!(KeywordAST::new(&own, None, vec![]).value, "NULL");
    }
}
