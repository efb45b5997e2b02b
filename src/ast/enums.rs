use std::fmt;

/// Lowercased first word of a keyword token (`LEFT OUTER JOIN` -> `left`).
fn first_word(value: &str) -> String {
    value
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Lowercased keyword with inner whitespace collapsed (`IS  NOT` -> `is not`).
fn normalized(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Truncate,
    Merge,
    Call,
    #[default]
    Unknown,
}

impl StatementType {
    /// Map a statement keyword (`INSERT INTO`, `create or replace table`) to
    /// its type. Anything unrecognised is `Unknown`.
    pub fn from_keyword(value: &str) -> Self {
        match first_word(value).as_str() {
            "select" => StatementType::Select,
            "insert" => StatementType::Insert,
            "update" => StatementType::Update,
            "delete" => StatementType::Delete,
            "create" => StatementType::Create,
            "drop" => StatementType::Drop,
            "alter" => StatementType::Alter,
            "truncate" => StatementType::Truncate,
            "merge" => StatementType::Merge,
            "call" => StatementType::Call,
            _ => StatementType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementType::Select => "select",
            StatementType::Insert => "insert",
            StatementType::Update => "update",
            StatementType::Delete => "delete",
            StatementType::Create => "create",
            StatementType::Drop => "drop",
            StatementType::Alter => "alter",
            StatementType::Truncate => "truncate",
            StatementType::Merge => "merge",
            StatementType::Call => "call",
            StatementType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    /// `NATURAL` joins and a bare `JOIN` are inner joins.
    pub fn from_keyword(value: &str) -> Self {
        let words = normalized(value);
        let word = words
            .split(' ')
            .find(|w| *w != "natural")
            .unwrap_or_default();
        match word {
            "left" => JoinType::Left,
            "right" => JoinType::Right,
            "full" => JoinType::Full,
            "cross" => JoinType::Cross,
            _ => JoinType::Inner,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
            JoinType::Cross => "cross",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The keyword that introduces a comparison or comparison group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
    On,
    Where,
    Using,
}

impl LogicalOperator {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match normalized(value).as_str() {
            "and" => Some(LogicalOperator::And),
            "or" => Some(LogicalOperator::Or),
            "on" => Some(LogicalOperator::On),
            "where" => Some(LogicalOperator::Where),
            "using" => Some(LogicalOperator::Using),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
            LogicalOperator::On => "on",
            LogicalOperator::Where => "where",
            LogicalOperator::Using => "using",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    LessOrGreater,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    Is,
    IsNot,
    Between,
    NotBetween,
}

impl ComparisonOperator {
    pub fn from_token(value: &str) -> Option<Self> {
        let op = match normalized(value).as_str() {
            "=" | "==" => ComparisonOperator::Equal,
            "!=" => ComparisonOperator::NotEqual,
            "<>" => ComparisonOperator::LessOrGreater,
            "<" => ComparisonOperator::Less,
            "<=" => ComparisonOperator::LessOrEqual,
            ">" => ComparisonOperator::Greater,
            ">=" => ComparisonOperator::GreaterOrEqual,
            "like" => ComparisonOperator::Like,
            "not like" => ComparisonOperator::NotLike,
            "in" => ComparisonOperator::In,
            "not in" => ComparisonOperator::NotIn,
            "is" => ComparisonOperator::Is,
            "is not" => ComparisonOperator::IsNot,
            "between" => ComparisonOperator::Between,
            "not between" => ComparisonOperator::NotBetween,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::LessOrGreater => "<>",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::Like => "like",
            ComparisonOperator::NotLike => "not like",
            ComparisonOperator::In => "in",
            ComparisonOperator::NotIn => "not in",
            ComparisonOperator::Is => "is",
            ComparisonOperator::IsNot => "is not",
            ComparisonOperator::Between => "between",
            ComparisonOperator::NotBetween => "not between",
        }
    }

    /// Takes two right-hand operands joined by `AND`.
    pub fn is_range(self) -> bool {
        matches!(self, ComparisonOperator::Between | ComparisonOperator::NotBetween)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match normalized(value).as_str() {
            "asc" => Some(OrderDirection::Asc),
            "desc" => Some(OrderDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_statement_type_from_keyword() {
        assert_eq!(StatementType::from_keyword("SELECT"), StatementType::Select);
        assert_eq!(StatementType::from_keyword("insert into"), StatementType::Insert);
        assert_eq!(
            StatementType::from_keyword("CREATE OR REPLACE TABLE"),
            StatementType::Create
        );
        assert_eq!(StatementType::from_keyword("grant"), StatementType::Unknown);
        assert_eq!(StatementType::from_keyword(""), StatementType::Unknown);
    }

    #[test]
    fn test_join_type_from_keyword() {
        assert_eq!(JoinType::from_keyword("JOIN"), JoinType::Inner);
        assert_eq!(JoinType::from_keyword("LEFT OUTER JOIN"), JoinType::Left);
        assert_eq!(JoinType::from_keyword("cross join"), JoinType::Cross);
        assert_eq!(JoinType::from_keyword("natural full join"), JoinType::Full);
        assert_eq!(JoinType::from_keyword("natural join"), JoinType::Inner);
    }

    #[test]
    fn test_comparison_operator_from_token() {
        assert_eq!(ComparisonOperator::from_token("=="), Some(ComparisonOperator::Equal));
        assert_eq!(ComparisonOperator::from_token("<>"), Some(ComparisonOperator::LessOrGreater));
        assert_eq!(ComparisonOperator::from_token("IS  NOT"), Some(ComparisonOperator::IsNot));
        assert_eq!(ComparisonOperator::from_token("not in"), Some(ComparisonOperator::NotIn));
        assert_eq!(ComparisonOperator::from_token("+"), None);
        assert!(ComparisonOperator::Between.is_range());
    }

    #[test]
    fn test_display_round_trips_keyword() {
        for op in ["=", "!=", "<=", "not like", "is not", "between"] {
            let parsed = ComparisonOperator::from_token(op).unwrap();
            assert_eq!(parsed.to_string(), op);
        }
        assert_eq!(OrderDirection::from_keyword("DESC"), Some(OrderDirection::Desc));
        assert_eq!(LogicalOperator::from_keyword("Or"), Some(LogicalOperator::Or));
        assert_eq!(LogicalOperator::from_keyword("xor"), None);
    }
}
