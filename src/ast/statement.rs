use super::{
    impl_ast, AstSpan, Column, CommonTableAST, ComparisonGroupAST, JoinAST, ObjectAST, OrderAST,
    StatementType,
};
use crate::token::Token;

/// Where rows come from: a table reference or a nested statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FromSource {
    Object(ObjectAST),
    Statement(Box<StatementAST>),
}

impl FromSource {
    pub fn as_object(&self) -> Option<&ObjectAST> {
        match self {
            FromSource::Object(o) => Some(o),
            FromSource::Statement(_) => None,
        }
    }

    pub fn as_statement(&self) -> Option<&StatementAST> {
        match self {
            FromSource::Statement(s) => Some(s),
            FromSource::Object(_) => None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            FromSource::Object(o) => o.alias.as_deref(),
            FromSource::Statement(s) => s.alias.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementAST {
    pub kind: StatementType,
    /// Target of a DML statement.
    pub object: Option<ObjectAST>,
    pub with: Vec<CommonTableAST>,
    pub distinct: bool,
    pub columns: Vec<Column>,
    pub from: Option<FromSource>,
    pub joins: Vec<JoinAST>,
    pub where_clause: Option<ComparisonGroupAST>,
    pub group_by: Vec<Column>,
    pub having: Option<ComparisonGroupAST>,
    pub order_by: Vec<OrderAST>,
    pub limit: Option<u64>,
    /// Set when the statement is a subquery with an alias.
    pub alias: Option<String>,
    /// Source text of the statement, trimmed.
    pub statement: String,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl StatementAST {
    /// The table the statement reads from or writes to, if it names one.
    pub fn target(&self) -> Option<&ObjectAST> {
        self.object
            .as_ref()
            .or_else(|| self.from.as_ref().and_then(FromSource::as_object))
    }
}

impl_ast!(StatementAST);
