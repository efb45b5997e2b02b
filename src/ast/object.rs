use super::{impl_ast, unquote, AstSpan, ComparisonGroupAST, FromSource, JoinType, StatementAST};
use crate::scope;
use crate::token::{find_token, Token};

/// A table reference: `project.dataset.object alias`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAST {
    pub project: Option<String>,
    pub dataset: Option<String>,
    pub object: Option<String>,
    pub alias: Option<String>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl ObjectAST {
    /// Resolve the name parts from token scopes. A single backticked object
    /// token holding dots (`` `p.d.t` ``) is split from the right.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let value = |scope: &str| find_token(tokens, scope).map(|t| unquote(&t.value).to_string());
        let mut object = Self {
            project: value(scope::PROJECT),
            dataset: value(scope::DATASET),
            object: value(scope::OBJECT),
            alias: tokens
                .iter()
                .rev()
                .find(|t| t.has_any_scope(&[scope::ALIAS, scope::TAG]))
                .map(|t| unquote(&t.value).to_string()),
            tokens: tokens.to_vec(),
            span: None,
        };

        if let Some(name) = object.object.take() {
            let mut parts = name.rsplitn(3, '.');
            object.object = parts.next().map(str::to_string);
            let (dataset, project) = (parts.next(), parts.next());
            if object.dataset.is_none() {
                object.dataset = dataset.map(str::to_string);
            }
            if object.project.is_none() {
                object.project = project.map(str::to_string);
            }
        }
        object
    }

    /// Dotted name without the alias.
    pub fn qualified_name(&self) -> String {
        [&self.project, &self.dataset, &self.object]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinAST {
    pub kind: JoinType,
    pub source: Option<FromSource>,
    pub on: Option<ComparisonGroupAST>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

/// One `name AS (SELECT ...)` entry of a `WITH` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableAST {
    pub name: String,
    pub statement: StatementAST,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl_ast!(ObjectAST, JoinAST, CommonTableAST);
