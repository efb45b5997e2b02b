use super::{impl_ast, ArrayAST, Ast, AstSpan, Column, ComparisonOperator, LogicalOperator};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(Column),
    Array(ArrayAST),
}

impl Operand {
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Operand::Column(c) => Some(c),
            Operand::Array(_) => None,
        }
    }
}

impl Ast for Operand {
    fn tokens(&self) -> &[Token] {
        match self {
            Operand::Column(c) => c.tokens(),
            Operand::Array(a) => a.tokens(),
        }
    }

    fn span(&self) -> Option<AstSpan> {
        match self {
            Operand::Column(c) => c.span(),
            Operand::Array(a) => a.span(),
        }
    }
}

/// `left operator right`, with the `AND`/`OR` that connects it to the
/// previous comparison. A bare operand (`WHERE flag`) has no operator and
/// no right side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonAST {
    pub logical_operator: Option<LogicalOperator>,
    pub left: Option<Operand>,
    pub operator: Option<ComparisonOperator>,
    pub right: Option<Operand>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Leaf(ComparisonAST),
    Group(ComparisonGroupAST),
}

impl Comparison {
    pub fn logical_operator(&self) -> Option<LogicalOperator> {
        match self {
            Comparison::Leaf(c) => c.logical_operator,
            Comparison::Group(g) => g.logical_operator,
        }
    }
}

impl Ast for Comparison {
    fn tokens(&self) -> &[Token] {
        match self {
            Comparison::Leaf(c) => c.tokens(),
            Comparison::Group(g) => g.tokens(),
        }
    }

    fn span(&self) -> Option<AstSpan> {
        match self {
            Comparison::Leaf(c) => c.span(),
            Comparison::Group(g) => g.span(),
        }
    }
}

/// A boolean expression: the comparisons of a `WHERE`, `ON`, `HAVING` or
/// `WHEN`, or of a parenthesised sub-expression nested in one of those.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonGroupAST {
    pub logical_operator: Option<LogicalOperator>,
    pub comparisons: Vec<Comparison>,
    pub tokens: Vec<Token>,
    pub span: Option<AstSpan>,
}

impl ComparisonGroupAST {
    /// Depth-first walk over every leaf comparison.
    pub fn leaves(&self) -> Vec<&ComparisonAST> {
        let mut out = Vec::new();
        for comparison in &self.comparisons {
            match comparison {
                Comparison::Leaf(leaf) => out.push(leaf),
                Comparison::Group(group) => out.extend(group.leaves()),
            }
        }
        out
    }
}

impl_ast!(ComparisonAST, ComparisonGroupAST);
