//! Typed statement tree built from matched rules.
//!
//! Every node owns copies of the tokens it was built from. Its [`Ast::span`]
//! is fixed by the builder from the first and last token the grammar does
//! not treat as trivia.

mod builder;
mod column;
mod comparison;
mod enums;
mod object;
mod statement;

pub use builder::AstBuilder;
pub use column::{
    ArrayAST, CaseStatementAST, CaseWhenAST, ColumnAST, ColumnFunctionAST, KeywordAST, NumberAST,
    OrderAST, StringAST, WindowAST,
};
pub use comparison::{Comparison, ComparisonAST, ComparisonGroupAST, Operand};
pub use enums::{ComparisonOperator, JoinType, LogicalOperator, OrderDirection, StatementType};
pub use object::{CommonTableAST, JoinAST, ObjectAST};
pub use statement::{FromSource, StatementAST};

use crate::token::Token;

/// Source position of a node: first significant token start to last
/// significant token end. Lines are zero-based, offsets are bytes within
/// their line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AstSpan {
    pub start_line: usize,
    pub start: usize,
    pub end_line: usize,
    pub end: usize,
}

impl AstSpan {
    pub fn of<F: Fn(&Token) -> bool>(tokens: &[Token], significant: F) -> Option<Self> {
        let mut kept = tokens.iter().filter(|t| significant(*t));
        let first = kept.next()?;
        let last = kept.last().unwrap_or(first);
        Some(Self {
            start_line: first.line,
            start: first.start,
            end_line: last.line,
            end: last.end,
        })
    }
}

pub trait Ast {
    fn tokens(&self) -> &[Token];

    /// Fixed when the tree is built. `None` when the node holds nothing but
    /// trivia.
    fn span(&self) -> Option<AstSpan>;

    fn line(&self) -> Option<usize> {
        self.span().map(|s| s.start_line)
    }
}

macro_rules! impl_ast {
    ($($node:ty),+ $(,)?) => {
        $(
            impl $crate::ast::Ast for $node {
                fn tokens(&self) -> &[$crate::token::Token] {
                    &self.tokens
                }

                fn span(&self) -> Option<$crate::ast::AstSpan> {
                    self.span
                }
            }
        )+
    };
}
pub(crate) use impl_ast;

/// Fills in `span` on a node and everything below it.
pub(crate) trait SetSpans {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool);
}

impl<T: SetSpans> SetSpans for Option<T> {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        if let Some(node) = self {
            node.set_spans(significant);
        }
    }
}

impl<T: SetSpans> SetSpans for Vec<T> {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        for node in self {
            node.set_spans(significant);
        }
    }
}

impl<T: SetSpans> SetSpans for Box<T> {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        (**self).set_spans(significant);
    }
}

macro_rules! impl_set_spans {
    ($($node:ty => [$($child:ident),*]),+ $(,)?) => {
        $(
            impl SetSpans for $node {
                fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
                    self.span = AstSpan::of(&self.tokens, significant);
                    $(self.$child.set_spans(significant);)*
                }
            }
        )+
    };
}

impl_set_spans!(
    StatementAST => [object, with, columns, from, joins, where_clause, group_by, having, order_by],
    ObjectAST => [],
    JoinAST => [source, on],
    CommonTableAST => [statement],
    ColumnAST => [],
    ColumnFunctionAST => [parameters, over],
    StringAST => [],
    NumberAST => [],
    KeywordAST => [],
    CaseStatementAST => [subject, whens, else_],
    WindowAST => [partition, order],
    OrderAST => [column],
    ArrayAST => [values],
    ComparisonAST => [left, right],
    ComparisonGroupAST => [comparisons],
);

impl SetSpans for CaseWhenAST {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        self.when.set_spans(significant);
        self.then.set_spans(significant);
    }
}

impl SetSpans for FromSource {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        match self {
            FromSource::Object(o) => o.set_spans(significant),
            FromSource::Statement(s) => s.set_spans(significant),
        }
    }
}

impl SetSpans for Operand {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        match self {
            Operand::Column(c) => c.set_spans(significant),
            Operand::Array(a) => a.set_spans(significant),
        }
    }
}

impl SetSpans for Comparison {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        match self {
            Comparison::Leaf(c) => c.set_spans(significant),
            Comparison::Group(g) => g.set_spans(significant),
        }
    }
}

impl SetSpans for Column {
    fn set_spans(&mut self, significant: &dyn Fn(&Token) -> bool) {
        match self {
            Column::Column(c) => c.set_spans(significant),
            Column::Function(c) => c.set_spans(significant),
            Column::String(c) => c.set_spans(significant),
            Column::Number(c) => c.set_spans(significant),
            Column::Keyword(c) => c.set_spans(significant),
            Column::Case(c) => c.set_spans(significant),
            Column::Statement(c) => c.set_spans(significant),
        }
    }
}

/// Anything that can sit in a column list, a function argument or an
/// operand position.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Column(ColumnAST),
    Function(ColumnFunctionAST),
    String(StringAST),
    Number(NumberAST),
    Keyword(KeywordAST),
    Case(CaseStatementAST),
    Statement(Box<StatementAST>),
}

impl Column {
    pub fn alias(&self) -> Option<&str> {
        match self {
            Column::Column(c) => c.alias.as_deref(),
            Column::Function(c) => c.alias.as_deref(),
            Column::String(c) => c.alias.as_deref(),
            Column::Number(c) => c.alias.as_deref(),
            Column::Keyword(c) => c.alias.as_deref(),
            Column::Case(c) => c.alias.as_deref(),
            Column::Statement(c) => c.alias.as_deref(),
        }
    }

    pub fn as_column(&self) -> Option<&ColumnAST> {
        match self {
            Column::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&ColumnFunctionAST> {
        match self {
            Column::Function(c) => Some(c),
            _ => None,
        }
    }
}

impl Column {
    fn as_ast(&self) -> &dyn Ast {
        match self {
            Column::Column(c) => c,
            Column::Function(c) => c,
            Column::String(c) => c,
            Column::Number(c) => c,
            Column::Keyword(c) => c,
            Column::Case(c) => c,
            Column::Statement(c) => c.as_ref(),
        }
    }
}

impl Ast for Column {
    fn tokens(&self) -> &[Token] {
        self.as_ast().tokens()
    }

    fn span(&self) -> Option<AstSpan> {
        self.as_ast().span()
    }
}

/// Strip one layer of backticks or matching quotes.
pub(crate) fn unquote(value: &str) -> &str {
    for quote in ["'''", "\"\"\"", "`", "'", "\""] {
        if value.len() >= 2 * quote.len() && value.starts_with(quote) && value.ends_with(quote) {
            return &value[quote.len()..value.len() - quote.len()];
        }
    }
    value
}
