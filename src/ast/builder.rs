use tracing::trace;

use super::{
    unquote, ArrayAST, SetSpans, CaseStatementAST, CaseWhenAST, Column, ColumnAST, ColumnFunctionAST,
    CommonTableAST, Comparison, ComparisonAST, ComparisonGroupAST, ComparisonOperator,
    FromSource, JoinAST, JoinType, KeywordAST, LogicalOperator, NumberAST, ObjectAST, Operand,
    OrderAST, StatementAST, StatementType, StringAST, WindowAST,
};
use crate::matcher::{MatchedRule, Matcher};
use crate::rule::RuleKind;
use crate::scope;
use crate::token::{find_token, tokens_to_text, Token};

/// Which list a bare column-like match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Columns,
    GroupBy,
    OrderBy,
    Partition,
    Other,
}

const OPERATOR_SCOPES: [&str; 4] = [
    scope::OPERATOR_LOGICAL,
    scope::OPERATOR_COMPARISON,
    scope::OPERATOR_ARITHMETIC,
    scope::OPERATOR_NEGATION,
];

/// Operator matches connect operands; they never become one.
fn is_operator(m: &MatchedRule<'_>) -> bool {
    matches!(
        m.kind(),
        Some(RuleKind::Operator | RuleKind::Comparison | RuleKind::Keyword)
    ) && m.tokens.iter().any(|t| t.has_any_scope(&OPERATOR_SCOPES))
}

fn logical_of(m: &MatchedRule<'_>) -> Option<LogicalOperator> {
    find_token(&m.tokens, scope::OPERATOR_LOGICAL)
        .and_then(|t| LogicalOperator::from_keyword(&t.value))
}

fn comparison_operator_of(m: &MatchedRule<'_>) -> Option<ComparisonOperator> {
    find_token(&m.tokens, scope::OPERATOR_COMPARISON)
        .and_then(|t| ComparisonOperator::from_token(&t.value))
}

/// The alias named by an alias sub-match, if any.
fn alias_of(m: &MatchedRule<'_>) -> Option<String> {
    m.matches
        .iter()
        .rfind(|c| c.kind() == Some(RuleKind::Alias))
        .and_then(|a| {
            a.tokens
                .iter()
                .rev()
                .find(|t| t.has_any_scope(&[scope::TAG, scope::ALIAS]))
        })
        .map(|t| unquote(&t.value).to_string())
}

/// First token of a match that is not a connective.
fn lead_token<'a>(m: &'a MatchedRule<'_>) -> Option<&'a Token> {
    m.tokens
        .iter()
        .find(|t| !t.has_any_scope(&[scope::COMMA, scope::PERIOD, scope::TERMINATOR]))
}

/// The `SELECT ...` run inside `( ... )` of a subquery or CTE match, without
/// the closing parenthesis.
fn inner_statement_tokens(tokens: &[Token]) -> &[Token] {
    let Some(start) = tokens.iter().position(|t| t.has_scope(scope::KEYWORD_SELECT)) else {
        return &[];
    };
    let end = match tokens.last() {
        Some(last) if last.has_scope(scope::GROUP_END) && tokens.len() - 1 > start => {
            tokens.len() - 1
        }
        _ => tokens.len(),
    };
    &tokens[start..end]
}

/// Turns matched-rule trees into [`StatementAST`]s.
///
/// Subqueries and CTE bodies go back through the matcher, so a nested
/// statement is built exactly like a top-level one.
pub struct AstBuilder<'m, 'g> {
    matcher: &'m Matcher<'g>,
}

impl<'m, 'g> AstBuilder<'m, 'g> {
    pub fn new(matcher: &'m Matcher<'g>) -> Self {
        Self { matcher }
    }

    /// Match and build one statement's token run, with spans bounded by the
    /// grammar's non-trivia tokens.
    pub fn statement(&self, tokens: &[Token]) -> StatementAST {
        let grammar = self.matcher.grammar();
        let mut statement = self.build(tokens);
        statement.set_spans(&|t: &Token| !grammar.is_trivia(t));
        statement
    }

    fn build(&self, tokens: &[Token]) -> StatementAST {
        let matches = self.matcher.match_statement(tokens);
        let mut statement = StatementAST {
            statement: tokens_to_text(tokens).trim().to_string(),
            tokens: tokens.to_vec(),
            ..StatementAST::default()
        };
        let mut clause = Clause::Other;
        for m in &matches {
            self.apply(&mut statement, &mut clause, m);
        }
        statement
    }

    fn apply(&self, statement: &mut StatementAST, clause: &mut Clause, m: &MatchedRule<'g>) {
        let Some(kind) = m.kind() else {
            return;
        };
        match kind {
            RuleKind::Select => {
                statement.distinct |= m.tokens.iter().any(|t| t.has_scope(scope::KEYWORD_DISTINCT));
                if statement.kind == StatementType::Unknown {
                    statement.kind = StatementType::Select;
                }
                *clause = Clause::Columns;
            }
            RuleKind::Dml => {
                if let Some(keyword) = find_token(&m.tokens, scope::KEYWORD_DML) {
                    statement.kind = StatementType::from_keyword(&keyword.value);
                }
                let tokens = m.all_tokens();
                if find_token(&tokens, scope::OBJECT).is_some() {
                    statement.object = Some(ObjectAST::from_tokens(&tokens));
                }
                *clause = Clause::Other;
            }
            RuleKind::From => {
                let object = ObjectAST::from_tokens(&m.all_tokens());
                statement.from = Some(FromSource::Object(object));
                *clause = Clause::Other;
            }
            RuleKind::Join => {
                let tokens = m.all_tokens();
                statement.joins.push(JoinAST {
                    kind: join_kind(m),
                    source: Some(FromSource::Object(ObjectAST::from_tokens(&tokens))),
                    on: None,
                    tokens,
                    span: None,
                });
                *clause = Clause::Other;
            }
            RuleKind::Subquery => self.place_subquery(statement, clause, m),
            RuleKind::With => {
                if let Some(cte) = self.common_table(m) {
                    statement.with.push(cte);
                }
                *clause = Clause::Other;
            }
            RuleKind::On => {
                let logical = match lead_token(m) {
                    Some(t) if t.has_scope(scope::KEYWORD_USING) => LogicalOperator::Using,
                    _ => LogicalOperator::On,
                };
                let on = self.comparison_group(&m.matches, Some(logical), m.all_tokens());
                match statement.joins.last_mut() {
                    Some(join) => join.on = Some(on),
                    None => trace!("join condition without a join"),
                }
                *clause = Clause::Other;
            }
            RuleKind::Where => {
                let filter =
                    self.comparison_group(&m.matches, Some(LogicalOperator::Where), m.all_tokens());
                statement.where_clause = Some(filter);
                *clause = Clause::Other;
            }
            RuleKind::Having => {
                statement.having = Some(self.comparison_group(&m.matches, None, m.all_tokens()));
                *clause = Clause::Other;
            }
            RuleKind::GroupBy => *clause = Clause::GroupBy,
            RuleKind::OrderBy => *clause = Clause::OrderBy,
            RuleKind::Direction => {
                if let (Clause::OrderBy, Some(order), Some(token)) =
                    (*clause, statement.order_by.last_mut(), m.tokens.first())
                {
                    order.set_direction(token);
                }
            }
            RuleKind::Limit => {
                statement.limit = find_token(&m.tokens, scope::CONSTANT_NUMERIC)
                    .and_then(|t| t.value.parse().ok());
                *clause = Clause::Other;
            }
            RuleKind::PartitionBy
            | RuleKind::Over
            | RuleKind::Alias
            | RuleKind::Operator
            | RuleKind::Comparison
            | RuleKind::When
            | RuleKind::Then
            | RuleKind::Else => {
                trace!(rule = m.name(), "construct outside its clause");
            }
            RuleKind::Column
            | RuleKind::Function
            | RuleKind::String
            | RuleKind::Number
            | RuleKind::Keyword
            | RuleKind::Case
            | RuleKind::Group => {
                for column in self.columns(m) {
                    push_column(statement, *clause, column);
                }
            }
        }
    }

    /// A subquery lands where its leading keyword says: `FROM (...)`,
    /// `JOIN (...)`, or otherwise the current column list.
    fn place_subquery(&self, statement: &mut StatementAST, clause: &mut Clause, m: &MatchedRule<'g>) {
        let nested = Box::new(self.subquery(m));
        match lead_token(m) {
            Some(t) if t.has_scope(scope::KEYWORD_FROM) => {
                statement.from = Some(FromSource::Statement(nested));
                *clause = Clause::Other;
            }
            Some(t) if t.has_scope(scope::KEYWORD_JOIN) => {
                statement.joins.push(JoinAST {
                    kind: JoinType::from_keyword(&t.value),
                    source: Some(FromSource::Statement(nested)),
                    on: None,
                    tokens: m.all_tokens(),
                    span: None,
                });
                *clause = Clause::Other;
            }
            _ => push_column(statement, *clause, Column::Statement(nested)),
        }
    }

    fn subquery(&self, m: &MatchedRule<'g>) -> StatementAST {
        let mut statement = self.build(inner_statement_tokens(&m.tokens));
        statement.alias = alias_of(m);
        statement
    }

    fn common_table(&self, m: &MatchedRule<'g>) -> Option<CommonTableAST> {
        let name = find_token(&m.tokens, scope::CTE)?;
        Some(CommonTableAST {
            name: unquote(&name.value).to_string(),
            statement: self.build(inner_statement_tokens(&m.tokens)),
            tokens: m.all_tokens(),
            span: None,
        })
    }

    /// Column-like values of a match. Plain groups contribute their contents.
    fn columns(&self, m: &MatchedRule<'g>) -> Vec<Column> {
        match m.kind() {
            Some(RuleKind::Group) => m
                .matches
                .iter()
                .filter(|c| c.kind() != Some(RuleKind::Alias))
                .flat_map(|c| self.columns(c))
                .collect(),
            _ => self.column(m).into_iter().collect(),
        }
    }

    fn column(&self, m: &MatchedRule<'g>) -> Option<Column> {
        if is_operator(m) {
            return None;
        }
        let alias = alias_of(m);
        let tokens = m.all_tokens();
        let column = match m.kind()? {
            RuleKind::Column => Column::Column(ColumnAST::new(&m.tokens, alias, tokens)),
            RuleKind::Function => Column::Function(self.function(m, alias, tokens)),
            RuleKind::String => Column::String(StringAST::new(&m.tokens, alias, tokens)),
            RuleKind::Number => Column::Number(NumberAST::new(&m.tokens, alias, tokens)),
            RuleKind::Keyword => Column::Keyword(KeywordAST::new(&m.tokens, alias, tokens)),
            RuleKind::Case => Column::Case(self.case(m, alias, tokens)),
            RuleKind::Subquery => Column::Statement(Box::new(self.subquery(m))),
            _ => return None,
        };
        Some(column)
    }

    fn first_column(&self, m: &MatchedRule<'g>) -> Option<Box<Column>> {
        m.matches
            .iter()
            .flat_map(|c| self.columns(c))
            .next()
            .map(Box::new)
    }

    fn function(&self, m: &MatchedRule<'g>, alias: Option<String>, tokens: Vec<Token>) -> ColumnFunctionAST {
        let mut function = ColumnFunctionAST {
            function: find_token(&m.tokens, scope::FUNCTION)
                .map(|t| unquote(&t.value).to_string())
                .unwrap_or_default(),
            alias,
            tokens,
            ..ColumnFunctionAST::default()
        };
        for child in &m.matches {
            match child.kind() {
                Some(RuleKind::Over) => function.over = Some(self.window(child)),
                Some(RuleKind::Alias) => {}
                _ => function.parameters.extend(self.columns(child)),
            }
        }
        function
    }

    fn window(&self, m: &MatchedRule<'g>) -> WindowAST {
        let mut window = WindowAST {
            tokens: m.all_tokens(),
            ..WindowAST::default()
        };
        let mut clause = Clause::Other;
        for child in &m.matches {
            match child.kind() {
                Some(RuleKind::PartitionBy) => clause = Clause::Partition,
                Some(RuleKind::OrderBy) => clause = Clause::OrderBy,
                Some(RuleKind::Direction) => {
                    if let (Some(order), Some(token)) = (window.order.last_mut(), child.tokens.first()) {
                        order.set_direction(token);
                    }
                }
                _ => {
                    for column in self.columns(child) {
                        match clause {
                            Clause::Partition => window.partition.push(column),
                            Clause::OrderBy => window.order.push(OrderAST::new(column)),
                            _ => {}
                        }
                    }
                }
            }
        }
        window
    }

    fn case(&self, m: &MatchedRule<'g>, alias: Option<String>, tokens: Vec<Token>) -> CaseStatementAST {
        let mut case = CaseStatementAST {
            alias,
            tokens,
            ..CaseStatementAST::default()
        };
        for child in &m.matches {
            match child.kind() {
                Some(RuleKind::When) => case.whens.push(CaseWhenAST {
                    when: self.comparison_group(&child.matches, None, child.all_tokens()),
                    then: None,
                }),
                Some(RuleKind::Then) => {
                    let then = self.first_column(child);
                    if let Some(when) = case.whens.last_mut() {
                        if when.then.is_none() {
                            when.then = then;
                        }
                    }
                }
                Some(RuleKind::Else) => case.else_ = self.first_column(child),
                Some(RuleKind::Alias) => {}
                _ if case.whens.is_empty() && case.subject.is_none() => {
                    case.subject = self.columns(child).into_iter().next().map(Box::new);
                }
                _ => {}
            }
        }
        case
    }

    /// Partition a flat run of matches into comparisons. An `AND`/`OR`
    /// starts a new comparison; a parenthesised boolean expression becomes a
    /// nested group.
    fn comparison_group(
        &self,
        matches: &[MatchedRule<'g>],
        logical: Option<LogicalOperator>,
        tokens: Vec<Token>,
    ) -> ComparisonGroupAST {
        let mut group = ComparisonGroupAST {
            logical_operator: logical,
            comparisons: Vec::new(),
            tokens,
            span: None,
        };
        let mut part: Vec<&MatchedRule<'g>> = Vec::new();

        for m in matches {
            match m.kind() {
                Some(RuleKind::Operator) if !continues_range(&part, m) => {
                    self.flush(&mut group, &mut part);
                    part.push(m);
                }
                Some(RuleKind::Group) if is_boolean_group(m, &part) => {
                    let logical = logical_of(m).or_else(|| part.iter().find_map(|p| logical_of(p)));
                    if part.iter().all(|p| is_operator(p)) {
                        part.clear();
                    } else {
                        self.flush(&mut group, &mut part);
                    }
                    let nested = self.comparison_group(&m.matches, logical, m.all_tokens());
                    group.comparisons.push(Comparison::Group(nested));
                }
                _ => part.push(m),
            }
        }
        self.flush(&mut group, &mut part);
        group
    }

    fn flush(&self, group: &mut ComparisonGroupAST, part: &mut Vec<&MatchedRule<'g>>) {
        let taken = std::mem::take(part);
        if let Some(leaf) = self.comparison(&taken) {
            group.comparisons.push(Comparison::Leaf(leaf));
        }
    }

    fn comparison(&self, part: &[&MatchedRule<'g>]) -> Option<ComparisonAST> {
        let (logical, rest) = match part.split_first() {
            Some((first, rest)) if first.kind() == Some(RuleKind::Operator) => (logical_of(first), rest),
            _ => (None, part),
        };
        if rest.is_empty() {
            return None;
        }

        let position = rest.iter().position(|m| m.kind() == Some(RuleKind::Comparison));
        let (before, after) = match position {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, &rest[rest.len()..]),
        };
        let operator = position.and_then(|i| comparison_operator_of(rest[i]));

        let right = match operator {
            Some(op) if op.is_range() => {
                let values: Vec<Column> = after.iter().filter_map(|m| self.column(m)).collect();
                let tokens = after.iter().flat_map(|m| m.all_tokens()).collect();
                Some(Operand::Array(ArrayAST {
                    values,
                    tokens,
                    span: None,
                }))
            }
            _ => self.operand(after),
        };

        Some(ComparisonAST {
            logical_operator: logical,
            left: self.operand(before),
            operator,
            right,
            tokens: part.iter().flat_map(|m| m.all_tokens()).collect(),
            span: None,
        })
    }

    fn operand(&self, matches: &[&MatchedRule<'g>]) -> Option<Operand> {
        matches.iter().find_map(|m| match m.kind() {
            Some(RuleKind::Group) => Some(Operand::Array(ArrayAST {
                values: self.columns(m),
                tokens: m.all_tokens(),
                span: None,
            })),
            _ => self.column(m).map(Operand::Column),
        })
    }
}

fn join_kind(m: &MatchedRule<'_>) -> JoinType {
    find_token(&m.tokens, scope::KEYWORD_JOIN)
        .map(|t| JoinType::from_keyword(&t.value))
        .unwrap_or_default()
}

fn push_column(statement: &mut StatementAST, clause: Clause, column: Column) {
    match clause {
        Clause::Columns => statement.columns.push(column),
        Clause::GroupBy => statement.group_by.push(column),
        Clause::OrderBy => statement.order_by.push(OrderAST::new(column)),
        Clause::Partition | Clause::Other => trace!("value outside a column list"),
    }
}

/// `AND` inside `BETWEEN low AND high` belongs to the range.
fn continues_range(part: &[&MatchedRule<'_>], m: &MatchedRule<'_>) -> bool {
    if logical_of(m) != Some(LogicalOperator::And) {
        return false;
    }
    let Some(i) = part
        .iter()
        .position(|p| p.kind() == Some(RuleKind::Comparison))
    else {
        return false;
    };
    let is_range = comparison_operator_of(part[i]).is_some_and(ComparisonOperator::is_range);
    is_range && part[i + 1..].iter().filter(|p| !is_operator(p)).count() < 2
}

/// A group in operand position is a value list; one that opens a
/// comparison and holds comparisons of its own is a nested expression.
fn is_boolean_group(m: &MatchedRule<'_>, part: &[&MatchedRule<'_>]) -> bool {
    if logical_of(m).is_some() {
        return true;
    }
    part.iter().all(|p| is_operator(p))
        && m.matches.iter().any(|c| {
            matches!(
                c.kind(),
                Some(RuleKind::Comparison | RuleKind::Operator | RuleKind::Group)
            )
        })
}
