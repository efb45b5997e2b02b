use std::sync::Once;

use pretty_assertions::assert_eq;
use sqlscope::ast::{
    Ast, Column, Comparison, ComparisonOperator, FromSource, JoinType, LogicalOperator, Operand,
    OrderDirection, StatementType,
};
use sqlscope::{ChangeEvent, ContentChange, Engine, FileMap, Position, StatementAST, TokenCache};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

fn parse(text: &str) -> FileMap {
    init_tracing();
    Engine::builtin().unwrap().parse_text(text).unwrap()
}

fn first(text: &str) -> StatementAST {
    parse(text).get(0).cloned().unwrap()
}

#[test]
fn test_qualified_column_and_aliased_table() {
    let statement = first("SELECT a.col1 FROM ds.tbl AS t;");
    assert_eq!(statement.kind, StatementType::Select);
    assert_eq!(statement.columns.len(), 1);
    let column = statement.columns[0].as_column().unwrap();
    assert_eq!(column.source.as_deref(), Some("a"));
    assert_eq!(column.column, "col1");

    let from = statement.from.as_ref().and_then(FromSource::as_object).unwrap();
    assert_eq!(from.object.as_deref(), Some("tbl"));
    assert_eq!(from.dataset.as_deref(), Some("ds"));
    assert_eq!(from.project, None);
    assert_eq!(from.alias.as_deref(), Some("t"));
}

#[test]
fn test_subquery_in_from_is_a_statement() {
    let statement = first("SELECT 1 FROM (SELECT 2) x;");
    let nested = statement.from.as_ref().and_then(FromSource::as_statement).unwrap();
    assert_eq!(nested.kind, StatementType::Select);
    assert_eq!(nested.alias.as_deref(), Some("x"));
    assert_eq!(statement.from.as_ref().and_then(FromSource::alias), Some("x"));
}

#[test]
fn test_project_dataset_object() {
    let statement = first("select * from `my-proj.sales.orders` o");
    let from = statement.target().unwrap();
    assert_eq!(from.project.as_deref(), Some("my-proj"));
    assert_eq!(from.dataset.as_deref(), Some("sales"));
    assert_eq!(from.object.as_deref(), Some("orders"));
    assert_eq!(from.alias.as_deref(), Some("o"));
}

#[test]
fn test_statements_are_indexed_in_order() {
    let map = parse("select 1;\ninsert into ds.t (a) select 1;\ndelete from ds.t where a = 1;\n");
    let kinds: Vec<StatementType> = map.statements().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![StatementType::Select, StatementType::Insert, StatementType::Delete]
    );
    let lines: Vec<Option<usize>> = map.statements().map(|s| s.line()).collect();
    assert_eq!(lines, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn test_multi_line_statement_spans() {
    let statement = first("select\n  a,\n  b\nfrom t\nwhere a > 1");
    let span = statement.span().unwrap();
    assert_eq!((span.start_line, span.end_line), (0, 4));
    let lines: Vec<Option<usize>> = statement.columns.iter().map(|c| c.line()).collect();
    assert_eq!(lines, vec![Some(1), Some(2)]);
}

#[test]
fn test_joins_and_conditions() {
    let statement = first(
        "select o.id, c.name\n\
         from ds.orders o\n\
         inner join ds.customers c on o.customer_id = c.id\n\
         left outer join ds.flags f on f.id = o.id\n\
         where o.total >= 10 or c.name = 'a'",
    );
    assert_eq!(statement.joins.len(), 2);
    assert_eq!(statement.joins[0].kind, JoinType::Inner);
    assert_eq!(statement.joins[1].kind, JoinType::Left);

    let customers = statement.joins[0].source.as_ref().and_then(FromSource::as_object).unwrap();
    assert_eq!(customers.qualified_name(), "ds.customers");
    let on = statement.joins[0].on.as_ref().unwrap();
    assert_eq!(on.leaves()[0].operator, Some(ComparisonOperator::Equal));

    let flags = statement.joins[1].source.as_ref().and_then(FromSource::as_object).unwrap();
    assert_eq!(flags.alias.as_deref(), Some("f"));

    let filter = statement.where_clause.as_ref().unwrap();
    let leaves = filter.leaves();
    assert_eq!(leaves[0].operator, Some(ComparisonOperator::GreaterOrEqual));
    assert_eq!(leaves[1].logical_operator, Some(LogicalOperator::Or));
    assert_eq!(leaves[1].operator, Some(ComparisonOperator::Equal));
}

#[test]
fn test_leading_boolean_group() {
    let statement = first("select a from t where (a = 1 or b = 2) and c = 3");
    let filter = statement.where_clause.unwrap();
    let Comparison::Group(group) = &filter.comparisons[0] else {
        panic!("expected a parenthesised group");
    };
    assert_eq!(group.leaves().len(), 2);
    assert_eq!(filter.comparisons[1].logical_operator(), Some(LogicalOperator::And));
}

#[test]
fn test_in_list_operand() {
    let statement = first("select a from t where a not in (1, 2, 3)");
    let leaf = statement.where_clause.as_ref().unwrap().leaves()[0].clone();
    assert_eq!(leaf.operator, Some(ComparisonOperator::NotIn));
    let Some(Operand::Array(values)) = leaf.right else {
        panic!("expected value list");
    };
    assert_eq!(values.values.len(), 3);
}

#[test]
fn test_window_function_and_order() {
    let statement = first(
        "select sum(x) over (partition by a, b order by c desc, d) as rn\nfrom t\norder by rn desc\nlimit 5",
    );
    let function = statement.columns[0].as_function().unwrap();
    assert_eq!(function.function, "sum");
    assert_eq!(function.alias.as_deref(), Some("rn"));
    let window = function.over.as_ref().unwrap();
    assert_eq!(window.partition.len(), 2);
    let directions: Vec<OrderDirection> = window.order.iter().map(|o| o.direction).collect();
    assert_eq!(directions, vec![OrderDirection::Desc, OrderDirection::Asc]);

    assert_eq!(statement.order_by[0].direction, OrderDirection::Desc);
    assert_eq!(statement.limit, Some(5));
}

#[test]
fn test_case_with_nested_function() {
    let statement = first("select case when a = 1 then upper(x) else null end s from t");
    let Column::Case(case) = &statement.columns[0] else {
        panic!("expected case");
    };
    assert!(case.subject.is_none());
    assert_eq!(case.whens.len(), 1);
    let then = case.whens[0].then.as_deref().unwrap();
    assert_eq!(then.as_function().map(|f| f.function.as_str()), Some("upper"));
    assert_eq!(case.alias.as_deref(), Some("s"));
}

#[test]
fn test_common_table_expressions() {
    let statement = first(
        "with base as (\n  select id from ds.events\n), agg as (select id from base)\nselect id from agg",
    );
    assert_eq!(statement.with.len(), 2);
    assert_eq!(statement.with[0].name, "base");
    assert_eq!(
        statement.with[0].statement.target().map(|o| o.qualified_name()),
        Some("ds.events".to_string())
    );
    assert_eq!(statement.target().and_then(|o| o.object.as_deref()), Some("agg"));
}

#[test]
fn test_invalid_sql_degrades_silently() {
    let map = parse("select from where ;;; select a b c d from");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(1).unwrap().kind, StatementType::Select);
}

#[test]
fn test_comments_and_block_comments_are_ignored() {
    let statement = first("select a -- first\n, /* second\n spans */ b\nfrom t # trailing");
    assert_eq!(statement.columns.len(), 2);
    assert!(statement.target().is_some());
}

#[test]
fn test_edit_then_parse_matches_fresh_parse() {
    init_tracing();
    let engine = Engine::builtin().unwrap();
    let mut store = TokenCache::new();
    engine
        .parse(&mut store, "doc", "select a\nfrom t;\nselect b from u;")
        .unwrap();

    let event = ChangeEvent {
        uri: "doc".into(),
        changes: vec![
            ContentChange::replace(Position::new(0, 7), Position::new(0, 8), "x, y"),
            ContentChange::insert(Position::new(2, 0), "-- note\n"),
        ],
    };
    let edited = engine.parse_change(&mut store, &event).unwrap();
    let text = store.get("doc").unwrap().text(None);
    assert_eq!(text, "select x, y\nfrom t;\n-- note\nselect b from u;");
    assert_eq!(edited, engine.parse_text(&text).unwrap());
    assert_eq!(edited.get(0).unwrap().columns.len(), 2);
    assert_eq!(edited.get(1).unwrap().line(), Some(3));

    assert!(store.close("doc").is_some());
    assert!(store.is_empty());
}

#[test]
fn test_parsing_is_idempotent() {
    let text = "with x as (select a from ds.t) select a, count(*) from x where a in (1, 2) group by a;";
    assert_eq!(parse(text), parse(text));
}
