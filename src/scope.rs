//! Scope names emitted by [`SqlScanner`](crate::lexer::SqlScanner) and read
//! back by the AST builder. The bundled grammar table refers to the same
//! strings.

pub const ROOT: &str = "source.sql";

pub const KEYWORD_SELECT: &str = "keyword.select.sql";
pub const KEYWORD_DISTINCT: &str = "keyword.select.distinct.sql";
pub const KEYWORD_DML: &str = "keyword.dml.sql";
pub const KEYWORD_FROM: &str = "keyword.from.sql";
pub const KEYWORD_JOIN: &str = "keyword.join.sql";
pub const KEYWORD_ON: &str = "keyword.on.sql";
pub const KEYWORD_USING: &str = "keyword.using.sql";
pub const KEYWORD_WHERE: &str = "keyword.where.sql";
pub const KEYWORD_GROUP: &str = "keyword.group.sql";
pub const KEYWORD_HAVING: &str = "keyword.having.sql";
pub const KEYWORD_ORDER: &str = "keyword.order.sql";
pub const KEYWORD_PARTITION: &str = "keyword.partition.sql";
pub const KEYWORD_DIRECTION: &str = "keyword.order.direction.sql";
pub const KEYWORD_LIMIT: &str = "keyword.limit.sql";
pub const KEYWORD_AS: &str = "keyword.as.sql";
pub const KEYWORD_WITH: &str = "keyword.with.sql";
pub const KEYWORD_CASE: &str = "keyword.case.sql";
pub const KEYWORD_WHEN: &str = "keyword.when.sql";
pub const KEYWORD_THEN: &str = "keyword.then.sql";
pub const KEYWORD_ELSE: &str = "keyword.else.sql";
pub const KEYWORD_END: &str = "keyword.end.sql";
pub const KEYWORD_OVER: &str = "keyword.over.sql";
pub const KEYWORD_UNION: &str = "keyword.union.sql";
pub const KEYWORD_OTHER: &str = "keyword.other.sql";

pub const OPERATOR_LOGICAL: &str = "keyword.operator.logical.sql";
pub const OPERATOR_COMPARISON: &str = "keyword.operator.comparison.sql";
pub const OPERATOR_ARITHMETIC: &str = "keyword.operator.arithmetic.sql";
pub const OPERATOR_NEGATION: &str = "keyword.operator.negation.sql";

pub const CONSTANT_LANGUAGE: &str = "constant.language.sql";
pub const CONSTANT_NUMERIC: &str = "constant.numeric.sql";
pub const STRING_SINGLE: &str = "string.quoted.single.sql";
pub const STRING_DOUBLE: &str = "string.quoted.double.sql";
pub const STRING_TRIPLE: &str = "string.quoted.triple.sql";

pub const PROJECT: &str = "entity.name.project.sql";
pub const DATASET: &str = "entity.name.dataset.sql";
pub const OBJECT: &str = "entity.name.object.sql";
pub const ALIAS: &str = "entity.name.alias.sql";
pub const TAG: &str = "entity.name.tag.sql";
pub const FUNCTION: &str = "entity.name.function.sql";
pub const CTE: &str = "entity.name.cte.sql";
pub const COLUMN: &str = "entity.other.column.sql";
pub const STAR: &str = "variable.language.star.sql";
pub const TYPE: &str = "storage.type.sql";
pub const PARAMETER: &str = "variable.parameter.sql";

pub const COMMENT_LINE: &str = "comment.line.double-dash.sql";
pub const COMMENT_HASH: &str = "comment.line.number-sign.sql";
pub const COMMENT_BLOCK: &str = "comment.block.sql";

pub const COMMA: &str = "punctuation.separator.comma.sql";
pub const PERIOD: &str = "punctuation.separator.period.sql";
pub const TERMINATOR: &str = "punctuation.terminator.statement.sql";
pub const GROUP_BEGIN: &str = "punctuation.definition.group.begin.sql";
pub const GROUP_END: &str = "punctuation.definition.group.end.sql";
pub const BRACKET: &str = "punctuation.definition.bracket.sql";

pub const INVALID: &str = "invalid.illegal.character.sql";
