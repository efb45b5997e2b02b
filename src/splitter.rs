use memchr::memchr_iter;

use crate::token::Token;

/// One statement's slice of a document.
///
/// `start` is the first non-whitespace byte of the statement and `end` is
/// one past its terminating `;` (or the end of the text for a trailing
/// statement). Lines are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Split raw text at every `;`.
///
/// Terminators are found byte-wise, so a `;` inside a string literal or a
/// comment also ends a statement. Segments holding nothing but whitespace
/// and their terminator are dropped; text with no terminator is a single
/// statement.
///
/// Dropped segments take no position in the result, so statement indices
/// count only non-blank statements: in `"SELECT 1;;SELECT 2;"` the second
/// statement has index 1.
pub fn split_statements(text: &str) -> Vec<StatementSpan> {
    let starts = line_starts(text);
    let mut spans = Vec::new();
    let mut from = 0;

    let ends = memchr_iter(b';', text.as_bytes())
        .map(|i| i + 1)
        .chain((from < text.len()).then_some(text.len()));
    for end in ends {
        if end <= from {
            continue;
        }
        if let Some(span) = make_span(text, &starts, from, end) {
            spans.push(span);
        }
        from = end;
    }
    spans
}

fn make_span(text: &str, starts: &[usize], from: usize, end: usize) -> Option<StatementSpan> {
    let segment = &text[from..end];
    let lead = segment.len() - segment.trim_start().len();
    if segment.strip_suffix(';').unwrap_or(segment).trim().is_empty() {
        return None;
    }
    let start = from + lead;
    Some(StatementSpan {
        start,
        end,
        text: text[start..end].to_string(),
        start_line: line_of(starts, start),
        end_line: line_of(starts, end.saturating_sub(1).max(start)),
    })
}

/// Byte offset where each `\n`-separated line starts.
pub fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(memchr_iter(b'\n', text.as_bytes()).map(|i| i + 1))
        .collect()
}

fn line_of(starts: &[usize], offset: usize) -> usize {
    starts.partition_point(|&s| s <= offset).saturating_sub(1)
}

/// Absolute byte offset of a token's start.
fn offset_of(starts: &[usize], token: &Token) -> usize {
    starts
        .get(token.line)
        .map_or(usize::MAX, |s| s.saturating_add(token.start))
}

/// The tokens of `tokens` (document order) that start inside `span`.
pub fn statement_tokens(tokens: &[Token], starts: &[usize], span: &StatementSpan) -> Vec<Token> {
    let first = tokens.partition_point(|t| offset_of(starts, t) < span.start);
    let last = tokens.partition_point(|t| offset_of(starts, t) < span.end);
    tokens[first..last.max(first)].to_vec()
}
