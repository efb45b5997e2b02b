use tracing::trace;

use crate::cache::{floor_char_boundary, DocumentCache, Position, Range};
use crate::error::Result;
use crate::token::LineRecord;
use crate::tokenizer::{tokenize_line, tokenize_text, ScopeTokenizer};

/// One edit to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentChange {
    /// Replace the text between two positions.
    Range { range: Range, text: String },
    /// Replace the whole document.
    Full { text: String },
}

impl ContentChange {
    pub fn replace(start: Position, end: Position, text: impl Into<String>) -> Self {
        Self::Range {
            range: Range::new(start, end),
            text: text.into(),
        }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn full(text: impl Into<String>) -> Self {
        Self::Full { text: text.into() }
    }
}

/// Edits to one document, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub uri: String,
    pub changes: Vec<ContentChange>,
}

/// What an update did to each line of the new cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReparseStats {
    pub retokenized: usize,
    /// Lines inside the edited range whose text and input state were unchanged.
    pub reused: usize,
    /// Lines after the edited range moved without re-tokenization.
    pub shifted: usize,
}

/// Apply one change to `cache`, re-tokenizing as little as possible.
pub fn apply_change<T: ScopeTokenizer + ?Sized>(
    tokenizer: &T,
    cache: &mut DocumentCache<T::State>,
    change: &ContentChange,
) -> Result<ReparseStats> {
    match change {
        ContentChange::Full { text } => {
            let records = tokenize_text(tokenizer, text)?;
            let stats = ReparseStats {
                retokenized: records.len(),
                ..ReparseStats::default()
            };
            *cache = records.into_iter().collect();
            Ok(stats)
        }
        ContentChange::Range { range, text } => replace_range(tokenizer, cache, range, text),
    }
}

fn replace_range<T: ScopeTokenizer + ?Sized>(
    tokenizer: &T,
    cache: &mut DocumentCache<T::State>,
    range: &Range,
    text: &str,
) -> Result<ReparseStats> {
    let contiguous = cache.entries().enumerate().all(|(i, (line, _))| i == line);
    let rebuilt = if cache.is_empty() || !contiguous {
        Some(tokenize_text(tokenizer, &cache.text(None))?)
    } else {
        None
    };

    // Everything fallible happens against borrowed lines; `cache` is only
    // written once the edit is known to succeed.
    let plan = {
        let old: Vec<&LineRecord<T::State>> = match &rebuilt {
            Some(lines) => lines.iter().collect(),
            None => cache.records().collect(),
        };
        plan_range(tokenizer, &old, range, text)?
    };

    let mut lines: Vec<LineRecord<T::State>> = match rebuilt {
        Some(lines) => lines,
        None => std::mem::take(cache).into_records().collect(),
    };
    let shifted = lines.split_off(plan.shift_from.min(lines.len()));
    lines.truncate(plan.start_line);
    lines.extend(plan.records);
    for mut record in shifted {
        let line = (record.line as isize + plan.line_delta) as usize;
        record.renumber(line);
        lines.push(record);
    }

    *cache = lines.into_iter().collect();
    Ok(plan.stats)
}

/// New records for a range edit. Old lines from `shift_from` on only move
/// by `line_delta`.
struct RangePlan<S> {
    start_line: usize,
    line_delta: isize,
    records: Vec<LineRecord<S>>,
    shift_from: usize,
    stats: ReparseStats,
}

fn plan_range<T: ScopeTokenizer + ?Sized>(
    tokenizer: &T,
    old: &[&LineRecord<T::State>],
    range: &Range,
    text: &str,
) -> Result<RangePlan<T::State>> {
    let (mut start, mut end) = (range.start, range.end);
    if end < start {
        std::mem::swap(&mut start, &mut end);
    }
    let start = clamp_position(old, start);
    let end = clamp_position(old, end);

    let prefix = &old[start.line].text[..start.character];
    let suffix = &old[end.line].text[end.character..];
    let new_text = format!("{prefix}{text}{suffix}");
    let new_lines: Vec<&str> = new_text.split('\n').collect();

    let lines_replaced = end.line - start.line;
    let line_delta = (new_lines.len() as isize - 1) - lines_replaced as isize;
    trace!(
        start_line = start.line,
        end_line = end.line,
        line_delta,
        "applying range change"
    );

    let affected = &old[start.line..=end.line];
    let before = start.line.checked_sub(1).map(|i| &old[i].state);
    let mut records: Vec<LineRecord<T::State>> = Vec::with_capacity(new_lines.len());
    let mut stats = ReparseStats::default();

    for (j, line_text) in new_lines.iter().enumerate() {
        let line = start.line + j;
        let incoming = records.last().map(|r| &r.state).or(before);
        let reusable = affected.get(j).filter(|previous| {
            let previous_incoming = if j == 0 {
                before
            } else {
                Some(&affected[j - 1].state)
            };
            previous.text == *line_text && previous_incoming == incoming
        });

        let record = match reusable {
            Some(previous) => {
                stats.reused += 1;
                (*previous).clone()
            }
            None => {
                stats.retokenized += 1;
                tokenize_line(tokenizer, line, line_text, incoming)?
            }
        };
        records.push(record);
    }

    // Lines after the edit keep their tokens once the incoming scanner state
    // matches the one they were tokenized with.
    let mut old_incoming = affected.last().map(|r| &r.state);
    let mut shift_from = old.len();
    for (i, record) in old.iter().enumerate().skip(end.line + 1) {
        let incoming = records.last().map(|r| &r.state).or(before);
        if incoming == old_incoming {
            shift_from = i;
            stats.shifted = old.len() - i;
            break;
        }
        let line = (i as isize + line_delta) as usize;
        trace!(line, "scanner state changed, re-tokenizing");
        let fresh = tokenize_line(tokenizer, line, &record.text, incoming)?;
        stats.retokenized += 1;
        records.push(fresh);
        old_incoming = Some(&record.state);
    }

    Ok(RangePlan {
        start_line: start.line,
        line_delta,
        records,
        shift_from,
        stats,
    })
}

/// Clamp a position onto an existing line and character boundary.
fn clamp_position<S>(lines: &[&LineRecord<S>], position: Position) -> Position {
    let last = lines.len().saturating_sub(1);
    if position.line > last {
        let len = lines.get(last).map_or(0, |r| r.text.len());
        return Position::new(last, len);
    }
    let character = floor_char_boundary(&lines[position.line].text, position.character);
    Position::new(position.line, character)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::SqlScanner;
    use crate::token::GrammarToken;
    use crate::tokenizer::TokenizeLineResult;
    use pretty_assertions::assert_eq;

    fn full(text: &str) -> DocumentCache {
        tokenize_text(&SqlScanner::new(), text)
            .unwrap()
            .into_iter()
            .collect()
    }

    fn edit(text: &str, change: ContentChange) -> (DocumentCache, ReparseStats) {
        let mut cache = full(text);
        let stats = apply_change(&SqlScanner::new(), &mut cache, &change).unwrap();
        (cache, stats)
    }

    #[test]
    fn test_insert_newline_before_from() {
        let (cache, _) = edit(
            "SELECT a FROM t",
            ContentChange::insert(Position::new(0, 9), "\n"),
        );
        assert_eq!(cache.text(None), "SELECT a \nFROM t");
        let from = cache.tokens().find(|t| t.value == "FROM").unwrap();
        assert_eq!(from.line, 1);
        assert_eq!(cache, full("SELECT a \nFROM t"));
    }

    #[test]
    fn test_insert_within_line_shifts_nothing() {
        let (cache, stats) = edit(
            "select a\nfrom t\nwhere x = 1",
            ContentChange::insert(Position::new(0, 8), ", b"),
        );
        assert_eq!(cache.text(None), "select a, b\nfrom t\nwhere x = 1");
        assert_eq!(
            stats,
            ReparseStats {
                retokenized: 1,
                reused: 0,
                shifted: 2
            }
        );
        assert_eq!(cache, full(&cache.text(None)));
    }

    #[test]
    fn test_delete_line_break_merges_lines() {
        let (cache, _) = edit(
            "select a\nfrom t\nwhere x = 1",
            ContentChange::replace(Position::new(0, 8), Position::new(1, 0), " "),
        );
        assert_eq!(cache.text(None), "select a from t\nwhere x = 1");
        assert_eq!(cache.get(1).unwrap().tokens[0].line, 1);
        assert_eq!(cache, full(&cache.text(None)));
    }

    #[test]
    fn test_delete_whole_lines() {
        let text = "select a\n-- one\n-- two\nfrom t";
        let (cache, _) = edit(
            text,
            ContentChange::replace(Position::new(1, 0), Position::new(3, 0), ""),
        );
        assert_eq!(cache.text(None), "select a\nfrom t");
        assert_eq!(cache, full("select a\nfrom t"));
    }

    #[test]
    fn test_multi_line_replacement_renumbers_tail() {
        let text = "select a\nfrom t\nwhere x = 1\norder by a";
        let (cache, stats) = edit(
            text,
            ContentChange::replace(Position::new(1, 5), Position::new(1, 6), "t1\njoin t2\non t1.k = t2.k"),
        );
        assert_eq!(
            stats,
            ReparseStats {
                retokenized: 4,
                reused: 0,
                shifted: 1
            }
        );
        assert_eq!(cache.get(5).unwrap().text, "order by a");
        assert!(cache.get(5).unwrap().tokens.iter().all(|t| t.line == 5));
        assert_eq!(cache, full(&cache.text(None)));
    }

    #[test]
    fn test_opening_comment_retokenizes_tail() {
        let text = "select a\nfrom t\nwhere x = 1";
        let (cache, stats) = edit(text, ContentChange::insert(Position::new(0, 0), "/* "));
        assert_eq!(stats.retokenized, 3);
        assert!(cache.get(2).unwrap().tokens[0].has_scope("comment.block.sql"));
        assert_eq!(cache, full(&cache.text(None)));
    }

    #[test]
    fn test_closing_comment_stabilizes() {
        let text = "/* a\nb\nc */ select 1\nfrom t";
        let (cache, stats) = edit(text, ContentChange::insert(Position::new(0, 4), " */"));
        assert_eq!(stats.retokenized, 3);
        assert_eq!(stats.shifted, 1);
        assert_eq!(cache, full(&cache.text(None)));
        let (cache, stats) = edit(text, ContentChange::insert(Position::new(1, 1), "x"));
        assert_eq!(stats.retokenized, 1);
        assert_eq!(cache, full(&cache.text(None)));
    }

    #[test]
    fn test_unchanged_line_is_reused() {
        let (_, stats) = edit(
            "select a\nfrom t",
            ContentChange::replace(Position::new(0, 0), Position::new(1, 6), "select a\nfrom t"),
        );
        assert_eq!(stats.reused, 2);
        assert_eq!(stats.retokenized, 0);
    }

    #[test]
    fn test_out_of_range_positions_clamp() {
        let (cache, _) = edit(
            "select a",
            ContentChange::insert(Position::new(9, 99), "\nfrom t"),
        );
        assert_eq!(cache.text(None), "select a\nfrom t");
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let (cache, _) = edit(
            "select abc",
            ContentChange::replace(Position::new(0, 10), Position::new(0, 7), "x"),
        );
        assert_eq!(cache.text(None), "select x");
    }

    #[test]
    fn test_full_replacement() {
        let (cache, stats) = edit("select 1", ContentChange::full("select 2\nfrom t"));
        assert_eq!(stats.retokenized, 2);
        assert_eq!(cache, full("select 2\nfrom t"));
    }

    #[test]
    fn test_range_change_on_empty_cache() {
        let mut cache = DocumentCache::new();
        apply_change(
            &SqlScanner::new(),
            &mut cache,
            &ContentChange::insert(Position::new(0, 0), "select 1"),
        )
        .unwrap();
        assert_eq!(cache, full("select 1"));
    }

    /// Tokenizes a line as one token, but never gets past a `!`.
    struct StuckOnBang;

    impl ScopeTokenizer for StuckOnBang {
        type State = ();

        fn tokenize_line(&self, text: &str, _: Option<&()>) -> TokenizeLineResult<()> {
            let stuck = text.contains('!');
            let tokens = if stuck || text.is_empty() {
                Vec::new()
            } else {
                vec![GrammarToken::new(["source.test"], 0, text.len())]
            };
            TokenizeLineResult {
                tokens,
                state: (),
                stopped_early: stuck,
            }
        }
    }

    #[test]
    fn test_failed_change_leaves_cache_untouched() {
        let mut cache: DocumentCache<()> = tokenize_text(&StuckOnBang, "a\nb\nc")
            .unwrap()
            .into_iter()
            .collect();
        let before = cache.clone();

        let inserted = apply_change(
            &StuckOnBang,
            &mut cache,
            &ContentChange::insert(Position::new(1, 0), "!"),
        );
        assert!(inserted.is_err());
        assert_eq!(cache, before);

        let replaced = apply_change(
            &StuckOnBang,
            &mut cache,
            &ContentChange::replace(Position::new(0, 1), Position::new(2, 0), "x\ny!\n"),
        );
        assert!(replaced.is_err());
        assert_eq!(cache, before);
        assert_eq!(cache.text(None), "a\nb\nc");
    }
}
