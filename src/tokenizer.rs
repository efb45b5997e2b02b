use std::fmt;

use tracing::trace;

use crate::error::{Result, ScopeError};
use crate::token::{GrammarToken, LineRecord};

/// Output of a single scope tokenizer call.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeLineResult<S> {
    pub tokens: Vec<GrammarToken>,
    pub state: S,
    /// The tokenizer gave up before the end of the text. The caller resumes
    /// from the end of the last returned token.
    pub stopped_early: bool,
}

/// A line-oriented scope tokenizer.
///
/// Given one line of text (without its terminator) and the state left by the
/// previous line, it returns scoped tokens and the state at the end of the
/// line. `None` means "start of document".
pub trait ScopeTokenizer {
    type State: Clone + PartialEq + fmt::Debug;

    fn tokenize_line(&self, text: &str, state: Option<&Self::State>)
        -> TokenizeLineResult<Self::State>;
}

impl<T: ScopeTokenizer + ?Sized> ScopeTokenizer for &T {
    type State = T::State;

    fn tokenize_line(
        &self,
        text: &str,
        state: Option<&Self::State>,
    ) -> TokenizeLineResult<Self::State> {
        (**self).tokenize_line(text, state)
    }
}

/// Tokenize one line into a [`LineRecord`].
///
/// If the tokenizer stops early it is called again on the unconsumed
/// remainder, with offsets shifted by what was already consumed, until the
/// whole line is covered.
pub fn tokenize_line<T: ScopeTokenizer + ?Sized>(
    tokenizer: &T,
    line: usize,
    text: &str,
    state: Option<&T::State>,
) -> Result<LineRecord<T::State>> {
    let first = tokenizer.tokenize_line(text, state);
    let mut tokens = first.tokens;
    let mut state = first.state;
    let mut stopped_early = first.stopped_early;
    let mut consumed = tokens.last().map_or(0, |t| t.end);

    while stopped_early && consumed < text.len() {
        let rest = text.get(consumed..).ok_or_else(|| ScopeError::Tokenizer {
            line,
            message: format!("early stop at offset {} is not a character boundary", consumed),
        })?;
        trace!(line, consumed, "tokenizer stopped early, resuming");

        let next = tokenizer.tokenize_line(rest, Some(&state));
        let advanced = next.tokens.last().map_or(0, |t| t.end);
        if advanced == 0 {
            return Err(ScopeError::Tokenizer {
                line,
                message: format!("tokenizer made no progress at offset {}", consumed),
            });
        }

        tokens.extend(next.tokens.into_iter().map(|mut t| {
            t.start += consumed;
            t.end += consumed;
            t
        }));
        consumed += advanced;
        state = next.state;
        stopped_early = next.stopped_early;
    }

    LineRecord::from_grammar_tokens(line, text, tokens, state)
}

/// Tokenize a whole document from a reset state, one record per line.
pub fn tokenize_text<T: ScopeTokenizer + ?Sized>(
    tokenizer: &T,
    text: &str,
) -> Result<Vec<LineRecord<T::State>>> {
    let mut records: Vec<LineRecord<T::State>> = Vec::new();
    for (line, line_text) in text.split('\n').enumerate() {
        let state = records.last().map(|r| &r.state);
        let record = tokenize_line(tokenizer, line, line_text, state)?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::SqlScanner;
    use pretty_assertions::assert_eq;

    /// Emits one token per call, then claims to have stopped early.
    struct OneAtATime;

    impl ScopeTokenizer for OneAtATime {
        type State = usize;

        fn tokenize_line(&self, text: &str, state: Option<&usize>) -> TokenizeLineResult<usize> {
            let calls = state.copied().unwrap_or(0) + 1;
            let end = text.chars().next().map_or(0, char::len_utf8);
            TokenizeLineResult {
                tokens: vec![GrammarToken::new(["source.test"], 0, end)],
                state: calls,
                stopped_early: end < text.len(),
            }
        }
    }

    struct Stuck;

    impl ScopeTokenizer for Stuck {
        type State = ();

        fn tokenize_line(&self, _text: &str, _state: Option<&()>) -> TokenizeLineResult<()> {
            TokenizeLineResult {
                tokens: Vec::new(),
                state: (),
                stopped_early: true,
            }
        }
    }

    #[test]
    fn test_resumes_after_early_stop() {
        let record = tokenize_line(&OneAtATime, 4, "abé", None).unwrap();
        assert_eq!(record.tokens.len(), 3);
        assert_eq!(record.value(), "abé");
        assert_eq!(
            record.tokens.iter().map(|t| (t.start, t.end)).collect::<Vec<_>>(),
            vec![(0, 1), (1, 2), (2, 4)]
        );
        assert_eq!(record.state, 3);
        assert!(record.tokens.iter().all(|t| t.line == 4));
    }

    #[test]
    fn test_no_progress_is_fatal() {
        let err = tokenize_line(&Stuck, 0, "select", None).unwrap_err();
        assert!(matches!(err, ScopeError::Tokenizer { line: 0, .. }));
    }

    #[test]
    fn test_limited_scanner_matches_unlimited() {
        let text = "select a.b, count(*) as n from ds.tbl t -- trailing";
        let full = tokenize_line(&SqlScanner::new(), 0, text, None).unwrap();
        let limited = tokenize_line(&SqlScanner::with_token_limit(2), 0, text, None).unwrap();
        assert_eq!(full, limited);
    }

    #[test]
    fn test_tokenize_text_threads_state() {
        let records = tokenize_text(&SqlScanner::new(), "select 1 /* open\nstill comment */ x").unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].tokens[0].has_scope("comment.block.sql"));
        assert_eq!(records[1].tokens[0].value, "still comment */");
    }

    #[test]
    fn test_empty_text_is_one_line() {
        let records = tokenize_text(&SqlScanner::new(), "").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].tokens.is_empty());
    }
}
