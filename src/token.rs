use compact_str::CompactString;
use smallvec::SmallVec;

use crate::error::{Result, ScopeError};
use crate::lexer::ScannerState;

/// Byte offset within a line.
pub type Pos = usize;

/// Scope tags attached to a token, outermost first.
pub type Scopes = SmallVec<[CompactString; 4]>;

/// A token as reported by a scope tokenizer: scopes plus byte offsets into
/// the text it was given. Carries no line number and no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GrammarToken {
    pub scopes: Scopes,
    pub start: Pos,
    pub end: Pos,
}

impl GrammarToken {
    pub fn new<I, S>(scopes: I, start: Pos, end: Pos) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        Self {
            scopes: scopes.into_iter().map(Into::into).collect(),
            start,
            end,
        }
    }
}

/// A scanned unit of text with its scope tags, its offsets within the line,
/// the line it came from and the literal substring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub scopes: Scopes,
    pub start: Pos,
    pub end: Pos,
    pub line: usize,
    pub value: CompactString,
}

impl Token {
    pub fn new(scopes: Scopes, start: Pos, end: Pos, line: usize, value: &str) -> Self {
        Self {
            scopes,
            start,
            end,
            line,
            value: CompactString::from(value),
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn has_any_scope<S: AsRef<str>>(&self, scopes: &[S]) -> bool {
        self.scopes
            .iter()
            .any(|s| scopes.iter().any(|wanted| wanted.as_ref() == s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One tokenized source line.
///
/// `state` is the scanner state at the end of the line, which is the input
/// state for tokenizing the following line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord<S = ScannerState> {
    pub line: usize,
    pub text: String,
    /// Union of the scopes of every token on the line, first-seen order.
    pub scopes: Scopes,
    pub tokens: Vec<Token>,
    pub state: S,
}

impl<S> LineRecord<S> {
    /// Build a record from raw tokenizer output.
    ///
    /// Offsets must be ascending, non-overlapping, inside the line and on
    /// UTF-8 boundaries. Anything else is a tokenizer bug and is fatal.
    pub fn from_grammar_tokens(
        line: usize,
        text: &str,
        grammar_tokens: Vec<GrammarToken>,
        state: S,
    ) -> Result<Self> {
        let mut tokens = Vec::with_capacity(grammar_tokens.len());
        let mut scopes = Scopes::new();
        let mut last_end = 0;

        for gt in grammar_tokens {
            if gt.start > gt.end || gt.end > text.len() {
                return Err(ScopeError::Tokenizer {
                    line,
                    message: format!(
                        "token offsets {}..{} outside line of length {}",
                        gt.start,
                        gt.end,
                        text.len()
                    ),
                });
            }
            if gt.start < last_end {
                return Err(ScopeError::Tokenizer {
                    line,
                    message: format!(
                        "token at {} overlaps previous token ending at {}",
                        gt.start, last_end
                    ),
                });
            }
            if !text.is_char_boundary(gt.start) || !text.is_char_boundary(gt.end) {
                return Err(ScopeError::Tokenizer {
                    line,
                    message: format!("token offsets {}..{} split a character", gt.start, gt.end),
                });
            }
            for scope in &gt.scopes {
                if !scopes.contains(scope) {
                    scopes.push(scope.clone());
                }
            }
            last_end = gt.end;
            let value = &text[gt.start..gt.end];
            tokens.push(Token::new(gt.scopes, gt.start, gt.end, line, value));
        }

        Ok(Self {
            line,
            text: text.to_string(),
            scopes,
            tokens,
            state,
        })
    }

    /// Move the record to another line number, along with all its tokens.
    pub fn renumber(&mut self, line: usize) {
        self.line = line;
        for token in &mut self.tokens {
            token.line = line;
        }
    }

    /// Concatenated token values.
    pub fn value(&self) -> String {
        join_token_values(&self.tokens, "")
    }
}

/// First token carrying `scope`.
pub fn find_token<'a>(tokens: &'a [Token], scope: &str) -> Option<&'a Token> {
    tokens.iter().find(|t| t.has_scope(scope))
}

/// Sort by line, then start offset.
pub fn sort_tokens(tokens: &mut [Token]) {
    tokens.sort_by_key(|t| (t.line, t.start));
}

pub fn join_token_values(tokens: &[Token], separator: &str) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(&token.value);
    }
    out
}

/// Rebuild source text from a token run, inserting a newline wherever the
/// run crosses into a later line.
pub fn tokens_to_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut line = tokens.first().map(|t| t.line);
    for token in tokens {
        if let Some(current) = line {
            for _ in current..token.line {
                out.push('\n');
            }
        }
        line = Some(token.line);
        out.push_str(&token.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(scopes: &[&str], start: Pos, end: Pos, line: usize, value: &str) -> Token {
        Token::new(
            scopes.iter().map(|s| CompactString::from(*s)).collect(),
            start,
            end,
            line,
            value,
        )
    }

    #[test]
    fn test_from_grammar_tokens_slices_values() {
        let text = "select a";
        let record = LineRecord::from_grammar_tokens(
            3,
            text,
            vec![
                GrammarToken::new(["source.sql", "keyword.select.sql"], 0, 6),
                GrammarToken::new(["source.sql"], 6, 7),
                GrammarToken::new(["source.sql", "entity.other.column.sql"], 7, 8),
            ],
            (),
        )
        .unwrap();
        assert_eq!(record.line, 3);
        assert_eq!(record.value(), text);
        assert_eq!(record.tokens[0].value, "select");
        assert!(record.tokens.iter().all(|t| t.line == 3));
        assert_eq!(
            record.scopes.as_slice(),
            &["source.sql", "keyword.select.sql", "entity.other.column.sql"]
        );
    }

    #[test]
    fn test_from_grammar_tokens_rejects_out_of_range() {
        let err = LineRecord::from_grammar_tokens(
            0,
            "abc",
            vec![GrammarToken::new(["source.sql"], 1, 9)],
            (),
        )
        .unwrap_err();
        assert!(matches!(err, ScopeError::Tokenizer { line: 0, .. }));
    }

    #[test]
    fn test_from_grammar_tokens_rejects_overlap() {
        let result = LineRecord::from_grammar_tokens(
            0,
            "abcd",
            vec![
                GrammarToken::new(["source.sql"], 0, 3),
                GrammarToken::new(["source.sql"], 2, 4),
            ],
            (),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_grammar_tokens_rejects_split_character() {
        let result = LineRecord::from_grammar_tokens(
            0,
            "é",
            vec![GrammarToken::new(["source.sql"], 0, 1)],
            (),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_line_has_no_tokens() {
        let record = LineRecord::from_grammar_tokens(0, "", Vec::new(), ()).unwrap();
        assert!(record.tokens.is_empty());
        assert!(record.scopes.is_empty());
    }

    #[test]
    fn test_renumber_moves_tokens() {
        let mut record = LineRecord::from_grammar_tokens(
            1,
            "x",
            vec![GrammarToken::new(["source.sql"], 0, 1)],
            (),
        )
        .unwrap();
        record.renumber(7);
        assert_eq!(record.line, 7);
        assert_eq!(record.tokens[0].line, 7);
    }

    #[test]
    fn test_find_and_sort() {
        let mut tokens = vec![
            token(&["b"], 4, 5, 1, "y"),
            token(&["a"], 0, 1, 1, "x"),
            token(&["a"], 2, 3, 0, "w"),
        ];
        sort_tokens(&mut tokens);
        assert_eq!(join_token_values(&tokens, ","), "w,x,y");
        assert_eq!(find_token(&tokens, "b").map(|t| t.value.as_str()), Some("y"));
        assert!(find_token(&tokens, "c").is_none());
    }

    #[test]
    fn test_tokens_to_text_inserts_line_breaks() {
        let tokens = vec![
            token(&["a"], 0, 6, 0, "select"),
            token(&["a"], 0, 1, 2, "x"),
        ];
        assert_eq!(tokens_to_text(&tokens), "select\n\nx");
    }
}
