use std::collections::{BTreeMap, HashMap};

use crate::lexer::ScannerState;
use crate::token::{LineRecord, Token};

/// A position in a document. `character` is a byte offset into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Clamp `index` into `text` and move it back onto a character boundary.
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Tokenized lines of one open document, keyed and iterated by line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCache<S = ScannerState> {
    lines: BTreeMap<usize, LineRecord<S>>,
}

impl<S> Default for DocumentCache<S> {
    fn default() -> Self {
        Self {
            lines: BTreeMap::new(),
        }
    }
}

impl<S> FromIterator<LineRecord<S>> for DocumentCache<S> {
    fn from_iter<I: IntoIterator<Item = LineRecord<S>>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(|r| (r.line, r)).collect(),
        }
    }
}

impl<S> DocumentCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, line: usize) -> Option<&LineRecord<S>> {
        self.lines.get(&line)
    }

    pub fn set(&mut self, line: usize, record: LineRecord<S>) {
        self.lines.insert(line, record);
    }

    pub fn delete(&mut self, line: usize) -> Option<LineRecord<S>> {
        self.lines.remove(&line)
    }

    pub fn has(&self, line: usize) -> bool {
        self.lines.contains_key(&line)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line records in line order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &LineRecord<S>)> {
        self.lines.iter().map(|(line, record)| (*line, record))
    }

    pub fn records(&self) -> impl Iterator<Item = &LineRecord<S>> {
        self.lines.values()
    }

    /// Every token of the document in line order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines.values().flat_map(|r| r.tokens.iter())
    }

    pub(crate) fn into_records(self) -> impl Iterator<Item = LineRecord<S>> {
        self.lines.into_values()
    }

    /// Document text, or the text inside `range` when given. Lines are joined
    /// with `\n`; range offsets are clamped to their lines.
    pub fn text(&self, range: Option<&Range>) -> String {
        let Some(range) = range else {
            let lines: Vec<&str> = self.lines.values().map(|r| r.text.as_str()).collect();
            return lines.join("\n");
        };

        let mut parts: Vec<&str> = Vec::new();
        for (line, record) in self.lines.range(range.start.line..=range.end.line) {
            let text = record.text.as_str();
            let start = if *line == range.start.line {
                floor_char_boundary(text, range.start.character)
            } else {
                0
            };
            let end = if *line == range.end.line {
                floor_char_boundary(text, range.end.character)
            } else {
                text.len()
            };
            parts.push(&text[start..end.max(start)]);
        }
        parts.join("\n")
    }
}

/// Process-wide store of document caches keyed by document identity.
///
/// Callers own the lifecycle: `open` on document open (or full reparse),
/// `get_mut` on change, `close` on document close.
#[derive(Debug)]
pub struct TokenCache<S = ScannerState> {
    documents: HashMap<String, DocumentCache<S>>,
}

impl<S> Default for TokenCache<S> {
    fn default() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }
}

impl<S> TokenCache<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `cache` for `uri`, replacing any previous cache.
    pub fn open(&mut self, uri: impl Into<String>, cache: DocumentCache<S>) -> &mut DocumentCache<S> {
        let slot = self.documents.entry(uri.into()).or_default();
        *slot = cache;
        slot
    }

    pub fn get(&self, uri: &str) -> Option<&DocumentCache<S>> {
        self.documents.get(uri)
    }

    pub fn get_mut(&mut self, uri: &str) -> Option<&mut DocumentCache<S>> {
        self.documents.get_mut(uri)
    }

    pub fn close(&mut self, uri: &str) -> Option<DocumentCache<S>> {
        self.documents.remove(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
