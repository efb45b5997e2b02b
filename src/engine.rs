use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{Ast, AstBuilder, StatementAST};
use crate::cache::{DocumentCache, TokenCache};
use crate::error::{Result, ScopeError};
use crate::grammar::Grammar;
use crate::lexer::SqlScanner;
use crate::matcher::Matcher;
use crate::reparser::{apply_change, ChangeEvent, ReparseStats};
use crate::splitter::{line_starts, split_statements, statement_tokens};
use crate::token::Token;
use crate::tokenizer::{tokenize_text, ScopeTokenizer};

/// Parsed statements of one document, keyed by their order in the text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMap(BTreeMap<usize, StatementAST>);

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&StatementAST> {
        self.0.get(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &StatementAST)> {
        self.0.iter().map(|(i, s)| (*i, s))
    }

    pub fn statements(&self) -> impl Iterator<Item = &StatementAST> {
        self.0.values()
    }

    /// The statement whose tokens cover `line`.
    pub fn at_line(&self, line: usize) -> Option<(usize, &StatementAST)> {
        self.iter().find(|(_, statement)| {
            statement
                .span()
                .is_some_and(|span| span.start_line <= line && line <= span.end_line)
        })
    }

    pub fn into_inner(self) -> BTreeMap<usize, StatementAST> {
        self.0
    }
}

impl FromIterator<StatementAST> for FileMap {
    fn from_iter<I: IntoIterator<Item = StatementAST>>(iter: I) -> Self {
        Self(iter.into_iter().enumerate().collect())
    }
}

impl<'a> IntoIterator for &'a FileMap {
    type Item = (&'a usize, &'a StatementAST);
    type IntoIter = std::collections::btree_map::Iter<'a, usize, StatementAST>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Tokenizer plus grammar: the two things every parse needs.
///
/// The engine holds no documents. Callers keep a [`TokenCache`] and pass it
/// to [`Engine::parse`] and [`Engine::parse_change`].
#[derive(Debug, Clone)]
pub struct Engine<T: ScopeTokenizer = SqlScanner> {
    tokenizer: T,
    grammar: Grammar,
}

impl Engine<SqlScanner> {
    /// The bundled grammar with the built-in scanner.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(SqlScanner::new(), Grammar::builtin()?))
    }
}

impl<T: ScopeTokenizer> Engine<T> {
    pub fn new(tokenizer: T, grammar: Grammar) -> Self {
        Self { tokenizer, grammar }
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn tokenize(&self, text: &str) -> Result<DocumentCache<T::State>> {
        Ok(tokenize_text(&self.tokenizer, text)?.into_iter().collect())
    }

    /// Tokenize `text` from scratch, store it under `uri` and parse it.
    pub fn parse(&self, store: &mut TokenCache<T::State>, uri: &str, text: &str) -> Result<FileMap> {
        let cache = store.open(uri, self.tokenize(text)?);
        debug!(uri, lines = cache.len(), "parsed document");
        Ok(self.file_map(cache))
    }

    /// Parse text that is not tracked in any store.
    pub fn parse_text(&self, text: &str) -> Result<FileMap> {
        Ok(self.file_map(&self.tokenize(text)?))
    }

    /// Apply the event's changes in order to the stored document and
    /// parse the result. The stored document is replaced only if every
    /// change applies.
    pub fn parse_change(
        &self,
        store: &mut TokenCache<T::State>,
        event: &ChangeEvent,
    ) -> Result<FileMap> {
        let mut cache = store
            .get(&event.uri)
            .ok_or_else(|| ScopeError::UnknownDocument(event.uri.clone()))?
            .clone();

        let mut total = ReparseStats::default();
        for change in &event.changes {
            let stats = apply_change(&self.tokenizer, &mut cache, change)?;
            total.retokenized += stats.retokenized;
            total.reused += stats.reused;
            total.shifted += stats.shifted;
        }
        debug!(
            uri = %event.uri,
            changes = event.changes.len(),
            retokenized = total.retokenized,
            reused = total.reused,
            shifted = total.shifted,
            "applied changes"
        );
        let map = self.file_map(&cache);
        store.open(event.uri.clone(), cache);
        Ok(map)
    }

    /// Split a tokenized document into statements and parse each one.
    pub fn file_map(&self, cache: &DocumentCache<T::State>) -> FileMap {
        let text = cache.text(None);
        let starts = line_starts(&text);
        let tokens: Vec<Token> = cache.tokens().cloned().collect();
        let matcher = Matcher::new(&self.grammar);
        let builder = AstBuilder::new(&matcher);

        split_statements(&text)
            .iter()
            .map(|span| builder.statement(&statement_tokens(&tokens, &starts, span)))
            .collect()
    }

    /// Parse one statement's token run.
    pub fn parse_statement(&self, tokens: &[Token]) -> StatementAST {
        let matcher = Matcher::new(&self.grammar);
        AstBuilder::new(&matcher).statement(tokens)
    }
}
