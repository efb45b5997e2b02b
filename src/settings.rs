use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::Engine;
use crate::error::Result;
use crate::grammar::Grammar;
use crate::lexer::SqlScanner;

/// Settings shared by the library entry points and the CLI.
///
/// Only `grammar`, `max_line_tokens` and `exclude` can come from a config
/// file; the rest are command-line switches.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Rule table to use instead of the bundled one.
    #[serde(default)]
    pub grammar: Option<PathBuf>,

    /// Cap on tokens the built-in scanner emits per call.
    #[serde(default)]
    pub max_line_tokens: Option<usize>,

    /// Glob patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub quiet: bool,

    /// Dump per-line tokens instead of statement summaries.
    #[serde(default)]
    pub tokens: bool,
}

impl Settings {
    /// SQL file extensions to process.
    pub fn sql_extensions(&self) -> &[&str] {
        &["sql", "bq", "ddl", "dml"]
    }

    pub fn load_grammar(&self) -> Result<Grammar> {
        match &self.grammar {
            Some(path) => Grammar::load(path),
            None => Grammar::builtin(),
        }
    }

    pub fn engine(&self) -> Result<Engine<SqlScanner>> {
        let scanner = match self.max_line_tokens {
            Some(limit) => SqlScanner::with_token_limit(limit),
            None => SqlScanner::new(),
        };
        Ok(Engine::new(scanner, self.load_grammar()?))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grammar: None,
            max_line_tokens: None,
            exclude: Vec::new(),
            verbose: false,
            quiet: false,
            tokens: false,
        }
    }
}
