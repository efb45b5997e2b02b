use std::fmt;
use std::path::PathBuf;

use crate::ast::{Ast, FromSource, StatementAST, StatementType};

/// Status of parsing a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Parsed,
    /// The file could not be read or tokenized.
    Error,
}

/// One line of CLI output per statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSummary {
    pub index: usize,
    /// One-based line of the statement's first token.
    pub line: usize,
    pub kind: StatementType,
    pub target: Option<String>,
    pub columns: usize,
}

impl StatementSummary {
    pub fn new(index: usize, statement: &StatementAST) -> Self {
        let target = match (&statement.object, &statement.from) {
            (Some(object), _) => Some(object.qualified_name()),
            (None, Some(FromSource::Object(object))) => Some(object.qualified_name()),
            (None, Some(FromSource::Statement(_))) => Some("(subquery)".to_string()),
            (None, None) => None,
        };
        Self {
            index,
            line: statement.line().map_or(0, |line| line + 1),
            kind: statement.kind,
            target: target.filter(|t| !t.is_empty()),
            columns: statement.columns.len(),
        }
    }
}

impl fmt::Display for StatementSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] line {}: {} {} ({} columns)",
            self.index,
            self.line,
            self.kind,
            self.target.as_deref().unwrap_or("-"),
            self.columns
        )
    }
}

/// Result of parsing a single file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
    pub statements: Vec<StatementSummary>,
    /// Token dump lines, filled only when tokens were requested.
    pub tokens: Vec<String>,
    pub error: Option<String>,
}

impl FileResult {
    pub fn parsed(path: PathBuf, statements: Vec<StatementSummary>) -> Self {
        Self {
            path,
            status: FileStatus::Parsed,
            statements,
            tokens: Vec::new(),
            error: None,
        }
    }

    pub fn error(path: PathBuf, error: impl fmt::Display) -> Self {
        Self {
            path,
            status: FileStatus::Error,
            statements: Vec::new(),
            tokens: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Aggregated report of parse results.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    pub fn add(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn parsed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == FileStatus::Parsed)
            .count()
    }

    pub fn errors(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == FileStatus::Error)
            .count()
    }

    pub fn statements(&self) -> usize {
        self.results.iter().map(|r| r.statements.len()).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    /// Generate a summary string.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("{} file(s) processed", self.total()));
        parts.push(format!("{} statement(s)", self.statements()));
        if self.errors() > 0 {
            parts.push(format!("{} error(s)", self.errors()));
        }
        parts.join(", ")
    }

    /// Print error details.
    pub fn print_errors(&self) {
        for result in &self.results {
            if let Some(ref error) = result.error {
                eprintln!("error: {}: {}", result.path.display(), error);
            }
        }
    }
}
