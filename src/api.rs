use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cache::DocumentCache;
use crate::engine::{Engine, FileMap};
use crate::error::Result;
use crate::grammar::Grammar;
use crate::report::{FileResult, Report, StatementSummary};
use crate::settings::Settings;

/// Parse a SQL string with the engine the settings describe.
pub fn parse_string(source: &str, settings: &Settings) -> Result<FileMap> {
    settings.engine()?.parse_text(source)
}

/// Parse every SQL file under `files`.
///
/// Fails only when the engine cannot be built; per-file problems are
/// recorded in the report.
pub fn run(files: &[PathBuf], settings: &Settings) -> Result<Report> {
    let engine = settings.engine()?;
    let matching_paths = get_matching_paths(files, settings);
    debug!(files = matching_paths.len(), "collected sql files");

    let mut report = Report::new();
    for path in &matching_paths {
        report.add(parse_file(&engine, path, settings));
    }
    Ok(report)
}

fn parse_file(engine: &Engine, path: &Path, settings: &Settings) -> FileResult {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return FileResult::error(path.to_path_buf(), format!("Read error: {}", e)),
    };

    let cache = match engine.tokenize(&source) {
        Ok(cache) => cache,
        Err(e) => return FileResult::error(path.to_path_buf(), e),
    };
    let statements = summarize(&engine.file_map(&cache));

    let mut result = FileResult::parsed(path.to_path_buf(), statements);
    if settings.tokens {
        result.tokens = dump_tokens(&cache, engine.grammar());
    }
    result
}

/// Summary line data for every statement of a file map.
pub fn summarize(map: &FileMap) -> Vec<StatementSummary> {
    map.iter()
        .map(|(index, statement)| StatementSummary::new(index, statement))
        .collect()
}

/// One line per token that carries a scope besides the grammar's root
/// scope: `line:start-end value scopes`.
pub fn dump_tokens<S>(cache: &DocumentCache<S>, grammar: &Grammar) -> Vec<String> {
    cache
        .tokens()
        .filter_map(|t| {
            let scopes: Vec<&str> = t
                .scopes
                .iter()
                .map(|s| s.as_str())
                .filter(|s| !grammar.is_root_scope(s))
                .collect();
            if scopes.is_empty() {
                return None;
            }
            Some(format!(
                "{}:{}-{}\t{:?}\t{}",
                t.line + 1,
                t.start,
                t.end,
                t.value.as_str(),
                scopes.join(" ")
            ))
        })
        .collect()
}

/// Get all SQL file paths that match the given inputs.
pub fn get_matching_paths(paths: &[PathBuf], settings: &Settings) -> Vec<PathBuf> {
    let extensions = settings.sql_extensions();
    let patterns: Vec<glob::Pattern> = settings
        .exclude
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();
    let mut result = HashSet::new();

    for path in paths {
        if path.is_file() {
            if is_sql_file(path, extensions) {
                result.insert(path.clone());
            }
        } else if path.is_dir() {
            collect_sql_files(path, extensions, &patterns, &mut result);
        }
    }

    let mut sorted: Vec<PathBuf> = result.into_iter().collect();
    sorted.sort();
    sorted
}

/// Check if a file has a SQL extension.
fn is_sql_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

/// Recursively collect SQL files from a directory.
fn collect_sql_files(
    dir: &Path,
    extensions: &[&str],
    exclude: &[glob::Pattern],
    result: &mut HashSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Skip hidden entries and excluded patterns
        if name.starts_with('.') || exclude.iter().any(|p| p.matches(&name)) {
            continue;
        }

        if path.is_dir() {
            collect_sql_files(&path, extensions, exclude, result);
        } else if is_sql_file(&path, extensions) {
            result.insert(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StatementType;
    use crate::report::FileStatus;
    use crate::scope;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_simple_select() {
        let map = parse_string("SELECT 1\n", &Settings::default()).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(0).unwrap().kind, StatementType::Select);
    }

    #[test]
    fn test_is_sql_file() {
        let extensions = &["sql", "bq"];
        assert!(is_sql_file(Path::new("test.sql"), extensions));
        assert!(is_sql_file(Path::new("TEST.SQL"), extensions));
        assert!(is_sql_file(Path::new("q.bq"), extensions));
        assert!(!is_sql_file(Path::new("test.py"), extensions));
        assert!(!is_sql_file(Path::new("sql"), extensions));
    }

    #[test]
    fn test_matching_paths_skip_hidden_and_excluded() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for name in ["a.sql", "b.txt", ".hidden/c.sql", "vendor/d.sql", "models/e.sql"] {
            let path = root.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "select 1").unwrap();
        }
        let settings = Settings {
            exclude: vec!["vendor".to_string()],
            ..Settings::default()
        };
        let paths = get_matching_paths(&[root.to_path_buf()], &settings);
        assert_eq!(paths, vec![root.join("a.sql"), root.join("models/e.sql")]);
    }

    #[test]
    fn test_run_reports_statements_and_tokens() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("q.sql");
        std::fs::write(&file, "select a from t;\nselect 2;").unwrap();
        let settings = Settings {
            tokens: true,
            ..Settings::default()
        };
        let report = run(&[file.clone()], &settings).unwrap();
        assert_eq!(report.total(), 1);
        let result = &report.results[0];
        assert_eq!(result.status, FileStatus::Parsed);
        assert_eq!(result.statements.len(), 2);
        assert_eq!(result.statements[0].target.as_deref(), Some("t"));
        assert_eq!(result.tokens[0], "1:0-6\t\"select\"\tkeyword.select.sql");
    }

    #[test]
    fn test_dump_tokens_skips_whitespace() {
        let engine = Engine::builtin().unwrap();
        let cache = engine.tokenize("a  b").unwrap();
        assert_eq!(dump_tokens(&cache, engine.grammar()).len(), 2);
    }

    #[test]
    fn test_dump_tokens_without_root_scope() {
        let engine = Engine::builtin().unwrap();
        let mut cache = engine.tokenize("select a").unwrap();
        let mut record = cache.get(0).cloned().unwrap();
        for token in &mut record.tokens {
            token.scopes.retain(|s| s.as_str() != scope::ROOT);
        }
        cache.set(0, record);

        let lines = dump_tokens(&cache, engine.grammar());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1:0-6\t\"select\"\tkeyword.select.sql");
    }
}
