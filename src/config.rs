use std::path::{Path, PathBuf};

use crate::error::{Result, ScopeError};
use crate::settings::Settings;

const CONFIG_FILE: &str = "sqlscope.toml";
const KNOWN_KEYS: [&str; 3] = ["grammar", "max_line_tokens", "exclude"];

/// Load sqlscope settings from `sqlscope.toml` or the `[tool.sqlscope]`
/// table of a `pyproject.toml`. Searches the parents of `files` when no
/// config path is given.
pub fn load_config(files: &[PathBuf], config_path: Option<&Path>) -> Result<Settings> {
    let config_file = match config_path {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(path) => {
            return Err(ScopeError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        None => find_config_file(files),
    };

    match config_file {
        Some(path) => load_config_from_path(&path),
        None => Ok(Settings::default()),
    }
}

/// First `sqlscope.toml`, or `pyproject.toml` with a `[tool.sqlscope]`
/// table, in the parents of the inputs.
fn find_config_file(files: &[PathBuf]) -> Option<PathBuf> {
    for parent in get_common_parents(files) {
        let config = parent.join(CONFIG_FILE);
        if config.exists() {
            return Some(config);
        }
        let config = parent.join("pyproject.toml");
        if config.exists() && has_tool_section(&config) {
            return Some(config);
        }
    }
    None
}

fn has_tool_section(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| content.parse::<toml::Table>().ok())
        .is_some_and(|table| tool_section(&table).is_some())
}

fn tool_section(table: &toml::Table) -> Option<&toml::Table> {
    table.get("tool")?.get("sqlscope")?.as_table()
}

/// Parent directories of the inputs, most specific first.
fn get_common_parents(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut parents = Vec::new();

    for file in files {
        let parent = if file.is_dir() {
            file.clone()
        } else {
            file.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        };

        let mut current = Some(parent.as_path());
        while let Some(dir) = current {
            let dir_buf = dir.to_path_buf();
            if !parents.contains(&dir_buf) {
                parents.push(dir_buf);
            }
            current = dir.parent();
        }
    }

    parents
}

fn load_config_from_path(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let parsed: toml::Table = content
        .parse()
        .map_err(|e| ScopeError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    let section = if path.file_name().is_some_and(|n| n == CONFIG_FILE) {
        parsed
    } else {
        tool_section(&parsed).cloned().unwrap_or_default()
    };
    settings_from_table(section, path)
}

fn settings_from_table(table: toml::Table, path: &Path) -> Result<Settings> {
    if let Some(key) = table.keys().find(|k| !KNOWN_KEYS.contains(&k.as_str())) {
        return Err(ScopeError::Config(format!("Unknown config option: {}", key)));
    }
    let mut settings: Settings = toml::Value::Table(table).try_into()?;

    // A relative grammar path is relative to the config file.
    if let Some(dir) = path.parent() {
        settings.grammar = settings
            .grammar
            .take()
            .map(|grammar| if grammar.is_relative() { dir.join(grammar) } else { grammar });
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_no_config_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_config(&[dir.path().join("a.sql")], None).unwrap();
        assert!(settings.exclude.is_empty());
        assert!(settings.max_line_tokens.is_none());
    }

    #[test]
    fn test_sqlscope_toml_top_level_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "exclude = [\"vendor\"]\nmax_line_tokens = 8\ngrammar = \"rules.toml\"\n",
        )
        .unwrap();
        let settings = load_config(&[dir.path().join("a.sql")], None).unwrap();
        assert_eq!(settings.exclude, vec!["vendor".to_string()]);
        assert_eq!(settings.max_line_tokens, Some(8));
        assert_eq!(settings.grammar, Some(dir.path().join("rules.toml")));
    }

    #[test]
    fn test_pyproject_tool_section() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("models");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"x\"\n\n[tool.sqlscope]\nexclude = [\"tmp_*\"]\n",
        )
        .unwrap();
        let settings = load_config(&[sub.join("a.sql")], None).unwrap();
        assert_eq!(settings.exclude, vec!["tmp_*".to_string()]);
    }

    #[test]
    fn test_unknown_config_key_error() {
        let table: toml::Table = "line_length = 10".parse().unwrap();
        let err = settings_from_table(table, Path::new(CONFIG_FILE)).unwrap_err();
        assert!(err.to_string().contains("line_length"));
    }

    #[test]
    fn test_wrong_value_type_is_error() {
        let table: toml::Table = "max_line_tokens = \"many\"".parse().unwrap();
        assert!(matches!(
            settings_from_table(table, Path::new(CONFIG_FILE)),
            Err(ScopeError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = load_config(&[], Some(Path::new("/nonexistent/sqlscope.toml"))).unwrap_err();
        assert!(matches!(err, ScopeError::Config(_)));
    }
}
