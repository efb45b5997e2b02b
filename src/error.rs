use thiserror::Error;

/// User-facing errors.
///
/// Grammar mismatches in user SQL are not errors: the matcher degrades
/// silently. Everything here is either a configuration problem or a broken
/// invariant in the tokenizer output.
#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("sqlscope config error: {0}")]
    Config(String),

    #[error("sqlscope grammar error: {0}")]
    Grammar(String),

    #[error("sqlscope tokenizer error on line {line}: {message}")]
    Tokenizer { line: usize, message: String },

    #[error("sqlscope unknown document: {0}")]
    UnknownDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ScopeError>;
