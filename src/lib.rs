pub mod api;
pub mod ast;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod matcher;
pub mod report;
pub mod reparser;
pub mod rule;
pub mod scope;
pub mod settings;
pub mod splitter;
pub mod token;
pub mod tokenizer;

// Re-export the main public API
pub use api::{get_matching_paths, parse_string, run};
pub use ast::StatementAST;
pub use cache::{DocumentCache, Position, Range, TokenCache};
pub use config::load_config;
pub use engine::{Engine, FileMap};
pub use error::{Result, ScopeError};
pub use grammar::Grammar;
pub use lexer::{ScannerState, SqlScanner};
pub use reparser::{ChangeEvent, ContentChange};
pub use settings::Settings;
pub use tokenizer::ScopeTokenizer;
