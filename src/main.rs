use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqlscope::report::{FileStatus, Report};
use sqlscope::Settings;

/// sqlscope - incremental scope-token parser for SQL.
/// Prints one summary line per statement.
#[derive(Parser, Debug)]
#[command(name = "sqlscope", version, about)]
struct Cli {
    /// Files or directories to parse. Use "-" to read from stdin.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Dump per-line tokens with their scopes.
    #[arg(long)]
    tokens: bool,

    /// Grammar table to use instead of the bundled one.
    #[arg(long)]
    grammar: Option<PathBuf>,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,

    /// Path to config file (sqlscope.toml or pyproject.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match settings_from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(2);
        }
    };

    let is_stdin = cli.files.len() == 1 && cli.files[0].to_string_lossy() == "-";
    if is_stdin {
        if let Err(e) = parse_stdin(&settings) {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
        return;
    }

    let report = match sqlscope::run(&cli.files, &settings) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    print_results(&report, &settings);
    if !settings.quiet {
        eprintln!("{}", report.summary());
    }
    report.print_errors();

    if report.has_errors() {
        std::process::exit(2);
    }
}

/// Config file settings, overridden by command-line flags.
fn settings_from_cli(cli: &Cli) -> anyhow::Result<Settings> {
    let base = sqlscope::load_config(&cli.files, cli.config.as_deref())
        .context("failed to load configuration")?;
    Ok(Settings {
        grammar: cli.grammar.clone().or(base.grammar),
        max_line_tokens: base.max_line_tokens,
        exclude: if cli.exclude.is_empty() {
            base.exclude
        } else {
            cli.exclude.clone()
        },
        verbose: cli.verbose,
        quiet: cli.quiet,
        tokens: cli.tokens,
    })
}

fn parse_stdin(settings: &Settings) -> anyhow::Result<()> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("failed to read stdin")?;

    let engine = settings.engine()?;
    let cache = engine.tokenize(&source)?;
    if settings.tokens {
        for line in sqlscope::api::dump_tokens(&cache, engine.grammar()) {
            println!("{}", line);
        }
    } else {
        for summary in sqlscope::api::summarize(&engine.file_map(&cache)) {
            println!("{}", summary);
        }
    }
    Ok(())
}

fn print_results(report: &Report, settings: &Settings) {
    for result in &report.results {
        if result.status != FileStatus::Parsed {
            continue;
        }
        if settings.verbose {
            eprintln!("parsed {}", result.path.display());
        }
        let lines: Box<dyn Iterator<Item = String> + '_> = if settings.tokens {
            Box::new(result.tokens.iter().cloned())
        } else {
            Box::new(result.statements.iter().map(|s| s.to_string()))
        };
        for line in lines {
            println!("{}: {}", result.path.display(), line);
        }
    }
}
