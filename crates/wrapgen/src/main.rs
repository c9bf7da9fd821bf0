//! Binary entry point for the wrapgen CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Analyze a parsed module, everything included
//! wrapgen module.json
//!
//! # With a policy table and pretty output
//! wrapgen module.json --policy rules.json --pretty
//!
//! # Frameworks with a different root object class
//! wrapgen module.json --root-object EventTarget
//! ```
//!
//! The input is the declaration tree JSON produced by the front-end parser;
//! the output is the module's binding plan on stdout. Logs go to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use wrapgen_core::{NullPolicy, Policy, TablePolicy, WrapError};
use wrapgen_cxx::{Analyzer, DeclTree};

/// Generate a binding plan from a parsed C++ module.
#[derive(Parser, Debug)]
#[command(name = "wrapgen", version, about = "C++ binding plan generator")]
struct Cli {
    /// Declaration tree JSON produced by the front-end parser.
    input: PathBuf,

    /// Policy rule table (JSON). Defaults to including everything.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Root object class of the bound framework.
    #[arg(long, default_value = "Object")]
    root_object: String,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,

    /// Log level for tracing output on stderr.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("wrapgen: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<(), WrapError> {
    let tree: DeclTree = serde_json::from_str(&fs::read_to_string(&cli.input)?)?;

    let policy: Box<dyn Policy> = match &cli.policy {
        Some(path) => Box::new(TablePolicy::from_json(&fs::read_to_string(path)?)?),
        None => Box::new(NullPolicy),
    };

    let analysis = Analyzer::new(tree, policy.as_ref())
        .with_root_object(cli.root_object)
        .run()?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&analysis)?
    } else {
        serde_json::to_string(&analysis)?
    };
    let mut stdout = io::stdout();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;
    Ok(())
}
