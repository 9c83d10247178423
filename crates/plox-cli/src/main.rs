use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use plox_ast::ast::Stmt;
use plox_ast::diag::Diagnostics;
use plox_cli::{ExitStatus, Session, SessionOptions};
use plox_parse::token::Tok;
use plox_parse::{parse, scan};
use plox_types::TypeChecker;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Maximum source file size in bytes (1MB)
const MAX_SOURCE_SIZE: usize = 1_000_000;

#[derive(Parser, Debug)]
#[command(name = "plox")]
#[command(about = "plox: a small Lox dialect with a static type pass")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (e.g. `debug`, `plox_parse=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a plox program
    Run {
        /// Path to .lox source file
        file: String,

        /// Skip the static type pass
        #[arg(long)]
        no_typecheck: bool,
    },

    /// Read and run lines interactively; an empty line or `exit` quits
    Repl {
        /// Skip the static type pass
        #[arg(long)]
        no_typecheck: bool,
    },

    /// Parse and type check a source file, then dump the AST
    Parse {
        /// Path to .lox source file
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Scan a source file and dump its tokens
    Tokens {
        /// Path to .lox source file
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = TokenFormat::Pretty)]
        format: TokenFormat,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum Format {
    Pretty,
    Json,
    Sexpr,
}

#[derive(ValueEnum, Clone, Debug)]
enum TokenFormat {
    Pretty,
    Json,
}

/// JSON document written by `parse --format json`.
#[derive(Serialize)]
struct AstDump<'a> {
    file: &'a str,
    statements: &'a [Stmt],
}

/// JSON document written by `tokens --format json`.
#[derive(Serialize)]
struct TokenDump<'a> {
    file: &'a str,
    tokens: &'a [Tok],
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Run { file, no_typecheck } => cmd_run(&file, !no_typecheck),
        Commands::Repl { no_typecheck } => cmd_repl(!no_typecheck),
        Commands::Parse { file, format } => cmd_parse(&file, format),
        Commands::Tokens { file, format } => cmd_tokens(&file, format),
    };

    let code = match result {
        Ok(status) => status.code(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

/// Logs go to stderr so program output on stdout stays clean.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_source(path: &str) -> Result<String> {
    let src = std::fs::read_to_string(path).with_context(|| format!("cannot read '{path}'"))?;
    if src.len() > MAX_SOURCE_SIZE {
        bail!(
            "source file exceeds {}MB limit ({} bytes)",
            MAX_SOURCE_SIZE / 1_000_000,
            src.len()
        );
    }
    debug!(path, bytes = src.len(), "loaded source");
    Ok(src)
}

fn cmd_run(file: &str, typecheck: bool) -> Result<ExitStatus> {
    let src = read_source(file)?;
    let mut session = Session::new(SessionOptions { typecheck });
    let status = session.run(&src, &mut io::stderr());
    info!(?status, "run finished");
    Ok(status)
}

fn cmd_repl(typecheck: bool) -> Result<ExitStatus> {
    let mut session = Session::new(SessionOptions { typecheck });
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("plox REPL:");
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line == "exit" {
            break;
        }
        // failures are already reported; the session keeps going
        session.run(line, &mut io::stderr());
    }
    Ok(ExitStatus::Success)
}

fn cmd_parse(file: &str, format: Format) -> Result<ExitStatus> {
    let src = read_source(file)?;

    let mut diags = Diagnostics::new();
    let toks = scan(&src, &mut diags);
    let mut stmts = parse(toks, &mut diags);
    if diags.report(&src, &mut io::stderr())? {
        return Ok(ExitStatus::CompileFailure);
    }

    TypeChecker::new().check_program(&mut stmts, &mut diags);
    if diags.report(&src, &mut io::stderr())? {
        return Ok(ExitStatus::CompileFailure);
    }

    match format {
        Format::Pretty => println!("{stmts:#?}"),
        Format::Json => {
            let dump = AstDump {
                file,
                statements: &stmts,
            };
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
        Format::Sexpr => {
            for stmt in &stmts {
                println!("{stmt}");
            }
        }
    }
    Ok(ExitStatus::Success)
}

fn cmd_tokens(file: &str, format: TokenFormat) -> Result<ExitStatus> {
    let src = read_source(file)?;

    let mut diags = Diagnostics::new();
    let toks = scan(&src, &mut diags);
    match format {
        TokenFormat::Pretty => {
            for tok in &toks {
                println!("{tok}");
            }
        }
        TokenFormat::Json => {
            let dump = TokenDump { file, tokens: &toks };
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
    }

    if diags.report(&src, &mut io::stderr())? {
        return Ok(ExitStatus::CompileFailure);
    }
    Ok(ExitStatus::Success)
}
