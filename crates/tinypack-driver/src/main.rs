use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tinypack_bundler::{
    parse_named_entry, BundleError, BundlerOptions, Compiler, ConfigError, ConfigFile,
    DoneLoggerPlugin, Entry, RunLoggerPlugin, Stats,
};
use tinypack_lexer::{Lexer, Token, TokenKind};

#[derive(Parser)]
#[command(
    name = "tinypack",
    version = "0.1.0",
    about = "A small JavaScript module bundler",
    long_about = "Bundles CommonJS and ES modules reachable from one or more entry points\ninto self-executing scripts, one per entry."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle entry points into scripts
    Bundle {
        /// Entry files; a single entry is named "main", several are named
        /// after their file stems
        entries: Vec<PathBuf>,

        /// Named entry point as name=path (repeatable)
        #[arg(long = "entry", value_name = "NAME=PATH")]
        named: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output filename template; [name] is replaced by the chunk name
        #[arg(long)]
        filename: Option<String>,

        /// Extensions to try when resolving (repeatable)
        #[arg(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Project root that ids and entry paths are relative to
        #[arg(long)]
        context: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rebuild whenever a bundled file changes
        #[arg(short, long)]
        watch: bool,

        /// Print the stats as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Lex a JavaScript file and show tokens (debug)
    Lex {
        /// Input JavaScript file
        input: PathBuf,

        /// Show token positions
        #[arg(short, long)]
        positions: bool,
    },

    /// Parse a JavaScript file and show the AST (debug)
    Parse {
        /// Input JavaScript file
        input: PathBuf,
    },
}

/// Command line settings layered over the config file.
struct BundleArgs {
    entries: Vec<PathBuf>,
    named: Vec<String>,
    output: Option<PathBuf>,
    filename: Option<String>,
    extensions: Vec<String>,
    context: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bundle {
            entries,
            named,
            output,
            filename,
            extensions,
            context,
            config,
            watch,
            json,
            verbose,
        } => {
            init_logging(verbose);
            let args = BundleArgs {
                entries,
                named,
                output,
                filename,
                extensions,
                context,
                config,
            };
            bundle_command(args, watch, json)
        }
        Commands::Lex { input, positions } => lex_command(input, positions),
        Commands::Parse { input } => parse_command(input),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "tinypack_bundler=debug" } else { "tinypack_bundler=info" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn bundle_command(args: BundleArgs, watch: bool, json: bool) -> ExitCode {
    let options = match build_options(args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?options, "resolved options");

    let mut compiler = match Compiler::new(options) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let failed = Cell::new(false);
    let out_dir = compiler.options().output_dir();
    let callback = |result: Result<&Stats, &BundleError>| match result {
        Ok(stats) => {
            failed.set(false);
            if json {
                match serde_json::to_string_pretty(&stats.to_json()) {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("Error serializing stats: {}", e),
                }
            } else {
                print_summary(stats, &out_dir);
            }
        }
        Err(e) => {
            failed.set(true);
            report_bundle_error(e);
        }
    };

    let outcome = if watch {
        compiler.watch(callback, || false)
    } else {
        compiler.run(callback)
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    if failed.get() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn build_options(args: BundleArgs) -> Result<BundlerOptions, BundleError> {
    let mut options = match &args.config {
        Some(path) => {
            let base_dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let base_dir = fs::canonicalize(base_dir).map_err(|source| ConfigError::Context {
                path: base_dir.to_path_buf(),
                source,
            })?;
            ConfigFile::load(path)?.into_options(&base_dir)?
        }
        None => BundlerOptions::new(Entry::Named(Vec::new())),
    };

    if let Some(entry) = cli_entry(&args.entries, &args.named)? {
        options.entry = entry;
    }
    if let Some(context) = args.context {
        options.context = from_cwd(context);
    }
    if let Some(output) = args.output {
        options.output.path = Some(from_cwd(output));
    }
    if let Some(filename) = args.filename {
        options.output.filename = filename;
    }
    if !args.extensions.is_empty() {
        options.resolve.extensions = args.extensions;
    }

    Ok(options
        .with_plugin(RunLoggerPlugin)
        .with_plugin(DoneLoggerPlugin))
}

/// Entry points given on the command line, if any.
fn cli_entry(entries: &[PathBuf], named: &[String]) -> Result<Option<Entry>, BundleError> {
    if named.is_empty() {
        match entries {
            [] => return Ok(None),
            [single] => return Ok(Some(Entry::Single(single.clone()))),
            _ => {}
        }
    }

    let mut points = Vec::with_capacity(entries.len() + named.len());
    for path in entries {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        points.push((name, path.clone()));
    }
    for arg in named {
        points.push(parse_named_entry(arg)?);
    }
    Ok(Some(Entry::Named(points)))
}

/// Command line paths are taken from the working directory, not the context.
fn from_cwd(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

fn print_summary(stats: &Stats, out_dir: &Path) {
    for chunk in &stats.chunks {
        println!(
            "{} -> {} ({} modules)",
            chunk.name,
            out_dir.join(&chunk.filename).display(),
            chunk.modules.len()
        );
    }
}

fn report_bundle_error(error: &BundleError) {
    match error {
        BundleError::Parse {
            path,
            source_text,
            errors,
        } => {
            let filename = path.to_string_lossy().to_string();
            for err in errors {
                report_error(
                    "E1000",
                    "Parse error",
                    &err.message,
                    err.span.start,
                    err.span.end,
                    &filename,
                    source_text,
                );
            }
        }
        other => eprintln!("Error: {}", other),
    }
}

fn lex_command(input: PathBuf, positions: bool) -> ExitCode {
    let source = match read_source_file(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filename = input.to_string_lossy().to_string();

    let mut lexer = Lexer::new(&source);
    let tokens = lexer.tokenize();

    println!("Tokens for {}:\n", filename);
    println!("{}", "=".repeat(80));

    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof {
            println!("\n{:4} | {:?}", i, token.kind);
            break;
        }

        if positions {
            println!(
                "{:4} | {:20?} | {:?} | {}..{}",
                i, token.kind, token.value, token.span.start, token.span.end
            );
        } else {
            println!("{:4} | {:20?} | {:?}", i, token.kind, token.value);
        }
    }

    println!("{}", "=".repeat(80));
    println!("\nTotal tokens: {}", tokens.len());

    let error_count = tokens.iter().filter(|t| t.kind == TokenKind::Error).count();
    if error_count > 0 {
        println!("\nLexer errors found: {}", error_count);
        report_lexer_errors(&tokens, &filename, &source);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn parse_command(input: PathBuf) -> ExitCode {
    let source = match read_source_file(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filename = input.to_string_lossy().to_string();

    let mut lexer = Lexer::new(&source);
    let tokens = lexer.tokenize();

    let has_errors = tokens.iter().any(|t| t.kind == TokenKind::Error);
    if has_errors {
        report_lexer_errors(&tokens, &filename, &source);
        return ExitCode::FAILURE;
    }

    let mut parser = tinypack_parser::Parser::new(tokens);
    match parser.parse_program() {
        Ok(program) => {
            println!("{:#?}", program);
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for err in &errors {
                report_error(
                    "E1000",
                    "Parse error",
                    &err.message,
                    err.span.start,
                    err.span.end,
                    &filename,
                    &source,
                );
            }
            ExitCode::FAILURE
        }
    }
}

// Helper functions

fn read_source_file(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

fn report_lexer_errors(tokens: &[Token], filename: &str, source: &str) {
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Error) {
        report_error(
            "E0001",
            "Lexical error",
            &token.value,
            token.span.start,
            token.span.end,
            filename,
            source,
        );
    }
}

fn report_error(code: &str, title: &str, message: &str, start: usize, end: usize, filename: &str, source: &str) {
    let span = (filename, start..end);
    let _ = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(title)
        .with_label(
            Label::new(span)
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)));
}
