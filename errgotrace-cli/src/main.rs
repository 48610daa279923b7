//! errgotrace CLI - injects and strips error tracing code in Go files

#![deny(warnings)]

// Global invariants enforced:
// - Every file is attempted; the exit status reflects any failure
// - Deterministic output ordering

use anyhow::Context;
use clap::{CommandFactory, Parser};
use errgotrace_core::config::{self, ErrgotraceConfig};
use errgotrace_core::{process_files, render_json, render_text, Action, PrinterKind, RunOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLES: &str = "\
Examples:
  Add tracing code to all go files in the current directory.
  $ errgotrace -w .

  Add tracing code to all go files in the current directory.
  Exclude vendor dir.
  $ find . -path ./vendor -prune -o -name '*.go' -print0 | xargs -0 errgotrace -w

  Remove all tracing code from all go files in the current directory.
  $ errgotrace -w -r .

  Show which functions would be instrumented.
  $ errgotrace --list --exported ./pkg";

#[derive(Parser)]
#[command(name = "errgotrace")]
#[command(about = "Errgotrace modifies go files to include code for tracing go errors.")]
#[command(version = env!("ERRGOTRACE_VERSION"))]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Go files or directories to process
    paths: Vec<PathBuf>,

    /// Re-write files in place instead of printing to stdout
    #[arg(short = 'w', long)]
    write: bool,

    /// Reverse the process, remove tracing code
    #[arg(short = 'r', long)]
    reverse: bool,

    /// Only annotate exported functions
    #[arg(long)]
    exported: bool,

    /// Only annotate functions matching the regular expression [default: .]
    #[arg(long)]
    filter: Option<String>,

    /// Exclude any matching functions, takes precedence over filter
    #[arg(long)]
    exclude: Option<String>,

    /// Import path of the runtime support package
    #[arg(long)]
    import_path: Option<String>,

    /// Printer used to canonicalize source [default: builtin]
    #[arg(long)]
    printer: Option<PrinterArg>,

    /// Path to config file (default: auto-discover)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the functions that would be annotated, without changing anything
    #[arg(long, conflicts_with_all = ["write", "reverse"])]
    list: bool,

    /// Output format for --list
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum PrinterArg {
    Auto,
    Builtin,
    Gofmt,
}

impl From<PrinterArg> for PrinterKind {
    fn from(arg: PrinterArg) -> Self {
        match arg {
            PrinterArg::Auto => PrinterKind::Auto,
            PrinterArg::Builtin => PrinterKind::Builtin,
            PrinterArg::Gofmt => PrinterKind::Gofmt,
        }
    }
}

impl Cli {
    /// Flags that override config file values
    fn overrides(&self) -> ErrgotraceConfig {
        ErrgotraceConfig {
            filter: self.filter.clone(),
            exclude: self.exclude.clone(),
            exported_only: self.exported.then_some(true),
            import_path: self.import_path.clone(),
            skip: Vec::new(),
            printer: self.printer.map(PrinterKind::from),
        }
    }

    fn action(&self) -> Action {
        if self.list {
            Action::List
        } else if self.reverse {
            Action::Reverse
        } else {
            Action::Instrument
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("errgotrace=debug,errgotrace_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.paths.is_empty() {
        Cli::command().print_help()?;
        println!();
        std::process::exit(1);
    }

    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let resolved_config = config::load_and_resolve(&cwd, cli.config.as_deref(), cli.overrides())
        .context("failed to load configuration")?;

    if let Some(config_path) = &resolved_config.config_path {
        tracing::debug!(config = %config_path.display(), "using config");
    }

    let printer = resolved_config.printer.build();
    tracing::debug!(printer = ?printer, "selected printer");

    let options = RunOptions {
        action: cli.action(),
        write_in_place: cli.write,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = process_files(
        &cli.paths,
        &resolved_config,
        &options,
        printer.as_ref(),
        &mut out,
    );

    if options.action == Action::List {
        let rendered = match cli.format {
            OutputFormat::Text => render_text(&summary.reports),
            OutputFormat::Json => render_json(&summary.reports),
        };
        writeln!(out, "{}", rendered.trim_end())?;
    }
    out.flush()?;

    if summary.any_failed() {
        std::process::exit(1);
    }

    Ok(())
}
