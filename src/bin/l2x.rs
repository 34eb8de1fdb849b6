//! laxml CLI - LaTeX to XHTML+MathML converter

#[cfg(feature = "cli")]
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use laxml::{
    parse_document, render, ConversionError, ConversionResult, ConversionWarning,
    ConvertOptions, DiagnosticSeverity,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "l2x")]
#[command(version)]
#[command(about = "laxml - LaTeX to XHTML+MathML converter", long_about = None)]
struct Cli {
    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Skip missing imports/bibliographies instead of failing
    #[arg(long)]
    skip_missing: bool,

    /// Abandon the conversion after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Dump the rewritten expression tree as JSON instead of rendering
    #[arg(long)]
    dump_tree: bool,

    /// Print pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Use colored diagnostics
    #[arg(long, default_value_t = true)]
    color: bool,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let (source, source_dir) = match read_input(&cli) {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let options = ConvertOptions {
        skip_missing: cli.skip_missing,
        ..ConvertOptions::default()
    };

    let verbose = cli.verbose;
    let dump_tree = cli.dump_tree;
    let job = move || run_conversion(&source, source_dir, options, verbose, dump_tree);

    let outcome = match cli.timeout {
        Some(seconds) => run_with_timeout(job, seconds),
        None => job(),
    };

    match outcome {
        Ok((output, warnings)) => {
            print_diagnostics(&warnings, cli.color);
            if let Err(err) = write_output(cli.output.as_deref(), &output) {
                eprintln!("error: {}", err);
                std::process::exit(1);
            }
        }
        Err(err @ ConversionError::Timeout { .. }) => {
            // logged, not a crash: the worker is abandoned
            print_diagnostic(&ConversionWarning::new(err.to_string()), cli.color);
            std::process::exit(2);
        }
        Err(err) => {
            let warning = ConversionWarning {
                message: err.to_string(),
                line: None,
                severity: DiagnosticSeverity::Error,
            };
            print_diagnostic(&warning, cli.color);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("l2x was built without the 'cli' feature");
}

#[cfg(feature = "cli")]
fn read_input(cli: &Cli) -> io::Result<(String, PathBuf)> {
    match &cli.input_file {
        Some(path) => {
            let path = PathBuf::from(path);
            let source = fs::read_to_string(&path)?;
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((source, dir))
        }
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok((source, PathBuf::from(".")))
        }
    }
}

fn run_conversion(
    source: &str,
    source_dir: PathBuf,
    options: ConvertOptions,
    verbose: bool,
    dump_tree: bool,
) -> ConversionResult<(String, Vec<ConversionWarning>)> {
    let mut progress = |step: usize, total: usize| {
        if verbose {
            eprintln!("[l2x] step {}/{}", step, total);
        }
    };

    let (arena, mut ctx) = parse_document(source, source_dir, options, Some(&mut progress))?;

    let output = if dump_tree {
        let dump = arena.dump(arena.root());
        serde_json::to_string_pretty(&dump).map_err(|err| ConversionError::IoError {
            message: err.to_string(),
        })?
    } else {
        render::render_document(&arena, &mut ctx)
    };
    Ok((output, ctx.warnings))
}

/// Run the conversion on a worker thread with a bounded timeout. On
/// timeout the worker is abandoned; partial output is never used.
fn run_with_timeout<F>(job: F, seconds: u64) -> ConversionResult<(String, Vec<ConversionWarning>)>
where
    F: FnOnce() -> ConversionResult<(String, Vec<ConversionWarning>)> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let _ = sender.send(job());
    });
    match receiver.recv_timeout(Duration::from_secs(seconds)) {
        Ok(result) => result,
        Err(_) => Err(ConversionError::Timeout { seconds }),
    }
}

fn print_diagnostics(warnings: &[ConversionWarning], color: bool) {
    for warning in warnings {
        print_diagnostic(warning, color);
    }
}

fn print_diagnostic(warning: &ConversionWarning, color: bool) {
    if color {
        eprintln!(
            "{}{}:\x1b[0m {}",
            warning.severity.color_code(),
            warning.severity.label(),
            warning
        );
    } else {
        eprintln!("{}: {}", warning.severity.label(), warning);
    }
}

fn write_output(path: Option<&str>, output: &str) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, output),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()
        }
    }
}
