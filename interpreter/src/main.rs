use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use interpreter::{run_source, Environment, Repl, ShellResult};
use log::info;

/// beaver runs programs written in the Beaver language, or starts an interactive prompt when no
/// file is given.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source file to run instead of starting the prompt.
    file: Option<PathBuf>,

    /// Log every parse routine as it is entered and left (needs RUST_LOG=trace).
    #[arg(long)]
    trace_parser: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = match &args.file {
        Some(path) => run_file(path, args.trace_parser),
        None => run_prompt(args.trace_parser),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run_file(path: &Path, trace_parser: bool) -> ShellResult<()> {
    info!("running {}", path.display());
    let src = fs::read_to_string(path)?;
    let stdout = io::stdout();
    run_source(&src, &Environment::new_shared(), &mut stdout.lock(), trace_parser)
}

fn run_prompt(trace_parser: bool) -> ShellResult<()> {
    let user = std::env::var("USER").unwrap_or_else(|_| String::from("there"));
    println!("Hello {user}! This is the Beaver programming language!");
    println!("Feel free to type in commands");

    let stdin = io::stdin();
    let stdout = io::stdout();
    Repl::new(stdin.lock(), stdout.lock())
        .with_parser_tracing(trace_parser)
        .run()
}
