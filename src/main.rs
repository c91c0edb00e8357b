use argh::FromArgs;
use lsh::input::{BufferedReader, EditorReader, LineReader};
use lsh::{Interpreter, ShellResult};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(FromArgs)]
/// lsh: type program names and arguments, and hit enter.
/// Set LSH_LOG (e.g. LSH_LOG=debug) to enable logging on stderr.
struct Args {}

fn main() -> ExitCode {
    let _args: Args = argh::from_env();
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("lsh: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> ShellResult<()> {
    let mut reader: Box<dyn LineReader> = if io::stdin().is_terminal() {
        Box::new(EditorReader::new()?)
    } else {
        Box::new(BufferedReader::new(io::stdin().lock()))
    };

    let mut sh: Interpreter = Interpreter::default();
    sh.repl(reader.as_mut(), &mut io::stdout(), &mut io::stderr())
}

/// Logging stays off unless LSH_LOG asks for it, so stderr only carries the
/// shell's own diagnostics.
fn init_logging() {
    let filter = std::env::var("LSH_LOG").unwrap_or_else(|_| "off".to_string());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::new(filter))
        .init();
}
