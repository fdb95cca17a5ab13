use anyhow::{Context, Result};
use clap::Parser;
use queuen_evaluator::Driver;
use queuen_parser::{parse_line, TokenStream};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Interpreter for the queuen lazy-queue language.
#[derive(Parser)]
#[command(name = "queuen", version, about)]
struct Cli {
    /// Script to run; starts an interactive session when omitted.
    script: Option<PathBuf>,

    /// How many elements to pull per level before concluding a stream is
    /// infinite.
    #[arg(long, default_value_t = queuen_evaluator::DEFAULT_PROBE_BUDGET)]
    budget: usize,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let driver = Driver::new().probe_budget(cli.budget);

    let (stream, interactive) = match &cli.script {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            (TokenStream::new(source), false)
        }
        None => (
            TokenStream::with_refill(String::new(), Box::new(prompt)),
            true,
        ),
    };

    let clean = interpret(stream, driver)?;
    if clean || interactive {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Print the prompt and read one line of input; `None` ends the session.
fn prompt() -> Option<String> {
    print!("\x1b[2mqueuen>\x1b[22m ");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line).ok()?;
    if read == 0 {
        println!("exit");
        return None;
    }
    if matches!(line.trim_end(), "exit" | "quit") {
        return None;
    }
    if !line.ends_with('\n') {
        line.push('\n');
    }
    Some(line)
}

/// Parse and run statements until the stream is exhausted. Returns whether
/// every line succeeded.
fn interpret(mut stream: TokenStream, driver: Driver) -> Result<bool> {
    let mut clean = true;
    loop {
        match parse_line(&mut stream) {
            Ok(None) => break,
            Ok(Some(statement)) => {
                let stdout = io::stdout();
                if let Err(error) = driver.run(&statement, &mut stdout.lock()) {
                    eprintln!("error: {error}");
                    clean = false;
                }
            }
            Err(error) => {
                clean = false;
                error
                    .to_diagnostic(stream.log())
                    .write(io::stderr().lock())
                    .context("could not render diagnostic")?;
                if error.is_lexical() {
                    break;
                }
            }
        }
    }
    Ok(clean)
}
