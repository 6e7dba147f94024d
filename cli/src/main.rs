use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use protogo::error::GeneratorError;
use protogo::{describe_to_json, generate_from_bytes};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "protoc-gen-go")]
#[command(about = "Generate Go source from a protoc CodeGeneratorRequest", long_about = None)]
struct Cli {
    /// Read the serialized request from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the serialized response to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON summary of the request instead of generating
    #[arg(long)]
    describe: bool,
}

fn main() -> ExitCode {
    // stdout carries the response, so logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("protoc-gen-go: error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), GeneratorError> {
    let request = match &cli.input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            buf
        }
    };
    debug!(bytes = request.len(), "read request");

    // nothing is written until the whole response is ready
    let out = if cli.describe {
        let mut json = describe_to_json(&request)?;
        json.push('\n');
        json.into_bytes()
    } else {
        generate_from_bytes(&request)?
    };

    match &cli.output {
        Some(path) => fs::write(path, &out)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&out)?;
            stdout.flush()?;
        }
    }
    debug!(bytes = out.len(), "wrote response");
    Ok(())
}
