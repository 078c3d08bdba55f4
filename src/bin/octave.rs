//! CLI front-end for the OCTAVE pipeline.
//!
//! Reads a document from a file or stdin, runs it through
//! [`octave::octave::pipeline`], and prints the JSON tool-response shape the
//! corresponding subcommand promises.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use octave::octave::formats::json;
use octave::octave::lexer::LexMode;
use octave::octave::pipeline::{self, PipelineConfig};
use octave::octave::projector::ProjectionMode;
use octave::octave::sealer::now_iso8601;

#[derive(Parser)]
#[command(name = "octave", about = "Lenient-to-canonical OCTAVE document pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a document against its own holographic-pattern schema.
    Validate {
        path: Option<PathBuf>,
        #[arg(long)]
        strict: bool,
    },
    /// Canonicalize a document, optionally applying lenient repairs.
    Write {
        path: Option<PathBuf>,
        #[arg(long)]
        fix: bool,
        #[arg(long)]
        strict: bool,
    },
    /// Project a document into a reduced audience-specific view.
    Eject {
        path: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Mode::Canonical)]
        mode: Mode,
    },
    /// Seal a document: canonical digest plus idempotence verification.
    Seal { path: Option<PathBuf> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Canonical,
    Authoring,
    Executive,
    Developer,
}

impl From<Mode> for ProjectionMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Canonical => ProjectionMode::Canonical,
            Mode::Authoring => ProjectionMode::Authoring,
            Mode::Executive => ProjectionMode::Executive,
            Mode::Developer => ProjectionMode::Developer,
        }
    }
}

fn read_source(path: &Option<PathBuf>) -> std::io::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn lex_mode(strict: bool) -> LexMode {
    if strict {
        LexMode::Strict
    } else {
        LexMode::Lenient
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let sealed_at = now_iso8601();

    let result = match cli.command {
        Command::Validate { path, strict } => read_source(&path).map_err(|e| e.to_string()).and_then(|src| {
            let config = PipelineConfig { lex_mode: lex_mode(strict), ..PipelineConfig::default() };
            let output = pipeline::run(&src, &config, &sealed_at).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&json::validate_response(&output)).map_err(|e| e.to_string())
        }),
        Command::Write { path, fix, strict } => read_source(&path).map_err(|e| e.to_string()).and_then(|src| {
            let config = PipelineConfig { lex_mode: lex_mode(strict), fix, ..PipelineConfig::default() };
            let output = pipeline::run(&src, &config, &sealed_at).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&json::write_response(&output)).map_err(|e| e.to_string())
        }),
        Command::Eject { path, mode } => read_source(&path).map_err(|e| e.to_string()).and_then(|src| {
            let projection: ProjectionMode = mode.into();
            let config = PipelineConfig { projection, ..PipelineConfig::default() };
            let output = pipeline::run(&src, &config, &sealed_at).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&json::eject_response(&output, projection)).map_err(|e| e.to_string())
        }),
        Command::Seal { path } => read_source(&path).map_err(|e| e.to_string()).and_then(|src| {
            let config = PipelineConfig::default();
            let output = pipeline::run(&src, &config, &sealed_at).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&output.seal).map_err(|e| e.to_string())
        }),
    };

    match result {
        Ok(text) => {
            println!("{text}");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
