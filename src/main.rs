// snippet-runner: run JavaScript lesson snippets and report their console output

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::style::Stylize;

use snippet_runner::{EngineConfig, ExecutionResult, ExecutionStatus, SnippetEngine};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Snippet files; each file is one snippet named after its file stem
    files: Vec<String>,

    /// Inline snippet source (repeatable), named eval-1, eval-2, ...
    #[arg(short, long = "eval", value_name = "CODE")]
    eval: Vec<String>,

    /// Print the result table as JSON instead of the report
    #[arg(long)]
    json: bool,

    /// Nested calls allowed before a RangeError
    #[arg(long)]
    max_call_depth: Option<usize>,

    /// Nested arrays/objects walked by join and JSON.stringify
    #[arg(long)]
    max_nesting_depth: Option<usize>,

    /// Longest string a snippet may build, in bytes
    #[arg(long)]
    max_string_length: Option<usize>,

    /// Console lines kept per snippet
    #[arg(long)]
    max_output_lines: Option<usize>,

    /// Stack lines appended to error messages
    #[arg(long)]
    stack_frames: Option<usize>,

    /// Nesting depth rendered in console output
    #[arg(long)]
    inspect_depth: Option<usize>,
}

impl Args {
    /// Environment configuration with command-line overrides on top
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::from_env().context("invalid SNIPPET_* environment")?;
        if let Some(depth) = self.max_call_depth {
            config.max_call_depth = depth;
        }
        if let Some(depth) = self.max_nesting_depth {
            config.max_nesting_depth = depth;
        }
        if let Some(length) = self.max_string_length {
            config.max_string_length = length;
        }
        if let Some(lines) = self.max_output_lines {
            config.max_output_lines = lines;
        }
        if let Some(frames) = self.stack_frames {
            config.stack_frames = frames;
        }
        if let Some(depth) = self.inspect_depth {
            config.inspect_depth = depth;
        }
        config.validate()?;
        Ok(config)
    }

    /// `(id, source)` pairs in command-line order; stdin when nothing is given
    fn snippets(&self) -> Result<Vec<(String, String)>> {
        let mut snippets = Vec::new();
        for file in &self.files {
            let path = Path::new(file);
            let source =
                fs::read_to_string(path).with_context(|| format!("failed to read {}", file))?;
            let id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.clone());
            snippets.push((id, source));
        }
        for (i, code) in self.eval.iter().enumerate() {
            snippets.push((format!("eval-{}", i + 1), code.clone()));
        }

        if snippets.is_empty() {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read snippet from stdin")?;
            if source.trim().is_empty() {
                bail!("no snippets given; pass files, --eval CODE, or pipe source on stdin");
            }
            snippets.push(("stdin".to_string(), source));
        }
        Ok(snippets)
    }
}

fn print_report(id: &str, result: &ExecutionResult) {
    let marker = match result.status {
        ExecutionStatus::Succeeded => "ok".to_string().green().bold(),
        ExecutionStatus::Failed => "failed".to_string().red().bold(),
        other => other.to_string().yellow(),
    };
    println!("[{}] {}", marker, id.bold());
    for line in &result.output_lines {
        for part in line.lines() {
            println!("    {}", part);
        }
    }
    if let Some(message) = &result.error_message {
        for part in message.lines() {
            println!("  {}", part.red());
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.engine_config()?;
    let snippets = args.snippets()?;

    let mut engine = SnippetEngine::new(config);
    let mut any_failed = false;
    for (id, source) in &snippets {
        let result = engine.execute(id, source);
        any_failed |= result.status == ExecutionStatus::Failed;
        if !args.json {
            print_report(id, result);
        }
    }

    if args.json {
        let table = serde_json::to_string_pretty(engine.results())?;
        println!("{}", table);
    }

    Ok(if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
