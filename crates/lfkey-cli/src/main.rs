use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use serde::{Deserialize, Serialize};

use lfkey_core::analysis::{self, TraceSummary};
use lfkey_core::{Credential, ReadMode};

/// Current report schema version.
const REPORT_VERSION: u32 = 1;

#[derive(Parser, Debug)]
#[command(name = "lfkey")]
#[command(version)]
#[command(
    about = "Offline decoder for low-frequency RFID edge-timing traces.",
    long_about = None,
    after_help = "Examples:\n  lfkey trace analyse capture.txt -o report.json\n  lfkey trace analyse capture.txt --mode psk --stdout\n  lfkey trace render EM4100 \"12 34 56 78 9A\" --stdout | lfkey trace analyse - --stdout"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on raw edge-timing traces (signed tick durations).
    Trace {
        #[command(subcommand)]
        command: TraceCommands,
    },
}

#[derive(Subcommand, Debug)]
enum TraceCommands {
    /// Replay a trace through the reader and generate a JSON report.
    #[command(alias = "analyze")]
    Analyse {
        /// Path to a trace file, or `-` for stdin
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Start the reader in this carrier mode
        #[arg(long, value_parser = parse_mode, default_value = "ask")]
        mode: ReadMode,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code when no stable read was found
        #[arg(long)]
        strict: bool,
    },

    /// Render a credential's emulation pulse stream as a trace file.
    Render {
        /// Credential type name (EM4100, H10301, I40134, IoProxXSF)
        key_type: String,

        /// Payload as space-separated hex bytes
        data: String,

        /// Output trace path
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write the trace to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Full frames to render
        #[arg(long, default_value_t = 8)]
        repeat: u32,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

fn parse_mode(value: &str) -> Result<ReadMode, String> {
    match value {
        "ask" => Ok(ReadMode::Normal),
        "psk" => Ok(ReadMode::Indala),
        other => Err(format!("unknown mode '{other}', expected 'ask' or 'psk'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Trace { command } => match command {
            TraceCommands::Analyse {
                input,
                report,
                stdout,
                mode,
                pretty,
                compact,
                quiet,
                strict,
            } => cmd_trace_analyse(input, report, stdout, mode, pretty, compact, quiet, strict),
            TraceCommands::Render {
                key_type,
                data,
                output,
                stdout,
                repeat,
                quiet,
            } => cmd_trace_render(key_type, data, output, stdout, repeat, quiet),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

/// Versioned report wrapped around a trace summary.
#[derive(Debug, Serialize, Deserialize)]
struct Report {
    report_version: u32,
    tool: ToolInfo,
    input: InputInfo,
    summary: TraceSummary,
}

#[derive(Debug, Serialize, Deserialize)]
struct ToolInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct InputInfo {
    path: String,
    bytes: u64,
}

#[allow(clippy::too_many_arguments)]
fn cmd_trace_analyse(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    mode: ReadMode,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
) -> Result<(), CliError> {
    let (text, path_label, bytes) = read_trace_input(&input)?;
    let durations = parse_trace(&text)?;
    let summary = analysis::analyze_trace(&durations, mode);

    let rep = Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "lfkey".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputInfo {
            path: path_label,
            bytes,
        },
        summary,
    };
    let json = serialize_report(&rep, pretty, compact)?;

    if stdout {
        print!("{}", json);
    } else {
        let report = report.expect("report required when not using stdout");
        if let Some(parent) = report.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }
        fs::write(&report, json)
            .with_context(|| format!("Failed to write report: {}", report.display()))?;
        if !quiet {
            eprintln!("OK: report written -> {}", report.display());
        }
    }

    if strict && rep.summary.reads.is_empty() {
        return Err(CliError::new(
            "no stable read in trace",
            Some("check the carrier mode (--mode ask|psk) or capture quality".to_string()),
        ));
    }
    Ok(())
}

fn cmd_trace_render(
    key_type: String,
    data: String,
    output: Option<PathBuf>,
    stdout: bool,
    repeat: u32,
    quiet: bool,
) -> Result<(), CliError> {
    let credential = Credential::from_parts(&key_type, &data).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("expected a type name and space-separated hex bytes, e.g. EM4100 \"12 34 56 78 9A\"".to_string()),
        )
    })?;
    let trace = analysis::render_trace(&credential, repeat).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("only RF credential types can be rendered".to_string()),
        )
    })?;

    let mut text = String::new();
    for duration in &trace {
        text.push_str(&duration.to_string());
        text.push('\n');
    }

    if stdout {
        print!("{}", text);
        return Ok(());
    }
    let output = output.expect("output required when not using stdout");
    fs::write(&output, text)
        .with_context(|| format!("Failed to write trace: {}", output.display()))?;
    if !quiet {
        eprintln!("OK: {} pulses written -> {}", trace.len(), output.display());
    }
    Ok(())
}

fn read_trace_input(input: &PathBuf) -> Result<(String, String, u64), CliError> {
    if input.as_os_str() == "-" {
        let text = std::io::read_to_string(std::io::stdin())
            .context("Failed to read trace from stdin")?;
        let bytes = text.len() as u64;
        return Ok((text, "-".to_string(), bytes));
    }
    let resolved = resolve_input_path(input)?;
    if !resolved.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", resolved.display()),
            Some("use a raw trace file with one signed duration per line".to_string()),
        ));
    }
    let text = fs::read_to_string(&resolved)
        .with_context(|| format!("Failed to read input file: {}", resolved.display()))?;
    let bytes = fs::metadata(&resolved)
        .with_context(|| format!("Failed to read input file: {}", resolved.display()))?
        .len();
    Ok((text, resolved.display().to_string(), bytes))
}

/// Parse a trace: one signed tick duration per whitespace-separated entry;
/// `#` starts a comment line.
fn parse_trace(text: &str) -> Result<Vec<i64>, CliError> {
    let mut durations = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for value in line.split_whitespace() {
            let duration: i64 = value.parse().map_err(|_| {
                CliError::new(
                    format!("invalid trace entry '{value}'"),
                    Some("entries are signed tick durations, positive while high".to_string()),
                )
            })?;
            durations.push(duration);
        }
    }
    Ok(durations)
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches)",
                pattern,
                matches.len()
            ),
            Some("pass a single trace file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
