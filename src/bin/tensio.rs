//! Tensio CLI - Command-line interface for Tensio
//!
//! Commands:
//! - analyze: Run the full pipeline and emit a report
//! - validate: Parse only and report per-line errors

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use tensio::parser::CsvParser;
use tensio::types::{ReportPayload, Thresholds};
use tensio::{analyze_csv, ReportEncoder, TENSIO_VERSION};

/// Tensio - analysis engine for home blood-pressure monitor CSV exports
#[derive(Parser)]
#[command(name = "tensio")]
#[command(version = TENSIO_VERSION)]
#[command(about = "Analyze home blood-pressure monitor CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and emit a report
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format (defaults to text on a TTY, json otherwise)
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Systolic limit in mmHg
        #[arg(long, default_value = "140")]
        systolic_limit: u16,

        /// Diastolic limit in mmHg
        #[arg(long, default_value = "90")]
        diastolic_limit: u16,
    },

    /// Parse only and report per-line errors
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON report payload
    Json,
    /// Pretty-printed JSON report payload
    JsonPretty,
    /// Human-readable text report
    Text,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TensioCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            format,
            systolic_limit,
            diastolic_limit,
        } => cmd_analyze(&input, &output, format, systolic_limit, diastolic_limit),

        Commands::Validate { input, json } => cmd_validate(&input, json),
    }
}

fn cmd_analyze(
    input: &PathBuf,
    output: &PathBuf,
    format: Option<OutputFormat>,
    systolic_limit: u16,
    diastolic_limit: u16,
) -> Result<(), TensioCliError> {
    let raw = read_input(input)?;
    let thresholds = Thresholds {
        systolic_limit,
        diastolic_limit,
    };

    let analysis = analyze_csv(&raw, &thresholds)?;

    // Surface the error count without blocking the report.
    if !analysis.errors.is_empty() {
        eprintln!(
            "warning: {} line(s) could not be parsed; run 'tensio validate' for details",
            analysis.errors.len()
        );
    }

    let payload = ReportEncoder::new().encode(&analysis);
    let format = format.unwrap_or_else(|| default_format(output));
    let rendered = format_output(&payload, &format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", rendered);
    } else {
        fs::write(output, rendered)?;
    }

    Ok(())
}

fn cmd_validate(input: &PathBuf, json: bool) -> Result<(), TensioCliError> {
    let raw = read_input(input)?;
    let outcome = CsvParser::parse(&raw)?;

    let data_lines = raw
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .count();

    let report = ValidationReport {
        data_lines,
        valid_readings: outcome.readings.len(),
        invalid_lines: outcome.errors.len(),
        errors: outcome
            .errors
            .iter()
            .map(|e| ValidationErrorDetail {
                line: e.line,
                message: e.message.clone(),
                content: e.content.clone(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Data lines:     {}", report.data_lines);
        println!("Valid readings: {}", report.valid_readings);
        println!("Invalid lines:  {}", report.invalid_lines);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Line {}: {}", err.line, err.message);
                println!("    {}", err.content);
            }
        }
    }

    if report.invalid_lines > 0 {
        Err(TensioCliError::ValidationFailed(report.invalid_lines))
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, TensioCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Writing a report to a terminal defaults to text; anything else gets JSON.
fn default_format(output: &PathBuf) -> OutputFormat {
    if output.to_string_lossy() == "-" && atty::is(atty::Stream::Stdout) {
        OutputFormat::Text
    } else {
        OutputFormat::Json
    }
}

fn format_output(payload: &ReportPayload, format: &OutputFormat) -> Result<String, TensioCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(payload)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(payload)? + "\n"),
        OutputFormat::Text => Ok(render_text(payload)),
    }
}

fn render_text(payload: &ReportPayload) -> String {
    let stats = &payload.statistics;
    let mut out = String::new();

    out.push_str("Blood Pressure Report\n");
    out.push_str("=====================\n");
    out.push_str(&format!("Generated:  {}\n", payload.generated_at_utc));
    out.push_str(&format!(
        "Thresholds: {}/{} mmHg\n",
        payload.thresholds.systolic_limit, payload.thresholds.diastolic_limit
    ));
    out.push_str(&format!(
        "Readings:   {} ({} buckets)\n",
        payload.reading_count, payload.bucket_count
    ));
    if !payload.line_errors.is_empty() {
        out.push_str(&format!(
            "Rejected:   {} line(s)\n",
            payload.line_errors.len()
        ));
    }

    out.push_str("\nChannels:\n");
    for (name, channel, sd) in [
        ("Systolic ", &stats.systolic, stats.variability.systolic_sd),
        ("Diastolic", &stats.diastolic, stats.variability.diastolic_sd),
        ("Pulse    ", &stats.pulse, stats.variability.pulse_sd),
    ] {
        out.push_str(&format!(
            "  {}  avg {:>6.1}  min {:>3}  max {:>3}  sd {:>5.1}\n",
            name, channel.average, channel.min, channel.max, sd
        ));
    }

    out.push_str(&format!(
        "\nAbove limits: systolic {} ({:.1}%), diastolic {} ({:.1}%)\n",
        stats.exceedance.systolic_count,
        stats.exceedance.systolic_pct,
        stats.exceedance.diastolic_count,
        stats.exceedance.diastolic_pct
    ));

    out.push_str(&format!(
        "Day/night:    systolic {}, diastolic {} ({})\n",
        fmt_pct(stats.day_night.systolic_diff_pct),
        fmt_pct(stats.day_night.diastolic_diff_pct),
        if stats.day_night.dipper {
            "dipper"
        } else {
            "non-dipper"
        }
    ));

    out.push_str(&format!(
        "Categories:   normal {} | elevated {} | stage1 {} | stage2 {} | stage3 {}\n",
        stats.categories.normal.count,
        stats.categories.elevated.count,
        stats.categories.stage1.count,
        stats.categories.stage2.count,
        stats.categories.stage3.count
    ));

    out.push_str(&format!(
        "Load:         total {:.1}% | systolic {:.1}% | diastolic {:.1}%\n",
        stats.load.total_pct, stats.load.systolic_pct, stats.load.diastolic_pct
    ));

    out.push_str("\nAdvice:\n");
    for item in &payload.advice {
        out.push_str(&format!("  - {}\n", item));
    }

    out
}

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(pct) => format!("{pct:.1}%"),
        None => "n/a".to_string(),
    }
}

// Error types

#[derive(Debug)]
enum TensioCliError {
    Io(io::Error),
    Analysis(tensio::AnalysisError),
    Json(serde_json::Error),
    ValidationFailed(usize),
}

impl From<io::Error> for TensioCliError {
    fn from(e: io::Error) -> Self {
        TensioCliError::Io(e)
    }
}

impl From<tensio::AnalysisError> for TensioCliError {
    fn from(e: tensio::AnalysisError) -> Self {
        TensioCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for TensioCliError {
    fn from(e: serde_json::Error) -> Self {
        TensioCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TensioCliError> for CliError {
    fn from(e: TensioCliError) -> Self {
        match e {
            TensioCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TensioCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the CSV header and data rows".to_string()),
            },
            TensioCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TensioCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} line(s) failed validation", count),
                hint: Some("Fix the listed lines and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    data_lines: usize,
    valid_readings: usize,
    invalid_lines: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    line: usize,
    message: String,
    content: String,
}
