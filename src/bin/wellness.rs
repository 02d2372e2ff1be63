//! Wellness CLI - Command-line interface for Wellness Insights
//!
//! Commands:
//! - analyze: Turn sleep (and workout) rows into an insights payload
//! - score: Score days of engagement against the configured goals
//! - medication: Show the medication status at a given time
//! - validate: Validate sleep log rows
//! - doctor: Diagnose configuration and environment
//! - schema: Describe the input and output formats

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wellness_insights::config::{InsightsConfig, StoredSettings};
use wellness_insights::encoder::PAYLOAD_SCHEMA_VERSION;
use wellness_insights::pipeline::InsightsProcessor;
use wellness_insights::schema::{
    parse_clock_time, parse_date, RowAdapter, SleepLogRow, WorkoutLogRow, SCHEMA_VERSION,
};
use wellness_insights::score::DailyEngagement;
use wellness_insights::types::SleepFactor;
use wellness_insights::{InsightsError, INSIGHTS_VERSION, PRODUCER_NAME};

/// Wellness - On-device analytics for sleep and daily engagement logs
#[derive(Parser)]
#[command(name = "wellness")]
#[command(version = INSIGHTS_VERSION)]
#[command(about = "Derive sleep insights and daily scores from wellness logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn sleep log rows into an insights payload
    Analyze {
        /// Sleep rows file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Workout rows file path (JSON array or NDJSON, detected from content)
        #[arg(long)]
        workouts: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Sleep rows input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Analysis window in days (7, 30 or 90), overrides the settings file
        #[arg(long)]
        window: Option<u32>,

        /// Last day of the window (YYYY-MM-DD), defaults to the most recent night
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Score days of engagement (0-100)
    Score {
        /// Engagement rows file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the medication status at a given time
    Medication {
        /// Settings file (TOML) holding the medication schedule
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Local clock time (HH:MM), defaults to now
        #[arg(long)]
        now: Option<String>,

        /// Mark today's dose as taken
        #[arg(long)]
        taken: bool,
    },

    /// Validate sleep log rows
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a settings file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of rows
    Json,
    /// Newline-delimited JSON (one row per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (wellness.sleep_log.v1)
    Input,
    /// Output schema (wellness.insights.v1)
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
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

fn run(cli: Cli) -> Result<(), WellnessCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            workouts,
            output,
            input_format,
            output_format,
            config,
            window,
            as_of,
        } => cmd_analyze(
            &input,
            workouts.as_deref(),
            &output,
            input_format,
            output_format,
            config.as_deref(),
            window,
            as_of.as_deref(),
        ),

        Commands::Score {
            input,
            input_format,
            config,
        } => cmd_score(&input, input_format, config.as_deref()),

        Commands::Medication { config, now, taken } => {
            cmd_medication(config.as_deref(), now.as_deref(), taken)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    input: &Path,
    workouts: Option<&Path>,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    window: Option<u32>,
    as_of: Option<&str>,
) -> Result<(), WellnessCliError> {
    let rows: Vec<SleepLogRow> = parse_rows(&read_input(input)?, &input_format)?;
    if rows.is_empty() {
        return Err(WellnessCliError::NoRows);
    }
    let sleep = RowAdapter::to_sleep_records(&rows)?;

    let workouts = match workouts {
        Some(path) => {
            let rows: Vec<WorkoutLogRow> = RowAdapter::parse_auto(&read_input(path)?)?;
            RowAdapter::to_workout_records(&rows)?
        }
        None => Vec::new(),
    };

    let mut settings = load_settings(config)?;
    if window.is_some() {
        settings.analysis_window_days = window;
    }
    let processor = InsightsProcessor::with_config(settings.resolve()?);

    let as_of = as_of.map(parse_date).transpose()?;
    let insights = processor.analyze_sleep(&sleep, &workouts, as_of);
    debug!(sample_size = insights.sample_size, "analysis complete");

    let payload = processor.encode(&insights);
    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&payload)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&payload)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_score(
    input: &Path,
    input_format: InputFormat,
    config: Option<&Path>,
) -> Result<(), WellnessCliError> {
    let days: Vec<DailyEngagement> = parse_rows(&read_input(input)?, &input_format)?;
    if days.is_empty() {
        return Err(WellnessCliError::NoRows);
    }
    let processor = InsightsProcessor::with_config(load_settings(config)?.resolve()?);

    let scores: Vec<u8> = days.iter().map(|day| processor.daily_score(day)).collect();
    println!("{}", serde_json::to_string(&scores)?);
    Ok(())
}

fn cmd_medication(
    config: Option<&Path>,
    now: Option<&str>,
    taken: bool,
) -> Result<(), WellnessCliError> {
    let mut resolved = load_settings(config)?.resolve()?;
    if taken {
        resolved.medication.taken_today = true;
    }

    let now = match now {
        Some(raw) => parse_clock_time(raw)?,
        None => chrono::Local::now().time(),
    };

    let status = InsightsProcessor::with_config(resolved).medication_status(now);
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), WellnessCliError> {
    let rows: Vec<SleepLogRow> = parse_rows(&read_input(input)?, &input_format)?;
    let results = RowAdapter::validate_sleep_rows(&rows);

    let report = ValidationReport {
        total_rows: rows.len(),
        valid_rows: rows.len() - results.len(),
        invalid_rows: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                row_id: r.row_id.clone(),
                date: r.date.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:   {}", report.total_rows);
        println!("Valid rows:   {}", report.valid_rows);
        println!("Invalid rows: {}", report.invalid_rows);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Row {} ({}, index {}): {}",
                    err.row_id.as_deref().unwrap_or("unknown"),
                    err.date,
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_rows > 0 {
        Err(WellnessCliError::ValidationFailed(report.invalid_rows))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), WellnessCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Wellness Insights version {}", INSIGHTS_VERSION),
        },
        DoctorCheck {
            name: "schema_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Input schema: {}, output schema: {}", SCHEMA_VERSION, PAYLOAD_SCHEMA_VERSION),
        },
    ];

    if let Some(config_path) = config {
        checks.push(check_config(config_path));
    }

    checks.push(check_stdin(atty::is(atty::Stream::Stdin)));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: INSIGHTS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Wellness Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(WellnessCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_config(path: &Path) -> DoctorCheck {
    let (status, message) = if !path.exists() {
        (CheckStatus::Warning, "Settings file does not exist, defaults apply".to_string())
    } else {
        match fs::read_to_string(path) {
            Ok(content) => {
                match StoredSettings::from_toml_str(&content).and_then(StoredSettings::resolve) {
                    Ok(config) => (CheckStatus::Ok, describe_config(&config)),
                    Err(e) => (CheckStatus::Error, format!("Invalid settings: {}", e)),
                }
            }
            Err(e) => (CheckStatus::Error, format!("Cannot read settings file: {}", e)),
        }
    };

    DoctorCheck {
        name: "config".to_string(),
        status,
        message,
    }
}

fn describe_config(config: &InsightsConfig) -> String {
    format!(
        "Settings valid (sleep goal {}h, {}-day window, medication {})",
        config.sleep_goal_hours,
        config.analysis_window.days(),
        if config.medication.enabled { "on" } else { "off" }
    )
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), WellnessCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One row per night (date is unique):");
                println!("- date: YYYY-MM-DD");
                println!("- bedtime, wake_time: HH:MM or HH:MM:SS (wake may be past midnight)");
                println!("- quality: integer 1-5");
                println!("- positive_factors, negative_factors: factor tags (optional)");
                println!("- times_woken: non-negative integer (optional)");
                println!();
                println!("Positive factors: {}", factor_tags(&SleepFactor::POSITIVE));
                println!("Negative factors: {}", factor_tags(&SleepFactor::NEGATIVE));
                println!();
                println!("Workout rows: date, performance (>= 0), personal_record (optional)");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", PAYLOAD_SCHEMA_VERSION);
                println!();
                println!("- schema_version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc");
                println!("- window: {{ days, start_date, end_date }}");
                println!("- quality: {{ sample_size, sufficient_data }}");
                println!("- insights:");
                println!("  - average_duration_minutes, average_quality");
                println!("  - correlations: {{ factor_impacts, workout_performance_correlation,");
                println!("                   pr_chance_increase, best_bedtime, best_wake_time, ... }}");
                println!("  - schedule: {{ weekday, weekend }}");
                println!("  - tips: up to 5 strings");
            }
        }
    }

    Ok(())
}

// Helper functions

/// stdin is only read when an input path is "-", which needs a pipe
fn check_stdin(is_tty: bool) -> DoctorCheck {
    if is_tty {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Warning,
            message: "stdin is a TTY, --input - will wait for typed rows".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    }
}

fn read_input(path: &Path) -> Result<String, WellnessCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn parse_rows<T: serde::de::DeserializeOwned>(
    data: &str,
    format: &InputFormat,
) -> Result<Vec<T>, WellnessCliError> {
    let rows = match format {
        InputFormat::Json => RowAdapter::parse_array(data)?,
        InputFormat::Ndjson => RowAdapter::parse_ndjson(data)?,
    };
    Ok(rows)
}

fn load_settings(path: Option<&Path>) -> Result<StoredSettings, WellnessCliError> {
    match path {
        Some(path) => Ok(StoredSettings::from_toml_str(&fs::read_to_string(path)?)?),
        None => Ok(StoredSettings::default()),
    }
}

fn factor_tags(factors: &[SleepFactor]) -> String {
    factors
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn get_input_json_schema() -> String {
    let positive: Vec<&str> = SleepFactor::POSITIVE.iter().map(|f| f.as_str()).collect();
    let negative: Vec<&str> = SleepFactor::NEGATIVE.iter().map(|f| f.as_str()).collect();

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Sleep log row",
        "type": "object",
        "required": ["date", "bedtime", "wake_time", "quality"],
        "properties": {
            "id": { "type": "string" },
            "date": { "type": "string", "format": "date" },
            "bedtime": { "type": "string", "pattern": "^\\d{2}:\\d{2}(:\\d{2})?$" },
            "wake_time": { "type": "string", "pattern": "^\\d{2}:\\d{2}(:\\d{2})?$" },
            "quality": { "type": "integer", "minimum": 1, "maximum": 5 },
            "positive_factors": {
                "type": "array",
                "items": { "type": "string", "enum": positive }
            },
            "negative_factors": {
                "type": "array",
                "items": { "type": "string", "enum": negative }
            },
            "times_woken": { "type": "integer", "minimum": 0 }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": PAYLOAD_SCHEMA_VERSION,
        "description": "Sleep insights payload",
        "type": "object",
        "required": ["schema_version", "producer", "computed_at_utc", "window", "quality", "insights"],
        "properties": {
            "schema_version": { "type": "string", "const": PAYLOAD_SCHEMA_VERSION },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "window": {
                "type": "object",
                "properties": {
                    "days": { "type": "integer", "enum": [7, 30, 90] },
                    "start_date": { "type": ["string", "null"], "format": "date" },
                    "end_date": { "type": ["string", "null"], "format": "date" }
                }
            },
            "quality": {
                "type": "object",
                "properties": {
                    "sample_size": { "type": "integer" },
                    "sufficient_data": { "type": "boolean" }
                }
            },
            "insights": { "type": "object" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum WellnessCliError {
    Io(io::Error),
    Insights(InsightsError),
    Json(serde_json::Error),
    Validation(wellness_insights::ValidationError),
    NoRows,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for WellnessCliError {
    fn from(e: io::Error) -> Self {
        WellnessCliError::Io(e)
    }
}

impl From<InsightsError> for WellnessCliError {
    fn from(e: InsightsError) -> Self {
        match e {
            InsightsError::Validation(e) => WellnessCliError::Validation(e),
            other => WellnessCliError::Insights(other),
        }
    }
}

impl From<serde_json::Error> for WellnessCliError {
    fn from(e: serde_json::Error) -> Self {
        WellnessCliError::Json(e)
    }
}

impl From<wellness_insights::ValidationError> for WellnessCliError {
    fn from(e: wellness_insights::ValidationError) -> Self {
        WellnessCliError::Validation(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WellnessCliError> for CliError {
    fn from(e: WellnessCliError) -> Self {
        match e {
            WellnessCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WellnessCliError::Insights(e) => {
                let (code, hint) = match e {
                    InsightsError::ConfigError(_) | InsightsError::TomlError(_) => {
                        ("CONFIG_ERROR", "Run 'wellness doctor --config <file>' for details")
                    }
                    _ => ("PARSE_ERROR", "Ensure input matches wellness.sleep_log.v1 schema"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            WellnessCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            WellnessCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'wellness validate' for details".to_string()),
            },
            WellnessCliError::NoRows => CliError {
                code: "NO_ROWS".to_string(),
                message: "No rows found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            WellnessCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} rows failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            WellnessCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_rows: usize,
    valid_rows: usize,
    invalid_rows: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    row_id: Option<String>,
    date: String,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
