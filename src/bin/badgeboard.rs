//! badgeboard CLI - Command-line interface for badge and streak derivation
//!
//! Commands:
//! - clean: Clean raw survey exports
//! - badges: Write per-batch badge listings
//! - count: Total badges across all listings
//! - streak: Compute attendance streaks
//! - run: All of the above, in order
//! - config: Print the effective configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use badgeboard::encoder::Encoder;
use badgeboard::pipeline::{self, RunReport, StageReport};
use badgeboard::{BadgeError, PipelineConfig, BADGEBOARD_VERSION};

/// badgeboard - Badges and streaks from repeated-measures survey exports
#[derive(Parser)]
#[command(name = "badgeboard")]
#[command(version = BADGEBOARD_VERSION)]
#[command(about = "Derive participant badges and streaks from survey exports", long_about = None)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    /// Log output format
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Print stage reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Default)]
struct PathArgs {
    /// JSON config file; flags and environment override its values
    #[arg(long, global = true, env = "BADGEBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of raw survey exports
    #[arg(long, global = true, env = "BADGEBOARD_RAW_DIR")]
    raw_dir: Option<PathBuf>,

    /// Directory for cleaned batches
    #[arg(long, global = true, env = "BADGEBOARD_CLEANED_DIR")]
    cleaned_dir: Option<PathBuf>,

    /// Directory for per-batch badge listings
    #[arg(long, global = true, env = "BADGEBOARD_BADGES_DIR")]
    badges_dir: Option<PathBuf>,

    /// Output file for badge totals
    #[arg(long, global = true, env = "BADGEBOARD_TOTALS_PATH")]
    totals_path: Option<PathBuf>,

    /// Output file for streaks
    #[arg(long, global = true, env = "BADGEBOARD_STREAK_PATH")]
    streak_path: Option<PathBuf>,
}

impl PathArgs {
    /// Load the config file (or defaults) and apply overrides
    fn resolve(&self) -> Result<PipelineConfig, BadgeError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(dir) = &self.raw_dir {
            config.raw_dir = dir.clone();
        }
        if let Some(dir) = &self.cleaned_dir {
            config.cleaned_dir = dir.clone();
        }
        if let Some(dir) = &self.badges_dir {
            config.badges_dir = dir.clone();
        }
        if let Some(path) = &self.totals_path {
            config.totals_path = path.clone();
        }
        if let Some(path) = &self.streak_path {
            config.streak_path = path.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Clean raw survey exports into the cleaned directory
    Clean,
    /// Write a badge listing (CSV and JSON) for every cleaned batch
    Badges,
    /// Total badge counts across all listings
    Count,
    /// Compute attendance streaks over cleaned batches
    Streak,
    /// Run clean, badges, count and streak in order
    Run,
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    /// Human-readable logs
    Pretty,
    /// Structured JSON logs
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn run(cli: Cli) -> Result<(), BadgeError> {
    let config = cli.paths.resolve()?;

    match cli.command {
        Commands::Clean => {
            let report = pipeline::clean_folder(&config)?;
            print_stage("clean", &report, cli.json)
        }
        Commands::Badges => {
            let report = pipeline::badge_folder(&config.cleaned_dir, &config.badges_dir)?;
            print_stage("badges", &report, cli.json)
        }
        Commands::Count => {
            let (counts, mut report) = pipeline::count_folder(&config.badges_dir)?;
            Encoder::write_totals(&config.totals_path, &counts)?;
            report.written.push(config.totals_path.clone());
            print_stage("count", &report, cli.json)
        }
        Commands::Streak => {
            let (records, mut report) = pipeline::streak_folder(&config.cleaned_dir)?;
            Encoder::write_streaks(&config.streak_path, &records)?;
            report.written.push(config.streak_path.clone());
            print_stage("streak", &report, cli.json)
        }
        Commands::Run => {
            let report = pipeline::run_all(&config)?;
            print_run(&report, cli.json)
        }
        Commands::Config => {
            println!("{}", Encoder::to_json(&config)?);
            Ok(())
        }
    }
}

fn print_stage(stage: &str, report: &StageReport, json: bool) -> Result<(), BadgeError> {
    if json {
        println!("{}", Encoder::to_json(report)?);
        return Ok(());
    }

    println!("{stage}: {} written, {} skipped", report.written.len(), report.skipped.len());
    for file in &report.written {
        println!("  [OK]   {}", file.display());
    }
    for skipped in &report.skipped {
        println!("  [SKIP] {}: {}", skipped.file.display(), skipped.reason);
    }
    Ok(())
}

fn print_run(report: &RunReport, json: bool) -> Result<(), BadgeError> {
    if json {
        println!("{}", Encoder::to_json(report)?);
        return Ok(());
    }

    print_stage("clean", &report.clean, false)?;
    print_stage("badges", &report.badges, false)?;
    print_stage("count", &report.totals, false)?;
    print_stage("streak", &report.streaks, false)
}

// Error reporting

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BadgeError> for CliError {
    fn from(e: BadgeError) -> Self {
        let (code, hint) = match &e {
            BadgeError::Io { .. } => ("IO_ERROR", Some("Check file paths and permissions")),
            BadgeError::Csv(_) => ("CSV_ERROR", Some("Check that input files are valid CSV")),
            BadgeError::Json(_) => ("JSON_ERROR", Some("Check JSON syntax")),
            BadgeError::MissingDirectory(_) => (
                "MISSING_DIRECTORY",
                Some("Run the earlier stage first or pass the right directory"),
            ),
            BadgeError::MissingHeader { .. } => (
                "MISSING_HEADER",
                Some("Raise header_probe_rows or check the export format"),
            ),
            BadgeError::UnknownLabel(_) => ("UNKNOWN_LABEL", None),
            BadgeError::MalformedFilename(_) => (
                "MALFORMED_FILENAME",
                Some("Exports are expected to be named like '#90_Course-AT07_Date.csv'"),
            ),
            BadgeError::OutOfOrderBatch { .. } => ("OUT_OF_ORDER_BATCH", None),
            BadgeError::Config(_) => ("CONFIG_ERROR", Some("Run 'badgeboard config' to inspect")),
        };
        CliError {
            code: code.to_string(),
            message: e.to_string(),
            hint: hint.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "badgeboard",
            "--cleaned-dir",
            "clean",
            "run",
            "--streak-path",
            "out/streaks.json",
        ]);
        let config = cli.paths.resolve().unwrap();

        assert_eq!(config.cleaned_dir, PathBuf::from("clean"));
        assert_eq!(config.streak_path, PathBuf::from("out/streaks.json"));
        assert_eq!(config.badges_dir, PathBuf::from("Badges_data"));
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"raw_dir": "exports", "badges_dir": "from-file"}"#).unwrap();

        let args = PathArgs {
            config: Some(path),
            badges_dir: Some(PathBuf::from("from-flag")),
            ..PathArgs::default()
        };
        let config = args.resolve().unwrap();

        assert_eq!(config.raw_dir, PathBuf::from("exports"));
        assert_eq!(config.badges_dir, PathBuf::from("from-flag"));
    }

    #[test]
    fn test_cli_error_codes() {
        let err = CliError::from(BadgeError::MissingDirectory(PathBuf::from("Cleaned data")));
        assert_eq!(err.code, "MISSING_DIRECTORY");
        assert!(err.message.contains("Cleaned data"));
    }
}
