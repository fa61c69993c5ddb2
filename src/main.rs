//! dustpan - find duplicate files and cleanup candidates.
//!
//! Usage:
//!   dustpan scan PATH [-o FILE]          Scan and summarize, or save records as JSON
//!   dustpan duplicates PATH              Exact and similar-name duplicates
//!   dustpan cleanup PATH                 Prioritized cleanup candidates
//!   dustpan duplicates --input FILE      Analyze a saved scan instead of walking
//!   dustpan --help                       Show help

mod logging;
mod settings;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dustpan_analyze::{
    CleanupCategory, CleanupClassifier, CleanupReport, DuplicateFinder, DuplicateKind,
    DuplicateReport, SafetyLevel, SimilarGrouping, format_age,
};
use dustpan_core::{RecordSet, SavedRecords};
use dustpan_scan::JwalkScanner;

use crate::logging::init_logger;
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "dustpan",
    version,
    about = "Find duplicate files and safe-to-delete clutter",
    long_about = "dustpan scans a directory, groups identical and similarly named files, \
                  and ranks cleanup candidates by how safe they are to delete.\n\n\
                  Nothing is ever deleted; output is a report."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (defaults to <config dir>/dustpan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and show a summary
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Write the record set as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find exact and similar-name duplicates
    Duplicates {
        #[command(flatten)]
        source: Source,

        /// Maximum number of groups to report (0 = all)
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Merge chains of similar names into one group
        #[arg(long)]
        connected: bool,
    },

    /// List cleanup candidates
    Cleanup {
        #[command(flatten)]
        source: Source,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only show candidates at least this safe
        #[arg(long, default_value = "user-decision")]
        min_safety: SafetyArg,
    },
}

/// Where records come from: a live scan or a saved `scan -o` file.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Directory to scan
    path: Option<PathBuf>,

    /// Record set written by `dustpan scan -o`
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SafetyArg {
    Safe,
    LikelySafe,
    Caution,
    UserDecision,
}

impl From<SafetyArg> for SafetyLevel {
    fn from(arg: SafetyArg) -> Self {
        match arg {
            SafetyArg::Safe => SafetyLevel::Safe,
            SafetyArg::LikelySafe => SafetyLevel::LikelySafe,
            SafetyArg::Caution => SafetyLevel::Caution,
            SafetyArg::UserDecision => SafetyLevel::UserDecision,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logger(cli.verbose);
    let settings = Settings::load(cli.config.as_deref())?;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let command = cli.command;
    let result = tokio::task::spawn_blocking(move || run(command, &settings, &cancel)).await?;

    watcher.abort();
    result
}

/// Cancel `token` on the first Ctrl-C.
async fn cancel_on_ctrl_c(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupted, finishing with partial results");
        token.cancel();
    }
}

fn run(command: Command, settings: &Settings, cancel: &CancellationToken) -> Result<()> {
    match command {
        Command::Scan { path, output } => run_scan(&path, output, settings),
        Command::Duplicates {
            source,
            top,
            format,
            connected,
        } => {
            let records = load_records(&source, settings)?;
            run_duplicates(&records, settings, cancel, top, format, connected)
        }
        Command::Cleanup {
            source,
            format,
            min_safety,
        } => {
            let records = load_records(&source, settings)?;
            run_cleanup(&records, settings, cancel, format, min_safety.into())
        }
    }
}

/// Scan `path` with the configured scanner options.
fn scan(path: &Path, settings: &Settings) -> Result<RecordSet> {
    let path = path.canonicalize().context("Invalid path")?;
    eprintln!("Scanning {}...", path.display());

    let output = JwalkScanner::new()
        .scan(&settings.scan_config(&path))
        .context("Scan failed")?;
    if !output.warnings.is_empty() {
        eprintln!("{} warning(s) during scan", output.warnings.len());
    }
    info!(
        records = output.records.len(),
        secs = output.duration.as_secs_f64(),
        "scan complete"
    );
    Ok(output.records)
}

fn load_records(source: &Source, settings: &Settings) -> Result<RecordSet> {
    match (&source.path, &source.input) {
        (_, Some(input)) => {
            let file = std::fs::File::open(input)
                .wrap_err_with(|| format!("Failed to open {}", input.display()))?;
            let saved: SavedRecords = serde_json::from_reader(std::io::BufReader::new(file))
                .wrap_err_with(|| format!("Invalid record file {}", input.display()))?;
            let records = RecordSet::from_saved(saved);
            if !records.skipped.is_empty() {
                warn!(skipped = records.skipped.len(), "saved scan contained rejected records");
            }
            Ok(records)
        }
        (Some(path), None) => scan(path, settings),
        (None, None) => scan(Path::new("."), settings),
    }
}

/// Run a scan and display a summary, or save it.
fn run_scan(path: &Path, output: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let records = scan(path, settings)?;

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&output_path, json)
            .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
        eprintln!("Saved {} records to {}", records.len(), output_path.display());
        return Ok(());
    }

    let stats = &records.stats;
    println!();
    println!("{}", "─".repeat(60));
    println!(" {} - {}", path.display(), format_size(stats.total_size));
    println!(" {} files, {} directories", stats.total_files, stats.total_dirs);
    println!("{}", "─".repeat(60));
    if let Some((path, size)) = &stats.largest_file {
        println!(" Largest: {} ({})", path.display(), format_size(*size));
    }
    if let Some((path, modified)) = &stats.oldest_file {
        println!(" Oldest:  {} ({} ago)", path.display(), age_of(*modified));
    }
    if !records.skipped.is_empty() {
        println!(" Skipped: {}", records.skipped.len());
    }
    Ok(())
}

/// Run duplicate detection.
fn run_duplicates(
    records: &RecordSet,
    settings: &Settings,
    cancel: &CancellationToken,
    top_n: usize,
    format: OutputFormat,
    connected: bool,
) -> Result<()> {
    let mut config = settings.duplicates.clone();
    config.max_groups = top_n;
    if connected {
        config.similar_grouping = SimilarGrouping::Connected;
    }

    eprintln!("Finding duplicates among {} records...", records.len());
    let report = DuplicateFinder::with_config(config)
        .with_cancel_token(cancel.clone())
        .find_duplicates(records);

    match format {
        OutputFormat::Text => print_duplicates(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn print_duplicates(report: &DuplicateReport) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" Duplicate File Report");
    println!("{}", "─".repeat(70));
    println!();

    if report.interrupted {
        println!(" (interrupted: results are partial)");
        println!();
    }

    if !report.has_duplicates() {
        println!(" No duplicate files found.");
        return;
    }

    println!(
        " {} exact and {} similar groups ({} files)",
        report.exact_group_count,
        report.similar_group_count,
        report.total_duplicate_files()
    );
    println!(" Total wasted space: {}", format_size(report.total_wasted_space));
    println!();

    for group in &report.groups {
        let kind = match group.kind {
            DuplicateKind::Exact => "identical".to_string(),
            DuplicateKind::Similar => format!("{:.0}% similar names", group.similarity * 100.0),
        };
        println!(
            " {} ({} files, {}, {} wasted)",
            group.group_id,
            group.count(),
            kind,
            format_size(group.wasted_size)
        );
        println!("   keep {}", group.recommended_keep.path.display());
        for member in &group.recommended_delete {
            println!("   del  {}", member.path.display());
        }
        println!();
    }

    if !report.skipped.is_empty() {
        println!(" {} file(s) could not be read", report.skipped.len());
    }
}

/// Run cleanup classification.
fn run_cleanup(
    records: &RecordSet,
    settings: &Settings,
    cancel: &CancellationToken,
    format: OutputFormat,
    min_safety: SafetyLevel,
) -> Result<()> {
    eprintln!("Classifying {} records...", records.len());

    let duplicates = DuplicateFinder::with_config(settings.duplicates.clone())
        .with_cancel_token(cancel.clone())
        .find_duplicates(records);
    if duplicates.interrupted {
        warn!("duplicate pass interrupted; duplicate candidates are partial");
    }

    let classifier = CleanupClassifier::with_config(settings.cleanup.clone())
        .with_custom_rules(settings.custom_rules()?);
    let mut report = classifier.classify(records, &duplicates.groups);
    report.skipped.extend(duplicates.skipped);

    match format {
        OutputFormat::Text => print_cleanup(&report, min_safety),
        OutputFormat::Json => {
            report
                .candidates
                .retain(|c| c.safety_level.priority() <= min_safety.priority());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn print_cleanup(report: &CleanupReport, min_safety: SafetyLevel) {
    let summary = &report.summary;

    println!();
    println!("{}", "─".repeat(70));
    println!(" Cleanup Report");
    println!("{}", "─".repeat(70));
    println!();

    if !report.has_candidates() {
        println!(" Nothing to clean up.");
        return;
    }

    println!(
        " {} candidates, {} total, {} safe to reclaim",
        summary.total_count,
        format_size(summary.total_size),
        format_size(summary.reclaimable_safe_size)
    );
    println!();
    for category in CleanupCategory::all() {
        let stats = summary.category(category);
        if stats.count > 0 {
            println!(
                "   {:<24} {:>6} {:>12}",
                category.profile().label,
                stats.count,
                format_size(stats.total_size)
            );
        }
    }
    println!();

    for candidate in report.at_least(min_safety) {
        println!(
            " {:<13} {:.2} {:>10}  {}",
            candidate.safety_level.to_string(),
            candidate.confidence,
            format_size(candidate.size_bytes),
            candidate.path.display()
        );
        println!("   {}", candidate.reason);
    }

    if !report.skipped.is_empty() {
        println!();
        println!(" {} record(s) skipped", report.skipped.len());
    }
}

/// Human-readable age relative to now.
fn age_of(modified: SystemTime) -> String {
    format_age(SystemTime::now().duration_since(modified).unwrap_or_default())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_source_requires_path_or_input() {
        assert!(Cli::try_parse_from(["dustpan", "duplicates"]).is_err());
        assert!(Cli::try_parse_from(["dustpan", "cleanup", "/tmp", "--input", "x.json"]).is_err());

        let cli = Cli::try_parse_from(["dustpan", "-vv", "cleanup", "--input", "x.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Cleanup { source, min_safety, .. } => {
                assert_eq!(source.input, Some(PathBuf::from("x.json")));
                assert!(matches!(min_safety, SafetyArg::UserDecision));
            }
            _ => panic!("expected cleanup"),
        }
    }

    #[test]
    fn test_min_safety_values() {
        let cli =
            Cli::try_parse_from(["dustpan", "cleanup", ".", "--min-safety", "likely-safe"]).unwrap();
        let Command::Cleanup { min_safety, .. } = cli.command else {
            panic!("expected cleanup");
        };
        assert_eq!(SafetyLevel::from(min_safety), SafetyLevel::LikelySafe);
    }

    #[test]
    fn test_saved_records_round_trip_through_input() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.tmp"), "x").unwrap();

        let settings = Settings::default();
        let records = scan(temp.path(), &settings).unwrap();
        let saved = temp.path().join("records.json");
        std::fs::write(&saved, serde_json::to_string(&records).unwrap()).unwrap();

        let source = Source {
            path: None,
            input: Some(saved),
        };
        let loaded = load_records(&source, &settings).unwrap();
        assert_eq!(loaded.len(), records.len());
        assert_eq!(loaded.records, records.records);
    }

    #[test]
    fn test_negative_size_in_input_is_skipped_not_fatal() {
        let temp = tempfile::TempDir::new().unwrap();
        let saved = temp.path().join("records.json");
        std::fs::write(
            &saved,
            r#"{"records": [
                {"path": "/data/keep.txt", "size_bytes": 12},
                {"path": "/data/broken.txt", "size_bytes": -4}
            ]}"#,
        )
        .unwrap();

        let source = Source {
            path: None,
            input: Some(saved),
        };
        let loaded = load_records(&source, &Settings::default()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records[0].path, PathBuf::from("/data/keep.txt"));
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].path, PathBuf::from("/data/broken.txt"));
        assert_eq!(loaded.skipped[0].reason, dustpan_core::SkipReason::InvalidInput);
    }
}
