//! # CLI Module
//!
//! Command-line interface for snaptidy.
//!
//! ## Usage
//! ```bash
//! # Pull every file under ~/Photos up into ~/Photos
//! snaptidy flatten --path ~/Photos
//!
//! # Copy instead, into ~/Photos/flattened
//! snaptidy flatten --path ~/Photos --copy
//!
//! # Remove duplicates, keeping an undo log
//! snaptidy dedup --path ~/Photos --logging --sensitivity 0.95
//!
//! # Sort into 2021/02 style folders, preview only
//! snaptidy organize --path ~/Photos --date-format yearmonth --dry-run
//!
//! # Undo a logged run
//! snaptidy recover --log-file ~/Photos/snaptidy_dedup_log.csv
//! ```

mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use snaptidy::core::comparator::Sensitivity;
use snaptidy::core::context::CancellationToken;
use snaptidy::core::pipeline::{Pipeline, Recovery, RunReport};
use snaptidy::core::planner::{DateLayout, PlanMode, Transfer};
use snaptidy::error::Result;
use snaptidy::events::{
    Event, EventChannel, EventReceiver, ExecuteEvent, FingerprintEvent, PipelineEvent, ScanEvent,
};
use std::path::PathBuf;
use std::thread;

/// snaptidy - flatten, deduplicate and organize photo folders, with undo
#[derive(Parser, Debug)]
#[command(name = "snaptidy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "pretty")]
    output_format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move (or copy) every file into a single directory
    Flatten {
        #[command(flatten)]
        common: CommonArgs,

        /// Copy files instead of moving them
        #[arg(long)]
        copy: bool,

        /// Target directory (default: the root, or <path>/flattened with --copy)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Remove duplicate and near-duplicate files, keeping the best copy
    Dedup {
        #[command(flatten)]
        common: CommonArgs,

        /// Similarity threshold, 0.0 - 1.0 (lower groups more aggressively)
        #[arg(short, long, default_value_t = Sensitivity::DEFAULT)]
        sensitivity: f64,

        /// Move duplicates here instead of deleting them
        #[arg(long)]
        duplicates_folder: Option<PathBuf>,
    },
    /// Sort files into folders by capture date
    Organize {
        #[command(flatten)]
        common: CommonArgs,

        /// Folder naming
        #[arg(long, default_value = "year")]
        date_format: DateFormat,

        /// Where files without a capture date go (default: left in place)
        #[arg(long)]
        unclassified_folder: Option<PathBuf>,
    },
    /// Undo a logged run
    Recover {
        /// Transaction log to replay backwards
        #[arg(long, required = true)]
        log_file: PathBuf,

        /// Show what would be undone without changing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory to work on
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Show what would happen without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Keep a transaction log so the run can be undone (never deletes)
    #[arg(long)]
    logging: bool,

    /// Transaction log location (default: <path>/snaptidy_<mode>_log.csv)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Hashing threads (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateFormat {
    /// 2021/
    Year,
    /// 202102/
    Yearmonth,
}

impl From<DateFormat> for DateLayout {
    fn from(format: DateFormat) -> Self {
        match format {
            DateFormat::Year => DateLayout::Year,
            DateFormat::Yearmonth => DateLayout::YearMonth,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    snaptidy::init_tracing(cli.verbose);

    let (mode, common, sensitivity) = match cli.command {
        Commands::Flatten {
            common,
            copy,
            output,
        } => {
            let transfer = if copy { Transfer::Copy } else { Transfer::Move };
            (PlanMode::Flatten { transfer, output }, common, Sensitivity::DEFAULT)
        }
        Commands::Dedup {
            common,
            sensitivity,
            duplicates_folder,
        } => (PlanMode::Dedup { duplicates_folder }, common, sensitivity),
        Commands::Organize {
            common,
            date_format,
            unclassified_folder,
        } => (
            PlanMode::Organize {
                layout: date_format.into(),
                unclassified_folder,
            },
            common,
            Sensitivity::DEFAULT,
        ),
        Commands::Recover { log_file, dry_run } => {
            return run_recover(log_file, dry_run, cli.output_format, cli.verbose)
        }
    };

    run_pipeline(mode, common, sensitivity, cli.output_format, cli.verbose)
}

fn run_pipeline(
    mode: PlanMode,
    common: CommonArgs,
    sensitivity: f64,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output);

    let mut builder = Pipeline::builder(common.path, mode)
        .sensitivity(sensitivity)
        .dry_run(common.dry_run)
        .logging(common.logging)
        .include_hidden(common.include_hidden);
    if let Some(threads) = common.threads {
        builder = builder.threads(threads);
    }
    if let Some(log_file) = common.log_file {
        builder = builder.log_path(log_file);
    }
    let pipeline = builder.build()?;

    let report = with_progress(output, verbose, |sender, cancel| {
        pipeline.run_with_events(sender, cancel)
    })?;

    output::print_report(&term, &report, output, verbose);
    Ok(())
}

fn run_recover(log_file: PathBuf, dry_run: bool, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output);

    let recovery = Recovery::new(log_file).dry_run(dry_run);
    let report = with_progress(output, verbose, |sender, cancel| {
        recovery.run_with_events(sender, cancel)
    })?;

    output::print_report(&term, &report, output, verbose);
    Ok(())
}

fn print_header(term: &Term, output: OutputFormat) {
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("snaptidy").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

/// Run `work` while a separate thread renders its events
fn with_progress<F>(output: OutputFormat, verbose: bool, work: F) -> Result<RunReport>
where
    F: FnOnce(&snaptidy::events::EventSender, &CancellationToken) -> Result<RunReport>,
{
    let (sender, receiver) = EventChannel::new();
    let progress = matches!(output, OutputFormat::Pretty).then(|| ProgressBar::new(0));

    let progress_clone = progress.clone();
    // Handle events in a separate thread
    let event_thread = thread::spawn(move || render_events(receiver, progress_clone, verbose));

    let result = work(&sender, &CancellationToken::new());

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    result
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn render_events(receiver: EventReceiver, progress: Option<ProgressBar>, verbose: bool) {
    for event in receiver.iter() {
        let Some(pb) = progress.as_ref() else {
            continue;
        };
        match event {
            Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                pb.set_message(format!("{}", phase));
            }
            Event::Scan(ScanEvent::Started { .. }) => {
                pb.set_style(spinner_style());
                pb.set_message("Scanning");
            }
            Event::Scan(ScanEvent::Progress(p)) => {
                pb.tick();
                pb.set_message(format!(
                    "Scanning: {} files in {} folders",
                    p.files_found, p.directories_scanned
                ));
            }
            Event::Scan(ScanEvent::Warning { path, message }) if verbose => {
                pb.println(format!("{} {}: {}", style("!").yellow(), path.display(), message));
            }
            Event::Fingerprint(FingerprintEvent::Started { total_files }) => {
                pb.set_style(bar_style());
                pb.set_length(total_files as u64);
                pb.set_position(0);
            }
            Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                pb.set_position(p.completed as u64);
                if verbose {
                    pb.set_message(
                        p.current_path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                            .to_string(),
                    );
                }
            }
            Event::Fingerprint(FingerprintEvent::Failed { completed, .. }) => {
                pb.set_position(completed as u64);
            }
            Event::Execute(ExecuteEvent::Started {
                total_operations,
                dry_run,
            }) => {
                pb.set_style(bar_style());
                pb.set_length(total_operations as u64);
                pb.set_position(0);
                pb.set_message(if dry_run { "Previewing" } else { "Applying" });
            }
            Event::Execute(ExecuteEvent::OperationFinished { .. })
            | Event::Execute(ExecuteEvent::WouldApply { .. }) => pb.inc(1),
            Event::Pipeline(PipelineEvent::Completed { .. })
            | Event::Pipeline(PipelineEvent::Error { .. }) => pb.finish_and_clear(),
            _ => {}
        }
    }
}
