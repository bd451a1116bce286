// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subpace::app_config::{self, Config};
use subpace::app_controller::{Controller, TranslationInput};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every command that reads configuration
#[derive(Args, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Margin in milliseconds moved inward from both ends of every cue
    #[arg(long)]
    buffer_ms: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge translated cues that are read too fast or too slow
    Combine(CombineArgs),

    /// Print the speaking rate of every cue of a file or directory
    Rates(RatesArgs),

    /// Generate shell completions for subpace
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct CombineArgs {
    /// Source language SRT file
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Translated track as LANG=FILE, repeatable
    #[arg(short, long = "translation", value_name = "LANG=FILE", value_parser = parse_translation, required = true)]
    translations: Vec<TranslationInput>,

    /// Directory for the combined files (defaults to the source directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum characters of a merged cue
    #[arg(long)]
    max_chars: Option<usize>,

    /// Target characters per second
    #[arg(long)]
    target_rate: Option<f64>,

    /// Write the translated tracks without merging
    #[arg(long)]
    no_combine: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct RatesArgs {
    /// SRT file or directory to inspect
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Target characters per second
    #[arg(long)]
    target_rate: Option<f64>,

    #[command(flatten)]
    common: CommonArgs,
}

/// subpace - subtitle pacing for translated tracks
///
/// Re-segments translated SRT subtitles so that every cue is read at a
/// comfortable number of characters per second.
#[derive(Parser, Debug)]
#[command(name = "subpace")]
#[command(version)]
#[command(about = "Speaking-rate aware subtitle re-segmentation")]
#[command(long_about = "subpace merges adjacent translated subtitle cues whose text is read too fast or too slow.

EXAMPLES:
    subpace combine movie.srt -t fr=movie.fr.srt            # Combine one translated track
    subpace combine movie.srt -t fr=a.srt -t de=b.srt -f    # Several tracks, overwrite outputs
    subpace combine movie.srt -t es=es.srt --max-chars 120  # Shorter merged cues
    subpace rates movie.srt                                 # Rate report of one file
    subpace rates /subtitles/ --buffer-ms 100               # Rate report of a whole directory
    subpace completions bash > subpace.bash                 # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

/// Parse a `LANG=FILE` pair
fn parse_translation(value: &str) -> Result<TranslationInput, String> {
    let (language, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected LANG=FILE, got '{}'", value))?;
    if language.trim().is_empty() || path.trim().is_empty() {
        return Err(format!("expected LANG=FILE, got '{}'", value));
    }
    Ok(TranslationInput {
        language: language.trim().to_string(),
        path: PathBuf::from(path.trim()),
    })
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and label for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, label) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, label, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through max_level
    // once the configuration is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subpace", &mut std::io::stdout());
            Ok(())
        }
        Commands::Combine(args) => run_combine(args).await,
        Commands::Rates(args) => run_rates(args),
    }
}

/// Load the configuration and apply the options shared by all commands
fn load_config(common: &CommonArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &common.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(buffer_ms) = common.buffer_ms {
        config.parse.buffer_ms = buffer_ms;
    }
    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    }

    // If log level was not set via command line, update it from config now
    if common.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

async fn run_combine(args: CombineArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;

    if let Some(max_chars) = args.max_chars {
        config.combine.max_chars = max_chars;
    }
    if let Some(target_rate) = args.target_rate {
        config.combine.target_rate = target_rate;
    }
    if args.no_combine {
        config.combine.enabled = false;
    }

    let controller = Controller::with_config(config)?;

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => args.source.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };

    let summaries = controller
        .run(&args.source, &args.translations, &output_dir, args.force_overwrite)
        .await?;

    let mut failed = Vec::new();
    for summary in &summaries {
        match (&summary.output_path, &summary.error) {
            (Some(path), None) => info!(
                "Success [{}]: {:?} ({} -> {} cues)",
                summary.language, path, summary.input_count, summary.output_count
            ),
            (_, Some(message)) => {
                error!("Failed [{}]: {}", summary.language, message);
                failed.push(summary.language.clone());
            }
            (None, None) => warn!("Skipped [{}]: output already exists", summary.language),
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!("{} of {} track(s) failed: {}", failed.len(), summaries.len(), failed.join(", ")));
    }
    Ok(())
}

fn run_rates(args: RatesArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(target_rate) = args.target_rate {
        config.combine.target_rate = target_rate;
    }
    let controller = Controller::with_config(config)?;

    let reports = if args.input_path.is_file() {
        vec![(args.input_path.clone(), controller.rate_report(&args.input_path))]
    } else if args.input_path.is_dir() {
        controller.rate_report_folder(&args.input_path)?
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    };

    let mut stdout = std::io::stdout().lock();
    for (path, report) in reports {
        match report {
            Ok(summary) => {
                writeln!(stdout, "# {}", path.display())?;
                for line in summary.lines {
                    writeln!(stdout, "{}", line)?;
                }
                if let Some(average) = summary.average {
                    writeln!(stdout, "# average {:.2} cps", average)?;
                }
            }
            Err(e) => warn!("Skipping {:?}: {:#}", path, e),
        }
    }
    Ok(())
}
