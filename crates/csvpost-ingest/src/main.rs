//! CSV Post Ingest - scheduled post import tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use csvpost_common::config::{ImportConfig, SiteTimeZone};
use csvpost_common::logging::{init_logging, FileSink, LogConfig, LogLevel};
use csvpost_ingest::{MemoryStore, PostImporter};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "csvpost-ingest")]
#[command(author, version, about = "Import scheduled blog posts from CSV")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import posts from a CSV file, stdin or literal text
    Import {
        /// CSV file to import, or "-" to read stdin
        #[arg(required_unless_present = "text", conflicts_with = "text")]
        file: Option<PathBuf>,

        /// CSV text to import instead of a file
        #[arg(long)]
        text: Option<String>,

        /// Site time zone (IANA name or offset such as +09:00)
        #[arg(long)]
        timezone: Option<String>,

        /// Author id stamped on created posts
        #[arg(long)]
        author: Option<u64>,

        /// Enable the import log
        #[arg(long)]
        debug: bool,

        /// Import log level (error, warning, info, debug)
        #[arg(long)]
        log_level: Option<LogLevel>,

        /// Write created posts as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or clear the import log
    Log {
        #[command(subcommand)]
        action: LogAction,

        /// Import log file (defaults to CSVPOST_LOG_FILE)
        #[arg(long, global = true)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum LogAction {
    /// Print the import log
    Show,
    /// Truncate the import log
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env().unwrap_or_default();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    let _guard = init_logging(&log_config)?;

    let mut config = ImportConfig::from_env()?;

    match cli.command {
        Command::Import {
            file,
            text,
            timezone,
            author,
            debug,
            log_level,
            output,
        } => {
            if let Some(tz) = timezone {
                config.time_zone = tz.parse::<SiteTimeZone>()?;
            }
            if author.is_some() {
                config.author_id = author;
            }
            if debug {
                config.log.enabled = true;
            }
            if let Some(level) = log_level {
                config.log.level = level;
            }
            import(config, file, text, output)
        },
        Command::Log { action, file } => {
            let Some(path) = file.or(config.log.file) else {
                bail!("No import log file configured; set CSVPOST_LOG_FILE or pass --file");
            };
            let sink = FileSink::new(path);
            match action {
                LogAction::Show => {
                    let contents = sink
                        .read()
                        .with_context(|| format!("reading {}", sink.path().display()))?;
                    if contents.is_empty() {
                        println!("Log is empty.");
                    } else {
                        print!("{}", contents);
                    }
                },
                LogAction::Clear => {
                    sink.clear()
                        .with_context(|| format!("clearing {}", sink.path().display()))?;
                    info!("Cleared import log {}", sink.path().display());
                },
            }
            Ok(())
        },
    }
}

fn import(
    config: ImportConfig,
    file: Option<PathBuf>,
    text: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    info!("Importing posts (time zone {})", config.time_zone);
    let importer = PostImporter::new(config, MemoryStore::new()?)?;

    let report = match (text, file) {
        (Some(text), _) => importer.import_text(&text)?,
        (None, Some(path)) if path.as_os_str() == "-" => {
            importer.import_reader(std::io::stdin().lock())?
        },
        (None, Some(path)) => importer.import_file(&path)?,
        (None, None) => bail!("Provide a CSV file, '-' for stdin, or --text"),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = output {
        let posts = importer.store().posts();
        std::fs::write(&path, serde_json::to_string_pretty(&posts)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {} posts to {}", posts.len(), path.display());
    }

    if report.failed > 0 {
        warn!("{} of {} rows failed", report.failed, report.rows.len());
    }
    info!("{}", report.summary_message());
    Ok(())
}
