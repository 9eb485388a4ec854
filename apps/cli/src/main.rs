//! Viva CLI - score recorded speaking tasks with a generative AI model.
//!
//! The `viva` command walks a folder of MP3 recordings, runs the enabled
//! scoring passes against each file, and writes a CSV score report.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use viva_scoring::AgentSelection;

/// Viva - AI-assisted speaking performance scoring
#[derive(Parser, Debug)]
#[command(
    name = "viva",
    author,
    version,
    about = "Score recorded speaking tasks with a generative AI model"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Configuration file (default: ./viva.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score every MP3 recording in a folder
    ///
    /// File names must follow `<student>-<session>-t<task>.mp3` and each
    /// session/task pair must have a task definition in the configuration.
    Score {
        /// Folder containing the recordings
        folder: PathBuf,

        /// Skip the analytic (per-domain) scoring pass
        #[arg(long)]
        skip_analytic: bool,

        /// Skip the holistic scoring pass
        #[arg(long)]
        skip_holistic: bool,

        /// Skip the off-topic detection pass
        #[arg(long)]
        skip_off_topic: bool,

        /// Skip the adjusted-score derivation
        #[arg(long)]
        no_adjustment: bool,

        /// Do not write the CSV score report
        #[arg(long)]
        no_report: bool,

        /// Where to write the report (default: the scanned folder)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// List the configured sessions and task definitions
    Tasks,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        _ => Level::ERROR,
    };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = config::load(args.config.as_deref())?;

    match args.command {
        Command::Score {
            folder,
            skip_analytic,
            skip_holistic,
            skip_off_topic,
            no_adjustment,
            no_report,
            output_dir,
        } => {
            let options = commands::score::ScoreOptions {
                folder,
                selection: AgentSelection {
                    analytic: !skip_analytic,
                    holistic: !skip_holistic,
                    off_topic: !skip_off_topic,
                    score_adjustment: !no_adjustment,
                },
                no_report,
                output_dir,
            };
            commands::score::execute(config, options).await
        }
        Command::Tasks => commands::tasks::execute(&config),
    }
}
