//! Score command: run a scoring batch over a folder of recordings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use colored::Colorize;
use tokio::sync::broadcast;

use viva_abstraction::Model;
use viva_models::{ModelConfig, ModelFactory, ModelType, RetryPolicy, RetryingModel};
use viva_report::CsvExporter;
use viva_scoring::{
    AgentSelection, AnalyticScoringAgent, BatchOutcome, BatchRunner, HolisticScoringAgent,
    OffTopicDetectionAgent, ProgressEvent, SpeakingPerformance,
};

use crate::config::{AgentKind, VivaConfig};

/// Parsed `viva score` arguments.
pub struct ScoreOptions {
    /// Folder containing the recordings.
    pub folder: PathBuf,
    /// Which scoring passes to run.
    pub selection: AgentSelection,
    /// Skip writing the CSV report.
    pub no_report: bool,
    /// Report destination; defaults to the scanned folder.
    pub output_dir: Option<PathBuf>,
}

/// Execute the score command.
pub async fn execute(config: VivaConfig, options: ScoreOptions) -> anyhow::Result<()> {
    println!("{}", "viva score".bold().cyan());
    println!();

    let selection = options.selection;
    if !(selection.analytic || selection.holistic || selection.off_topic) {
        bail!("All scoring passes are skipped; nothing to do");
    }
    if !options.folder.is_dir() {
        bail!("Not a folder: {}", options.folder.display());
    }

    let tasks = Arc::new(config.task_definitions.clone());
    if tasks.is_empty() {
        bail!(
            "No task definitions configured; add [task_definitions.<session>] entries to the config"
        );
    }
    println!("  {} Model: {}", "✓".green(), config.model.model_id.cyan());
    println!(
        "  {} Task definitions for {} session(s)",
        "✓".green(),
        tasks.iter().count()
    );

    let mut runner = BatchRunner::new(selection);
    if selection.analytic {
        let model = build_model(&config, AgentKind::Analytic)?;
        runner = runner.with_analytic(Arc::new(AnalyticScoringAgent::new(model, tasks.clone())));
    }
    if selection.holistic {
        let model = build_model(&config, AgentKind::Holistic)?;
        runner = runner.with_holistic(Arc::new(HolisticScoringAgent::new(model, tasks.clone())));
    }
    if selection.off_topic {
        let model = build_model(&config, AgentKind::OffTopic)?;
        runner = runner.with_off_topic(Arc::new(OffTopicDetectionAgent::new(model, tasks.clone())));
    }

    let mut events = runner.reporter().subscribe();
    let cancel_flag = runner.cancellation_flag();

    // Ctrl-C requests a stop; the batch finishes the current file first.
    tokio::spawn({
        let flag = cancel_flag.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n  {} Cancelling after the current file...", "⚠".yellow());
                flag.cancel();
            }
        }
    });

    println!("  {}", format!("Scanning {}...", options.folder.display()).dimmed());
    println!();

    // The batch runs on its own task; this one only renders progress.
    let folder = options.folder.clone();
    let worker = tokio::spawn(async move { runner.run(&folder).await });

    loop {
        match events.recv().await {
            Ok(event) => render_event(&event),
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    let outcome =
        worker.await.context("Scoring worker panicked")?.context("Scoring failed")?;

    print_summary(&outcome);

    if !options.no_report && !outcome.performances.is_empty() {
        let output_dir = options.output_dir.unwrap_or(options.folder);
        let path = CsvExporter
            .export_to_file(&outcome.performances, &outcome.failed_files, &output_dir)
            .context("Failed to write the score report")?;
        println!("  {} Report written to {}", "✓".green(), path.display());
    }

    if outcome.performances.is_empty() {
        bail!("No recordings were successfully scored");
    }
    Ok(())
}

/// Builds the model client for one agent kind: provider from config, the
/// kind's resolved credential, wrapped in the rate-limit retry decorator.
fn build_model(config: &VivaConfig, kind: AgentKind) -> anyhow::Result<Arc<dyn Model>> {
    let provider = &config.model.provider;
    let model_type: ModelType = provider
        .parse()
        .map_err(|()| anyhow::anyhow!("Unrecognized model provider: {provider}"))?;

    let mut model_config = ModelConfig::new(model_type.clone(), config.model.model_id.clone());
    if let Some(key) = config.credential_for(kind) {
        model_config = model_config.with_api_key(key);
    } else if model_type == ModelType::Gemini {
        bail!(
            "No API key configured for the {kind} agent; set [credentials].{kind} or GEMINI_API_KEY"
        );
    }

    let inner = ModelFactory::create(model_config)
        .with_context(|| format!("Failed to build the {kind} model client"))?;
    Ok(Arc::new(RetryingModel::new(inner, RetryPolicy::default())))
}

fn render_event(event: &ProgressEvent) {
    match event {
        ProgressEvent::Progress { percent, message } => {
            println!("  {} {}", format!("[{percent:>3}%]").dimmed(), message);
        }
        ProgressEvent::Cancelled => {
            println!("  {} Scoring cancelled; keeping completed results", "⚠".yellow());
        }
        ProgressEvent::ErrorSummary { count, log_path } => {
            println!(
                "  {} {} error(s) logged to {}",
                "⚠".yellow(),
                count,
                log_path.display()
            );
        }
        ProgressEvent::Finished { successful, failed } => {
            println!();
            println!("  {} Scored {} file(s), {} failed", "✓".green(), successful, failed);
        }
    }
}

fn print_summary(outcome: &BatchOutcome) {
    println!();
    println!("{}", "Summary".bold().cyan());

    for perf in &outcome.performances {
        println!("  {} {}", "✓".green(), score_line(perf));
    }
    for file_name in &outcome.failed_files {
        println!("  {} {}", "⚠".yellow(), file_name.yellow());
    }
    if let Some(log_path) = &outcome.error_log {
        println!(
            "  {}",
            format!("{} error(s); details in {}", outcome.errors.len(), log_path.display())
                .dimmed()
        );
    }
    println!(
        "  {}",
        format!(
            "{} of {} file(s) succeeded ({:.0}%) in {:.1}s",
            outcome.performances.len(),
            outcome.total_files(),
            outcome.success_rate,
            outcome.total_duration.as_secs_f64()
        )
        .dimmed()
    );
}

/// One-line rendering of a scored performance.
fn score_line(perf: &SpeakingPerformance) -> String {
    let mut parts = vec![perf.file_name.clone()];
    if let Some(adjusted) = perf.adjusted_score {
        parts.push(format!("analytic {adjusted}"));
    } else if let Some(analytic) = &perf.analytic_scores {
        parts.push(format!("analytic {}", analytic.total()));
    }
    if let Some(holistic) = &perf.holistic_score {
        parts.push(format!("holistic {}", holistic.overall_score));
    }
    if let Some(off_topic) = &perf.off_topic_analysis {
        parts.push(if off_topic.is_off_topic {
            format!("off-topic ({:.2})", off_topic.confidence)
        } else {
            "on-topic".to_string()
        });
    }
    parts.join("  ")
}
