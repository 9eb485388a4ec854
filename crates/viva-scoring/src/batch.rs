//! Sequential batch runner.
//!
//! One worker walks the folder in file-name order, runs the enabled agents
//! for each file, and pushes progress events to subscribers. Cancellation
//! is cooperative and takes effect at file boundaries only: an in-flight
//! agent call always completes first.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::adjustment;
use crate::agents::ScoringAgent;
use crate::error::{Result, ScoringError};
use crate::error_log;
use crate::performance::SpeakingPerformance;
use crate::progress::ProgressReporter;

/// Cooperative cancellation handle shared between the batch worker and the
/// host. Checked once per file boundary, never mid-agent-call.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The batch stops at the next file boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which scoring passes a batch run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSelection {
    /// Run the analytic (per-domain) scoring pass.
    pub analytic: bool,
    /// Run the holistic scoring pass.
    pub holistic: bool,
    /// Run the off-topic detection pass.
    pub off_topic: bool,
    /// Derive adjusted scores after the loop.
    pub score_adjustment: bool,
}

impl Default for AgentSelection {
    fn default() -> Self {
        Self { analytic: true, holistic: true, off_topic: true, score_adjustment: true }
    }
}

/// Result of one batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Fully scored performances, in processing order.
    pub performances: Vec<SpeakingPerformance>,
    /// File names where at least one enabled agent failed.
    pub failed_files: Vec<String>,
    /// Human-readable error strings collected during the run.
    pub errors: Vec<String>,
    /// Where the error log was written, when any errors were collected.
    pub error_log: Option<PathBuf>,
    /// Whether the run was cancelled before the folder was exhausted.
    pub cancelled: bool,
    /// Total duration of the run.
    pub total_duration: Duration,
    /// Success rate as a percentage (0.0 to 100.0).
    pub success_rate: f64,
}

impl BatchOutcome {
    /// Create a new batch outcome.
    pub fn new(
        performances: Vec<SpeakingPerformance>,
        failed_files: Vec<String>,
        errors: Vec<String>,
        error_log: Option<PathBuf>,
        cancelled: bool,
        total_duration: Duration,
    ) -> Self {
        let total = performances.len() + failed_files.len();
        let success_rate = if total > 0 {
            (performances.len() as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self { performances, failed_files, errors, error_log, cancelled, total_duration, success_rate }
    }

    /// Total number of files processed (successful plus failed).
    pub fn total_files(&self) -> usize {
        self.performances.len() + self.failed_files.len()
    }

    /// Check if every processed file scored successfully.
    pub fn is_complete_success(&self) -> bool {
        self.failed_files.is_empty()
    }
}

/// Sequential batch runner over a folder of MP3 recordings.
///
/// Agents are attached once and reused for every file in the run. A failed
/// agent marks its file failed but never stops sibling agents or the batch.
pub struct BatchRunner {
    /// Analytic scoring agent, when attached.
    analytic: Option<Arc<dyn ScoringAgent>>,
    /// Holistic scoring agent, when attached.
    holistic: Option<Arc<dyn ScoringAgent>>,
    /// Off-topic detection agent, when attached.
    off_topic: Option<Arc<dyn ScoringAgent>>,
    /// Which passes this run executes.
    selection: AgentSelection,
    /// Push channel for progress events.
    reporter: ProgressReporter,
    /// Cooperative cancellation handle.
    cancel_flag: CancellationFlag,
}

impl BatchRunner {
    /// Creates a runner with no agents attached.
    #[must_use]
    pub fn new(selection: AgentSelection) -> Self {
        Self {
            analytic: None,
            holistic: None,
            off_topic: None,
            selection,
            reporter: ProgressReporter::new(),
            cancel_flag: CancellationFlag::new(),
        }
    }

    /// Attaches the analytic scoring agent.
    #[must_use]
    pub fn with_analytic(mut self, agent: Arc<dyn ScoringAgent>) -> Self {
        self.analytic = Some(agent);
        self
    }

    /// Attaches the holistic scoring agent.
    #[must_use]
    pub fn with_holistic(mut self, agent: Arc<dyn ScoringAgent>) -> Self {
        self.holistic = Some(agent);
        self
    }

    /// Attaches the off-topic detection agent.
    #[must_use]
    pub fn with_off_topic(mut self, agent: Arc<dyn ScoringAgent>) -> Self {
        self.off_topic = Some(agent);
        self
    }

    /// The progress reporter. Subscribe before calling [`run`](Self::run).
    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// A cancellation handle usable from other tasks.
    #[must_use]
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel_flag.clone()
    }

    /// Processes every MP3 file in `folder`.
    ///
    /// # Errors
    /// Returns an error when the folder cannot be read, contains no MP3
    /// files, or the error log cannot be written.
    pub async fn run(&self, folder: &Path) -> Result<BatchOutcome> {
        let start_time = Instant::now();
        let mut errors: Vec<String> = Vec::new();

        let audio_files = list_audio_files(folder)?;
        if audio_files.is_empty() {
            let err = ScoringError::NoAudioFiles(folder.to_path_buf());
            errors.push(err.to_string());
            let log_path = error_log::write_error_log(folder, &errors)?;
            self.reporter.emit_error_summary(errors.len(), log_path);
            return Err(err);
        }

        let total_files = audio_files.len();
        info!(total_files, folder = %folder.display(), "Starting scoring batch");

        let mut performances: Vec<SpeakingPerformance> = Vec::new();
        let mut failed_files: Vec<String> = Vec::new();
        let mut cancelled = false;

        for (i, file_name) in audio_files.iter().enumerate() {
            if self.cancel_flag.is_cancelled() {
                info!(processed = i, total_files, "Scoring cancelled");
                errors.push("Scoring process cancelled by user.".to_string());
                self.reporter.emit_cancelled();
                cancelled = true;
                break;
            }

            debug!(file = %file_name, index = i, "Processing file");
            let path = folder.join(file_name);
            let mut performance = SpeakingPerformance::new(file_name.clone());
            let mut scoring_failed = false;

            if self.selection.analytic {
                if let Some(agent) = &self.analytic {
                    Self::run_agent(
                        agent.as_ref(),
                        "Analytic scoring",
                        &path,
                        file_name,
                        &mut performance,
                        &mut errors,
                        &mut scoring_failed,
                    )
                    .await;
                }
            }

            if self.selection.holistic {
                if let Some(agent) = &self.holistic {
                    Self::run_agent(
                        agent.as_ref(),
                        "Holistic scoring",
                        &path,
                        file_name,
                        &mut performance,
                        &mut errors,
                        &mut scoring_failed,
                    )
                    .await;
                }
            }

            if self.selection.off_topic {
                if let Some(agent) = &self.off_topic {
                    Self::run_agent(
                        agent.as_ref(),
                        "Off-topic detection",
                        &path,
                        file_name,
                        &mut performance,
                        &mut errors,
                        &mut scoring_failed,
                    )
                    .await;
                }
            }

            if scoring_failed {
                failed_files.push(file_name.clone());
            } else {
                performances.push(performance);
            }

            let percent = ((i + 1) * 100 / total_files) as u8;
            self.reporter.emit_progress(percent, format!("Processing: {}", file_name));
        }

        // Adjustment covers whatever was collected, even after an early
        // cancellation.
        if self.selection.score_adjustment && !performances.is_empty() {
            self.reporter.emit_progress(100, "Adjusting scores...".to_string());
            adjustment::apply_adjusted_scores(&mut performances);
        }

        if performances.is_empty() && errors.is_empty() {
            errors.push("No performances were successfully processed.".to_string());
        }

        let error_log = if errors.is_empty() {
            None
        } else {
            let log_path = error_log::write_error_log(folder, &errors)?;
            info!(count = errors.len(), path = %log_path.display(), "Errors were logged");
            self.reporter.emit_error_summary(errors.len(), log_path.clone());
            Some(log_path)
        };

        info!(
            successful = performances.len(),
            failed = failed_files.len(),
            cancelled,
            "Scoring batch finished"
        );
        self.reporter.emit_finished(performances.len(), failed_files.len());

        Ok(BatchOutcome::new(
            performances,
            failed_files,
            errors,
            error_log,
            cancelled,
            start_time.elapsed(),
        ))
    }

    /// Runs one agent over one file, recording a failure without stopping
    /// the batch.
    async fn run_agent(
        agent: &dyn ScoringAgent,
        label: &str,
        path: &Path,
        file_name: &str,
        performance: &mut SpeakingPerformance,
        errors: &mut Vec<String>,
        scoring_failed: &mut bool,
    ) {
        match agent.score_performance(path).await {
            Ok(score) => score.apply_to(performance),
            Err(e) => {
                errors.push(format!("{} failed for {}: {}", label, file_name, e));
                *scoring_failed = true;
            }
        }
    }
}

/// Lists `.mp3` file names in `folder`, sorted by name.
///
/// The extension match is lowercase-only, mirroring the file-name contract
/// the agents enforce.
fn list_audio_files(folder: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".mp3") {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentScore;
    use crate::performance::{AnalyticScores, HolisticScore};
    use crate::progress::ProgressEvent;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Agent with a scripted outcome per file, used to drive the runner.
    struct ScriptedAgent {
        score: AgentScore,
        fail_on: Vec<&'static str>,
        cancel_after: Option<(usize, CancellationFlag)>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedAgent {
        fn succeeding(score: AgentScore) -> Self {
            Self { score, fail_on: vec![], cancel_after: None, seen: Mutex::new(vec![]) }
        }

        fn failing_on(score: AgentScore, fail_on: Vec<&'static str>) -> Self {
            Self { score, fail_on, cancel_after: None, seen: Mutex::new(vec![]) }
        }

        fn cancelling_after(score: AgentScore, after: usize, flag: CancellationFlag) -> Self {
            Self { score, fail_on: vec![], cancel_after: Some((after, flag)), seen: Mutex::new(vec![]) }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScoringAgent for ScriptedAgent {
        fn id(&self) -> &str {
            "scripted"
        }

        fn description(&self) -> &str {
            "Scripted agent for runner tests"
        }

        async fn score_performance(&self, path: &Path) -> Result<AgentScore> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let count = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(name.clone());
                seen.len()
            };

            if let Some((after, flag)) = &self.cancel_after {
                if count >= *after {
                    flag.cancel();
                }
            }

            if self.fail_on.contains(&name.as_str()) {
                return Err(ScoringError::UnparseableResponse {
                    raw: "garbled reply".to_string(),
                });
            }
            Ok(self.score.clone())
        }
    }

    fn analytic_score() -> AgentScore {
        AgentScore::Analytic(AnalyticScores {
            grammar: 3,
            vocabulary: 3,
            content: 3,
            fluency: 3,
            pronunciation: 3,
            overall: 3,
        })
    }

    fn holistic_score() -> AgentScore {
        AgentScore::Holistic(HolisticScore { overall_score: 70 })
    }

    fn write_files(dir: &tempfile::TempDir, names: &[&str]) {
        for name in names {
            std::fs::write(dir.path().join(name), b"ID3 fake audio").unwrap();
        }
    }

    fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    const FIVE_FILES: [&str; 5] = [
        "231101011-6-t1.mp3",
        "231101012-6-t1.mp3",
        "231101013-6-t1.mp3",
        "231101014-6-t1.mp3",
        "231101015-6-t1.mp3",
    ];

    #[tokio::test]
    async fn test_collects_successes_and_failures() {
        let dir = tempdir().unwrap();
        write_files(&dir, &FIVE_FILES);

        let analytic =
            Arc::new(ScriptedAgent::failing_on(analytic_score(), vec!["231101013-6-t1.mp3"]));
        let holistic =
            Arc::new(ScriptedAgent::failing_on(holistic_score(), vec!["231101013-6-t1.mp3"]));

        let runner = BatchRunner::new(AgentSelection {
            off_topic: false,
            ..AgentSelection::default()
        })
        .with_analytic(analytic.clone())
        .with_holistic(holistic.clone());
        let mut rx = runner.reporter().subscribe();

        let outcome = runner.run(dir.path()).await.unwrap();

        assert_eq!(outcome.performances.len(), 4);
        assert_eq!(outcome.failed_files, vec!["231101013-6-t1.mp3".to_string()]);
        assert_eq!(outcome.errors.len(), 2);
        assert!(
            outcome.errors[0].starts_with("Analytic scoring failed for 231101013-6-t1.mp3:")
        );
        assert!(
            outcome.errors[1].starts_with("Holistic scoring failed for 231101013-6-t1.mp3:")
        );
        assert!(!outcome.cancelled);
        assert!((outcome.success_rate - 80.0).abs() < f64::EPSILON);

        // Both agents saw all five files; the failure never stopped the run.
        assert_eq!(analytic.seen().len(), 5);
        assert_eq!(holistic.seen().len(), 5);

        // Successful records were adjusted: six domains of band 3.
        assert!(outcome.performances.iter().all(|p| p.adjusted_score == Some(18)));

        // The error log exists and holds both entries.
        let log_path = outcome.error_log.expect("error log should be written");
        let contents = std::fs::read_to_string(log_path).unwrap();
        assert!(contents.contains("Analytic scoring failed for 231101013-6-t1.mp3"));
        assert!(contents.contains("Holistic scoring failed for 231101013-6-t1.mp3"));

        let events = drain_events(&mut rx);
        assert!(matches!(events.last(), Some(ProgressEvent::Finished { successful: 4, failed: 1 })));
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { percent, message } if message.starts_with("Processing") => {
                    Some(*percent)
                }
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![20, 40, 60, 80, 100]);
    }

    #[tokio::test]
    async fn test_cancellation_stops_at_file_boundary() {
        let dir = tempdir().unwrap();
        write_files(&dir, &FIVE_FILES);

        let runner = BatchRunner::new(AgentSelection {
            holistic: false,
            off_topic: false,
            ..AgentSelection::default()
        });
        let flag = runner.cancellation_flag();
        let analytic = Arc::new(ScriptedAgent::cancelling_after(analytic_score(), 3, flag));
        let runner = runner.with_analytic(analytic.clone());
        let mut rx = runner.reporter().subscribe();

        let outcome = runner.run(dir.path()).await.unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.performances.len(), 3);
        assert_eq!(analytic.seen().len(), 3);
        assert!(outcome.errors.contains(&"Scoring process cancelled by user.".to_string()));

        // Adjustment still ran over the three collected successes.
        assert!(outcome.performances.iter().all(|p| p.adjusted_score == Some(18)));

        let events = drain_events(&mut rx);
        assert!(events.iter().any(|e| matches!(e, ProgressEvent::Cancelled)));
    }

    #[tokio::test]
    async fn test_empty_folder_is_a_terminal_error() {
        let dir = tempdir().unwrap();

        let runner = BatchRunner::new(AgentSelection::default());
        let mut rx = runner.reporter().subscribe();

        let err = runner.run(dir.path()).await.unwrap_err();
        assert!(matches!(err, ScoringError::NoAudioFiles(_)));

        // The error was persisted next to where the audio should have been.
        let log_entry = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().starts_with("error_log_"))
            .expect("error log should be written");
        let contents = std::fs::read_to_string(log_entry.path()).unwrap();
        assert!(contents.contains("No MP3 files found in the selected folder."));

        let events = drain_events(&mut rx);
        assert!(events.iter().any(|e| matches!(e, ProgressEvent::ErrorSummary { count: 1, .. })));
    }

    #[tokio::test]
    async fn test_files_are_processed_in_name_order() {
        let dir = tempdir().unwrap();
        // Created out of order, plus files the listing must skip.
        write_files(
            &dir,
            &["231101015-6-t1.mp3", "231101011-6-t1.mp3", "231101013-6-t1.mp3", "notes.txt", "SONG.MP3"],
        );

        let runner = BatchRunner::new(AgentSelection {
            holistic: false,
            off_topic: false,
            ..AgentSelection::default()
        });
        let analytic = Arc::new(ScriptedAgent::succeeding(analytic_score()));
        let runner = runner.with_analytic(analytic.clone());

        let outcome = runner.run(dir.path()).await.unwrap();

        assert_eq!(outcome.total_files(), 3);
        assert_eq!(
            analytic.seen(),
            vec![
                "231101011-6-t1.mp3".to_string(),
                "231101013-6-t1.mp3".to_string(),
                "231101015-6-t1.mp3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_all_failures_reports_every_error() {
        let dir = tempdir().unwrap();
        write_files(&dir, &["231101011-6-t1.mp3", "231101012-6-t1.mp3"]);

        let analytic = Arc::new(ScriptedAgent::failing_on(
            analytic_score(),
            vec!["231101011-6-t1.mp3", "231101012-6-t1.mp3"],
        ));
        let runner = BatchRunner::new(AgentSelection {
            holistic: false,
            off_topic: false,
            ..AgentSelection::default()
        })
        .with_analytic(analytic);
        let mut rx = runner.reporter().subscribe();

        let outcome = runner.run(dir.path()).await.unwrap();

        assert!(outcome.performances.is_empty());
        assert_eq!(outcome.failed_files.len(), 2);
        assert_eq!(outcome.errors.len(), 2);
        assert!(!outcome.is_complete_success());
        assert!(outcome.success_rate.abs() < f64::EPSILON);

        let events = drain_events(&mut rx);
        assert!(matches!(events.last(), Some(ProgressEvent::Finished { successful: 0, failed: 2 })));
    }

    #[tokio::test]
    async fn test_disabled_agents_are_never_invoked() {
        let dir = tempdir().unwrap();
        write_files(&dir, &["231101011-6-t1.mp3"]);

        let analytic = Arc::new(ScriptedAgent::succeeding(analytic_score()));
        let holistic = Arc::new(ScriptedAgent::succeeding(holistic_score()));
        let runner = BatchRunner::new(AgentSelection {
            holistic: false,
            off_topic: false,
            score_adjustment: false,
            ..AgentSelection::default()
        })
        .with_analytic(analytic.clone())
        .with_holistic(holistic.clone());

        let outcome = runner.run(dir.path()).await.unwrap();

        assert_eq!(analytic.seen().len(), 1);
        assert!(holistic.seen().is_empty());

        let performance = &outcome.performances[0];
        assert!(performance.analytic_scores.is_some());
        assert!(performance.holistic_score.is_none());
        // Adjustment was disabled.
        assert!(performance.adjusted_score.is_none());
    }
}
