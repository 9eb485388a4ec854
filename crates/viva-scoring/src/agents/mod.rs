//! Scoring agents.
//!
//! Each agent runs one scoring pass over a single audio file: resolve the
//! task definition from the file name, send the rubric prompt together with
//! the audio to the model, and parse the reply into a score record. The
//! three passes are independent; the batch runner decides which of them run
//! for a given file.

pub mod analytic;
pub mod holistic;
pub mod off_topic;

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use viva_abstraction::{AudioData, Model};

use crate::error::{Result, ScoringError};
use crate::filename::parse_file_name;
use crate::performance::{AnalyticScores, HolisticScore, OffTopicAnalysis, SpeakingPerformance};
use crate::tasks::TaskDefinitionStore;

pub use analytic::AnalyticScoringAgent;
pub use holistic::HolisticScoringAgent;
pub use off_topic::OffTopicDetectionAgent;

/// Placeholder in each rubric prompt that is replaced with the task text.
pub(crate) const TASK_DEFINITION_PLACEHOLDER: &str = "{task_definition}";

/// A single scoring result, tagged by the agent kind that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentScore {
    /// Per-domain rubric bands.
    Analytic(AnalyticScores),
    /// Single overall score.
    Holistic(HolisticScore),
    /// Topic-relevance verdict.
    OffTopic(OffTopicAnalysis),
}

impl AgentScore {
    /// Stores the result in its slot on the performance record. Sibling
    /// slots are left untouched.
    pub fn apply_to(self, performance: &mut SpeakingPerformance) {
        match self {
            Self::Analytic(scores) => performance.analytic_scores = Some(scores),
            Self::Holistic(score) => performance.holistic_score = Some(score),
            Self::OffTopic(analysis) => performance.off_topic_analysis = Some(analysis),
        }
    }
}

/// A trait that defines the interface for one scoring pass.
#[async_trait]
pub trait ScoringAgent: Send + Sync {
    /// Returns the unique ID of the agent.
    fn id(&self) -> &str;

    /// Returns a description of the agent's purpose.
    fn description(&self) -> &str;

    /// Scores the audio file at `path`.
    ///
    /// # Errors
    /// Returns a `ScoringError` if the file name is malformed, no task
    /// definition matches it, the audio cannot be read, the model call
    /// fails, or the reply cannot be parsed.
    async fn score_performance(&self, path: &Path) -> Result<AgentScore>;
}

/// Shared request flow for all agent kinds: parse the file name, look up
/// the task definition, read the audio, substitute the task text into the
/// prompt, and call the model. Returns the raw reply text for the caller
/// to parse into its own record type.
pub(crate) async fn request_model_reply(
    model: &dyn Model,
    tasks: &TaskDefinitionStore,
    prompt_template: &str,
    path: &Path,
) -> Result<String> {
    let display_path = path.display().to_string();
    let (session_id, task_id) = parse_file_name(&display_path)
        .ok_or_else(|| ScoringError::InvalidFileName(display_path.clone()))?;

    let task_definition =
        tasks.get(&session_id, &task_id).ok_or_else(|| ScoringError::MissingTaskDefinition {
            session_id: session_id.clone(),
            task_id: task_id.clone(),
        })?;
    debug!(session_id, task_id, path = %display_path, "Resolved task definition");

    let audio_bytes = tokio::fs::read(path).await?;
    let prompt = prompt_template.replace(TASK_DEFINITION_PLACEHOLDER, task_definition);

    let response = model.generate_with_audio(&prompt, &AudioData::mp3(audio_bytes)).await?;
    Ok(response.content)
}
