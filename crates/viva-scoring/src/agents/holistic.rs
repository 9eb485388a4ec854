//! Holistic scoring pass: one overall 0-100 score.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use viva_abstraction::Model;

use crate::agents::{AgentScore, ScoringAgent, request_model_reply};
use crate::error::{Result, ScoringError};
use crate::parser;
use crate::tasks::TaskDefinitionStore;

const HOLISTIC_PROMPT: &str = r"You are a speaking performance classifier for students of English as a second language.
See the task and the band definitions below.
You will be provided with an audio file of a response to the given task.
Consider the student's overall performance and classify the student into a band.
DO NOT punish the student for incomplete final sentences because the audio files are trimmed at a time limit after the performance is recorded.
Reply as JSON in this format: { overall_score: number }

<TASK_DEFINITION>
{task_definition}
</TASK_DEFINITION>

<BAND_DEFINITIONS>
85-100: Intermediate or higher
70-84: Pre-intermediate
60-69: Elementary
35-59: Beginner
0-34: Foundations
</BAND_DEFINITIONS>";

/// Scores one audio file with a single overall band on the 0-100 scale.
pub struct HolisticScoringAgent {
    model: Arc<dyn Model>,
    tasks: Arc<TaskDefinitionStore>,
}

impl HolisticScoringAgent {
    /// Creates an agent backed by the given model client and task store.
    #[must_use]
    pub fn new(model: Arc<dyn Model>, tasks: Arc<TaskDefinitionStore>) -> Self {
        Self { model, tasks }
    }
}

#[async_trait]
impl ScoringAgent for HolisticScoringAgent {
    fn id(&self) -> &str {
        "holistic_scoring"
    }

    fn description(&self) -> &str {
        "Scores a speaking performance with a single overall band"
    }

    async fn score_performance(&self, path: &Path) -> Result<AgentScore> {
        debug!(agent_id = self.id(), path = %path.display(), "Scoring performance");

        let reply =
            match request_model_reply(self.model.as_ref(), &self.tasks, HOLISTIC_PROMPT, path)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(agent_id = self.id(), error = %e, "Holistic scoring failed");
                    return Err(e);
                }
            };

        match parser::parse_holistic(&reply) {
            Some(score) => {
                debug!(agent_id = self.id(), overall_score = score.overall_score, "Holistic scoring complete");
                Ok(AgentScore::Holistic(score))
            }
            None => {
                warn!(agent_id = self.id(), "Holistic reply could not be parsed");
                Err(ScoringError::UnparseableResponse { raw: reply })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{RecordingModel, audio_fixture, single_task_store};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scores_a_valid_file() {
        let dir = tempdir().unwrap();
        let path = audio_fixture(&dir, "231101013-6-t2.mp3");

        let model = Arc::new(RecordingModel::new(r#"{"overall_score": 72}"#));
        let store = single_task_store("6", "t2", "Talk about a place you want to visit.");
        let agent = HolisticScoringAgent::new(model.clone(), Arc::new(store));

        let score = match agent.score_performance(&path).await.unwrap() {
            AgentScore::Holistic(score) => score,
            other => panic!("expected a holistic score, got {other:?}"),
        };
        assert_eq!(score.overall_score, 72);

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("Talk about a place you want to visit."));
        assert!(prompt.contains("85-100: Intermediate or higher"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_fails() {
        let dir = tempdir().unwrap();
        let path = audio_fixture(&dir, "231101013-6-t2.mp3");

        let model = Arc::new(RecordingModel::new("I would rate this a solid 72."));
        let store = single_task_store("6", "t2", "Talk about a place you want to visit.");
        let agent = HolisticScoringAgent::new(model, Arc::new(store));

        let err = agent.score_performance(&path).await.unwrap_err();
        assert!(matches!(err, ScoringError::UnparseableResponse { .. }));
    }
}
