//! Off-topic detection pass.
//!
//! The verdict, the confidence and the explanation all come from the model
//! reply; nothing is recomputed locally. A reply that parses but omits a
//! field falls back to the lenient parser defaults, so a bare `{}` reads
//! as "on topic, zero confidence".

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use viva_abstraction::Model;

use crate::agents::{AgentScore, ScoringAgent, request_model_reply};
use crate::error::{Result, ScoringError};
use crate::parser;
use crate::tasks::TaskDefinitionStore;

const OFF_TOPIC_PROMPT: &str = r"You are an expert in analyzing whether a student's speech response is on-topic or off-topic.
You will be provided with a task definition and an audio file of a student's response.
Analyze if the response addresses the given task or goes off-topic.
Consider partial relevance and tangential discussions in your analysis.
DO NOT punish the student for incomplete final sentences because the audio files are trimmed at a time limit after the performance is recorded.
Reply as JSON in this format: { off_topic: boolean, confidence: number, explanation: string }
The confidence should be between 0 and 1, indicating how certain you are about your assessment.
The explanation should briefly justify your decision.

<TASK_DEFINITION>
{task_definition}
</TASK_DEFINITION>";

/// Judges whether one audio file actually addresses its task.
pub struct OffTopicDetectionAgent {
    model: Arc<dyn Model>,
    tasks: Arc<TaskDefinitionStore>,
}

impl OffTopicDetectionAgent {
    /// Creates an agent backed by the given model client and task store.
    #[must_use]
    pub fn new(model: Arc<dyn Model>, tasks: Arc<TaskDefinitionStore>) -> Self {
        Self { model, tasks }
    }
}

#[async_trait]
impl ScoringAgent for OffTopicDetectionAgent {
    fn id(&self) -> &str {
        "off_topic_detection"
    }

    fn description(&self) -> &str {
        "Judges whether a speaking performance addresses its task"
    }

    async fn score_performance(&self, path: &Path) -> Result<AgentScore> {
        debug!(agent_id = self.id(), path = %path.display(), "Analyzing topic relevance");

        let reply =
            match request_model_reply(self.model.as_ref(), &self.tasks, OFF_TOPIC_PROMPT, path)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(agent_id = self.id(), error = %e, "Off-topic detection failed");
                    return Err(e);
                }
            };

        match parser::parse_off_topic(&reply) {
            Some(analysis) => {
                debug!(
                    agent_id = self.id(),
                    is_off_topic = analysis.is_off_topic,
                    confidence = analysis.confidence,
                    "Off-topic detection complete"
                );
                Ok(AgentScore::OffTopic(analysis))
            }
            None => {
                warn!(agent_id = self.id(), "Off-topic reply could not be parsed");
                Err(ScoringError::UnparseableResponse { raw: reply })
            }
        }
    }
}
