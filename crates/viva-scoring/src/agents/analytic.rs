//! Analytic scoring pass: one rubric band per domain.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use viva_abstraction::Model;

use crate::agents::{AgentScore, ScoringAgent, request_model_reply};
use crate::error::{Result, ScoringError};
use crate::parser;
use crate::tasks::TaskDefinitionStore;

/// Rubric prompt sent with every analytic request, task definition
/// substituted in before sending. The band wording is calibrated against
/// rated performances; do not edit it casually.
const ANALYTIC_PROMPT: &str = r"You are a speaking performance classifier for students of English as a second language.
See the task and the band definitions for each rubric domain below.
You will be provided with an audio file of a response to the given task.
For each rubric domain, consider the student's performance on the domain and classify the student into a band.
DO NOT punish the student for incomplete final sentences because the audio files are trimmed at a time limit after the performance is recorded.
Reply as JSON in this format: { grammar: number, vocabulary: number, content: number, fluency: number, pronunciation: number, overall: number }

<TASK_DEFINITION>
{task_definition}
</TASK_DEFINITION>

<BAND_DEFINITIONS>
<GRAMMAR>
-BAND 5: Place the student here even if there are a lot of grammar errors, but the errors interefere with the meaning in less than 50% of the statements.
Also, place  the student here if there  is at least one complicated sentence, sentences with a relative clause, a noun clause, or an adverbial clause.
This band corresponds to Intermediate or higher levels.
-BAND 4: Place the student here even if there are a lot of grammar errors, but the errors interefere with the meaning in less than 50% of the statements.
This band corresponds to Elementary level.
-BAND 3: Place the student here if there are a lot of grammar errors, and the errors interefere with the meaning during more than 50% of the statements.
This band corresponds to Beginner level.
-BAND 2: Place the student here if there are a lot of grammar errors, and the errors interefere with the meaning during more than 70% of the statements.
This band corresponds to Beginner level.
-BAND 1: Place the student here if there are a lot of grammar errors, and the errors interefere with the meaning during more than 90% of the statements.
This band corresponds to Foundations level.
</GRAMMAR>

<VOCABULARY>
-BAND 5: Place the student here even if there are a lot of incorrect use of vocabulary items to deal with topic, but these errors interefere with the meaning in less than 50% of the statements.
Also, place  the student here if there  is at least one complex vocabulary item, idiomatic expression, or phrasal verb that corresponds to upper-intermediate or a higher level..
This band corresponds to Intermediate or higher levels.
-BAND 4: Place the student here even if there are a lot of incorrect use of vocabulary items to deal with topic, but these errors interefere with the meaning in less than 50% of the statements.
This band corresponds to Elementary level.
-BAND 3: Place the student here if there are a lot of incorrect use of vocabulary items to deal with topic, and these errors interefere with the meaning during more than 50% of the statements.
This band corresponds to Beginner level.
-BAND 2: Place the student here if there are a lot of incorrect use of vocabulary items to deal with topic, and these errors interefere with the meaning during more than 70% of the statements.
This band corresponds to Beginner level.
-BAND 1: Place the student here if there are a lot of incorrect use of vocabulary items to deal with topic, and these errors interefere with the meaning during more than 90% of the statements.
This band corresponds to Foundations level.
</VOCABULARY>

<CONTENT>
-BAND 5: Place the student here if there is at least one example or explanation relevant to the topic.
This band corresponds to Intermediate or higher levels.
-BAND 4: Place the student here even if the content is repeated, but some of the ideas are clear.
This band corresponds to Elementary level.
-BAND 3: Place the student here if lack of content (repetition or no explanation/examplification) make most of the ideas unclear.
This band corresponds to Beginner level.
-BAND 2: Place the student here if there is no content that almost none of the ideas are clear.
This band corresponds to Beginner level.
-BAND 1: Place the student here if there is no or very little understandable content.
This band corresponds to Foundations level.
</CONTENT>

<FLUENCY>
-BAND 5: Place the student here even if there are  a lot of hesitation with pauses. Verbal stutters and filler words are present almost after every two or three words.
This band corresponds to Intermediate or higher levels.
-BAND 4: Place the student here even if there are a lot of hesitation with pauses. Verbal stutters and filler words are present almost after every two or three words.
This band corresponds to Elementary level.
-BAND 3: Place the student here if there are a lot of hesitation with pauses. Verbal stutters and filler words are present almost after every word.
This band corresponds to Beginner level.
-BAND 2: Place the student here if there are a lot of hesitation and very long pauses. Verbal stutters and filler words are present almost after every word.
This band corresponds to Beginner level.
-BAND 1: Place the student here if the performance is so much paused that there is only a couple of meaningful words and the rest is verbal stutters like 'uh' or 'hmm'.
This band corresponds to Foundations level.
</FLUENCY>

<PRONUNCIATION>
-BAND 5: Place the student here even if there are a lot of pronunciation errors, but these errors rarely  (less than 40% of the time) interefere with the meaning.
Also, place  the student here if there  is at least one complex word or phrase, which corresponds to upper-intermediate or a higher level, pronounced correctly.
This band corresponds to Intermediate or higher levels.
-BAND 4: Place the student here even if there are a lot of pronunciation errors, but these errors sometimes  (less than 50% of the time) interefere with the meaning.
But some of the ideas are clear.
This band corresponds to Elementary level.
-BAND 3: Place the student here if there are a lot of pronunciation errors, and these errors usually  (more than 50% of the time) interefere with the meaning.
This band corresponds to Beginner level.
-BAND 2: Place the student here if there are a lot of pronunciation errors, and these errors mostly  (more than 70% of the time) interefere with the meaning.
Almost none of the ideas are clear.
This band corresponds to Beginner level.
-BAND 1: Place the student here if there are a lot of pronunciation errors, and these errors almost always  (more than 90% of the time) interefere with the meaning.
This band corresponds to Foundations level.
</PRONUNCIATION>

<OVERALL>
-BAND 5: Intermediate
-BAND 4: Pre-intermediate
-BAND 3: Elementary
-BAND 2: Beginner
-BAND 1: Foundations
</OVERALL>
</BAND_DEFINITIONS>";

/// Scores one audio file per rubric domain (grammar, vocabulary, content,
/// fluency, pronunciation) plus an overall band.
pub struct AnalyticScoringAgent {
    model: Arc<dyn Model>,
    tasks: Arc<TaskDefinitionStore>,
}

impl AnalyticScoringAgent {
    /// Creates an agent backed by the given model client and task store.
    #[must_use]
    pub fn new(model: Arc<dyn Model>, tasks: Arc<TaskDefinitionStore>) -> Self {
        Self { model, tasks }
    }
}

#[async_trait]
impl ScoringAgent for AnalyticScoringAgent {
    fn id(&self) -> &str {
        "analytic_scoring"
    }

    fn description(&self) -> &str {
        "Classifies a speaking performance into a band per rubric domain"
    }

    async fn score_performance(&self, path: &Path) -> Result<AgentScore> {
        debug!(agent_id = self.id(), path = %path.display(), "Scoring performance");

        let reply =
            match request_model_reply(self.model.as_ref(), &self.tasks, ANALYTIC_PROMPT, path)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(agent_id = self.id(), error = %e, "Analytic scoring failed");
                    return Err(e);
                }
            };

        match parser::parse_analytic(&reply) {
            Some(scores) => {
                debug!(agent_id = self.id(), ?scores, "Analytic scoring complete");
                Ok(AgentScore::Analytic(scores))
            }
            None => {
                warn!(agent_id = self.id(), "Analytic reply could not be parsed");
                Err(ScoringError::UnparseableResponse { raw: reply })
            }
        }
    }
}
