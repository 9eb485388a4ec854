//! Score records for a single speaking performance.

use serde::{Deserialize, Serialize};

/// Per-domain rubric bands from the analytic scoring pass.
///
/// Bands are expected to fall in 1-5 but the range is not enforced here;
/// the parser defaults missing domains to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticScores {
    pub grammar: i64,
    pub vocabulary: i64,
    pub content: i64,
    pub fluency: i64,
    pub pronunciation: i64,
    pub overall: i64,
}

impl AnalyticScores {
    /// Sum of all six rubric domains.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.grammar
            + self.vocabulary
            + self.content
            + self.fluency
            + self.pronunciation
            + self.overall
    }
}

/// Single 0-100 score from the holistic scoring pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolisticScore {
    pub overall_score: i64,
}

/// Result of the off-topic detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffTopicAnalysis {
    /// Whether the response went off-topic.
    pub is_off_topic: bool,
    /// Model-reported certainty, 0.0 to 1.0.
    pub confidence: f64,
    /// Brief justification for the decision.
    pub explanation: String,
}

/// Everything known about one audio file after a scoring run.
///
/// Created empty at batch start; each enabled agent fills in its own field.
/// A failed agent leaves its field `None` without touching sibling fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingPerformance {
    /// Audio file name, the record's natural key.
    pub file_name: String,
    pub analytic_scores: Option<AnalyticScores>,
    pub holistic_score: Option<HolisticScore>,
    pub off_topic_analysis: Option<OffTopicAnalysis>,
    /// Derived from `analytic_scores` by the adjustment pass.
    pub adjusted_score: Option<i64>,
}

impl SpeakingPerformance {
    /// Creates an empty record for the given file name.
    #[must_use]
    pub const fn new(file_name: String) -> Self {
        Self {
            file_name,
            analytic_scores: None,
            holistic_score: None,
            off_topic_analysis: None,
            adjusted_score: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analytic_total() {
        let scores = AnalyticScores {
            grammar: 3,
            vocabulary: 4,
            content: 5,
            fluency: 2,
            pronunciation: 3,
            overall: 4,
        };
        assert_eq!(scores.total(), 21);
    }

    #[test]
    fn test_new_performance_is_empty() {
        let perf = SpeakingPerformance::new("231101013-6-t1.mp3".to_string());
        assert_eq!(perf.file_name, "231101013-6-t1.mp3");
        assert!(perf.analytic_scores.is_none());
        assert!(perf.holistic_score.is_none());
        assert!(perf.off_topic_analysis.is_none());
        assert!(perf.adjusted_score.is_none());
    }

    #[test]
    fn test_performance_serialization_keys() {
        let perf = SpeakingPerformance {
            file_name: "a.mp3".to_string(),
            analytic_scores: None,
            holistic_score: None,
            off_topic_analysis: Some(OffTopicAnalysis {
                is_off_topic: true,
                confidence: 0.8,
                explanation: "Talked about the weather".to_string(),
            }),
            adjusted_score: Some(21),
        };
        let json = serde_json::to_string(&perf).unwrap();
        assert!(json.contains("\"is_off_topic\":true"));
        assert!(json.contains("\"adjusted_score\":21"));
    }
}
