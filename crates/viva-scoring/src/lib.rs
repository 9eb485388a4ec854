//! Speaking-performance scoring pipeline.
//!
//! Everything between a folder of MP3 recordings and a list of scored
//! [`SpeakingPerformance`] records lives here: the file-name contract, the
//! task-definition store, the three scoring agents, the tolerant reply
//! parser, score adjustment, and the sequential batch runner with progress
//! events and cancellation.

pub mod adjustment;
pub mod agents;
pub mod batch;
pub mod error;
pub mod error_log;
pub mod filename;
pub mod parser;
pub mod performance;
pub mod progress;
pub mod tasks;

pub use agents::{
    AgentScore, AnalyticScoringAgent, HolisticScoringAgent, OffTopicDetectionAgent, ScoringAgent,
};
pub use batch::{AgentSelection, BatchOutcome, BatchRunner, CancellationFlag};
pub use error::{Result, ScoringError};
pub use performance::{AnalyticScores, HolisticScore, OffTopicAnalysis, SpeakingPerformance};
pub use progress::{ProgressEvent, ProgressReporter};
pub use tasks::TaskDefinitionStore;
