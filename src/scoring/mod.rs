pub mod aggregator;
pub mod form;
pub mod quality;

pub use aggregator::{RepAggregator, RepExtremes, RepSample};
pub use form::{range_penalty, threshold_penalty, FormAssessment, FormScorer, FormScores, Grade, IssueKey, ScoreContext};
pub use quality::{evaluate, FeedbackKind};
