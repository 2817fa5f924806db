use crate::config::ScoreConfig;
use crate::scoring::{evaluate, FormScorer, RepAggregator, RepExtremes, RepSample, ScoreContext};

use super::result::{Feedback, RepSummary, SummaryKind};

/// Aggregation, scoring and sticky feedback shared by every analyzer.
pub(crate) struct RepReview {
    scorer: FormScorer,
    aggregator: RepAggregator,
    feedback: Feedback,
}

impl RepReview {
    pub(crate) fn new(config: ScoreConfig) -> Self {
        Self {
            scorer: FormScorer::new(config),
            aggregator: RepAggregator::new(),
            feedback: Feedback::waiting(),
        }
    }

    /// Rest → down: a new attempt starts from clean extremes.
    pub(crate) fn begin_attempt(&mut self) {
        self.aggregator.reset();
    }

    pub(crate) fn sample(&mut self, sample: &RepSample) {
        self.aggregator.update(sample);
    }

    /// Non-destructive read at the bottom of a rep.
    pub(crate) fn bottom_reached(&mut self, rep_index: u32, timestamp_ms: u64, context: &ScoreContext) -> RepSummary {
        let extremes = self.aggregator.snapshot();
        self.summarize(SummaryKind::BottomReached, extremes, rep_index, timestamp_ms, context)
    }

    pub(crate) fn rep_completed(&mut self, rep_index: u32, timestamp_ms: u64, context: &ScoreContext) -> RepSummary {
        let extremes = self.aggregator.take();
        self.summarize(SummaryKind::RepComplete, extremes, rep_index, timestamp_ms, context)
    }

    fn summarize(
        &mut self,
        kind: SummaryKind,
        extremes: RepExtremes,
        rep_index: u32,
        timestamp_ms: u64,
        context: &ScoreContext,
    ) -> RepSummary {
        let assessment = self.scorer.score(&extremes, context);
        let classification = evaluate(&assessment);
        self.feedback = Feedback::from_assessment(classification, &assessment);
        tracing::debug!(
            "rep {} {:?}: overall={} {:?} issues={:?}",
            rep_index,
            kind,
            assessment.scores.overall,
            classification,
            assessment.feedback_keys
        );
        RepSummary {
            rep_index,
            kind,
            timestamp_ms,
            side: assessment.side,
            extremes,
            scores: assessment.scores,
            issues: assessment.feedback_keys,
            classification,
        }
    }

    /// Last classification; unchanged until a new summary is produced.
    pub(crate) fn feedback(&self) -> Feedback {
        self.feedback
    }

    pub(crate) fn reset(&mut self) {
        self.aggregator.reset();
        self.feedback = Feedback::waiting();
    }
}

/// Rejects frames that go back in time.
#[derive(Debug, Default)]
pub(crate) struct FrameClock {
    last: Option<u64>,
}

impl FrameClock {
    pub(crate) fn accept(&mut self, timestamp_ms: u64) -> bool {
        if let Some(last) = self.last {
            if timestamp_ms < last {
                tracing::warn!("dropping out-of-order frame {}ms (last {}ms)", timestamp_ms, last);
                return false;
            }
        }
        self.last = Some(timestamp_ms);
        true
    }

    pub(crate) fn reset(&mut self) {
        self.last = None;
    }
}
