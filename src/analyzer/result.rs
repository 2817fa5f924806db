use serde::Serialize;

use crate::phase::{Phase, Transition};
use crate::pose::Side;
use crate::scoring::{FeedbackKind, FormAssessment, FormScores, IssueKey, RepExtremes};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepCount {
    pub value: u32,
    pub just_incremented: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Feedback {
    pub classification: FeedbackKind,
    pub is_valid: bool,
    /// Overall form score scaled to `[0, 1]`.
    pub accuracy: f32,
    pub is_perfect_form: bool,
}

impl Feedback {
    pub fn waiting() -> Self {
        Self {
            classification: FeedbackKind::Waiting,
            is_valid: false,
            accuracy: 0.0,
            is_perfect_form: false,
        }
    }

    pub fn from_assessment(classification: FeedbackKind, assessment: &FormAssessment) -> Self {
        Self {
            classification,
            is_valid: classification.is_valid(),
            accuracy: assessment.scores.overall as f32 / 100.0,
            is_perfect_form: classification == FeedbackKind::GoodForm,
        }
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self::waiting()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    RepComplete,
    /// Early read taken when the bottom of a rep is first reached.
    BottomReached,
}

/// Scored view of one rep (or of a rep in progress at its bottom).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepSummary {
    /// 1-based index of the rep this summary belongs to.
    pub rep_index: u32,
    pub kind: SummaryKind,
    pub timestamp_ms: u64,
    pub side: Option<Side>,
    pub extremes: RepExtremes,
    pub scores: FormScores,
    /// Highest-penalty issues first, at most two.
    pub issues: Vec<IssueKey>,
    pub classification: FeedbackKind,
}

/// Frame-level measurements for display/debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameMetrics {
    pub side: Option<Side>,
    pub side_locked: bool,
    pub knee_angle: Option<f32>,
    pub smoothed_angle: Option<f32>,
    pub trunk_lean: Option<f32>,
    pub trunk_thigh: Option<f32>,
    pub heel_rise: Option<f32>,
    pub knee_forward: Option<f32>,
    pub knee_collapse: Option<f32>,
    pub facing_camera: bool,
    pub calibrated: bool,
    /// 基準姿勢の取得進捗 (0.0〜1.0)
    pub calibration_progress: f32,
}

/// フレームを解析しなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// 必要なランドマークの信頼度が足りない
    LowConfidence,
    /// 直前に受理したフレームより古いタイムスタンプ
    OutOfOrder,
}

/// Exactly one per input frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub timestamp_ms: u64,
    pub rep_count: RepCount,
    pub feedback: Feedback,
    pub phase: Phase,
    pub transition: Option<Transition<Phase>>,
    pub metrics: Option<FrameMetrics>,
    pub rep_summary: Option<RepSummary>,
    pub skipped_low_confidence: bool,
    pub skip_reason: Option<SkipReason>,
}

impl AnalysisResult {
    /// Result for a frame that could not be analyzed. Keeps the running
    /// count but carries no increment, feedback, metrics or summary.
    pub fn skipped(timestamp_ms: u64, rep_count: u32, phase: Phase, reason: SkipReason) -> Self {
        Self {
            timestamp_ms,
            rep_count: RepCount {
                value: rep_count,
                just_incremented: false,
            },
            feedback: Feedback::waiting(),
            phase,
            transition: None,
            metrics: None,
            rep_summary: None,
            skipped_low_confidence: reason == SkipReason::LowConfidence,
            skip_reason: Some(reason),
        }
    }
}
