use crate::calibration::CalibrationAccumulator;
use crate::config::Config;
use crate::metrics::{MetricsCalculator, SplitStanceMetrics};
use crate::phase::{Phase, SplitCounter, SplitPhase};
use crate::pose::{Frame, Side};
use crate::scoring::{RepSample, ScoreContext};
use crate::tracker::LeadLegSelector;

use super::result::{AnalysisResult, FrameMetrics, RepCount, SkipReason};
use super::review::{FrameClock, RepReview};
use super::{ExerciseAnalyzer, ExerciseKind};

/// ランジ解析: 前脚選択 → 両脚計測 → 基準姿勢 → 五相カウンタ → 採点
///
/// 最下点に初めて到達したフレームで途中経過のサマリーも出す。
pub struct LungeAnalyzer {
    clock: FrameClock,
    lead_leg: LeadLegSelector,
    metrics: MetricsCalculator,
    calibration: CalibrationAccumulator,
    counter: SplitCounter,
    review: RepReview,
}

impl LungeAnalyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            clock: FrameClock::default(),
            lead_leg: LeadLegSelector::new(config.side.lead_leg_window),
            metrics: MetricsCalculator::from_config(&config.side),
            calibration: CalibrationAccumulator::from_config(&config.calibration),
            counter: SplitCounter::new(&config.lunge, config.smoothing.alpha),
            review: RepReview::new(config.scoring.lunge.clone()),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    fn sample(split: &SplitStanceMetrics, lead: Side) -> RepSample {
        let leg = split.leg(lead);
        RepSample {
            angle: leg.knee_angle,
            trunk_lean: leg.trunk_lean,
            heel_rise: leg.heel_rise,
            knee_forward: leg.knee_forward,
            knee_collapse: Some(split.knee_collapse),
            hip_x: Some(split.mid_hip_x),
            shoulder_x: Some(split.mid_shoulder_x),
        }
    }
}

impl ExerciseAnalyzer for LungeAnalyzer {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Lunge
    }

    fn process_frame(&mut self, frame: &Frame) -> AnalysisResult {
        let ts = frame.timestamp_ms;
        if !self.clock.accept(ts) {
            return AnalysisResult::skipped(
                ts,
                self.counter.rep_count(),
                self.counter.phase().into(),
                SkipReason::OutOfOrder,
            );
        }

        let resting = self.counter.phase().is_resting();
        // 動作中は前脚を固定
        self.lead_leg.set_locked(!resting);

        let split = self.metrics.split_stance(frame, self.calibration.calibration());
        let lead = split
            .as_ref()
            .map(|s| self.lead_leg.update(s.left.knee_angle, s.right.knee_angle));
        let reliable = split.is_some();

        let leg = split.as_ref().zip(lead).map(|(s, side)| *s.leg(side));
        self.calibration.observe(leg.as_ref(), reliable, resting);

        let update = self.counter.update(leg.map(|m| m.knee_angle), reliable, ts);

        if let Some(t) = update.transition {
            if t.from.is_resting() && t.to.in_rep() {
                self.review.begin_attempt();
            }
        }

        let (Some(split), Some(lead)) = (split, lead) else {
            return AnalysisResult::skipped(ts, update.rep_count, update.phase.into(), SkipReason::LowConfidence);
        };
        let leg = *split.leg(lead);

        if update.phase.in_rep() {
            self.review.sample(&Self::sample(&split, lead));
        }

        let context = ScoreContext {
            facing_camera: split.facing_camera,
            side: Some(lead),
        };
        let bottom = update.transition.is_some_and(|t| t.to == SplitPhase::Bottom);
        let rep_summary = if update.rep_completed {
            Some(self.review.rep_completed(update.rep_count, ts, &context))
        } else if bottom {
            Some(self.review.bottom_reached(update.rep_count + 1, ts, &context))
        } else {
            None
        };

        AnalysisResult {
            timestamp_ms: ts,
            rep_count: RepCount {
                value: update.rep_count,
                just_incremented: update.rep_completed,
            },
            feedback: self.review.feedback(),
            phase: Phase::from(update.phase),
            transition: update.transition.map(|t| t.erase()),
            metrics: Some(FrameMetrics {
                side: Some(lead),
                side_locked: self.lead_leg.is_locked(),
                knee_angle: Some(leg.knee_angle),
                smoothed_angle: update.smoothed_angle,
                trunk_lean: leg.trunk_lean,
                trunk_thigh: leg.trunk_thigh,
                heel_rise: leg.heel_rise,
                knee_forward: leg.knee_forward,
                knee_collapse: Some(split.knee_collapse),
                facing_camera: split.facing_camera,
                calibrated: self.calibration.is_calibrated(),
                calibration_progress: self.calibration.progress(),
            }),
            rep_summary,
            skipped_low_confidence: false,
            skip_reason: None,
        }
    }

    fn rep_count(&self) -> u32 {
        self.counter.rep_count()
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.lead_leg.reset();
        self.calibration.reset();
        self.counter.reset();
        self.review.reset();
    }
}
