use crate::calibration::CalibrationAccumulator;
use crate::config::Config;
use crate::metrics::{LegMetrics, MetricsCalculator};
use crate::phase::{FlexCounter, FlexPhase, Phase};
use crate::pose::Frame;
use crate::scoring::{RepSample, ScoreContext};
use crate::tracker::{SideSelection, SideSelector};

use super::result::{AnalysisResult, FrameMetrics, RepCount, SkipReason};
use super::review::{FrameClock, RepReview};
use super::{ExerciseAnalyzer, ExerciseKind};

/// スクワット解析: 側面選択 → 片脚計測 → 基準姿勢 → 二相カウンタ → 採点
pub struct SquatAnalyzer {
    clock: FrameClock,
    side: SideSelector,
    metrics: MetricsCalculator,
    calibration: CalibrationAccumulator,
    counter: FlexCounter,
    review: RepReview,
}

impl SquatAnalyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            clock: FrameClock::default(),
            side: SideSelector::from_config(&config.side),
            metrics: MetricsCalculator::from_config(&config.side),
            calibration: CalibrationAccumulator::from_config(&config.calibration),
            counter: FlexCounter::new(&config.squat, config.smoothing.alpha),
            review: RepReview::new(config.scoring.squat.clone()),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    fn sample(m: &LegMetrics) -> RepSample {
        RepSample {
            angle: m.knee_angle,
            trunk_lean: m.trunk_lean,
            heel_rise: m.heel_rise,
            knee_forward: m.knee_forward,
            knee_collapse: None,
            hip_x: None,
            shoulder_x: None,
        }
    }

    fn frame_metrics(
        &self,
        m: &LegMetrics,
        selection: &SideSelection,
        smoothed: Option<f32>,
        facing_camera: bool,
    ) -> FrameMetrics {
        FrameMetrics {
            side: Some(m.side),
            side_locked: selection.locked,
            knee_angle: Some(m.knee_angle),
            smoothed_angle: smoothed,
            trunk_lean: m.trunk_lean,
            trunk_thigh: m.trunk_thigh,
            heel_rise: m.heel_rise,
            knee_forward: m.knee_forward,
            knee_collapse: None,
            facing_camera,
            calibrated: self.calibration.is_calibrated(),
            calibration_progress: self.calibration.progress(),
        }
    }
}

impl ExerciseAnalyzer for SquatAnalyzer {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Squat
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
        let selection = self.side.update(frame, resting);
        let leg = selection
            .side
            .and_then(|side| self.metrics.leg(frame, side, self.calibration.calibration()));
        let reliable = leg.is_some();

        self.calibration.observe(leg.as_ref(), reliable, resting);

        let update = self.counter.update(leg.map(|m| m.knee_angle), reliable, ts);

        if let Some(t) = update.transition {
            if t.from == FlexPhase::Up && t.to == FlexPhase::Down {
                self.review.begin_attempt();
            }
        }

        let Some(leg) = leg else {
            return AnalysisResult::skipped(ts, update.rep_count, update.phase.into(), SkipReason::LowConfidence);
        };

        if update.phase == FlexPhase::Down {
            self.review.sample(&Self::sample(&leg));
        }

        let facing_camera = self.metrics.facing_camera(frame);
        let rep_summary = update.rep_completed.then(|| {
            let context = ScoreContext {
                facing_camera,
                side: Some(leg.side),
            };
            self.review.rep_completed(update.rep_count, ts, &context)
        });

        AnalysisResult {
            timestamp_ms: ts,
            rep_count: RepCount {
                value: update.rep_count,
                just_incremented: update.rep_completed,
            },
            feedback: self.review.feedback(),
            phase: Phase::from(update.phase),
            transition: update.transition.map(|t| t.erase()),
            metrics: Some(self.frame_metrics(&leg, &selection, update.smoothed_angle, facing_camera)),
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
        self.side.reset();
        self.calibration.reset();
        self.counter.reset();
        self.review.reset();
    }
}
