use serde::Serialize;

use crate::tracker::RunningStats;

/// One reliable in-rep frame's worth of measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RepSample {
    pub angle: f32,
    pub trunk_lean: Option<f32>,
    pub heel_rise: Option<f32>,
    pub knee_forward: Option<f32>,
    pub knee_collapse: Option<f32>,
    /// Normalized body-center x used for stability, when the exercise tracks it.
    pub hip_x: Option<f32>,
    pub shoulder_x: Option<f32>,
}

/// Extremes over one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RepExtremes {
    pub min_angle: Option<f32>,
    pub max_trunk_lean: Option<f32>,
    pub max_heel_rise: Option<f32>,
    pub max_knee_forward: Option<f32>,
    pub max_knee_collapse: Option<f32>,
    /// Larger of the hip-center and shoulder-center x standard deviations.
    /// Absent when no body-center samples were seen.
    pub stability: Option<f32>,
    pub frames: u32,
}

fn fold_max(acc: &mut Option<f32>, value: Option<f32>) {
    if let Some(v) = value {
        *acc = Some(acc.map_or(v, |a| a.max(v)));
    }
}

/// Per-attempt running extremes plus body-center sway statistics.
#[derive(Debug, Clone, Default)]
pub struct RepAggregator {
    extremes: RepExtremes,
    hip_center: RunningStats,
    shoulder_center: RunningStats,
}

impl RepAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: &RepSample) {
        let e = &mut self.extremes;
        e.min_angle = Some(e.min_angle.map_or(sample.angle, |m| m.min(sample.angle)));
        fold_max(&mut e.max_trunk_lean, sample.trunk_lean);
        fold_max(&mut e.max_heel_rise, sample.heel_rise);
        fold_max(&mut e.max_knee_forward, sample.knee_forward);
        fold_max(&mut e.max_knee_collapse, sample.knee_collapse);
        e.frames += 1;
        if let Some(x) = sample.hip_x {
            self.hip_center.push(x);
        }
        if let Some(x) = sample.shoulder_x {
            self.shoulder_center.push(x);
        }
    }

    /// Current extremes without resetting.
    pub fn snapshot(&self) -> RepExtremes {
        let mut extremes = self.extremes;
        if self.hip_center.count() > 0 || self.shoulder_center.count() > 0 {
            extremes.stability = Some(self.hip_center.stddev().max(self.shoulder_center.stddev()));
        }
        extremes
    }

    /// Read and reset in one step.
    pub fn take(&mut self) -> RepExtremes {
        let extremes = self.snapshot();
        self.reset();
        extremes
    }

    pub fn reset(&mut self) {
        self.extremes = RepExtremes::default();
        self.hip_center.reset();
        self.shoulder_center.reset();
    }
}
