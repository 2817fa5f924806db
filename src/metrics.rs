//! Per-frame measurements derived from landmarks.
//!
//! Positions and lengths are in aspect-corrected image space (see
//! [`Frame::scaled`]); `hip_x` / `shoulder_x` stay in normalized x for the
//! stability statistics.

use serde::Serialize;

use crate::calibration::Calibration;
use crate::config::SideConfig;
use crate::pose::{self, Frame, LandmarkKind, Side};

/// One leg's measurements for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegMetrics {
    pub side: Side,
    /// Included hip-knee-ankle angle in degrees.
    pub knee_angle: f32,
    /// Trunk angle from screen vertical in degrees.
    pub trunk_lean: Option<f32>,
    /// Hip-included shoulder-hip-knee angle in degrees.
    pub trunk_thigh: Option<f32>,
    pub leg_length: f32,
    pub ankle_y: f32,
    pub knee_x: f32,
    pub hip_x: f32,
    pub shoulder_x: f32,
    /// Ankle lift relative to the calibrated baseline, in leg lengths.
    pub heel_rise: Option<f32>,
    /// Horizontal knee-over-ankle offset, in calibrated leg lengths.
    pub knee_forward: Option<f32>,
}

/// Both legs plus whole-body signals for split-stance exercises.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitStanceMetrics {
    pub left: LegMetrics,
    pub right: LegMetrics,
    /// Largest inward knee drift over both legs, in current leg lengths.
    pub knee_collapse: f32,
    pub mid_hip_x: f32,
    pub mid_shoulder_x: f32,
    pub facing_camera: bool,
}

impl SplitStanceMetrics {
    pub fn leg(&self, side: Side) -> &LegMetrics {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

pub struct MetricsCalculator {
    min_confidence: f32,
    facing_ratio: f32,
}

impl MetricsCalculator {
    pub fn new(min_confidence: f32, facing_ratio: f32) -> Self {
        Self {
            min_confidence,
            facing_ratio,
        }
    }

    pub fn from_config(config: &SideConfig) -> Self {
        Self::new(config.min_confidence, config.facing_ratio)
    }

    /// Measurements for one side, or `None` if any of shoulder/hip/knee/ankle
    /// is missing, below confidence, or the knee geometry is degenerate.
    pub fn leg(&self, frame: &Frame, side: Side, calibration: Option<&Calibration>) -> Option<LegMetrics> {
        let [shoulder_kind, hip_kind, knee_kind, ankle_kind] = side.joints();
        let shoulder_lm = frame.get_valid(shoulder_kind, self.min_confidence)?;
        let hip_lm = frame.get_valid(hip_kind, self.min_confidence)?;
        let knee_lm = frame.get_valid(knee_kind, self.min_confidence)?;
        let ankle_lm = frame.get_valid(ankle_kind, self.min_confidence)?;

        let shoulder = frame.scaled(shoulder_lm);
        let hip = frame.scaled(hip_lm);
        let knee = frame.scaled(knee_lm);
        let ankle = frame.scaled(ankle_lm);

        let knee_angle = pose::knee_angle(hip, knee, ankle)?;
        let leg_length = pose::distance(hip, knee) + pose::distance(knee, ankle);

        let baseline = calibration.filter(|c| c.leg_length > 0.0);
        let heel_rise = baseline.map(|c| (c.ankle_y - ankle.1) / c.leg_length);
        let knee_forward = baseline.map(|c| (knee.0 - ankle.0).abs() / c.leg_length);

        Some(LegMetrics {
            side,
            knee_angle,
            trunk_lean: pose::trunk_tilt_vertical(shoulder, hip),
            trunk_thigh: pose::trunk_to_thigh(shoulder, hip, knee),
            leg_length,
            ankle_y: ankle.1,
            knee_x: knee.0,
            hip_x: hip_lm.x,
            shoulder_x: shoulder_lm.x,
            heel_rise,
            knee_forward,
        })
    }

    /// Both legs at once. Absent unless both legs are fully visible.
    pub fn split_stance(&self, frame: &Frame, calibration: Option<&Calibration>) -> Option<SplitStanceMetrics> {
        let left = self.leg(frame, Side::Left, calibration)?;
        let right = self.leg(frame, Side::Right, calibration)?;

        let mid_hip_x = (left.hip_x + right.hip_x) / 2.0;
        let mid_shoulder_x = (left.shoulder_x + right.shoulder_x) / 2.0;

        let (sx, _) = frame.aspect_scale();
        let center = mid_hip_x * sx;
        let knee_collapse = [Side::Left, Side::Right]
            .into_iter()
            .filter_map(|side| self.inward_knee_drift(frame, side, center))
            .fold(0.0f32, f32::max);

        Some(SplitStanceMetrics {
            left,
            right,
            knee_collapse,
            mid_hip_x,
            mid_shoulder_x,
            facing_camera: self.facing_camera(frame),
        })
    }

    /// How far the knee sits closer to the body midline than its ankle,
    /// normalized by the current leg length. Zero when the knee tracks outward.
    fn inward_knee_drift(&self, frame: &Frame, side: Side, center_x: f32) -> Option<f32> {
        let [_, hip_kind, knee_kind, ankle_kind] = side.joints();
        let hip = frame.scaled(frame.get_valid(hip_kind, self.min_confidence)?);
        let knee = frame.scaled(frame.get_valid(knee_kind, self.min_confidence)?);
        let ankle = frame.scaled(frame.get_valid(ankle_kind, self.min_confidence)?);
        let leg_length = pose::distance(hip, knee) + pose::distance(knee, ankle);
        if leg_length <= f32::EPSILON {
            return None;
        }
        let inward = (ankle.0 - center_x).abs() - (knee.0 - center_x).abs();
        Some(inward.max(0.0) / leg_length)
    }

    /// Whether the user squarely faces the camera: shoulder span relative to
    /// torso length. Needs both shoulders and both hips.
    pub fn facing_camera(&self, frame: &Frame) -> bool {
        use LandmarkKind::*;
        let get = |kind| frame.get_valid(kind, self.min_confidence).map(|lm| frame.scaled(lm));
        let (Some(ls), Some(rs), Some(lh), Some(rh)) =
            (get(LeftShoulder), get(RightShoulder), get(LeftHip), get(RightHip))
        else {
            return false;
        };
        let span = (ls.0 - rs.0).abs();
        let mid_shoulder = ((ls.0 + rs.0) / 2.0, (ls.1 + rs.1) / 2.0);
        let mid_hip = ((lh.0 + rh.0) / 2.0, (lh.1 + rh.1) / 2.0);
        let torso = pose::distance(mid_shoulder, mid_hip);
        if torso <= f32::EPSILON {
            return false;
        }
        span / torso >= self.facing_ratio
    }
}
