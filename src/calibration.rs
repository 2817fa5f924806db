use serde::Serialize;
use tracing::{debug, info};

use crate::config::CalibrationConfig;
use crate::metrics::LegMetrics;

/// 休止姿勢から求めた個人の基準値（セッション中は不変）
///
/// 長さ・座標は縦横比補正済みの画像座標系。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    pub knee_angle: f32,
    pub trunk_lean: f32,
    pub leg_length: f32,
    pub ankle_y: f32,
    pub knee_x: f32,
}

/// 休止相の安定フレームを平均して `Calibration` を作る
pub struct CalibrationAccumulator {
    required_frames: u32,
    frames: u32,
    sum: [f64; 5],
    calibration: Option<Calibration>,
}

impl CalibrationAccumulator {
    pub fn new(required_frames: u32) -> Self {
        Self {
            required_frames: required_frames.max(1),
            frames: 0,
            sum: [0.0; 5],
            calibration: None,
        }
    }

    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self::new(config.required_frames)
    }

    /// 条件を満たすフレームを取り込む。このフレームで確定したら true
    pub fn observe(&mut self, metrics: Option<&LegMetrics>, reliable: bool, resting: bool) -> bool {
        if self.calibration.is_some() || !reliable || !resting {
            return false;
        }
        let Some(m) = metrics else {
            return false;
        };
        let Some(trunk_lean) = m.trunk_lean else {
            return false;
        };

        let sample = [m.knee_angle, trunk_lean, m.leg_length, m.ankle_y, m.knee_x];
        for (acc, v) in self.sum.iter_mut().zip(sample) {
            *acc += v as f64;
        }
        self.frames += 1;
        debug!("calibration sample {}/{}", self.frames, self.required_frames);

        if self.frames < self.required_frames {
            return false;
        }

        let n = self.frames as f64;
        let mean = |i: usize| (self.sum[i] / n) as f32;
        let calibration = Calibration {
            knee_angle: mean(0),
            trunk_lean: mean(1),
            leg_length: mean(2),
            ankle_y: mean(3),
            knee_x: mean(4),
        };
        info!(
            "calibrated: knee={:.1}° lean={:.1}° leg={:.1} ankle_y={:.1}",
            calibration.knee_angle, calibration.trunk_lean, calibration.leg_length, calibration.ankle_y
        );
        self.calibration = Some(calibration);
        true
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// 確定までの進捗 (0.0〜1.0)
    pub fn progress(&self) -> f32 {
        if self.calibration.is_some() {
            1.0
        } else {
            self.frames as f32 / self.required_frames as f32
        }
    }

    pub fn reset(&mut self) {
        self.frames = 0;
        self.sum = [0.0; 5];
        self.calibration = None;
    }
}
