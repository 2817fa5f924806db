use serde::Serialize;
use tracing::{debug, info};

use super::{EdgeCounter, PhaseUpdate, Transition, TransitionReason};
use crate::config::SquatConfig;
use crate::tracker::Ema;

/// 単一関節の屈伸運動（スクワット等）の二相
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexPhase {
    Up,
    Down,
}

impl FlexPhase {
    pub fn is_resting(self) -> bool {
        self == FlexPhase::Up
    }
}

/// UP ⇄ DOWN のヒステリシス付きレップカウンタ
///
/// 平滑化した角度が `down_threshold` 以下を `down_frames` 連続で満たすと DOWN、
/// `up_threshold` 以上を `up_frames` 連続で満たすと UP に戻り1レップ加算する。
/// 信頼できないフレームではカウンタを凍結する（リセットも前進もしない）。
pub struct FlexCounter {
    down_threshold: f32,
    up_threshold: f32,
    down_frames: u32,
    up_frames: u32,
    ema: Ema,
    phase: FlexPhase,
    rep_count: u32,
    to_down: EdgeCounter,
    to_up: EdgeCounter,
}

impl FlexCounter {
    pub fn new(config: &SquatConfig, alpha: f32) -> Self {
        Self {
            down_threshold: config.down_threshold,
            up_threshold: config.up_threshold,
            down_frames: config.down_frames,
            up_frames: config.up_frames,
            ema: Ema::new(alpha),
            phase: FlexPhase::Up,
            rep_count: 0,
            to_down: EdgeCounter::default(),
            to_up: EdgeCounter::default(),
        }
    }

    pub fn update(&mut self, raw_angle: Option<f32>, reliable: bool, timestamp_ms: u64) -> PhaseUpdate<FlexPhase> {
        let reliable = reliable && raw_angle.is_some();
        let smoothed = self.ema.update(if reliable { raw_angle } else { None });

        let mut transition = None;
        let mut rep_completed = false;

        if let (true, Some(angle)) = (reliable, smoothed) {
            let next = match self.phase {
                FlexPhase::Up => self
                    .to_down
                    .step(angle <= self.down_threshold, self.down_frames)
                    .then_some((FlexPhase::Down, TransitionReason::Flexed)),
                FlexPhase::Down => self
                    .to_up
                    .step(angle >= self.up_threshold, self.up_frames)
                    .then_some((FlexPhase::Up, TransitionReason::Extended)),
            };

            if let Some((to, reason)) = next {
                let from = self.phase;
                self.phase = to;
                self.to_down.clear();
                self.to_up.clear();
                if to == FlexPhase::Up {
                    self.rep_count += 1;
                    rep_completed = true;
                    info!("rep {} completed at {}ms", self.rep_count, timestamp_ms);
                }
                debug!("{:?} -> {:?} ({:?}) angle={:.1}", from, to, reason, angle);
                transition = Some(Transition {
                    from,
                    to,
                    timestamp_ms,
                    reason,
                });
            }
        }

        PhaseUpdate {
            rep_count: self.rep_count,
            phase: self.phase,
            rep_completed,
            raw_angle,
            smoothed_angle: smoothed,
            reliable,
            transition,
        }
    }

    pub fn phase(&self) -> FlexPhase {
        self.phase
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn reset(&mut self) {
        self.ema.reset();
        self.phase = FlexPhase::Up;
        self.rep_count = 0;
        self.to_down.clear();
        self.to_up.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 平滑化の影響を避けるため alpha をほぼ1にする
    fn counter(down_frames: u32, up_frames: u32) -> FlexCounter {
        let config = SquatConfig {
            down_threshold: 100.0,
            up_threshold: 160.0,
            down_frames,
            up_frames,
        };
        FlexCounter::new(&config, 0.999_999)
    }

    fn feed(c: &mut FlexCounter, angles: &[f32]) -> Vec<PhaseUpdate<FlexPhase>> {
        angles
            .iter()
            .enumerate()
            .map(|(i, a)| c.update(Some(*a), true, i as u64 * 33))
            .collect()
    }

    #[test]
    fn test_one_full_cycle_counts_once() {
        let mut c = counter(3, 3);
        let updates = feed(&mut c, &[170.0, 90.0, 90.0, 90.0, 90.0, 170.0, 170.0, 170.0, 170.0]);
        assert_eq!(c.rep_count(), 1);
        assert_eq!(updates.iter().filter(|u| u.rep_completed).count(), 1);
        assert!(updates[7].rep_completed);
        let t = updates[7].transition.unwrap();
        assert_eq!((t.from, t.to), (FlexPhase::Down, FlexPhase::Up));
        assert_eq!(t.reason, TransitionReason::Extended);
    }

    #[test]
    fn test_one_short_of_down_frames_does_not_transition() {
        let mut c = counter(3, 3);
        feed(&mut c, &[170.0, 90.0, 90.0]);
        assert_eq!(c.phase(), FlexPhase::Up);
        let u = c.update(Some(90.0), true, 200);
        assert_eq!(u.phase, FlexPhase::Down);
        assert_eq!(u.transition.unwrap().reason, TransitionReason::Flexed);
    }

    #[test]
    fn test_non_qualifying_frame_resets_candidate() {
        let mut c = counter(3, 3);
        feed(&mut c, &[90.0, 90.0, 120.0, 90.0, 90.0]);
        assert_eq!(c.phase(), FlexPhase::Up);
        c.update(Some(90.0), true, 500);
        assert_eq!(c.phase(), FlexPhase::Down);
    }

    #[test]
    fn test_unreliable_frame_freezes_counters() {
        let mut c = counter(3, 3);
        feed(&mut c, &[90.0, 90.0]);
        let u = c.update(None, true, 100);
        assert!(!u.reliable);
        let u = c.update(Some(90.0), false, 133);
        assert!(!u.reliable);
        assert_eq!(u.smoothed_angle.map(|a| a.round()), Some(90.0));
        assert_eq!(c.phase(), FlexPhase::Up);
        // 凍結されていたので3フレーム目で遷移
        c.update(Some(90.0), true, 166);
        assert_eq!(c.phase(), FlexPhase::Down);
    }

    #[test]
    fn test_hovering_between_thresholds_never_counts() {
        let mut c = counter(2, 2);
        feed(&mut c, &[170.0, 95.0, 95.0, 150.0, 150.0, 150.0, 95.0, 150.0]);
        assert_eq!(c.phase(), FlexPhase::Down);
        assert_eq!(c.rep_count(), 0);
    }

    #[test]
    fn test_multiple_reps() {
        let mut c = counter(2, 2);
        for _ in 0..3 {
            for a in [170.0, 90.0, 90.0, 170.0, 170.0] {
                c.update(Some(a), true, 0);
            }
        }
        assert_eq!(c.rep_count(), 3);
    }

    #[test]
    fn test_smoothing_delays_transition() {
        let config = SquatConfig::default();
        let mut c = FlexCounter::new(&config, 0.5);
        c.update(Some(170.0), true, 0);
        // 170 → 125 → 102.5: まだ閾値より上
        c.update(Some(80.0), true, 33);
        let u = c.update(Some(80.0), true, 66);
        assert!((u.smoothed_angle.unwrap() - 102.5).abs() < 1e-3);
        assert_eq!(u.raw_angle, Some(80.0));
        assert_eq!(c.phase(), FlexPhase::Up);
    }

    #[test]
    fn test_reset() {
        let mut c = counter(1, 1);
        feed(&mut c, &[90.0, 170.0]);
        assert_eq!(c.rep_count(), 1);
        c.reset();
        assert_eq!(c.rep_count(), 0);
        assert_eq!(c.phase(), FlexPhase::Up);
    }
}
