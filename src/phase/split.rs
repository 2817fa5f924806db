use serde::Serialize;
use tracing::{debug, info};

use super::{EdgeCounter, PhaseUpdate, Transition, TransitionReason};
use crate::config::LungeConfig;
use crate::tracker::Ema;

/// Phases of a split-stance rep (lunge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPhase {
    Standing,
    Descending,
    Bottom,
    Ascending,
    RepComplete,
}

impl SplitPhase {
    pub fn is_resting(self) -> bool {
        matches!(self, SplitPhase::Standing | SplitPhase::RepComplete)
    }

    /// Descending, Bottom and Ascending: the part of the cycle that is aggregated.
    pub fn in_rep(self) -> bool {
        !self.is_resting()
    }
}

/// Five-phase rep counter driven by the lead-leg knee angle.
///
/// Every edge shares `hysteresis_frames`. The rep increments only on
/// Ascending → RepComplete. Two regressions exist: Descending → Standing when
/// the angle recovers before the bottom, and RepComplete → Standing/Descending
/// depending on what the angle does after the rep.
pub struct SplitCounter {
    descend_threshold: f32,
    bottom_threshold: f32,
    ascend_threshold: f32,
    standing_threshold: f32,
    hysteresis_frames: u32,
    ema: Ema,
    phase: SplitPhase,
    rep_count: u32,
    to_descending: EdgeCounter,
    to_bottom: EdgeCounter,
    abort: EdgeCounter,
    to_ascending: EdgeCounter,
    to_complete: EdgeCounter,
    settle: EdgeCounter,
    resume: EdgeCounter,
}

impl SplitCounter {
    pub fn new(config: &LungeConfig, alpha: f32) -> Self {
        Self {
            descend_threshold: config.descend_threshold,
            bottom_threshold: config.bottom_threshold,
            ascend_threshold: config.ascend_threshold,
            standing_threshold: config.standing_threshold,
            hysteresis_frames: config.hysteresis_frames,
            ema: Ema::new(alpha),
            phase: SplitPhase::Standing,
            rep_count: 0,
            to_descending: EdgeCounter::default(),
            to_bottom: EdgeCounter::default(),
            abort: EdgeCounter::default(),
            to_ascending: EdgeCounter::default(),
            to_complete: EdgeCounter::default(),
            settle: EdgeCounter::default(),
            resume: EdgeCounter::default(),
        }
    }

    fn clear_edges(&mut self) {
        self.to_descending.clear();
        self.to_bottom.clear();
        self.abort.clear();
        self.to_ascending.clear();
        self.to_complete.clear();
        self.settle.clear();
        self.resume.clear();
    }

    fn next_phase(&mut self, angle: f32) -> Option<(SplitPhase, TransitionReason)> {
        use SplitPhase::*;
        let n = self.hysteresis_frames;
        match self.phase {
            Standing => self
                .to_descending
                .step(angle < self.descend_threshold, n)
                .then_some((Descending, TransitionReason::DescentStarted)),
            Descending => {
                let bottom = self.to_bottom.step(angle <= self.bottom_threshold, n);
                let abort = self.abort.step(angle >= self.standing_threshold, n);
                if bottom {
                    Some((Bottom, TransitionReason::BottomReached))
                } else if abort {
                    Some((Standing, TransitionReason::DescentAborted))
                } else {
                    None
                }
            }
            Bottom => self
                .to_ascending
                .step(angle >= self.ascend_threshold, n)
                .then_some((Ascending, TransitionReason::AscentStarted)),
            Ascending => self
                .to_complete
                .step(angle >= self.standing_threshold, n)
                .then_some((RepComplete, TransitionReason::StoodUp)),
            RepComplete => {
                let settle = self.settle.step(angle >= self.standing_threshold, n);
                let resume = self.resume.step(angle < self.descend_threshold, n);
                if settle {
                    Some((Standing, TransitionReason::Settled))
                } else if resume {
                    Some((Descending, TransitionReason::DescentResumed))
                } else {
                    None
                }
            }
        }
    }

    pub fn update(&mut self, raw_angle: Option<f32>, reliable: bool, timestamp_ms: u64) -> PhaseUpdate<SplitPhase> {
        let reliable = reliable && raw_angle.is_some();
        let smoothed = self.ema.update(if reliable { raw_angle } else { None });

        let mut transition = None;
        let mut rep_completed = false;

        if let (true, Some(angle)) = (reliable, smoothed) {
            if let Some((to, reason)) = self.next_phase(angle) {
                let from = self.phase;
                self.phase = to;
                self.clear_edges();
                if to == SplitPhase::RepComplete {
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

    pub fn phase(&self) -> SplitPhase {
        self.phase
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn reset(&mut self) {
        self.ema.reset();
        self.phase = SplitPhase::Standing;
        self.rep_count = 0;
        self.clear_edges();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SplitPhase::*;

    fn counter() -> SplitCounter {
        // 150 / 105 / 115 / 160, hysteresis 2
        SplitCounter::new(&LungeConfig::default(), 0.999_999)
    }

    fn feed(c: &mut SplitCounter, angles: &[f32]) -> Vec<PhaseUpdate<SplitPhase>> {
        angles
            .iter()
            .enumerate()
            .map(|(i, a)| c.update(Some(*a), true, i as u64 * 33))
            .collect()
    }

    fn phases(updates: &[PhaseUpdate<SplitPhase>]) -> Vec<SplitPhase> {
        updates.iter().filter_map(|u| u.transition.map(|t| t.to)).collect()
    }

    #[test]
    fn test_full_cycle_counts_once() {
        let mut c = counter();
        let updates = feed(
            &mut c,
            &[170.0, 140.0, 140.0, 95.0, 95.0, 125.0, 125.0, 170.0, 170.0, 170.0, 170.0],
        );
        assert_eq!(phases(&updates), vec![Descending, Bottom, Ascending, RepComplete, Standing]);
        assert_eq!(c.rep_count(), 1);
        assert_eq!(updates.iter().filter(|u| u.rep_completed).count(), 1);
        assert!(updates[8].rep_completed);
        assert_eq!(updates[8].transition.unwrap().reason, TransitionReason::StoodUp);
        assert_eq!(c.phase(), Standing);
    }

    #[test]
    fn test_aborted_descent_returns_to_standing() {
        let mut c = counter();
        let updates = feed(&mut c, &[170.0, 140.0, 140.0, 130.0, 165.0, 165.0]);
        assert_eq!(phases(&updates), vec![Descending, Standing]);
        assert_eq!(
            updates[5].transition.unwrap().reason,
            TransitionReason::DescentAborted
        );
        assert_eq!(c.rep_count(), 0);
    }

    #[test]
    fn test_rep_complete_can_resume_descent() {
        let mut c = counter();
        feed(&mut c, &[140.0, 140.0, 95.0, 95.0, 125.0, 125.0, 170.0, 170.0]);
        assert_eq!(c.phase(), RepComplete);
        let u1 = c.update(Some(140.0), true, 500);
        assert!(u1.transition.is_none());
        let u2 = c.update(Some(140.0), true, 533);
        let t = u2.transition.unwrap();
        assert_eq!((t.from, t.to), (RepComplete, Descending));
        assert_eq!(t.reason, TransitionReason::DescentResumed);
        assert_eq!(c.rep_count(), 1);
    }

    #[test]
    fn test_single_frame_dip_is_ignored() {
        let mut c = counter();
        feed(&mut c, &[170.0, 140.0, 170.0, 140.0, 170.0]);
        assert_eq!(c.phase(), Standing);
    }

    #[test]
    fn test_bottom_requires_hysteresis() {
        let mut c = counter();
        feed(&mut c, &[140.0, 140.0, 95.0]);
        assert_eq!(c.phase(), Descending);
        c.update(Some(95.0), true, 200);
        assert_eq!(c.phase(), Bottom);
    }

    #[test]
    fn test_unreliable_frames_freeze() {
        let mut c = counter();
        feed(&mut c, &[140.0]);
        c.update(None, true, 40);
        c.update(Some(20.0), false, 80);
        let u = c.update(Some(140.0), true, 120);
        assert_eq!(u.phase, Descending);
    }

    #[test]
    fn test_phase_classification() {
        assert!(Standing.is_resting());
        assert!(RepComplete.is_resting());
        assert!(Descending.in_rep());
        assert!(Bottom.in_rep());
        assert!(Ascending.in_rep());
    }
}
