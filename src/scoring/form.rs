use serde::Serialize;

use super::aggregator::RepExtremes;
use crate::config::{Band, ScoreConfig};
use crate::pose::Side;

/// Form problem keys, in the order they enter the penalty map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKey {
    /// Bottom angle above the target band (not deep enough).
    Depth,
    /// Bottom angle below the target band.
    OverDepth,
    TrunkLean,
    HeelRise,
    KneeForward,
    KneeCollapse,
    Stability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormScores {
    pub depth: u8,
    pub alignment: u8,
    pub posture: u8,
    pub stability: u8,
    pub overall: u8,
    pub grade: Grade,
}

/// What the scorer knows about the view besides the extremes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreContext {
    pub facing_camera: bool,
    pub side: Option<Side>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormAssessment {
    pub scores: FormScores,
    /// Nonzero penalties in insertion order.
    pub penalties: Vec<(IssueKey, f32)>,
    /// Up to two highest penalties; ties keep insertion order.
    pub feedback_keys: Vec<IssueKey>,
    pub side: Option<Side>,
}

impl FormAssessment {
    pub fn penalty(&self, key: IssueKey) -> f32 {
        self.penalties
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(0.0, |(_, p)| *p)
    }

    pub fn has_issue(&self, key: IssueKey) -> bool {
        self.penalty(key) > 0.0
    }

    pub fn issues(&self) -> impl Iterator<Item = IssueKey> + '_ {
        self.penalties.iter().map(|(k, _)| *k)
    }
}

/// 0 inside `[min, max]`, otherwise distance outside the band over `max_deviation`, clamped to 1.
pub fn range_penalty(value: f32, min: f32, max: f32, max_deviation: f32) -> f32 {
    let distance = if value < min {
        min - value
    } else if value > max {
        value - max
    } else {
        return 0.0;
    };
    (distance / max_deviation).clamp(0.0, 1.0)
}

/// 0 at or below `soft`, 1 at or above `hard`, linear between. Absent input is 0.
pub fn threshold_penalty(value: Option<f32>, band: Band) -> f32 {
    match value {
        None => 0.0,
        Some(v) if v <= band.soft => 0.0,
        Some(v) if v >= band.hard => 1.0,
        Some(v) => (v - band.soft) / (band.hard - band.soft),
    }
}

fn component(penalty: f32) -> u8 {
    (100.0 * (1.0 - penalty)).round().clamp(0.0, 100.0) as u8
}

pub struct FormScorer {
    config: ScoreConfig,
}

impl FormScorer {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    pub fn grade(&self, overall: u8) -> Grade {
        if overall < self.config.poor_below {
            Grade::Poor
        } else if overall >= 90 {
            Grade::Excellent
        } else if overall >= 75 {
            Grade::Good
        } else {
            Grade::Fair
        }
    }

    pub fn score(&self, extremes: &RepExtremes, context: &ScoreContext) -> FormAssessment {
        let c = &self.config;

        let depth = extremes
            .min_angle
            .map_or(0.0, |a| range_penalty(a, c.depth_min, c.depth_max, c.depth_max_deviation));
        let depth_key = match extremes.min_angle {
            Some(a) if a < c.depth_min => IssueKey::OverDepth,
            _ => IssueKey::Depth,
        };
        let trunk_lean = threshold_penalty(extremes.max_trunk_lean, c.trunk_lean);
        let heel_rise = threshold_penalty(extremes.max_heel_rise, c.heel_rise);
        // 正面からは前後のずれが見えず、横からは内側への倒れ込みが見えない
        let (knee_forward, knee_collapse) = if context.facing_camera {
            (0.0, threshold_penalty(extremes.max_knee_collapse, c.knee_collapse))
        } else {
            (threshold_penalty(extremes.max_knee_forward, c.knee_forward), 0.0)
        };
        let stability = threshold_penalty(extremes.stability, c.stability);

        let alignment = knee_forward.max(knee_collapse);
        let posture = trunk_lean.max(heel_rise);

        let scores = [component(depth), component(alignment), component(posture), component(stability)];
        let w = c.weights;
        let weights = [w.depth, w.alignment, w.posture, w.stability];
        let total: f32 = weights.iter().sum();
        let weighted: f32 = scores.iter().zip(weights).map(|(s, w)| *s as f32 * w).sum();
        let overall = (weighted / total).round().clamp(0.0, 100.0) as u8;

        let penalties: Vec<(IssueKey, f32)> = [
            (depth_key, depth),
            (IssueKey::TrunkLean, trunk_lean),
            (IssueKey::HeelRise, heel_rise),
            (IssueKey::KneeForward, knee_forward),
            (IssueKey::KneeCollapse, knee_collapse),
            (IssueKey::Stability, stability),
        ]
        .into_iter()
        .filter(|(_, p)| *p > 0.0)
        .collect();

        let mut ranked = penalties.clone();
        // sort_by is stable: equal penalties keep insertion order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let feedback_keys = ranked.into_iter().take(2).map(|(k, _)| k).collect();

        FormAssessment {
            scores: FormScores {
                depth: scores[0],
                alignment: scores[1],
                posture: scores[2],
                stability: scores[3],
                overall,
                grade: self.grade(overall),
            },
            penalties,
            feedback_keys,
            side: context.side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scorer() -> FormScorer {
        FormScorer::new(ScoreConfig::squat())
    }

    fn extremes(min_angle: f32) -> RepExtremes {
        RepExtremes {
            min_angle: Some(min_angle),
            max_trunk_lean: Some(10.0),
            stability: Some(0.0),
            frames: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_range_penalty_band_edges() {
        assert_eq!(range_penalty(90.0, 50.0, 90.0, 40.0), 0.0);
        assert_eq!(range_penalty(50.0, 50.0, 90.0, 40.0), 0.0);
        assert_abs_diff_eq!(range_penalty(100.0, 50.0, 90.0, 40.0), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(range_penalty(40.0, 50.0, 90.0, 40.0), 0.25, epsilon = 1e-6);
        assert_eq!(range_penalty(170.0, 50.0, 90.0, 40.0), 1.0);
    }

    #[test]
    fn test_threshold_penalty_soft_and_hard() {
        let band = Band::new(20.0, 40.0);
        assert_eq!(threshold_penalty(Some(20.0), band), 0.0);
        assert_eq!(threshold_penalty(Some(40.0), band), 1.0);
        assert_eq!(threshold_penalty(Some(55.0), band), 1.0);
        assert_abs_diff_eq!(threshold_penalty(Some(30.0), band), 0.5, epsilon = 1e-6);
        assert_eq!(threshold_penalty(None, band), 0.0);
    }

    #[test]
    fn test_clean_rep_scores_full() {
        let a = scorer().score(&extremes(80.0), &ScoreContext::default());
        assert_eq!(a.scores.overall, 100);
        assert_eq!(a.scores.grade, Grade::Excellent);
        assert!(a.penalties.is_empty());
        assert!(a.feedback_keys.is_empty());
    }

    #[test]
    fn test_shallow_rep() {
        // 110° → 20°外れ / 40 = 0.5
        let a = scorer().score(&extremes(110.0), &ScoreContext::default());
        assert_eq!(a.scores.depth, 50);
        // 0.4*50 + 0.2*100 + 0.25*100 + 0.15*100 = 80
        assert_eq!(a.scores.overall, 80);
        assert_eq!(a.scores.grade, Grade::Good);
        assert_eq!(a.feedback_keys, vec![IssueKey::Depth]);
        assert!(a.has_issue(IssueKey::Depth));
    }

    #[test]
    fn test_too_deep_is_not_reported_as_shallow() {
        // 40° → 下限50°から10°外れ / 40 = 0.25
        let a = scorer().score(&extremes(40.0), &ScoreContext::default());
        assert_eq!(a.scores.depth, 75);
        assert_eq!(a.feedback_keys, vec![IssueKey::OverDepth]);
        assert!(!a.has_issue(IssueKey::Depth));
        assert_abs_diff_eq!(a.penalty(IssueKey::OverDepth), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_top_two_keys_by_penalty() {
        let mut e = extremes(100.0); // depth 0.25
        e.max_trunk_lean = Some(55.0); // 1.0
        e.max_knee_forward = Some(0.225); // 0.5
        let a = scorer().score(&e, &ScoreContext::default());
        assert_eq!(a.feedback_keys, vec![IssueKey::TrunkLean, IssueKey::KneeForward]);
        assert_eq!(
            a.issues().collect::<Vec<_>>(),
            vec![IssueKey::Depth, IssueKey::TrunkLean, IssueKey::KneeForward]
        );
    }

    #[test]
    fn test_equal_penalties_keep_insertion_order() {
        let mut e = extremes(80.0);
        e.max_heel_rise = Some(0.08); // 1.0
        e.stability = Some(0.05); // 1.0
        e.max_trunk_lean = Some(55.0); // 1.0
        let a = scorer().score(&e, &ScoreContext::default());
        assert_eq!(a.feedback_keys, vec![IssueKey::TrunkLean, IssueKey::HeelRise]);
    }

    #[test]
    fn test_view_selects_alignment_signal() {
        let mut e = extremes(80.0);
        e.max_knee_forward = Some(0.30);
        e.max_knee_collapse = Some(0.15);

        let side = scorer().score(&e, &ScoreContext { facing_camera: false, side: Some(Side::Left) });
        assert!(side.has_issue(IssueKey::KneeForward));
        assert!(!side.has_issue(IssueKey::KneeCollapse));
        assert_eq!(side.side, Some(Side::Left));

        let front = scorer().score(&e, &ScoreContext { facing_camera: true, side: None });
        assert!(!front.has_issue(IssueKey::KneeForward));
        assert!(front.has_issue(IssueKey::KneeCollapse));
        assert_eq!(front.scores.alignment, 0);
    }

    #[test]
    fn test_grade_boundaries() {
        let s = scorer();
        assert_eq!(s.grade(49), Grade::Poor);
        assert_eq!(s.grade(50), Grade::Fair);
        assert_eq!(s.grade(75), Grade::Good);
        assert_eq!(s.grade(90), Grade::Excellent);
    }
}
